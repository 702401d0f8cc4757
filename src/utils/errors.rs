#![forbid(unsafe_code)]

use poem::error::ResponseError;
use poem::http::StatusCode;
use thiserror::Error;

/// Error enumerates the errors returned by this application.
#[derive(Error, Debug)]
pub enum Errors {
    /// Input parameter logging.
    #[error("greeting_server input parameters:\n{}", .0)]
    InputParms(String),

    /// Inaccessible logger configuration file.
    #[error("Unable to access the Log4rs configuration file: {}", .0)]
    Log4rsInitialization(String),

    #[error("Reading application configuration file: {}", .0)]
    ReadingConfigFile(String),

    #[error("Unable to parse TOML file: {}", .0)]
    TOMLParseError(String),

    /// The outbound request could not be sent or its response not received.
    #[error("Outbound request to {} failed: {}", .0, .1)]
    OutboundRequest(String, String),

    /// The outbound request completed with a non-success status.
    #[error("Outbound request to {} returned status {}", .0, .1)]
    OutboundStatus(String, u16),

    #[error("Unable to serialize response: {}", .0)]
    Serialization(String),
}

// Anything that reaches a handler boundary is a server-side failure.
impl ResponseError for Errors {
    fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::Errors;
    use poem::error::ResponseError;
    use poem::http::StatusCode;

    #[test]
    fn outbound_errors_map_to_500() {
        let e = Errors::OutboundStatus("http://localhost".to_string(), 503);
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.to_string(), "Outbound request to http://localhost returned status 503");

        let e: poem::Error = Errors::OutboundRequest("http://localhost".to_string(),
                                                     "connection refused".to_string()).into();
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
