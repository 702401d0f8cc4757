#![forbid(unsafe_code)]

use anyhow::Result;
use log::{debug, error};

use crate::utils::errors::Errors;

// ***************************************************************************
//                             Outbound Client
// ***************************************************************************
/** The single outbound HTTP collaborator shared by all greeting endpoints.
 * Cloning is cheap; clones share the underlying connection pool.
 */
#[derive(Debug, Clone)]
pub struct OutboundClient {
    http: reqwest::Client,
    url: String,
}

impl OutboundClient {
    // ---------------------------------------------------------------------------
    // new:
    // ---------------------------------------------------------------------------
    /** Build a client that targets the given url.  No request timeout is set. */
    pub fn new(url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("greeting_server/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, url: url.to_string() })
    }

    // ---------------------------------------------------------------------------
    // execute:
    // ---------------------------------------------------------------------------
    /** Issue a GET to the configured url.  Only success or failure is reported,
     * the response body is never read.  Redirects are followed, so success
     * means the final response has a 2xx status.
     */
    pub async fn execute(&self) -> Result<(), Errors> {
        let resp = match self.http.get(&self.url).send().await {
            Ok(r) => r,
            Err(e) => {
                let err = Errors::OutboundRequest(self.url.clone(), e.to_string());
                error!("{}", err);
                return Err(err);
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let err = Errors::OutboundStatus(self.url.clone(), status.as_u16());
            error!("{}", err);
            return Err(err);
        }

        debug!("Outbound request to {} completed with status {}.", self.url, status);
        Ok(())
    }
}
