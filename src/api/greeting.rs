#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use poem_openapi::Object;
use serde::{Deserialize, Serialize};

use crate::utils::diagnostics::{DiagnosticHook, NoopHook, Stage, ThreadLogHook};
use crate::utils::errors::Errors;
use crate::utils::greet_utils::RequestDebug;
use crate::utils::outbound::OutboundClient;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// The streaming endpoint always emits exactly this many greetings.
pub const FLOW_ITEM_COUNT: usize = 3;

// Fixed pause of the buffered endpoint after the outbound call.
pub const SUSPEND_DELAY: Duration = Duration::from_secs(1);

// Fixed pause before each streamed greeting after the first.
pub const FLOW_DELAY: Duration = Duration::from_millis(100);

// ***************************************************************************
//                             Greeting Value
// ***************************************************************************
/** The only value returned to clients.  A new greeting is created for each
 * response or streamed item and is never modified.
 */
#[derive(Object, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Greeting
{
    message: String,
}

impl Greeting {
    pub fn new(message: String) -> Self {
        Self {message}
    }

    /// "Hi, {name}."
    pub fn hello(name: &str) -> Self {
        Self::new(format!("Hi, {}.", name))
    }

    /// "{n}: Hi, {name}."
    pub fn numbered(n: usize, name: &str) -> Self {
        Self::new(format!("{}: Hi, {}.", n, name))
    }

    #[cfg(test)]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ---------------------------------------------------------------------------
// ReqGreeting:
// ---------------------------------------------------------------------------
// Request parameters shared by all greeting endpoints.
pub struct ReqGreeting
{
    pub name: String,
}

impl RequestDebug for ReqGreeting {
    type Req = ReqGreeting;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(64);
        s.push_str("  Request parameters:");
        s.push_str("\n    name: ");
        s.push_str(&self.name);
        s
    }
}

// ***************************************************************************
//                             Greeting Context
// ***************************************************************************
/** Everything the greeting endpoints share: the one outbound client and the
 * diagnostic hook.  Handlers hold it behind an Arc.
 */
pub struct GreetCtx {
    pub client: OutboundClient,
    pub hook: Arc<dyn DiagnosticHook>,
}

impl GreetCtx {
    pub fn new(client: OutboundClient, hook: Arc<dyn DiagnosticHook>) -> Self {
        Self {client, hook}
    }

    /// Report a stage to the diagnostic hook.
    pub fn stage(&self, endpoint: &'static str, stage: Stage) {
        self.hook.on_stage(endpoint, stage);
    }

    // ---------------------------------------------------------------------------
    // outbound:
    // ---------------------------------------------------------------------------
    /** Perform the outbound call and wait for it to complete.  Failures are
     * returned unchanged, there is no retry.
     */
    pub async fn outbound(&self, endpoint: &'static str) -> Result<(), Errors> {
        self.client.execute().await?;
        self.stage(endpoint, Stage::InsideOutbound);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// make_hook:
// ---------------------------------------------------------------------------
/** Choose the diagnostic hook from the log_threads configuration flag. */
pub fn make_hook(log_threads: bool) -> Arc<dyn DiagnosticHook> {
    if log_threads {
        Arc::new(ThreadLogHook)
    } else {
        Arc::new(NoopHook)
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{make_hook, Greeting, FLOW_DELAY, SUSPEND_DELAY};

    #[test]
    fn greeting_formats() {
        assert_eq!(Greeting::hello("World").message(), "Hi, World.");
        assert_eq!(Greeting::numbered(2, "World").message(), "2: Hi, World.");
        assert_eq!(Greeting::hello("").message(), "Hi, .");
    }

    #[test]
    fn greeting_serializes_as_message_object() {
        let json = serde_json::to_string(&Greeting::hello("Ann")).unwrap();
        assert_eq!(json, r#"{"message":"Hi, Ann."}"#);
    }

    #[test]
    fn delays_are_fixed() {
        assert_eq!(SUSPEND_DELAY, Duration::from_secs(1));
        assert_eq!(FLOW_DELAY, Duration::from_millis(100));
    }

    #[test]
    fn hook_follows_log_threads_flag() {
        assert_eq!(make_hook(true).name(), "thread-log");
        assert_eq!(make_hook(false).name(), "noop");
    }
}
