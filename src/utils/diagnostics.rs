#![forbid(unsafe_code)]

use std::fmt;
use log::info;

// ***************************************************************************
//                                  Stages
// ***************************************************************************
/** The points in a greeting request at which the diagnostic hook is invoked.
 * The emit stages carry the 1-based number of the streamed item.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    InsideOutbound,
    AfterOutbound,
    AfterDelay,
    BeforeEmit(usize),
    AfterEmit(usize),
    End,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Start => write!(f, "at the beginning"),
            Stage::InsideOutbound => write!(f, "inside the outbound request"),
            Stage::AfterOutbound => write!(f, "after the outbound request"),
            Stage::AfterDelay => write!(f, "after delay"),
            Stage::BeforeEmit(n) => write!(f, "before emit #{}", n),
            Stage::AfterEmit(n) => write!(f, "after emit #{}", n),
            Stage::End => write!(f, "at the end"),
        }
    }
}

// ***************************************************************************
//                                  Traits
// ***************************************************************************
/** Observes the progress of a greeting request.  Implementations must not
 * influence the response in any way.
 */
pub trait DiagnosticHook: Send + Sync {
    /// Short name reported at start-up.
    fn name(&self) -> &'static str;
    fn on_stage(&self, endpoint: &'static str, stage: Stage);
}

// ---------------------------------------------------------------------------
// ThreadLogHook:
// ---------------------------------------------------------------------------
/** Log the thread that is executing the request at each stage. */
#[derive(Debug, Default)]
pub struct ThreadLogHook;

impl DiagnosticHook for ThreadLogHook {
    fn name(&self) -> &'static str {
        "thread-log"
    }

    fn on_stage(&self, endpoint: &'static str, stage: Stage) {
        let thread = std::thread::current();
        info!("{}: running on thread {} ({:?}) {}.",
              endpoint, thread.name().unwrap_or("unnamed"), thread.id(), stage);
    }
}

// ---------------------------------------------------------------------------
// NoopHook:
// ---------------------------------------------------------------------------
#[derive(Debug, Default)]
pub struct NoopHook;

impl DiagnosticHook for NoopHook {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn on_stage(&self, _endpoint: &'static str, _stage: Stage) {}
}
