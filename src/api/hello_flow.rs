#![forbid(unsafe_code)]

use std::io;
use std::sync::Arc;

use futures::stream::{self, Stream};
use poem::{Body, Request};
use poem_openapi::{ApiResponse, OpenApi, param::Query, payload::Binary};

use crate::api::greeting::{GreetCtx, Greeting, ReqGreeting, FLOW_DELAY, FLOW_ITEM_COUNT};
use crate::utils::diagnostics::Stage;
use crate::utils::errors::Errors;
use crate::utils::greet_utils::debug_request;

const ENDPOINT: &str = "hello-flow";

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct HelloFlowApi {
    ctx: Arc<GreetCtx>,
}

impl HelloFlowApi {
    pub fn new(ctx: Arc<GreetCtx>) -> Self {
        Self {ctx}
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(ApiResponse)]
enum FlowResponse {
    /// One greeting object per line.
    #[oai(status = 200, content_type = "application/x-ndjson")]
    Http200(Binary<Body>),
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl HelloFlowApi {
    /// Stream numbered greetings as newline-delimited JSON.
    #[oai(path = "/hello-flow", method = "get")]
    async fn say_hello_flow(&self, http_req: &Request, name: Query<String>) -> poem::Result<FlowResponse> {
        self.ctx.stage(ENDPOINT, Stage::Start);
        let req = ReqGreeting {name: name.0};
        debug_request(http_req, &req);

        // The outbound call finishes before the response head is produced, so
        // a failure never leaves a partial stream behind.
        self.ctx.outbound(ENDPOINT).await?;
        self.ctx.stage(ENDPOINT, Stage::AfterOutbound);

        let body = Body::from_bytes_stream(greeting_stream(self.ctx.clone(), req.name));
        Ok(FlowResponse::Http200(Binary(body)))
    }
}

// ***************************************************************************
//                          Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// greeting_stream:
// ---------------------------------------------------------------------------
/** Lazily produce the numbered greetings.  Nothing happens until the body is
 * polled; each item is released as soon as it is encoded and the fixed
 * pause precedes every item after the first.  An item's AfterEmit stage is
 * reported when the consumer asks for the next one.
 */
fn greeting_stream(ctx: Arc<GreetCtx>, name: String)
-> impl Stream<Item = Result<Vec<u8>, io::Error>> + Send + 'static {
    stream::unfold((1usize, ctx, name), |(n, ctx, name)| async move {
        if n > 1 {
            ctx.stage(ENDPOINT, Stage::AfterEmit(n - 1));
        }
        if n > FLOW_ITEM_COUNT {
            ctx.stage(ENDPOINT, Stage::End);
            return None;
        }
        if n > 1 {
            tokio::time::sleep(FLOW_DELAY).await;
            ctx.stage(ENDPOINT, Stage::AfterDelay);
        }

        ctx.stage(ENDPOINT, Stage::BeforeEmit(n));
        let line = encode_line(&Greeting::numbered(n, &name));
        Some((line, (n + 1, ctx, name)))
    })
}

// ---------------------------------------------------------------------------
// encode_line:
// ---------------------------------------------------------------------------
fn encode_line(greeting: &Greeting) -> Result<Vec<u8>, io::Error> {
    let mut line = serde_json::to_vec(greeting)
        .map_err(|e| io::Error::other(Errors::Serialization(e.to_string())))?;
    line.push(b'\n');
    Ok(line)
}
