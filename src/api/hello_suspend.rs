#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::Request;
use poem_openapi::{OpenApi, param::Query, payload::Json};

use crate::api::greeting::{GreetCtx, Greeting, ReqGreeting, SUSPEND_DELAY};
use crate::utils::diagnostics::Stage;
use crate::utils::greet_utils::debug_request;

const ENDPOINT: &str = "hello-suspend";

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct HelloSuspendApi {
    ctx: Arc<GreetCtx>,
}

impl HelloSuspendApi {
    pub fn new(ctx: Arc<GreetCtx>) -> Self {
        Self {ctx}
    }
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl HelloSuspendApi {
    /// Greet after the outbound request and a fixed delay.
    #[oai(path = "/hello-suspend", method = "get")]
    async fn say_hello_suspend(&self, http_req: &Request, name: Query<String>) -> poem::Result<Json<Greeting>> {
        self.ctx.stage(ENDPOINT, Stage::Start);
        let req = ReqGreeting {name: name.0};
        debug_request(http_req, &req);

        self.ctx.outbound(ENDPOINT).await?;
        self.ctx.stage(ENDPOINT, Stage::AfterOutbound);

        tokio::time::sleep(SUSPEND_DELAY).await;
        self.ctx.stage(ENDPOINT, Stage::AfterDelay);

        let greeting = Greeting::hello(&req.name);
        self.ctx.stage(ENDPOINT, Stage::End);
        Ok(Json(greeting))
    }
}
