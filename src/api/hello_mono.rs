#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::Request;
use poem_openapi::{OpenApi, param::Query, payload::Json};

use crate::api::greeting::{GreetCtx, Greeting, ReqGreeting};
use crate::utils::diagnostics::Stage;
use crate::utils::greet_utils::debug_request;

const ENDPOINT: &str = "hello-mono";

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct HelloMonoApi {
    ctx: Arc<GreetCtx>,
}

impl HelloMonoApi {
    pub fn new(ctx: Arc<GreetCtx>) -> Self {
        Self {ctx}
    }
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl HelloMonoApi {
    /// Greet as soon as the outbound request completes.
    #[oai(path = "/hello-mono", method = "get")]
    async fn say_hello_mono(&self, http_req: &Request, name: Query<String>) -> poem::Result<Json<Greeting>> {
        self.ctx.stage(ENDPOINT, Stage::Start);
        let req = ReqGreeting {name: name.0};
        debug_request(http_req, &req);

        // The outbound result is discarded, only its completion matters.
        self.ctx.outbound(ENDPOINT).await?;
        self.ctx.stage(ENDPOINT, Stage::AfterOutbound);

        let greeting = Greeting::hello(&req.name);
        self.ctx.stage(ENDPOINT, Stage::End);
        Ok(Json(greeting))
    }
}
