#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::Route;
use poem_openapi::OpenApiService;

use crate::api::greeting::GreetCtx;
use crate::api::hello_flow::HelloFlowApi;
use crate::api::hello_mono::HelloMonoApi;
use crate::api::hello_suspend::HelloSuspendApi;
use crate::api::version::VersionApi;

pub mod greeting;
pub mod hello_flow;
pub mod hello_mono;
pub mod hello_suspend;
pub mod version;

// ---------------------------------------------------------------------------
// build_routes:
// ---------------------------------------------------------------------------
/** Assemble the greeting endpoints into one OpenAPI service and mount it with
 * its spec documents and Swagger UI.  All greeting endpoints share ctx and
 * the configured title names the generated document.
 */
pub fn build_routes(ctx: Arc<GreetCtx>, title: &str, server_url: &str) -> Route {
    let endpoints = (
        HelloSuspendApi::new(ctx.clone()),
        HelloFlowApi::new(ctx.clone()),
        HelloMonoApi::new(ctx),
        VersionApi,
    );
    let api_service =
        OpenApiService::new(endpoints, title, env!("CARGO_PKG_VERSION")).server(server_url);

    // Allow the generated openapi specs to be retrieved from the server.
    let spec = api_service.spec_endpoint();
    let spec_yaml = api_service.spec_endpoint_yaml();
    let ui = api_service.swagger_ui();

    Route::new()
        .nest("/", api_service)
        .nest("/docs", ui)
        .at("/spec", spec)
        .at("/spec_yaml", spec_yaml)
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use poem::test::TestClient;

    use super::build_routes;
    use crate::utils::test_support::{test_ctx, test_routes, MockUpstream, RecordingHook, TEST_TITLE};

    #[tokio::test]
    async fn spec_lists_greeting_paths() {
        let ctx = test_ctx(&MockUpstream::unreachable_url(), Arc::new(RecordingHook::default()));
        let cli = TestClient::new(test_routes(ctx));

        let resp = cli.get("/spec").send().await;
        resp.assert_status_is_ok();
        let body = resp.0.into_body().into_string().await.unwrap();
        assert!(body.contains(TEST_TITLE));
        for path in ["/hello-suspend", "/hello-flow", "/hello-mono", "/version", "application/x-ndjson"] {
            assert!(body.contains(path), "missing {}", path);
        }
    }

    #[tokio::test]
    async fn spec_uses_configured_title() {
        let ctx = test_ctx(&MockUpstream::unreachable_url(), Arc::new(RecordingHook::default()));
        let cli = TestClient::new(build_routes(ctx, "Hello Demo", "http://localhost:9000"));

        let resp = cli.get("/spec").send().await;
        resp.assert_status_is_ok();
        let body = resp.0.into_body().into_string().await.unwrap();
        assert!(body.contains("\"Hello Demo\""));
        assert!(!body.contains(TEST_TITLE));
        assert!(body.contains("http://localhost:9000"));
    }
}
