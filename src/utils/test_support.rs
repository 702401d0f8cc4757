#![forbid(unsafe_code)]

// Shared fixtures for the in-module tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use poem::http::StatusCode;
use poem::listener::{Acceptor, Listener, TcpListener};
use poem::web::Data;
use poem::{get, handler, EndpointExt, Route, Server};

use crate::api::build_routes;
use crate::api::greeting::GreetCtx;
use crate::utils::diagnostics::{DiagnosticHook, Stage};
use crate::utils::outbound::OutboundClient;

// ***************************************************************************
//                              Mock Upstream
// ***************************************************************************
/** A local poem server that stands in for the external site.  It answers
 * every GET on "/" with a fixed status and counts the requests it receives.
 */
pub struct MockUpstream {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

#[handler]
fn upstream(hits: Data<&Arc<AtomicUsize>>, status: Data<&StatusCode>) -> StatusCode {
    hits.fetch_add(1, Ordering::SeqCst);
    *status.0
}

impl MockUpstream {
    pub async fn start(status: StatusCode) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Route::new()
            .at("/", get(upstream))
            .data(hits.clone())
            .data(status);

        let acceptor = TcpListener::bind("127.0.0.1:0")
            .into_acceptor()
            .await
            .expect("bind mock upstream");
        let addr = *acceptor.local_addr()[0]
            .0
            .as_socket_addr()
            .expect("mock upstream socket address");
        tokio::spawn(Server::new_with_acceptor(acceptor).run(app));

        Self {url: format!("http://{}/", addr), hits}
    }

    /// A url on which nothing is listening.
    pub fn unreachable_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
        let addr = listener.local_addr().expect("free port address");
        drop(listener);
        format!("http://{}/", addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

// ***************************************************************************
//                              Recording Hook
// ***************************************************************************
#[derive(Default)]
pub struct RecordingHook {
    stages: Mutex<Vec<(&'static str, Stage)>>,
}

impl RecordingHook {
    pub fn stages(&self) -> Vec<(&'static str, Stage)> {
        self.stages.lock().expect("hook lock").clone()
    }
}

impl DiagnosticHook for RecordingHook {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn on_stage(&self, endpoint: &'static str, stage: Stage) {
        self.stages.lock().expect("hook lock").push((endpoint, stage));
    }
}

// ---------------------------------------------------------------------------
// test_ctx:
// ---------------------------------------------------------------------------
/** A greeting context pointed at the given url. */
pub fn test_ctx(url: &str, hook: Arc<RecordingHook>) -> Arc<GreetCtx> {
    let client = OutboundClient::new(url).expect("outbound client");
    Arc::new(GreetCtx::new(client, hook))
}

// ---------------------------------------------------------------------------
// test_routes:
// ---------------------------------------------------------------------------
pub const TEST_TITLE: &str = "Greeting Server";

pub fn test_routes(ctx: Arc<GreetCtx>) -> Route {
    build_routes(ctx, TEST_TITLE, "http://localhost")
}
