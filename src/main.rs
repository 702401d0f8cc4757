#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use lazy_static::lazy_static;
use log::info;
use poem::listener::TcpListener;

// Greeting Utilities
use crate::api::build_routes;
use crate::api::greeting::{make_hook, GreetCtx};
use crate::utils::config::{init_log, init_runtime_context, RuntimeCtx, GREET_ARGS, GREET_DIRS};
use crate::utils::errors::Errors;
use crate::utils::outbound::OutboundClient;

// Modules
mod api;
mod utils;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const SERVER_NAME : &str = "GreetingServer"; // for poem logging

// In-flight requests get this long to finish after a shutdown signal.
const SHUTDOWN_GRACE : Duration = Duration::from_secs(5);

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Lazily initialize the parameters variable so that is has a 'static lifetime.
// We exit if we can't read our parameters.
lazy_static! {
    static ref RUNTIME_CTX: RuntimeCtx = init_runtime_context();
}

// ---------------------------------------------------------------------------
// main:
// ---------------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<()> {
    // --------------- Initialize Server --------------
    // Announce ourselves.
    println!("Starting greeting_server!");

    // Only lay down the data directories if that's all that was asked for.
    if GREET_ARGS.create_dirs_only {
        println!("Data directories created under {}.", GREET_DIRS.root_dir);
        return Ok(());
    }

    // Initialize the server.
    greeting_init();

    // --------------- Main Loop Set Up ---------------
    let config = &RUNTIME_CTX.parms.config;

    // Assign base URL.
    let server_url = format!("{}:{}", config.http_addr, config.http_port);

    // The one outbound client and hook are shared by all greeting endpoints.
    let hook = make_hook(config.log_threads);
    info!("Diagnostic hook: {}.", hook.name());
    let ctx = Arc::new(GreetCtx::new(OutboundClient::new(&config.outbound_url)?, hook));
    let app = build_routes(ctx, &config.title, &server_url);

    // ------------------ Main Loop -------------------
    let addr = format!("{}{}", "0.0.0.0:", config.http_port);
    info!("{} listening on {}, advertised as {}.", SERVER_NAME, addr, server_url);
    poem::Server::new(TcpListener::bind(addr))
        .name(SERVER_NAME)
        .run_with_graceful_shutdown(app, shutdown_signal(), Some(SHUTDOWN_GRACE))
        .await?;

    info!("{} shut down.", SERVER_NAME);
    Ok(())
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// greeting_init:
// ---------------------------------------------------------------------------
/** Initialize logging and force the reading of the configuration. */
fn greeting_init() {
    // Configure our log.
    init_log();

    // Force the reading of input parameters and initialization of runtime context.
    info!("{}", Errors::InputParms(format!("{:#?}", *RUNTIME_CTX)));

    // Log build info.
    print_version_info();
}

// ---------------------------------------------------------------------------
// shutdown_signal:
// ---------------------------------------------------------------------------
async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => { s.recv().await; },
            Err(e) => {
                log::error!("Unable to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Unable to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal."),
        () = terminate => info!("Received SIGTERM signal."),
    }
    info!("Shutdown signal received, terminating gracefully...");
}

// ---------------------------------------------------------------------------
// print_version_info:
// ---------------------------------------------------------------------------
fn print_version_info() {
    // Log build info.
    info!("\n*** Running GREETING={}, BRANCH={}, COMMIT={}, DIRTY={}, SRC_TS={}, RUSTC={}.",
          option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
          env!("GIT_BRANCH"),
          env!("GIT_COMMIT_SHORT"),
          env!("GIT_DIRTY"),
          env!("SOURCE_TIMESTAMP"),
          env!("RUSTC_VERSION"));
}
