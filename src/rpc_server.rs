//! Scrollkeeper RPC Server: JSON-RPC over stdin/stdout for the host page.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"router.navigationEnd", "params":{"url":"/jobs/42"}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Push:     {"event":"viewport", "command":"scroll_to", "x":0, "y":0, "behavior":"instant"}
//!
//! A restoration scheduled by one request is applied on the next loop tick,
//! unless another request is already waiting, in which case that request
//! runs first and may supersede it.

use std::io::{self, Write};

use scrollkeeper::app::App;
use scrollkeeper::platform;
use scrollkeeper::rpc_handler::{handle_method, is_rate_limited, RateLimiter};

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn emit(value: &Value) {
    let mut stdout = io::stdout().lock();
    // A closed stdout means the host is gone; the read loop ends on its own.
    let _ = writeln!(stdout, "{}", value);
    let _ = stdout.flush();
}

fn flush_viewport_commands(app: &mut App) {
    for command in app.drain_commands() {
        let mut event = serde_json::to_value(&command).unwrap_or_else(|_| json!({}));
        if let Value::Object(map) = &mut event {
            map.insert("event".to_string(), json!("viewport"));
        }
        emit(&event);
    }
}

fn handle_line(app: &mut App, rate_limiter: &mut RateLimiter, line: &str) {
    if line.trim().is_empty() {
        return;
    }

    let req: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            emit(&json!({"id": null, "error": format!("parse error: {}", e)}));
            return;
        }
    };

    let id = req.get("id").cloned().unwrap_or(Value::Null);
    let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");

    if is_rate_limited(method) && !rate_limiter.check() {
        emit(&json!({"id": id, "error": "rate limit exceeded"}));
        return;
    }

    let params = req.get("params").cloned().unwrap_or(json!({}));

    let response = match handle_method(app, method, &params) {
        Ok(val) => json!({"id": id, "result": val}),
        Err(err) => json!({"id": id, "error": err}),
    };
    emit(&response);
    flush_viewport_commands(app);
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let data_dir = std::env::var("SCROLLKEEPER_DATA_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| platform::get_data_dir());
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        error!(dir = %data_dir.display(), error = %e, "cannot create data directory");
    }
    let db_path = data_dir.join("scrollkeeper.db");
    let session_id = std::env::var("SCROLLKEEPER_SESSION_ID").ok();

    let mut app = match App::with_options(
        db_path.to_str().unwrap_or("scrollkeeper.db"),
        None,
        session_id.as_deref(),
    ) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to initialize scrollkeeper");
            std::process::exit(1);
        }
    };

    emit(&json!({
        "event": "ready",
        "version": env!("CARGO_PKG_VERSION"),
        "session_id": app.session_id(),
    }));

    let mut rate_limiter = RateLimiter::new(200);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            biased;
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&mut app, &mut rate_limiter, &line),
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "stdin read failed");
                    break;
                }
            },
            _ = tokio::task::yield_now(), if app.scroll_manager.has_pending_restoration() => {
                if let Some(action) = app.tick() {
                    trace!(?action, "restoration tick");
                }
                flush_viewport_commands(&mut app);
            }
        }
    }

    app.shutdown();
    info!("host disconnected, shutting down");
}
