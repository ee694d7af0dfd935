//! Unit tests for the RPC handler: the JSON-RPC methods dispatched by `handle_method`.
//!
//! These tests go through the same code path as the real `scrollkeeper-rpc`
//! binary, using a temporary on-disk SQLite database and settings file. Host
//! ticks are simulated with `App::tick`.

use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tempfile::TempDir;

use scrollkeeper::app::App;
use scrollkeeper::rpc_handler::{handle_method, is_rate_limited, RateLimiter};
use scrollkeeper::services::viewport::ViewportCommand;
use scrollkeeper::types::scroll::ScrollBehavior;

/// Create a fresh App backed by a temp directory DB and settings file.
fn setup() -> (App, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let db_path = tmp.path().join("test.db");
    let settings_path = tmp.path().join("settings.json").to_string_lossy().to_string();
    let app = App::with_options(db_path.to_str().unwrap(), Some(settings_path), None)
        .expect("Failed to init App");
    (app, tmp)
}

fn call(app: &mut App, method: &str, params: Value) -> Value {
    handle_method(app, method, &params).unwrap_or_else(|e| panic!("{} failed: {}", method, e))
}

/// Router start + end for `url`, returning the navigationEnd result.
fn navigate(app: &mut App, url: &str, trigger: &str) -> Value {
    call(app, "router.navigationStart", json!({"url": url, "trigger": trigger}));
    call(app, "router.navigationEnd", json!({"url": url}))
}

// ─── Ping ───

#[test]
fn test_ping() {
    let (mut app, _tmp) = setup();
    let res = call(&mut app, "ping", json!({}));
    assert_eq!(res, json!({"pong": true}));
}

// ─── Unknown method ───

#[test]
fn test_unknown_method_returns_error() {
    let (mut app, _tmp) = setup();
    let res = handle_method(&mut app, "nonexistent.method", &json!({}));
    assert!(res.unwrap_err().contains("unknown method"));
}

// ─── Router lifecycle ───

#[test]
fn test_back_navigation_restores_over_rpc() {
    let (mut app, _tmp) = setup();

    let res = navigate(&mut app, "/jobs?type=remote", "imperative");
    assert_eq!(res["kind"], "push");
    assert_eq!(res["pending"], json!({"action": "reset_to_top"}));
    app.tick();

    call(&mut app, "viewport.scroll", json!({"x": 0, "y": 800}));

    let res = navigate(&mut app, "/jobs/42", "imperative");
    assert_eq!(res["kind"], "push");
    app.tick();
    app.drain_commands();

    call(&mut app, "history.popstate", json!({}));
    let start = call(
        &mut app,
        "router.navigationStart",
        json!({"url": "/jobs?type=remote", "trigger": "popstate"}),
    );
    assert_eq!(start["backward"], true);
    let res = call(&mut app, "router.navigationEnd", json!({"url": "/jobs?type=remote"}));
    assert_eq!(res["kind"], "pop");
    assert_eq!(res["route"], "/jobs?type=remote");
    assert_eq!(res["pending"]["action"], "restore");
    assert_eq!(res["pending"]["y"], 800.0);

    // Nothing reaches the viewport until the tick.
    assert!(app.drain_commands().is_empty());
    app.tick();
    assert_eq!(
        app.drain_commands(),
        vec![ViewportCommand::ScrollTo {
            x: 0.0,
            y: 800.0,
            behavior: ScrollBehavior::Instant
        }]
    );
}

#[test]
fn test_navigation_end_returns_increasing_tokens() {
    let (mut app, _tmp) = setup();
    let first = navigate(&mut app, "/a", "imperative");
    let second = navigate(&mut app, "/b", "imperative");
    assert!(second["token"].as_u64().unwrap() > first["token"].as_u64().unwrap());
}

#[test]
fn test_navigation_start_carries_scroll_offset() {
    let (mut app, _tmp) = setup();
    navigate(&mut app, "/a", "imperative");
    app.tick();

    call(
        &mut app,
        "router.navigationStart",
        json!({"url": "/b", "scroll": {"x": 0, "y": 275}}),
    );
    let info = call(&mut app, "debug.info", json!({}));
    assert_eq!(info["positions"][0]["route"], "/a");
    assert_eq!(info["positions"][0]["position"]["y"], 275.0);
}

#[test]
fn test_navigation_start_before_tick_stores_pending_target() {
    let (mut app, _tmp) = setup();
    navigate(&mut app, "/a", "imperative");
    app.tick();
    call(&mut app, "viewport.scroll", json!({"x": 0, "y": 800}));

    navigate(&mut app, "/b", "imperative");
    navigate(&mut app, "/c", "imperative");

    let info = call(&mut app, "debug.info", json!({}));
    assert_eq!(info["positions"][0]["route"], "/a");
    assert_eq!(info["positions"][0]["position"]["y"], 800.0);
    assert_eq!(info["positions"][1]["route"], "/b");
    assert_eq!(info["positions"][1]["position"]["y"], 0.0);
}

#[test]
fn test_navigation_start_rejects_bad_params() {
    let (mut app, _tmp) = setup();
    let missing = handle_method(&mut app, "router.navigationStart", &json!({}));
    assert_eq!(missing.unwrap_err(), "missing url");

    let bad = handle_method(
        &mut app,
        "router.navigationStart",
        &json!({"url": "/a", "trigger": "teleport"}),
    );
    assert!(bad.unwrap_err().contains("invalid trigger"));
}

#[test]
fn test_navigation_cancel() {
    let (mut app, _tmp) = setup();
    call(&mut app, "router.navigationStart", json!({"url": "/a"}));
    let res = call(&mut app, "router.navigationCancel", json!({}));
    assert_eq!(res["ok"], true);
    assert_eq!(app.tick(), None);
}

// ─── Viewport signals ───

#[test]
fn test_viewport_scroll_requires_coordinates() {
    let (mut app, _tmp) = setup();
    let res = handle_method(&mut app, "viewport.scroll", &json!({"x": 0}));
    assert_eq!(res.unwrap_err(), "missing y");
}

#[test]
fn test_anchors_gate_scroll_to_element() {
    let (mut app, _tmp) = setup();
    call(&mut app, "viewport.anchors", json!({"ids": ["apply", "footer"]}));

    let res = call(&mut app, "scroll.toElement", json!({"id": "missing"}));
    assert_eq!(res["found"], false);
    assert!(app.drain_commands().is_empty());

    let res = call(&mut app, "scroll.toElement", json!({"id": "apply"}));
    assert_eq!(res["found"], true);
    assert_eq!(app.drain_commands().len(), 1);

    // Clearing the anchor list goes back to trusting the host.
    call(&mut app, "viewport.anchors", json!({"ids": null}));
    let res = call(&mut app, "scroll.toElement", json!({"id": "missing"}));
    assert_eq!(res["found"], true);

    let bad = handle_method(&mut app, "viewport.anchors", &json!({"ids": [1, 2]}));
    assert!(bad.is_err());
}

#[test]
fn test_before_unload_saves_position() {
    let (mut app, _tmp) = setup();
    navigate(&mut app, "/a", "imperative");
    app.tick();

    call(&mut app, "page.beforeUnload", json!({"scroll": {"x": 0, "y": 512}}));
    let info = call(&mut app, "debug.info", json!({}));
    assert_eq!(info["positions"][0]["position"]["y"], 512.0);
}

// ─── Control surface ───

#[test]
fn test_scroll_to_top_defaults_to_smooth() {
    let (mut app, _tmp) = setup();
    call(&mut app, "scroll.toTop", json!({}));
    call(&mut app, "scroll.toTop", json!({"smooth": false}));
    assert_eq!(
        app.drain_commands(),
        vec![
            ViewportCommand::ScrollTo { x: 0.0, y: 0.0, behavior: ScrollBehavior::Smooth },
            ViewportCommand::ScrollTo { x: 0.0, y: 0.0, behavior: ScrollBehavior::Instant },
        ]
    );
}

#[test]
fn test_scroll_to_coordinates() {
    let (mut app, _tmp) = setup();
    call(&mut app, "scroll.to", json!({"x": 10, "y": 20, "smooth": true}));
    assert_eq!(
        app.drain_commands(),
        vec![ViewportCommand::ScrollTo { x: 10.0, y: 20.0, behavior: ScrollBehavior::Smooth }]
    );
}

#[test]
fn test_save_current_without_route_saves_nothing() {
    let (mut app, _tmp) = setup();
    let res = call(&mut app, "scroll.saveCurrent", json!({}));
    assert_eq!(res["saved"], Value::Null);
}

#[test]
fn test_save_clear_and_clear_all() {
    let (mut app, _tmp) = setup();
    navigate(&mut app, "/a", "imperative");
    app.tick();
    let res = call(&mut app, "scroll.saveCurrent", json!({"scroll": {"x": 0, "y": 90}}));
    assert_eq!(res["saved"]["y"], 90.0);

    navigate(&mut app, "/b", "imperative");
    app.tick();
    call(&mut app, "scroll.saveCurrent", json!({"scroll": {"x": 0, "y": 30}}));

    call(&mut app, "scroll.clear", json!({"route": "/a"}));
    let info = call(&mut app, "debug.info", json!({}));
    let routes: Vec<&str> = info["positions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["route"].as_str().unwrap())
        .collect();
    assert_eq!(routes, vec!["/b"]);

    call(&mut app, "scroll.clearAll", json!({}));
    let info = call(&mut app, "debug.info", json!({}));
    assert!(info["positions"].as_array().unwrap().is_empty());
}

// ─── Restoration ───

#[test]
fn test_restoration_toggle() {
    let (mut app, _tmp) = setup();
    assert_eq!(call(&mut app, "restoration.status", json!({}))["enabled"], true);

    call(&mut app, "restoration.disable", json!({}));
    assert_eq!(call(&mut app, "restoration.status", json!({}))["enabled"], false);

    navigate(&mut app, "/a", "imperative");
    app.tick();
    call(&mut app, "viewport.scroll", json!({"x": 0, "y": 400}));
    navigate(&mut app, "/b", "imperative");
    app.tick();
    let res = navigate(&mut app, "/a", "popstate");
    assert_eq!(res["kind"], "pop");
    assert_eq!(res["pending"]["action"], "reset_to_top");

    call(&mut app, "restoration.enable", json!({}));
    assert_eq!(call(&mut app, "restoration.status", json!({}))["enabled"], true);
}

// ─── History / debug ───

#[test]
fn test_history_reset_and_debug_info() {
    let (mut app, _tmp) = setup();
    navigate(&mut app, "/a", "imperative");
    navigate(&mut app, "/b", "imperative");

    let info = call(&mut app, "debug.info", json!({}));
    assert_eq!(info["history"], json!(["/a", "/b"]));
    assert_eq!(info["current_route"], "/b");
    assert_eq!(info["restoration_enabled"], true);

    call(&mut app, "history.reset", json!({}));
    let info = call(&mut app, "debug.info", json!({}));
    assert_eq!(info["history"], json!([]));
}

// ─── Settings ───

#[test]
fn test_settings_get_and_set_apply_to_manager() {
    let (mut app, _tmp) = setup();
    let settings = call(&mut app, "settings.get", json!({}));
    assert_eq!(settings["storage"]["key_prefix"], "scroll_");

    call(&mut app, "settings.set", json!({"key": "restoration.enabled", "value": false}));
    assert_eq!(call(&mut app, "restoration.status", json!({}))["enabled"], false);
    assert_eq!(call(&mut app, "settings.get", json!({}))["restoration"]["enabled"], false);
}

#[test]
fn test_unrelated_setting_keeps_runtime_disable() {
    let (mut app, _tmp) = setup();
    call(&mut app, "restoration.disable", json!({}));

    call(&mut app, "settings.set", json!({"key": "history.max_entries", "value": 80}));
    assert_eq!(call(&mut app, "restoration.status", json!({}))["enabled"], false);
    assert_eq!(call(&mut app, "debug.info", json!({}))["restoration_enabled"], false);

    call(&mut app, "settings.set", json!({"key": "restoration.enabled", "value": true}));
    assert_eq!(call(&mut app, "restoration.status", json!({}))["enabled"], true);
}

#[test]
fn test_settings_set_errors() {
    let (mut app, _tmp) = setup();
    let missing = handle_method(&mut app, "settings.set", &json!({"key": "restoration.enabled"}));
    assert_eq!(missing.unwrap_err(), "missing value");

    let bad_key = handle_method(&mut app, "settings.set", &json!({"key": "nope", "value": 1}));
    assert!(bad_key.unwrap_err().contains("Invalid settings key"));
}

// ─── Session ───

#[test]
fn test_session_reload_keeps_durable_positions() {
    let (mut app, _tmp) = setup();
    let session_id = app.session_id().to_string();
    navigate(&mut app, "/a", "imperative");
    app.tick();
    call(&mut app, "viewport.scroll", json!({"x": 0, "y": 640}));
    navigate(&mut app, "/b", "imperative");
    app.tick();

    let res = call(&mut app, "session.reload", json!({}));
    assert_eq!(res["session_id"], session_id.as_str());
    let info = call(&mut app, "debug.info", json!({}));
    assert_eq!(info["history"], json!([]));

    call(&mut app, "history.popstate", json!({}));
    let res = navigate(&mut app, "/a", "popstate");
    assert_eq!(res["kind"], "pop");
    assert_eq!(res["pending"]["y"], 640.0);
}

#[test]
fn test_session_end_forgets_positions() {
    let (mut app, _tmp) = setup();
    let old_session = app.session_id().to_string();
    navigate(&mut app, "/a", "imperative");
    app.tick();
    call(&mut app, "viewport.scroll", json!({"x": 0, "y": 640}));
    navigate(&mut app, "/b", "imperative");
    app.tick();

    let res = call(&mut app, "session.end", json!({}));
    assert_ne!(res["session_id"], old_session.as_str());

    let res = navigate(&mut app, "/a", "popstate");
    assert_eq!(res["pending"]["action"], "reset_to_top");
}

#[test]
fn test_resumed_session_sees_previous_positions() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("test.db");
    let settings_path = tmp.path().join("settings.json").to_string_lossy().to_string();

    let session_id = {
        let mut app =
            App::with_options(db_path.to_str().unwrap(), Some(settings_path.clone()), None).unwrap();
        navigate(&mut app, "/a", "imperative");
        app.tick();
        call(&mut app, "viewport.scroll", json!({"x": 0, "y": 360}));
        app.shutdown();
        app.session_id().to_string()
    };

    let mut app =
        App::with_options(db_path.to_str().unwrap(), Some(settings_path), Some(&session_id)).unwrap();
    let res = navigate(&mut app, "/a", "popstate");
    assert_eq!(res["pending"], json!({"action": "restore", "x": 0.0, "y": 360.0}));
}

// ─── Rate limiting ───

#[test]
fn test_rate_limiter_rejects_past_budget_until_next_window() {
    let start = Instant::now();
    let mut limiter = RateLimiter::new(3);
    assert!((0..3).all(|_| limiter.check_at(start)));
    assert!(!limiter.check_at(start + Duration::from_millis(500)));
    assert!(limiter.check_at(start + Duration::from_secs(1)));
}

#[test]
fn test_only_scroll_signal_is_rate_limited() {
    assert!(is_rate_limited("viewport.scroll"));
    for method in [
        "router.navigationStart",
        "router.navigationEnd",
        "router.navigationCancel",
        "history.popstate",
        "page.beforeUnload",
        "scroll.saveCurrent",
        "debug.info",
    ] {
        assert!(!is_rate_limited(method), "{} must not be throttled", method);
    }
}
