//! RPC method handler for the Scrollkeeper JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested. `handle_method`
//! translates host messages into scroll manager events and control calls.
//! Viewport changes are not part of the result; they are queued on the
//! remote viewport and pushed by the server as events.

use std::time::Instant;

use serde_json::{json, Value};

use crate::app::App;
use crate::managers::scroll_manager::ScrollManagerTrait;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::navigation::{NavigationEvent, NavigationTrigger};
use crate::types::scroll::{RouteKey, ScrollBehavior};

/// Only the high-frequency viewport signal is throttled. Lifecycle messages
/// always get through, or the outgoing snapshot and history would be lost.
pub fn is_rate_limited(method: &str) -> bool {
    method == "viewport.scroll"
}

/// Simple rate limiter: max requests per second.
pub struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    pub fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    pub fn check(&mut self) -> bool {
        self.check_at(Instant::now())
    }

    pub fn check_at(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.window_start).as_secs() >= 1 {
            self.window_start = now;
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", name))
}

fn f64_param(params: &Value, name: &str) -> Result<f64, String> {
    let value = params
        .get(name)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| format!("missing {}", name))?;
    if !value.is_finite() {
        return Err(format!("invalid {}: must be finite", name));
    }
    Ok(value)
}

fn behavior_param(params: &Value, default_smooth: bool) -> ScrollBehavior {
    let smooth = params
        .get("smooth")
        .and_then(|v| v.as_bool())
        .unwrap_or(default_smooth);
    ScrollBehavior::from_smooth(smooth)
}

/// Optional `{"scroll": {"x": .., "y": ..}}` carried by lifecycle messages so
/// the snapshot uses the offset at the moment the message was sent.
fn report_offset_param(app: &mut App, params: &Value) -> Result<Option<(f64, f64)>, String> {
    let Some(scroll) = params.get("scroll") else {
        return Ok(None);
    };
    let x = f64_param(scroll, "x")?;
    let y = f64_param(scroll, "y")?;
    app.scroll_manager.viewport_mut().report_offset(x, y);
    Ok(Some((x, y)))
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &mut App, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        // ─── Router lifecycle ───
        "router.navigationStart" => {
            let url = str_param(params, "url")?;
            let trigger = match params.get("trigger").and_then(|v| v.as_str()) {
                None | Some("imperative") => NavigationTrigger::Imperative,
                Some("popstate") => NavigationTrigger::Popstate,
                Some(other) => return Err(format!("invalid trigger: {}", other)),
            };
            let reported = report_offset_param(app, params)?;
            let backward = app
                .scroll_manager
                .on_navigation_start_at(url, trigger, reported);
            Ok(json!({"backward": backward}))
        }
        "router.navigationEnd" => {
            let url = str_param(params, "url")?;
            let (verdict, token) = app.scroll_manager.on_navigation_end(url);
            Ok(json!({
                "route": verdict.route,
                "kind": verdict.kind,
                "token": token.value(),
                "pending": app.scroll_manager.pending_action(),
            }))
        }
        "router.navigationCancel" => {
            app.scroll_manager.handle_event(NavigationEvent::Cancel);
            Ok(json!({"ok": true}))
        }
        "history.popstate" => {
            app.scroll_manager.handle_event(NavigationEvent::PopState);
            Ok(json!({"ok": true}))
        }

        // ─── Viewport signals ───
        "viewport.scroll" => {
            let x = f64_param(params, "x")?;
            let y = f64_param(params, "y")?;
            app.scroll_manager.viewport_mut().report_offset(x, y);
            app.scroll_manager.handle_event(NavigationEvent::Scroll { x, y });
            Ok(json!({"ok": true}))
        }
        "viewport.anchors" => {
            let anchors = match params.get("ids") {
                None | Some(Value::Null) => None,
                Some(Value::Array(ids)) => Some(
                    ids.iter()
                        .map(|v| v.as_str().map(str::to_string).ok_or("anchor ids must be strings"))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                Some(_) => return Err("ids must be an array or null".to_string()),
            };
            app.scroll_manager.viewport_mut().set_anchors(anchors);
            Ok(json!({"ok": true}))
        }
        "page.beforeUnload" => {
            report_offset_param(app, params)?;
            app.scroll_manager.handle_event(NavigationEvent::BeforeUnload);
            Ok(json!({"ok": true}))
        }

        // ─── Control surface ───
        "scroll.toTop" => {
            let behavior = behavior_param(params, app.scroll_manager.smooth_scroll_to_top());
            app.scroll_manager.scroll_to_top(behavior);
            Ok(json!({"ok": true}))
        }
        "scroll.toElement" => {
            let id = str_param(params, "id")?;
            let behavior = behavior_param(params, true);
            let found = app.scroll_manager.scroll_to_element(id, behavior);
            Ok(json!({"found": found}))
        }
        "scroll.to" => {
            let x = f64_param(params, "x")?;
            let y = f64_param(params, "y")?;
            let behavior = behavior_param(params, false);
            app.scroll_manager.scroll_to(x, y, behavior);
            Ok(json!({"ok": true}))
        }
        "scroll.saveCurrent" => {
            report_offset_param(app, params)?;
            let saved = app.scroll_manager.save_current_position();
            Ok(json!({"saved": saved}))
        }
        "scroll.clear" => {
            let route = RouteKey::new(str_param(params, "route")?);
            app.scroll_manager.clear_position(&route);
            Ok(json!({"ok": true}))
        }
        "scroll.clearAll" => {
            app.scroll_manager.clear_all_positions();
            Ok(json!({"ok": true}))
        }

        // ─── Restoration ───
        "restoration.enable" => {
            app.scroll_manager.enable_restoration();
            Ok(json!({"enabled": true}))
        }
        "restoration.disable" => {
            app.scroll_manager.disable_restoration();
            Ok(json!({"enabled": false}))
        }
        "restoration.status" => Ok(json!({"enabled": app.scroll_manager.is_restoration_enabled()})),

        // ─── History / debug ───
        "history.reset" => {
            app.scroll_manager.reset_history();
            Ok(json!({"ok": true}))
        }
        "debug.info" => {
            let info = app.scroll_manager.debug_info();
            serde_json::to_value(info).map_err(|e| e.to_string())
        }

        // ─── Settings ───
        "settings.get" => {
            let settings = app.settings_engine.get_settings();
            serde_json::to_value(settings).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            app.settings_engine.set_value(key, value).map_err(|e| e.to_string())?;
            app.apply_settings(key);
            Ok(json!({"ok": true}))
        }

        // ─── Session ───
        "session.reload" => {
            app.reload();
            Ok(json!({"ok": true, "session_id": app.session_id()}))
        }
        "session.end" => {
            app.end_session().map_err(|e| e.to_string())?;
            Ok(json!({"ok": true, "session_id": app.session_id()}))
        }

        "ping" => Ok(json!({"pong": true})),

        _ => Err(format!("unknown method: {}", method)),
    }
}
