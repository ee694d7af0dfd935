//! Scrollkeeper demo mode.
//!
//! Walks the scroll manager through a list/detail browsing session against an
//! in-memory viewport and session storage, printing what it decides at each
//! step. The host-facing bridge lives in the `scrollkeeper-rpc` binary.

use std::error::Error;

use scrollkeeper::managers::scroll_manager::{ScrollManager, ScrollManagerTrait};
use scrollkeeper::services::clock::ManualClock;
use scrollkeeper::services::session_storage::{MemorySessionStorage, SessionStorage};
use scrollkeeper::services::viewport::{RemoteViewport, Viewport};
use scrollkeeper::types::navigation::{NavigationEvent, NavigationTrigger};
use scrollkeeper::types::scroll::{RouteKey, ScrollBehavior};
use scrollkeeper::types::settings::ScrollSettings;

type DemoManager = ScrollManager<RemoteViewport, MemorySessionStorage>;

fn main() -> Result<(), Box<dyn Error>> {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              Scrollkeeper v{} - Demo Mode                ║", env!("CARGO_PKG_VERSION"));
    println!("║     Navigation-aware scroll position restoration           ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let clock = ManualClock::new(1_700_000_000_000);
    let mut mgr: DemoManager = ScrollManager::with_clock(
        RemoteViewport::new(),
        MemorySessionStorage::new(),
        &ScrollSettings::default(),
        Box::new(clock.clone()),
    );

    demo_forward_navigation(&mut mgr, &clock);
    demo_back_navigation(&mut mgr, &clock);
    demo_controls(&mut mgr);
    demo_reload(mgr)?;

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  ✅ Scroll restoration walkthrough complete!");
    println!("═══════════════════════════════════════════════════════════════");
    Ok(())
}

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn navigate(mgr: &mut DemoManager, url: &str, trigger: NavigationTrigger) {
    mgr.handle_event(NavigationEvent::Start {
        url: url.to_string(),
        trigger,
    });
    let (verdict, token) = mgr.on_navigation_end(url);
    let applied = mgr.run_restoration(token);
    println!(
        "  {:<10} {:?} -> {:?}, viewport at {:?}",
        verdict.route.as_str(),
        verdict.kind,
        applied,
        mgr.viewport().scroll_offset()
    );
}

fn user_scroll(mgr: &mut DemoManager, clock: &ManualClock, y: f64) {
    clock.advance(1_500);
    mgr.viewport_mut().report_offset(0.0, y);
    mgr.handle_event(NavigationEvent::Scroll { x: 0.0, y });
    println!("  user scrolled to y = {}", y);
}

fn demo_forward_navigation(mgr: &mut DemoManager, clock: &ManualClock) {
    section("Forward Navigation");

    navigate(mgr, "/jobs", NavigationTrigger::Imperative);
    user_scroll(mgr, clock, 800.0);
    navigate(mgr, "/jobs/42", NavigationTrigger::Imperative);
    user_scroll(mgr, clock, 300.0);
    println!("  History: {:?}", mgr.history());
    println!("  ✓ New routes start at the top");
    println!();
}

fn demo_back_navigation(mgr: &mut DemoManager, clock: &ManualClock) {
    section("Back Navigation");

    mgr.handle_event(NavigationEvent::PopState);
    navigate(mgr, "/jobs", NavigationTrigger::Popstate);
    clock.advance(500);

    // Two transitions in quick succession: only the latest one is applied.
    mgr.on_navigation_start("/jobs/7", NavigationTrigger::Imperative);
    let (_, stale) = mgr.on_navigation_end("/jobs/7");
    mgr.on_navigation_start("/jobs", NavigationTrigger::Popstate);
    let (_, latest) = mgr.on_navigation_end("/jobs");
    println!("  stale token applied: {:?}", mgr.run_restoration(stale));
    println!("  latest token applied: {:?}", mgr.run_restoration(latest));
    println!("  ✓ Back restores the saved offset, latest transition wins");
    println!();
}

fn demo_controls(mgr: &mut DemoManager) {
    section("Control Surface");

    mgr.viewport_mut()
        .set_anchors(Some(vec!["apply".to_string(), "footer".to_string()]));
    println!("  scroll to #apply: {}", mgr.scroll_to_element("apply", ScrollBehavior::Smooth));
    println!("  scroll to #missing: {}", mgr.scroll_to_element("missing", ScrollBehavior::Smooth));
    mgr.scroll_to_top(ScrollBehavior::Smooth);
    println!("  Viewport commands queued: {}", mgr.viewport().pending_commands().len());

    mgr.disable_restoration();
    navigate(mgr, "/jobs/42", NavigationTrigger::Imperative);
    mgr.handle_event(NavigationEvent::PopState);
    navigate(mgr, "/jobs", NavigationTrigger::Popstate);
    mgr.enable_restoration();

    let info = mgr.debug_info();
    for entry in &info.positions {
        println!(
            "  stored {:<10} ({}, {}) age {} ms",
            entry.route.as_str(),
            entry.position.x,
            entry.position.y,
            entry.age_ms
        );
    }
    println!("  ✓ Controls act immediately; disabled restoration always resets");
    println!();
}

fn demo_reload(mut mgr: DemoManager) -> Result<(), Box<dyn Error>> {
    section("Reload");

    mgr.handle_event(NavigationEvent::BeforeUnload);
    mgr.reload();
    let jobs = RouteKey::new("/jobs");
    println!("  History after reload: {:?}", mgr.history());
    println!("  /jobs survives in session storage: {:?}", mgr.stored_position(&jobs));

    let (_, storage) = mgr.into_environment();
    let keys = storage.keys()?;
    println!("  Session storage keys: {:?}", keys);
    println!("  ✓ Durable tier outlives the page");
    println!();
    Ok(())
}
