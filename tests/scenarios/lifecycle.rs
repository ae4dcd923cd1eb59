/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::time::Duration;

use rstest::rstest;
use webappmanager::platform::WindowHostState;
use webappmanager::{LaunchError, PreloadState};

use crate::common::{APP, Harness};

#[test]
fn one_running_entry_per_instance_id() {
    let mut h = Harness::new();
    h.launch(APP, r#"{"instanceId":"1"}"#);
    h.launch(APP, r#"{"instanceId":"1","note":"again"}"#);

    assert_eq!(h.manager.running_apps().count(), 1);
    assert_eq!(h.manager.app_pages("com.example.app"), ["1"]);
    assert_eq!(h.platform.views("com.example.app").len(), 1);
}

#[test]
fn launch_posts_the_running_list_with_the_render_pid() {
    let mut h = Harness::new();
    let id = h.launch(APP, "{}");

    let list = h.bus.last_running_app_list().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].instance_id, id);
    assert_eq!(list[0].pid, h.app(&id).web_process_pid());
    assert!(list[0].pid.is_some());
}

#[test]
fn rejected_launch_leaves_no_trace() {
    let mut h = Harness::new();
    let result = h
        .manager
        .launch(r#"{"id":"com.example.app","subType":"custom"}"#, "{}", "");
    assert_eq!(result, Err(LaunchError::UnsupportedType));
    assert_eq!(h.manager.running_apps().count(), 0);
    assert!(h.platform.view("com.example.app").is_none());
    assert!(h.bus.last_running_app_list().is_none());
}

#[test]
fn keep_alive_close_hides_instead_of_tearing_down() {
    let mut h = Harness::new();
    h.launch(APP, r#"{"instanceId":"1","keepAlive":true}"#);
    let view = h.platform.view("com.example.app").unwrap();

    assert!(h.manager.on_kill_app("com.example.app", "1", false));
    h.manager.spin_event_loop();

    assert!(h.manager.is_running_app("1"));
    assert_eq!(h.manager.closing_count(), 0);
    assert!(h.app("1").hidden_window());
    assert!(!view.state().scripts.iter().any(|s| s.contains("_onCloseWithNotify_")));
    assert!(!view.state().loads.iter().any(|url| url == "about:blank"));
}

#[test]
fn plain_close_unloads_then_releases_the_app() {
    let mut h = Harness::new();
    h.launch(APP, r#"{"instanceId":"1"}"#);
    let view = h.platform.view("com.example.app").unwrap();

    h.manager.on_kill_app("com.example.app", "1", false);
    h.manager.spin_event_loop();

    assert!(!h.manager.is_running_app("1"));
    assert_eq!(h.manager.closing_count(), 0);
    assert_eq!(view.state().loads.last().map(String::as_str), Some("about:blank"));
}

#[test]
fn close_request_round_trips_through_the_bus() {
    let mut h = Harness::new();
    h.launch(APP, r#"{"instanceId":"1"}"#);
    h.manager.close_app("1");
    assert!(h.manager.is_running_app("1"));

    for instance_id in h.bus.take_close_requests() {
        h.manager.on_kill_app("com.example.app", &instance_id, false);
    }
    h.manager.spin_event_loop();
    assert!(!h.manager.is_running_app("1"));
}

#[rstest]
#[case::normal(WindowHostState::Default, 2)]
#[case::fullscreen(WindowHostState::Fullscreen, 3)]
#[case::maximized(WindowHostState::Maximized, 3)]
fn foreground_crashes_close_at_the_limit(#[case] state: WindowHostState, #[case] limit: u32) {
    let mut h = Harness::new();
    h.launch(APP, r#"{"instanceId":"1"}"#);
    h.manager.set_window_host_state("1", state);
    h.manager.spin_event_loop();

    for crash in 1..=limit {
        h.platform.view("com.example.app").unwrap().crash();
        h.manager.spin_event_loop();
        if crash < limit {
            assert!(h.manager.is_running_app("1"), "closed early on crash {crash}");
            assert_eq!(h.manager.crash_count("com.example.app"), crash);
        }
    }
    assert!(!h.manager.is_running_app("1"));
    assert_eq!(h.manager.crash_count("com.example.app"), 0);
}

#[test]
fn background_crash_reloads_on_relaunch() {
    let mut h = Harness::new();
    h.launch(APP, r#"{"instanceId":"1"}"#);
    h.manager.set_window_host_state("1", WindowHostState::Minimized);
    h.manager.spin_event_loop();

    h.platform.view("com.example.app").unwrap().crash();
    h.manager.spin_event_loop();
    assert!(h.app("1").crash_state());

    h.launch(APP, r#"{"instanceId":"1"}"#);
    assert!(!h.app("1").crash_state());
    let view = h.platform.view("com.example.app").unwrap();
    assert!(view.state().loads.iter().any(|url| url.ends_with("index.html")));
}

#[test]
fn partial_preload_then_relaunch_restores_the_page() {
    let mut h = Harness::new();
    h.launch(APP, r#"{"instanceId":"1","preload":"partial"}"#);
    let view = h.platform.view("com.example.app").unwrap();

    assert_eq!(h.app("1").preload_state(), PreloadState::Partial);
    assert!(h.app("1").hidden_window());
    assert!(view.state().disk_cache_write_blocked);
    assert!(view.state().media_suspended);

    h.launch(APP, r#"{"instanceId":"1"}"#);

    assert_eq!(h.app("1").preload_state(), PreloadState::None);
    assert!(!h.app("1").hidden_window());
    assert!(!view.state().disk_cache_write_blocked);
    assert!(!view.state().media_suspended);
}

#[test]
fn preload_relaunch_keeps_the_app_hidden() {
    let mut h = Harness::new();
    h.launch(APP, r#"{"instanceId":"1","preload":"partial"}"#);
    h.launch(APP, r#"{"instanceId":"1","preload":"partial"}"#);
    assert!(h.app("1").hidden_window());
}

#[test]
fn close_callback_that_never_answers_is_forced() {
    let mut h = Harness::new();
    h.launch(APP, r#"{"instanceId":"1"}"#);
    let view = h.platform.view("com.example.app").unwrap();
    view.emit(webappmanager::platform::EngineEvent::HasCloseCallback(true));
    h.manager.spin_event_loop();

    h.manager.on_kill_app("com.example.app", "1", false);
    h.manager.spin_event_loop();
    assert_eq!(h.manager.closing_count(), 1);

    h.manager.advance_clock(Duration::from_secs(11));
    assert_eq!(h.manager.closing_count(), 0);
}
