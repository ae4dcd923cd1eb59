/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fs;
use std::path::Path;

use rstest::rstest;
use tempfile::TempDir;
use webappmanager::WebAppManagerConfig;

use crate::common::Harness;

const REMOTE_APP: &str = r#"{"id":"com.example.remote","main":"https://remote.test/app/index.html"}"#;
const REMOTE_URL: &str = "https://remote.test/app/index.html";
const NET_ERROR_IDENTIFIER: &str = "com.webos.settingsservice.client";

fn app_folder() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
    dir
}

fn local_app(folder: &Path) -> String {
    format!(
        r#"{{"id":"com.example.local","main":"index.html","folderPath":"{}"}}"#,
        folder.display()
    )
}

fn error_page_harness(error_dir: &Path) -> Harness {
    Harness::with_config(WebAppManagerConfig {
        plugin_path: std::env::temp_dir().join("webappmanager-scenarios-no-plugins"),
        error_page_url: format!("file://{}/loaderror.html", error_dir.display()),
        ..WebAppManagerConfig::default()
    })
}

#[test]
fn local_entry_point_becomes_a_file_url() {
    let folder = app_folder();
    let mut h = Harness::new();
    let id = h.launch(&local_app(folder.path()), "{}");
    let expected = format!("file://{}/index.html", folder.path().display());
    assert_eq!(h.page(&id).default_url(), expected);
}

#[test]
fn platform_deep_link_replaces_the_default_url() {
    let folder = app_folder();
    let mut h = Harness::new();
    h.launch(
        &local_app(folder.path()),
        r#"{"contentTarget":"https://deep.test/item/7","handledBy":"platform"}"#,
    );
    let view = h.platform.view("com.example.local").unwrap();
    assert_eq!(view.state().loads, ["https://deep.test/item/7"]);
}

#[rstest]
#[case::by_app(r#"{"contentTarget":"https://deep.test/x","handledBy":"app"}"#)]
#[case::by_default(r#"{"contentTarget":"https://deep.test/x"}"#)]
#[case::no_target(r#"{"handledBy":"platform"}"#)]
fn other_deep_links_load_the_default_url(#[case] params: &str) {
    let folder = app_folder();
    let mut h = Harness::new();
    h.launch(&local_app(folder.path()), params);
    let view = h.platform.view("com.example.local").unwrap();
    let loads = view.state().loads.clone();
    assert_eq!(loads.len(), 1);
    assert!(loads[0].starts_with("file://"));
    assert!(loads[0].ends_with("index.html"));
}

#[test]
fn failed_load_round_trips_through_the_error_page() {
    let error_dir = tempfile::tempdir().unwrap();
    fs::write(error_dir.path().join("loaderror.html"), "error").unwrap();
    let mut h = error_page_harness(error_dir.path());
    h.platform.fail_url(REMOTE_URL, 404);

    let id = h.launch(REMOTE_APP, "{}");

    let view = h.platform.view("com.example.remote").unwrap();
    let expected = format!(
        "file://{}/loaderror.html?errorCode=404&hostname=remote.test",
        error_dir.path().display()
    );
    assert_eq!(view.state().loads, [REMOTE_URL.to_string(), expected]);

    let page = h.page(&id);
    assert!(page.is_load_error_page_start());
    assert!(page.is_load_error_page_finish());
    assert_eq!(page.identifier(), NET_ERROR_IDENTIFIER);
    assert_eq!(page.trust_level(), "trusted");
}

#[test]
fn leaving_the_error_page_restores_the_app_identity() {
    let error_dir = tempfile::tempdir().unwrap();
    fs::write(error_dir.path().join("loaderror.html"), "error").unwrap();
    let mut h = error_page_harness(error_dir.path());
    h.platform.fail_url(REMOTE_URL, 404);
    let id = h.launch(REMOTE_APP, "{}");

    h.platform.clear_failures();
    h.manager
        .find_app_by_instance_id_mut(&id)
        .and_then(|app| app.page_mut())
        .unwrap()
        .load_url(REMOTE_URL);
    h.manager.spin_event_loop();

    let page = h.page(&id);
    assert!(!page.is_load_error_page_finish());
    assert_eq!(page.identifier(), "com.example.remote");
    assert_eq!(page.trust_level(), "default");
}

#[test]
fn localized_error_page_is_preferred() {
    let error_dir = tempfile::tempdir().unwrap();
    fs::write(error_dir.path().join("loaderror.html"), "error").unwrap();
    let localized = error_dir.path().join("resources/en/html");
    fs::create_dir_all(&localized).unwrap();
    fs::write(localized.join("loaderror.html"), "error").unwrap();
    let mut h = error_page_harness(error_dir.path());
    h.platform.fail_url(REMOTE_URL, 500);

    h.launch(REMOTE_APP, "{}");

    let view = h.platform.view("com.example.remote").unwrap();
    let last = view.state().loads.last().cloned().unwrap();
    assert!(last.contains("/resources/en/html/loaderror.html?errorCode=500"));
}

#[test]
fn failed_preload_closes_without_the_error_page() {
    let error_dir = tempfile::tempdir().unwrap();
    fs::write(error_dir.path().join("loaderror.html"), "error").unwrap();
    let mut h = error_page_harness(error_dir.path());
    h.platform.fail_url(REMOTE_URL, 404);

    let id = h.launch(REMOTE_APP, r#"{"preload":"partial"}"#);

    assert!(!h.manager.is_running_app(&id));
    assert_eq!(h.manager.closing_count(), 0);
    let view = h.platform.view("com.example.remote").unwrap();
    assert!(!view.state().loads.iter().any(|url| url.contains("loaderror.html")));
}
