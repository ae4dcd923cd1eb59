/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fs;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;
use webappmanager::registries::{
    DefaultWebAppFactory, FactoryPluginRegistration, InventoryBackend, PluginLoader,
    WebAppFactory,
};
use webappmanager::runtime::WamContext;
use webappmanager::{
    ApplicationDescription, LaunchError, WebApp, WebAppManagerConfig, WebPage, WindowType,
};

use crate::common::Harness;

const MODULE: &str = "libscenario-extended.so";

static CREATED: AtomicUsize = AtomicUsize::new(0);

/// Built-in behaviour, plus a window property naming the plugin.
struct ExtendedFactory;

impl WebAppFactory for ExtendedFactory {
    fn create_web_app(
        &self,
        window_type: WindowType,
        desc: Rc<ApplicationDescription>,
        ctx: &Rc<WamContext>,
    ) -> Option<WebApp> {
        let app = DefaultWebAppFactory.create_web_app(window_type, desc, ctx)?;
        app.set_window_property("factory", "extended");
        Some(app)
    }

    fn create_web_page(
        &self,
        window_type: WindowType,
        url: &str,
        desc: Rc<ApplicationDescription>,
        launch_params: &str,
        ctx: &Rc<WamContext>,
    ) -> Option<WebPage> {
        DefaultWebAppFactory.create_web_page(window_type, url, desc, launch_params, ctx)
    }
}

fn create_instance() -> Rc<dyn WebAppFactory> {
    CREATED.fetch_add(1, Ordering::SeqCst);
    Rc::new(ExtendedFactory)
}

fn delete_instance(_factory: Rc<dyn WebAppFactory>) {}

inventory::submit! {
    FactoryPluginRegistration {
        module: MODULE,
        app_type: "extended",
        create_instance,
        delete_instance,
    }
}

fn plugin_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(MODULE), b"").unwrap();
    fs::write(dir.path().join("README"), b"not a plugin").unwrap();
    dir
}

fn harness(dir: &TempDir, types: &[&str], on_demand: bool) -> Harness {
    Harness::with_config(WebAppManagerConfig {
        plugin_types: types.iter().map(|t| t.to_string()).collect(),
        plugin_path: dir.path().to_path_buf(),
        dynamic_pluggable_load_enabled: on_demand,
        ..WebAppManagerConfig::default()
    })
}

#[test]
fn plugin_factory_serves_its_app_type() {
    let dir = plugin_dir();
    let mut h = harness(&dir, &["extended"], true);
    assert!(!h.manager.factory().has_factory("extended"));

    let id = h.launch(r#"{"id":"com.example.ext","subType":"extended"}"#, "{}");

    assert!(h.manager.factory().has_factory("extended"));
    let window = h.platform.window(&id).unwrap();
    assert_eq!(window.property("factory").as_deref(), Some("extended"));
}

#[test]
fn eager_loading_instantiates_at_startup() {
    let dir = plugin_dir();
    let h = harness(&dir, &["extended"], false);
    assert!(h.manager.factory().has_factory("extended"));
    assert!(h.manager.factory().loader().is_loaded(&dir.path().join(MODULE)));
}

#[test]
fn unlisted_plugin_type_is_unsupported() {
    let dir = plugin_dir();
    let mut h = harness(&dir, &[], true);

    let result = h.manager.launch(
        r#"{"id":"com.example.ext","subType":"extended"}"#,
        r#"{"instanceId":"1"}"#,
        "",
    );

    assert_eq!(result, Err(LaunchError::UnsupportedType));
    assert!(!h.manager.is_running_app("1"));
    assert!(!h.manager.factory().loader().is_loaded(&dir.path().join(MODULE)));
}

#[test]
fn default_apps_ignore_the_plugin() {
    let dir = plugin_dir();
    let mut h = harness(&dir, &["extended"], true);
    let id = h.launch(r#"{"id":"com.example.plain"}"#, "{}");
    let window = h.platform.window(&id).unwrap();
    assert!(window.property("factory").is_none());
}

#[test]
fn loader_caches_the_factory_instance() {
    let dir = plugin_dir();
    let path = dir.path().join(MODULE);
    let mut loader = PluginLoader::new(InventoryBackend::default());

    assert!(loader.load(&path));
    assert!(loader.load(&path));
    assert_eq!(loader.app_type(&path), "extended");

    let before = CREATED.load(Ordering::SeqCst);
    let first = loader.web_app_factory_instance(&path).unwrap();
    let second = loader.web_app_factory_instance(&path).unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert!(CREATED.load(Ordering::SeqCst) >= before + 1);

    loader.unload(&path);
    assert!(!loader.is_loaded(&path));
    assert_eq!(loader.app_type(&path), "");
}
