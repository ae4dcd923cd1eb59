/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! App-type to factory resolution.
//!
//! The manager always knows the built-in `default` factory. Other app types
//! come from plugin modules in the configured plugin directory, and only
//! types named in the configuration are ever looked up. Plugins are loaded
//! either all at construction or on first use of their type.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, info, warn};

use crate::host::application_description::ApplicationDescription;
use crate::host::config::WebAppManagerConfig;
use crate::host::web_app::WebApp;
use crate::host::web_page::WebPage;
use crate::host::window_types::WindowType;
use crate::registries::default_factory::DefaultWebAppFactory;
use crate::registries::plugin_loader::{InventoryBackend, ModuleBackend, PluginLoader};
use crate::runtime::WamContext;

pub const DEFAULT_APP_TYPE: &str = "default";

/// Creates apps and pages for one app type.
pub trait WebAppFactory {
    fn create_web_app(
        &self,
        window_type: WindowType,
        desc: Rc<ApplicationDescription>,
        ctx: &Rc<WamContext>,
    ) -> Option<WebApp>;

    fn create_web_page(
        &self,
        window_type: WindowType,
        url: &str,
        desc: Rc<ApplicationDescription>,
        launch_params: &str,
        ctx: &Rc<WamContext>,
    ) -> Option<WebPage>;
}

pub struct WebAppFactoryManager<B: ModuleBackend = InventoryBackend> {
    factories: BTreeMap<String, Rc<dyn WebAppFactory>>,
    allowed_types: BTreeSet<String>,
    plugin_path: PathBuf,
    load_on_demand: bool,
    loader: PluginLoader<B>,
}

impl WebAppFactoryManager<InventoryBackend> {
    pub fn new(config: &WebAppManagerConfig) -> Self {
        Self::with_backend(config, InventoryBackend::default())
    }
}

impl<B: ModuleBackend> WebAppFactoryManager<B> {
    pub fn with_backend(config: &WebAppManagerConfig, backend: B) -> Self {
        let mut allowed_types: BTreeSet<String> = config.plugin_types.iter().cloned().collect();
        allowed_types.insert(DEFAULT_APP_TYPE.to_string());

        let mut factories: BTreeMap<String, Rc<dyn WebAppFactory>> = BTreeMap::new();
        factories.insert(DEFAULT_APP_TYPE.to_string(), Rc::new(DefaultWebAppFactory));

        let mut manager = Self {
            factories,
            allowed_types,
            plugin_path: config.plugin_path.clone(),
            load_on_demand: config.dynamic_pluggable_load_enabled,
            loader: PluginLoader::new(backend),
        };
        debug!(
            "factory types allowed: {:?}, on demand: {}",
            manager.allowed_types, manager.load_on_demand
        );
        if !manager.load_on_demand {
            manager.load_pluggable("");
        }
        manager
    }

    /// Factory for `app_type`, loading its plugin if it is not cached yet.
    pub fn get_pluggable(&mut self, app_type: &str) -> Option<Rc<dyn WebAppFactory>> {
        if let Some(factory) = self.factories.get(app_type) {
            return Some(Rc::clone(factory));
        }
        self.load_pluggable(app_type)
    }

    /// Scans the plugin directory in file-name order. With an empty
    /// `app_type` every plugin is instantiated (when not on demand) and
    /// nothing is returned; otherwise the first plugin whose declared type
    /// contains `app_type` is returned.
    pub fn load_pluggable(&mut self, app_type: &str) -> Option<Rc<dyn WebAppFactory>> {
        if !app_type.is_empty() && !self.allowed_types.contains(app_type) {
            debug!("app type {app_type} is not allowed");
            return None;
        }

        for file in plugin_files(&self.plugin_path) {
            if !self.loader.load(&file) {
                if let Some(e) = self.loader.last_error() {
                    warn!("failed to load plugin {}: {e}", file.display());
                }
                continue;
            }
            let key = self.loader.app_type(&file);
            if !key.contains(app_type) && self.load_on_demand {
                continue;
            }
            match self.loader.web_app_factory_instance(&file) {
                Some(factory) => {
                    info!("factory for app type '{key}' from {}", file.display());
                    self.factories.insert(key, Rc::clone(&factory));
                    if !app_type.is_empty() {
                        return Some(factory);
                    }
                }
                None => {
                    if let Some(e) = self.loader.last_error() {
                        warn!("plugin {} produced no factory: {e}", file.display());
                    }
                    self.loader.unload(&file);
                    if !app_type.is_empty() {
                        return None;
                    }
                }
            }
        }
        None
    }

    pub fn create_web_app(
        &mut self,
        window_type: WindowType,
        desc: Rc<ApplicationDescription>,
        app_type: &str,
        ctx: &Rc<WamContext>,
    ) -> Option<WebApp> {
        self.get_pluggable(app_type)?
            .create_web_app(window_type, desc, ctx)
    }

    /// Creates and initialises a page. Unknown app types fall back to the
    /// built-in factory.
    pub fn create_web_page(
        &mut self,
        window_type: WindowType,
        url: &str,
        desc: Rc<ApplicationDescription>,
        app_type: &str,
        launch_params: &str,
        ctx: &Rc<WamContext>,
    ) -> Option<WebPage> {
        let factory = self
            .get_pluggable(app_type)
            .or_else(|| self.factories.get(DEFAULT_APP_TYPE).cloned())?;
        let mut page = factory.create_web_page(window_type, url, desc, launch_params, ctx)?;
        page.init();
        Some(page)
    }

    pub fn has_factory(&self, app_type: &str) -> bool {
        self.factories.contains_key(app_type)
    }

    pub fn cached_types(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn loader(&self) -> &PluginLoader<B> {
        &self.loader
    }
}

fn plugin_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("plugin directory {} unavailable: {e}", dir.display());
            return Vec::new();
        }
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}
