/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Factory plugin modules.
//!
//! A plugin is a file in the plugin directory paired with a
//! [`FactoryPluginRegistration`] submitted through `inventory`. The file name
//! selects the registration; the registration provides the declared app type
//! and the create/delete entry points. Loading goes through a
//! [`ModuleBackend`] so other module mechanisms can sit behind the same
//! [`PluginLoader`] cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, info, warn};

use crate::registries::WebAppFactory;

pub type CreateInstanceFn = fn() -> Rc<dyn WebAppFactory>;
pub type DeleteInstanceFn = fn(Rc<dyn WebAppFactory>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// The module file does not exist or could not be opened.
    NotFound(String),
    /// The module lacks an entry point.
    MissingSymbol { module: String, symbol: &'static str },
    /// The module opened but refused to produce a factory.
    Rejected(String),
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginError::NotFound(path) => write!(f, "plugin module not found: {path}"),
            PluginError::MissingSymbol { module, symbol } => {
                write!(f, "plugin module {module} has no symbol {symbol}")
            }
            PluginError::Rejected(reason) => write!(f, "plugin rejected: {reason}"),
        }
    }
}

impl std::error::Error for PluginError {}

/// Static description of one factory plugin.
pub struct FactoryPluginRegistration {
    /// File name of the module in the plugin directory.
    pub module: &'static str,
    pub app_type: &'static str,
    pub create_instance: CreateInstanceFn,
    pub delete_instance: DeleteInstanceFn,
}

inventory::collect!(FactoryPluginRegistration);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleHandle(u64);

impl ModuleHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Opens modules and resolves their entry points.
pub trait ModuleBackend {
    fn open(&mut self, path: &Path) -> Result<ModuleHandle, PluginError>;
    fn app_type(&self, handle: ModuleHandle) -> Option<String>;
    fn resolve_create(&self, handle: ModuleHandle) -> Option<CreateInstanceFn>;
    fn resolve_delete(&self, handle: ModuleHandle) -> Option<DeleteInstanceFn>;
    fn close(&mut self, handle: ModuleHandle);
}

/// Resolves modules against the registrations linked into the binary.
#[derive(Default)]
pub struct InventoryBackend {
    next_handle: u64,
    open: HashMap<ModuleHandle, &'static FactoryPluginRegistration>,
}

impl InventoryBackend {
    fn registration(&self, handle: ModuleHandle) -> Option<&'static FactoryPluginRegistration> {
        self.open.get(&handle).copied()
    }
}

pub fn registered_plugins() -> Vec<&'static FactoryPluginRegistration> {
    inventory::iter::<FactoryPluginRegistration>
        .into_iter()
        .collect()
}

impl ModuleBackend for InventoryBackend {
    fn open(&mut self, path: &Path) -> Result<ModuleHandle, PluginError> {
        if !path.is_file() {
            return Err(PluginError::NotFound(path.display().to_string()));
        }
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let registration = inventory::iter::<FactoryPluginRegistration>
            .into_iter()
            .find(|registration| registration.module == file_name)
            .ok_or_else(|| {
                PluginError::Rejected(format!("no factory registered for module {file_name}"))
            })?;

        let handle = ModuleHandle(self.next_handle);
        self.next_handle += 1;
        self.open.insert(handle, registration);
        Ok(handle)
    }

    fn app_type(&self, handle: ModuleHandle) -> Option<String> {
        self.registration(handle)
            .map(|registration| registration.app_type.to_string())
    }

    fn resolve_create(&self, handle: ModuleHandle) -> Option<CreateInstanceFn> {
        self.registration(handle)
            .map(|registration| registration.create_instance)
    }

    fn resolve_delete(&self, handle: ModuleHandle) -> Option<DeleteInstanceFn> {
        self.registration(handle)
            .map(|registration| registration.delete_instance)
    }

    fn close(&mut self, handle: ModuleHandle) {
        self.open.remove(&handle);
    }
}

struct LoadedModule {
    handle: ModuleHandle,
    instance: Option<Rc<dyn WebAppFactory>>,
}

/// Per-path cache of opened plugin modules and the factory each produced.
pub struct PluginLoader<B: ModuleBackend = InventoryBackend> {
    backend: B,
    modules: HashMap<PathBuf, LoadedModule>,
    last_error: Option<PluginError>,
}

impl Default for PluginLoader<InventoryBackend> {
    fn default() -> Self {
        Self::new(InventoryBackend::default())
    }
}

impl<B: ModuleBackend> PluginLoader<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            modules: HashMap::new(),
            last_error: None,
        }
    }

    /// Opens the module at `path`. Loading a path twice opens it once.
    pub fn load(&mut self, path: &Path) -> bool {
        self.last_error = None;
        if self.modules.contains_key(path) {
            return true;
        }
        match self.backend.open(path) {
            Ok(handle) => {
                debug!("opened plugin module {}", path.display());
                self.modules.insert(
                    path.to_path_buf(),
                    LoadedModule {
                        handle,
                        instance: None,
                    },
                );
                true
            }
            Err(e) => {
                self.last_error = Some(e);
                false
            }
        }
    }

    /// Declared app type of a loaded module, or empty if `path` was never
    /// loaded.
    pub fn app_type(&self, path: &Path) -> String {
        self.modules
            .get(path)
            .and_then(|module| self.backend.app_type(module.handle))
            .unwrap_or_default()
    }

    /// Factory for a loaded module, created on first request and cached.
    pub fn web_app_factory_instance(&mut self, path: &Path) -> Option<Rc<dyn WebAppFactory>> {
        let Some(module) = self.modules.get_mut(path) else {
            self.last_error = Some(PluginError::NotFound(path.display().to_string()));
            return None;
        };
        if let Some(instance) = &module.instance {
            return Some(Rc::clone(instance));
        }
        let Some(create) = self.backend.resolve_create(module.handle) else {
            self.last_error = Some(PluginError::MissingSymbol {
                module: path.display().to_string(),
                symbol: "create_instance",
            });
            return None;
        };
        let instance = create();
        module.instance = Some(Rc::clone(&instance));
        info!("created factory from plugin {}", path.display());
        Some(instance)
    }

    /// Deletes the module's factory, if one was created, and closes it.
    pub fn unload(&mut self, path: &Path) {
        let Some(module) = self.modules.remove(path) else {
            return;
        };
        self.release(path, module);
    }

    pub fn is_loaded(&self, path: &Path) -> bool {
        self.modules.contains_key(path)
    }

    pub fn last_error(&self) -> Option<&PluginError> {
        self.last_error.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn release(&mut self, path: &Path, module: LoadedModule) {
        if let Some(instance) = module.instance {
            match self.backend.resolve_delete(module.handle) {
                Some(delete) => delete(instance),
                None => warn!("plugin {} has no delete entry point", path.display()),
            }
        }
        self.backend.close(module.handle);
    }
}

impl<B: ModuleBackend> Drop for PluginLoader<B> {
    fn drop(&mut self) {
        let modules: Vec<_> = self.modules.drain().collect();
        for (path, module) in modules {
            self.release(&path, module);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::host::window_types::WindowType;
    use crate::host::{ApplicationDescription, WebApp, WebPage};
    use crate::runtime::WamContext;
    use std::cell::{Cell, RefCell};

    pub(crate) struct NullFactory;

    impl WebAppFactory for NullFactory {
        fn create_web_app(
            &self,
            _window_type: WindowType,
            _desc: Rc<ApplicationDescription>,
            _ctx: &Rc<WamContext>,
        ) -> Option<WebApp> {
            None
        }

        fn create_web_page(
            &self,
            _window_type: WindowType,
            _url: &str,
            _desc: Rc<ApplicationDescription>,
            _launch_params: &str,
            _ctx: &Rc<WamContext>,
        ) -> Option<WebPage> {
            None
        }
    }

    thread_local! {
        static CREATED: Cell<usize> = const { Cell::new(0) };
        static DELETED: Cell<usize> = const { Cell::new(0) };
    }

    fn create() -> Rc<dyn WebAppFactory> {
        CREATED.with(|c| c.set(c.get() + 1));
        Rc::new(NullFactory)
    }

    fn delete(_instance: Rc<dyn WebAppFactory>) {
        DELETED.with(|c| c.set(c.get() + 1));
    }

    /// Backend over an in-memory table of file name to app type. Records
    /// every call it receives.
    #[derive(Default)]
    pub(crate) struct CountingBackend {
        pub(crate) modules: Vec<(&'static str, &'static str)>,
        pub(crate) without_create: Vec<&'static str>,
        pub(crate) calls: RefCell<Vec<String>>,
        opened: HashMap<ModuleHandle, (&'static str, &'static str)>,
        next: u64,
    }

    impl CountingBackend {
        pub(crate) fn with_modules(modules: &[(&'static str, &'static str)]) -> Self {
            Self {
                modules: modules.to_vec(),
                ..Self::default()
            }
        }

        pub(crate) fn count(&self, prefix: &str) -> usize {
            self.calls
                .borrow()
                .iter()
                .filter(|call| call.starts_with(prefix))
                .count()
        }
    }

    impl ModuleBackend for CountingBackend {
        fn open(&mut self, path: &Path) -> Result<ModuleHandle, PluginError> {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            self.calls.borrow_mut().push(format!("open {name}"));
            let entry = self
                .modules
                .iter()
                .find(|(module, _)| *module == name)
                .copied()
                .ok_or_else(|| PluginError::NotFound(name.to_string()))?;
            let handle = ModuleHandle::new(self.next);
            self.next += 1;
            self.opened.insert(handle, entry);
            Ok(handle)
        }

        fn app_type(&self, handle: ModuleHandle) -> Option<String> {
            self.calls.borrow_mut().push("app_type".to_string());
            self.opened.get(&handle).map(|(_, ty)| ty.to_string())
        }

        fn resolve_create(&self, handle: ModuleHandle) -> Option<CreateInstanceFn> {
            self.calls.borrow_mut().push("resolve_create".to_string());
            let (module, _) = self.opened.get(&handle)?;
            if self.without_create.contains(module) {
                return None;
            }
            Some(create)
        }

        fn resolve_delete(&self, handle: ModuleHandle) -> Option<DeleteInstanceFn> {
            self.calls.borrow_mut().push("resolve_delete".to_string());
            self.opened.get(&handle).map(|_| delete as DeleteInstanceFn)
        }

        fn close(&mut self, handle: ModuleHandle) {
            self.calls.borrow_mut().push("close".to_string());
            self.opened.remove(&handle);
        }
    }

    fn reset_counters() {
        CREATED.with(|c| c.set(0));
        DELETED.with(|c| c.set(0));
    }

    #[test]
    fn load_opens_each_path_once() {
        let mut loader = PluginLoader::new(CountingBackend::with_modules(&[("ext.so", "extended")]));
        let path = Path::new("/plugins/ext.so");

        assert!(loader.load(path));
        assert!(loader.load(path));
        assert_eq!(loader.backend().count("open"), 1);
        assert_eq!(loader.app_type(path), "extended");
    }

    #[test]
    fn app_type_requires_prior_load() {
        let loader = PluginLoader::new(CountingBackend::with_modules(&[("ext.so", "extended")]));
        assert_eq!(loader.app_type(Path::new("/plugins/ext.so")), "");
    }

    #[test]
    fn failed_open_records_error() {
        let mut loader = PluginLoader::new(CountingBackend::default());
        assert!(!loader.load(Path::new("/plugins/missing.so")));
        assert!(matches!(loader.last_error(), Some(PluginError::NotFound(_))));
    }

    #[test]
    fn successful_load_clears_previous_error() {
        let mut loader = PluginLoader::new(CountingBackend::with_modules(&[("ext.so", "extended")]));
        assert!(!loader.load(Path::new("/plugins/missing.so")));
        assert!(loader.last_error().is_some());

        assert!(loader.load(Path::new("/plugins/ext.so")));
        assert!(loader.last_error().is_none());
    }

    #[test]
    fn instance_is_created_once_and_deleted_on_unload() {
        reset_counters();
        let mut loader = PluginLoader::new(CountingBackend::with_modules(&[("ext.so", "extended")]));
        let path = Path::new("/plugins/ext.so");
        loader.load(path);

        let first = loader.web_app_factory_instance(path).unwrap();
        let second = loader.web_app_factory_instance(path).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(CREATED.with(Cell::get), 1);

        loader.unload(path);
        assert_eq!(DELETED.with(Cell::get), 1);
        assert!(!loader.is_loaded(path));
        assert_eq!(loader.backend().count("close"), 1);
    }

    #[test]
    fn unload_without_instance_only_closes() {
        reset_counters();
        let mut loader = PluginLoader::new(CountingBackend::with_modules(&[("ext.so", "extended")]));
        let path = Path::new("/plugins/ext.so");
        loader.load(path);
        loader.unload(path);
        assert_eq!(DELETED.with(Cell::get), 0);
        assert_eq!(loader.backend().count("resolve_delete"), 0);
        assert_eq!(loader.backend().count("close"), 1);
    }

    #[test]
    fn unload_of_unknown_path_is_a_no_op() {
        let mut loader = PluginLoader::new(CountingBackend::default());
        loader.unload(Path::new("/plugins/never.so"));
        assert!(loader.backend().calls.borrow().is_empty());
    }

    #[test]
    fn missing_create_symbol_is_reported() {
        let mut backend = CountingBackend::with_modules(&[("broken.so", "broken")]);
        backend.without_create.push("broken.so");
        let mut loader = PluginLoader::new(backend);
        let path = Path::new("/plugins/broken.so");
        loader.load(path);

        assert!(loader.web_app_factory_instance(path).is_none());
        assert!(matches!(
            loader.last_error(),
            Some(PluginError::MissingSymbol { symbol: "create_instance", .. })
        ));
    }

    #[test]
    fn drop_deletes_every_instance() {
        reset_counters();
        {
            let mut loader = PluginLoader::new(CountingBackend::with_modules(&[
                ("a.so", "a"),
                ("b.so", "b"),
            ]));
            for name in ["/plugins/a.so", "/plugins/b.so"] {
                loader.load(Path::new(name));
                loader.web_app_factory_instance(Path::new(name));
            }
        }
        assert_eq!(DELETED.with(Cell::get), 2);
    }

    #[test]
    fn inventory_backend_requires_the_file() {
        let mut backend = InventoryBackend::default();
        let err = backend
            .open(Path::new("/nonexistent/plugin.so"))
            .unwrap_err();
        assert!(matches!(err, PluginError::NotFound(_)));
    }

    #[test]
    fn inventory_backend_rejects_unregistered_modules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unregistered-module.so");
        std::fs::write(&path, b"").unwrap();
        let mut backend = InventoryBackend::default();
        assert!(matches!(backend.open(&path), Err(PluginError::Rejected(_))));
    }
}
