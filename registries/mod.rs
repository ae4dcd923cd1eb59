/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

pub mod default_factory;
pub mod factory_manager;
pub mod plugin_loader;

pub use default_factory::DefaultWebAppFactory;
pub use factory_manager::{DEFAULT_APP_TYPE, WebAppFactory, WebAppFactoryManager};
pub use plugin_loader::{
    FactoryPluginRegistration, InventoryBackend, ModuleBackend, ModuleHandle, PluginError,
    PluginLoader,
};
