/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Web application manager: lifecycle, registry and factory resolution for
//! web apps hosted on a shared compositor and service bus.

pub mod host;
pub mod platform;
pub mod registries;
pub mod runtime;
pub mod shell;
pub mod util;

pub use crate::host::application_description::ApplicationDescription;
pub use crate::host::config::WebAppManagerConfig;
pub use crate::host::web_app::{PreloadState, WebApp};
pub use crate::host::web_app_manager::{LaunchError, WebAppManager};
pub use crate::host::web_page::WebPage;
pub use crate::host::window_types::WindowType;
pub use crate::platform::RunningAppInfo;

pub const VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// Installs the process-wide `tracing` subscriber. `log` records emitted by
/// the library are forwarded into it.
pub fn init_tracing(filter: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let filter = filter
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_env("WAM_LOG").ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("tracing subscriber already installed: {e}");
    }
}
