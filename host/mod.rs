/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

pub mod application_description;
pub mod config;
pub mod web_app;
pub mod web_app_manager;
pub mod web_page;
pub mod window_types;

pub use application_description::ApplicationDescription;
pub use web_app::{PreloadState, WebApp};
pub use web_app_manager::{LaunchError, WebAppManager};
pub use web_page::{PageEvent, WebPage};
pub use window_types::WindowType;
