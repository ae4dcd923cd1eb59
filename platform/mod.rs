/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Collaborator interfaces consumed by the lifecycle core: the web engine,
//! the compositor surface, the service bus and the device-info shim.
//!
//! Engine and compositor callbacks never call back into the core directly. A
//! [`WebView`] is handed a [`Sender<EngineEvent>`] and an [`AppWindow`] a
//! [`Sender<WindowEvent>`]; both only enqueue, and the manager drains the
//! queues from its event loop.

pub mod headless;

use std::collections::BTreeMap;

use crossbeam_channel::Sender;

use crate::host::application_description::{ApplicationDescription, WindowOwnerInfo};
use crate::host::window_types::WindowType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityState {
    Visible,
    Hidden,
    Launching,
    Prerender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPressureLevel {
    None,
    Low,
    Critical,
}

impl MemoryPressureLevel {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" | "normal" => Some(Self::None),
            "low" => Some(Self::Low),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowHostState {
    Default,
    Minimized,
    Maximized,
    Fullscreen,
}

impl WindowHostState {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" | "normal" => Some(Self::Default),
            "minimized" => Some(Self::Minimized),
            "maximized" => Some(Self::Maximized),
            "fullscreen" => Some(Self::Fullscreen),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMask {
    Back,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Notifications from the engine about one page.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    LoadStarted,
    LoadProgressChanged(f64),
    LoadFinished { url: String },
    LoadFailed { url: String, error_code: i32 },
    LoadStopped,
    LoadVisuallyCommitted,
    RenderProcessCreated { pid: u32 },
    RenderProcessCrashed,
    /// JS called `window.close()`.
    CloseRequested,
    HasCloseCallback(bool),
    DidRunCloseCallback,
    TitleChanged(String),
    NavigationHistoryChanged,
    CompositorFrameSwapped,
    ErrorPageFromNetErrorHelper,
    /// `webOSSystem` asked for its own load-error handling policy.
    LoadErrorPolicy(String),
}

pub trait WebView {
    fn set_delegate(&self, delegate: Sender<EngineEvent>);
    fn load_url(&self, url: &str);
    fn reload(&self);
    fn stop_loading(&self);
    fn url(&self) -> String;
    fn title(&self) -> String;
    fn can_go_back(&self) -> bool;
    fn run_javascript(&self, script: &str);
    fn run_javascript_in_all_frames(&self, script: &str);
    fn add_user_script(&self, script: &str);
    fn clear_user_scripts(&self);
    fn set_visible(&self, visible: bool);
    fn set_visibility_state(&self, state: VisibilityState);
    fn suspend_dom(&self);
    fn resume_dom(&self);
    fn suspend_media(&self);
    fn resume_media(&self);
    fn suspend_painting(&self);
    fn resume_painting(&self);
    fn set_focus(&self, focus: bool);
    fn render_process_pid(&self) -> Option<u32>;
    fn create_native_bridge(&self, app_id: &str);
    fn set_native_bridge_property(&self, name: &str, value: &str);
    fn set_block_write_disk_cache(&self, block: bool);
    fn activate_compositor(&self);
    fn deactivate_compositor(&self);
    fn set_app_preload_hint(&self, preload: bool);
    fn notify_memory_pressure(&self, level: MemoryPressureLevel);
    fn set_audio_guidance_on(&self, on: bool);
    fn set_use_accessibility(&self, enabled: bool);
    fn set_use_launch_optimization(&self, enabled: bool, delay_ms: u32);
    fn set_background_run(&self, enabled: bool);
    fn set_keep_alive(&self, keep_alive: bool);
    fn set_security_origin(&self, origin: &str);
    fn set_accept_languages(&self, languages: &str);
    fn default_user_agent(&self) -> String;
    fn set_user_agent(&self, user_agent: &str);
    fn set_allow_local_resource_load(&self, allow: bool);
    fn set_inspectable(&self, enabled: bool);
    fn set_viewport_size(&self, width: u32, height: u32);
    fn set_do_not_track(&self, enabled: bool);
    fn set_disallow_scrolling(&self, disallow: bool);
    fn set_transparent_background(&self, transparent: bool);
    fn set_network_stable_timeout(&self, seconds: f64);
    fn set_back_history_api_disabled(&self, disabled: bool);
}

/// Notifications from the compositor about one window.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    StateAboutToChange(WindowHostState),
    StateChanged(WindowHostState),
    /// The compositor asked the window to close.
    Close,
    KeyboardVisibilityChanged { visible: bool, height: i32 },
}

pub trait AppWindow {
    fn set_delegate(&self, delegate: Sender<WindowEvent>);
    fn show(&self);
    fn hide(&self);
    fn raise(&self);
    fn resize(&self, width: u32, height: u32);
    fn focus(&self);
    fn unfocus(&self);
    fn set_opacity(&self, opacity: f32);
    fn set_cursor(&self, cursor: &str, hotspot_x: i32, hotspot_y: i32);
    fn set_key_mask(&self, mask: KeyMask, enabled: bool);
    fn set_input_region(&self, region: &[Rect]);
    fn set_window_property(&self, name: &str, value: &str);
    fn create_window_group(&self, name: &str, owner: &WindowOwnerInfo);
    fn attach_to_window_group(&self, name: &str, layer: &str);
    fn detach_window_group(&self);
    fn host_state(&self) -> WindowHostState;
    fn set_host_state(&self, state: WindowHostState);
    fn display_size(&self) -> (u32, u32);
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RunningAppInfo {
    pub app_id: String,
    pub instance_id: String,
    pub pid: Option<u32>,
    pub display_id: Option<i32>,
}

pub trait ServiceSender {
    fn post_running_app_list(&self, apps: &[RunningAppInfo]);
    fn post_web_process_created(&self, app_id: &str, instance_id: &str, pid: u32);
    fn service_call(&self, url: &str, payload: &str, app_id: &str);
    fn close_app(&self, instance_id: &str);
}

pub trait DeviceInfo {
    fn device_info(&self, name: &str) -> Option<String>;
    fn set_device_info(&self, name: &str, value: &str);
    fn system_language(&self) -> String;
    fn set_system_language(&self, language: &str);
    fn display_size(&self) -> (u32, u32);
    fn all_device_info(&self) -> BTreeMap<String, String>;
}

/// Builds the native surfaces a factory wires into a new app instance.
pub trait PlatformModules {
    fn create_window(
        &self,
        window_type: WindowType,
        width: u32,
        height: u32,
        display_affinity: Option<i32>,
    ) -> Box<dyn AppWindow>;

    fn create_web_view(&self, desc: &ApplicationDescription) -> Box<dyn WebView>;
}
