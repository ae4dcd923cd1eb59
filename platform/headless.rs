/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Collaborators that run without an engine or a compositor.
//!
//! Every call is logged at debug level and recorded in a probe shared through
//! an `Rc`, so the binary can report what happened and tests can assert on
//! it. The web view simulates a cooperative engine: `load_url` enqueues the
//! usual notification sequence on the delegate channel unless the URL was
//! scripted to fail or loads are being held.

use std::cell::{Cell, Ref, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crossbeam_channel::Sender;
use log::debug;

use super::{
    AppWindow, DeviceInfo, EngineEvent, KeyMask, MemoryPressureLevel, PlatformModules, Rect,
    RunningAppInfo, ServiceSender, VisibilityState, WebView, WindowEvent, WindowHostState,
};
use crate::host::application_description::{ApplicationDescription, WindowOwnerInfo};
use crate::host::window_types::WindowType;

const FIRST_RENDER_PID: u32 = 4000;

/// Load behaviour shared by every view a [`HeadlessPlatform`] creates.
struct EngineScript {
    failures: RefCell<HashMap<String, i32>>,
    hold_loads: Cell<bool>,
    next_pid: Cell<u32>,
}

impl EngineScript {
    fn new() -> Self {
        Self {
            failures: RefCell::new(HashMap::new()),
            hold_loads: Cell::new(false),
            next_pid: Cell::new(FIRST_RENDER_PID),
        }
    }

    fn allocate_pid(&self) -> u32 {
        let pid = self.next_pid.get();
        self.next_pid.set(pid + 1);
        pid
    }

    fn failure_for(&self, url: &str) -> Option<i32> {
        self.failures.borrow().get(url).copied()
    }
}

/// Observable state of one headless web view.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub url: String,
    pub title: String,
    pub loads: Vec<String>,
    pub scripts: Vec<String>,
    pub user_scripts: Vec<String>,
    pub visible: bool,
    pub visibility_state: Option<VisibilityState>,
    pub dom_suspended: bool,
    pub media_suspended: bool,
    pub painting_suspended: bool,
    pub disk_cache_write_blocked: bool,
    pub compositor_active: bool,
    pub preload_hint: bool,
    pub focused: bool,
    pub accessibility: bool,
    pub audio_guidance: bool,
    pub launch_optimization: bool,
    pub background_run: bool,
    pub keep_alive: bool,
    pub security_origin: String,
    pub accept_languages: String,
    pub user_agent: String,
    pub allow_local_resources: bool,
    pub inspectable: bool,
    pub do_not_track: bool,
    pub disallow_scrolling: bool,
    pub viewport: Option<(u32, u32)>,
    pub memory_pressure: Option<MemoryPressureLevel>,
    pub native_bridge: Option<String>,
    pub native_bridge_properties: BTreeMap<String, String>,
    pub pid: Option<u32>,
    pub can_go_back: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            url: String::new(),
            title: String::new(),
            loads: Vec::new(),
            scripts: Vec::new(),
            user_scripts: Vec::new(),
            visible: true,
            visibility_state: None,
            dom_suspended: false,
            media_suspended: false,
            painting_suspended: false,
            disk_cache_write_blocked: false,
            compositor_active: true,
            preload_hint: false,
            focused: false,
            accessibility: false,
            audio_guidance: false,
            launch_optimization: false,
            background_run: false,
            keep_alive: false,
            security_origin: String::new(),
            accept_languages: String::new(),
            user_agent: String::new(),
            allow_local_resources: false,
            inspectable: false,
            do_not_track: false,
            disallow_scrolling: false,
            viewport: None,
            memory_pressure: None,
            native_bridge: None,
            native_bridge_properties: BTreeMap::new(),
            pid: None,
            can_go_back: false,
        }
    }
}

/// Shared handle on a headless view, kept by the platform after the view
/// itself has been handed to a page.
pub struct ViewProbe {
    app_id: String,
    engine: Rc<EngineScript>,
    delegate: RefCell<Option<Sender<EngineEvent>>>,
    pending_load: RefCell<Option<String>>,
    state: RefCell<ViewState>,
    calls: RefCell<Vec<String>>,
}

impl ViewProbe {
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn state(&self) -> Ref<'_, ViewState> {
        self.state.borrow()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn has_delegate(&self) -> bool {
        self.delegate.borrow().is_some()
    }

    /// Delivers an arbitrary engine notification, as if the engine raised it.
    pub fn emit(&self, event: EngineEvent) {
        match self.delegate.borrow().as_ref() {
            Some(delegate) => {
                if delegate.send(event).is_err() {
                    debug!("headless view [{}]: page is gone, event dropped", self.app_id);
                }
            }
            None => debug!("headless view [{}]: no delegate, {event:?} dropped", self.app_id),
        }
    }

    /// Completes a load that was started while loads were held.
    pub fn complete_pending_load(&self) -> bool {
        let Some(url) = self.pending_load.borrow_mut().take() else {
            return false;
        };
        self.finish_load(&url);
        true
    }

    /// Kills the render process.
    pub fn crash(&self) {
        self.state.borrow_mut().pid = None;
        self.emit(EngineEvent::RenderProcessCrashed);
    }

    pub fn set_title(&self, title: &str) {
        self.state.borrow_mut().title = title.to_string();
        self.emit(EngineEvent::TitleChanged(title.to_string()));
    }

    pub fn set_can_go_back(&self, can_go_back: bool) {
        self.state.borrow_mut().can_go_back = can_go_back;
        self.emit(EngineEvent::NavigationHistoryChanged);
    }

    fn record(&self, call: String) {
        debug!("headless view [{}]: {call}", self.app_id);
        self.calls.borrow_mut().push(call);
    }

    fn start_load(&self, url: &str) {
        {
            let mut state = self.state.borrow_mut();
            state.url = url.to_string();
            state.loads.push(url.to_string());
        }
        if self.state.borrow().pid.is_none() {
            let pid = self.engine.allocate_pid();
            self.state.borrow_mut().pid = Some(pid);
            self.emit(EngineEvent::RenderProcessCreated { pid });
        }

        self.emit(EngineEvent::LoadStarted);
        if let Some(error_code) = self.engine.failure_for(url) {
            self.emit(EngineEvent::LoadFailed {
                url: url.to_string(),
                error_code,
            });
            self.emit(EngineEvent::LoadStopped);
            return;
        }
        self.emit(EngineEvent::LoadProgressChanged(0.1));
        if self.engine.hold_loads.get() {
            *self.pending_load.borrow_mut() = Some(url.to_string());
            return;
        }
        self.finish_load(url);
    }

    fn finish_load(&self, url: &str) {
        self.emit(EngineEvent::LoadVisuallyCommitted);
        self.emit(EngineEvent::LoadProgressChanged(1.0));
        self.emit(EngineEvent::LoadFinished {
            url: url.to_string(),
        });
        self.emit(EngineEvent::CompositorFrameSwapped);
    }
}

pub struct HeadlessWebView {
    probe: Rc<ViewProbe>,
}

impl HeadlessWebView {
    pub fn probe(&self) -> Rc<ViewProbe> {
        Rc::clone(&self.probe)
    }

    fn update(&self, call: String, apply: impl FnOnce(&mut ViewState)) {
        self.probe.record(call);
        apply(&mut self.probe.state.borrow_mut());
    }
}

impl WebView for HeadlessWebView {
    fn set_delegate(&self, delegate: Sender<EngineEvent>) {
        self.probe.record("set_delegate".to_string());
        *self.probe.delegate.borrow_mut() = Some(delegate);
    }

    fn load_url(&self, url: &str) {
        self.probe.record(format!("load_url {url}"));
        self.probe.pending_load.borrow_mut().take();
        self.probe.start_load(url);
    }

    fn reload(&self) {
        self.probe.record("reload".to_string());
        let url = self.probe.state.borrow().url.clone();
        self.probe.start_load(&url);
    }

    fn stop_loading(&self) {
        self.probe.record("stop_loading".to_string());
        if self.probe.pending_load.borrow_mut().take().is_some() {
            self.probe.emit(EngineEvent::LoadStopped);
        }
    }

    fn url(&self) -> String {
        self.probe.state.borrow().url.clone()
    }

    fn title(&self) -> String {
        self.probe.state.borrow().title.clone()
    }

    fn can_go_back(&self) -> bool {
        self.probe.state.borrow().can_go_back
    }

    fn run_javascript(&self, script: &str) {
        self.update("run_javascript".to_string(), |s| s.scripts.push(script.to_string()));
    }

    fn run_javascript_in_all_frames(&self, script: &str) {
        self.update("run_javascript_in_all_frames".to_string(), |s| {
            s.scripts.push(script.to_string())
        });
    }

    fn add_user_script(&self, script: &str) {
        self.update("add_user_script".to_string(), |s| {
            s.user_scripts.push(script.to_string())
        });
    }

    fn clear_user_scripts(&self) {
        self.update("clear_user_scripts".to_string(), |s| s.user_scripts.clear());
    }

    fn set_visible(&self, visible: bool) {
        self.update(format!("set_visible {visible}"), |s| s.visible = visible);
    }

    fn set_visibility_state(&self, state: VisibilityState) {
        self.update(format!("set_visibility_state {state:?}"), |s| {
            s.visibility_state = Some(state)
        });
    }

    fn suspend_dom(&self) {
        self.update("suspend_dom".to_string(), |s| s.dom_suspended = true);
    }

    fn resume_dom(&self) {
        self.update("resume_dom".to_string(), |s| s.dom_suspended = false);
    }

    fn suspend_media(&self) {
        self.update("suspend_media".to_string(), |s| s.media_suspended = true);
    }

    fn resume_media(&self) {
        self.update("resume_media".to_string(), |s| s.media_suspended = false);
    }

    fn suspend_painting(&self) {
        self.update("suspend_painting".to_string(), |s| s.painting_suspended = true);
    }

    fn resume_painting(&self) {
        self.update("resume_painting".to_string(), |s| s.painting_suspended = false);
    }

    fn set_focus(&self, focus: bool) {
        self.update(format!("set_focus {focus}"), |s| s.focused = focus);
    }

    fn render_process_pid(&self) -> Option<u32> {
        self.probe.state.borrow().pid
    }

    fn create_native_bridge(&self, app_id: &str) {
        self.update(format!("create_native_bridge {app_id}"), |s| {
            s.native_bridge = Some(app_id.to_string())
        });
    }

    fn set_native_bridge_property(&self, name: &str, value: &str) {
        self.update(format!("set_native_bridge_property {name}={value}"), |s| {
            s.native_bridge_properties
                .insert(name.to_string(), value.to_string());
        });
    }

    fn set_block_write_disk_cache(&self, block: bool) {
        self.update(format!("set_block_write_disk_cache {block}"), |s| {
            s.disk_cache_write_blocked = block
        });
    }

    fn activate_compositor(&self) {
        self.update("activate_compositor".to_string(), |s| s.compositor_active = true);
    }

    fn deactivate_compositor(&self) {
        self.update("deactivate_compositor".to_string(), |s| {
            s.compositor_active = false
        });
    }

    fn set_app_preload_hint(&self, preload: bool) {
        self.update(format!("set_app_preload_hint {preload}"), |s| {
            s.preload_hint = preload
        });
    }

    fn notify_memory_pressure(&self, level: MemoryPressureLevel) {
        self.update(format!("notify_memory_pressure {level:?}"), |s| {
            s.memory_pressure = Some(level)
        });
    }

    fn set_audio_guidance_on(&self, on: bool) {
        self.update(format!("set_audio_guidance_on {on}"), |s| s.audio_guidance = on);
    }

    fn set_use_accessibility(&self, enabled: bool) {
        self.update(format!("set_use_accessibility {enabled}"), |s| {
            s.accessibility = enabled
        });
    }

    fn set_use_launch_optimization(&self, enabled: bool, delay_ms: u32) {
        self.update(
            format!("set_use_launch_optimization {enabled} {delay_ms}"),
            |s| s.launch_optimization = enabled,
        );
    }

    fn set_background_run(&self, enabled: bool) {
        self.update(format!("set_background_run {enabled}"), |s| {
            s.background_run = enabled
        });
    }

    fn set_keep_alive(&self, keep_alive: bool) {
        self.update(format!("set_keep_alive {keep_alive}"), |s| {
            s.keep_alive = keep_alive
        });
    }

    fn set_security_origin(&self, origin: &str) {
        self.update(format!("set_security_origin {origin}"), |s| {
            s.security_origin = origin.to_string()
        });
    }

    fn set_accept_languages(&self, languages: &str) {
        self.update(format!("set_accept_languages {languages}"), |s| {
            s.accept_languages = languages.to_string()
        });
    }

    fn default_user_agent(&self) -> String {
        format!("Mozilla/5.0 (Web0S; Linux) webappmanager/{}", crate::VERSION)
    }

    fn set_user_agent(&self, user_agent: &str) {
        self.update(format!("set_user_agent {user_agent}"), |s| {
            s.user_agent = user_agent.to_string()
        });
    }

    fn set_allow_local_resource_load(&self, allow: bool) {
        self.update(format!("set_allow_local_resource_load {allow}"), |s| {
            s.allow_local_resources = allow
        });
    }

    fn set_inspectable(&self, enabled: bool) {
        self.update(format!("set_inspectable {enabled}"), |s| s.inspectable = enabled);
    }

    fn set_viewport_size(&self, width: u32, height: u32) {
        self.update(format!("set_viewport_size {width}x{height}"), |s| {
            s.viewport = Some((width, height))
        });
    }

    fn set_do_not_track(&self, enabled: bool) {
        self.update(format!("set_do_not_track {enabled}"), |s| s.do_not_track = enabled);
    }

    fn set_disallow_scrolling(&self, disallow: bool) {
        self.update(format!("set_disallow_scrolling {disallow}"), |s| {
            s.disallow_scrolling = disallow
        });
    }

    fn set_transparent_background(&self, transparent: bool) {
        self.probe
            .record(format!("set_transparent_background {transparent}"));
    }

    fn set_network_stable_timeout(&self, seconds: f64) {
        self.probe
            .record(format!("set_network_stable_timeout {seconds}"));
    }

    fn set_back_history_api_disabled(&self, disabled: bool) {
        self.probe
            .record(format!("set_back_history_api_disabled {disabled}"));
    }
}

/// Observable state of one headless window.
#[derive(Debug, Clone)]
pub struct WindowState {
    pub window_type: WindowType,
    pub size: (u32, u32),
    pub display_affinity: Option<i32>,
    pub visible: bool,
    pub focused: bool,
    pub host_state: WindowHostState,
    pub opacity: f32,
    pub properties: BTreeMap<String, String>,
    pub key_masks: Vec<(KeyMask, bool)>,
    pub input_region: Vec<Rect>,
    pub owned_group: Option<(String, WindowOwnerInfo)>,
    pub attached_group: Option<(String, String)>,
    pub raised: usize,
}

pub struct WindowProbe {
    delegate: RefCell<Option<Sender<WindowEvent>>>,
    display_size: (u32, u32),
    state: RefCell<WindowState>,
    calls: RefCell<Vec<String>>,
}

impl WindowProbe {
    pub fn state(&self) -> Ref<'_, WindowState> {
        self.state.borrow()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn property(&self, name: &str) -> Option<String> {
        self.state.borrow().properties.get(name).cloned()
    }

    pub fn emit(&self, event: WindowEvent) {
        if let Some(delegate) = self.delegate.borrow().as_ref() {
            let _ = delegate.send(event);
        }
    }

    fn record(&self, call: String) {
        debug!(
            "headless window [{}]: {call}",
            self.property("instanceId").unwrap_or_default()
        );
        self.calls.borrow_mut().push(call);
    }
}

pub struct HeadlessWindow {
    probe: Rc<WindowProbe>,
}

impl HeadlessWindow {
    fn update(&self, call: String, apply: impl FnOnce(&mut WindowState)) {
        self.probe.record(call);
        apply(&mut self.probe.state.borrow_mut());
    }
}

impl AppWindow for HeadlessWindow {
    fn set_delegate(&self, delegate: Sender<WindowEvent>) {
        self.probe.record("set_delegate".to_string());
        *self.probe.delegate.borrow_mut() = Some(delegate);
    }

    fn show(&self) {
        self.update("show".to_string(), |s| s.visible = true);
    }

    fn hide(&self) {
        self.update("hide".to_string(), |s| s.visible = false);
    }

    fn raise(&self) {
        self.update("raise".to_string(), |s| s.raised += 1);
    }

    fn resize(&self, width: u32, height: u32) {
        self.update(format!("resize {width}x{height}"), |s| s.size = (width, height));
    }

    fn focus(&self) {
        self.update("focus".to_string(), |s| s.focused = true);
    }

    fn unfocus(&self) {
        self.update("unfocus".to_string(), |s| s.focused = false);
    }

    fn set_opacity(&self, opacity: f32) {
        self.update(format!("set_opacity {opacity}"), |s| s.opacity = opacity);
    }

    fn set_cursor(&self, cursor: &str, hotspot_x: i32, hotspot_y: i32) {
        self.probe
            .record(format!("set_cursor {cursor} {hotspot_x},{hotspot_y}"));
    }

    fn set_key_mask(&self, mask: KeyMask, enabled: bool) {
        self.update(format!("set_key_mask {mask:?} {enabled}"), |s| {
            s.key_masks.retain(|(m, _)| *m != mask);
            s.key_masks.push((mask, enabled));
        });
    }

    fn set_input_region(&self, region: &[Rect]) {
        self.update(format!("set_input_region {}", region.len()), |s| {
            s.input_region = region.to_vec()
        });
    }

    fn set_window_property(&self, name: &str, value: &str) {
        self.probe.state.borrow_mut()
            .properties
            .insert(name.to_string(), value.to_string());
        self.probe.record(format!("set_window_property {name}={value}"));
    }

    fn create_window_group(&self, name: &str, owner: &WindowOwnerInfo) {
        self.update(format!("create_window_group {name}"), |s| {
            s.owned_group = Some((name.to_string(), owner.clone()))
        });
    }

    fn attach_to_window_group(&self, name: &str, layer: &str) {
        self.update(format!("attach_to_window_group {name} {layer}"), |s| {
            s.attached_group = Some((name.to_string(), layer.to_string()))
        });
    }

    fn detach_window_group(&self) {
        self.update("detach_window_group".to_string(), |s| {
            s.owned_group = None;
            s.attached_group = None;
        });
    }

    fn host_state(&self) -> WindowHostState {
        self.probe.state.borrow().host_state
    }

    /// Applies the state at once and reports it back the way a compositor
    /// would, with an about-to-change notification first.
    fn set_host_state(&self, state: WindowHostState) {
        self.probe.record(format!("set_host_state {state:?}"));
        if self.probe.state.borrow().host_state == state {
            return;
        }
        self.probe.emit(WindowEvent::StateAboutToChange(state));
        self.probe.state.borrow_mut().host_state = state;
        self.probe.emit(WindowEvent::StateChanged(state));
    }

    fn display_size(&self) -> (u32, u32) {
        self.probe.display_size
    }
}

/// Builds headless views and windows and keeps a probe on each of them.
pub struct HeadlessPlatform {
    engine: Rc<EngineScript>,
    display_size: (u32, u32),
    views: RefCell<Vec<Rc<ViewProbe>>>,
    windows: RefCell<Vec<Rc<WindowProbe>>>,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new((1920, 1080))
    }
}

impl HeadlessPlatform {
    pub fn new(display_size: (u32, u32)) -> Self {
        Self {
            engine: Rc::new(EngineScript::new()),
            display_size,
            views: RefCell::new(Vec::new()),
            windows: RefCell::new(Vec::new()),
        }
    }

    /// Makes every subsequent load of `url` fail with `error_code`.
    pub fn fail_url(&self, url: &str, error_code: i32) {
        self.engine
            .failures
            .borrow_mut()
            .insert(url.to_string(), error_code);
    }

    pub fn clear_failures(&self) {
        self.engine.failures.borrow_mut().clear();
    }

    /// While held, loads stop after the first progress report until
    /// [`ViewProbe::complete_pending_load`] is called.
    pub fn set_hold_loads(&self, hold: bool) {
        self.engine.hold_loads.set(hold);
    }

    /// Most recently created view for `app_id`.
    pub fn view(&self, app_id: &str) -> Option<Rc<ViewProbe>> {
        self.views
            .borrow()
            .iter()
            .rev()
            .find(|probe| probe.app_id == app_id)
            .cloned()
    }

    pub fn views(&self, app_id: &str) -> Vec<Rc<ViewProbe>> {
        self.views
            .borrow()
            .iter()
            .filter(|probe| probe.app_id == app_id)
            .cloned()
            .collect()
    }

    /// Window whose `instanceId` property equals `instance_id`.
    pub fn window(&self, instance_id: &str) -> Option<Rc<WindowProbe>> {
        self.windows
            .borrow()
            .iter()
            .rev()
            .find(|probe| probe.property("instanceId").as_deref() == Some(instance_id))
            .cloned()
    }
}

impl PlatformModules for HeadlessPlatform {
    fn create_window(
        &self,
        window_type: WindowType,
        width: u32,
        height: u32,
        display_affinity: Option<i32>,
    ) -> Box<dyn AppWindow> {
        debug!(
            "headless platform: create {} window {width}x{height}",
            window_type.as_str()
        );
        let probe = Rc::new(WindowProbe {
            delegate: RefCell::new(None),
            display_size: self.display_size,
            state: RefCell::new(WindowState {
                window_type,
                size: (width, height),
                display_affinity,
                visible: false,
                focused: false,
                host_state: WindowHostState::Default,
                opacity: 1.0,
                properties: BTreeMap::new(),
                key_masks: Vec::new(),
                input_region: Vec::new(),
                owned_group: None,
                attached_group: None,
                raised: 0,
            }),
            calls: RefCell::new(Vec::new()),
        });
        self.windows.borrow_mut().push(Rc::clone(&probe));
        Box::new(HeadlessWindow { probe })
    }

    fn create_web_view(&self, desc: &ApplicationDescription) -> Box<dyn WebView> {
        debug!("headless platform: create web view for {}", desc.id());
        let probe = Rc::new(ViewProbe {
            app_id: desc.id().to_string(),
            engine: Rc::clone(&self.engine),
            delegate: RefCell::new(None),
            pending_load: RefCell::new(None),
            state: RefCell::new(ViewState::default()),
            calls: RefCell::new(Vec::new()),
        });
        self.views.borrow_mut().push(Rc::clone(&probe));
        Box::new(HeadlessWebView { probe })
    }
}

/// Everything posted to the service bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceMessage {
    RunningAppList(Vec<RunningAppInfo>),
    WebProcessCreated {
        app_id: String,
        instance_id: String,
        pid: u32,
    },
    ServiceCall {
        url: String,
        payload: String,
        app_id: String,
    },
    CloseApp {
        instance_id: String,
    },
}

#[derive(Default)]
pub struct HeadlessServiceSender {
    messages: RefCell<Vec<ServiceMessage>>,
}

impl HeadlessServiceSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<ServiceMessage> {
        self.messages.borrow().clone()
    }

    pub fn last_running_app_list(&self) -> Option<Vec<RunningAppInfo>> {
        self.messages.borrow().iter().rev().find_map(|message| match message {
            ServiceMessage::RunningAppList(apps) => Some(apps.clone()),
            _ => None,
        })
    }

    /// Drains the close requests apps made through `window.close()`. The
    /// application manager on the other side of the bus answers these with a
    /// kill.
    pub fn take_close_requests(&self) -> Vec<String> {
        let mut close_requests = Vec::new();
        self.messages.borrow_mut().retain(|message| match message {
            ServiceMessage::CloseApp { instance_id } => {
                close_requests.push(instance_id.clone());
                false
            }
            _ => true,
        });
        close_requests
    }

    fn push(&self, message: ServiceMessage) {
        debug!("headless bus: {message:?}");
        self.messages.borrow_mut().push(message);
    }
}

impl ServiceSender for HeadlessServiceSender {
    fn post_running_app_list(&self, apps: &[RunningAppInfo]) {
        self.push(ServiceMessage::RunningAppList(apps.to_vec()));
    }

    fn post_web_process_created(&self, app_id: &str, instance_id: &str, pid: u32) {
        self.push(ServiceMessage::WebProcessCreated {
            app_id: app_id.to_string(),
            instance_id: instance_id.to_string(),
            pid,
        });
    }

    fn service_call(&self, url: &str, payload: &str, app_id: &str) {
        self.push(ServiceMessage::ServiceCall {
            url: url.to_string(),
            payload: payload.to_string(),
            app_id: app_id.to_string(),
        });
    }

    fn close_app(&self, instance_id: &str) {
        self.push(ServiceMessage::CloseApp {
            instance_id: instance_id.to_string(),
        });
    }
}

/// In-memory device properties.
pub struct StaticDeviceInfo {
    values: RefCell<BTreeMap<String, String>>,
    language: RefCell<String>,
    display_size: Cell<(u32, u32)>,
}

impl StaticDeviceInfo {
    pub fn new(language: &str, display_size: (u32, u32)) -> Self {
        Self {
            values: RefCell::new(BTreeMap::new()),
            language: RefCell::new(language.to_string()),
            display_size: Cell::new(display_size),
        }
    }

    pub fn set_display_size(&self, size: (u32, u32)) {
        self.display_size.set(size);
    }
}

impl Default for StaticDeviceInfo {
    fn default() -> Self {
        Self::new("en-US", (1920, 1080))
    }
}

impl DeviceInfo for StaticDeviceInfo {
    fn device_info(&self, name: &str) -> Option<String> {
        self.values.borrow().get(name).cloned()
    }

    fn set_device_info(&self, name: &str, value: &str) {
        debug!("headless device info: {name}={value}");
        self.values
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    fn system_language(&self) -> String {
        self.language.borrow().clone()
    }

    fn set_system_language(&self, language: &str) {
        debug!("headless device info: language={language}");
        *self.language.borrow_mut() = language.to_string();
    }

    fn display_size(&self) -> (u32, u32) {
        self.display_size.get()
    }

    fn all_device_info(&self) -> BTreeMap<String, String> {
        self.values.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn sample_description() -> ApplicationDescription {
        ApplicationDescription::from_json(r#"{"id":"com.example.app"}"#)
            .expect("valid manifest")
    }

    #[test]
    fn load_emits_cooperative_sequence() {
        let platform = HeadlessPlatform::default();
        let view = platform.create_web_view(&sample_description());
        let (tx, rx) = unbounded();
        view.set_delegate(tx);
        view.load_url("file:///app/index.html");

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events[0], EngineEvent::RenderProcessCreated { pid: FIRST_RENDER_PID });
        assert_eq!(events[1], EngineEvent::LoadStarted);
        assert!(events.contains(&EngineEvent::LoadFinished {
            url: "file:///app/index.html".to_string()
        }));
        assert_eq!(view.render_process_pid(), Some(FIRST_RENDER_PID));
    }

    #[test]
    fn scripted_failure_reports_error_code() {
        let platform = HeadlessPlatform::default();
        platform.fail_url("http://unreachable.test/", 404);
        let view = platform.create_web_view(&sample_description());
        let (tx, rx) = unbounded();
        view.set_delegate(tx);
        view.load_url("http://unreachable.test/");

        let events: Vec<_> = rx.try_iter().collect();
        assert!(events.contains(&EngineEvent::LoadFailed {
            url: "http://unreachable.test/".to_string(),
            error_code: 404,
        }));
        assert!(!events.iter().any(|e| matches!(e, EngineEvent::LoadFinished { .. })));
    }

    #[test]
    fn held_load_completes_on_demand() {
        let platform = HeadlessPlatform::default();
        platform.set_hold_loads(true);
        let view = platform.create_web_view(&sample_description());
        let (tx, rx) = unbounded();
        view.set_delegate(tx);
        view.load_url("file:///app/index.html");
        assert!(!rx.try_iter().any(|e| matches!(e, EngineEvent::LoadFinished { .. })));

        let probe = platform.view("com.example.app").expect("view probe");
        assert!(probe.complete_pending_load());
        assert!(rx.try_iter().any(|e| matches!(e, EngineEvent::LoadFinished { .. })));
        assert!(!probe.complete_pending_load());
    }

    #[test]
    fn host_state_change_is_reported_once() {
        let platform = HeadlessPlatform::default();
        let window = platform.create_window(WindowType::Card, 0, 0, None);
        let (tx, rx) = unbounded();
        window.set_delegate(tx);
        window.set_host_state(WindowHostState::Fullscreen);
        window.set_host_state(WindowHostState::Fullscreen);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                WindowEvent::StateAboutToChange(WindowHostState::Fullscreen),
                WindowEvent::StateChanged(WindowHostState::Fullscreen),
            ]
        );
    }

    #[test]
    fn close_requests_are_drained() {
        let sender = HeadlessServiceSender::new();
        sender.close_app("1000");
        sender.post_running_app_list(&[]);
        assert_eq!(sender.take_close_requests(), vec!["1000".to_string()]);
        assert!(sender.take_close_requests().is_empty());
        assert_eq!(sender.messages().len(), 1);
    }
}
