/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! One running app instance: its window, its page and the policy between
//! them.
//!
//! The app is the only subscriber to its page's [`PageEvent`]s and the only
//! receiver of its window's [`WindowEvent`]s. Both are drained from
//! [`WebApp::process_events`]. Anything that touches the registry (closing,
//! crash accounting) is handed to the manager through the context's request
//! queue.

use std::rc::Rc;
use std::time::Duration;

use crossbeam_channel::{Receiver, unbounded};
use log::{debug, info};
use serde_json::Value;

use crate::host::application_description::{ApplicationDescription, WindowClass};
use crate::host::web_page::{PageEvent, WebPage};
use crate::host::window_types::WindowType;
use crate::platform::{
    AppWindow, KeyMask, MemoryPressureLevel, Rect, VisibilityState, WindowEvent, WindowHostState,
};
use crate::runtime::{ManagerRequest, Subscription, TimerId, TimerTask, WamContext};
use crate::util::{json_bool, string_to_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreloadState {
    #[default]
    None,
    Full,
    SemiFull,
    Partial,
    Minimal,
}

impl PreloadState {
    /// Preload state requested by launch params. `launchedHidden` without an
    /// explicit `preload` means partial.
    fn from_params(params: &Value) -> Option<Self> {
        match params.get("preload").and_then(Value::as_str) {
            Some("full") => Some(Self::Full),
            Some("semi-full") => Some(Self::SemiFull),
            Some("partial") => Some(Self::Partial),
            Some("minimal") => Some(Self::Minimal),
            _ if json_bool(params, "launchedHidden") => Some(Self::Partial),
            _ => None,
        }
    }
}

struct AttachedPage {
    page: WebPage,
    _subscription: Subscription<PageEvent>,
    events: Receiver<PageEvent>,
}

pub struct WebApp {
    ctx: Rc<WamContext>,
    desc: Rc<ApplicationDescription>,
    window_type: WindowType,
    window: Box<dyn AppWindow>,
    window_events: Receiver<WindowEvent>,
    attached: Option<AttachedPage>,

    app_id: String,
    instance_id: String,
    launching_app_id: String,
    ui_size: (u32, u32),

    preload_state: PreloadState,
    keep_alive: bool,
    hidden_window: bool,
    force_close: bool,
    crash_state: bool,
    need_reload: bool,
    close_page_requested: bool,
    added_to_window_mgr: bool,
    did_activate_stage: bool,
    is_focused: bool,

    pending_relaunch: Option<(String, String)>,
    launch_started_at: Option<Duration>,

    input_region: Vec<Rect>,
    input_region_enabled: bool,
    keyboard_height: i32,
}

impl WebApp {
    pub fn new(
        window_type: WindowType,
        desc: Rc<ApplicationDescription>,
        window: Box<dyn AppWindow>,
        ui_size: (u32, u32),
        ctx: Rc<WamContext>,
    ) -> Self {
        let (window_tx, window_events) = unbounded();
        window.set_delegate(window_tx);
        window.set_window_property("_WEBOS_WINDOW_TYPE", window_type.as_str());
        if let Some(display) = desc.display_affinity() {
            window.set_window_property("displayAffinity", &display.to_string());
            debug!("[{}] window for display {display}", desc.id());
        }

        Self {
            app_id: desc.id().to_string(),
            instance_id: String::new(),
            launching_app_id: String::new(),
            ui_size,
            window_type,
            window,
            window_events,
            attached: None,
            preload_state: PreloadState::None,
            keep_alive: false,
            hidden_window: false,
            force_close: false,
            crash_state: false,
            need_reload: false,
            close_page_requested: false,
            added_to_window_mgr: false,
            did_activate_stage: false,
            is_focused: false,
            pending_relaunch: None,
            launch_started_at: None,
            input_region: Vec::new(),
            input_region_enabled: false,
            keyboard_height: 0,
            desc,
            ctx,
        }
    }

    /// Installs `page`, detaching any previous one, and configures the window
    /// around it.
    pub fn attach(&mut self, mut page: WebPage) {
        if self.attached.is_some() {
            self.detach();
        }
        page.create_native_bridge();
        let (subscription, events) = page.subscribe();
        self.attached = Some(AttachedPage {
            page,
            _subscription: subscription,
            events,
        });

        self.set_window_properties();
        self.setup_window_group();
        let keep_alive = self.keep_alive;
        if let Some(page) = self.page_mut() {
            page.set_visibility_state(VisibilityState::Launching);
            page.set_page_properties();
            if keep_alive {
                page.set_keep_alive(true);
            }
        }
        debug!("[{}:{}] page attached", self.app_id, self.instance_id);
    }

    /// Stops observing the page and hands it back.
    pub fn detach(&mut self) -> Option<WebPage> {
        self.attached.take().map(|attached| attached.page)
    }

    fn set_window_properties(&self) {
        let desc = &self.desc;
        let bool_str = |b: bool| if b { "true" } else { "false" };
        let window_class = match desc.window_class() {
            WindowClass::Normal => "0",
            WindowClass::Hidden => "1",
        };
        self.set_window_property("appId", &self.app_id);
        self.set_window_property("instanceId", &self.instance_id);
        self.set_window_property("launchingAppId", &self.launching_app_id);
        self.set_window_property("title", desc.title());
        self.set_window_property("icon", desc.icon());
        self.set_window_property("subtitle", "");
        self.set_window_property("_WEBOS_WINDOW_CLASS", window_class);
        self.set_window_property(
            "_WEBOS_ACCESS_POLICY_KEYS_BACK",
            bool_str(desc.back_history_api_disabled()),
        );
        self.set_window_property(
            "_WEBOS_ACCESS_POLICY_KEYS_EXIT",
            bool_str(desc.handle_exit_key()),
        );
    }

    fn setup_window_group(&self) {
        let group = self.desc.window_group_info();
        if group.name.is_empty() {
            return;
        }
        if group.is_owner {
            let owner = self.desc.window_owner_info();
            info!(
                "[{}:{}] creating window group {} with {} layers",
                self.app_id,
                self.instance_id,
                group.name,
                owner.layers.len()
            );
            self.window.create_window_group(&group.name, &owner);
        } else {
            let client = self.desc.window_client_info();
            info!(
                "[{}:{}] attaching to window group {} layer {}",
                self.app_id, self.instance_id, group.name, client.layer
            );
            self.window.attach_to_window_group(&group.name, &client.layer);
        }
    }

    /// Sets a compositor property. The key-policy properties also update the
    /// matching key mask.
    pub fn set_window_property(&self, name: &str, value: &str) {
        let mask = match name {
            "_WEBOS_ACCESS_POLICY_KEYS_BACK" => Some(KeyMask::Back),
            "_WEBOS_ACCESS_POLICY_KEYS_EXIT" => Some(KeyMask::Exit),
            _ => None,
        };
        if let Some(mask) = mask {
            self.window.set_key_mask(mask, value == "true");
        }
        self.window.set_window_property(name, value);
    }

    pub fn delete_surface_group(&self) {
        self.window.detach_window_group();
    }

    pub fn set_app_properties(&mut self, launch_params: &str) {
        let params = string_to_json(launch_params);
        self.set_keep_alive(json_bool(&params, "keepAlive"));
        if json_bool(&params, "launchedHidden") {
            self.hidden_window = true;
        }
    }

    pub fn set_preload_state(&mut self, launch_params: &str) {
        let params = string_to_json(launch_params);
        if let Some(state) = PreloadState::from_params(&params) {
            self.preload_state = state;
        }
        if self.preload_state != PreloadState::None {
            self.hidden_window = true;
        }

        let state = self.preload_state;
        let Some(page) = self.page_mut() else {
            return;
        };
        match state {
            PreloadState::SemiFull => {
                page.set_app_preload_hint(true);
                page.suspend_media();
            }
            PreloadState::Partial => {
                page.set_app_preload_hint(true);
                page.suspend_media();
                page.deactivate_renderer_compositor();
            }
            PreloadState::Full | PreloadState::Minimal | PreloadState::None => {}
        }
        page.set_is_preload(state != PreloadState::None);
        if state != PreloadState::None {
            info!("[{}] preloaded as {state:?}", page.app_id());
        }
    }

    /// Reverses the page hints of the current preload state.
    pub fn clear_preload_state(&mut self) {
        let state = std::mem::take(&mut self.preload_state);
        let Some(page) = self.page_mut() else {
            return;
        };
        match state {
            PreloadState::SemiFull => {
                page.set_app_preload_hint(false);
                page.resume_media();
            }
            PreloadState::Partial => {
                page.set_app_preload_hint(false);
                page.resume_media();
                page.activate_renderer_compositor();
            }
            PreloadState::Full | PreloadState::Minimal | PreloadState::None => {}
        }
        page.set_is_preload(false);
    }

    pub fn start_launch_timer(&mut self) {
        if !self.hidden_window {
            debug!("[{}] launch time check started", self.app_id);
            self.launch_started_at = Some(self.ctx.timers().now());
        }
    }

    fn finish_launch_timer(&mut self) {
        if let Some(started) = self.launch_started_at.take() {
            let elapsed = self.ctx.timers().now().saturating_sub(started);
            info!(
                "[{}:{}] launch time {}ms",
                self.app_id,
                self.instance_id,
                elapsed.as_millis()
            );
        }
    }

    /// Brings an already running instance forward with new params.
    pub fn relaunch(&mut self, args: &str, launching_app_id: &str) {
        info!(
            "[{}:{}] relaunch from {launching_app_id}",
            self.app_id, self.instance_id
        );
        if self.hidden_window {
            self.hidden_window = false;
            self.clear_preload_state();
            if self.ctx.config().launch_time_check_enabled {
                self.start_launch_timer();
            }
            let (progress, shown) = self
                .page()
                .map_or((0, false), |p| (p.progress(), p.has_been_shown()));
            if self.keep_alive && progress != 100 {
                self.added_to_window_mgr = false;
            }
            if self.added_to_window_mgr || (progress == 100 && shown) {
                self.show_window();
            }
        }

        if self.crash_state {
            info!(
                "[{}:{}] crashed in background, reloading default page",
                self.app_id, self.instance_id
            );
            if let Some(page) = self.page_mut() {
                page.reload_default_page();
            }
            self.crash_state = false;
        }

        let launching = self.launching_app_id.clone();
        let Some(page) = self.page_mut() else {
            return;
        };
        if !page.relaunch(args, &launching) {
            info!(
                "[{}:{}] page still loading, relaunch deferred",
                self.app_id, self.instance_id
            );
            self.pending_relaunch = Some((args.to_string(), launching_app_id.to_string()));
            return;
        }

        if self.desc.handles_relaunch() {
            debug!(
                "[{}:{}] app handles relaunch, not raising",
                self.app_id, self.instance_id
            );
        } else {
            self.raise();
        }
    }

    fn do_pending_relaunch(&mut self) {
        if let Some((args, launching_app_id)) = self.pending_relaunch.take() {
            info!(
                "[{}:{}] page loaded, replaying relaunch",
                self.app_id, self.instance_id
            );
            self.relaunch(&args, &launching_app_id);
        }
    }

    pub fn show_window(&mut self) {
        if self.preload_state != PreloadState::None {
            debug!(
                "[{}:{}] preloaded, window stays hidden",
                self.app_id, self.instance_id
            );
            return;
        }
        self.hidden_window = false;
        self.on_stage_activated();
        self.added_to_window_mgr = true;
        self.set_use_accessibility(self.ctx.accessibility_enabled());
    }

    /// Hides the window. Fails while the platform error page is shown.
    pub fn hide_window(&mut self) -> bool {
        if self.page().is_some_and(WebPage::is_load_error_page_finish) {
            return false;
        }
        info!("[{}:{}] hide window", self.app_id, self.instance_id);
        self.hide(true);
        self.added_to_window_mgr = false;
        true
    }

    pub fn hide(&mut self, forced: bool) {
        if self.keep_alive || forced {
            self.on_stage_deactivated();
            self.window.hide();
            self.hidden_window = true;
        }
    }

    pub fn raise(&mut self) {
        let was_minimized = self.is_minimized();
        if self.window_type == WindowType::Overlay || (self.keep_alive && !was_minimized) {
            debug!("[{}:{}] raise, activating stage", self.app_id, self.instance_id);
            self.on_stage_activated();
        } else {
            debug!("[{}:{}] raise, requesting fullscreen", self.app_id, self.instance_id);
            self.window.set_host_state(WindowHostState::Fullscreen);
        }

        if was_minimized && let Some(page) = self.page_mut() {
            page.resume_all();
            page.set_visibility_state(VisibilityState::Visible);
        }
    }

    pub fn go_background(&mut self) {
        if self.window_type == WindowType::Overlay {
            info!(
                "[{}:{}] overlay sent to background, closing",
                self.app_id, self.instance_id
            );
            self.do_close();
        } else {
            self.window.set_host_state(WindowHostState::Minimized);
        }
    }

    fn do_close(&mut self) {
        if self.force_close {
            self.ctx.request(ManagerRequest::ForceCloseAppInternal {
                instance_id: self.instance_id.clone(),
            });
            return;
        }
        if self.keep_alive && self.hide_window() {
            return;
        }
        self.ctx.request(ManagerRequest::CloseAppInternal {
            instance_id: self.instance_id.clone(),
            ignore_clean_resource: false,
        });
    }

    pub fn on_stage_activated(&mut self) {
        let crashed = std::mem::take(&mut self.crash_state);
        let Some(page) = self.page_mut() else {
            return;
        };
        if crashed {
            info!("[{}] crashed earlier, reloading default page", page.app_id());
            page.reload_default_page();
        }
        page.resume_all();
        page.set_visibility_state(VisibilityState::Visible);
        self.ctx.request(ManagerRequest::SetActiveInstance {
            instance_id: self.instance_id.clone(),
        });
        self.window.show();
        info!(
            "[{}:{}] stage activated, pid {:?}",
            self.app_id,
            self.instance_id,
            self.web_process_pid()
        );
    }

    pub fn on_stage_deactivated(&mut self) {
        if let Some(page) = self.page_mut() {
            page.suspend_media();
        }
        self.unfocus();
        if let Some(page) = self.page_mut() {
            page.set_visibility_state(VisibilityState::Hidden);
            page.suspend_all();
        }
        self.hidden_window = true;
        self.did_activate_stage = false;
        info!(
            "[{}:{}] stage deactivated, pid {:?}",
            self.app_id,
            self.instance_id,
            self.web_process_pid()
        );
    }

    /// Reacts to a host-state change the compositor reported.
    pub fn window_state_changed(&mut self, state: WindowHostState) {
        if self.is_closing() {
            info!("[{}] closing, window state {state:?} ignored", self.app_id);
            return;
        }
        match state {
            WindowHostState::Default | WindowHostState::Maximized | WindowHostState::Fullscreen => {
                self.apply_input_region();
                self.on_stage_activated();
            }
            WindowHostState::Minimized => self.on_stage_deactivated(),
        }
    }

    fn window_state_about_to_change(&mut self, state: WindowHostState) {
        if state == WindowHostState::Minimized
            && let Some(page) = self.page_mut()
        {
            page.suspend_media();
            page.set_visibility_state(VisibilityState::Hidden);
        }
    }

    /// Asks the compositor for a new host state; the outcome arrives as
    /// window events.
    pub fn set_window_host_state(&self, state: WindowHostState) {
        self.window.set_host_state(state);
    }

    pub fn is_activated(&self) -> bool {
        matches!(
            self.window.host_state(),
            WindowHostState::Fullscreen | WindowHostState::Maximized | WindowHostState::Default
        )
    }

    pub fn is_minimized(&self) -> bool {
        self.window.host_state() == WindowHostState::Minimized
    }

    pub fn is_normal(&self) -> bool {
        self.window.host_state() == WindowHostState::Default
    }

    pub fn focus(&mut self) {
        self.is_focused = true;
        let minimized = self.is_minimized();
        if !minimized && let Some(page) = self.page_mut() {
            page.set_focus(true);
        }
    }

    pub fn unfocus(&mut self) {
        self.is_focused = false;
        if let Some(page) = self.page_mut() {
            page.set_focus(false);
        }
    }

    pub fn is_focused(&self) -> bool {
        self.is_focused
    }

    pub fn set_input_region(&mut self, region: Vec<Rect>) {
        self.window.set_input_region(&region);
        self.input_region = region;
    }

    fn apply_input_region(&mut self) {
        if !self.input_region_enabled && !self.input_region.is_empty() {
            self.input_region_enabled = true;
            self.window.set_input_region(&self.input_region);
        }
    }

    /// Moves the input region out of the way of the virtual keyboard.
    fn move_input_region(&mut self, height: i32) {
        if !self.input_region_enabled {
            return;
        }
        self.keyboard_height = if height != 0 {
            height
        } else {
            -self.keyboard_height
        };
        for rect in &mut self.input_region {
            rect.y -= self.keyboard_height;
        }
        self.window.set_input_region(&self.input_region);
    }

    pub fn keyboard_visibility_changed(&mut self, visible: bool, height: i32) {
        if let Some(page) = self.page_mut() {
            page.keyboard_visibility_changed(visible);
        }
        self.move_input_region(height);
    }

    /// Turns accessibility on only for apps that support audio guidance or
    /// while the error page is loading.
    pub fn set_use_accessibility(&mut self, enabled: bool) {
        let supports = self.desc.supports_audio_guidance();
        let Some(page) = self.page_mut() else {
            return;
        };
        debug!(
            "[{}] accessibility: audio guidance {supports}, error page {}",
            page.app_id(),
            page.is_load_error_page_start()
        );
        let use_accessibility = enabled && (supports || page.is_load_error_page_start());
        page.set_use_accessibility(use_accessibility);
    }

    pub fn set_preferred_languages(&mut self, language: &str) {
        if let Some(page) = self.page_mut() {
            page.set_preferred_languages(language);
            page.send_locale_change_event();
        }
    }

    pub fn handle_device_info_changed(&mut self, name: &str) {
        if let Some(page) = self.page_mut() {
            page.handle_device_info_changed(name);
        }
    }

    pub fn notify_memory_pressure(&mut self, level: MemoryPressureLevel) {
        if let Some(page) = self.page_mut() {
            page.notify_memory_pressure(level);
        }
    }

    pub fn execute_close_callback(&mut self) {
        let forced = self.force_close;
        if let Some(page) = self.page_mut() {
            page.execute_close_callback(forced);
        }
        info!(
            "[{}:{}] close callback executing, forced {forced}",
            self.app_id, self.instance_id
        );
    }

    pub fn dispatch_unload(&mut self) {
        if let Some(page) = self.page_mut() {
            page.clean_resources();
        }
    }

    /// Drains page and window notifications. Returns whether anything was
    /// handled.
    pub fn process_events(&mut self) -> bool {
        let mut any = false;
        if let Some(attached) = self.attached.as_mut() {
            any |= attached.page.process_engine_events();
        }
        while let Some(event) = self
            .attached
            .as_ref()
            .and_then(|attached| attached.events.try_recv().ok())
        {
            any = true;
            self.handle_page_event(event);
        }
        while let Ok(event) = self.window_events.try_recv() {
            any = true;
            self.handle_window_event(event);
        }
        any
    }

    fn handle_page_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::LoadFinished => self.web_page_load_finished(),
            PageEvent::LoadFailed(error_code) => {
                if self.preload_state != PreloadState::None {
                    info!(
                        "[{}:{}] preload failed ({error_code}), closing",
                        self.app_id, self.instance_id
                    );
                    self.ctx.request(ManagerRequest::CloseAppInternal {
                        instance_id: self.instance_id.clone(),
                        ignore_clean_resource: false,
                    });
                }
            }
            PageEvent::FirstFrameVisuallyCommitted => {
                debug!("[{}:{}] first frame committed", self.app_id, self.instance_id);
                self.finish_launch_timer();
                if !self.hidden_window && self.preload_state == PreloadState::None {
                    if self.desc.use_prerendering() {
                        self.did_activate_stage = false;
                    }
                    self.show_window();
                }
            }
            PageEvent::CompositorFrameSwapped => {
                if !self.did_activate_stage
                    && !self.hidden_window
                    && self.preload_state == PreloadState::None
                {
                    self.on_stage_activated();
                    self.did_activate_stage = true;
                }
            }
            PageEvent::ClosePageRequested => self.web_page_close_page_requested(),
            PageEvent::CloseCallbackExecuted
            | PageEvent::TimeoutExecuteCloseCallback
            | PageEvent::ClosingAppProcessDidCrash
            | PageEvent::DidDispatchUnload => {
                info!(
                    "[{}:{}] close sequence done ({event:?})",
                    self.app_id, self.instance_id
                );
                self.ctx.request(ManagerRequest::CloseWebApp {
                    instance_id: self.instance_id.clone(),
                });
            }
            PageEvent::TitleChanged => {
                let title = self.page().map(WebPage::title).unwrap_or_default();
                self.set_window_property("subtitle", &title);
            }
            PageEvent::NavigationHistoryChanged => {
                if !self.desc.back_history_api_disabled() {
                    let can_go_back = self.page().is_some_and(WebPage::can_go_back);
                    self.set_window_property(
                        "_WEBOS_ACCESS_POLICY_KEYS_BACK",
                        if can_go_back { "true" } else { "false" },
                    );
                }
            }
            PageEvent::WebViewRecreated => {
                let keep_alive = self.keep_alive;
                if let Some(page) = self.page_mut() {
                    page.set_page_properties();
                    if keep_alive {
                        page.set_keep_alive(true);
                    }
                }
                self.focus();
            }
        }
    }

    fn handle_window_event(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::StateAboutToChange(state) => self.window_state_about_to_change(state),
            WindowEvent::StateChanged(state) => self.window_state_changed(state),
            WindowEvent::Close => self.do_close(),
            WindowEvent::KeyboardVisibilityChanged { visible, height } => {
                self.keyboard_visibility_changed(visible, height)
            }
        }
    }

    fn web_page_load_finished(&mut self) {
        if self.hidden_window {
            return;
        }
        if self.need_reload {
            if let Some(page) = self.page_mut() {
                page.reload();
            }
            self.need_reload = false;
            return;
        }
        self.do_pending_relaunch();
    }

    fn web_page_close_page_requested(&mut self) {
        if self.is_closing() || self.close_page_requested {
            info!(
                "[{}:{}] window.close() dropped, closing {} requested {}",
                self.app_id,
                self.instance_id,
                self.is_closing(),
                self.close_page_requested
            );
            return;
        }
        info!("[{}:{}] window.close()", self.app_id, self.instance_id);
        self.close_page_requested = true;
        self.ctx.request(ManagerRequest::CloseApp {
            instance_id: self.instance_id.clone(),
        });
    }

    pub fn handle_timer(&mut self, id: TimerId, task: TimerTask) -> bool {
        self.page_mut()
            .is_some_and(|page| page.handle_timer(id, task))
    }

    pub fn page(&self) -> Option<&WebPage> {
        self.attached.as_ref().map(|attached| &attached.page)
    }

    pub fn page_mut(&mut self) -> Option<&mut WebPage> {
        self.attached.as_mut().map(|attached| &mut attached.page)
    }

    pub fn app_description(&self) -> &ApplicationDescription {
        &self.desc
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn set_instance_id(&mut self, instance_id: &str) {
        self.instance_id = instance_id.to_string();
    }

    pub fn launching_app_id(&self) -> &str {
        &self.launching_app_id
    }

    pub fn set_launching_app_id(&mut self, launching_app_id: &str) {
        self.launching_app_id = launching_app_id.to_string();
    }

    pub fn url(&self) -> String {
        self.page().map(WebPage::url).unwrap_or_default()
    }

    pub fn ui_size(&self) -> (u32, u32) {
        self.ui_size
    }

    pub fn web_process_pid(&self) -> Option<u32> {
        self.page().and_then(WebPage::web_process_pid)
    }

    pub fn preload_state(&self) -> PreloadState {
        self.preload_state
    }

    pub fn is_closing(&self) -> bool {
        self.page().is_some_and(WebPage::is_closing)
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn set_keep_alive(&mut self, keep_alive: bool) {
        self.keep_alive = keep_alive;
        if let Some(page) = self.page_mut() {
            page.set_keep_alive(keep_alive);
        }
    }

    pub fn hidden_window(&self) -> bool {
        self.hidden_window
    }

    pub fn set_hidden_window(&mut self, hidden: bool) {
        self.hidden_window = hidden;
    }

    pub fn force_close(&self) -> bool {
        self.force_close
    }

    pub fn set_force_close(&mut self) {
        self.force_close = true;
    }

    pub fn crash_state(&self) -> bool {
        self.crash_state
    }

    pub fn set_crash_state(&mut self, crashed: bool) {
        self.crash_state = crashed;
    }

    pub fn need_reload(&self) -> bool {
        self.need_reload
    }

    pub fn set_need_reload(&mut self, need_reload: bool) {
        self.need_reload = need_reload;
    }

    pub fn close_page_requested(&self) -> bool {
        self.close_page_requested
    }

    pub fn set_close_page_requested(&mut self, requested: bool) {
        self.close_page_requested = requested;
    }

    pub fn added_to_window_manager(&self) -> bool {
        self.added_to_window_mgr
    }

    pub fn has_pending_relaunch(&self) -> bool {
        self.pending_relaunch.is_some()
    }
}

impl Drop for WebApp {
    fn drop(&mut self) {
        info!("[{}:{}] app destroyed", self.app_id, self.instance_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::config::WebAppManagerConfig;
    use crate::platform::headless::{HeadlessPlatform, StaticDeviceInfo, ViewProbe, WindowProbe};
    use crate::platform::PlatformModules;

    struct Fixture {
        platform: Rc<HeadlessPlatform>,
        ctx: Rc<WamContext>,
        requests: Receiver<ManagerRequest>,
    }

    impl Fixture {
        fn new() -> Self {
            let platform = Rc::new(HeadlessPlatform::default());
            let (ctx, requests) = WamContext::new(
                WebAppManagerConfig::default(),
                platform.clone(),
                Rc::new(StaticDeviceInfo::default()),
            );
            Self {
                platform,
                ctx,
                requests,
            }
        }

        fn app(&self, manifest: &str, params: &str) -> (WebApp, Rc<ViewProbe>, Rc<WindowProbe>) {
            let desc = Rc::new(ApplicationDescription::from_json(manifest).unwrap());
            let window_type = WindowType::from_description(desc.default_window_type());
            let window = self.platform.create_window(window_type, 1920, 1080, None);
            let mut app = WebApp::new(window_type, desc.clone(), window, (1920, 1080), self.ctx.clone());
            let mut page = WebPage::new("file:///app/index.html", desc.clone(), params, self.ctx.clone());
            page.init();
            app.set_app_properties(params);
            app.set_instance_id("1000");
            app.attach(page);
            app.set_preload_state(params);
            let view = self.platform.view(desc.id()).unwrap();
            let window = self.platform.window("1000").unwrap();
            (app, view, window)
        }

        fn requests(&self) -> Vec<ManagerRequest> {
            self.requests.try_iter().collect()
        }
    }

    fn spin(app: &mut WebApp) {
        while app.process_events() {}
    }

    #[test]
    fn attach_sets_window_properties() {
        let fx = Fixture::new();
        let (app, view, window) = fx.app(
            r#"{"id":"com.example.a","title":"A","disableBackHistoryAPI":true}"#,
            r#"{"instanceId":"1000"}"#,
        );
        assert_eq!(window.property("appId").as_deref(), Some("com.example.a"));
        assert_eq!(window.property("title").as_deref(), Some("A"));
        assert_eq!(window.property("_WEBOS_WINDOW_TYPE").as_deref(), Some("_WEBOS_WINDOW_TYPE_CARD"));
        assert_eq!(
            window.property("_WEBOS_ACCESS_POLICY_KEYS_BACK").as_deref(),
            Some("true")
        );
        assert!(window.state().key_masks.contains(&(KeyMask::Back, true)));
        assert_eq!(view.state().native_bridge.as_deref(), Some("com.example.a"));
        assert_eq!(view.state().visibility_state, Some(VisibilityState::Launching));
        assert!(app.page().is_some());
    }

    #[test]
    fn window_group_owner_and_client() {
        let fx = Fixture::new();
        let (_owner, _, owner_window) = fx.app(
            r#"{"id":"owner","windowGroup":{"name":"G","owner":true,"ownerInfo":{"layers":[{"name":"top","z":10}]}}}"#,
            "{}",
        );
        let (owned, info) = owner_window.state().owned_group.clone().unwrap();
        assert_eq!(owned, "G");
        assert_eq!(info.layers.get("top"), Some(&10));

        let (_client, _, client_window) = fx.app(
            r#"{"id":"client","windowGroup":{"name":"G","owner":false,"clientInfo":{"layer":"top"}}}"#,
            "{}",
        );
        assert_eq!(
            client_window.state().attached_group,
            Some(("G".to_string(), "top".to_string()))
        );
    }

    #[test]
    fn first_frame_shows_window() {
        let fx = Fixture::new();
        let (mut app, view, window) = fx.app(r#"{"id":"a"}"#, r#"{"instanceId":"1000"}"#);
        app.page_mut().unwrap().load();
        spin(&mut app);
        assert!(window.state().visible);
        assert!(app.added_to_window_manager());
        assert!(!app.hidden_window());
        assert_eq!(view.state().visibility_state, Some(VisibilityState::Visible));
        assert!(
            fx.requests()
                .contains(&ManagerRequest::SetActiveInstance { instance_id: "1000".into() })
        );
    }

    #[test]
    fn partial_preload_then_relaunch() {
        let fx = Fixture::new();
        let (mut app, view, window) = fx.app(r#"{"id":"a"}"#, r#"{"preload":"partial"}"#);
        assert_eq!(app.preload_state(), PreloadState::Partial);
        assert!(app.hidden_window());
        assert!(view.state().disk_cache_write_blocked);
        assert!(view.state().media_suspended);
        assert!(!view.state().compositor_active);
        app.page_mut().unwrap().load();
        spin(&mut app);
        assert!(!window.state().visible);

        app.relaunch("{}", "launcher");
        spin(&mut app);
        assert!(!app.hidden_window());
        assert_eq!(app.preload_state(), PreloadState::None);
        assert!(!view.state().disk_cache_write_blocked);
        assert!(!view.state().media_suspended);
        assert!(view.state().compositor_active);
        assert!(window.state().visible);
    }

    #[test]
    fn launched_hidden_means_partial_preload() {
        let fx = Fixture::new();
        let (app, _, _) = fx.app(r#"{"id":"a"}"#, r#"{"launchedHidden":true}"#);
        assert_eq!(app.preload_state(), PreloadState::Partial);
        assert!(app.page().unwrap().is_preload());
    }

    #[test]
    fn relaunch_while_loading_is_replayed() {
        let fx = Fixture::new();
        fx.platform.set_hold_loads(true);
        let (mut app, view, _) = fx.app(r#"{"id":"a"}"#, "{}");
        app.page_mut().unwrap().load();
        spin(&mut app);

        app.relaunch(r#"{"first":1}"#, "launcher");
        app.relaunch(r#"{"second":2}"#, "launcher");
        assert!(app.has_pending_relaunch());

        view.complete_pending_load();
        spin(&mut app);
        assert!(!app.has_pending_relaunch());
        assert_eq!(app.page().unwrap().launch_params(), r#"{"second":2}"#);
    }

    #[test]
    fn relaunch_raises_unless_app_handles_it() {
        let fx = Fixture::new();
        let (mut app, _, window) = fx.app(r#"{"id":"a"}"#, "{}");
        app.page_mut().unwrap().load();
        spin(&mut app);
        app.relaunch("{}", "launcher");
        assert_eq!(window.state().host_state, WindowHostState::Fullscreen);

        let (mut handles, _, handles_window) = fx.app(r#"{"id":"b","handlesRelaunch":true}"#, "{}");
        handles.page_mut().unwrap().load();
        spin(&mut handles);
        handles.relaunch("{}", "launcher");
        assert_eq!(handles_window.state().host_state, WindowHostState::Default);
    }

    #[test]
    fn window_close_is_debounced() {
        let fx = Fixture::new();
        let (mut app, view, _) = fx.app(r#"{"id":"a"}"#, "{}");
        app.page_mut().unwrap().load();
        spin(&mut app);
        fx.requests();

        view.emit(crate::platform::EngineEvent::CloseRequested);
        view.emit(crate::platform::EngineEvent::CloseRequested);
        spin(&mut app);
        let closes = fx
            .requests()
            .into_iter()
            .filter(|r| matches!(r, ManagerRequest::CloseApp { .. }))
            .count();
        assert_eq!(closes, 1);
        assert!(app.close_page_requested());
    }

    #[test]
    fn minimize_deactivates_stage() {
        let fx = Fixture::new();
        let (mut app, view, _) = fx.app(r#"{"id":"a"}"#, "{}");
        app.page_mut().unwrap().load();
        spin(&mut app);

        app.go_background();
        spin(&mut app);
        assert!(app.is_minimized());
        assert!(app.hidden_window());
        assert_eq!(view.state().visibility_state, Some(VisibilityState::Hidden));
        assert!(app.page().unwrap().is_suspended());

        app.raise();
        spin(&mut app);
        assert!(app.is_activated());
        assert!(!app.page().unwrap().is_suspended());
        assert_eq!(view.state().visibility_state, Some(VisibilityState::Visible));
    }

    #[test]
    fn overlay_go_background_closes() {
        let fx = Fixture::new();
        let (mut app, _, _) = fx.app(r#"{"id":"a","defaultWindowType":"overlay"}"#, "{}");
        fx.requests();
        app.go_background();
        assert_eq!(
            fx.requests(),
            vec![ManagerRequest::CloseAppInternal {
                instance_id: "1000".into(),
                ignore_clean_resource: false
            }]
        );
    }

    #[test]
    fn accessibility_requires_audio_guidance() {
        let fx = Fixture::new();
        let (mut plain, plain_view, _) = fx.app(r#"{"id":"a"}"#, "{}");
        plain.set_use_accessibility(true);
        assert!(!plain_view.state().accessibility);

        let (mut guided, guided_view, _) = fx.app(
            r#"{"id":"b","accessibility":{"supportsAudioGuidance":true}}"#,
            "{}",
        );
        guided.set_use_accessibility(true);
        assert!(guided_view.state().accessibility);
    }

    #[test]
    fn title_becomes_subtitle() {
        let fx = Fixture::new();
        let (mut app, view, window) = fx.app(r#"{"id":"a"}"#, "{}");
        view.set_title("Inbox");
        spin(&mut app);
        assert_eq!(window.property("subtitle").as_deref(), Some("Inbox"));
    }

    #[test]
    fn back_key_follows_history() {
        let fx = Fixture::new();
        let (mut app, view, window) = fx.app(r#"{"id":"a"}"#, "{}");
        view.set_can_go_back(true);
        spin(&mut app);
        assert_eq!(
            window.property("_WEBOS_ACCESS_POLICY_KEYS_BACK").as_deref(),
            Some("true")
        );
    }

    #[test]
    fn hide_window_marks_hidden() {
        let fx = Fixture::new();
        let (mut app, _, _) = fx.app(r#"{"id":"a"}"#, "{}");
        assert!(app.hide_window());
        assert!(app.hidden_window());
    }
}
