/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Content and load state of one app instance.
//!
//! A page owns its engine view and reacts to the view's [`EngineEvent`]s
//! when [`WebPage::process_engine_events`] is called. What the owning app
//! needs to know is re-published as [`PageEvent`]s to subscribers, in the
//! order the engine produced them. Registry-level consequences (crash policy,
//! running-list posts) are sent to the manager as [`ManagerRequest`]s.

use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, error, info, warn};
use serde_json::Value;
use url::Url;

use crate::host::application_description::ApplicationDescription;
use crate::platform::{EngineEvent, MemoryPressureLevel, VisibilityState, WebView};
use crate::runtime::{ManagerRequest, ObserverList, Subscription, TimerId, TimerTask, WamContext};
use crate::util::{string_to_json, uri};

const IDENTIFIER_FOR_NET_ERROR_PAGE: &str = "com.webos.settingsservice.client";
const SECURITY_ORIGIN_POSTFIX: &str = "-webos";
const CLOSE_CALLBACK_TIMEOUT: Duration = Duration::from_millis(10_000);
const RELOAD_FAILED_URL_TIMEOUT: Duration = Duration::from_millis(60_000);
const ERR_NETWORK_CHANGED: i32 = -21;

/// What a page tells the app that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    LoadFinished,
    LoadFailed(i32),
    FirstFrameVisuallyCommitted,
    CompositorFrameSwapped,
    /// Page script called `window.close()`.
    ClosePageRequested,
    CloseCallbackExecuted,
    TimeoutExecuteCloseCallback,
    ClosingAppProcessDidCrash,
    DidDispatchUnload,
    TitleChanged,
    NavigationHistoryChanged,
    WebViewRecreated,
}

/// Security origin for a page identifier: lower-cased with a `-webos`
/// postfix.
pub fn identifier_for_security_origin(id: &str) -> String {
    let lowered = id.to_lowercase();
    if lowered != id {
        warn!("[{id}] has upper case characters, security origin uses {lowered}");
    }
    format!("{lowered}{SECURITY_ORIGIN_POSTFIX}")
}

fn is_null_or_absent(value: &Value, key: &str) -> bool {
    value.get(key).is_none_or(Value::is_null)
}

pub struct WebPage {
    ctx: Rc<WamContext>,
    desc: Rc<ApplicationDescription>,
    view: Box<dyn WebView>,
    engine_tx: Sender<EngineEvent>,
    engine_rx: Receiver<EngineEvent>,
    observers: ObserverList<PageEvent>,

    app_id: String,
    instance_id: String,
    default_url: String,
    launch_params: String,
    load_failed_url: String,
    trust_level: String,
    load_error_policy: String,
    progress: i32,
    custom_suspend_dom_time: u64,

    has_been_shown: bool,
    suspend_at_load: bool,
    is_suspended: bool,
    is_paused: bool,
    is_preload: bool,
    is_closing: bool,
    cleaning_resources: bool,
    has_close_callback: bool,
    background_run: bool,
    is_load_error_page_start: bool,
    is_load_error_page_finish: bool,
    error_page_from_net_error_helper: bool,

    dom_suspend_timer: Option<TimerId>,
    close_callback_timer: Option<TimerId>,
    reload_timer: Option<TimerId>,
}

impl WebPage {
    pub fn new(
        url: &str,
        desc: Rc<ApplicationDescription>,
        launch_params: &str,
        ctx: Rc<WamContext>,
    ) -> Self {
        let params = string_to_json(launch_params);
        let instance_id = match params.get("instanceId").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                warn!(
                    "[{}] failed to get instanceId from params '{launch_params}'",
                    desc.id()
                );
                String::new()
            }
        };
        let view = ctx.platform().create_web_view(&desc);
        let (engine_tx, engine_rx) = unbounded();

        Self {
            app_id: desc.id().to_string(),
            trust_level: desc.trust_level().to_string(),
            default_url: url.to_string(),
            launch_params: launch_params.to_string(),
            instance_id,
            view,
            engine_tx,
            engine_rx,
            observers: ObserverList::new(),
            load_failed_url: String::new(),
            load_error_policy: "default".to_string(),
            progress: 0,
            custom_suspend_dom_time: 0,
            has_been_shown: false,
            suspend_at_load: false,
            is_suspended: false,
            is_paused: false,
            is_preload: false,
            is_closing: false,
            cleaning_resources: false,
            has_close_callback: false,
            background_run: false,
            is_load_error_page_start: false,
            is_load_error_page_finish: false,
            error_page_from_net_error_helper: false,
            dom_suspend_timer: None,
            close_callback_timer: None,
            reload_timer: None,
            desc,
            ctx,
        }
    }

    /// Configures the engine view. Called once by the factory and again
    /// whenever the view is recreated after a renderer crash.
    pub fn init(&mut self) {
        let config = self.ctx.config();
        self.view.set_delegate(self.engine_tx.clone());
        if let Some((width, height)) = self.desc.resolution_override() {
            self.view.set_viewport_size(width, height);
        }
        self.view.set_visible(false);
        let user_agent = format!("{} {}", self.view.default_user_agent(), config.name);
        self.view.set_user_agent(&user_agent);
        self.view
            .set_disallow_scrolling(self.desc.disallow_scrolling_in_main_frame());
        self.view.set_do_not_track(self.desc.do_not_track());
        if let Some(timeout) = self.desc.network_stable_timeout().filter(|t| *t >= 0.0) {
            self.view.set_network_stable_timeout(timeout);
        }
        if self.desc.trust_level() == "trusted" {
            debug!("[{}] trusted app, local resource access allowed", self.app_id);
            self.view.set_allow_local_resource_load(true);
        }

        let suspend_delay = config.suspend_delay.as_millis() as u64;
        if let Ok(custom) = u64::try_from(self.desc.custom_suspend_dom_time())
            && custom > suspend_delay
        {
            let max_custom = config.max_custom_suspend_delay.as_millis() as u64;
            self.custom_suspend_dom_time = custom.min(max_custom);
            debug!(
                "[{}] custom suspend DOM time {}ms",
                self.app_id, self.custom_suspend_dom_time
            );
        }

        let language = self.ctx.device_info().system_language();
        self.set_preferred_languages(&language);
        self.view
            .set_security_origin(&identifier_for_security_origin(&self.identifier()));
        self.view.clear_user_scripts();
        self.set_custom_user_script();
        self.view.set_audio_guidance_on(self.ctx.accessibility_enabled());
        self.view
            .set_back_history_api_disabled(self.desc.back_history_api_disabled());
        self.view
            .set_background_run(self.desc.is_enable_background_run());
    }

    fn set_custom_user_script(&self) {
        let path = Path::new(self.desc.folder_path()).join(&self.ctx.config().user_script_path);
        if !path.is_file() {
            debug!("[{}] no user script at {}", self.app_id, path.display());
            return;
        }
        match std::fs::read_to_string(&path) {
            Ok(script) if !script.is_empty() => {
                info!("[{}] user script {}", self.app_id, path.display());
                self.view.add_user_script(&script);
            }
            Ok(_) => warn!("[{}] user script {} is empty", self.app_id, path.display()),
            Err(e) => warn!("[{}] couldn't read user script {}: {e}", self.app_id, path.display()),
        }
    }

    pub fn set_page_properties(&mut self) {
        if self.desc.is_transparent() {
            self.view.set_transparent_background(true);
        }
        if self.desc.is_inspectable() || self.ctx.config().inspector_enabled {
            debug!("[{}] inspectable", self.app_id);
            self.view.set_inspectable(true);
        }
        self.trust_level = self.desc.trust_level().to_string();
    }

    pub fn subscribe(&self) -> (Subscription<PageEvent>, Receiver<PageEvent>) {
        self.observers.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Installs the launch-event script and loads either the deep-link target
    /// or the default URL.
    pub fn load(&mut self) {
        info!(
            "[{}:{}] load, launch params {}",
            self.app_id, self.instance_id, self.launch_params
        );
        self.setup_launch_event();
        let params = self.launch_params.clone();
        if !self.do_deeplinking(&params) {
            self.load_default_url();
        }
    }

    fn setup_launch_event(&self) {
        let detail = if self.launch_params.is_empty() {
            "{}"
        } else {
            self.launch_params.as_str()
        };
        let script = format!(
            "(function() {{\
                var dispatchLaunchEvent = function() {{\
                    var launchEvent = new CustomEvent('webOSLaunch', {{ detail: {detail} }});\
                    setTimeout(function() {{ document.dispatchEvent(launchEvent); }}, 1);\
                }};\
                if (document.readyState === 'complete') {{\
                    dispatchLaunchEvent();\
                }} else {{\
                    document.onreadystatechange = function() {{\
                        if (document.readyState === 'complete') {{ dispatchLaunchEvent(); }}\
                    }};\
                }}\
            }})();"
        );
        self.view.add_user_script(&script);
    }

    /// Returns false when the params carry no deep link or the app handles
    /// it itself.
    fn do_deeplinking(&mut self, launch_params: &str) -> bool {
        let params = string_to_json(launch_params);
        if !params.is_object() || is_null_or_absent(&params, "contentTarget") {
            return false;
        }
        let handled_by = match params.get("handledBy") {
            None | Some(Value::Null) => "default",
            Some(value) => value.as_str().unwrap_or_default(),
        };
        match handled_by {
            "platform" => {
                let target = params
                    .get("contentTarget")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                info!(
                    "[{}:{}] deep link handled by platform, loading {target}",
                    self.app_id, self.instance_id
                );
                self.load_url(&target);
                true
            }
            "app" => false,
            _ => {
                info!(
                    "[{}:{}] deep link handled by {handled_by}, loading default url",
                    self.app_id, self.instance_id
                );
                self.load_default_url();
                true
            }
        }
    }

    fn do_hosted_web_app_relaunch(&mut self, launch_params: &str) -> bool {
        let params = string_to_json(launch_params);
        let current_is_file = uri::scheme(&self.view.url()).as_deref() == Some("file");
        let default_is_file = uri::scheme(&self.default_url).as_deref() == Some("file");
        if current_is_file
            || !default_is_file
            || !params.is_object()
            || is_null_or_absent(&params, "contentTarget")
            || !self.desc.handles_deeplinking()
        {
            debug!(
                "[{}:{}] not a hosted deep-link relaunch",
                self.app_id, self.instance_id
            );
            return false;
        }
        self.launch_params = launch_params.to_string();
        self.do_deeplinking(launch_params)
    }

    /// Returns false when the page is still loading and the relaunch has to
    /// be replayed later.
    pub fn relaunch(&mut self, launch_params: &str, launching_app_id: &str) -> bool {
        self.resume_painting_and_js();

        let params = string_to_json(launch_params);
        if let Some(target) = params.get("sw_clients_openwindow").and_then(Value::as_str) {
            debug!(
                "[{}] service worker clients.openWindow({target}) relaunch",
                self.app_id
            );
            let target = target.to_string();
            self.load_url(&target);
            return true;
        }

        if self.do_hosted_web_app_relaunch(launch_params) {
            debug!("[{}] hosted web app relaunch handled", self.app_id);
            return true;
        }

        if !self.has_been_shown && self.progress < 100 {
            info!(
                "[{}:{}] relaunch from {launching_app_id} while loading ({}%), deferred",
                self.app_id, self.instance_id, self.progress
            );
            return false;
        }

        self.launch_params = launch_params.to_string();
        self.send_relaunch_event();
        true
    }

    fn send_relaunch_event(&self) {
        self.view.set_visible(true);
        info!("[{}:{}] send webOSRelaunch", self.app_id, self.instance_id);
        let detail = if self.launch_params.is_empty() {
            "{}"
        } else {
            self.launch_params.as_str()
        };
        self.view.run_javascript(&format!(
            "setTimeout(function () {{\
                console.log('[WAM] fires webOSRelaunch event');\
                var launchEvent=new CustomEvent('webOSRelaunch', {{ detail: {detail} }});\
                document.dispatchEvent(launchEvent);\
            }}, 1);"
        ));
    }

    pub fn load_url(&mut self, url: &str) {
        self.view.load_url(url);
    }

    pub fn load_default_url(&mut self) {
        let url = self.default_url.clone();
        self.view.load_url(&url);
    }

    pub fn reload_default_page(&mut self) {
        info!("[{}:{}] reload default page", self.app_id, self.instance_id);
        self.load_default_url();
    }

    pub fn reload(&mut self) {
        self.view.reload();
    }

    /// Drains pending engine notifications. Returns whether any arrived.
    pub fn process_engine_events(&mut self) -> bool {
        let mut any = false;
        while let Ok(event) = self.engine_rx.try_recv() {
            any = true;
            self.handle_engine_event(event);
        }
        any
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::LoadStarted => self.handle_load_started(),
            EngineEvent::LoadProgressChanged(progress) => {
                self.progress = (progress * 100.0).round().clamp(0.0, 100.0) as i32;
            }
            EngineEvent::LoadFinished { url } => self.load_finished(&url),
            EngineEvent::LoadFailed { url, error_code } => self.load_failed(&url, error_code),
            EngineEvent::LoadStopped => {
                debug!("[{}:{}] load stopped", self.app_id, self.instance_id);
            }
            EngineEvent::LoadVisuallyCommitted => {
                self.has_been_shown = true;
                self.observers.notify(PageEvent::FirstFrameVisuallyCommitted);
            }
            EngineEvent::RenderProcessCreated { pid } => {
                info!("[{}:{}] render process {pid} created", self.app_id, self.instance_id);
                self.ctx.request(ManagerRequest::WebProcessCreated {
                    app_id: self.app_id.clone(),
                    instance_id: self.instance_id.clone(),
                    pid,
                });
            }
            EngineEvent::RenderProcessCrashed => self.render_process_crashed(),
            EngineEvent::CloseRequested => self.observers.notify(PageEvent::ClosePageRequested),
            EngineEvent::HasCloseCallback(has) => self.has_close_callback = has,
            EngineEvent::DidRunCloseCallback => {
                self.stop_timer(TimerTask::CloseCallbackTimeout);
                info!("[{}:{}] close callback done", self.app_id, self.instance_id);
                self.observers.notify(PageEvent::CloseCallbackExecuted);
            }
            EngineEvent::TitleChanged(_) => self.observers.notify(PageEvent::TitleChanged),
            EngineEvent::NavigationHistoryChanged => {
                self.observers.notify(PageEvent::NavigationHistoryChanged)
            }
            EngineEvent::CompositorFrameSwapped => {
                self.observers.notify(PageEvent::CompositorFrameSwapped)
            }
            EngineEvent::ErrorPageFromNetErrorHelper => {
                self.error_page_from_net_error_helper = true;
            }
            EngineEvent::LoadErrorPolicy(policy) => self.load_error_policy = policy,
        }
    }

    fn handle_load_started(&mut self) {
        self.progress = 0;
        self.has_close_callback = false;
        self.suspend_at_load = true;
        self.error_page_from_net_error_helper = false;
    }

    fn load_finished(&mut self, url: &str) {
        self.progress = 100;
        if self.cleaning_resources {
            info!(
                "[{}:{}] unload finished ({url})",
                self.app_id, self.instance_id
            );
            self.observers.notify(PageEvent::DidDispatchUnload);
            self.ctx.request(ManagerRequest::PostRunningAppList);
            return;
        }

        debug!(
            "[{}:{}] load finished {url}, suspend_at_load {}",
            self.app_id, self.instance_id, self.suspend_at_load
        );
        self.observers.notify(PageEvent::LoadFinished);
        if self.suspend_at_load {
            self.suspend_painting_and_js();
        }
        self.update_is_load_error_page_finish();
    }

    fn load_failed(&mut self, url: &str, error_code: i32) {
        info!(
            "[{}:{}] load failed ({error_code}) {url}",
            self.app_id, self.instance_id
        );
        self.observers.notify(PageEvent::LoadFailed(error_code));

        if error_code == ERR_NETWORK_CHANGED {
            let current = self.view.url();
            self.view.load_url(&current);
            return;
        }
        self.load_failed_url = url.to_string();
        if !self.is_preload && error_code != 204 && error_code != 301 {
            self.load_error_page(error_code);
        }
    }

    fn load_error_page(&mut self, error_code: i32) {
        let error_page = self.ctx.config().error_page_url.clone();
        if error_page.is_empty() {
            return;
        }
        if self.load_error_policy == "event" {
            info!(
                "[{}] app handles load errors itself, sending webOSLoadError",
                self.app_id
            );
            self.view.run_javascript(&format!(
                "{{\
                    var launchEvent=new CustomEvent('webOSLoadError',\
                        {{ detail : {{ genericError : true, errorCode : {error_code} }}}});\
                    document.dispatchEvent(launchEvent);\
                }}"
            ));
            return;
        }

        let Some(location) = uri::local_path(&error_page) else {
            error!("[{}] error page {error_page} is not a local file", self.app_id);
            return;
        };
        let language = self.ctx.device_info().system_language();
        let Some(found) = uri::error_page_paths(&location, &language)
            .into_iter()
            .find(|path| path.exists())
        else {
            error!("[{}] no error page found for {error_page}", self.app_id);
            return;
        };
        let Ok(mut error_url) = Url::from_file_path(&found) else {
            error!("[{}] couldn't convert {} to a URL", self.app_id, found.display());
            return;
        };
        error_url
            .query_pairs_mut()
            .append_pair("errorCode", &error_code.to_string())
            .append_pair("hostname", &uri::hostname(&self.load_failed_url));

        self.is_load_error_page_start = true;
        info!("[{}:{}] load error page {error_url}", self.app_id, self.instance_id);
        self.view.load_url(error_url.as_str());
    }

    fn compute_is_load_error_page_finish(&self) -> bool {
        let current = self.view.url();
        if !uri::is_local_file(&current) {
            return false;
        }
        let (Some(page), Some(error_page)) = (
            uri::local_path(&current),
            uri::local_path(&self.ctx.config().error_page_url),
        ) else {
            return false;
        };
        let (Some(page_dir), Some(error_dir)) = (page.parent(), error_page.parent()) else {
            return false;
        };
        page_dir.starts_with(error_dir) && page.file_name() == error_page.file_name()
    }

    fn update_is_load_error_page_finish(&mut self) {
        let was_error_page = self.is_load_error_page_finish;
        self.is_load_error_page_finish = self.compute_is_load_error_page_finish();

        if self.is_load_error_page_finish {
            debug!("[{}] error page shown, starting reload timer", self.app_id);
            self.stop_timer(TimerTask::ReloadFailedUrl);
            self.reload_timer = Some(self.ctx.timers().start(
                RELOAD_FAILED_URL_TIMEOUT,
                &self.instance_id,
                TimerTask::ReloadFailedUrl,
            ));
            self.trust_level = "trusted".to_string();
        } else {
            if was_error_page {
                self.stop_timer(TimerTask::ReloadFailedUrl);
            }
            self.trust_level = self.desc.trust_level().to_string();
        }
    }

    fn render_process_crashed(&mut self) {
        warn!(
            "[{}:{}] render process crashed, suspended {}",
            self.app_id, self.instance_id, self.is_suspended
        );
        if self.is_closing {
            self.stop_timer(TimerTask::CloseCallbackTimeout);
            self.observers.notify(PageEvent::ClosingAppProcessDidCrash);
            return;
        }
        self.recreate_web_view();
        self.ctx.request(ManagerRequest::ProcessCrashed {
            app_id: self.app_id.clone(),
            instance_id: self.instance_id.clone(),
        });
    }

    fn recreate_web_view(&mut self) {
        info!("[{}:{}] recreating web view", self.app_id, self.instance_id);
        self.stop_timer(TimerTask::SuspendDom);
        self.view = self.ctx.platform().create_web_view(&self.desc);
        self.init();
        self.observers.notify(PageEvent::WebViewRecreated);
        if !self.is_suspended {
            self.view.set_visibility_state(VisibilityState::Launching);
        }
        self.is_suspended = false;
    }

    /// Dispatches a fired timer. Returns false when the timer is not one this
    /// page is waiting for.
    pub fn handle_timer(&mut self, id: TimerId, task: TimerTask) -> bool {
        let slot = match task {
            TimerTask::SuspendDom => &mut self.dom_suspend_timer,
            TimerTask::CloseCallbackTimeout => &mut self.close_callback_timer,
            TimerTask::ReloadFailedUrl => &mut self.reload_timer,
        };
        if *slot != Some(id) {
            return false;
        }
        *slot = None;

        match task {
            TimerTask::SuspendDom => {
                debug!("[{}:{}] DOM suspend timer expired", self.app_id, self.instance_id);
                self.suspend_painting_and_js();
            }
            TimerTask::CloseCallbackTimeout => {
                warn!("[{}:{}] close callback timed out", self.app_id, self.instance_id);
                self.observers.notify(PageEvent::TimeoutExecuteCloseCallback);
            }
            TimerTask::ReloadFailedUrl => {
                info!(
                    "[{}:{}] reload failed url {}",
                    self.app_id, self.instance_id, self.load_failed_url
                );
                let url = self.load_failed_url.clone();
                self.view.load_url(&url);
            }
        }
        true
    }

    fn stop_timer(&mut self, task: TimerTask) {
        let slot = match task {
            TimerTask::SuspendDom => &mut self.dom_suspend_timer,
            TimerTask::CloseCallbackTimeout => &mut self.close_callback_timer,
            TimerTask::ReloadFailedUrl => &mut self.reload_timer,
        };
        if let Some(id) = slot.take() {
            self.ctx.timers().stop(id);
        }
    }

    pub fn is_timer_running(&self, task: TimerTask) -> bool {
        let slot = match task {
            TimerTask::SuspendDom => self.dom_suspend_timer,
            TimerTask::CloseCallbackTimeout => self.close_callback_timer,
            TimerTask::ReloadFailedUrl => self.reload_timer,
        };
        slot.is_some_and(|id| self.ctx.timers().is_running(id))
    }

    /// Hides the page and suspends media and painting at once; DOM suspension
    /// follows after the suspend delay unless the page is closing.
    pub fn suspend_all(&mut self) {
        info!("[{}:{}] suspend all", self.app_id, self.instance_id);
        self.view.set_visible(false);
        if self.is_suspended || self.background_run {
            return;
        }
        self.suspend_media();
        self.view.suspend_painting();

        if self.is_closing {
            debug!(
                "[{}:{}] closing, DOM suspend timer not started",
                self.app_id, self.instance_id
            );
            return;
        }

        self.is_suspended = true;
        let delay = if self.custom_suspend_dom_time > 0 {
            Duration::from_millis(self.custom_suspend_dom_time)
        } else {
            self.ctx.config().suspend_delay
        };
        self.stop_timer(TimerTask::SuspendDom);
        let id = self
            .ctx
            .timers()
            .start(delay, &self.instance_id, TimerTask::SuspendDom);
        self.dom_suspend_timer = Some(id);
        debug!(
            "[{}:{}] DOM suspend timer ({}ms) started",
            self.app_id,
            self.instance_id,
            delay.as_millis()
        );
    }

    pub fn resume_all(&mut self) {
        info!("[{}:{}] resume all", self.app_id, self.instance_id);
        self.resume_painting_and_js();
        self.resume_media();
        self.view.set_visible(true);
    }

    pub fn suspend_media(&mut self) {
        if self.is_paused || self.background_run {
            return;
        }
        self.view.suspend_media();
        self.is_paused = true;
    }

    pub fn resume_media(&mut self) {
        if !self.is_paused {
            return;
        }
        self.set_use_launch_optimization(false);
        self.view.resume_media();
        self.is_paused = false;
    }

    fn suspend_painting_and_js(&mut self) {
        self.stop_timer(TimerTask::SuspendDom);
        if self.background_run || !self.is_suspended {
            return;
        }
        if !self.has_been_shown && self.progress < 100 {
            debug!(
                "[{}:{}] still loading, suspend deferred to load finish",
                self.app_id, self.instance_id
            );
            self.suspend_at_load = true;
        } else {
            self.view.suspend_painting();
            self.view.suspend_dom();
        }
    }

    fn resume_painting_and_js(&mut self) {
        self.suspend_at_load = false;
        if !self.is_suspended {
            return;
        }
        if self.is_timer_running(TimerTask::SuspendDom) {
            debug!(
                "[{}:{}] DOM suspend timer cancelled by resume",
                self.app_id, self.instance_id
            );
            self.stop_timer(TimerTask::SuspendDom);
        } else {
            self.view.resume_dom();
        }
        self.view.resume_painting();
        self.is_suspended = false;
    }

    /// Starts the unload half of the close sequence by loading `about:blank`.
    pub fn clean_resources(&mut self) {
        info!(
            "[{}:{}] stop loading and load about:blank",
            self.app_id, self.instance_id
        );
        self.cleaning_resources = true;
        self.view.stop_loading();
        self.view.load_url("about:blank");
    }

    pub fn execute_close_callback(&mut self, forced: bool) {
        let mode = if forced { "forced" } else { "normal" };
        self.view
            .run_javascript(&format!("window.webOSSystem._onCloseWithNotify_('{mode}');"));
        self.stop_timer(TimerTask::CloseCallbackTimeout);
        self.close_callback_timer = Some(self.ctx.timers().start(
            CLOSE_CALLBACK_TIMEOUT,
            &self.instance_id,
            TimerTask::CloseCallbackTimeout,
        ));
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.view.set_visible(visible);
    }

    pub fn set_visibility_state(&mut self, state: VisibilityState) {
        self.view.set_visibility_state(state);
    }

    pub fn set_focus(&mut self, focus: bool) {
        self.view.set_focus(focus);
    }

    pub fn create_native_bridge(&mut self) {
        self.view.create_native_bridge(&self.app_id);
    }

    pub fn set_app_preload_hint(&mut self, preload: bool) {
        self.view.set_app_preload_hint(preload);
        self.view.set_block_write_disk_cache(preload);
    }

    pub fn activate_renderer_compositor(&mut self) {
        self.view.activate_compositor();
    }

    pub fn deactivate_renderer_compositor(&mut self) {
        self.view.deactivate_compositor();
    }

    pub fn notify_memory_pressure(&mut self, level: MemoryPressureLevel) {
        self.view.notify_memory_pressure(level);
    }

    pub fn set_audio_guidance_on(&mut self, on: bool) {
        self.view.set_audio_guidance_on(on);
    }

    pub fn set_use_accessibility(&mut self, enabled: bool) {
        self.view.set_use_accessibility(enabled);
    }

    pub fn set_use_launch_optimization(&mut self, enabled: bool) {
        if self.ctx.config().launch_optimization_enabled {
            self.view
                .set_use_launch_optimization(enabled, self.desc.delay_ms_for_launch_optimization());
        }
    }

    /// Whether suspension is skipped. Only the manager turns this on, and only
    /// for window types that may run in the background.
    pub fn is_background_run(&self) -> bool {
        self.background_run
    }

    pub fn set_background_run(&mut self, enabled: bool) {
        self.background_run = enabled;
        self.view.set_background_run(enabled);
    }

    pub fn set_keep_alive(&mut self, keep_alive: bool) {
        self.view.set_keep_alive(keep_alive);
    }

    pub fn set_inspector_enable(&mut self) {
        info!("[{}] inspector enabled", self.app_id);
        self.view.set_inspectable(true);
    }

    pub fn set_preferred_languages(&mut self, language: &str) {
        self.view.set_accept_languages(language);
    }

    pub fn send_locale_change_event(&mut self) {
        self.view.run_javascript(
            "setTimeout(function () {\
                var localeEvent=new CustomEvent('webOSLocaleChange');\
                document.dispatchEvent(localeEvent);\
            }, 1);",
        );
    }

    pub fn handle_device_info_changed(&mut self, name: &str) {
        if name != "LocalCountry" && name != "SmartServiceCountry" {
            return;
        }
        let device_info = self.ctx.device_info();
        let country = serde_json::json!({
            "country": device_info.device_info("LocalCountry").unwrap_or_default(),
            "smartServiceCountry": device_info.device_info("SmartServiceCountry").unwrap_or_default(),
        });
        self.view
            .set_native_bridge_property("country", &country.to_string());
    }

    pub fn keyboard_visibility_changed(&mut self, visible: bool) {
        self.view.run_javascript(&format!(
            "console.log('[WAM] fires keyboardStateChange event : {visible}');\
                var keyboardStateEvent =new CustomEvent('keyboardStateChange', {{ detail: {{ 'visibility' : {visible} }} }});\
                keyboardStateEvent.visibility = {visible};\
                if(document) document.dispatchEvent(keyboardStateEvent);"
        ));
    }

    pub fn run_javascript_in_all_frames(&mut self, script: &str) {
        self.view.run_javascript_in_all_frames(script);
    }

    pub fn set_closing(&mut self, closing: bool) {
        self.is_closing = closing;
    }

    pub fn is_closing(&self) -> bool {
        self.is_closing
    }

    pub fn set_is_preload(&mut self, preload: bool) {
        self.is_preload = preload;
    }

    pub fn is_preload(&self) -> bool {
        self.is_preload
    }

    pub fn set_launch_params(&mut self, params: &str) {
        self.launch_params = params.to_string();
    }

    pub fn launch_params(&self) -> &str {
        &self.launch_params
    }

    pub fn has_close_callback(&self) -> bool {
        self.has_close_callback
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn url(&self) -> String {
        self.view.url()
    }

    pub fn default_url(&self) -> &str {
        &self.default_url
    }

    pub fn title(&self) -> String {
        self.view.title()
    }

    pub fn can_go_back(&self) -> bool {
        self.view.can_go_back()
    }

    pub fn progress(&self) -> i32 {
        self.progress
    }

    pub fn has_been_shown(&self) -> bool {
        self.has_been_shown
    }

    pub fn is_suspended(&self) -> bool {
        self.is_suspended
    }

    pub fn is_load_error_page_start(&self) -> bool {
        self.is_load_error_page_start
    }

    pub fn is_load_error_page_finish(&self) -> bool {
        self.is_load_error_page_finish
    }

    pub fn trust_level(&self) -> &str {
        &self.trust_level
    }

    pub fn web_process_pid(&self) -> Option<u32> {
        self.view.render_process_pid()
    }

    pub fn identifier(&self) -> String {
        if (self.is_load_error_page_finish && self.is_load_error_page_start)
            || self.error_page_from_net_error_helper
        {
            IDENTIFIER_FOR_NET_ERROR_PAGE.to_string()
        } else {
            self.app_id.clone()
        }
    }

    pub fn security_origin_identifier(&self) -> String {
        identifier_for_security_origin(&self.identifier())
    }
}

impl Drop for WebPage {
    fn drop(&mut self) {
        info!("[{}:{}] page closed", self.app_id, self.instance_id);
        for id in [
            self.dom_suspend_timer.take(),
            self.close_callback_timer.take(),
            self.reload_timer.take(),
        ]
        .into_iter()
        .flatten()
        {
            self.ctx.timers().stop(id);
        }
    }
}
