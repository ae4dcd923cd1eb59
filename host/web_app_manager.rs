/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Registry of running web apps and the entry point for every lifecycle
//! command.
//!
//! The manager owns every app. Running apps live in launch order; apps that
//! are tearing down move to a closing set keyed by instance id until their
//! page reports the close sequence finished. Apps and pages talk back only
//! through [`ManagerRequest`]s, which are drained by
//! [`WebAppManager::spin_event_loop`] together with engine and compositor
//! notifications and expired timers.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use log::{debug, info, warn};
use serde_json::Value;

use crate::host::application_description::ApplicationDescription;
use crate::host::config::WebAppManagerConfig;
use crate::host::web_app::WebApp;
use crate::host::web_page::WebPage;
use crate::host::window_types::WindowType;
use crate::platform::{
    DeviceInfo, MemoryPressureLevel, PlatformModules, RunningAppInfo, ServiceSender,
    WindowHostState,
};
use crate::registries::WebAppFactoryManager;
use crate::runtime::{ManagerRequest, ScheduledTask, WamContext};
use crate::util::{json_bool, json_i32, json_str, string_to_json};

const CONTINUOUS_RELOADING_LIMIT: u32 = 3;
const FIRST_INSTANCE_ID: u64 = 1000;

const ERR_CODE_LAUNCHAPP_MISS_PARAM: i32 = 1000;
const ERR_CODE_LAUNCHAPP_UNSUPPORTED_TYPE: i32 = 1001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchError {
    /// The app description is not a JSON object.
    InvalidDescription,
    /// The launch parameters are not a JSON object.
    InvalidParameters,
    /// No factory could build an app or page for the description's
    /// `subType`.
    UnsupportedType,
}

impl LaunchError {
    pub fn error_code(self) -> i32 {
        match self {
            LaunchError::InvalidDescription | LaunchError::InvalidParameters => {
                ERR_CODE_LAUNCHAPP_MISS_PARAM
            }
            LaunchError::UnsupportedType => ERR_CODE_LAUNCHAPP_UNSUPPORTED_TYPE,
        }
    }

    pub fn error_text(self) -> &'static str {
        match self {
            LaunchError::InvalidDescription => "Miss launch parameter(s)",
            LaunchError::InvalidParameters => "Incoming JSON is invalid or not completed",
            LaunchError::UnsupportedType => "Unsupported app type (Check subType)",
        }
    }
}

impl std::fmt::Display for LaunchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.error_text(), self.error_code())
    }
}

impl std::error::Error for LaunchError {}

pub struct WebAppManager {
    ctx: Rc<WamContext>,
    requests: Receiver<ManagerRequest>,
    factory: WebAppFactoryManager,
    service_sender: Rc<dyn ServiceSender>,

    running: Vec<WebApp>,
    closing: BTreeMap<String, WebApp>,
    /// App id to the instance ids of its pages, in launch order.
    app_pages: BTreeMap<String, Vec<String>>,
    app_versions: HashMap<String, String>,
    crash_counts: HashMap<String, u32>,
    active_instance_id: Option<String>,
    next_instance_id: u64,
}

impl WebAppManager {
    pub fn new(
        config: WebAppManagerConfig,
        platform: Rc<dyn PlatformModules>,
        device_info: Rc<dyn DeviceInfo>,
        service_sender: Rc<dyn ServiceSender>,
    ) -> Self {
        let factory = WebAppFactoryManager::new(&config);
        let (ctx, requests) = WamContext::new(config, platform, device_info);
        info!(
            "web app manager ready, plugin types {:?}",
            factory.cached_types().collect::<Vec<_>>()
        );
        Self {
            ctx,
            requests,
            factory,
            service_sender,
            running: Vec::new(),
            closing: BTreeMap::new(),
            app_pages: BTreeMap::new(),
            app_versions: HashMap::new(),
            crash_counts: HashMap::new(),
            active_instance_id: None,
            next_instance_id: FIRST_INSTANCE_ID,
        }
    }

    pub fn config(&self) -> &WebAppManagerConfig {
        self.ctx.config()
    }

    pub fn context(&self) -> &Rc<WamContext> {
        &self.ctx
    }

    pub fn factory(&self) -> &WebAppFactoryManager {
        &self.factory
    }

    /// Launches `app_desc` or, if the instance id in `params` is already
    /// running, relaunches it. Returns the instance id.
    pub fn launch(
        &mut self,
        app_desc: &str,
        params: &str,
        launching_app_id: &str,
    ) -> Result<String, LaunchError> {
        let Some(mut desc) = ApplicationDescription::from_json(app_desc) else {
            return Err(LaunchError::InvalidDescription);
        };

        let mut json = string_to_json(params);
        let Some(object) = json.as_object_mut() else {
            warn!("failed to parse launch params: '{params}'");
            return Err(LaunchError::InvalidParameters);
        };
        if let Some(display) = object
            .get("displayAffinity")
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok())
        {
            desc.set_display_affinity(display);
        }

        let existing = object
            .get("instanceId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let (instance_id, params) = match existing {
            Some(id) => (id, params.to_string()),
            None => {
                let id = self.generate_instance_id();
                object.insert("instanceId".to_string(), Value::String(id.clone()));
                (id, json.to_string())
            }
        };

        if self.is_running_app(&instance_id) {
            self.on_relaunch_app(&instance_id, desc.id(), &params, launching_app_id);
            return Ok(instance_id);
        }

        let url = desc.entry_point().to_string();
        let window_type = WindowType::from_description(desc.default_window_type());
        self.on_launch_url(
            &url,
            window_type,
            Rc::new(desc),
            &instance_id,
            &params,
            launching_app_id,
        )
    }

    pub fn on_launch_url(
        &mut self,
        url: &str,
        window_type: WindowType,
        desc: Rc<ApplicationDescription>,
        instance_id: &str,
        params: &str,
        launching_app_id: &str,
    ) -> Result<String, LaunchError> {
        let app_type = desc.sub_type().to_string();
        let Some(mut app) =
            self.factory
                .create_web_app(window_type, Rc::clone(&desc), &app_type, &self.ctx)
        else {
            warn!("[{}] no factory for app type '{app_type}'", desc.id());
            return Err(LaunchError::UnsupportedType);
        };
        let Some(mut page) = self.factory.create_web_page(
            window_type,
            url,
            Rc::clone(&desc),
            &app_type,
            params,
            &self.ctx,
        ) else {
            warn!("[{}] no page for app type '{app_type}'", desc.id());
            return Err(LaunchError::UnsupportedType);
        };

        page.set_use_launch_optimization(true);
        if window_type.supports_background_run() {
            page.set_background_run(desc.is_enable_background_run());
        }

        app.set_app_properties(params);
        app.set_instance_id(instance_id);
        app.set_launching_app_id(launching_app_id);
        if self.ctx.config().launch_time_check_enabled {
            app.start_launch_timer();
        }
        app.attach(page);
        app.set_preload_state(params);
        if let Some(page) = app.page_mut() {
            page.load();
        }

        let app_id = desc.id().to_string();
        match self.app_versions.get(&app_id) {
            Some(version) if version != desc.version() => {
                info!(
                    "[{app_id}] version changed {version} -> {}, reload on relaunch",
                    desc.version()
                );
                app.set_need_reload(true);
                self.app_versions.insert(app_id.clone(), desc.version().to_string());
            }
            Some(_) => {}
            None => {
                self.app_versions.insert(app_id.clone(), desc.version().to_string());
            }
        }

        info!(
            "[{app_id}:{instance_id}] launched, pid {:?}",
            app.web_process_pid()
        );
        self.app_pages
            .entry(app_id)
            .or_default()
            .push(instance_id.to_string());
        self.running.push(app);
        self.post_running_app_list();
        Ok(instance_id.to_string())
    }

    pub fn on_relaunch_app(
        &mut self,
        instance_id: &str,
        app_id: &str,
        args: &str,
        launching_app_id: &str,
    ) {
        let Some(app) = self.find_app_by_instance_id_mut(instance_id) else {
            warn!("[{app_id}:{instance_id}] relaunch failed, app is not running");
            return;
        };
        if app.app_id() != app_id {
            warn!(
                "[{instance_id}] relaunch requested for {app_id} but instance runs {}",
                app.app_id()
            );
        }

        let json = string_to_json(args);
        if !json.is_object() {
            warn!("[{app_id}:{instance_id}] failed to parse relaunch args: '{args}'");
            return;
        }

        if app.keep_alive() && app.close_page_requested() {
            app.set_close_page_requested(false);
        }

        let preload = json.get("preload").is_some_and(Value::is_string);
        if !preload && !json_bool(&json, "launchedHidden") {
            app.relaunch(args, launching_app_id);
        } else {
            info!(
                "[{}:{instance_id}] relaunch with preload intent ignored, pid {:?}",
                app.app_id(),
                app.web_process_pid()
            );
        }
    }

    pub fn on_kill_app(&mut self, app_id: &str, instance_id: &str, force: bool) -> bool {
        let Some(app) = self.find_app_by_instance_id(instance_id) else {
            info!("[{app_id}:{instance_id}] kill: app is not running");
            return false;
        };
        if app.app_id() != app_id {
            info!(
                "[{app_id}:{instance_id}] kill: instance belongs to {}",
                app.app_id()
            );
            return false;
        }
        if force {
            self.force_close_app_internal(instance_id);
        } else {
            self.close_app_internal(instance_id, false);
        }
        true
    }

    pub fn on_pause_app(&mut self, instance_id: &str) -> bool {
        let Some(app) = self.find_app_by_instance_id_mut(instance_id) else {
            return false;
        };
        app.hide_window();
        true
    }

    /// Asks the application manager on the bus to close `instance_id`.
    pub fn close_app(&self, instance_id: &str) {
        self.service_sender.close_app(instance_id);
    }

    /// Force-closes every running app, or only those rendered by `pid`.
    pub fn close_all_apps(&mut self, pid: Option<u32>) -> bool {
        let targets: Vec<String> = self
            .running
            .iter()
            .filter(|app| pid.is_none() || app.web_process_pid() == pid)
            .map(|app| app.instance_id().to_string())
            .collect();
        for instance_id in &targets {
            self.force_close_app_internal(instance_id);
        }
        true
    }

    pub fn force_close_app_internal(&mut self, instance_id: &str) {
        if let Some(app) = self.find_app_by_instance_id_mut(instance_id) {
            app.set_keep_alive(false);
        }
        self.close_app_internal(instance_id, false);
    }

    /// Tears down a running app. Keep-alive apps whose window can be hidden
    /// stay running. With `ignore_clean_resource` the app is dropped at once
    /// instead of running its close sequence.
    pub fn close_app_internal(&mut self, instance_id: &str, ignore_clean_resource: bool) {
        let Some(index) = self.running_index(instance_id) else {
            debug!("[{instance_id}] close: not in the running list");
            return;
        };

        let app = &mut self.running[index];
        if app.is_closing() {
            info!("[{}:{instance_id}] already closing", app.app_id());
        }
        info!(
            "[{}:{instance_id}] close, pid {:?}",
            app.app_id(),
            app.web_process_pid()
        );
        if app.keep_alive() && app.hide_window() {
            return;
        }

        let mut app = self.running.remove(index);
        self.remove_page_index(app.app_id(), instance_id);
        if self.active_instance_id.as_deref() == Some(instance_id) {
            self.active_instance_id = None;
        }
        self.post_running_app_list();
        self.crash_counts.clear();

        if let Some(page) = app.page_mut() {
            page.set_closing(true);
        }
        app.delete_surface_group();
        if app.window_type() == WindowType::Overlay {
            app.hide(true);
        } else {
            app.on_stage_deactivated();
        }

        if ignore_clean_resource {
            return;
        }
        if app.page().is_some_and(WebPage::has_close_callback) {
            info!("[{}:{instance_id}] running close callback", app.app_id());
            app.execute_close_callback();
        } else {
            info!("[{}:{instance_id}] no close callback, unloading", app.app_id());
            app.dispatch_unload();
        }
        self.closing.insert(instance_id.to_string(), app);
    }

    /// Marks an app to be force closed. A hidden keep-alive app is closed
    /// right away.
    pub fn set_force_close_app(&mut self, app_id: &str, instance_id: &str) {
        let Some(app) = self.find_app_by_instance_id_mut(instance_id) else {
            return;
        };
        if app.keep_alive() && app.hidden_window() {
            info!("[{app_id}:{instance_id}] force closing hidden keep-alive app");
            self.force_close_app_internal(instance_id);
            return;
        }
        app.set_force_close();
    }

    /// Reloads a crashed foreground app until it crashed too often in a
    /// row, then drops it. A background app reloads on its next activation.
    pub fn process_crashed(&mut self, app_id: &str, instance_id: &str) -> bool {
        let Some(index) = self.running_index(instance_id) else {
            return false;
        };
        let app = &mut self.running[index];
        if app.is_activated() {
            let count = self.crash_counts.entry(app.app_id().to_string()).or_insert(0);
            *count += 1;
            let limit = if app.is_normal() {
                CONTINUOUS_RELOADING_LIMIT - 1
            } else {
                CONTINUOUS_RELOADING_LIMIT
            };
            if *count >= limit {
                warn!("[{app_id}:{instance_id}] crashed {count} times in the foreground, closing");
                self.close_app_internal(instance_id, true);
            } else {
                info!("[{app_id}:{instance_id}] crashed in the foreground, reloading");
                if let Some(page) = app.page_mut() {
                    page.reload_default_page();
                }
            }
        } else if app.is_minimized() {
            info!("[{app_id}:{instance_id}] crashed in the background, reload on relaunch");
            app.set_crash_state(true);
        }
        true
    }

    pub fn list(&self, include_system_apps: bool) -> Vec<RunningAppInfo> {
        self.running
            .iter()
            .filter(|app| include_system_apps || !app.app_id().is_empty())
            .map(|app| RunningAppInfo {
                app_id: app.app_id().to_string(),
                instance_id: app.instance_id().to_string(),
                pid: app.web_process_pid(),
                display_id: app.app_description().display_affinity(),
            })
            .collect()
    }

    pub fn running_apps(&self) -> impl Iterator<Item = &WebApp> {
        self.running.iter()
    }

    pub fn running_apps_with_pid(&self, pid: u32) -> Vec<&WebApp> {
        self.running
            .iter()
            .filter(|app| app.web_process_pid() == Some(pid))
            .collect()
    }

    pub fn is_running_app(&self, instance_id: &str) -> bool {
        self.running_index(instance_id).is_some()
    }

    pub fn find_app_by_instance_id(&self, instance_id: &str) -> Option<&WebApp> {
        self.running
            .iter()
            .find(|app| app.page().is_some() && app.instance_id() == instance_id)
    }

    pub fn find_app_by_instance_id_mut(&mut self, instance_id: &str) -> Option<&mut WebApp> {
        self.running
            .iter_mut()
            .find(|app| app.page().is_some() && app.instance_id() == instance_id)
    }

    pub fn find_apps_by_id(&self, app_id: &str) -> Vec<&WebApp> {
        self.running
            .iter()
            .filter(|app| app.page().is_some() && app.app_id() == app_id)
            .collect()
    }

    /// Instance ids whose pages belong to `app_id`.
    pub fn app_pages(&self, app_id: &str) -> &[String] {
        self.app_pages.get(app_id).map_or(&[], Vec::as_slice)
    }

    pub fn closing_app(&self, instance_id: &str) -> Option<&WebApp> {
        self.closing.get(instance_id)
    }

    pub fn closing_count(&self) -> usize {
        self.closing.len()
    }

    pub fn active_instance_id(&self) -> Option<&str> {
        self.active_instance_id.as_deref()
    }

    pub fn crash_count(&self, app_id: &str) -> u32 {
        self.crash_counts.get(app_id).copied().unwrap_or(0)
    }

    pub fn web_process_id(&self, app_id: &str, instance_id: &str) -> Option<u32> {
        self.find_app_by_instance_id(instance_id)
            .filter(|app| app.app_id() == app_id)
            .and_then(WebApp::web_process_pid)
    }

    pub fn post_running_app_list(&self) {
        self.service_sender.post_running_app_list(&self.list(true));
    }

    pub fn post_web_process_created(&self, app_id: &str, instance_id: &str, pid: u32) {
        self.post_running_app_list();
        if !self.ctx.config().post_web_process_created_disabled {
            self.service_sender
                .post_web_process_created(app_id, instance_id, pid);
        }
    }

    pub fn service_call(&self, url: &str, payload: &str, app_id: &str) {
        self.service_sender.service_call(url, payload, app_id);
    }

    pub fn send_event_to_all_apps(&mut self, script: &str) {
        for app in &mut self.running {
            if let Some(page) = app.page_mut() {
                debug!("[{}] send event {script}", page.app_id());
                page.run_javascript_in_all_frames(script);
            }
        }
    }

    pub fn set_inspector_enable(&mut self, app_id: &str) -> bool {
        let Some(page) = self
            .running
            .iter_mut()
            .filter_map(WebApp::page_mut)
            .find(|page| page.app_id() == app_id)
        else {
            return false;
        };
        debug!("[{app_id}] inspector enabled");
        page.set_inspector_enable();
        true
    }

    pub fn set_system_language(&mut self, language: &str) {
        self.ctx.device_info().set_system_language(language);
        for app in &mut self.running {
            app.set_preferred_languages(language);
        }
        info!("system language set to {language}");
    }

    pub fn system_language(&self) -> String {
        self.ctx.device_info().system_language()
    }

    pub fn set_device_info(&mut self, name: &str, value: &str) {
        let old = self.ctx.device_info().device_info(name);
        if old.as_deref() == Some(value) {
            return;
        }
        self.ctx.device_info().set_device_info(name, value);
        for app in &mut self.running {
            app.handle_device_info_changed(name);
        }
        debug!("device info {name}: {old:?} -> {value}");
    }

    pub fn is_accessibility_enabled(&self) -> bool {
        self.ctx.accessibility_enabled()
    }

    pub fn set_accessibility_enabled(&mut self, enabled: bool) {
        if self.ctx.accessibility_enabled() == enabled {
            return;
        }
        for app in &mut self.running {
            if let Some(page) = app.page_mut() {
                page.set_audio_guidance_on(enabled);
            }
            app.set_use_accessibility(enabled);
        }
        self.ctx.set_accessibility_enabled(enabled);
    }

    /// Forwards memory pressure to foreground apps. Preloaded pages are
    /// skipped at the critical level.
    pub fn notify_memory_pressure(&mut self, level: MemoryPressureLevel) {
        for app in &mut self.running {
            let preloaded = app.page().is_some_and(WebPage::is_preload);
            if app.is_activated() && !(preloaded && level == MemoryPressureLevel::Critical) {
                app.notify_memory_pressure(level);
            } else {
                debug!(
                    "[{}:{}] memory pressure {level:?} skipped, activated {} preload {preloaded}",
                    app.app_id(),
                    app.instance_id(),
                    app.is_activated()
                );
            }
        }
    }

    pub fn window_state_changed(&mut self, instance_id: &str, state: WindowHostState) -> bool {
        let Some(app) = self.find_app_by_instance_id_mut(instance_id) else {
            return false;
        };
        app.window_state_changed(state);
        true
    }

    /// Asks the compositor to move the app's window to `state`.
    pub fn set_window_host_state(&mut self, instance_id: &str, state: WindowHostState) -> bool {
        let Some(app) = self.find_app_by_instance_id(instance_id) else {
            return false;
        };
        app.set_window_host_state(state);
        true
    }

    pub fn go_background(&mut self, instance_id: &str) -> bool {
        let Some(app) = self.find_app_by_instance_id_mut(instance_id) else {
            return false;
        };
        app.go_background();
        true
    }

    /// Moves the virtual clock forward and runs everything that became due.
    pub fn advance_clock(&mut self, by: Duration) -> bool {
        self.ctx.timers().advance(by);
        self.spin_event_loop()
    }

    /// Drains page, window, timer and manager queues until all are empty.
    /// Returns whether anything was handled.
    pub fn spin_event_loop(&mut self) -> bool {
        let mut handled = false;
        loop {
            let mut progressed = false;
            for app in &mut self.running {
                progressed |= app.process_events();
            }
            for app in self.closing.values_mut() {
                progressed |= app.process_events();
            }
            for task in self.ctx.timers().take_due() {
                progressed = true;
                self.dispatch_timer(task);
            }
            while let Ok(request) = self.requests.try_recv() {
                progressed = true;
                self.handle_request(request);
            }
            if !progressed {
                return handled;
            }
            handled = true;
        }
    }

    fn dispatch_timer(&mut self, task: ScheduledTask) {
        let app = match self.running_index(&task.instance_id) {
            Some(index) => Some(&mut self.running[index]),
            None => self.closing.get_mut(&task.instance_id),
        };
        match app {
            Some(app) => {
                if !app.handle_timer(task.id, task.task) {
                    debug!("[{}] stale timer {:?}", task.instance_id, task.task);
                }
            }
            None => debug!("[{}] timer {:?} for a gone app", task.instance_id, task.task),
        }
    }

    fn handle_request(&mut self, request: ManagerRequest) {
        match request {
            ManagerRequest::CloseApp { instance_id } => self.close_app(&instance_id),
            ManagerRequest::CloseAppInternal {
                instance_id,
                ignore_clean_resource,
            } => self.close_app_internal(&instance_id, ignore_clean_resource),
            ManagerRequest::ForceCloseAppInternal { instance_id } => {
                self.force_close_app_internal(&instance_id)
            }
            ManagerRequest::CloseWebApp { instance_id } => {
                if self.closing.remove(&instance_id).is_none() {
                    debug!("[{instance_id}] close finished for an app not closing");
                }
            }
            ManagerRequest::ProcessCrashed {
                app_id,
                instance_id,
            } => {
                self.process_crashed(&app_id, &instance_id);
            }
            ManagerRequest::WebProcessCreated {
                app_id,
                instance_id,
                pid,
            } => self.post_web_process_created(&app_id, &instance_id, pid),
            ManagerRequest::PostRunningAppList => self.post_running_app_list(),
            ManagerRequest::SetActiveInstance { instance_id } => {
                self.active_instance_id = Some(instance_id)
            }
        }
    }

    fn generate_instance_id(&mut self) -> String {
        loop {
            let id = self.next_instance_id.to_string();
            self.next_instance_id += 1;
            if !self.is_running_app(&id) && !self.closing.contains_key(&id) {
                return id;
            }
        }
    }

    fn running_index(&self, instance_id: &str) -> Option<usize> {
        self.running
            .iter()
            .position(|app| app.page().is_some() && app.instance_id() == instance_id)
    }

    fn remove_page_index(&mut self, app_id: &str, instance_id: &str) {
        if let Some(instances) = self.app_pages.get_mut(app_id) {
            instances.retain(|id| id != instance_id);
            if instances.is_empty() {
                self.app_pages.remove(app_id);
            }
        }
    }
}

/// Reads the standard launch request fields into launch params, the way the
/// bus front end does before calling [`WebAppManager::launch`].
pub fn launch_params_from_request(request: &Value) -> Option<(String, String, String)> {
    let app_desc = request.get("appDesc").filter(|desc| desc.is_object())?;
    json_str(app_desc, "id")?;

    let mut params = match request.get("parameters") {
        Some(params) if params.is_object() => params.clone(),
        Some(_) => return None,
        None => Value::Object(Default::default()),
    };
    if json_bool(request, "launchHidden") {
        params["launchedHidden"] = Value::Bool(true);
    }
    if let Some(preload) = json_str(request, "preload") {
        params["preload"] = Value::String(preload.to_string());
    }
    if json_bool(request, "keepAlive") {
        params["keepAlive"] = Value::Bool(true);
    }
    if let Some(instance_id) = request.get("instanceId") {
        let instance_id = instance_id.as_str().filter(|id| is_valid_instance_id(id))?;
        params["instanceId"] = Value::String(instance_id.to_string());
    }
    if let Some(display) = json_i32(request, "displayAffinity") {
        params["displayAffinity"] = Value::from(display);
    }

    let launching_app_id = json_str(request, "launchingAppId").unwrap_or_default();
    Some((
        app_desc.to_string(),
        params.to_string(),
        launching_app_id.to_string(),
    ))
}

/// An instance id needs at least one character besides form feeds, line
/// breaks and vertical tabs.
fn is_valid_instance_id(instance_id: &str) -> bool {
    instance_id
        .chars()
        .any(|c| !matches!(c, '\x0c' | '\n' | '\r' | '\x0b'))
}
