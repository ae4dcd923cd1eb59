/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Line-oriented JSON commands, one request object per line, named by its
//! `method` field. Replies follow the bus convention of a `returnValue`
//! flag plus `errorCode`/`errorText` on failure.

use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::host::web_app_manager::{WebAppManager, launch_params_from_request};
use crate::platform::{MemoryPressureLevel, WindowHostState};

const ERR_CODE_LAUNCHAPP_MISS_PARAM: i32 = 1000;
const ERR_CODE_NO_RUNNING_APP: i32 = 2000;
const ERR_CODE_INVALID_PARAM: i32 = 4100;

const ERR_MISS_PARAM: &str = "Miss launch parameter(s)";
const ERR_NO_RUNNING_APP: &str = "App is not running";
const ERR_INVALID_PARAM: &str = "Incoming JSON is invalid or not completed";

#[derive(Debug, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum Command {
    LaunchApp {
        #[serde(flatten)]
        request: Map<String, Value>,
    },
    #[serde(rename_all = "camelCase")]
    KillApp {
        app_id: String,
        instance_id: String,
        #[serde(default)]
        force: bool,
    },
    #[serde(rename_all = "camelCase")]
    PauseApp { instance_id: String },
    #[serde(rename_all = "camelCase")]
    CloseApp { instance_id: String },
    CloseAllApps {
        #[serde(default)]
        pid: Option<u32>,
    },
    #[serde(rename_all = "camelCase")]
    ListRunningApps {
        #[serde(default)]
        include_sys_apps: bool,
    },
    #[serde(rename_all = "camelCase")]
    GetWebProcessId { app_id: String, instance_id: String },
    #[serde(rename_all = "camelCase")]
    SetInspectorEnable { app_id: String },
    SetAccessibilityEnabled { enabled: bool },
    SetSystemLanguage { language: String },
    SetDeviceInfo { name: String, value: String },
    NotifyMemoryPressure { level: String },
    #[serde(rename_all = "camelCase")]
    SetWindowState { instance_id: String, state: String },
    #[serde(rename_all = "camelCase")]
    GoBackground { instance_id: String },
    SendEvent { script: String },
    #[serde(rename_all = "camelCase")]
    AdvanceClock { ms: u64 },
}

fn success(mut body: Value) -> Value {
    body["returnValue"] = Value::Bool(true);
    body
}

fn failure(code: i32, text: &str) -> Value {
    json!({ "returnValue": false, "errorCode": code, "errorText": text })
}

/// Parses and runs one command line against `manager`.
pub fn execute_line(manager: &mut WebAppManager, line: &str) -> Value {
    match serde_json::from_str::<Command>(line) {
        Ok(command) => execute(manager, command),
        Err(e) => {
            warn!("rejected command '{line}': {e}");
            failure(ERR_CODE_INVALID_PARAM, ERR_INVALID_PARAM)
        }
    }
}

pub fn execute(manager: &mut WebAppManager, command: Command) -> Value {
    debug!("command {command:?}");
    match command {
        Command::LaunchApp { request } => {
            let Some((app_desc, params, launching_app_id)) =
                launch_params_from_request(&Value::Object(request))
            else {
                return failure(ERR_CODE_LAUNCHAPP_MISS_PARAM, ERR_MISS_PARAM);
            };
            match manager.launch(&app_desc, &params, &launching_app_id) {
                Ok(instance_id) => success(json!({ "instanceId": instance_id })),
                Err(e) => failure(e.error_code(), e.error_text()),
            }
        }
        Command::KillApp {
            app_id,
            instance_id,
            force,
        } => {
            if manager.on_kill_app(&app_id, &instance_id, force) {
                success(json!({ "appId": app_id, "instanceId": instance_id }))
            } else {
                failure(ERR_CODE_NO_RUNNING_APP, ERR_NO_RUNNING_APP)
            }
        }
        Command::PauseApp { instance_id } => {
            if manager.on_pause_app(&instance_id) {
                success(json!({ "instanceId": instance_id }))
            } else {
                failure(ERR_CODE_NO_RUNNING_APP, ERR_NO_RUNNING_APP)
            }
        }
        Command::CloseApp { instance_id } => {
            if !manager.is_running_app(&instance_id) {
                return failure(ERR_CODE_NO_RUNNING_APP, ERR_NO_RUNNING_APP);
            }
            manager.close_app(&instance_id);
            success(json!({ "instanceId": instance_id }))
        }
        Command::CloseAllApps { pid } => {
            manager.close_all_apps(pid);
            success(json!({}))
        }
        Command::ListRunningApps { include_sys_apps } => {
            success(json!({ "running": manager.list(include_sys_apps) }))
        }
        Command::GetWebProcessId {
            app_id,
            instance_id,
        } => match manager.web_process_id(&app_id, &instance_id) {
            Some(pid) => success(json!({ "pid": pid })),
            None => failure(ERR_CODE_NO_RUNNING_APP, ERR_NO_RUNNING_APP),
        },
        Command::SetInspectorEnable { app_id } => {
            if manager.set_inspector_enable(&app_id) {
                success(json!({}))
            } else {
                failure(ERR_CODE_NO_RUNNING_APP, ERR_NO_RUNNING_APP)
            }
        }
        Command::SetAccessibilityEnabled { enabled } => {
            manager.set_accessibility_enabled(enabled);
            success(json!({}))
        }
        Command::SetSystemLanguage { language } => {
            manager.set_system_language(&language);
            success(json!({}))
        }
        Command::SetDeviceInfo { name, value } => {
            manager.set_device_info(&name, &value);
            success(json!({}))
        }
        Command::NotifyMemoryPressure { level } => match MemoryPressureLevel::from_name(&level) {
            Some(level) => {
                manager.notify_memory_pressure(level);
                success(json!({}))
            }
            None => failure(ERR_CODE_INVALID_PARAM, ERR_INVALID_PARAM),
        },
        Command::SetWindowState { instance_id, state } => {
            let Some(state) = WindowHostState::from_name(&state) else {
                return failure(ERR_CODE_INVALID_PARAM, ERR_INVALID_PARAM);
            };
            if manager.set_window_host_state(&instance_id, state) {
                success(json!({}))
            } else {
                failure(ERR_CODE_NO_RUNNING_APP, ERR_NO_RUNNING_APP)
            }
        }
        Command::GoBackground { instance_id } => {
            if manager.go_background(&instance_id) {
                success(json!({}))
            } else {
                failure(ERR_CODE_NO_RUNNING_APP, ERR_NO_RUNNING_APP)
            }
        }
        Command::SendEvent { script } => {
            manager.send_event_to_all_apps(&script);
            success(json!({}))
        }
        Command::AdvanceClock { ms } => {
            manager.advance_clock(Duration::from_millis(ms));
            success(json!({}))
        }
    }
}
