/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Parsed `appinfo.json` manifest.
//!
//! Parsing only fails when the text is not a JSON object. Below that every
//! field is read on its own and falls back to its default when missing or of
//! the wrong type, so an odd manifest still launches.

use std::collections::BTreeMap;
use std::path::Path;

use log::{error, warn};
use serde_json::Value;

use crate::util::{json_bool, json_i32, json_str, string_to_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowClass {
    #[default]
    Normal,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowGroupInfo {
    pub name: String,
    pub is_owner: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowOwnerInfo {
    pub allow_anonymous: bool,
    /// Layer name to z-order.
    pub layers: BTreeMap<String, i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowClientInfo {
    pub layer: String,
    pub hint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyFilter {
    pub to: i32,
    pub modifier: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationDescription {
    id: String,
    title: String,
    entry_point: String,
    icon: String,
    folder_path: String,
    version: String,
    trust_level: String,
    sub_type: String,
    default_window_type: String,
    requested_window_orientation: String,
    deep_linking_params: String,
    location_hint: String,
    vendor_extension: String,
    media_extension: String,
    window_group: String,
    window_class: WindowClass,
    width_override: i32,
    height_override: i32,
    key_filter_table: BTreeMap<i32, KeyFilter>,
    v8_snapshot_path: String,
    v8_extra_flags: String,
    network_stable_timeout: Option<f64>,
    delay_ms_for_launch_optimization: u32,
    custom_suspend_dom_time: i32,
    display_affinity: Option<i32>,
    transparent: bool,
    handles_relaunch: bool,
    inspectable: bool,
    custom_plugin: bool,
    back_history_api_disabled: bool,
    do_not_track: bool,
    handle_exit_key: bool,
    background_run: bool,
    allow_video_capture: bool,
    allow_audio_capture: bool,
    use_virtual_keyboard: bool,
    use_prerendering: bool,
    use_native_scroll: bool,
    disallow_scrolling_in_main_frame: bool,
    supports_audio_guidance: bool,
    use_unlimited_media_policy: bool,
}

fn string_field(json: &Value, key: &str) -> String {
    json_str(json, key).unwrap_or_default().to_string()
}

/// Serialises an object-valued field, `{}` when absent.
fn raw_field(json: &Value, key: &str) -> String {
    match json.get(key) {
        Some(value) if !value.is_null() => value.to_string(),
        _ => "{}".to_string(),
    }
}

/// `"WxH"` with both parts positive, else `(0, 0)`.
fn parse_resolution(text: &str) -> (i32, i32) {
    let mut parts = text.split('x');
    let (Some(w), Some(h), None) = (parts.next(), parts.next(), parts.next()) else {
        return (0, 0);
    };
    match (w.parse::<i32>(), h.parse::<i32>()) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
        _ => (0, 0),
    }
}

fn parse_key_filter_table(json: &Value) -> BTreeMap<i32, KeyFilter> {
    let mut table = BTreeMap::new();
    let Some(entries) = json.get("keyFilterTable").and_then(Value::as_array) else {
        return table;
    };
    for entry in entries.iter().filter(|e| e.is_object()) {
        let from = json_i32(entry, "from").unwrap_or(0);
        table.insert(
            from,
            KeyFilter {
                to: json_i32(entry, "to").unwrap_or(0),
                modifier: json_i32(entry, "modifier").unwrap_or(0),
            },
        );
    }
    table
}

impl ApplicationDescription {
    pub fn from_json(text: &str) -> Option<Self> {
        let json = string_to_json(text);
        if !json.is_object() {
            warn!("failed to parse application description: {text}");
            return None;
        }

        let id = string_field(&json, "id");
        let folder_path = string_field(&json, "folderPath");

        let mut trust_level = string_field(&json, "trustLevel");
        if trust_level != "default" && trust_level != "trusted" {
            trust_level = "default".to_string();
        }
        let mut sub_type = string_field(&json, "subType");
        if sub_type.is_empty() {
            sub_type = "default".to_string();
        }

        let v8_snapshot_path = match json_str(&json, "v8SnapshotFile") {
            Some(file) if file.starts_with('/') => file.to_string(),
            Some(file) if !file.is_empty() => format!("{folder_path}/{file}"),
            _ => String::new(),
        };

        let (width_override, height_override) = json_str(&json, "resolution")
            .map(parse_resolution)
            .unwrap_or((0, 0));

        let window_class = match json.get("class") {
            Some(class) if json_bool(class, "hidden") => WindowClass::Hidden,
            _ => WindowClass::Normal,
        };

        let network_stable_timeout = match json.get("networkStableTimeout") {
            None => None,
            Some(Value::Number(n)) => n.as_f64(),
            Some(other) => {
                error!("[{id}] networkStableTimeout has invalid type: {other}");
                None
            }
        };

        let mut entry_point = string_field(&json, "main");
        let mut icon = string_field(&json, "icon");
        if !folder_path.is_empty() {
            let entry_path = format!("{folder_path}/{entry_point}");
            if Path::new(&entry_path).exists() {
                entry_point = format!("file://{entry_path}");
            }
            let icon_path = format!("{folder_path}/{icon}");
            if Path::new(&icon_path).exists() {
                icon = icon_path;
            }
        }

        let supports_audio_guidance = json
            .get("accessibility")
            .is_some_and(|a| json_bool(a, "supportsAudioGuidance"));

        Some(Self {
            title: string_field(&json, "title"),
            version: string_field(&json, "version"),
            default_window_type: string_field(&json, "defaultWindowType"),
            requested_window_orientation: string_field(&json, "requestedWindowOrientation"),
            deep_linking_params: string_field(&json, "deeplinkingParams"),
            location_hint: string_field(&json, "locationHint"),
            vendor_extension: raw_field(&json, "vendorExtension"),
            media_extension: raw_field(&json, "mediaExtension"),
            window_group: raw_field(&json, "windowGroup"),
            window_class,
            width_override,
            height_override,
            key_filter_table: parse_key_filter_table(&json),
            v8_snapshot_path,
            v8_extra_flags: string_field(&json, "v8ExtraFlags"),
            network_stable_timeout,
            delay_ms_for_launch_optimization: json_i32(&json, "delayMsForLaunchOptimization")
                .map(|ms| ms.max(0) as u32)
                .unwrap_or(0),
            custom_suspend_dom_time: json_i32(&json, "suspendDOMTime").unwrap_or(0),
            display_affinity: None,
            transparent: json_bool(&json, "transparent"),
            handles_relaunch: json_bool(&json, "handlesRelaunch"),
            inspectable: json_bool(&json, "inspectable"),
            custom_plugin: json_bool(&json, "customPlugin"),
            back_history_api_disabled: json_bool(&json, "disableBackHistoryAPI"),
            do_not_track: json_bool(&json, "doNotTrack"),
            handle_exit_key: json_bool(&json, "handleExitKey"),
            background_run: json_bool(&json, "enableBackgroundRun"),
            allow_video_capture: json_bool(&json, "allowVideoCapture"),
            allow_audio_capture: json_bool(&json, "allowAudioCapture"),
            use_virtual_keyboard: json_bool(&json, "enableKeyboard"),
            use_prerendering: json_bool(&json, "usePrerendering"),
            use_native_scroll: json_bool(&json, "useNativeScroll"),
            disallow_scrolling_in_main_frame: json
                .get("disallowScrollingInMainFrame")
                .map_or(true, |v| v.as_bool().unwrap_or(false)),
            supports_audio_guidance,
            use_unlimited_media_policy: json_bool(&json, "useUnlimitedMediaPolicy"),
            id,
            entry_point,
            icon,
            folder_path,
            trust_level,
            sub_type,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn folder_path(&self) -> &str {
        &self.folder_path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Always `"default"` or `"trusted"`.
    pub fn trust_level(&self) -> &str {
        &self.trust_level
    }

    /// Factory app type; never empty.
    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    pub fn default_window_type(&self) -> &str {
        &self.default_window_type
    }

    pub fn requested_window_orientation(&self) -> &str {
        &self.requested_window_orientation
    }

    pub fn deep_linking_params(&self) -> &str {
        &self.deep_linking_params
    }

    pub fn handles_deeplinking(&self) -> bool {
        !self.deep_linking_params.is_empty()
    }

    pub fn location_hint(&self) -> &str {
        &self.location_hint
    }

    pub fn vendor_extension(&self) -> &str {
        &self.vendor_extension
    }

    pub fn media_extension(&self) -> &str {
        &self.media_extension
    }

    pub fn window_class(&self) -> WindowClass {
        self.window_class
    }

    pub fn width_override(&self) -> i32 {
        self.width_override
    }

    pub fn height_override(&self) -> i32 {
        self.height_override
    }

    pub fn resolution_override(&self) -> Option<(u32, u32)> {
        (self.width_override > 0 && self.height_override > 0)
            .then(|| (self.width_override as u32, self.height_override as u32))
    }

    pub fn key_filter_table(&self) -> &BTreeMap<i32, KeyFilter> {
        &self.key_filter_table
    }

    pub fn v8_snapshot_path(&self) -> &str {
        &self.v8_snapshot_path
    }

    pub fn v8_extra_flags(&self) -> &str {
        &self.v8_extra_flags
    }

    /// `None` when the manifest did not give a numeric value.
    pub fn network_stable_timeout(&self) -> Option<f64> {
        self.network_stable_timeout
    }

    pub fn delay_ms_for_launch_optimization(&self) -> u32 {
        self.delay_ms_for_launch_optimization
    }

    pub fn custom_suspend_dom_time(&self) -> i32 {
        self.custom_suspend_dom_time
    }

    pub fn display_affinity(&self) -> Option<i32> {
        self.display_affinity
    }

    pub fn set_display_affinity(&mut self, display: i32) {
        self.display_affinity = Some(display);
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn handles_relaunch(&self) -> bool {
        self.handles_relaunch
    }

    pub fn is_inspectable(&self) -> bool {
        self.inspectable
    }

    pub fn is_custom_plugin(&self) -> bool {
        self.custom_plugin
    }

    pub fn back_history_api_disabled(&self) -> bool {
        self.back_history_api_disabled
    }

    pub fn do_not_track(&self) -> bool {
        self.do_not_track
    }

    pub fn handle_exit_key(&self) -> bool {
        self.handle_exit_key
    }

    pub fn is_enable_background_run(&self) -> bool {
        self.background_run
    }

    pub fn allow_video_capture(&self) -> bool {
        self.allow_video_capture
    }

    pub fn allow_audio_capture(&self) -> bool {
        self.allow_audio_capture
    }

    pub fn use_virtual_keyboard(&self) -> bool {
        self.use_virtual_keyboard
    }

    pub fn use_prerendering(&self) -> bool {
        self.use_prerendering
    }

    pub fn use_native_scroll(&self) -> bool {
        self.use_native_scroll
    }

    pub fn disallow_scrolling_in_main_frame(&self) -> bool {
        self.disallow_scrolling_in_main_frame
    }

    pub fn supports_audio_guidance(&self) -> bool {
        self.supports_audio_guidance
    }

    pub fn use_unlimited_media_policy(&self) -> bool {
        self.use_unlimited_media_policy
    }

    fn window_group_json(&self) -> Value {
        string_to_json(&self.window_group)
    }

    pub fn window_group_info(&self) -> WindowGroupInfo {
        let json = self.window_group_json();
        if !json.is_object() {
            return WindowGroupInfo::default();
        }
        WindowGroupInfo {
            name: string_field(&json, "name"),
            is_owner: json_bool(&json, "owner"),
        }
    }

    pub fn window_owner_info(&self) -> WindowOwnerInfo {
        let json = self.window_group_json();
        let Some(owner) = json.get("ownerInfo").filter(|o| o.is_object()) else {
            return WindowOwnerInfo::default();
        };
        let layers = owner
            .get("layers")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|layer| Some((json_str(layer, "name")?.to_string(), json_i32(layer, "z")?)))
            .collect();
        WindowOwnerInfo {
            allow_anonymous: json_bool(owner, "allowAnonymous"),
            layers,
        }
    }

    pub fn window_client_info(&self) -> WindowClientInfo {
        let json = self.window_group_json();
        let Some(client) = json.get("clientInfo").filter(|c| c.is_object()) else {
            return WindowClientInfo::default();
        };
        WindowClientInfo {
            layer: string_field(client, "layer"),
            hint: string_field(client, "hint"),
        }
    }
}
