/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Service configuration.
//!
//! Settings come from an optional TOML file and then from the environment
//! variables the deployed service has always used; a set variable wins over
//! the file. Lookups go through a closure so tests never touch the process
//! environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;

const DEFAULT_PLUGIN_PATH: &str = "/usr/lib/webappmanager/plugins";
const DEFAULT_USER_SCRIPT_PATH: &str = "webOSUserScripts/userScript.js";
const DEBUG_SYSTEM_APPS_MARKER: &str = "var/luna/preferences/debug_system_apps";
const DEVMODE_MARKER: &str = "var/luna/preferences/devmode_enabled";

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {e}"),
            ConfigError::Parse(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Same settings as the environment, in snake_case. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    web_app_factory: Option<String>,
    plugin_path: Option<PathBuf>,
    suspend_delay_ms: Option<i64>,
    max_custom_suspend_delay_ms: Option<i64>,
    error_page: Option<String>,
    load_dynamic_pluggable: Option<bool>,
    post_web_process_created_disabled: Option<bool>,
    launch_time_check: Option<bool>,
    launch_optimization: Option<bool>,
    user_script_path: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebAppManagerConfig {
    /// Plugin app types allowed besides the built-in `default`.
    pub plugin_types: Vec<String>,
    pub plugin_path: PathBuf,
    pub suspend_delay: Duration,
    pub max_custom_suspend_delay: Duration,
    /// Platform error page URL; empty disables error pages.
    pub error_page_url: String,
    pub dynamic_pluggable_load_enabled: bool,
    pub post_web_process_created_disabled: bool,
    pub launch_time_check_enabled: bool,
    pub launch_optimization_enabled: bool,
    pub user_script_path: String,
    /// Appended to every user agent.
    pub name: String,
    pub inspector_enabled: bool,
    pub dev_mode_enabled: bool,
}

impl Default for WebAppManagerConfig {
    fn default() -> Self {
        Self {
            plugin_types: Vec::new(),
            plugin_path: PathBuf::from(DEFAULT_PLUGIN_PATH),
            suspend_delay: Duration::from_millis(1),
            max_custom_suspend_delay: Duration::ZERO,
            error_page_url: String::new(),
            dynamic_pluggable_load_enabled: false,
            post_web_process_created_disabled: false,
            launch_time_check_enabled: false,
            launch_optimization_enabled: false,
            user_script_path: DEFAULT_USER_SCRIPT_PATH.to_string(),
            name: String::new(),
            inspector_enabled: false,
            dev_mode_enabled: false,
        }
    }
}

fn split_plugin_types(types: &str) -> Vec<String> {
    types
        .split(':')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn clamp_millis(value: i64, min: i64) -> Duration {
    Duration::from_millis(value.max(min) as u64)
}

impl WebAppManagerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        config.apply_lookup(lookup);
        config
    }

    /// Default file location, `<config dir>/webappmanager/config.toml`.
    pub fn default_file() -> Option<PathBuf> {
        dirs::config_dir().map(|mut dir| {
            dir.push("webappmanager");
            dir.push("config.toml");
            dir
        })
    }

    /// Reads `path` (if given and present) and overlays the environment on
    /// top of it. A missing file is not an error; an unreadable or malformed
    /// one is.
    pub fn load(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = path.filter(|p| p.exists()) {
            let text =
                std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
            config.apply_toml(&text)?;
            info!("loaded configuration from {}", path.display());
        }
        config.apply_lookup(lookup);
        Ok(config)
    }

    pub fn apply_toml(&mut self, text: &str) -> Result<(), ConfigError> {
        let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if let Some(types) = file.web_app_factory {
            self.plugin_types = split_plugin_types(&types);
        }
        if let Some(path) = file.plugin_path {
            self.plugin_path = path;
        }
        if let Some(ms) = file.suspend_delay_ms {
            self.suspend_delay = clamp_millis(ms, 1);
        }
        if let Some(ms) = file.max_custom_suspend_delay_ms {
            self.max_custom_suspend_delay = clamp_millis(ms, 0);
        }
        if let Some(url) = file.error_page {
            self.error_page_url = url;
        }
        if let Some(on) = file.load_dynamic_pluggable {
            self.dynamic_pluggable_load_enabled = on;
        }
        if let Some(on) = file.post_web_process_created_disabled {
            self.post_web_process_created_disabled = on;
        }
        if let Some(on) = file.launch_time_check {
            self.launch_time_check_enabled = on;
        }
        if let Some(on) = file.launch_optimization {
            self.launch_optimization_enabled = on;
        }
        if let Some(path) = file.user_script_path.filter(|p| !p.is_empty()) {
            self.user_script_path = path;
        }
        if let Some(name) = file.name {
            self.name = name;
        }
        Ok(())
    }

    fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let flag = |name: &str| get(name).map(|v| v == "1");

        if let Some(types) = get("WEBAPPFACTORY") {
            self.plugin_types = split_plugin_types(&types);
        }
        if let Some(path) = get("WEBAPPFACTORY_PLUGIN_PATH") {
            self.plugin_path = PathBuf::from(path);
        }
        if let Some(ms) = get("WAM_SUSPEND_DELAY_IN_MS") {
            self.suspend_delay = clamp_millis(ms.trim().parse().unwrap_or(0), 1);
        }
        if let Some(ms) = get("MAX_CUSTOM_SUSPEND_DELAY_IN_MS") {
            self.max_custom_suspend_delay = clamp_millis(ms.trim().parse().unwrap_or(0), 0);
        }
        if let Some(url) = get("WAM_ERROR_PAGE") {
            self.error_page_url = url;
        }
        if let Some(on) = flag("LOAD_DYNAMIC_PLUGGABLE") {
            self.dynamic_pluggable_load_enabled = on;
        }
        if let Some(on) = flag("POST_WEBPROCESS_CREATED_DISABLED") {
            self.post_web_process_created_disabled = on;
        }
        if let Some(on) = flag("LAUNCH_TIME_CHECK") {
            self.launch_time_check_enabled = on;
        }
        if let Some(on) = flag("ENABLE_LAUNCH_OPTIMIZATION") {
            self.launch_optimization_enabled = on;
        }
        if let Some(path) = get("USER_SCRIPT_PATH") {
            self.user_script_path = path;
        }
        if let Some(name) = get("WAM_NAME") {
            self.name = name;
        }
    }

    /// Turns on the inspector and developer mode when their marker files
    /// exist under `root`.
    pub fn post_init_configuration(&mut self, root: &Path) {
        if root.join(DEBUG_SYSTEM_APPS_MARKER).exists() {
            debug!("system app debugging marker found, inspector enabled");
            self.inspector_enabled = true;
        }
        if root.join(DEVMODE_MARKER).exists() {
            debug!("developer mode marker found");
            self.dev_mode_enabled = true;
        }
    }

    pub fn has_error_page(&self) -> bool {
        !self.error_page_url.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = WebAppManagerConfig::from_lookup(|_| None);
        assert_eq!(config.plugin_path, PathBuf::from(DEFAULT_PLUGIN_PATH));
        assert_eq!(config.suspend_delay, Duration::from_millis(1));
        assert_eq!(config.max_custom_suspend_delay, Duration::ZERO);
        assert_eq!(config.user_script_path, DEFAULT_USER_SCRIPT_PATH);
        assert!(config.plugin_types.is_empty());
        assert!(!config.has_error_page());
    }

    #[test]
    fn environment_values_are_read() {
        let config = WebAppManagerConfig::from_lookup(lookup(&[
            ("WEBAPPFACTORY", "extended:minimal::"),
            ("WEBAPPFACTORY_PLUGIN_PATH", "/opt/plugins"),
            ("WAM_SUSPEND_DELAY_IN_MS", "250"),
            ("MAX_CUSTOM_SUSPEND_DELAY_IN_MS", "1000"),
            ("WAM_ERROR_PAGE", "file:///usr/share/err/loaderror.html"),
            ("LOAD_DYNAMIC_PLUGGABLE", "1"),
            ("WAM_NAME", "WAM/1.0"),
        ]));
        assert_eq!(config.plugin_types, vec!["extended", "minimal"]);
        assert_eq!(config.plugin_path, PathBuf::from("/opt/plugins"));
        assert_eq!(config.suspend_delay, Duration::from_millis(250));
        assert_eq!(config.max_custom_suspend_delay, Duration::from_millis(1000));
        assert!(config.has_error_page());
        assert!(config.dynamic_pluggable_load_enabled);
        assert_eq!(config.name, "WAM/1.0");
    }

    #[rstest]
    #[case("0", 1)]
    #[case("-20", 1)]
    #[case("garbage", 1)]
    #[case("40", 40)]
    fn suspend_delay_is_at_least_one_ms(#[case] raw: &str, #[case] expected: u64) {
        let config =
            WebAppManagerConfig::from_lookup(lookup(&[("WAM_SUSPEND_DELAY_IN_MS", raw)]));
        assert_eq!(config.suspend_delay, Duration::from_millis(expected));
    }

    #[rstest]
    #[case("1", true)]
    #[case("true", false)]
    #[case("0", false)]
    fn flags_require_exactly_one(#[case] raw: &str, #[case] expected: bool) {
        let config = WebAppManagerConfig::from_lookup(lookup(&[("LAUNCH_TIME_CHECK", raw)]));
        assert_eq!(config.launch_time_check_enabled, expected);
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "plugin_path = \"/from/file\"\nsuspend_delay_ms = 500\nname = \"file\"\n",
        )
        .unwrap();

        let config =
            WebAppManagerConfig::load(Some(&path), lookup(&[("WAM_NAME", "env")])).unwrap();
        assert_eq!(config.plugin_path, PathBuf::from("/from/file"));
        assert_eq!(config.suspend_delay, Duration::from_millis(500));
        assert_eq!(config.name, "env");
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            WebAppManagerConfig::load(Some(&dir.path().join("absent.toml")), |_| None).unwrap();
        assert_eq!(config, WebAppManagerConfig::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "unknown_key = 1\n").unwrap();
        let err = WebAppManagerConfig::load(Some(&path), |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn marker_files_enable_debugging() {
        let root = tempfile::tempdir().unwrap();
        let prefs = root.path().join("var/luna/preferences");
        std::fs::create_dir_all(&prefs).unwrap();
        std::fs::write(prefs.join("debug_system_apps"), "").unwrap();

        let mut config = WebAppManagerConfig::default();
        config.post_init_configuration(root.path());
        assert!(config.inspector_enabled);
        assert!(!config.dev_mode_enabled);

        std::fs::write(prefs.join("devmode_enabled"), "").unwrap();
        config.post_init_configuration(root.path());
        assert!(config.dev_mode_enabled);
    }
}
