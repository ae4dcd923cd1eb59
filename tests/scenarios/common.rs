/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::rc::Rc;

use webappmanager::platform::headless::{HeadlessPlatform, HeadlessServiceSender, StaticDeviceInfo};
use webappmanager::{WebApp, WebAppManager, WebAppManagerConfig, WebPage};

pub const APP: &str = r#"{"id":"com.example.app","main":"index.html","version":"1.0.0"}"#;
pub const LAUNCHER: &str = "com.example.launcher";

pub struct Harness {
    pub platform: Rc<HeadlessPlatform>,
    pub bus: Rc<HeadlessServiceSender>,
    pub manager: WebAppManager,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(WebAppManagerConfig {
            plugin_path: std::env::temp_dir().join("webappmanager-scenarios-no-plugins"),
            ..WebAppManagerConfig::default()
        })
    }

    pub fn with_config(config: WebAppManagerConfig) -> Self {
        let platform = Rc::new(HeadlessPlatform::new((1920, 1080)));
        let bus = Rc::new(HeadlessServiceSender::new());
        let manager = WebAppManager::new(
            config,
            platform.clone(),
            Rc::new(StaticDeviceInfo::new("en-US", (1920, 1080))),
            bus.clone(),
        );
        Self {
            platform,
            bus,
            manager,
        }
    }

    /// Launches and lets every queued engine notification settle.
    pub fn launch(&mut self, desc: &str, params: &str) -> String {
        let id = self
            .manager
            .launch(desc, params, LAUNCHER)
            .expect("launch should succeed");
        self.manager.spin_event_loop();
        id
    }

    pub fn app(&self, instance_id: &str) -> &WebApp {
        self.manager
            .find_app_by_instance_id(instance_id)
            .expect("app should be running")
    }

    pub fn page(&self, instance_id: &str) -> &WebPage {
        self.app(instance_id).page().expect("app should have a page")
    }
}
