/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Shared environment handed to every app and page.
//!
//! The context is built once by whoever owns the manager and passed down by
//! `Rc`. Apps and pages never hold a reference back to the manager; anything
//! that needs the registry goes through [`WamContext::request`] and is
//! handled the next time the manager spins its loop.

use std::cell::Cell;
use std::rc::Rc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::warn;

use crate::host::config::WebAppManagerConfig;
use crate::platform::{DeviceInfo, PlatformModules};
use crate::runtime::event_loop::Timers;

/// Work an app or page hands back to the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerRequest {
    /// `window.close()` from page script; forwarded to the bus.
    CloseApp { instance_id: String },
    CloseAppInternal {
        instance_id: String,
        ignore_clean_resource: bool,
    },
    ForceCloseAppInternal { instance_id: String },
    /// The close sequence finished; drop the app.
    CloseWebApp { instance_id: String },
    ProcessCrashed { app_id: String, instance_id: String },
    WebProcessCreated {
        app_id: String,
        instance_id: String,
        pid: u32,
    },
    PostRunningAppList,
    SetActiveInstance { instance_id: String },
}

pub struct WamContext {
    config: WebAppManagerConfig,
    platform: Rc<dyn PlatformModules>,
    device_info: Rc<dyn DeviceInfo>,
    timers: Timers,
    accessibility_enabled: Cell<bool>,
    requests: Sender<ManagerRequest>,
}

impl WamContext {
    pub fn new(
        config: WebAppManagerConfig,
        platform: Rc<dyn PlatformModules>,
        device_info: Rc<dyn DeviceInfo>,
    ) -> (Rc<Self>, Receiver<ManagerRequest>) {
        let (requests, receiver) = unbounded();
        let ctx = Self {
            config,
            platform,
            device_info,
            timers: Timers::new(),
            accessibility_enabled: Cell::new(false),
            requests,
        };
        (Rc::new(ctx), receiver)
    }

    pub fn config(&self) -> &WebAppManagerConfig {
        &self.config
    }

    pub fn platform(&self) -> &dyn PlatformModules {
        self.platform.as_ref()
    }

    pub fn device_info(&self) -> &dyn DeviceInfo {
        self.device_info.as_ref()
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn accessibility_enabled(&self) -> bool {
        self.accessibility_enabled.get()
    }

    pub fn set_accessibility_enabled(&self, enabled: bool) {
        self.accessibility_enabled.set(enabled);
    }

    pub fn request(&self, request: ManagerRequest) {
        if let Err(e) = self.requests.send(request) {
            warn!("manager is gone, dropping {:?}", e.into_inner());
        }
    }
}
