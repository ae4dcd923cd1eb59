/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::rc::Rc;

use log::debug;

use crate::host::application_description::ApplicationDescription;
use crate::host::web_app::WebApp;
use crate::host::web_page::WebPage;
use crate::host::window_types::WindowType;
use crate::registries::WebAppFactory;
use crate::runtime::WamContext;

/// Built-in factory behind the `default` app type.
#[derive(Debug, Default)]
pub struct DefaultWebAppFactory;

impl WebAppFactory for DefaultWebAppFactory {
    fn create_web_app(
        &self,
        window_type: WindowType,
        desc: Rc<ApplicationDescription>,
        ctx: &Rc<WamContext>,
    ) -> Option<WebApp> {
        let (width, height) = desc
            .resolution_override()
            .unwrap_or_else(|| ctx.device_info().display_size());
        debug!("[{}] creating {window_type:?} window {width}x{height}", desc.id());
        let window =
            ctx.platform()
                .create_window(window_type, width, height, desc.display_affinity());
        Some(WebApp::new(
            window_type,
            desc,
            window,
            (width, height),
            Rc::clone(ctx),
        ))
    }

    fn create_web_page(
        &self,
        _window_type: WindowType,
        url: &str,
        desc: Rc<ApplicationDescription>,
        launch_params: &str,
        ctx: &Rc<WamContext>,
    ) -> Option<WebPage> {
        Some(WebPage::new(url, desc, launch_params, Rc::clone(ctx)))
    }
}
