/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;

use bpaf::Bpaf;
use tracing::{error, info, warn};

use crate::host::config::WebAppManagerConfig;
use crate::host::web_app_manager::WebAppManager;
use crate::platform::headless::{HeadlessPlatform, HeadlessServiceSender, StaticDeviceInfo};
use crate::registries::plugin_loader::registered_plugins;
use crate::shell::command;

const DEFAULT_DISPLAY_SIZE: (u32, u32) = (1920, 1080);

/// Headless web application manager driven by JSON commands on stdin.
///
/// Timers run on a virtual clock that only moves on an `advanceClock`
/// command, e.g. {"method":"advanceClock","ms":10000}. No timer fires on
/// wall-clock time alone.
#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
pub struct CliOptions {
    /// Configuration file, defaults to the user config directory
    #[bpaf(long, short, argument("PATH"))]
    pub config: Option<PathBuf>,
    /// Tracing filter such as `debug` or `webappmanager=trace`
    #[bpaf(long("log-filter"), argument("FILTER"))]
    pub log_filter: Option<String>,
    /// Initial system language
    #[bpaf(long, argument("TAG"), fallback("en-US".to_string()))]
    pub language: String,
    /// Start with accessibility enabled
    #[bpaf(long)]
    pub accessibility: bool,
    /// Directory searched for the developer and debug marker files
    #[bpaf(long("marker-root"), argument("DIR"), fallback(PathBuf::from("/var/luna/preferences")))]
    pub marker_root: PathBuf,
}

pub fn main() {
    let options = cli_options().run();
    crate::init_tracing(options.log_filter.as_deref());

    let path = options.config.clone().or_else(WebAppManagerConfig::default_file);
    let mut config = match WebAppManagerConfig::load(path.as_deref(), |name| std::env::var(name).ok()) {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    config.post_init_configuration(&options.marker_root);

    for plugin in registered_plugins() {
        info!("plugin module {} provides '{}'", plugin.module, plugin.app_type);
    }

    let bus = Rc::new(HeadlessServiceSender::new());
    let mut manager = WebAppManager::new(
        config,
        Rc::new(HeadlessPlatform::new(DEFAULT_DISPLAY_SIZE)),
        Rc::new(StaticDeviceInfo::new(&options.language, DEFAULT_DISPLAY_SIZE)),
        bus.clone(),
    );
    if options.accessibility {
        manager.set_accessibility_enabled(true);
    }
    info!("{} ready", crate::VERSION);

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = run_session(&mut manager, &bus, stdin.lock(), stdout.lock()) {
        error!("session ended: {e}");
        std::process::exit(1);
    }
}

/// Runs commands from `input` until it closes, writing one reply per line.
/// Close requests posted to the bus are answered by killing the app, the
/// way the system shell acknowledges them.
pub fn run_session(
    manager: &mut WebAppManager,
    bus: &HeadlessServiceSender,
    input: impl BufRead,
    mut output: impl Write,
) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = command::execute_line(manager, &line);
        settle(manager, bus);
        writeln!(output, "{reply}")?;
        output.flush()?;
    }
    Ok(())
}

fn settle(manager: &mut WebAppManager, bus: &HeadlessServiceSender) {
    loop {
        manager.spin_event_loop();
        let requests = bus.take_close_requests();
        if requests.is_empty() {
            break;
        }
        for instance_id in requests {
            let Some(app_id) = manager
                .find_app_by_instance_id(&instance_id)
                .map(|app| app.app_id().to_string())
            else {
                warn!("close requested for unknown instance {instance_id}");
                continue;
            };
            manager.on_kill_app(&app_id, &instance_id, false);
        }
    }
}
