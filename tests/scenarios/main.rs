/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

mod common;
mod lifecycle;
mod manifest;
mod pages;
mod plugins;

use webappmanager::VERSION;

#[test]
fn scenarios_binary_smoke_runs() {
    assert!(VERSION.starts_with("webappmanager "));
}
