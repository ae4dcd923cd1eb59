/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

pub mod context;
pub mod event_loop;
pub mod observer;

pub use context::{ManagerRequest, WamContext};
pub use event_loop::{ScheduledTask, TimerId, TimerTask, Timers};
pub use observer::{ObserverList, Subscription};
