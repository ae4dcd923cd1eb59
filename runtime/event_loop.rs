/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! One-shot timers on a virtual clock.
//!
//! Nothing here sleeps. The owner of the loop moves the clock forward with
//! [`Timers::advance`] and then drains whatever expired with
//! [`Timers::take_due`], dispatching each task on the control thread.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// Deferred DOM suspension after a page was hidden.
    SuspendDom,
    /// Watchdog for the JS close callback.
    CloseCallbackTimeout,
    /// Retry of the URL that produced the platform error page.
    ReloadFailedUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub id: TimerId,
    pub instance_id: String,
    pub task: TimerTask,
}

#[derive(Default)]
pub struct Timers {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    queue: RefCell<BTreeMap<(Duration, TimerId), ScheduledTask>>,
    deadlines: RefCell<HashMap<TimerId, Duration>>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn start(&self, delay: Duration, instance_id: &str, task: TimerTask) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let deadline = self.now.get() + delay;
        self.queue.borrow_mut().insert(
            (deadline, id),
            ScheduledTask {
                id,
                instance_id: instance_id.to_string(),
                task,
            },
        );
        self.deadlines.borrow_mut().insert(id, deadline);
        id
    }

    /// Cancels a pending timer. Returns false if it already fired or was
    /// never started.
    pub fn stop(&self, id: TimerId) -> bool {
        let Some(deadline) = self.deadlines.borrow_mut().remove(&id) else {
            return false;
        };
        self.queue.borrow_mut().remove(&(deadline, id)).is_some()
    }

    pub fn is_running(&self, id: TimerId) -> bool {
        self.deadlines.borrow().contains_key(&id)
    }

    pub fn pending(&self) -> usize {
        self.deadlines.borrow().len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.borrow().keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Removes and returns every task whose deadline has passed, earliest
    /// first; timers sharing a deadline keep their start order.
    pub fn take_due(&self) -> Vec<ScheduledTask> {
        let now = self.now.get();
        let mut queue = self.queue.borrow_mut();
        let mut deadlines = self.deadlines.borrow_mut();

        let mut due = Vec::new();
        while let Some(entry) = queue.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let task = entry.remove();
            deadlines.remove(&task.id);
            due.push(task);
        }
        due
    }
}
