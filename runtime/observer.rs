/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Channel-backed observer list with scoped subscriptions.
//!
//! Each subscriber owns the receiving end of its own FIFO channel, so events
//! from one source always arrive in emission order. Dropping the
//! [`Subscription`] guard removes the subscriber; doing so while a
//! notification is in flight is fine because delivery walks a snapshot.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crossbeam_channel::{Receiver, Sender, unbounded};

struct Observers<E> {
    next_id: u64,
    senders: Vec<(u64, Sender<E>)>,
}

pub struct ObserverList<E> {
    inner: Rc<RefCell<Observers<E>>>,
}

impl<E> Default for ObserverList<E> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Observers {
                next_id: 0,
                senders: Vec::new(),
            })),
        }
    }
}

impl<E: Clone> ObserverList<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> (Subscription<E>, Receiver<E>) {
        let (tx, rx) = unbounded();
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.senders.push((id, tx));
        (
            Subscription {
                id,
                list: Rc::downgrade(&self.inner),
            },
            rx,
        )
    }

    pub fn notify(&self, event: E) {
        let snapshot: Vec<(u64, Sender<E>)> = self.inner.borrow().senders.clone();
        let mut dead = Vec::new();
        for (id, sender) in snapshot {
            if sender.send(event.clone()).is_err() {
                dead.push(id);
            }
        }
        if !dead.is_empty() {
            self.inner
                .borrow_mut()
                .senders
                .retain(|(id, _)| !dead.contains(id));
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps a subscriber registered for as long as it is alive.
pub struct Subscription<E> {
    id: u64,
    list: Weak<RefCell<Observers<E>>>,
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        if let Some(list) = self.list.upgrade() {
            list.borrow_mut().senders.retain(|(id, _)| *id != self.id);
        }
    }
}
