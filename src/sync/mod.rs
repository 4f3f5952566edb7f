/*
 * Created on Tue Jul 28 2026
 *
 * This file is a part of dtree
 *
 * Copyright (c) 2026, dtree contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! The per-node reader/writer synchronizer.
//!
//! Every [`Node`](crate::tree::node::Node) owns one [`Synchronizer`]. It
//! grants three kinds of access:
//!
//! - any number of concurrent readers, or
//! - exactly one writer, exclusive of readers and other writers,
//!
//! and additionally supports upgrading a held read permit straight to a
//! write permit without ever dropping to zero holders in between, plus a
//! quiescence protocol used right before a node is unlinked and dropped.
//!
//! Naive "readers first" scheduling starves writers forever under a steady
//! stream of readers; naive "writers first" scheduling starves readers
//! under a steady stream of writers. This implementation breaks both
//! starvation modes with a batch hand-off: once a writer releases, every
//! reader that was already queued at that instant is let in as one batch,
//! after which priority returns to any writer that is waiting.

use crate::util::compiler::{likely, unlikely};
use log::trace;
use parking_lot::{Condvar, Mutex};

struct State {
    readers_active: u32,
    writer_active: bool,
    readers_waiting: u32,
    writers_waiting: u32,
    batch_to_admit: u32,
    handoff_to_writer: bool,
    removal_pending: bool,
}

impl State {
    const fn new() -> Self {
        Self {
            readers_active: 0,
            writer_active: false,
            readers_waiting: 0,
            writers_waiting: 0,
            batch_to_admit: 0,
            handoff_to_writer: false,
            removal_pending: false,
        }
    }
}

pub(crate) struct Synchronizer {
    state: Mutex<State>,
    readers: Condvar,
    writers: Condvar,
    removers: Condvar,
}

impl Synchronizer {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::new()),
            readers: Condvar::new(),
            writers: Condvar::new(),
            removers: Condvar::new(),
        }
    }

    /// Blocks until a read permit is granted.
    pub(crate) fn acquire_read(&self) {
        let mut st = self.state.lock();
        loop {
            if unlikely(st.batch_to_admit > 0) {
                // Already authorized as part of a writer's hand-off batch:
                // proceed even if new writers have since queued up.
                st.batch_to_admit -= 1;
                break;
            }
            if likely(!st.writer_active && !st.handoff_to_writer && st.writers_waiting == 0) {
                break;
            }
            st.readers_waiting += 1;
            trace!("acquire_read: blocking, readers_waiting={}", st.readers_waiting);
            self.readers.wait(&mut st);
            st.readers_waiting -= 1;
        }
        st.readers_active += 1;
    }

    pub(crate) fn release_read(&self) {
        let mut st = self.state.lock();
        st.readers_active -= 1;
        if st.readers_active != 0 || st.batch_to_admit != 0 {
            return;
        }
        if st.writers_waiting > 0 {
            trace!("release_read: last reader out, handing off to a writer");
            st.handoff_to_writer = true;
            self.writers.notify_all();
        } else if unlikely(st.removal_pending) {
            self.removers.notify_all();
        }
    }

    /// Blocks until a write permit is granted.
    pub(crate) fn acquire_write(&self) {
        let mut st = self.state.lock();
        st.writers_waiting += 1;
        while !st.handoff_to_writer
            && (st.readers_active > 0 || st.writer_active || st.batch_to_admit > 0)
        {
            trace!("acquire_write: blocking, writers_waiting={}", st.writers_waiting);
            self.writers.wait(&mut st);
        }
        st.writers_waiting -= 1;
        st.handoff_to_writer = false;
        st.writer_active = true;
    }

    pub(crate) fn release_write(&self) {
        let mut st = self.state.lock();
        st.writer_active = false;
        if st.readers_waiting > 0 {
            trace!("release_write: admitting a batch of {} readers", st.readers_waiting);
            st.batch_to_admit = st.readers_waiting;
            self.readers.notify_all();
        } else if st.writers_waiting > 0 {
            st.handoff_to_writer = true;
            self.writers.notify_all();
        } else if unlikely(st.removal_pending) {
            self.removers.notify_all();
        }
    }

    /// Atomically trades a held read permit for a write permit: the caller
    /// never observes a window in which it holds neither. Equivalent to
    /// `release_read` immediately followed by `acquire_write`, except the
    /// mutex is never unlocked in between, so no other writer can slip in.
    pub(crate) fn upgrade_to_write(&self) {
        let mut st = self.state.lock();
        st.readers_active -= 1;
        st.writers_waiting += 1;
        while !st.handoff_to_writer
            && (st.readers_active > 0 || st.writer_active || st.batch_to_admit > 0)
        {
            self.writers.wait(&mut st);
        }
        st.writers_waiting -= 1;
        st.handoff_to_writer = false;
        st.writer_active = true;
    }

    /// Marks the node for removal and blocks until every permit already
    /// granted on it has drained. The caller is assumed to hold the write
    /// permit of the node's *parent*, so no thread can start a fresh
    /// traversal into this node while we wait; we only need to wait out
    /// holders that got here before the parent was pinned.
    pub(crate) fn quiesce_for_removal(&self) {
        let mut st = self.state.lock();
        st.removal_pending = true;
        while st.readers_active > 0 || st.writer_active {
            trace!(
                "quiesce_for_removal: draining readers_active={} writer_active={}",
                st.readers_active,
                st.writer_active
            );
            self.removers.wait(&mut st);
        }
    }

    /// Reverses `quiesce_for_removal` when the removal turns out not to be
    /// possible (for example, the directory was found non-empty).
    pub(crate) fn cancel_removal(&self) {
        self.state.lock().removal_pending = false;
    }
}
