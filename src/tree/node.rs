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

//! A single directory node and the RAII permits that guard it.

use crate::sync::Synchronizer;
use std::cell::UnsafeCell;
use std::collections::HashMap;
use std::sync::Arc;

/// One directory. A node has no name of its own: its name is the key under
/// which its parent's `children` map holds it (the root has no parent and
/// so no name at all). `children` is only ever touched through a
/// [`ReadGuard`] or [`WriteGuard`], which is what makes the `UnsafeCell`
/// sound: the synchronizer guarantees the usual shared-xor-exclusive access
/// pattern around every access.
pub(crate) struct Node {
    sync: Synchronizer,
    children: UnsafeCell<HashMap<String, Arc<Node>>>,
}

// SAFETY: all interior mutation is gated by `sync`, which enforces
// shared-xor-exclusive access before any `UnsafeCell` is dereferenced.
unsafe impl Send for Node {}
unsafe impl Sync for Node {}

impl Node {
    pub(crate) fn new() -> Arc<Node> {
        Arc::new(Node {
            sync: Synchronizer::new(),
            children: UnsafeCell::new(HashMap::new()),
        })
    }

    pub(crate) fn root() -> Arc<Node> {
        Node::new()
    }

    pub(crate) fn quiesce_for_removal(&self) {
        self.sync.quiesce_for_removal();
    }

    pub(crate) fn cancel_removal(&self) {
        self.sync.cancel_removal();
    }

    /// # Safety
    /// The caller must have just returned from [`quiesce_for_removal`] on
    /// this node, and must still hold the write permit of its parent, so
    /// that no other thread can be in the process of touching it.
    pub(crate) unsafe fn is_empty_after_quiescence(&self) -> bool {
        (*self.children.get()).is_empty()
    }
}

/// A held read permit on a node, owning the `Arc` so the node cannot be
/// dropped while the permit is live.
pub(crate) struct ReadGuard {
    node: Arc<Node>,
}

impl ReadGuard {
    pub(crate) fn acquire(node: Arc<Node>) -> Self {
        node.sync.acquire_read();
        Self { node }
    }

    pub(crate) fn children(&self) -> &HashMap<String, Arc<Node>> {
        // SAFETY: holding a read permit.
        unsafe { &*self.node.children.get() }
    }

    pub(crate) fn get_child(&self, name: &str) -> Option<Arc<Node>> {
        self.children().get(name).cloned()
    }

    pub(crate) fn child_names(&self) -> Vec<String> {
        self.children().keys().cloned().collect()
    }

    /// Trades this read permit for a write permit on the same node. The
    /// synchronizer guarantees this happens without a release/reacquire
    /// race, so `self` is consumed rather than dropped normally.
    pub(crate) fn upgrade(self) -> WriteGuard {
        self.node.sync.upgrade_to_write();
        let node = self.node.clone();
        // The read permit has already been folded into the write permit;
        // skip `Drop`, which would otherwise release a permit we no
        // longer hold.
        std::mem::forget(self);
        WriteGuard { node }
    }
}

impl Drop for ReadGuard {
    fn drop(&mut self) {
        self.node.sync.release_read();
    }
}

/// A held write permit on a node.
pub(crate) struct WriteGuard {
    node: Arc<Node>,
}

impl WriteGuard {
    pub(crate) fn acquire(node: Arc<Node>) -> Self {
        node.sync.acquire_write();
        Self { node }
    }

    pub(crate) fn children(&self) -> &HashMap<String, Arc<Node>> {
        // SAFETY: holding a write permit.
        unsafe { &*self.node.children.get() }
    }

    pub(crate) fn children_mut(&mut self) -> &mut HashMap<String, Arc<Node>> {
        // SAFETY: holding a write permit.
        unsafe { &mut *self.node.children.get() }
    }
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        self.node.sync.release_write();
    }
}
