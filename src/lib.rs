/*
 * Created on Tue Jul 28 2026
 *
 * This file is a part of dtree
 * dtree is a concurrent, in-memory hierarchical directory tree, built
 * around a per-node reader/writer synchronizer that lets many threads
 * traverse the tree while `remove` and `move` take coordinated write
 * access to the nodes they touch.
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

//! # dtree
//!
//! A thread-safe, in-memory directory tree. Any number of threads may
//! concurrently [`list`](Tree::list) a directory, [`create`](Tree::create)
//! or [`remove`](Tree::remove) an empty one, or [`move_node`](Tree::move_node)
//! a whole subtree elsewhere, all against one shared [`Tree`] rooted at `/`.
//!
//! There is no on-disk representation and no network surface; this crate is
//! a pure concurrency exercise over an in-memory tree. Internally, a
//! per-node reader/writer synchronizer makes concurrent traversal safe, and
//! a hand-over-hand locking discipline built on top of it implements the
//! four operations without ever taking a tree-wide lock.
//!
//! ```
//! use dtree::Tree;
//!
//! let tree = Tree::new();
//! tree.create("/a/").unwrap();
//! tree.create("/a/b/").unwrap();
//! assert_eq!(tree.list("/a/").unwrap(), "b");
//! assert_eq!(tree.list("/").unwrap(), "a");
//! ```

pub mod config;
pub mod error;
mod sync;
mod tree;
mod util;

pub use config::TreeConfig;
pub use error::{TreeError, TreeResult};
pub use tree::Tree;
