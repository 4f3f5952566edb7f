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

//! The directory tree: path grammar, hand-over-hand traversal, and the four
//! client-facing operations (`list`, `create`, `remove`, `move_node`) built
//! on top of the per-node [`Synchronizer`](crate::sync).
//!
//! Every traversal holds at most two permits at once (the node it's
//! standing on and the child it's stepping into), releasing the parent only
//! after the child is acquired. `remove` and `move_node` additionally pin
//! write permits on the handful of nodes they structurally mutate; see
//! [`Tree::move_node`] for the lowest-common-ancestor pinning discipline
//! that keeps concurrent moves from racing into a cycle.

mod node;
mod path;

use crate::config::TreeConfig;
use crate::error::{TreeError, TreeResult};
use log::{debug, trace, warn};
use node::{Node, ReadGuard, WriteGuard};
use std::collections::HashMap;
use std::sync::Arc;

/// A concurrent, in-memory directory tree rooted at `/`.
///
/// Clone is intentionally not implemented: a `Tree` owns the root node, and
/// sharing it across threads is done by wrapping it in an [`Arc`] (as
/// [`Node`] itself already is internally) at the embedder's call site, the
/// same way the rest of this crate shares nodes.
pub struct Tree {
    root: Arc<Node>,
    config: TreeConfig,
}

impl Tree {
    /// Creates an empty tree with the default configuration.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Creates an empty tree with a caller-supplied configuration.
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            root: Node::root(),
            config,
        }
    }

    fn max_name_len(&self) -> usize {
        self.config.max_name_len
    }

    /// Hand-over-hand read descent from the root through `comps`, in order.
    /// Returns a read permit on the final node reached (the root itself if
    /// `comps` is empty).
    fn acquire_read_chain(&self, comps: &[&str]) -> TreeResult<ReadGuard> {
        let mut guard = ReadGuard::acquire(self.root.clone());
        for comp in comps {
            let child = guard.get_child(comp).ok_or(TreeError::NotFound)?;
            trace!("descend: entering {comp}");
            guard = ReadGuard::acquire(child);
        }
        Ok(guard)
    }

    /// Like [`Self::acquire_read_chain`], but descends starting from an
    /// already-held node's children map instead of re-reading the root.
    /// Used by `move_node` to continue past the pinned LCA. `remaining`
    /// must be nonempty; the LCA-is-the-parent case is handled by the
    /// caller without calling this at all.
    fn descend_reads(
        start_children: &HashMap<String, Arc<Node>>,
        remaining: &[&str],
    ) -> TreeResult<ReadGuard> {
        debug_assert!(!remaining.is_empty());
        let first = start_children
            .get(remaining[0])
            .cloned()
            .ok_or(TreeError::NotFound)?;
        let mut guard = ReadGuard::acquire(first);
        for comp in &remaining[1..] {
            let child = guard.get_child(comp).ok_or(TreeError::NotFound)?;
            guard = ReadGuard::acquire(child);
        }
        Ok(guard)
    }

    /// Hand-over-hand descent to `comps`, ending with a write permit on the
    /// final node (root included).
    fn acquire_write_chain(&self, comps: &[&str]) -> TreeResult<WriteGuard> {
        Ok(self.acquire_read_chain(comps)?.upgrade())
    }

    /// Lists the names of the children of the directory at `path`,
    /// concatenated with `,` and in unspecified order; `""` if the
    /// directory has no children.
    pub fn list(&self, path: &str) -> TreeResult<String> {
        trace!("list({path})");
        let comps = path::components(path, self.max_name_len())?;
        let guard = self.acquire_read_chain(&comps)?;
        Ok(guard.child_names().join(","))
    }

    /// Creates a new, empty directory at `path`.
    pub fn create(&self, path: &str) -> TreeResult<()> {
        trace!("create({path})");
        let comps = path::components(path, self.max_name_len())?;
        let (parent_comps, name) = path::split_leaf(&comps).ok_or(TreeError::AlreadyExists)?;
        let mut parent = self.acquire_write_chain(parent_comps)?;
        if parent.children().contains_key(name) {
            warn!("create({path}): already exists");
            return Err(TreeError::AlreadyExists);
        }
        parent.children_mut().insert(name.to_string(), Node::new());
        debug!("create({path}): inserted");
        Ok(())
    }

    /// Removes the (empty) directory at `path`.
    pub fn remove(&self, path: &str) -> TreeResult<()> {
        trace!("remove({path})");
        let comps = path::components(path, self.max_name_len())?;
        let (parent_comps, name) = path::split_leaf(&comps).ok_or(TreeError::Busy)?;
        let mut parent = self.acquire_write_chain(parent_comps)?;
        let victim = match parent.children().get(name).cloned() {
            Some(v) => v,
            None => {
                warn!("remove({path}): not found");
                return Err(TreeError::NotFound);
            }
        };

        victim.quiesce_for_removal();
        // SAFETY: quiescence just completed and we still hold `parent`'s
        // write permit, so nothing else can be touching `victim`.
        if unsafe { victim.is_empty_after_quiescence() } {
            parent.children_mut().remove(name);
            debug!("remove({path}): removed");
            Ok(())
        } else {
            victim.cancel_removal();
            warn!("remove({path}): not empty");
            Err(TreeError::NotEmpty)
        }
    }

    /// Moves the subtree at `source` (including all its descendants) to
    /// `target`, renaming its root to `target`'s final component.
    ///
    /// Pins the lowest common ancestor `L` of `source`'s and `target`'s
    /// parent directories under a write permit before descending further,
    /// which is what keeps two concurrent moves that share an LCA from
    /// racing into a cycle or a duplicate name; moves whose LCAs differ
    /// proceed fully in parallel.
    pub fn move_node(&self, source: &str, target: &str) -> TreeResult<()> {
        trace!("move_node({source}, {target})");
        let comps_source = path::components(source, self.max_name_len())?;
        let comps_target = path::components(target, self.max_name_len())?;
        if comps_source.is_empty() {
            warn!("move_node({source}, {target}): source is root");
            return Err(TreeError::Busy);
        }
        if comps_target.is_empty() {
            warn!("move_node({source}, {target}): target is root");
            return Err(TreeError::AlreadyExists);
        }
        if path::is_ancestor_or_self(source, target) {
            warn!("move_node({source}, {target}): target is source or a descendant");
            return Err(TreeError::IllegalMove);
        }

        let (parent_source_comps, source_name) = path::split_leaf(&comps_source).unwrap();
        let (parent_target_comps, target_name) = path::split_leaf(&comps_target).unwrap();
        let lca_len = path::common_prefix_len(parent_source_comps, parent_target_comps);

        let mut l_write = self.acquire_write_chain(&parent_source_comps[..lca_len])?;

        let target_is_l = parent_target_comps.len() == lca_len;
        let source_is_l = parent_source_comps.len() == lca_len;

        let mut target_write: Option<WriteGuard> = if target_is_l {
            None
        } else {
            let read = Self::descend_reads(l_write.children(), &parent_target_comps[lca_len..])?;
            Some(read.upgrade())
        };

        let mut source_write: Option<WriteGuard> = if source_is_l {
            None
        } else {
            let read = Self::descend_reads(l_write.children(), &parent_source_comps[lca_len..])?;
            Some(read.upgrade())
        };

        // Both descents complete, as §4.2 step 7 specifies, before either
        // existence check runs. A path missing along `parent_source` is
        // therefore reported as `NotFound` here even when `target_name`
        // also already exists under `parent_target` — descend-both-then-
        // check, per the spec's ordering, rather than descend-target-
        // check-then-descend-source.
        if Self::parent_ref(&target_write, &l_write)
            .children()
            .contains_key(target_name)
        {
            warn!("move_node({source}, {target}): target already exists");
            return Err(TreeError::AlreadyExists);
        }
        if !Self::parent_ref(&source_write, &l_write)
            .children()
            .contains_key(source_name)
        {
            warn!("move_node({source}, {target}): source not found");
            return Err(TreeError::NotFound);
        }

        let victim = {
            let source_parent = Self::parent_ref_mut(&mut source_write, &mut l_write);
            source_parent
                .children_mut()
                .remove(source_name)
                .expect("presence just verified under the same write permit")
        };

        // Brief write-acquire on the subtree root: the node carries no name
        // of its own to rename (its name is the key under which its new
        // parent is about to hold it), so this step exists purely to
        // serialize with any quiesce_for_removal that might already be in
        // flight on it; both parents are pinned so no reader can reach it
        // meanwhile.
        drop(WriteGuard::acquire(victim.clone()));

        {
            let target_parent = Self::parent_ref_mut(&mut target_write, &mut l_write);
            target_parent
                .children_mut()
                .insert(target_name.to_string(), victim);
        }

        debug!("move_node({source}, {target}): moved");

        // Release order: parent_source, parent_target (if distinct), L.
        drop(source_write);
        drop(target_write);
        drop(l_write);
        Ok(())
    }

    fn parent_ref<'a>(owned: &'a Option<WriteGuard>, l: &'a WriteGuard) -> &'a WriteGuard {
        match owned {
            Some(g) => g,
            None => l,
        }
    }

    fn parent_ref_mut<'a>(
        owned: &'a mut Option<WriteGuard>,
        l: &'a mut WriteGuard,
    ) -> &'a mut WriteGuard {
        match owned {
            Some(g) => g,
            None => l,
        }
    }

    /// Recursively walks the whole tree under read permits and returns
    /// every live directory's canonical path. Not one of the four
    /// client-facing operations: it exists purely as a test oracle for
    /// comparing the concurrent tree against a single-threaded reference
    /// model, so it takes no write permits and is not linearizable against
    /// concurrent structural mutation the way `list` is for a single node.
    #[cfg(test)]
    pub(crate) fn snapshot_paths(&self) -> Vec<String> {
        fn walk(guard: &ReadGuard, prefix: &str, out: &mut Vec<String>) {
            let mut names = guard.child_names();
            names.sort();
            for name in names {
                let child = guard.get_child(&name).unwrap();
                let child_guard = ReadGuard::acquire(child);
                let path = format!("{prefix}{name}/");
                out.push(path.clone());
                walk(&child_guard, &path, out);
            }
        }
        let root_guard = ReadGuard::acquire(self.root.clone());
        let mut out = Vec::new();
        walk(&root_guard, "/", &mut out);
        out
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreeError;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn scenario_create_list_nested() {
        let tree = Tree::new();
        assert_eq!(tree.create("/a/"), Ok(()));
        assert_eq!(tree.create("/a/b/"), Ok(()));
        assert_eq!(tree.list("/a/").unwrap(), "b");
        assert_eq!(tree.list("/").unwrap(), "a");
    }

    #[test]
    fn scenario_create_exists_remove_not_found() {
        let tree = Tree::new();
        assert_eq!(tree.create("/x/"), Ok(()));
        assert_eq!(tree.create("/x/"), Err(TreeError::AlreadyExists));
        assert_eq!(tree.remove("/x/"), Ok(()));
        assert_eq!(tree.remove("/x/"), Err(TreeError::NotFound));
    }

    #[test]
    fn scenario_remove_not_empty_then_empty() {
        let tree = Tree::new();
        tree.create("/a/").unwrap();
        tree.create("/a/b/").unwrap();
        assert_eq!(tree.remove("/a/"), Err(TreeError::NotEmpty));
        assert_eq!(tree.remove("/a/b/"), Ok(()));
        assert_eq!(tree.remove("/a/"), Ok(()));
    }

    #[test]
    fn scenario_move_across_directories() {
        let tree = Tree::new();
        tree.create("/a/").unwrap();
        tree.create("/b/").unwrap();
        tree.create("/a/x/").unwrap();
        assert_eq!(tree.move_node("/a/x/", "/b/y/"), Ok(()));
        assert_eq!(tree.list("/a/").unwrap(), "");
        assert_eq!(tree.list("/b/").unwrap(), "y");
    }

    #[test]
    fn scenario_move_into_own_descendant_is_illegal() {
        let tree = Tree::new();
        tree.create("/a/").unwrap();
        tree.create("/a/b/").unwrap();
        assert_eq!(tree.move_node("/a/", "/a/b/c/"), Err(TreeError::IllegalMove));
    }

    #[test]
    fn boundary_remove_root_is_busy() {
        let tree = Tree::new();
        assert_eq!(tree.remove("/"), Err(TreeError::Busy));
    }

    #[test]
    fn boundary_create_root_already_exists() {
        let tree = Tree::new();
        assert_eq!(tree.create("/"), Err(TreeError::AlreadyExists));
    }

    #[test]
    fn boundary_move_root_source_is_busy() {
        let tree = Tree::new();
        tree.create("/a/").unwrap();
        assert_eq!(tree.move_node("/", "/a/b/"), Err(TreeError::Busy));
    }

    #[test]
    fn boundary_move_root_target_already_exists() {
        let tree = Tree::new();
        tree.create("/a/").unwrap();
        assert_eq!(tree.move_node("/a/", "/"), Err(TreeError::AlreadyExists));
    }

    #[test]
    fn boundary_move_target_equals_source_is_illegal() {
        let tree = Tree::new();
        tree.create("/a/").unwrap();
        assert_eq!(tree.move_node("/a/", "/a/"), Err(TreeError::IllegalMove));
    }

    #[test]
    fn invalid_paths_are_rejected_before_any_mutation() {
        let tree = Tree::new();
        assert_eq!(tree.create("a/"), Err(TreeError::InvalidArgument));
        assert_eq!(tree.create("/A/"), Err(TreeError::InvalidArgument));
        assert_eq!(tree.list("/"), Ok(String::new()));
    }

    #[test]
    fn rename_in_place_under_same_parent() {
        let tree = Tree::new();
        tree.create("/a/").unwrap();
        assert_eq!(tree.move_node("/a/", "/b/"), Ok(()));
        assert_eq!(tree.list("/").unwrap(), "b");
    }

    #[test]
    fn create_then_remove_round_trips() {
        let tree = Tree::new();
        let before = tree.snapshot_paths();
        tree.create("/tmp/").unwrap();
        tree.remove("/tmp/").unwrap();
        assert_eq!(tree.snapshot_paths(), before);
    }

    #[test]
    fn move_then_move_back_round_trips() {
        let tree = Tree::new();
        tree.create("/a/").unwrap();
        tree.create("/b/").unwrap();
        tree.create("/a/x/").unwrap();
        let before = tree.snapshot_paths();
        tree.move_node("/a/x/", "/b/x/").unwrap();
        tree.move_node("/b/x/", "/a/x/").unwrap();
        assert_eq!(tree.snapshot_paths(), before);
    }

    #[test]
    fn concurrent_creates_under_disjoint_parents_all_succeed() {
        let tree = Arc::new(Tree::new());
        tree.create("/a/").unwrap();
        tree.create("/b/").unwrap();
        let t1 = {
            let tree = tree.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    tree.create(&format!("/a/n{i}/")).unwrap();
                }
            })
        };
        let t2 = {
            let tree = tree.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    tree.create(&format!("/b/n{i}/")).unwrap();
                }
            })
        };
        t1.join().unwrap();
        t2.join().unwrap();
        assert_eq!(tree.list("/a/").unwrap().split(',').count(), 50);
        assert_eq!(tree.list("/b/").unwrap().split(',').count(), 50);
    }

    #[test]
    fn stress_random_operations_match_single_threaded_reference() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        use std::collections::BTreeSet;
        use std::sync::Mutex;

        const THREADS: usize = 16;
        const OPS_PER_THREAD: usize = 400;

        let tree = Arc::new(Tree::new());
        // Prepopulate with a shallow forest so moves and removes have
        // something to work with from the start.
        for i in 0..8 {
            tree.create(&format!("/d{i}/")).unwrap();
        }

        let reference: Arc<Mutex<BTreeSet<String>>> = Arc::new(Mutex::new(
            (0..8).map(|i| format!("/d{i}/")).collect(),
        ));

        // The reference model can only be checked against a known
        // linearization of the random ops; each thread takes the
        // reference's own lock around both the tree call and the
        // bookkeeping so the two stay in lockstep. The tree's own
        // per-node synchronizer is still exercised by every thread
        // (concurrent_creates_under_disjoint_parents_all_succeed above
        // already covers true unserialized concurrency).
        let handles: Vec<_> = (0..THREADS)
            .map(|seed| {
                let tree = tree.clone();
                let reference = reference.clone();
                thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(seed as u64 + 1);
                    for _ in 0..OPS_PER_THREAD {
                        let dir = rng.gen_range(0..8);
                        let leaf: u32 = rng.gen_range(0..20);
                        let path = format!("/d{dir}/n{leaf}/");
                        let mut r = reference.lock().unwrap();
                        match rng.gen_range(0..3) {
                            0 => {
                                if tree.create(&path).is_ok() {
                                    r.insert(path);
                                }
                            }
                            1 => {
                                if tree.remove(&path).is_ok() {
                                    r.remove(&path);
                                }
                            }
                            _ => {
                                let other_dir = rng.gen_range(0..8);
                                let target = format!("/d{other_dir}/n{leaf}/");
                                if target != path && tree.move_node(&path, &target).is_ok() {
                                    r.remove(&path);
                                    r.insert(target);
                                }
                            }
                        }
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        let live: BTreeSet<String> = tree.snapshot_paths().into_iter().collect();
        let expected = reference.lock().unwrap().clone();
        assert_eq!(live, expected);
    }
}
