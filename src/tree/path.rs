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

//! Parsing and validation for the directory path grammar:
//!
//! ```text
//! path := "/" | ("/" name)+ "/"
//! name := [a-z]{1,MAX_NAME}
//! ```

use crate::error::{TreeError, TreeResult};

/// Splits a path into its `name` components. The root path `"/"` yields an
/// empty vector.
pub(crate) fn components<'a>(path: &'a str, max_name_len: usize) -> TreeResult<Vec<&'a str>> {
    if path == "/" {
        return Ok(Vec::new());
    }
    if path.len() < 2 || !path.starts_with('/') || !path.ends_with('/') {
        return Err(TreeError::InvalidArgument);
    }
    let inner = &path[1..path.len() - 1];
    let mut out = Vec::new();
    for part in inner.split('/') {
        if part.is_empty()
            || part.len() > max_name_len
            || !part.bytes().all(|b| b.is_ascii_lowercase())
        {
            return Err(TreeError::InvalidArgument);
        }
        out.push(part);
    }
    Ok(out)
}

/// Splits `comps` into `(parent components, leaf name)`, or `None` for the
/// root (which has no parent or leaf).
pub(crate) fn split_leaf<'a>(comps: &'a [&'a str]) -> Option<(&'a [&'a str], &'a str)> {
    if comps.is_empty() {
        None
    } else {
        let n = comps.len();
        Some((&comps[..n - 1], comps[n - 1]))
    }
}

/// Length of the shared prefix of two component lists, i.e. the depth of
/// their lowest common ancestor.
pub(crate) fn common_prefix_len(a: &[&str], b: &[&str]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// True when `target` names `source` itself or something inside it. Since
/// every non-root path ends in `/`, a plain `starts_with` is already an
/// exact component-boundary check.
pub(crate) fn is_ancestor_or_self(source: &str, target: &str) -> bool {
    target == source || target.starts_with(source)
}
