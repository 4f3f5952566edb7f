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

//! Tree-wide configuration.
//!
//! There is no on-disk state and nothing here is read from the environment
//! or a config file; the struct exists so embedders have one place to set
//! the few knobs the tree exposes, and so tests can exercise boundary
//! values for `max_name_len` without a global constant.

use serde::{Deserialize, Serialize};

/// Suggested bound on a single path component's length from the directory
/// grammar.
pub const DEFAULT_MAX_NAME_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum number of bytes in a single path component (a `name` in the
    /// grammar). Components longer than this are rejected as
    /// [`InvalidArgument`](crate::error::TreeError::InvalidArgument).
    pub max_name_len: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }
}
