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

//! The stable error taxonomy returned by every tree operation.

use std::fmt;

pub type TreeResult<T> = Result<T, TreeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TreeError {
    /// A path argument does not match the directory grammar, or a name
    /// exceeds the configured length bound.
    InvalidArgument,
    /// Some component along the path does not exist.
    NotFound,
    /// The final path component already names an existing entry.
    AlreadyExists,
    /// A directory being removed still has children.
    NotEmpty,
    /// The root was named where an operation requires a non-root target
    /// (root cannot be removed or moved).
    Busy,
    /// A move would place a directory inside itself or one of its own
    /// descendants.
    IllegalMove,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InvalidArgument => "invalid-argument: path does not match the directory grammar",
            Self::NotFound => "not-found: a path component does not exist",
            Self::AlreadyExists => "already-exists: the target path is already present",
            Self::NotEmpty => "not-empty: directory has children",
            Self::Busy => "busy: the root cannot be removed or moved",
            Self::IllegalMove => "illegal-move: cannot move a directory into itself or a descendant",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for TreeError {}
