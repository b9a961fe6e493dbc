// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec::Vec;

use super::id::{INVALID, WindowId};
use super::store::WindowStore;
use super::tree::WindowTree;

/// An iterator over the direct children of a window, bottom-most first.
///
/// Created by [`WindowStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a WindowStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a WindowStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = WindowId;

    fn next(&mut self) -> Option<WindowId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(WindowId {
            idx,
            generation: self.store.generation[idx as usize],
        })
    }
}

/// An iterator over a window and all of its descendants.
///
/// Uses an explicit stack rather than recursion, so very deep trees cannot
/// overflow the call stack. The order is depth-first but otherwise
/// unspecified; callers must not depend on it.
#[derive(Debug)]
pub struct Descendants<'a, T: WindowTree + ?Sized> {
    tree: &'a T,
    stack: Vec<WindowId>,
}

impl<'a, T: WindowTree + ?Sized> Descendants<'a, T> {
    /// Starts a walk at `root` (included in the output).
    ///
    /// A dead `root` yields nothing.
    pub fn new(tree: &'a T, root: WindowId) -> Self {
        let mut stack = Vec::new();
        if tree.is_alive(root) {
            stack.push(root);
        }
        Self { tree, stack }
    }
}

impl<T: WindowTree + ?Sized> Iterator for Descendants<'_, T> {
    type Item = WindowId;

    fn next(&mut self) -> Option<WindowId> {
        let window = self.stack.pop()?;
        self.stack.extend(self.tree.children(window));
        Some(window)
    }
}
