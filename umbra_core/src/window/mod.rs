// Copyright 2026 the Umbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window tree data model.
//!
//! A *window* is a node in a stacking tree. Each window has:
//!
//! - An identity ([`WindowId`]), a generational handle that becomes stale when
//!   the window is destroyed, so caches keyed by it can never be confused by
//!   slot reuse.
//! - Topology: parent, first-child, and sibling links forming an ordered
//!   tree. Sibling order is stacking order, bottom-most first.
//! - Properties set by the caller: [`bounds`](WindowStore::set_bounds)
//!   relative to the parent and [`flags`](WindowStore::set_flags)
//!   (hidden, transparent).
//!
//! The occlusion engine only depends on the [`WindowTree`] and
//! [`WindowGeometry`] traits. [`WindowStore`] is the bundled implementation,
//! stored in struct-of-arrays layout with index-based handles.
//!
//! # Dirty tracking
//!
//! Mutations automatically mark the corresponding dirty channel (see
//! [`dirty`](crate::dirty)); [`WindowStore::evaluate`] drains them into
//! [`TreeChanges`].

mod evaluate;
mod id;
mod store;
mod traverse;
mod tree;

pub use evaluate::TreeChanges;
pub use id::{INVALID, WindowId};
pub use store::{WindowFlags, WindowStore};
pub use traverse::{Children, Descendants};
pub use tree::{WindowGeometry, WindowTree};
