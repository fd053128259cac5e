//! Planning module for reconciliation.
//!
//! This module decides what must be created on the remote side: structural
//! set differences between desired and existing entities, and the pagination
//! enumerator used to materialize remote collections.

mod diff;
mod pages;

pub use diff::{SystemNamed, metrics_mapping, missing};
pub use pages::{MAX_PER_PAGE, collect_pages};
