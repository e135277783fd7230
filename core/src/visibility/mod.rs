//! Hidden-flag reconciliation over the conversation log.
//!
//! A message at `index < visible_start(len, keep_count)` must be hidden from
//! context and every later one must be visible. [`full_reconcile`] enforces
//! that over the whole log; [`incremental_reconcile`] only walks the slice
//! that slid out of the window since the last recorded log length.

mod reconcile;

pub use reconcile::FallbackReason;
pub use reconcile::IncrementalOutcome;
pub use reconcile::VisibilityDelta;
pub use reconcile::full_reconcile;
pub use reconcile::incremental_reconcile;
pub use reconcile::visible_start;
