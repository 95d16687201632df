//! Collision-resolution protocol and batch observation
//!
//! The converter asks a [`CollisionResolver`] exactly once per colliding
//! output path and acts on the returned [`Decision`]. Status and progress
//! reporting go through [`BatchObserver`], whose methods default to no-ops
//! so non-interactive callers can ignore them.

use std::path::{Path, PathBuf};

use crate::paths;

/// What to do about an output path that already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Write over the existing file.
    Overwrite,
    /// Write to this path instead. The path is collision-free at the moment
    /// of resolution; that can change under concurrent writers.
    RenameTo(PathBuf),
    /// Do not write this item at all.
    Skip,
}

/// Synchronous query interface for output-path collisions.
///
/// `source` identifies the item being written: the input image for
/// per-image conversions, the first input image for a combined document.
pub trait CollisionResolver {
    fn resolve(&mut self, source: &Path, candidate: &Path) -> Decision;
}

/// Lifecycle of one batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Processing,
    Succeeded,
    Skipped,
    Failed,
}

/// Fire-and-forget notifications emitted while a batch runs.
///
/// All methods have empty default implementations.
pub trait BatchObserver: Send + Sync {
    /// Called when an item changes state.
    fn item_status(&self, source: &Path, status: ItemStatus) {
        let _ = (source, status);
    }

    /// Called with a human-readable progress message. `current` counts from
    /// 1 to `total`.
    fn progress(&self, message: &str, current: usize, total: usize) {
        let _ = (message, current, total);
    }
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Resolver that diverts every collision to a fresh unique path.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoRename;

impl CollisionResolver for AutoRename {
    fn resolve(&mut self, _source: &Path, candidate: &Path) -> Decision {
        Decision::RenameTo(paths::allocate_unique(candidate))
    }
}

/// Resolver that always overwrites.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysOverwrite;

impl CollisionResolver for AlwaysOverwrite {
    fn resolve(&mut self, _source: &Path, _candidate: &Path) -> Decision {
        Decision::Overwrite
    }
}

/// Resolver that always skips.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysSkip;

impl CollisionResolver for AlwaysSkip {
    fn resolve(&mut self, _source: &Path, _candidate: &Path) -> Decision {
        Decision::Skip
    }
}
