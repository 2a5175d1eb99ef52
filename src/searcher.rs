//! The interface shared by the CPU and GPU search backends.

use crate::error::Result;
use crate::mask::Mask;
use crate::result::SearchResult;

/// A handle that can run slime-chunk cluster searches and release its
/// resources (worker threads, GPU buffers) when done.
///
/// Implementations are expected to serialize concurrent calls to
/// `search` themselves rather than leave that to callers — see
/// `CpuSearcher` and `GpuSearcher` for how each backend does it.
pub trait Searcher {
    /// Scans every integer `(x, z)` with `x0 <= x < x1` and `z0 <= z <
    /// z1` as a candidate mask center against `world_seed`, returning
    /// every center whose mask-overlap count is `>= threshold`, sorted
    /// by [`SearchResult`]'s total order.
    ///
    /// `threshold` is signed because a negative value is a reserved,
    /// not-yet-implemented request (see `SearchError::InvalidRegion`);
    /// non-negative thresholds behave as documented above.
    fn search(
        &self,
        x0: i32,
        z0: i32,
        x1: i32,
        z1: i32,
        threshold: i64,
        world_seed: i64,
        mask: &dyn Mask,
    ) -> Result<Vec<SearchResult>>;

    /// Releases backend resources. Any `search` call after this
    /// returns `Err(SearchError::Destroyed)`.
    fn destroy(&self);
}
