//! The CPU search backend: a dispatcher thread tiles the requested
//! region into contiguous, non-overlapping [`Section`]s, a pool of
//! worker threads computes and scans each section, and a merger
//! thread folds the per-section batches into one sorted result list.
//!
//! The dispatcher -> bounded channel -> workers -> bounded channel ->
//! merger pipeline is a producer feeding a `crossbeam_channel::bounded`
//! queue that a fixed pool of threads drains, with backpressure doing
//! the job a semaphore would do elsewhere.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::thread;

use crossbeam::channel;

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::mask::Mask;
use crate::result::{dedup_adjacent, merge_sorted, SearchResult};
use crate::searcher::Searcher;

pub mod section;

use section::{Section, SIZE};

/// A CPU-backed [`Searcher`]. Cheap to construct; the worker pool is
/// spun up fresh for each `search` call and torn down when it
/// completes, so an idle `CpuSearcher` holds no threads.
pub struct CpuSearcher {
    config: SearchConfig,
    running: AtomicBool,
    destroyed: AtomicBool,
}

impl CpuSearcher {
    pub fn new(config: SearchConfig) -> Self {
        CpuSearcher {
            config,
            running: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        }
    }

    fn worker_count(&self) -> usize {
        self.config.worker_count.unwrap_or_else(|| thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
    }
}

/// Generates section origins along one axis covering `[lo, hi)`, with
/// stride `SIZE - footprint` so consecutive sections' exclusive local
/// scan ranges (`0..SIZE-footprint` each, see `Section::scan`) tile
/// `[lo, hi)` contiguously with no gap between them, matching
/// `original_source`'s `shiftX := SectionSize - mx`.
fn section_origins(lo: i32, hi: i32, footprint: u32) -> Vec<i32> {
    let stride = (SIZE - footprint) as i32;
    let mut origins = Vec::new();
    let mut start = lo;
    while start < hi {
        origins.push(start);
        start += stride;
    }
    origins
}

impl Searcher for CpuSearcher {
    fn search(
        &self,
        x0: i32,
        z0: i32,
        x1: i32,
        z1: i32,
        threshold: i64,
        world_seed: i64,
        mask: &dyn Mask,
    ) -> Result<Vec<SearchResult>> {
        if self.destroyed.load(AtomicOrdering::Acquire) {
            return Err(SearchError::Destroyed);
        }
        if self
            .running
            .compare_exchange(false, true, AtomicOrdering::AcqRel, AtomicOrdering::Acquire)
            .is_err()
        {
            return Err(SearchError::SearchInProgress);
        }

        let result = self.search_inner(x0, z0, x1, z1, threshold, world_seed, mask);

        self.running.store(false, AtomicOrdering::Release);
        result
    }

    fn destroy(&self) {
        self.destroyed.store(true, AtomicOrdering::Release);
    }
}

impl CpuSearcher {
    fn search_inner(
        &self,
        x0: i32,
        z0: i32,
        x1: i32,
        z1: i32,
        threshold: i64,
        world_seed: i64,
        mask: &dyn Mask,
    ) -> Result<Vec<SearchResult>> {
        let (mask_w, mask_h) = mask.bounds();
        if mask_w >= SIZE || mask_h >= SIZE {
            return Err(SearchError::InvalidMask { width: mask_w, height: mask_h });
        }
        if threshold < 0 {
            return Err(SearchError::InvalidRegion);
        }
        let threshold = threshold as u32;

        let (x0, x1) = if x0 > x1 { (x1, x0) } else { (x0, x1) };
        let (z0, z1) = if z0 > z1 { (z1, z0) } else { (z0, z1) };
        if x0 == x1 || z0 == z1 {
            return Ok(Vec::new());
        }

        let x_origins = section_origins(x0, x1, mask_w);
        let z_origins = section_origins(z0, z1, mask_h);

        let work: Vec<(i32, i32)> = z_origins
            .iter()
            .flat_map(|&oz| x_origins.iter().map(move |&ox| (ox, oz)))
            .collect();

        let capacity = self.config.channel_capacity.max(1);
        let (work_tx, work_rx) = channel::bounded::<(i32, i32)>(capacity);
        let (result_tx, result_rx) = channel::bounded::<Vec<SearchResult>>(capacity);

        let worker_count = self.worker_count().min(work.len().max(1));
        log::info!("cpu search: {} sections across {} workers", work.len(), worker_count);

        let merged = thread::scope(|scope| {
            for _ in 0..worker_count {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for (ox, oz) in work_rx {
                        let section = Section::compute(ox, oz, world_seed);
                        let mut batch = section.scan(mask, threshold);
                        batch.retain(|r| r.x >= x0 && r.x < x1 && r.z >= z0 && r.z < z1);
                        if !batch.is_empty() {
                            batch.sort();
                            let _ = result_tx.send(batch);
                        }
                    }
                });
            }
            drop(result_tx);

            let dispatcher = scope.spawn(move || {
                for origin in work {
                    if work_tx.send(origin).is_err() {
                        break;
                    }
                }
            });

            let mut merged = Vec::new();
            for batch in result_rx {
                merge_sorted(&mut merged, batch);
            }
            dedup_adjacent(&mut merged);

            dispatcher.join().expect("dispatcher thread panicked");
            merged
        });

        log::info!("cpu search: {} results after merge", merged.len());
        Ok(merged)
    }
}
