//! Tuning knobs for both search backends, loadable from a TOML file.
//!
//! Grounded in `grin_miner_config`'s `MinerConfig`: a plain
//! `serde`-derived struct with a `Default` impl that reproduces the
//! values the core's spec suggests, and a thin TOML-loading helper.
//! Nothing here touches CLI argument parsing or output formatting —
//! those remain the caller's responsibility.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

/// Tuning parameters for [`crate::cpu::CpuSearcher`] and
/// [`crate::gpu::GpuSearcher`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of CPU worker threads. `None` means "use the number of
    /// available hardware threads", matching `runtime.GOMAXPROCS(0)` in
    /// the reference implementation.
    pub worker_count: Option<usize>,

    /// Capacity of the section/result channels the CPU dispatcher,
    /// workers, and merger communicate over.
    pub channel_capacity: usize,

    /// Side length of the square region tiles a GPU dispatch is split
    /// into, to stay under the device's max workgroup-count per
    /// dispatch.
    pub gpu_tile_width: u32,

    /// Upper bound on results a single GPU dispatch may produce; sized
    /// so a full tile matching above threshold can never overflow it.
    pub gpu_max_results: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            worker_count: None,
            channel_capacity: 8,
            gpu_tile_width: 1024,
            gpu_max_results: 1 << 20,
        }
    }
}

impl SearchConfig {
    /// Parses a config from a TOML document. Unset fields fall back to
    /// [`SearchConfig::default`].
    pub fn from_toml_str(src: &str) -> Result<SearchConfig> {
        toml::from_str(src).map_err(|e| SearchError::InternalAssertion(format!("invalid config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_suggested_constants() {
        let cfg = SearchConfig::default();
        assert_eq!(cfg.channel_capacity, 8);
        assert_eq!(cfg.gpu_tile_width, 1024);
        assert_eq!(cfg.gpu_max_results, 1 << 20);
        assert!(cfg.worker_count.is_none());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg = SearchConfig::from_toml_str("worker_count = 4\n").unwrap();
        assert_eq!(cfg.worker_count, Some(4));
        assert_eq!(cfg.channel_capacity, 8);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(SearchConfig::from_toml_str("not valid = = toml").is_err());
    }
}
