//! Deterministic slime-chunk cluster search, with parallel CPU and
//! GPU-compute backends sharing one result format and total order.

pub mod error;
pub mod result;
pub mod rng;
pub mod slime;

#[path = "config.rs"]
pub mod config;

#[path = "mask/mask.rs"]
pub mod mask;

#[path = "searcher.rs"]
pub mod searcher;

#[path = "cpu/cpu.rs"]
pub mod cpu;

#[path = "gpu/gpu.rs"]
pub mod gpu;

pub use config::SearchConfig;
pub use cpu::CpuSearcher;
pub use error::{Result, SearchError};
pub use gpu::GpuSearcher;
pub use mask::{Annulus, Mask, PixelMask};
pub use result::SearchResult;
pub use rng::JavaRng;
pub use searcher::Searcher;
pub use slime::is_slime;
