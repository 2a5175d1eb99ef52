//! The GPU search backend: the same sweep as [`crate::cpu::CpuSearcher`],
//! run as a `wgpu` compute shader instead of CPU threads.
//!
//! Grounded in the pack's `pow.rs` GPU mining kernel: an adapter/device
//! request, a `ComputePipeline` built from a WGSL module, a handful of
//! storage buffers bound at group 0, a dispatch, and a blocking
//! `pollster::block_on` readback. Like that kernel, this backend has
//! no async entry points of its own — `wgpu`'s futures are the only
//! async in the crate, and they're resolved synchronously at the edge.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Mutex;

use bytemuck::{bytes_of, cast_slice};
use wgpu::util::DeviceExt;

use crate::config::SearchConfig;
use crate::cpu::section;
use crate::error::{Result, SearchError};
use crate::mask::Mask;
use crate::result::{dedup_adjacent, merge_sorted, SearchResult};
use crate::searcher::Searcher;

pub mod shader;

use shader::{GpuSearchResult, MaskCell, SearchParams, SHADER_SOURCE};

struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

/// A `wgpu`-backed [`Searcher`]. Unlike [`crate::cpu::CpuSearcher`],
/// the device and pipeline are created once and reused across
/// searches; `destroy` drops them.
pub struct GpuSearcher {
    config: SearchConfig,
    context: Mutex<Option<GpuContext>>,
    running: AtomicBool,
    destroyed: AtomicBool,
}

impl GpuSearcher {
    /// Requests a GPU adapter and device and builds the compute
    /// pipeline. Blocks on `wgpu`'s async adapter/device requests via
    /// `pollster`, the same way the reference GPU miner kernel does.
    pub fn new(config: SearchConfig) -> Result<Self> {
        let context = pollster::block_on(Self::init_context())?;
        Ok(GpuSearcher {
            config,
            context: Mutex::new(Some(context)),
            running: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        })
    }

    async fn init_context() -> Result<GpuContext> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| SearchError::DeviceUnsupported("no compatible GPU adapter found".into()))?;

        log::info!("gpu search: adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("slimy-gpu-search-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                },
                None,
            )
            .await
            .map_err(|e| SearchError::DeviceUnsupported(e.to_string()))?;

        log::info!("gpu search: device acquired, building compute pipeline");

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("slime-search-shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("slime-search-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("slime-search-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("slime-search-pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "main",
        });

        Ok(GpuContext { device, queue, pipeline, bind_group_layout })
    }

    /// Splits `[lo, hi)` into consecutive, non-overlapping tiles of at
    /// most `tile_width` each, returning `(start, width)` pairs. Unlike
    /// the CPU sections, a GPU tile has no internal mask-footprint
    /// containment requirement — every invocation reads the slime
    /// predicate at its own global coordinate regardless of which tile
    /// dispatched it — so tiles exist purely to keep a single dispatch
    /// under the device's max workgroup-count, with no overlap needed.
    fn tile_origins(lo: i32, hi: i32, tile_width: u32) -> Vec<(i32, u32)> {
        if lo >= hi {
            return Vec::new();
        }
        let mut tiles = Vec::new();
        let mut start = lo;
        while start < hi {
            let width = (hi - start).min(tile_width as i32) as u32;
            tiles.push((start, width));
            start += width as i32;
        }
        tiles
    }
}

impl Searcher for GpuSearcher {
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
        *self.context.lock().expect("gpu context mutex poisoned") = None;
    }
}

impl GpuSearcher {
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
        if mask_w >= section::SIZE || mask_h >= section::SIZE {
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

        let guard = self.context.lock().expect("gpu context mutex poisoned");
        let ctx = guard.as_ref().ok_or(SearchError::Destroyed)?;

        let mask_cells: Vec<MaskCell> = (0..mask_h)
            .flat_map(|mz| (0..mask_w).map(move |mx| (mx, mz)))
            .map(|(mx, mz)| MaskCell { active: mask.query(mx, mz) as u32, _pad: [0; 3] })
            .collect();

        // Work in corner space: a candidate whose mask corner is at
        // `c` has its reported center at `c + mask/2`, so shifting the
        // requested center range back by `mask/2` turns "dispatch one
        // workgroup per requested center" into "dispatch one workgroup
        // per corner in this shifted range", covering the region
        // exactly once with no overlap needed.
        let half_w = (mask_w / 2) as i32;
        let half_h = (mask_h / 2) as i32;
        let corner_x0 = x0 - half_w;
        let corner_x1 = x1 - half_w;
        let corner_z0 = z0 - half_h;
        let corner_z1 = z1 - half_h;

        let tile_w = self.config.gpu_tile_width;
        let x_tiles = Self::tile_origins(corner_x0, corner_x1, tile_w);
        let z_tiles = Self::tile_origins(corner_z0, corner_z1, tile_w);

        log::info!("gpu search: {} tiles ({} x {})", x_tiles.len() * z_tiles.len(), x_tiles.len(), z_tiles.len());

        let mut merged = Vec::new();
        for &(tz, tile_height) in &z_tiles {
            for &(tx, tile_width) in &x_tiles {
                let batch = self.dispatch_tile(ctx, tx, tz, tile_width, tile_height, mask_w, mask_h, &mask_cells, threshold, world_seed)?;
                merge_sorted(&mut merged, batch);
            }
        }
        dedup_adjacent(&mut merged);

        Ok(merged)
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch_tile(
        &self,
        ctx: &GpuContext,
        tile_x0: i32,
        tile_z0: i32,
        tile_width: u32,
        tile_height: u32,
        mask_width: u32,
        mask_height: u32,
        mask_cells: &[MaskCell],
        threshold: u32,
        world_seed: i64,
    ) -> Result<Vec<SearchResult>> {
        // One workgroup per mask-corner position in this tile; each
        // invocation reads the slime predicate at its own global
        // coordinate, so corners near the tile edge need no special
        // handling even though their footprint extends past it.
        let candidates_x = tile_width;
        let candidates_z = tile_height;
        let max_results = self.config.gpu_max_results;

        let params = SearchParams {
            tile_x0,
            tile_z0,
            tile_width,
            tile_height,
            mask_width,
            mask_height,
            threshold,
            world_seed_lo: world_seed as u32,
            world_seed_hi: (world_seed >> 32) as u32,
            max_results,
            _pad0: 0,
            _pad1: 0,
        };

        let params_buf = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("search-params"),
            contents: bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let mask_buf = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mask-cells"),
            contents: cast_slice(mask_cells),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let results_buf = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("results"),
            size: (max_results as u64) * (std::mem::size_of::<GpuSearchResult>() as u64),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let counter_buf = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("result-counter"),
            contents: bytes_of(&0u32),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("slime-search-bind-group"),
            layout: &ctx.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: params_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: mask_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: results_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: counter_buf.as_entire_binding() },
            ],
        });

        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("slime-search-encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("slime-search-pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&ctx.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(candidates_x, candidates_z, 1);
        }

        let readback_results = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("results-readback"),
            size: results_buf.size(),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let readback_counter = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("counter-readback"),
            size: counter_buf.size(),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        encoder.copy_buffer_to_buffer(&results_buf, 0, &readback_results, 0, results_buf.size());
        encoder.copy_buffer_to_buffer(&counter_buf, 0, &readback_counter, 0, counter_buf.size());

        ctx.queue.submit(Some(encoder.finish()));

        let count = pollster::block_on(Self::read_u32(&ctx.device, &readback_counter))?;
        if count > max_results {
            log::error!("gpu search: tile produced {count} results, exceeding capacity {max_results}");
            return Err(SearchError::BufferOverflow { capacity: max_results, actual: count });
        }

        let half_w = (mask_width / 2) as i32;
        let half_h = (mask_height / 2) as i32;
        let raw = pollster::block_on(Self::read_bytes(&ctx.device, &readback_results))?;
        let all: &[GpuSearchResult] = cast_slice(&raw);
        let results = all[..count as usize]
            .iter()
            .map(|r| SearchResult::new(r.xoff + half_w, r.zoff + half_h, r.count))
            .collect();

        Ok(results)
    }

    /// Maps `buf` for reading and blocks until the mapping completes.
    /// `map_async`'s callback fires from inside `device.poll`, so the
    /// oneshot channel here never actually awaits on a pending future
    /// in practice; it exists because `map_async` takes a callback
    /// rather than returning a future directly.
    async fn read_bytes(device: &wgpu::Device, buf: &wgpu::Buffer) -> Result<Vec<u8>> {
        let slice = buf.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        device.poll(wgpu::Maintain::Wait);
        rx.receive()
            .await
            .ok_or_else(|| SearchError::InternalAssertion("GPU readback channel closed".into()))?
            .map_err(|e| SearchError::InternalAssertion(format!("GPU buffer map failed: {e:?}")))?;
        let data = slice.get_mapped_range().to_vec();
        buf.unmap();
        Ok(data)
    }

    async fn read_u32(device: &wgpu::Device, buf: &wgpu::Buffer) -> Result<u32> {
        let bytes = Self::read_bytes(device, buf).await?;
        Ok(u32::from_le_bytes(bytes[..4].try_into().unwrap()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_origins_covers_small_range_in_one_tile() {
        let tiles = GpuSearcher::tile_origins(-10, 10, 1024);
        assert_eq!(tiles, vec![(-10, 20)]);
    }

    #[test]
    fn tile_origins_splits_large_range_without_overlap() {
        let tiles = GpuSearcher::tile_origins(0, 2500, 1024);
        assert_eq!(tiles, vec![(0, 1024), (1024, 1024), (2048, 452)]);
        let total: u32 = tiles.iter().map(|&(_, w)| w).sum();
        assert_eq!(total, 2500);
    }

    #[test]
    fn tile_origins_empty_for_empty_range() {
        assert_eq!(GpuSearcher::tile_origins(5, 5, 1024), Vec::new());
        assert_eq!(GpuSearcher::tile_origins(5, 0, 1024), Vec::new());
    }
}
