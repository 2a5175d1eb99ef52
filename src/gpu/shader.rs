//! WGSL compute kernel equivalent to the CPU sweep, and the host-side
//! buffer layouts it reads and writes.
//!
//! WGSL has no 64-bit integer type, so the 48-bit LCG and the slime
//! predicate's 64-bit arithmetic are emulated with pairs of `u32`s
//! throughout (this is always on, not a feature flag — see
//! `Int64`/`mul64`/`add64` below). The asymmetric parenthesization in
//! the slime predicate (x-terms multiplied in 32-bit before widening,
//! z-terms widened before multiplying) is preserved exactly, the same
//! as `crate::slime::is_slime`.

use bytemuck::{Pod, Zeroable};

/// One dispatch's parameters, passed as a uniform buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SearchParams {
    pub tile_x0: i32,
    pub tile_z0: i32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub mask_width: u32,
    pub mask_height: u32,
    pub threshold: u32,
    pub world_seed_lo: u32,
    pub world_seed_hi: u32,
    pub max_results: u32,
    /// Padding so the struct's size is a multiple of 16 bytes, as
    /// std140/std430 uniform buffer layout requires.
    pub _pad0: u32,
    pub _pad1: u32,
}

/// One mask cell, flattened from the `Mask` trait into a buffer the
/// shader can index: `(mask_width * mask_height)` of these, row-major.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MaskCell {
    pub active: u32,
    pub _pad: [u32; 3],
}

/// One emitted result, matching the CPU's [`crate::result::SearchResult`]
/// modulo the std430 16-byte alignment the WGSL side expects.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuSearchResult {
    pub xoff: i32,
    pub zoff: i32,
    pub count: u32,
    pub _pad: u32,
}

/// The WGSL compute kernel source. One workgroup per candidate center
/// in the dispatched tile; each invocation in the workgroup tests one
/// mask cell against the slime predicate, the workgroup reduces the
/// per-cell hits with a shared atomic counter, and invocation 0
/// appends a result to the global atomic-counted output buffer if the
/// count clears `threshold`.
pub const SHADER_SOURCE: &str = r#"
struct SearchParams {
    tile_x0: i32,
    tile_z0: i32,
    tile_width: u32,
    tile_height: u32,
    mask_width: u32,
    mask_height: u32,
    threshold: u32,
    world_seed_lo: u32,
    world_seed_hi: u32,
    max_results: u32,
    _pad0: u32,
    _pad1: u32,
};

struct MaskCell {
    active: u32,
    _pad: vec3<u32>,
};

struct GpuSearchResult {
    xoff: i32,
    zoff: i32,
    count: u32,
    _pad: u32,
};

@group(0) @binding(0) var<uniform> params: SearchParams;
@group(0) @binding(1) var<storage, read> mask_cells: array<MaskCell>;
@group(0) @binding(2) var<storage, read_write> results: array<GpuSearchResult>;
@group(0) @binding(3) var<storage, read_write> result_count: atomic<u32>;

const THREADS_PER_GROUP: u32 = 64u;

var<workgroup> hit_count: atomic<u32>;

// 48-bit LCG state and the Java Random multiplier/increment, split into
// hi:lo 32-bit halves (hi always < 0x10000 since the state is 48 bits).
struct U64 { lo: u32, hi: u32 };

fn u64_from_u32(v: u32) -> U64 {
    return U64(v, 0u);
}

// Widens a wrapped 32-bit product into 64 bits the way a signed `int32`
// to `int64` (or `uint64_t`) cast does: sign-extended, not zero-extended.
// The slime seed formula relies on this - a negative 32-bit intermediate
// must carry its sign into the upper 32 bits before the 64-bit add/multiply
// that follows, the same as `crate::slime::is_slime`'s `as i64` casts.
fn widen_i32_to_u64(v: u32) -> U64 {
    let hi = select(0u, 0xffffffffu, (v & 0x80000000u) != 0u);
    return U64(v, hi);
}

fn mul_u64(a: U64, b: U64) -> U64 {
    let a0 = a.lo & 0xffffu;
    let a1 = a.lo >> 16u;
    let b0 = b.lo & 0xffffu;
    let b1 = b.lo >> 16u;

    let p00 = a0 * b0;
    let mid = a0 * b1 + a1 * b0;

    let lo = p00 + (mid << 16u);
    let carry = select(0u, 1u, lo < p00);

    let hi = (a.lo * b.hi + a.hi * b.lo) + (mid >> 16u) + carry;
    return U64(lo, hi);
}

fn add_u64(a: U64, b: U64) -> U64 {
    let lo = a.lo + b.lo;
    let carry = select(0u, 1u, lo < a.lo);
    let hi = a.hi + b.hi + carry;
    return U64(lo, hi);
}

fn and_u64(a: U64, mask_lo: u32, mask_hi: u32) -> U64 {
    return U64(a.lo & mask_lo, a.hi & mask_hi);
}

fn xor_u64(a: U64, xor_lo: u32, xor_hi: u32) -> U64 {
    return U64(a.lo ^ xor_lo, a.hi ^ xor_hi);
}

const RNG_MUL_LO: u32 = 0x5DEECE66Du;
const RNG_MUL_HI: u32 = 0x5u;
const RNG_INC: u32 = 0xBu;
const MASK48_LO: u32 = 0xffffffffu;
const MASK48_HI: u32 = 0xffffu;

fn rng_next(state: ptr<function, U64>, bits: u32) -> i32 {
    let mul = U64(RNG_MUL_LO, RNG_MUL_HI);
    var s = mul_u64(*state, mul);
    s = add_u64(s, u64_from_u32(RNG_INC));
    s = and_u64(s, MASK48_LO, MASK48_HI);
    *state = s;
    // top `bits` of the 48-bit state, as a signed 32-bit value.
    let shift = 48u - bits;
    var top: u32;
    if (shift >= 32u) {
        top = s.hi >> (shift - 32u);
    } else {
        top = (s.lo >> shift) | (s.hi << (32u - shift));
    }
    return bitcast<i32>(top);
}

fn rng_next_int_10(state: ptr<function, U64>) -> i32 {
    // n = 10 always (the slime predicate), so the power-of-two fast
    // path never applies and only the rejection loop is needed.
    loop {
        let bits = rng_next(state, 31u);
        let val = bits % 10;
        if ((bits - val) + 9) >= 0 {
            return val;
        }
    }
}

fn seed_rng(seed: U64) -> U64 {
    let s = xor_u64(seed, RNG_MUL_LO, RNG_MUL_HI);
    return and_u64(s, MASK48_LO, MASK48_HI);
}

fn is_slime(world_seed_lo: u32, world_seed_hi: u32, x: i32, z: i32) -> bool {
    let ux = bitcast<u32>(x);
    let uz = bitcast<u32>(z);

    // x terms computed entirely in wrapping 32-bit arithmetic, then
    // sign-extended to 64 bits (matching the `as i64` casts on the CPU side).
    let x_sq_term = widen_i32_to_u64((ux * ux) * 4987142u);
    let x_lin_term = widen_i32_to_u64(ux * 5947611u);

    // z*z sign-extended to 64-bit before multiplying by its coefficient.
    let z_sq_term = mul_u64(widen_i32_to_u64(uz * uz), u64_from_u32(4392871u));
    let z_lin_term = widen_i32_to_u64(uz * 389711u);

    var seed = U64(world_seed_lo, world_seed_hi);
    seed = add_u64(seed, x_sq_term);
    seed = add_u64(seed, x_lin_term);
    seed = add_u64(seed, z_sq_term);
    seed = add_u64(seed, z_lin_term);
    seed = xor_u64(seed, 0x3AD8025Fu, 0x0u);

    var rng = seed_rng(seed);
    return rng_next_int_10(&rng) == 0;
}

@compute @workgroup_size(THREADS_PER_GROUP, 1, 1)
fn main(
    @builtin(workgroup_id) wg_id: vec3<u32>,
    @builtin(local_invocation_index) local_index: u32,
) {
    let lx = i32(wg_id.x);
    let lz = i32(wg_id.y);
    let total_cells = params.mask_width * params.mask_height;

    if (local_index == 0u) {
        atomicStore(&hit_count, 0u);
    }
    workgroupBarrier();

    var idx = local_index;
    loop {
        if (idx >= total_cells) {
            break;
        }
        if (mask_cells[idx].active != 0u) {
            let mx = idx % params.mask_width;
            let mz = idx / params.mask_width;
            let wx = params.tile_x0 + lx + i32(mx);
            let wz = params.tile_z0 + lz + i32(mz);
            if (is_slime(params.world_seed_lo, params.world_seed_hi, wx, wz)) {
                atomicAdd(&hit_count, 1u);
            }
        }
        idx = idx + THREADS_PER_GROUP;
    }
    workgroupBarrier();

    if (local_index == 0u) {
        let count = atomicLoad(&hit_count);
        if (count >= params.threshold) {
            let slot = atomicAdd(&result_count, 1u);
            if (slot < params.max_results) {
                results[slot] = GpuSearchResult(params.tile_x0 + lx, params.tile_z0 + lz, count, 0u);
            }
        }
    }
}
"#;
