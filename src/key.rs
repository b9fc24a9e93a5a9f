//! Cache key derivation.
//!
//! The cache itself never interprets keys. These helpers give callers stable
//! 64-bit keys for the two common sampling schemes: world-space points and
//! lightmap texels. Both hash quantized integers with 64-bit FNV-1a, so a key
//! is identical across runs and platforms.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Grid size used when the caller passes a non-positive or non-finite precision.
pub const DEFAULT_PRECISION: f32 = 0.01;

/// Normals are quantized to this many steps per unit.
const NORMAL_STEPS: f32 = 1000.0;

#[derive(Debug, Clone, Copy)]
struct Fnv1a(u64);

impl Fnv1a {
    fn new() -> Self {
        Self(FNV_OFFSET_BASIS)
    }

    fn write(mut self, bytes: &[u8]) -> Self {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
        self
    }

    fn write_i32(self, value: i32) -> Self {
        self.write(&value.to_le_bytes())
    }

    fn write_u32(self, value: u32) -> Self {
        self.write(&value.to_le_bytes())
    }

    fn finish(self) -> u64 {
        self.0
    }
}

/// Snap `value` to the nearest multiple of `step`, as a grid index.
fn quantize(value: f32, step: f32) -> i32 {
    // `as` saturates, and NaN maps to 0.
    (value / step).round() as i32
}

/// Key for a world-space sample.
///
/// Positions closer than `precision` (world units) share a key. Normals are
/// quantized to 1/1000, so samples on opposite faces of a thin wall differ.
pub fn world_space_key(position: [f32; 3], normal: [f32; 3], precision: f32) -> u64 {
    let precision = if precision.is_finite() && precision > 0.0 {
        precision
    } else {
        DEFAULT_PRECISION
    };

    let hasher = position
        .iter()
        .fold(Fnv1a::new(), |h, &c| h.write_i32(quantize(c, precision)));
    normal
        .iter()
        .fold(hasher, |h, &c| h.write_i32((c * NORMAL_STEPS).round() as i32))
        .finish()
}

/// Key for a lightmap texel of `mesh_id`.
///
/// `uv` is in `[0, 1]` and is snapped to the nearest point of a
/// `resolution`-sized texel grid. A resolution of zero is treated as one.
pub fn lightmap_key(mesh_id: u32, uv: [f32; 2], resolution: u32) -> u64 {
    let texels = resolution.max(1) as f32;
    let [u, v] = uv;

    Fnv1a::new()
        .write_u32(mesh_id)
        .write_i32((u * texels).round() as i32)
        .write_i32((v * texels).round() as i32)
        .finish()
}
