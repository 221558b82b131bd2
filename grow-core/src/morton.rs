//! Morton (Z-order) indexing of 3-D points.
//!
//! Points are quantized to 10 bits per axis inside their bounding cube and
//! the three coordinates are bit-interleaved into a 30-bit code. Sorting by
//! that code puts every octree cell's points in one contiguous run.

use glam::Vec3;

/// Quantization bits per axis.
pub const MORTON_BITS: u32 = 10;

const MAX_CELL: u32 = (1 << MORTON_BITS) - 1;

/// Guards the quantization scale when all points coincide.
pub const EXTENT_EPSILON: f32 = 1e-8;

/// Spreads the low 10 bits of `x` so that bit `i` lands on bit `3 * i`.
#[inline]
pub fn dilate3(x: u32) -> u32 {
    let mut x = x & 0x3ff;
    x = (x | (x << 16)) & 0x0300_00ff;
    x = (x | (x << 8)) & 0x0300_f00f;
    x = (x | (x << 4)) & 0x030c_30c3;
    x = (x | (x << 2)) & 0x0924_9249;
    x
}

/// Interleaves three 10-bit cell coordinates, x in the lowest bit.
#[inline]
pub fn encode(x: u32, y: u32, z: u32) -> u32 {
    dilate3(x) | (dilate3(y) << 1) | (dilate3(z) << 2)
}

/// Smallest axis-aligned cube around `points`.
///
/// The cube's side is the largest of the three extents and it is centered
/// on the bounding box. Returns `(lower_corner, side)`, or `None` for an
/// empty slice.
pub fn bounding_cube(points: &[Vec3]) -> Option<(Vec3, f32)> {
    let first = *points.first()?;
    let (lo, hi) = points
        .iter()
        .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)));
    let extent = (hi - lo).max_element();
    let center = (lo + hi) * 0.5;
    Some((center - Vec3::splat(extent * 0.5), extent))
}

/// Points reordered along the Z-order curve.
#[derive(Clone, Debug, Default)]
pub struct MortonOrder {
    /// Morton code of each sorted point.
    pub codes: Vec<u32>,
    /// Original index of each sorted point.
    pub indices: Vec<u32>,
    /// The points themselves, in sorted order.
    pub points: Vec<Vec3>,
    /// Lower corner of the bounding cube.
    pub lo: Vec3,
    /// Side of the bounding cube.
    pub extent: f32,
}

impl MortonOrder {
    pub fn build(points: &[Vec3]) -> Self {
        let Some((lo, extent)) = bounding_cube(points) else {
            return Self::default();
        };
        let scale = MAX_CELL as f32 / (extent + EXTENT_EPSILON);

        // Code in the high half, original index in the low half: one sort
        // orders by code and breaks ties by index.
        let mut keys: Vec<u64> = points
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let cell = ((p - lo) * scale).as_uvec3().min(glam::UVec3::splat(MAX_CELL));
                let code = encode(cell.x, cell.y, cell.z);
                ((code as u64) << 32) | i as u64
            })
            .collect();
        keys.sort_unstable();

        let codes: Vec<u32> = keys.iter().map(|k| (k >> 32) as u32).collect();
        let indices: Vec<u32> = keys.iter().map(|&k| k as u32).collect();
        let sorted = indices.iter().map(|&i| points[i as usize]).collect();

        Self {
            codes,
            indices,
            points: sorted,
            lo,
            extent,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
