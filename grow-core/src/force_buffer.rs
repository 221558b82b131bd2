use glam::Vec3;

use crate::types::NodeId;

/// Per-point scratch buffer for accumulated many-body forces.
///
/// `force[i]` belongs to point (and graph node) `i`. The buffer is reused
/// across ticks and only grows, like the layout's point buffers.
#[derive(Debug, Default)]
pub struct ForceBuffer {
    force: Vec<Vec3>,
}

impl ForceBuffer {
    /// Creates a zeroed buffer for `len` points.
    pub fn with_len(len: usize) -> Self {
        Self {
            force: vec![Vec3::ZERO; len],
        }
    }

    /// Resizes to `len` and zeroes every entry, even if the length already
    /// matched.
    pub fn ensure_len(&mut self, len: usize) {
        if self.force.len() != len {
            self.force.resize(len, Vec3::ZERO);
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        self.force.fill(Vec3::ZERO);
    }

    pub fn len(&self) -> usize {
        self.force.len()
    }

    pub fn is_empty(&self) -> bool {
        self.force.is_empty()
    }

    /// Adds `f` to point `id`.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    pub fn add(&mut self, id: NodeId, f: Vec3) {
        self.force[id] += f;
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Vec3 {
        self.force[id]
    }

    pub fn as_slice(&self) -> &[Vec3] {
        &self.force
    }

    /// Adds `strength * force[i]` to `vel[i]` for every point.
    ///
    /// ### Panics
    /// Panics if `vel` is shorter than the buffer.
    pub fn apply_to(&self, vel: &mut [Vec3], strength: f32) {
        for (v, f) in vel[..self.force.len()].iter_mut().zip(&self.force) {
            *v += *f * strength;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_len_initializes_zeroed_state() {
        let buf = ForceBuffer::with_len(3);
        assert_eq!(buf.len(), 3);
        assert!(buf.as_slice().iter().all(|f| *f == Vec3::ZERO));
    }

    #[test]
    fn ensure_len_resizes_and_clears() {
        let mut buf = ForceBuffer::with_len(2);
        buf.add(1, Vec3::X);
        buf.ensure_len(2);
        assert_eq!(buf.get(1), Vec3::ZERO);

        buf.add(0, Vec3::Y);
        buf.ensure_len(4);
        assert_eq!(buf.len(), 4);
        assert!(buf.as_slice().iter().all(|f| *f == Vec3::ZERO));
    }

    #[test]
    fn add_accumulates() {
        let mut buf = ForceBuffer::with_len(1);
        buf.add(0, Vec3::new(1.0, 2.0, 3.0));
        buf.add(0, Vec3::new(1.0, 0.0, -1.0));
        assert_eq!(buf.get(0), Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn apply_to_scales_into_velocity() {
        let mut buf = ForceBuffer::with_len(2);
        buf.add(0, Vec3::new(1.0, 0.0, 0.0));
        buf.add(1, Vec3::new(0.0, 2.0, 0.0));
        let mut vel = vec![Vec3::ONE, Vec3::ZERO, Vec3::ZERO];
        buf.apply_to(&mut vel, -3.0);
        assert_eq!(vel[0], Vec3::new(-2.0, 1.0, 1.0));
        assert_eq!(vel[1], Vec3::new(0.0, -6.0, 0.0));
        assert_eq!(vel[2], Vec3::ZERO);
    }

    #[test]
    #[should_panic]
    fn add_out_of_bounds_panics() {
        let mut buf = ForceBuffer::with_len(1);
        buf.add(1, Vec3::X);
    }
}
