use glam::Vec3;

use crate::types::Link;

/// Pulls every linked pair toward `distance` apart.
///
/// Separation is measured between the tentative next positions
/// (`pos + vel`). The correction `(l - distance) / l * strength` along the
/// edge is split evenly between the two endpoints' velocities. Coincident
/// endpoints have no defined direction and are skipped.
pub fn relax_links(links: &[Link], pos: &[Vec3], vel: &mut [Vec3], distance: f32, strength: f32) {
    for &(s, t) in links {
        let delta = (pos[t] + vel[t]) - (pos[s] + vel[s]);
        let l = delta.length();
        if l <= f32::EPSILON {
            continue;
        }
        let k = (l - distance) / l * strength * 0.5;
        let impulse = delta * k;
        vel[t] -= impulse;
        vel[s] += impulse;
    }
}
