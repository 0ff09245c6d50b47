//! Rectangular arena with box obstacles
//!
//! The arena spans `[0, width] x [0, height]` and is closed by walls on all
//! four sides, so every ray eventually hits something.

use super::config::Obstacle;

pub struct Arena {
    width: f32,
    height: f32,
    obstacles: Vec<Obstacle>,
}

impl Arena {
    pub fn new(width: f32, height: f32, obstacles: Vec<Obstacle>) -> Self {
        Self {
            width,
            height,
            obstacles,
        }
    }

    /// Distance from `(x, y)` along `angle` to the first surface.
    ///
    /// The origin must lie inside the arena.
    pub fn ray_cast(&self, x: f32, y: f32, angle: f32) -> f32 {
        let (dx, dy) = (angle.cos(), angle.sin());
        let mut nearest = self.wall_distance(x, y, dx, dy);

        for obstacle in &self.obstacles {
            if let Some(t) = ray_box(x, y, dx, dy, obstacle) {
                nearest = nearest.min(t);
            }
        }
        nearest
    }

    /// Whether a disc of `radius` at `(x, y)` overlaps a wall or obstacle
    pub fn is_blocked(&self, x: f32, y: f32, radius: f32) -> bool {
        if x - radius < 0.0
            || y - radius < 0.0
            || x + radius > self.width
            || y + radius > self.height
        {
            return true;
        }

        self.obstacles.iter().any(|o| {
            // Closest point of the box to the disc center
            let cx = x.clamp(o.x, o.x + o.width);
            let cy = y.clamp(o.y, o.y + o.height);
            let (ex, ey) = (x - cx, y - cy);
            ex * ex + ey * ey < radius * radius
        })
    }

    fn wall_distance(&self, x: f32, y: f32, dx: f32, dy: f32) -> f32 {
        let tx = if dx > 1e-6 {
            (self.width - x) / dx
        } else if dx < -1e-6 {
            -x / dx
        } else {
            f32::INFINITY
        };
        let ty = if dy > 1e-6 {
            (self.height - y) / dy
        } else if dy < -1e-6 {
            -y / dy
        } else {
            f32::INFINITY
        };
        tx.min(ty).max(0.0)
    }
}

/// Slab test; entry distance of the ray into the box, 0 if starting inside
fn ray_box(x: f32, y: f32, dx: f32, dy: f32, o: &Obstacle) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for (origin, dir, lo, hi) in [
        (x, dx, o.x, o.x + o.width),
        (y, dy, o.y, o.y + o.height),
    ] {
        if dir.abs() < 1e-6 {
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }
        let t1 = (lo - origin) / dir;
        let t2 = (hi - origin) / dir;
        t_near = t_near.max(t1.min(t2));
        t_far = t_far.min(t1.max(t2));
    }

    if t_near > t_far || t_far < 0.0 {
        None
    } else {
        Some(t_near.max(0.0))
    }
}
