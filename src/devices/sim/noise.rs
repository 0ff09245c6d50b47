//! Sonar echo noise
//!
//! Gaussian range error plus random echo loss, seeded for reproducible runs.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

#[derive(Clone)]
pub struct EchoNoise {
    rng: SmallRng,
    range_stddev: f32,
    dropout_rate: f32,
}

impl EchoNoise {
    /// A seed of 0 draws from entropy; anything else is deterministic
    pub fn new(seed: u64, range_stddev: f32, dropout_rate: f32) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self {
            rng,
            range_stddev,
            dropout_rate,
        }
    }

    /// Perturb a true range
    #[inline]
    pub fn perturb(&mut self, range: f32) -> f32 {
        if self.range_stddev == 0.0 {
            return range;
        }
        let n: f32 = self.rng.sample(StandardNormal);
        range + n * self.range_stddev
    }

    /// Whether this ping's echo is lost
    #[inline]
    pub fn dropped(&mut self) -> bool {
        self.dropout_rate > 0.0 && self.rng.gen::<f32>() < self.dropout_rate
    }
}
