//! Unseeded implementation of RandomnessService using the thread RNG.

use crate::error::EnvError;
use crate::RandomnessService;
use rand::rngs::ThreadRng;
use rand::Rng;
use rand_distr::{Distribution, Gamma};

/// Randomness backed by OS-seeded thread-local entropy.
///
/// Useful for exploratory runs where reproducibility does not matter.
/// Simulation trials should use the seeded `SimContext` instead.
pub struct ThreadRandomness {
    rng: ThreadRng,
}

impl ThreadRandomness {
    /// Creates a new ThreadRandomness.
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for ThreadRandomness {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomnessService for ThreadRandomness {
    fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn choose_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.rng.gen_range(0..len))
    }

    fn gamma(&mut self, shape: f64, scale: f64) -> Result<f64, EnvError> {
        let dist = Gamma::new(shape, scale)
            .map_err(|e| EnvError::invalid_distribution("gamma", format!("{:?}", e)))?;
        Ok(dist.sample(&mut self.rng))
    }

    fn seed(&self) -> u64 {
        // Not seeded
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_uniform_range() {
        let mut rng = ThreadRandomness::new();
        for _ in 0..100 {
            let u = rng.uniform();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn test_thread_gamma_rejects_bad_shape() {
        let mut rng = ThreadRandomness::new();
        assert!(rng.gamma(0.0, 1.0).is_err());
        assert!(rng.gamma(2.0, 3.0).unwrap() >= 0.0);
    }

    #[test]
    fn test_thread_seed() {
        assert_eq!(ThreadRandomness::new().seed(), 0);
        assert_eq!(ThreadRandomness::new().choose_index(0), None);
    }
}
