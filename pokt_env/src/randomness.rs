//! Randomness service trait consumed by boundary actions.

use crate::error::EnvError;

/// The central interface for stochastic decisions.
///
/// Boundary actions draw every random quantity through this trait so that
/// a trial is reproducible from its seed alone.
///
/// # Implementations
///
/// - **Ad hoc**: `ThreadRandomness` - wraps `rand::thread_rng`
/// - **Simulation**: `pokt_sim::SimContext` - wraps a seeded `ChaCha8Rng`
/// - **Tests**: `ScriptedRandomness` - replays fixed draws
pub trait RandomnessService {
    /// Returns a uniform draw in `[0, 1)`.
    fn uniform(&mut self) -> f64;

    /// Picks an index uniformly from `0..len`.
    ///
    /// Returns `None` when `len == 0`.
    fn choose_index(&mut self, len: usize) -> Option<usize>;

    /// Draws from a Gamma distribution with the given shape and scale.
    ///
    /// # Errors
    /// `EnvError::InvalidDistribution` if either parameter is not a
    /// positive finite number.
    fn gamma(&mut self, shape: f64, scale: f64) -> Result<f64, EnvError>;

    /// Returns the seed of the stream (0 when unseeded).
    fn seed(&self) -> u64;

    /// Draws an integer uniformly from the inclusive range `low..=high`.
    fn uniform_int(&mut self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        let span = high - low + 1;
        let offset = (self.uniform() * span as f64).floor() as u64;
        low + offset.min(span - 1)
    }

    /// Picks `amount` distinct indices from `0..len` (partial Fisher-Yates).
    ///
    /// Returns fewer than `amount` indices when `len < amount`.
    fn choose_many(&mut self, len: usize, amount: usize) -> Vec<usize> {
        let mut pool: Vec<usize> = (0..len).collect();
        let take = amount.min(len);
        for i in 0..take {
            if let Some(j) = self.choose_index(len - i) {
                pool.swap(i, i + j);
            }
        }
        pool.truncate(take);
        pool
    }
}
