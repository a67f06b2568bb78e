//! Scripted randomness for exact, replayable stage tests.

use crate::error::EnvError;
use crate::RandomnessService;
use std::collections::VecDeque;

/// Replays pre-recorded draws in order.
///
/// When a queue runs dry the service falls back to fixed values:
/// `uniform() = 0.5`, `choose_index(n) = 0`, `gamma(k, θ) = k·θ` (the mean).
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandomness {
    uniforms: VecDeque<f64>,
    choices: VecDeque<usize>,
    gammas: VecDeque<f64>,
    fallback_uniform: f64,
}

impl ScriptedRandomness {
    /// Creates an empty script.
    pub fn new() -> Self {
        Self {
            fallback_uniform: 0.5,
            ..Default::default()
        }
    }

    /// Queues uniform draws.
    pub fn with_uniforms(mut self, draws: impl IntoIterator<Item = f64>) -> Self {
        self.uniforms.extend(draws);
        self
    }

    /// Queues choice indices (taken modulo the collection length).
    pub fn with_choices(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.choices.extend(picks);
        self
    }

    /// Queues Gamma draws.
    pub fn with_gammas(mut self, draws: impl IntoIterator<Item = f64>) -> Self {
        self.gammas.extend(draws);
        self
    }

    /// Sets the uniform value returned once the queue is exhausted.
    pub fn with_fallback_uniform(mut self, value: f64) -> Self {
        self.fallback_uniform = value;
        self
    }

    /// Number of uniform draws still queued.
    pub fn remaining_uniforms(&self) -> usize {
        self.uniforms.len()
    }
}

impl RandomnessService for ScriptedRandomness {
    fn uniform(&mut self) -> f64 {
        self.uniforms.pop_front().unwrap_or(self.fallback_uniform)
    }

    fn choose_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.choices.pop_front().unwrap_or(0) % len)
    }

    fn gamma(&mut self, shape: f64, scale: f64) -> Result<f64, EnvError> {
        if !(shape > 0.0 && scale > 0.0 && shape.is_finite() && scale.is_finite()) {
            return Err(EnvError::invalid_distribution(
                "gamma",
                format!("shape={} scale={}", shape, scale),
            ));
        }
        Ok(self.gammas.pop_front().unwrap_or(shape * scale))
    }

    fn seed(&self) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_replays_in_order() {
        let mut rng = ScriptedRandomness::new()
            .with_uniforms([0.1, 0.9])
            .with_gammas([12.7]);

        assert_eq!(rng.uniform(), 0.1);
        assert_eq!(rng.uniform(), 0.9);
        assert_eq!(rng.uniform(), 0.5);
        assert_eq!(rng.gamma(2.0, 3.0), Ok(12.7));
        assert_eq!(rng.gamma(2.0, 3.0), Ok(6.0));
    }

    #[test]
    fn test_scripted_choice_wraps() {
        let mut rng = ScriptedRandomness::new().with_choices([7]);
        assert_eq!(rng.choose_index(3), Some(1));
        assert_eq!(rng.choose_index(0), None);
    }

    #[test]
    fn test_scripted_gamma_validates() {
        let mut rng = ScriptedRandomness::new();
        assert!(rng.gamma(-1.0, 2.0).is_err());
        assert!(rng.gamma(1.0, f64::NAN).is_err());
    }
}
