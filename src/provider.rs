/*!
 * Metric provider capability
 *
 * A provider produces one (kappa, epsilon) pair per call. The guard treats
 * the privileged kernel and the built-in fallback identically through this
 * trait; only the resolver knows which one was selected.
 */

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which provider implementation a resolution selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderKind {
    /// Built-in approximate provider
    Fallback,

    /// External high-fidelity kernel
    Privileged,
}

/// Source of (kappa, epsilon) samples
///
/// Contract: a call returns two floats intended to lie in [0, 1], with no
/// side effects beyond internal bookkeeping, within the loop's per-cycle
/// budget. A provider that blocks past the budget or errors is a per-cycle
/// fault, handled by the loop; it never takes the monitor down.
#[async_trait]
pub trait MetricProvider: Send {
    /// Produce one (kappa, epsilon) pair
    async fn sample(&mut self) -> Result<(f64, f64)>;
}

// Fallback weighting of the synthesized signal set. Demo math, not a
// certified kernel; the weights are not normative.
const KAPPA_WEIGHTS: [f64; 4] = [0.3, 0.3, 0.2, 0.2];
const EPSILON_WEIGHTS: [f64; 4] = [0.4, 0.3, 0.2, 0.1];

/// Deterministic approximate provider
///
/// Synthesizes a plausible signal set (load, error counters, output
/// variance) from a seeded RNG and combines it with fixed weights. It is
/// NOT authoritative: it exists so the guard always has a metric source
/// even when no privileged kernel is installed, and so tests are
/// reproducible for a given seed.
pub struct FallbackProvider {
    rng: StdRng,
}

impl FallbackProvider {
    /// Create a provider with the given seed
    ///
    /// The same seed always yields the same sample sequence.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn synthesize(&mut self) -> (f64, f64) {
        // Stress-side signals
        let cpu_load: f64 = self.rng.random_range(0.0..1.0);
        let memory_usage: f64 = self.rng.random_range(0.0..1.0);
        let network_io: f64 = self.rng.random_range(0.0..1.0);
        let error_rate: f64 = self.rng.random_range(0.0..0.3);

        // Entropy-side signals
        let response_variance: f64 = self.rng.random_range(0.0..1.0);
        let token_entropy: f64 = self.rng.random_range(0.0..1.0);
        let pattern_deviation: f64 = self.rng.random_range(0.0..0.5);
        let recursion_depth: f64 = self.rng.random_range(0.0..0.8);

        let kappa = (KAPPA_WEIGHTS[0] * cpu_load
            + KAPPA_WEIGHTS[1] * memory_usage
            + KAPPA_WEIGHTS[2] * network_io
            + KAPPA_WEIGHTS[3] * error_rate)
            .min(1.0);
        let epsilon = (EPSILON_WEIGHTS[0] * response_variance
            + EPSILON_WEIGHTS[1] * token_entropy
            + EPSILON_WEIGHTS[2] * pattern_deviation
            + EPSILON_WEIGHTS[3] * recursion_depth)
            .min(1.0);

        (kappa, epsilon)
    }
}

#[async_trait]
impl MetricProvider for FallbackProvider {
    async fn sample(&mut self) -> Result<(f64, f64)> {
        Ok(self.synthesize())
    }
}
