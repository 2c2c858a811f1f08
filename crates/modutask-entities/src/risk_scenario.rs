//! Stochastic module-failure models (SPEC_FULL.md §3).
//!
//! A `RiskScenario` is a seeded, stateful policy: given a module, it
//! returns whether the module fails *now*. It must be reconstructible
//! deterministically from (name, seed) alone, which cloning relies on
//! (§4.5, §5 RNG discipline).

use std::fmt::Debug;

use modutask_core::SimRng;

use crate::module::Module;

pub trait RiskScenario: Debug + Send {
    fn name(&self) -> &str;

    /// Decide whether `module` fails this step. Takes `&mut self` because
    /// scenarios draw from their own seeded RNG.
    fn malfunction_module(&mut self, module: &Module) -> bool;

    /// Produce an independent clone seeded identically to this scenario's
    /// own construction, per the clone law in §8 (bit-identical outcomes
    /// across independent clones run on the same step sequence).
    fn clone_boxed(&self) -> Box<dyn RiskScenario>;
}

/// The mandated default: failure probability grows with a module's
/// cumulative operating_time following an exponential hazard,
/// `1 - exp(-operating_time / mean_life)`.
#[derive(Debug)]
pub struct ExponentialOperatingTime {
    name: String,
    seed: u64,
    mean_life: f64,
    rng: SimRng,
}

impl ExponentialOperatingTime {
    pub fn new(name: impl Into<String>, seed: u64, mean_life: f64) -> Self {
        Self {
            name: name.into(),
            seed,
            mean_life,
            rng: SimRng::new(seed),
        }
    }
}

impl RiskScenario for ExponentialOperatingTime {
    fn name(&self) -> &str {
        &self.name
    }

    fn malfunction_module(&mut self, module: &Module) -> bool {
        if self.mean_life <= 0.0 {
            return false;
        }
        let failure_probability = 1.0 - (-module.operating_time() / self.mean_life).exp();
        self.rng.gen_bool(failure_probability)
    }

    fn clone_boxed(&self) -> Box<dyn RiskScenario> {
        Box::new(ExponentialOperatingTime::new(
            self.name.clone(),
            self.seed,
            self.mean_life,
        ))
    }
}

/// Supplementary variant demonstrating the trait's extensibility: failure
/// probability follows a sigmoid in operating_time relative to `limit`,
/// with `sharpness` controlling the transition steepness.
#[derive(Debug)]
pub struct TimeSigmoid {
    name: String,
    seed: u64,
    sharpness: f64,
    limit: f64,
    rng: SimRng,
}

impl TimeSigmoid {
    pub fn new(name: impl Into<String>, seed: u64, sharpness: f64, limit: f64) -> Self {
        Self {
            name: name.into(),
            seed,
            sharpness,
            limit,
            rng: SimRng::new(seed),
        }
    }

    fn normalized_sigmoid(&self, operating_time: f64) -> f64 {
        1.0 / (1.0 + (self.sharpness * (operating_time / self.limit - 0.5)).exp())
    }
}

impl RiskScenario for TimeSigmoid {
    fn name(&self) -> &str {
        &self.name
    }

    fn malfunction_module(&mut self, module: &Module) -> bool {
        if self.limit <= 0.0 {
            return false;
        }
        let p = self.normalized_sigmoid(module.operating_time());
        self.rng.gen_bool(p)
    }

    fn clone_boxed(&self) -> Box<dyn RiskScenario> {
        Box::new(TimeSigmoid::new(
            self.name.clone(),
            self.seed,
            self.sharpness,
            self.limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modutask_core::Coordinate;

    fn module_with_operating_time(t: f64) -> Module {
        Module::new(
            "m",
            crate::module::ModuleType::new("t", 10.0),
            Coordinate::new(0.0, 0.0),
            10.0,
            t,
            crate::module::ModuleState::Active,
        )
        .unwrap()
    }

    #[test]
    fn exponential_failure_probability_increases_with_operating_time() {
        let young = module_with_operating_time(0.0);
        let old = module_with_operating_time(1000.0);
        let mut scenario = ExponentialOperatingTime::new("wear", 1, 100.0);
        // old module should fail with probability ~1, young with ~0
        let mut old_failures = 0;
        let mut young_failures = 0;
        for _ in 0..200 {
            if scenario.malfunction_module(&old) {
                old_failures += 1;
            }
            if scenario.malfunction_module(&young) {
                young_failures += 1;
            }
        }
        assert!(old_failures > young_failures);
    }

    #[test]
    fn clones_are_deterministically_reproducible() {
        let mut a = ExponentialOperatingTime::new("wear", 7, 50.0);
        let mut b = a.clone_boxed();
        let m = module_with_operating_time(20.0);
        for _ in 0..50 {
            assert_eq!(a.malfunction_module(&m), b.malfunction_module(&m));
        }
    }
}
