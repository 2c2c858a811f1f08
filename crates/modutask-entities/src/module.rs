//! Module entity: an indivisible resource with battery and wear, owned by
//! at most one robot (SPEC_FULL.md §3).

use modutask_core::{Coordinate, ModutaskError, ModutaskResult};
use serde::{Deserialize, Serialize};

use crate::risk_scenario::RiskScenario;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleState {
    Active,
    Error,
}

/// Immutable module declaration. Identity is the name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleType {
    pub name: String,
    pub max_battery: f64,
}

impl ModuleType {
    pub fn new(name: impl Into<String>, max_battery: f64) -> Self {
        Self {
            name: name.into(),
            max_battery,
        }
    }
}

/// A physical module: typed, named, positioned, with battery and wear.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub module_type: ModuleType,
    coordinate: Coordinate,
    battery: f64,
    operating_time: f64,
    state: ModuleState,
}

impl Module {
    pub fn new(
        name: impl Into<String>,
        module_type: ModuleType,
        coordinate: Coordinate,
        battery: f64,
        operating_time: f64,
        state: ModuleState,
    ) -> ModutaskResult<Self> {
        if battery < 0.0 || battery > module_type.max_battery {
            return Err(ModutaskError::Validation(format!(
                "module '{}' battery {} out of range [0, {}]",
                name.into(),
                battery,
                module_type.max_battery
            )));
        }
        if operating_time < 0.0 {
            return Err(ModutaskError::Validation(format!(
                "module '{}' has negative operating_time",
                name.into()
            )));
        }
        Ok(Self {
            name: name.into(),
            module_type,
            coordinate,
            battery,
            operating_time,
            state,
        })
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn battery(&self) -> f64 {
        self.battery
    }

    pub fn operating_time(&self) -> f64 {
        self.operating_time
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ModuleState::Active
    }

    /// Set battery. Errors if the module is in ERROR state (§3 invariant:
    /// an ERROR module's battery must not be mutated) or the value is out
    /// of range.
    pub fn set_battery(&mut self, value: f64) -> ModutaskResult<()> {
        if self.state == ModuleState::Error {
            return Err(ModutaskError::invariant(
                &self.name,
                "cannot mutate battery of an ERROR module",
            ));
        }
        if value < 0.0 || value > self.module_type.max_battery {
            return Err(ModutaskError::invariant(
                &self.name,
                format!(
                    "battery {} out of range [0, {}]",
                    value, self.module_type.max_battery
                ),
            ));
        }
        self.battery = value;
        Ok(())
    }

    /// Set operating_time. Errors if the module is ERROR, the value is
    /// negative, or the value would decrease (monotonicity, §8).
    pub fn set_operating_time(&mut self, value: f64) -> ModutaskResult<()> {
        if self.state == ModuleState::Error {
            return Err(ModutaskError::invariant(
                &self.name,
                "cannot mutate operating_time of an ERROR module",
            ));
        }
        if value < 0.0 {
            return Err(ModutaskError::invariant(
                &self.name,
                "operating_time cannot be negative",
            ));
        }
        if value < self.operating_time {
            return Err(ModutaskError::invariant(
                &self.name,
                "operating_time must be monotone non-decreasing",
            ));
        }
        self.operating_time = value;
        Ok(())
    }

    pub fn set_coordinate(&mut self, coordinate: Coordinate) {
        self.coordinate = coordinate;
    }

    /// Recompute state against the given scenarios: the first scenario
    /// that reports failure wins and the module becomes ERROR; otherwise
    /// it is (re)set to ACTIVE. A module already ERROR stays ERROR.
    pub fn update_state(&mut self, scenarios: &mut [Box<dyn RiskScenario>]) {
        if self.state == ModuleState::Error {
            return;
        }
        for scenario in scenarios.iter_mut() {
            if scenario.malfunction_module(self) {
                self.state = ModuleState::Error;
                return;
            }
        }
        self.state = ModuleState::Active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module_type() -> ModuleType {
        ModuleType::new("battery_pack", 10.0)
    }

    #[test]
    fn construction_rejects_out_of_range_battery() {
        let err = Module::new(
            "m1",
            module_type(),
            Coordinate::new(0.0, 0.0),
            20.0,
            0.0,
            ModuleState::Active,
        );
        assert!(err.is_err());
    }

    #[test]
    fn error_module_rejects_battery_mutation() {
        let mut m = Module::new(
            "m1",
            module_type(),
            Coordinate::new(0.0, 0.0),
            5.0,
            0.0,
            ModuleState::Error,
        )
        .unwrap();
        assert!(m.set_battery(1.0).is_err());
    }

    #[test]
    fn operating_time_cannot_decrease() {
        let mut m = Module::new(
            "m1",
            module_type(),
            Coordinate::new(0.0, 0.0),
            5.0,
            5.0,
            ModuleState::Active,
        )
        .unwrap();
        assert!(m.set_operating_time(3.0).is_err());
        assert!(m.set_operating_time(6.0).is_ok());
    }
}
