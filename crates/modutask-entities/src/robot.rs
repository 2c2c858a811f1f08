//! Robot entity and its derived state (SPEC_FULL.md §3/§4.1).
//!
//! A `Robot` does not own its modules directly — it holds the *names* of
//! the modules that constitute it (`component_required`) and the subset
//! currently attached (`component_mounted`, kept in mounting order). Every
//! operation that touches module state takes the module arena explicitly,
//! mirroring how the reference stack's entities resolve other entities by
//! id through the owning `World` rather than holding direct references.

use std::collections::HashMap;

use indexmap::IndexMap;
use modutask_core::{Coordinate, ModutaskError, ModutaskResult};
use serde::{Deserialize, Serialize};

use crate::module::{Module, ModuleState, ModuleType};
use crate::performance::PerformanceAttribute;
use crate::risk_scenario::RiskScenario;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RobotState {
    Active,
    NoEnergy,
    Defective,
}

/// Immutable robot declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotType {
    pub name: String,
    /// Required module count per module-type name.
    pub required_modules: IndexMap<String, usize>,
    pub performance: HashMap<PerformanceAttribute, f64>,
    pub power_consumption: f64,
    pub recharge_trigger: f64,
}

impl RobotType {
    pub fn performance_of(&self, attr: PerformanceAttribute) -> f64 {
        self.performance.get(&attr).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone)]
pub struct Robot {
    pub name: String,
    pub robot_type: RobotType,
    coordinate: Coordinate,
    /// The fixed multiset of module names that constitute this robot.
    component_required: Vec<String>,
    /// Subset of `component_required` currently attached, in mounting
    /// order (oldest-mounted first). Draining happens in reverse order,
    /// charging in forward order (§4.1).
    component_mounted: Vec<String>,
    state: RobotState,
    pub task_priority: Vec<String>,
}

impl Robot {
    /// Construct a robot, validating that `component_required` matches
    /// the robot type's declared multiset by module type, then computing
    /// initial mounted set and state from the module arena.
    pub fn new(
        name: impl Into<String>,
        robot_type: RobotType,
        coordinate: Coordinate,
        component_required: Vec<String>,
        task_priority: Vec<String>,
        modules: &IndexMap<String, Module>,
    ) -> ModutaskResult<Self> {
        let name = name.into();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for module_name in &component_required {
            let module = modules
                .get(module_name)
                .ok_or_else(|| ModutaskError::module_not_found(module_name.clone()))?;
            *counts.entry(module.module_type.name.as_str()).or_insert(0) += 1;
        }
        for (module_type_name, required_count) in &robot_type.required_modules {
            let actual = counts.get(module_type_name.as_str()).copied().unwrap_or(0);
            if actual != *required_count {
                return Err(ModutaskError::Validation(format!(
                    "robot '{}' requires {} module(s) of type '{}' but was given {}",
                    name, required_count, module_type_name, actual
                )));
            }
        }

        let mut robot = Robot {
            name,
            robot_type,
            coordinate,
            component_required,
            component_mounted: Vec::new(),
            state: RobotState::Active,
            task_priority,
        };
        robot.recompute_mounted(modules);
        robot.state = robot.derive_state(modules);
        Ok(robot)
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn state(&self) -> RobotState {
        self.state
    }

    pub fn component_required(&self) -> &[String] {
        &self.component_required
    }

    pub fn component_mounted(&self) -> &[String] {
        &self.component_mounted
    }

    /// required \ mounted by module identity.
    pub fn missing_components(&self) -> Vec<String> {
        self.component_required
            .iter()
            .filter(|name| !self.component_mounted.contains(name))
            .cloned()
            .collect()
    }

    pub fn total_battery(&self, modules: &IndexMap<String, Module>) -> f64 {
        self.component_mounted
            .iter()
            .filter_map(|name| modules.get(name))
            .map(Module::battery)
            .sum()
    }

    pub fn total_max_battery(&self, modules: &IndexMap<String, Module>) -> f64 {
        self.component_mounted
            .iter()
            .filter_map(|name| modules.get(name))
            .map(|m| m.module_type.max_battery)
            .sum()
    }

    /// Recompute `component_mounted` from scratch: a module is mounted
    /// only if it is one of `component_required`, its state is ACTIVE,
    /// and its coordinate coincides with the robot's. Mounting order
    /// within `component_required` is preserved.
    fn recompute_mounted(&mut self, modules: &IndexMap<String, Module>) {
        self.component_mounted = self
            .component_required
            .iter()
            .filter(|name| {
                modules
                    .get(name.as_str())
                    .map(|m| m.is_active() && m.coordinate().coincides_with(&self.coordinate))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
    }

    fn derive_state(&self, modules: &IndexMap<String, Module>) -> RobotState {
        let is_defective = self.component_mounted.len() < self.component_required.len();
        if is_defective {
            return RobotState::Defective;
        }
        if self.total_battery(modules) < self.robot_type.power_consumption {
            return RobotState::NoEnergy;
        }
        RobotState::Active
    }

    /// Subtract `power_consumption` from mounted modules in reverse
    /// mounting order, fully draining each before moving to the next.
    pub fn draw_battery_power(&self, modules: &mut IndexMap<String, Module>) -> ModutaskResult<()> {
        let total = self.total_battery(modules);
        if total < self.robot_type.power_consumption {
            return Err(ModutaskError::invariant(
                &self.name,
                "battery below power_consumption",
            ));
        }
        let mut remaining = self.robot_type.power_consumption;
        for module_name in self.component_mounted.iter().rev() {
            if remaining <= 0.0 {
                break;
            }
            let module = modules
                .get_mut(module_name)
                .ok_or_else(|| ModutaskError::module_not_found(module_name.clone()))?;
            let draw = remaining.min(module.battery());
            module.set_battery(module.battery() - draw)?;
            remaining -= draw;
        }
        Ok(())
    }

    /// Fill mounted modules in mounting order up to each module's cap.
    pub fn charge_battery_power(
        &self,
        speed: f64,
        modules: &mut IndexMap<String, Module>,
    ) -> ModutaskResult<()> {
        let mut remaining = speed;
        for module_name in &self.component_mounted {
            if remaining <= 0.0 {
                break;
            }
            let module = modules
                .get_mut(module_name)
                .ok_or_else(|| ModutaskError::module_not_found(module_name.clone()))?;
            let capacity = module.module_type.max_battery - module.battery();
            let fill = remaining.min(capacity);
            module.set_battery(module.battery() + fill)?;
            remaining -= fill;
        }
        Ok(())
    }

    /// Consume one step of power, then advance position by
    /// min(MOBILITY, distance-to-target); moves all mounted modules to
    /// the new coordinate.
    pub fn travel(
        &mut self,
        target: Coordinate,
        modules: &mut IndexMap<String, Module>,
    ) -> ModutaskResult<()> {
        self.draw_battery_power(modules)?;
        let mobility = self.robot_type.performance_of(PerformanceAttribute::Mobility);
        self.coordinate = self.coordinate.advance_toward(&target, mobility);
        self.sync_mounted_coordinates(modules);
        Ok(())
    }

    /// Consume one step of power and increment operating_time of each
    /// mounted module by 1.
    pub fn act(&self, modules: &mut IndexMap<String, Module>) -> ModutaskResult<()> {
        self.draw_battery_power(modules)?;
        for module_name in &self.component_mounted {
            let module = modules
                .get_mut(module_name)
                .ok_or_else(|| ModutaskError::module_not_found(module_name.clone()))?;
            let next = module.operating_time() + 1.0;
            module.set_operating_time(next)?;
        }
        Ok(())
    }

    fn sync_mounted_coordinates(&self, modules: &mut IndexMap<String, Module>) {
        for module_name in &self.component_mounted {
            if let Some(module) = modules.get_mut(module_name) {
                module.set_coordinate(self.coordinate);
            }
        }
    }

    pub fn set_coordinate(&mut self, coordinate: Coordinate, modules: &mut IndexMap<String, Module>) {
        self.coordinate = coordinate;
        self.sync_mounted_coordinates(modules);
    }

    /// Mount `module_name`: requires ACTIVE state, coordinate coincidence
    /// with the robot, and membership in `component_required`.
    pub fn mount_module(
        &mut self,
        module_name: &str,
        modules: &IndexMap<String, Module>,
    ) -> ModutaskResult<()> {
        if !self.component_required.iter().any(|n| n == module_name) {
            return Err(ModutaskError::invariant(
                &self.name,
                format!("'{module_name}' is not in this robot's required components"),
            ));
        }
        let module = modules
            .get(module_name)
            .ok_or_else(|| ModutaskError::module_not_found(module_name.to_string()))?;
        if !module.is_active() {
            return Err(ModutaskError::invariant(
                &self.name,
                format!("module '{module_name}' is not ACTIVE"),
            ));
        }
        if !module.coordinate().coincides_with(&self.coordinate) {
            return Err(ModutaskError::invariant(
                &self.name,
                format!("module '{module_name}' is not coincident with the robot"),
            ));
        }
        if !self.component_mounted.iter().any(|n| n == module_name) {
            self.component_mounted.push(module_name.to_string());
        }
        self.state = self.derive_state(modules);
        Ok(())
    }

    /// Recompute each mounted module's state via the scenarios, drop
    /// newly-ERROR modules from the mounted set, then recompute robot
    /// state.
    pub fn update_state(
        &mut self,
        scenarios: &mut [Box<dyn RiskScenario>],
        modules: &mut IndexMap<String, Module>,
    ) {
        for module_name in self.component_mounted.clone() {
            if let Some(module) = modules.get_mut(&module_name) {
                module.update_state(scenarios);
            }
        }
        self.recompute_mounted(modules);
        self.state = self.derive_state(modules);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn robot_type(power: f64, mobility: f64) -> RobotType {
        let mut required = IndexMap::new();
        required.insert("battery_pack".to_string(), 1);
        let mut performance = HashMap::new();
        performance.insert(PerformanceAttribute::Mobility, mobility);
        RobotType {
            name: "hauler".to_string(),
            required_modules: required,
            performance,
            power_consumption: power,
            recharge_trigger: 5.0,
        }
    }

    fn module_type() -> ModuleType {
        ModuleType::new("battery_pack", 10.0)
    }

    #[test]
    fn construction_validates_required_counts() {
        let mut modules = IndexMap::new();
        modules.insert(
            "m1".to_string(),
            Module::new(
                "m1",
                module_type(),
                Coordinate::new(0.0, 0.0),
                5.0,
                0.0,
                ModuleState::Active,
            )
            .unwrap(),
        );
        let robot = Robot::new(
            "r1",
            robot_type(1.0, 2.0),
            Coordinate::new(0.0, 0.0),
            vec!["m1".to_string()],
            vec![],
            &modules,
        )
        .unwrap();
        assert_eq!(robot.state(), RobotState::Active);
        assert_eq!(robot.component_mounted(), &["m1".to_string()]);
    }

    #[test]
    fn defective_takes_priority_over_no_energy() {
        // No modules installed at all -> mounted is empty, strictly less
        // than required (1) -> DEFECTIVE, even though total battery (0)
        // is also below power_consumption.
        let modules: IndexMap<String, Module> = IndexMap::new();
        let robot = Robot::new(
            "r1",
            robot_type(1.0, 2.0),
            Coordinate::new(0.0, 0.0),
            vec![],
            vec![],
            &modules,
        );
        // component_required is empty here since no modules were given,
        // but the RobotType requires 1 -> construction itself fails.
        assert!(robot.is_err());
    }

    #[test]
    fn no_energy_when_mounted_complete_but_underpowered() {
        let mut modules = IndexMap::new();
        modules.insert(
            "m1".to_string(),
            Module::new(
                "m1",
                module_type(),
                Coordinate::new(0.0, 0.0),
                0.5,
                0.0,
                ModuleState::Active,
            )
            .unwrap(),
        );
        let robot = Robot::new(
            "r1",
            robot_type(1.0, 2.0),
            Coordinate::new(0.0, 0.0),
            vec!["m1".to_string()],
            vec![],
            &modules,
        )
        .unwrap();
        assert_eq!(robot.state(), RobotState::NoEnergy);
    }

    #[test]
    fn travel_snaps_to_target_within_mobility() {
        let mut modules = IndexMap::new();
        modules.insert(
            "m1".to_string(),
            Module::new(
                "m1",
                module_type(),
                Coordinate::new(0.0, 0.0),
                10.0,
                0.0,
                ModuleState::Active,
            )
            .unwrap(),
        );
        let mut robot = Robot::new(
            "r1",
            robot_type(1.0, 5.0),
            Coordinate::new(0.0, 0.0),
            vec!["m1".to_string()],
            vec![],
            &modules,
        )
        .unwrap();
        robot.travel(Coordinate::new(3.0, 4.0), &mut modules).unwrap();
        assert_eq!(robot.coordinate(), Coordinate::new(3.0, 4.0));
        assert_eq!(modules["m1"].coordinate(), Coordinate::new(3.0, 4.0));
    }
}
