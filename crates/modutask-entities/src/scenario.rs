//! The scenario aggregate: every entity arena plus the deep-clone
//! operation the optimizer relies on to evaluate independent candidates
//! without cross-contaminating state (SPEC_FULL.md §3/§8, grounded on
//! `original_source/modutask/io/clone.py`).

use indexmap::IndexMap;

use crate::map::SimulationMap;
use crate::module::{Module, ModuleType};
use crate::risk_scenario::RiskScenario;
use crate::robot::{Robot, RobotType};
use crate::task::Task;

pub struct Scenario {
    pub module_types: IndexMap<String, ModuleType>,
    pub modules: IndexMap<String, Module>,
    pub robot_types: IndexMap<String, RobotType>,
    pub robots: IndexMap<String, Robot>,
    /// Catalog (Base) tasks plus generated Assembly/TransportModule tasks
    /// (Combined). `Task::is_generated` tells the two apart, so no
    /// separate bookkeeping of which is which is needed.
    pub tasks: IndexMap<String, Task>,
    pub risk_scenarios: IndexMap<String, Box<dyn RiskScenario>>,
    pub map: SimulationMap,
}

impl Scenario {
    pub fn new(
        module_types: IndexMap<String, ModuleType>,
        modules: IndexMap<String, Module>,
        robot_types: IndexMap<String, RobotType>,
        robots: IndexMap<String, Robot>,
        tasks: IndexMap<String, Task>,
        risk_scenarios: IndexMap<String, Box<dyn RiskScenario>>,
        map: SimulationMap,
    ) -> Self {
        Self {
            module_types,
            modules,
            robot_types,
            robots,
            tasks,
            risk_scenarios,
            map,
        }
    }

    /// Deep-clones the whole scenario so that mutating the clone (running
    /// a simulation step on it) can never touch `self`.
    ///
    /// Most task variants are plain-data clones: their fields are either
    /// scalars or entity *names*, so a structural copy carries no live
    /// references back into `self`. Assembly tasks are the one exception
    /// — they are always regenerated against the freshly cloned robot's
    /// *current* missing-component count, mirroring how the reference
    /// implementation's `Assembly.__init__` recomputes `total_workload`
    /// from scratch on every reconstruction rather than preserving a
    /// stale snapshot.
    pub fn clone_deep(&self) -> Self {
        let module_types = self.module_types.clone();
        let robot_types = self.robot_types.clone();
        let modules = self.modules.clone();

        let mut robots = IndexMap::new();
        for (name, robot) in &self.robots {
            let cloned = Robot::new(
                name.clone(),
                robot.robot_type.clone(),
                robot.coordinate(),
                robot.component_required().to_vec(),
                robot.task_priority.clone(),
                &modules,
            )
            .expect("cloned robot preserves the validity of its source");
            robots.insert(name.clone(), cloned);
        }

        let mut tasks = IndexMap::new();
        for (name, task) in &self.tasks {
            let cloned = match task {
                Task::Assembly(assembly) => {
                    let robot = &robots[assembly.target_robot()];
                    Task::new_assembly(name.clone(), robot, task.dependencies().to_vec())
                        .expect("assembly regeneration preserves validity")
                }
                other => other.clone(),
            };
            tasks.insert(name.clone(), cloned);
        }

        let risk_scenarios = self
            .risk_scenarios
            .iter()
            .map(|(name, scenario)| (name.clone(), scenario.clone_boxed()))
            .collect();

        Scenario {
            module_types,
            robot_types,
            modules,
            robots,
            tasks,
            risk_scenarios,
            map: self.map.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleState;
    use crate::performance::PerformanceAttribute;
    use crate::risk_scenario::ExponentialOperatingTime;
    use modutask_core::Coordinate;
    use std::collections::HashMap;

    fn scenario_with_one_robot_and_task() -> Scenario {
        let module_type = ModuleType::new("battery_pack", 10.0);
        let mut module_types = IndexMap::new();
        module_types.insert("battery_pack".to_string(), module_type.clone());

        let mut modules = IndexMap::new();
        modules.insert(
            "m1".to_string(),
            Module::new("m1", module_type, Coordinate::new(0.0, 0.0), 10.0, 0.0, ModuleState::Active).unwrap(),
        );

        let mut required = IndexMap::new();
        required.insert("battery_pack".to_string(), 1);
        let robot_type = RobotType {
            name: "hauler".to_string(),
            required_modules: required,
            performance: HashMap::from([(PerformanceAttribute::Mobility, 2.0)]),
            power_consumption: 0.0,
            recharge_trigger: 0.0,
        };
        let mut robot_types = IndexMap::new();
        robot_types.insert("hauler".to_string(), robot_type.clone());

        let mut robots = IndexMap::new();
        robots.insert(
            "r1".to_string(),
            Robot::new("r1", robot_type, Coordinate::new(0.0, 0.0), vec!["m1".to_string()], vec![], &modules)
                .unwrap(),
        );

        let mut tasks = IndexMap::new();
        tasks.insert(
            "assemble_r1".to_string(),
            Task::new_assembly("assemble_r1", &robots["r1"], Vec::new()).unwrap(),
        );

        let mut risk_scenarios: IndexMap<String, Box<dyn RiskScenario>> = IndexMap::new();
        risk_scenarios.insert(
            "wear".to_string(),
            Box::new(ExponentialOperatingTime::new("wear", 1, 1000.0)),
        );

        Scenario::new(
            module_types,
            modules,
            robot_types,
            robots,
            tasks,
            risk_scenarios,
            SimulationMap::default(),
        )
    }

    #[test]
    fn clone_is_independent_of_origin() {
        let scenario = scenario_with_one_robot_and_task();
        let mut clone = scenario.clone_deep();

        clone.modules.get_mut("m1").unwrap().set_battery(0.0).unwrap();
        assert_eq!(scenario.modules["m1"].battery(), 10.0);

        clone.tasks.remove("assemble_r1");
        assert!(scenario.tasks.contains_key("assemble_r1"));
    }

    #[test]
    fn assembly_tasks_are_regenerated_not_copied() {
        let scenario = scenario_with_one_robot_and_task();
        let clone = scenario.clone_deep();
        match &clone.tasks["assemble_r1"] {
            Task::Assembly(a) => assert_eq!(a.target_robot(), "r1"),
            _ => panic!("expected an assembly task"),
        }
    }
}
