//! Catalog documents to a runnable `Scenario`, plus combined-task-set
//! generation and task-priority validation. Grounded on
//! `original_source/simulation_launcher.py`'s `main` load order
//! (module_types → modules → robot_types → robots → tasks → dependencies
//! → risk scenarios → map) and its `add_assembly_task`/
//! `permutation_of_tasks` helpers.

use std::collections::HashSet;

use indexmap::IndexMap;
use modutask_core::{Coordinate, ModutaskError, ModutaskResult};
use modutask_entities::{
    ChargeStation, ExponentialOperatingTime, Module, ModuleType, PerformanceAttribute, RiskScenario, Robot,
    RobotType, Scenario, SimulationMap, Task, TimeSigmoid,
};

use crate::catalogs::{Catalogs, RiskScenarioEntry, TaskEntry, TaskPriorityCatalog};

fn build_module_types(catalogs: &Catalogs) -> IndexMap<String, ModuleType> {
    catalogs
        .module_types
        .iter()
        .map(|(name, entry)| (name.clone(), ModuleType::new(name, entry.max_battery)))
        .collect()
}

fn build_modules(
    catalogs: &Catalogs,
    module_types: &IndexMap<String, ModuleType>,
) -> ModutaskResult<IndexMap<String, Module>> {
    catalogs
        .modules
        .iter()
        .map(|(name, entry)| {
            let module_type = module_types
                .get(&entry.module_type)
                .cloned()
                .ok_or_else(|| ModutaskError::Validation(format!("module '{name}' references unknown module_type '{}'", entry.module_type)))?;
            let module = Module::new(
                name,
                module_type,
                Coordinate::new(entry.coordinate[0], entry.coordinate[1]),
                entry.battery,
                entry.operating_time,
                entry.state,
            )?;
            Ok((name.clone(), module))
        })
        .collect()
}

fn build_robot_types(catalogs: &Catalogs) -> IndexMap<String, RobotType> {
    catalogs
        .robot_types
        .iter()
        .map(|(name, entry)| {
            (
                name.clone(),
                RobotType {
                    name: name.clone(),
                    required_modules: entry.required_modules.clone(),
                    performance: entry.performance.clone(),
                    power_consumption: entry.power_consumption,
                    recharge_trigger: entry.recharge_trigger,
                },
            )
        })
        .collect()
}

fn build_robots(
    catalogs: &Catalogs,
    robot_types: &IndexMap<String, RobotType>,
    modules: &IndexMap<String, Module>,
) -> ModutaskResult<IndexMap<String, Robot>> {
    catalogs
        .robots
        .iter()
        .map(|(name, entry)| {
            let robot_type = robot_types
                .get(&entry.robot_type)
                .cloned()
                .ok_or_else(|| ModutaskError::Validation(format!("robot '{name}' references unknown robot_type '{}'", entry.robot_type)))?;
            let robot = Robot::new(
                name,
                robot_type,
                Coordinate::new(entry.coordinate[0], entry.coordinate[1]),
                entry.component.clone(),
                entry.task_priority.clone(),
                modules,
            )?;
            Ok((name.clone(), robot))
        })
        .collect()
}

fn build_base_tasks(catalogs: &Catalogs) -> ModutaskResult<IndexMap<String, Task>> {
    catalogs
        .tasks
        .iter()
        .map(|(name, entry)| {
            let dependencies = catalogs.task_dependencies.get(name).cloned().unwrap_or_default();
            let task = match entry {
                TaskEntry::Transport {
                    origin,
                    destination,
                    resistance,
                    required_performance,
                    completed_workload,
                } => Task::new_transport(
                    name,
                    required_performance.clone(),
                    Coordinate::new(origin[0], origin[1]),
                    Coordinate::new(destination[0], destination[1]),
                    *resistance,
                    *completed_workload,
                    dependencies,
                )?,
                TaskEntry::Manufacture {
                    coordinate,
                    total_workload,
                    completed_workload,
                    required_performance,
                } => Task::new_manufacture(
                    name,
                    Coordinate::new(coordinate[0], coordinate[1]),
                    *total_workload,
                    *completed_workload,
                    required_performance.clone(),
                    dependencies,
                )?,
            };
            Ok((name.clone(), task))
        })
        .collect()
}

fn build_risk_scenarios(catalogs: &Catalogs) -> IndexMap<String, Box<dyn RiskScenario>> {
    catalogs
        .risk_scenarios
        .iter()
        .map(|(name, entry)| {
            let scenario: Box<dyn RiskScenario> = match entry {
                RiskScenarioEntry::ExponentialOperatingTime { seed, mean_life } => {
                    Box::new(ExponentialOperatingTime::new(name, *seed, *mean_life))
                }
                RiskScenarioEntry::TimeSigmoid { seed, sharpness, limit } => {
                    Box::new(TimeSigmoid::new(name, *seed, *sharpness, *limit))
                }
            };
            (name.clone(), scenario)
        })
        .collect()
}

fn build_map(catalogs: &Catalogs) -> SimulationMap {
    let stations = catalogs
        .map
        .iter()
        .map(|(name, entry)| {
            (
                name.clone(),
                ChargeStation::new(name, Coordinate::new(entry.coordinate[0], entry.coordinate[1]), entry.charging_speed),
            )
        })
        .collect();
    SimulationMap::new(stations)
}

/// Builds the base scenario: every catalog-declared entity, with base
/// (Transport/Manufacture) tasks only. Call [`add_assembly_tasks`]
/// afterwards to populate the combined task set.
pub fn build_scenario(catalogs: &Catalogs) -> ModutaskResult<Scenario> {
    let module_types = build_module_types(catalogs);
    let modules = build_modules(catalogs, &module_types)?;
    let robot_types = build_robot_types(catalogs);
    let robots = build_robots(catalogs, &robot_types, &modules)?;
    let tasks = build_base_tasks(catalogs)?;
    let risk_scenarios = build_risk_scenarios(catalogs);
    let map = build_map(catalogs);
    Ok(Scenario::new(module_types, modules, robot_types, robots, tasks, risk_scenarios, map))
}

/// Equivalent of `add_assembly_task`: for every robot missing modules,
/// synthesizes a TransportModule task per missing module (named
/// `transport_{robot}_{module}`) and, if it has any, an Assembly task
/// (`assembly_{robot}`) depending on every one of those transports. Added
/// on top of `base_tasks`, never mutating it.
pub fn add_assembly_tasks(
    base_tasks: &IndexMap<String, Task>,
    robots: &IndexMap<String, Robot>,
    modules: &IndexMap<String, Module>,
) -> ModutaskResult<IndexMap<String, Task>> {
    let mut combined = base_tasks.clone();
    for (robot_name, robot) in robots {
        let mut dependency_names = Vec::new();
        for module_name in robot.missing_components() {
            let module = modules
                .get(&module_name)
                .ok_or_else(|| ModutaskError::module_not_found(module_name.clone()))?;
            let transport_name = format!("transport_{robot_name}_{module_name}");
            let mut required_performance = std::collections::HashMap::new();
            required_performance.insert(PerformanceAttribute::Transport, 1.0);
            let transport = Task::new_transport_module(transport_name.clone(), required_performance, module, robot, 1.0)?;
            combined.insert(transport_name.clone(), transport);
            dependency_names.push(transport_name);
        }
        if !dependency_names.is_empty() {
            let assembly_name = format!("assembly_{robot_name}");
            let assembly = Task::new_assembly(assembly_name.clone(), robot, dependency_names)?;
            combined.insert(assembly_name, assembly);
        }
    }
    Ok(combined)
}

/// Equivalent of `permutation_of_tasks`: every robot must have an entry in
/// `task_priority` that is exactly a permutation of the combined task
/// set's names (same multiset, no extras, no omissions).
pub fn validate_task_priority(
    task_priority: &TaskPriorityCatalog,
    robots: &IndexMap<String, Robot>,
    tasks: &IndexMap<String, Task>,
) -> ModutaskResult<()> {
    let all_task_names: HashSet<&str> = tasks.keys().map(String::as_str).collect();
    for robot_name in robots.keys() {
        let Some(ordering) = task_priority.get(robot_name) else {
            return Err(ModutaskError::Validation(format!(
                "robot '{robot_name}' is missing from task_priority"
            )));
        };
        let ordering_set: HashSet<&str> = ordering.iter().map(String::as_str).collect();
        if ordering_set != all_task_names || ordering.len() != tasks.len() {
            return Err(ModutaskError::Validation(format!(
                "task_priority for robot '{robot_name}' is not a permutation of the combined task set"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogs::{
        ChargeStationEntry, MapCatalog, ModuleCatalog, ModuleEntry, ModuleTypeCatalog, ModuleTypeEntry, RiskScenarioCatalog,
        RobotCatalog, RobotEntry, RobotTypeCatalog, RobotTypeEntry, TaskCatalog, TaskDependencyCatalog,
    };
    use modutask_entities::ModuleState;
    use std::collections::HashMap;

    fn catalogs_with_incomplete_robot() -> Catalogs {
        let mut module_types: ModuleTypeCatalog = IndexMap::new();
        module_types.insert("battery_pack".to_string(), ModuleTypeEntry { max_battery: 10.0 });

        let mut modules: ModuleCatalog = IndexMap::new();
        modules.insert(
            "m1".to_string(),
            ModuleEntry {
                module_type: "battery_pack".to_string(),
                coordinate: [5.0, 0.0],
                battery: 10.0,
                operating_time: 0.0,
                state: ModuleState::Active,
            },
        );

        let mut robot_types: RobotTypeCatalog = IndexMap::new();
        robot_types.insert(
            "hauler".to_string(),
            RobotTypeEntry {
                required_modules: IndexMap::from([("battery_pack".to_string(), 1)]),
                performance: HashMap::new(),
                power_consumption: 0.0,
                recharge_trigger: 0.0,
            },
        );

        let mut robots: RobotCatalog = IndexMap::new();
        robots.insert(
            "r1".to_string(),
            RobotEntry {
                robot_type: "hauler".to_string(),
                coordinate: [0.0, 0.0],
                component: vec!["m1".to_string()],
                task_priority: Vec::new(),
            },
        );

        Catalogs {
            module_types,
            modules,
            robot_types,
            robots,
            tasks: TaskCatalog::new(),
            task_dependencies: TaskDependencyCatalog::new(),
            risk_scenarios: RiskScenarioCatalog::new(),
            map: MapCatalog::new(),
            task_priority: None,
        }
    }

    #[test]
    fn build_scenario_produces_robot_with_unmounted_module() {
        let catalogs = catalogs_with_incomplete_robot();
        let scenario = build_scenario(&catalogs).unwrap();
        assert_eq!(scenario.robots["r1"].missing_components(), vec!["m1".to_string()]);
    }

    #[test]
    fn add_assembly_tasks_wires_transport_as_assembly_dependency() {
        let catalogs = catalogs_with_incomplete_robot();
        let scenario = build_scenario(&catalogs).unwrap();
        let combined = add_assembly_tasks(&scenario.tasks, &scenario.robots, &scenario.modules).unwrap();

        assert!(combined.contains_key("transport_r1_m1"));
        let assembly = &combined["assembly_r1"];
        assert_eq!(assembly.dependencies(), &["transport_r1_m1".to_string()]);
    }

    #[test]
    fn fully_assembled_robot_gets_no_assembly_task() {
        let mut catalogs = catalogs_with_incomplete_robot();
        catalogs.modules.get_mut("m1").unwrap().coordinate = [0.0, 0.0];
        let scenario = build_scenario(&catalogs).unwrap();
        let combined = add_assembly_tasks(&scenario.tasks, &scenario.robots, &scenario.modules).unwrap();
        assert!(!combined.contains_key("assembly_r1"));
        assert!(!combined.contains_key("transport_r1_m1"));
    }

    #[test]
    fn validate_task_priority_rejects_missing_robot() {
        let catalogs = catalogs_with_incomplete_robot();
        let scenario = build_scenario(&catalogs).unwrap();
        let combined = add_assembly_tasks(&scenario.tasks, &scenario.robots, &scenario.modules).unwrap();
        let task_priority: TaskPriorityCatalog = IndexMap::new();
        assert!(validate_task_priority(&task_priority, &scenario.robots, &combined).is_err());
    }

    #[test]
    fn validate_task_priority_accepts_exact_permutation() {
        let catalogs = catalogs_with_incomplete_robot();
        let scenario = build_scenario(&catalogs).unwrap();
        let combined = add_assembly_tasks(&scenario.tasks, &scenario.robots, &scenario.modules).unwrap();
        let mut task_priority: TaskPriorityCatalog = IndexMap::new();
        task_priority.insert("r1".to_string(), combined.keys().cloned().collect());
        assert!(validate_task_priority(&task_priority, &scenario.robots, &combined).is_ok());
    }
}
