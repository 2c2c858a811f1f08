//! Result artifact export (SPEC_FULL.md §6): objective vectors per
//! individual as CSV, chosen robot fleets and end-of-run snapshots as
//! JSON. Directory handling follows `waremax-metrics/src/export.rs`'s
//! `write_exports` shape; row serialization uses the `csv` crate over
//! `serde`-derived structs rather than hand-formatted `writeln!`, per
//! the ambient stack.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use modutask_core::{ModutaskError, ModutaskResult};
use modutask_entities::{Module, Robot, Task};
use serde::Serialize;

fn io_err(path: &Path, source: impl std::error::Error) -> ModutaskError {
    ModutaskError::Serialization(format!("{}: {source}", path.display()))
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectiveRow {
    pub individual_id: usize,
    pub rank: usize,
    pub objectives: Vec<f64>,
}

/// One row per individual in a population, in iteration order.
pub fn write_objectives_csv(path: &Path, rows: &[ObjectiveRow]) -> ModutaskResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(ModutaskError::Io)?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(|e| io_err(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| io_err(path, e))?;
    }
    writer.flush().map_err(ModutaskError::Io)?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
struct RobotSnapshot {
    name: String,
    robot_type: String,
    coordinate: [f64; 2],
    component: Vec<String>,
}

/// Writes one chosen robot fleet under a templated per-configuration path,
/// e.g. `template.format(configuration_id)` in the reference
/// implementation. `path` is already resolved by the caller.
pub fn write_robot_fleet(path: &Path, robots: &[Robot]) -> ModutaskResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(ModutaskError::Io)?;
    }
    let snapshots: Vec<RobotSnapshot> = robots
        .iter()
        .map(|robot| RobotSnapshot {
            name: robot.name.clone(),
            robot_type: robot.robot_type.name.clone(),
            coordinate: [robot.coordinate().x, robot.coordinate().y],
            component: robot.component_required().to_vec(),
        })
        .collect();
    let json = serde_json::to_string_pretty(&snapshots).map_err(|e| ModutaskError::Serialization(e.to_string()))?;
    fs::write(path, json).map_err(ModutaskError::Io)?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
struct ModuleSnapshot {
    name: String,
    battery: f64,
    operating_time: f64,
    state: modutask_entities::ModuleState,
}

#[derive(Debug, Clone, Serialize)]
struct TaskSnapshot {
    name: String,
    total_workload: f64,
    completed_workload: f64,
}

#[derive(Debug, Clone, Serialize)]
struct EndOfRunSnapshot {
    modules: Vec<ModuleSnapshot>,
    tasks: Vec<TaskSnapshot>,
}

/// End-of-run module and task state, for post-hoc inspection of a
/// finished simulation.
pub fn write_end_of_run_snapshot(path: &Path, modules: &IndexMap<String, Module>, tasks: &IndexMap<String, Task>) -> ModutaskResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(ModutaskError::Io)?;
    }
    let snapshot = EndOfRunSnapshot {
        modules: modules
            .values()
            .map(|m| ModuleSnapshot {
                name: m.name.clone(),
                battery: m.battery(),
                operating_time: m.operating_time(),
                state: m.state(),
            })
            .collect(),
        tasks: tasks
            .values()
            .map(|t| TaskSnapshot {
                name: t.name().to_string(),
                total_workload: t.total_workload(),
                completed_workload: t.completed_workload(),
            })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&snapshot).map_err(|e| ModutaskError::Serialization(e.to_string()))?;
    fs::write(path, json).map_err(ModutaskError::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modutask_core::Coordinate;
    use modutask_entities::{ModuleState, ModuleType, PerformanceAttribute, RobotType};
    use std::collections::HashMap;

    #[test]
    fn objective_csv_round_trips_through_a_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("objectives.csv");
        let rows = vec![
            ObjectiveRow { individual_id: 0, rank: 0, objectives: vec![1.0, 2.0] },
            ObjectiveRow { individual_id: 1, rank: 1, objectives: vec![3.0, 4.0] },
        ];
        write_objectives_csv(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("individual_id"));
        assert!(content.contains("1.0") || content.contains("1"));
    }

    #[test]
    fn robot_fleet_snapshot_writes_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("robots_000.json");

        let module_type = ModuleType::new("battery_pack", 10.0);
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
            performance: HashMap::from([(PerformanceAttribute::Mobility, 1.0)]),
            power_consumption: 0.0,
            recharge_trigger: 0.0,
        };
        let robot = Robot::new("r1", robot_type, Coordinate::new(0.0, 0.0), vec!["m1".to_string()], vec![], &modules).unwrap();

        write_robot_fleet(&path, &[robot]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[0]["name"], "r1");
    }
}
