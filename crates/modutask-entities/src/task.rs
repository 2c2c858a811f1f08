//! Task entity: a sum type over the five kinds of work a robot fleet can
//! perform (SPEC_FULL.md §3/§4.2).
//!
//! Every variant shares a `TaskHeader` (name, coordinate, workload,
//! required performance, dependencies by name, per-step assignment list)
//! and adds only what it needs. Dispatch on `update` is exhaustive on the
//! variant rather than going through a trait object, since the variant
//! set is closed and each arm's physics differs enough that a shared
//! `update()` signature would just become a pile of `Option` fields.

use std::collections::HashMap;

use indexmap::IndexMap;
use modutask_core::{Coordinate, ModutaskError, ModutaskResult};
use serde::{Deserialize, Serialize};

use crate::module::Module;
use crate::performance::PerformanceAttribute;
use crate::robot::{Robot, RobotState};

/// Selects which subset of a scenario's tasks a metric is computed over.
/// Combined includes the generated Assembly/TransportModule tasks on top
/// of the catalog-declared (Base) ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskSet {
    Base,
    Combined,
}

#[derive(Debug, Clone)]
pub struct TaskHeader {
    pub name: String,
    coordinate: Coordinate,
    total_workload: f64,
    completed_workload: f64,
    required_performance: HashMap<PerformanceAttribute, f64>,
    dependencies: Vec<String>,
    assigned_robots: Vec<String>,
}

impl TaskHeader {
    fn new(
        name: impl Into<String>,
        coordinate: Coordinate,
        total_workload: f64,
        completed_workload: f64,
        required_performance: HashMap<PerformanceAttribute, f64>,
        dependencies: Vec<String>,
    ) -> ModutaskResult<Self> {
        let name = name.into();
        if total_workload < 0.0 {
            return Err(ModutaskError::Validation(format!(
                "task '{name}' total_workload must be non-negative"
            )));
        }
        if completed_workload < 0.0 || completed_workload > total_workload {
            return Err(ModutaskError::Validation(format!(
                "task '{name}' completed_workload {completed_workload} out of range [0, {total_workload}]"
            )));
        }
        Ok(Self {
            name,
            coordinate,
            total_workload,
            completed_workload,
            required_performance,
            dependencies,
            assigned_robots: Vec::new(),
        })
    }

    fn is_fully_progressed(&self) -> bool {
        self.completed_workload >= self.total_workload
    }
}

#[derive(Debug, Clone)]
pub struct TransportTask {
    header: TaskHeader,
    origin: Coordinate,
    destination: Coordinate,
    resistance: f64,
}

#[derive(Debug, Clone)]
pub struct ManufactureTask {
    header: TaskHeader,
}

#[derive(Debug, Clone)]
pub struct AssemblyTask {
    header: TaskHeader,
    target_robot: String,
}

#[derive(Debug, Clone)]
pub struct TransportModuleTask {
    transport: TransportTask,
    target_module: String,
}

#[derive(Debug, Clone)]
pub struct ChargeTask {
    header: TaskHeader,
    charging_speed: f64,
}

#[derive(Debug, Clone)]
pub enum Task {
    Transport(TransportTask),
    Manufacture(ManufactureTask),
    Assembly(AssemblyTask),
    TransportModule(TransportModuleTask),
    Charge(ChargeTask),
}

impl Task {
    pub fn new_transport(
        name: impl Into<String>,
        required_performance: HashMap<PerformanceAttribute, f64>,
        origin: Coordinate,
        destination: Coordinate,
        resistance: f64,
        completed_workload: f64,
        dependencies: Vec<String>,
    ) -> ModutaskResult<Self> {
        let name = name.into();
        if resistance < 1.0 {
            return Err(ModutaskError::Validation(format!(
                "task '{name}' resistance must be >= 1.0"
            )));
        }
        let total_workload = resistance * origin.distance(&destination);
        let header = TaskHeader::new(
            name,
            origin,
            total_workload,
            completed_workload,
            required_performance,
            dependencies,
        )?;
        Ok(Task::Transport(TransportTask {
            header,
            origin,
            destination,
            resistance,
        }))
    }

    pub fn new_manufacture(
        name: impl Into<String>,
        coordinate: Coordinate,
        total_workload: f64,
        completed_workload: f64,
        required_performance: HashMap<PerformanceAttribute, f64>,
        dependencies: Vec<String>,
    ) -> ModutaskResult<Self> {
        let header = TaskHeader::new(
            name,
            coordinate,
            total_workload,
            completed_workload,
            required_performance,
            dependencies,
        )?;
        Ok(Task::Manufacture(ManufactureTask { header }))
    }

    /// Builds a fresh assembly task for `robot`, sized to its current
    /// missing-component count. `dependencies` is normally the names of
    /// the TransportModule tasks ferrying those missing modules in,
    /// wired up by the combined-task-set loader; a bare robot assembling
    /// itself with no in-flight delivery needs none.
    pub fn new_assembly(
        name: impl Into<String>,
        robot: &Robot,
        dependencies: Vec<String>,
    ) -> ModutaskResult<Self> {
        let missing = robot.missing_components().len() as f64;
        let header = TaskHeader::new(
            name,
            robot.coordinate(),
            missing,
            0.0,
            HashMap::new(),
            dependencies,
        )?;
        Ok(Task::Assembly(AssemblyTask {
            header,
            target_robot: robot.name.clone(),
        }))
    }

    /// Builds a fresh module-transport task carrying `module` from its
    /// current position to `robot`'s, with zero progress. Regenerated
    /// from scratch on every clone, never deep-copied.
    pub fn new_transport_module(
        name: impl Into<String>,
        required_performance: HashMap<PerformanceAttribute, f64>,
        module: &Module,
        robot: &Robot,
        resistance: f64,
    ) -> ModutaskResult<Self> {
        let transport = match Task::new_transport(
            name,
            required_performance,
            module.coordinate(),
            robot.coordinate(),
            resistance,
            0.0,
            Vec::new(),
        )? {
            Task::Transport(t) => t,
            _ => unreachable!(),
        };
        Ok(Task::TransportModule(TransportModuleTask {
            transport,
            target_module: module.name.clone(),
        }))
    }

    pub fn new_charge(
        name: impl Into<String>,
        coordinate: Coordinate,
        charging_speed: f64,
    ) -> ModutaskResult<Self> {
        let header = TaskHeader::new(name, coordinate, 0.0, 0.0, HashMap::new(), Vec::new())?;
        Ok(Task::Charge(ChargeTask {
            header,
            charging_speed,
        }))
    }

    fn header(&self) -> &TaskHeader {
        match self {
            Task::Transport(t) => &t.header,
            Task::Manufacture(t) => &t.header,
            Task::Assembly(t) => &t.header,
            Task::TransportModule(t) => &t.transport.header,
            Task::Charge(t) => &t.header,
        }
    }

    fn header_mut(&mut self) -> &mut TaskHeader {
        match self {
            Task::Transport(t) => &mut t.header,
            Task::Manufacture(t) => &mut t.header,
            Task::Assembly(t) => &mut t.header,
            Task::TransportModule(t) => &mut t.transport.header,
            Task::Charge(t) => &mut t.header,
        }
    }

    pub fn name(&self) -> &str {
        &self.header().name
    }

    pub fn coordinate(&self) -> Coordinate {
        self.header().coordinate
    }

    pub fn total_workload(&self) -> f64 {
        self.header().total_workload
    }

    pub fn completed_workload(&self) -> f64 {
        self.header().completed_workload
    }

    pub fn dependencies(&self) -> &[String] {
        &self.header().dependencies
    }

    pub fn required_performance(&self) -> &HashMap<PerformanceAttribute, f64> {
        &self.header().required_performance
    }

    pub fn assigned_robots(&self) -> &[String] {
        &self.header().assigned_robots
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Task::Assembly(_) | Task::TransportModule(_))
    }

    pub fn is_completed(&self) -> bool {
        self.header().is_fully_progressed()
    }

    pub fn are_dependencies_completed(&self, tasks: &IndexMap<String, Task>) -> bool {
        self.dependencies()
            .iter()
            .all(|dep| tasks.get(dep).map(Task::is_completed).unwrap_or(true))
    }

    /// Sum of assigned robots' performance by attribute, compared against
    /// this task's requirement map.
    pub fn is_performance_satisfied(&self, robots: &IndexMap<String, Robot>) -> bool {
        total_performance_satisfied(self.header(), robots)
    }

    pub fn release_robots(&mut self) {
        self.header_mut().assigned_robots.clear();
    }

    /// Assign `robot` to this task. Requires the robot to be ACTIVE and
    /// coincident with the task's coordinate.
    pub fn assign_robot(&mut self, robot: &Robot) -> ModutaskResult<()> {
        if robot.state() != RobotState::Active {
            return Err(ModutaskError::invariant(
                self.name(),
                format!(
                    "robot '{}' in state {:?} cannot be assigned",
                    robot.name,
                    robot.state()
                ),
            ));
        }
        if !robot.coordinate().coincides_with(&self.coordinate()) {
            return Err(ModutaskError::invariant(
                self.name(),
                format!("robot '{}' is not coincident with the task", robot.name),
            ));
        }
        self.header_mut().assigned_robots.push(robot.name.clone());
        Ok(())
    }

    /// Runs one step of this task's physics. Returns whether any progress
    /// was made; callers mark the contributing agents WORK accordingly.
    /// The simulator only calls `update` on tasks whose dependencies have
    /// already been confirmed complete this step, so variants other than
    /// Transport/Manufacture don't re-check dependencies here.
    pub fn update(
        &mut self,
        robots: &mut IndexMap<String, Robot>,
        modules: &mut IndexMap<String, Module>,
    ) -> ModutaskResult<bool> {
        match self {
            Task::Transport(t) => t.update(robots, modules, None),
            Task::Manufacture(t) => t.update(robots, modules),
            Task::Assembly(t) => t.update(robots, modules),
            Task::TransportModule(t) => t.update(robots, modules),
            Task::Charge(t) => t.update(robots, modules),
        }
    }
}

fn total_performance_satisfied(header: &TaskHeader, robots: &IndexMap<String, Robot>) -> bool {
    let mut totals: HashMap<PerformanceAttribute, f64> = HashMap::new();
    for robot_name in &header.assigned_robots {
        if let Some(robot) = robots.get(robot_name) {
            for attr in PerformanceAttribute::ALL {
                *totals.entry(attr).or_insert(0.0) += robot.robot_type.performance_of(attr);
            }
        }
    }
    header
        .required_performance
        .iter()
        .all(|(attr, required)| totals.get(attr).copied().unwrap_or(0.0) >= *required)
}

impl TransportTask {
    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    pub fn destination(&self) -> Coordinate {
        self.destination
    }

    pub fn resistance(&self) -> f64 {
        self.resistance
    }

    /// Moves the task's carried position toward `destination` by the
    /// slowest assigned robot's mobility divided by resistance, then
    /// drags every assigned robot along to the new position. Optionally
    /// relocates `payload` (a carried module) to match.
    fn update(
        &mut self,
        robots: &mut IndexMap<String, Robot>,
        modules: &mut IndexMap<String, Module>,
        payload: Option<&str>,
    ) -> ModutaskResult<bool> {
        if self.header.assigned_robots.is_empty()
            || !total_performance_satisfied(&self.header, robots)
        {
            return Ok(false);
        }
        let mobility_values: Vec<f64> = self
            .header
            .assigned_robots
            .iter()
            .filter_map(|name| robots.get(name))
            .map(|r| r.robot_type.performance_of(PerformanceAttribute::Mobility))
            .collect();
        if mobility_values.is_empty() || mobility_values.iter().cloned().fold(0.0, f64::max) == 0.0 {
            return Ok(false);
        }
        let min_mobility = mobility_values.iter().cloned().fold(f64::INFINITY, f64::min);
        let adjusted = min_mobility / self.resistance;

        self.header.coordinate = self.header.coordinate.advance_toward(&self.destination, adjusted);
        for robot_name in self.header.assigned_robots.clone() {
            if let Some(robot) = robots.get_mut(&robot_name) {
                robot.draw_battery_power(modules)?;
                robot.set_coordinate(self.header.coordinate, modules);
            }
        }
        if let Some(module_name) = payload {
            if let Some(module) = modules.get_mut(module_name) {
                module.set_coordinate(self.header.coordinate);
            }
        }

        let remaining_distance = self.header.coordinate.distance(&self.destination);
        self.header.completed_workload =
            self.header.total_workload - remaining_distance * self.resistance;
        Ok(true)
    }
}

impl ManufactureTask {
    fn update(
        &mut self,
        robots: &mut IndexMap<String, Robot>,
        modules: &mut IndexMap<String, Module>,
    ) -> ModutaskResult<bool> {
        if self.header.is_fully_progressed() {
            return Ok(false);
        }
        if self.header.assigned_robots.is_empty() || !total_performance_satisfied(&self.header, robots) {
            return Ok(false);
        }
        for robot_name in self.header.assigned_robots.clone() {
            if let Some(robot) = robots.get(&robot_name) {
                robot.act(modules)?;
            }
        }
        self.header.completed_workload += 1.0;
        Ok(true)
    }
}

impl AssemblyTask {
    pub fn target_robot(&self) -> &str {
        &self.target_robot
    }

    /// Mounts the first missing component found coincident with the
    /// target robot, one module per step.
    fn update(
        &mut self,
        robots: &mut IndexMap<String, Robot>,
        modules: &mut IndexMap<String, Module>,
    ) -> ModutaskResult<bool> {
        if self.header.is_fully_progressed() {
            return Ok(false);
        }
        let robot = robots
            .get(&self.target_robot)
            .ok_or_else(|| ModutaskError::robot_not_found(self.target_robot.clone()))?;
        let coordinate = robot.coordinate();
        let missing = robot.missing_components();
        let mountable = missing.into_iter().find(|module_name| {
            modules
                .get(module_name)
                .map(|m| m.coordinate().coincides_with(&coordinate))
                .unwrap_or(false)
        });
        let Some(module_name) = mountable else {
            return Ok(false);
        };
        let robot = robots
            .get_mut(&self.target_robot)
            .ok_or_else(|| ModutaskError::robot_not_found(self.target_robot.clone()))?;
        robot.mount_module(&module_name, modules)?;
        self.header.completed_workload += 1.0;
        Ok(true)
    }
}

impl TransportModuleTask {
    pub fn target_module(&self) -> &str {
        &self.target_module
    }

    fn update(
        &mut self,
        robots: &mut IndexMap<String, Robot>,
        modules: &mut IndexMap<String, Module>,
    ) -> ModutaskResult<bool> {
        self.transport.update(robots, modules, Some(&self.target_module))
    }
}

impl ChargeTask {
    pub fn charging_speed(&self) -> f64 {
        self.charging_speed
    }

    fn update(
        &mut self,
        robots: &mut IndexMap<String, Robot>,
        modules: &mut IndexMap<String, Module>,
    ) -> ModutaskResult<bool> {
        for robot_name in self.header.assigned_robots.clone() {
            if let Some(robot) = robots.get(&robot_name) {
                robot.charge_battery_power(self.charging_speed, modules)?;
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ModuleState, ModuleType};
    use crate::robot::RobotType;
    use modutask_core::Coordinate;

    fn robot_type() -> RobotType {
        let mut required = IndexMap::new();
        required.insert("battery_pack".to_string(), 1);
        let mut performance = HashMap::new();
        performance.insert(PerformanceAttribute::Mobility, 2.0);
        performance.insert(PerformanceAttribute::Transport, 3.0);
        RobotType {
            name: "hauler".to_string(),
            required_modules: required,
            performance,
            power_consumption: 0.0,
            recharge_trigger: 0.0,
        }
    }

    fn module_type() -> ModuleType {
        ModuleType::new("battery_pack", 100.0)
    }

    fn robot_at(name: &str, coordinate: Coordinate, modules: &IndexMap<String, Module>) -> Robot {
        Robot::new(name, robot_type(), coordinate, vec!["m1".to_string()], vec![], modules).unwrap()
    }

    #[test]
    fn transport_total_workload_matches_distance_times_resistance() {
        let mut required = HashMap::new();
        required.insert(PerformanceAttribute::Transport, 1.0);
        let task = Task::new_transport(
            "haul",
            required,
            Coordinate::new(0.0, 0.0),
            Coordinate::new(3.0, 4.0),
            2.0,
            0.0,
            vec![],
        )
        .unwrap();
        assert_eq!(task.total_workload(), 10.0);
    }

    #[test]
    fn transport_update_advances_and_drags_robot() {
        let mut modules = IndexMap::new();
        modules.insert(
            "m1".to_string(),
            Module::new("m1", module_type(), Coordinate::new(0.0, 0.0), 100.0, 0.0, ModuleState::Active).unwrap(),
        );
        let mut robots = IndexMap::new();
        robots.insert("r1".to_string(), robot_at("r1", Coordinate::new(0.0, 0.0), &modules));

        let mut required = HashMap::new();
        required.insert(PerformanceAttribute::Transport, 1.0);
        let mut task = Task::new_transport(
            "haul",
            required,
            Coordinate::new(0.0, 0.0),
            Coordinate::new(10.0, 0.0),
            1.0,
            0.0,
            vec![],
        )
        .unwrap();
        task.assign_robot(robots.get("r1").unwrap()).unwrap();
        let progressed = task.update(&mut robots, &mut modules).unwrap();
        assert!(progressed);
        assert_eq!(robots["r1"].coordinate(), Coordinate::new(2.0, 0.0));
        assert_eq!(task.completed_workload(), 2.0);
    }

    #[test]
    fn transport_update_draws_battery_from_dragged_robot() {
        let mut modules = IndexMap::new();
        modules.insert(
            "m1".to_string(),
            Module::new("m1", module_type(), Coordinate::new(0.0, 0.0), 100.0, 0.0, ModuleState::Active).unwrap(),
        );
        let mut powered_type = robot_type();
        powered_type.power_consumption = 4.0;
        let mut robots = IndexMap::new();
        robots.insert(
            "r1".to_string(),
            Robot::new("r1", powered_type, Coordinate::new(0.0, 0.0), vec!["m1".to_string()], vec![], &modules).unwrap(),
        );

        let mut required = HashMap::new();
        required.insert(PerformanceAttribute::Transport, 1.0);
        let mut task = Task::new_transport(
            "haul",
            required,
            Coordinate::new(0.0, 0.0),
            Coordinate::new(10.0, 0.0),
            1.0,
            0.0,
            vec![],
        )
        .unwrap();
        task.assign_robot(robots.get("r1").unwrap()).unwrap();
        task.update(&mut robots, &mut modules).unwrap();
        assert_eq!(modules["m1"].battery(), 96.0);
    }

    #[test]
    fn manufacture_update_stops_at_full_progress() {
        let mut modules = IndexMap::new();
        modules.insert(
            "m1".to_string(),
            Module::new("m1", module_type(), Coordinate::new(0.0, 0.0), 100.0, 0.0, ModuleState::Active).unwrap(),
        );
        let mut robots = IndexMap::new();
        robots.insert("r1".to_string(), robot_at("r1", Coordinate::new(0.0, 0.0), &modules));

        let mut required = HashMap::new();
        required.insert(PerformanceAttribute::Transport, 1.0);
        let mut task =
            Task::new_manufacture("build", Coordinate::new(0.0, 0.0), 1.0, 0.0, required, vec![]).unwrap();
        task.assign_robot(robots.get("r1").unwrap()).unwrap();
        assert!(task.update(&mut robots, &mut modules).unwrap());
        assert_eq!(task.completed_workload(), 1.0);
        assert!(task.is_completed());

        task.assign_robot(robots.get("r1").unwrap()).unwrap();
        assert!(!task.update(&mut robots, &mut modules).unwrap());
        assert_eq!(task.completed_workload(), 1.0);
    }

    #[test]
    fn assembly_mounts_coincident_missing_module() {
        let mut modules = IndexMap::new();
        modules.insert(
            "m1".to_string(),
            Module::new("m1", module_type(), Coordinate::new(5.0, 5.0), 100.0, 0.0, ModuleState::Active).unwrap(),
        );
        let mut robots = IndexMap::new();
        robots.insert(
            "r1".to_string(),
            Robot::new(
                "r1",
                robot_type(),
                Coordinate::new(5.0, 5.0),
                vec!["m1".to_string()],
                vec![],
                &IndexMap::new(),
            )
            .unwrap(),
        );
        let mut task = Task::new_assembly("assemble_r1", &robots["r1"], Vec::new()).unwrap();
        assert_eq!(task.total_workload(), 1.0);
        let progressed = task.update(&mut robots, &mut modules).unwrap();
        assert!(progressed);
        assert!(task.is_completed());
        assert_eq!(robots["r1"].state(), RobotState::Active);
    }

    #[test]
    fn charge_fills_assigned_robot_battery() {
        let mut modules = IndexMap::new();
        modules.insert(
            "m1".to_string(),
            Module::new("m1", module_type(), Coordinate::new(0.0, 0.0), 10.0, 0.0, ModuleState::Active).unwrap(),
        );
        let mut robots = IndexMap::new();
        robots.insert("r1".to_string(), robot_at("r1", Coordinate::new(0.0, 0.0), &modules));
        let mut task = Task::new_charge("charge_r1", Coordinate::new(0.0, 0.0), 5.0).unwrap();
        task.assign_robot(robots.get("r1").unwrap()).unwrap();
        task.update(&mut robots, &mut modules).unwrap();
        assert_eq!(modules["m1"].battery(), 15.0);
    }

    #[test]
    fn assign_robot_rejects_noncoincident_robot() {
        let modules = IndexMap::new();
        let robot = robot_at("r1", Coordinate::new(1.0, 1.0), &modules);
        let mut task = Task::new_charge("charge_r1", Coordinate::new(0.0, 0.0), 5.0).unwrap();
        assert!(task.assign_robot(&robot).is_err());
    }
}
