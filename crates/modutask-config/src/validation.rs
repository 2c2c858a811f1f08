//! Collect-all catalog validation (SPEC_FULL.md §6/§7), mirroring
//! `waremax-config/src/validation.rs`'s `FieldPath`/`ValidationError`/
//! `ValidationErrorKind` shape. Every function appends to a shared `Vec`
//! rather than failing fast, so a catalog author sees every problem at
//! once.

use std::collections::HashMap;
use std::fmt;

use crate::catalogs::{Catalogs, TaskEntry};

#[derive(Debug, Clone)]
pub struct FieldPath(pub String);

impl FieldPath {
    pub fn new(path: &str) -> Self {
        Self(path.to_string())
    }

    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn field(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub path: FieldPath,
    pub kind: ValidationErrorKind,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(path: FieldPath, kind: ValidationErrorKind) -> Self {
        Self { path, kind, suggestion: None }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.path, self.kind)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum ValidationErrorKind {
    UnknownModuleType { module_type: String },
    UnknownModule { module: String },
    UnknownRobotType { robot_type: String },
    UnknownTask { task: String },
    CyclicDependency { cycle: Vec<String> },
    DuplicateModuleAcrossRobots { module: String, first_robot: String, second_robot: String },
    RequiredMultisetMismatch { robot: String, module_type: String, required: usize, actual: usize },
    ValueMustBeNonNegative { field: String, value: f64 },
    ValueMustBeAtLeast { field: String, value: f64, minimum: f64 },
    WorkloadOutOfRange { task: String, completed: f64, total: f64 },
    BatteryOverCap { module: String, battery: f64, max_battery: f64 },
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownModuleType { module_type } => write!(f, "unknown module_type '{module_type}'"),
            Self::UnknownModule { module } => write!(f, "unknown module '{module}'"),
            Self::UnknownRobotType { robot_type } => write!(f, "unknown robot_type '{robot_type}'"),
            Self::UnknownTask { task } => write!(f, "unknown task '{task}'"),
            Self::CyclicDependency { cycle } => write!(f, "cyclic task dependency: {}", cycle.join(" -> ")),
            Self::DuplicateModuleAcrossRobots { module, first_robot, second_robot } => write!(
                f,
                "module '{module}' is required by both '{first_robot}' and '{second_robot}'"
            ),
            Self::RequiredMultisetMismatch { robot, module_type, required, actual } => write!(
                f,
                "robot '{robot}' requires {required} module(s) of type '{module_type}' but lists {actual}"
            ),
            Self::ValueMustBeNonNegative { field, value } => write!(f, "{field} must be non-negative, got {value}"),
            Self::ValueMustBeAtLeast { field, value, minimum } => {
                write!(f, "{field} must be at least {minimum}, got {value}")
            }
            Self::WorkloadOutOfRange { task, completed, total } => write!(
                f,
                "task '{task}' has completed_workload {completed} outside [0, {total}]"
            ),
            Self::BatteryOverCap { module, battery, max_battery } => {
                write!(f, "module '{module}' battery {battery} exceeds max_battery {max_battery}")
            }
        }
    }
}

pub fn validate_catalogs(catalogs: &Catalogs) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    validate_modules(catalogs, &mut errors);
    validate_robots(catalogs, &mut errors);
    validate_tasks(catalogs, &mut errors);
    validate_task_dependencies(catalogs, &mut errors);
    errors
}

fn validate_modules(catalogs: &Catalogs, errors: &mut Vec<ValidationError>) {
    let root = FieldPath::new("module");
    for (name, module) in &catalogs.modules {
        let path = root.field(name);
        let Some(module_type) = catalogs.module_types.get(&module.module_type) else {
            errors.push(ValidationError::new(
                path.field("module_type"),
                ValidationErrorKind::UnknownModuleType { module_type: module.module_type.clone() },
            ));
            continue;
        };
        if module.battery < 0.0 || module.battery > module_type.max_battery {
            errors.push(ValidationError::new(
                path.field("battery"),
                ValidationErrorKind::BatteryOverCap {
                    module: name.clone(),
                    battery: module.battery,
                    max_battery: module_type.max_battery,
                },
            ));
        }
        if module.operating_time < 0.0 {
            errors.push(ValidationError::new(
                path.field("operating_time"),
                ValidationErrorKind::ValueMustBeNonNegative {
                    field: format!("module.{name}.operating_time"),
                    value: module.operating_time,
                },
            ));
        }
    }
}

fn validate_robots(catalogs: &Catalogs, errors: &mut Vec<ValidationError>) {
    let root = FieldPath::new("robot");
    let mut module_owner: HashMap<&str, &str> = HashMap::new();

    for (name, robot) in &catalogs.robots {
        let path = root.field(name);
        let Some(robot_type) = catalogs.robot_types.get(&robot.robot_type) else {
            errors.push(ValidationError::new(
                path.field("robot_type"),
                ValidationErrorKind::UnknownRobotType { robot_type: robot.robot_type.clone() },
            ));
            continue;
        };

        let mut actual_counts: HashMap<&str, usize> = HashMap::new();
        for module_name in &robot.component {
            let Some(module) = catalogs.modules.get(module_name) else {
                errors.push(ValidationError::new(
                    path.field("component"),
                    ValidationErrorKind::UnknownModule { module: module_name.clone() },
                ));
                continue;
            };
            *actual_counts.entry(module.module_type.as_str()).or_insert(0) += 1;

            if let Some(&first_owner) = module_owner.get(module_name.as_str()) {
                if first_owner != name {
                    errors.push(ValidationError::new(
                        path.field("component"),
                        ValidationErrorKind::DuplicateModuleAcrossRobots {
                            module: module_name.clone(),
                            first_robot: first_owner.to_string(),
                            second_robot: name.clone(),
                        },
                    ));
                }
            } else {
                module_owner.insert(module_name.as_str(), name.as_str());
            }
        }

        for (module_type_name, &required) in &robot_type.required_modules {
            let actual = actual_counts.get(module_type_name.as_str()).copied().unwrap_or(0);
            if actual != required {
                errors.push(ValidationError::new(
                    path.field("component"),
                    ValidationErrorKind::RequiredMultisetMismatch {
                        robot: name.clone(),
                        module_type: module_type_name.clone(),
                        required,
                        actual,
                    },
                ));
            }
        }
    }
}

fn validate_tasks(catalogs: &Catalogs, errors: &mut Vec<ValidationError>) {
    let root = FieldPath::new("task");
    for (name, task) in &catalogs.tasks {
        let path = root.field(name);
        match task {
            TaskEntry::Transport { resistance, completed_workload, destination, origin, .. } => {
                if *resistance < 1.0 {
                    errors.push(ValidationError::new(
                        path.field("resistance"),
                        ValidationErrorKind::ValueMustBeAtLeast {
                            field: format!("task.{name}.resistance"),
                            value: *resistance,
                            minimum: 1.0,
                        },
                    ));
                }
                let dx = destination[0] - origin[0];
                let dy = destination[1] - origin[1];
                let total_workload = resistance * (dx * dx + dy * dy).sqrt();
                if *completed_workload < 0.0 || *completed_workload > total_workload {
                    errors.push(ValidationError::new(
                        path.field("completed_workload"),
                        ValidationErrorKind::WorkloadOutOfRange {
                            task: name.clone(),
                            completed: *completed_workload,
                            total: total_workload,
                        },
                    ));
                }
            }
            TaskEntry::Manufacture { total_workload, completed_workload, .. } => {
                if *total_workload < 0.0 {
                    errors.push(ValidationError::new(
                        path.field("total_workload"),
                        ValidationErrorKind::ValueMustBeNonNegative {
                            field: format!("task.{name}.total_workload"),
                            value: *total_workload,
                        },
                    ));
                }
                if *completed_workload < 0.0 || *completed_workload > *total_workload {
                    errors.push(ValidationError::new(
                        path.field("completed_workload"),
                        ValidationErrorKind::WorkloadOutOfRange {
                            task: name.clone(),
                            completed: *completed_workload,
                            total: *total_workload,
                        },
                    ));
                }
            }
        }
    }
}

/// DFS-based cycle detection over the `dependency -> dependents` edges.
/// No graph crate is in the dependency stack (the reference implementation
/// leans on `networkx`), so this is hand-rolled rather than pulling one in
/// for a single DFS.
fn validate_task_dependencies(catalogs: &Catalogs, errors: &mut Vec<ValidationError>) {
    let root = FieldPath::new("task_dependency");
    for (task_name, deps) in &catalogs.task_dependencies {
        for dep in deps {
            if !catalogs.tasks.contains_key(dep) {
                errors.push(ValidationError::new(
                    root.field(task_name),
                    ValidationErrorKind::UnknownTask { task: dep.clone() },
                ));
            }
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let mut marks: HashMap<&str, Mark> = catalogs.task_dependencies.keys().map(|k| (k.as_str(), Mark::Unvisited)).collect();
    let mut stack: Vec<String> = Vec::new();

    fn visit<'a>(
        node: &'a str,
        catalogs: &'a Catalogs,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<String>,
        errors: &mut Vec<ValidationError>,
    ) {
        match marks.get(node).copied().unwrap_or(Mark::Done) {
            Mark::Done => return,
            Mark::InProgress => {
                let mut cycle = stack.clone();
                cycle.push(node.to_string());
                errors.push(ValidationError::new(
                    FieldPath::new("task_dependency"),
                    ValidationErrorKind::CyclicDependency { cycle },
                ));
                return;
            }
            Mark::Unvisited => {}
        }
        marks.insert(node, Mark::InProgress);
        stack.push(node.to_string());
        if let Some(deps) = catalogs.task_dependencies.get(node) {
            for dep in deps {
                visit(dep.as_str(), catalogs, marks, stack, errors);
            }
        }
        stack.pop();
        marks.insert(node, Mark::Done);
    }

    let roots: Vec<String> = catalogs.task_dependencies.keys().cloned().collect();
    for node in &roots {
        visit(node.as_str(), catalogs, &mut marks, &mut stack, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogs::{
        ChargeStationEntry, ModuleEntry, ModuleTypeEntry, RobotEntry, RobotTypeEntry, TaskDependencyCatalog,
    };
    use indexmap::IndexMap;
    use modutask_entities::ModuleState;
    use std::collections::HashMap as StdHashMap;

    fn empty_catalogs() -> Catalogs {
        Catalogs {
            module_types: IndexMap::new(),
            modules: IndexMap::new(),
            robot_types: IndexMap::new(),
            robots: IndexMap::new(),
            tasks: IndexMap::new(),
            task_dependencies: TaskDependencyCatalog::new(),
            risk_scenarios: IndexMap::new(),
            map: IndexMap::new(),
            task_priority: None,
        }
    }

    #[test]
    fn detects_cyclic_dependency() {
        let mut catalogs = empty_catalogs();
        catalogs.tasks.insert(
            "a".to_string(),
            TaskEntry::Manufacture { coordinate: [0.0, 0.0], total_workload: 1.0, completed_workload: 0.0, required_performance: StdHashMap::new() },
        );
        catalogs.tasks.insert(
            "b".to_string(),
            TaskEntry::Manufacture { coordinate: [0.0, 0.0], total_workload: 1.0, completed_workload: 0.0, required_performance: StdHashMap::new() },
        );
        catalogs.task_dependencies.insert("a".to_string(), vec!["b".to_string()]);
        catalogs.task_dependencies.insert("b".to_string(), vec!["a".to_string()]);

        let errors = validate_catalogs(&catalogs);
        assert!(errors.iter().any(|e| matches!(e.kind, ValidationErrorKind::CyclicDependency { .. })));
    }

    #[test]
    fn detects_duplicate_module_across_robots() {
        let mut catalogs = empty_catalogs();
        catalogs.module_types.insert("arm".to_string(), ModuleTypeEntry { max_battery: 10.0 });
        catalogs.modules.insert(
            "m1".to_string(),
            ModuleEntry { module_type: "arm".to_string(), coordinate: [0.0, 0.0], battery: 5.0, operating_time: 0.0, state: ModuleState::Active },
        );
        let mut required = IndexMap::new();
        required.insert("arm".to_string(), 1);
        catalogs.robot_types.insert(
            "hauler".to_string(),
            RobotTypeEntry { required_modules: required, performance: StdHashMap::new(), power_consumption: 0.0, recharge_trigger: 0.0 },
        );
        catalogs.robots.insert(
            "r1".to_string(),
            RobotEntry { robot_type: "hauler".to_string(), coordinate: [0.0, 0.0], component: vec!["m1".to_string()], task_priority: vec![] },
        );
        catalogs.robots.insert(
            "r2".to_string(),
            RobotEntry { robot_type: "hauler".to_string(), coordinate: [0.0, 0.0], component: vec!["m1".to_string()], task_priority: vec![] },
        );

        let errors = validate_catalogs(&catalogs);
        assert!(errors.iter().any(|e| matches!(e.kind, ValidationErrorKind::DuplicateModuleAcrossRobots { .. })));
    }

    #[test]
    fn valid_single_robot_produces_no_errors() {
        let mut catalogs = empty_catalogs();
        catalogs.module_types.insert("arm".to_string(), ModuleTypeEntry { max_battery: 10.0 });
        catalogs.modules.insert(
            "m1".to_string(),
            ModuleEntry { module_type: "arm".to_string(), coordinate: [0.0, 0.0], battery: 5.0, operating_time: 0.0, state: ModuleState::Active },
        );
        let mut required = IndexMap::new();
        required.insert("arm".to_string(), 1);
        catalogs.robot_types.insert(
            "hauler".to_string(),
            RobotTypeEntry { required_modules: required, performance: StdHashMap::new(), power_consumption: 0.0, recharge_trigger: 0.0 },
        );
        catalogs.robots.insert(
            "r1".to_string(),
            RobotEntry { robot_type: "hauler".to_string(), coordinate: [0.0, 0.0], component: vec!["m1".to_string()], task_priority: vec![] },
        );
        catalogs.map.insert("s1".to_string(), ChargeStationEntry { coordinate: [0.0, 0.0], charging_speed: 1.0 });

        assert!(validate_catalogs(&catalogs).is_empty());
    }
}
