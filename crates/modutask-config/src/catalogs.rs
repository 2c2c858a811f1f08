//! Serde-typed catalog documents and the property file (SPEC_FULL.md §6),
//! following `waremax-config/src/scenario.rs`'s `ScenarioConfig` pattern:
//! typed structs, `#[serde(default)]` where a field is optional, and a
//! `ConfigError` distinct from the domain `ModutaskError`.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use modutask_entities::{ModuleState, PerformanceAttribute, TaskSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading '{path}': {source}")]
    Io { path: String, source: std::io::Error },

    #[error("YAML parse error in '{path}': {source}")]
    Yaml { path: String, source: serde_yaml::Error },
}

fn load_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.display().to_string(),
        source,
    })
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModuleTypeEntry {
    pub max_battery: f64,
}

pub type ModuleTypeCatalog = IndexMap<String, ModuleTypeEntry>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModuleEntry {
    pub module_type: String,
    pub coordinate: [f64; 2],
    pub battery: f64,
    #[serde(default)]
    pub operating_time: f64,
    pub state: ModuleState,
}

pub type ModuleCatalog = IndexMap<String, ModuleEntry>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RobotTypeEntry {
    pub required_modules: IndexMap<String, usize>,
    #[serde(default)]
    pub performance: HashMap<PerformanceAttribute, f64>,
    #[serde(default)]
    pub power_consumption: f64,
    #[serde(default)]
    pub recharge_trigger: f64,
}

pub type RobotTypeCatalog = IndexMap<String, RobotTypeEntry>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RobotEntry {
    pub robot_type: String,
    pub coordinate: [f64; 2],
    pub component: Vec<String>,
    #[serde(default)]
    pub task_priority: Vec<String>,
}

pub type RobotCatalog = IndexMap<String, RobotEntry>;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "class")]
pub enum TaskEntry {
    Transport {
        origin: [f64; 2],
        destination: [f64; 2],
        #[serde(default = "default_resistance")]
        resistance: f64,
        #[serde(default)]
        required_performance: HashMap<PerformanceAttribute, f64>,
        #[serde(default)]
        completed_workload: f64,
    },
    Manufacture {
        coordinate: [f64; 2],
        total_workload: f64,
        #[serde(default)]
        completed_workload: f64,
        #[serde(default)]
        required_performance: HashMap<PerformanceAttribute, f64>,
    },
}

fn default_resistance() -> f64 {
    1.0
}

pub type TaskCatalog = IndexMap<String, TaskEntry>;

/// task name -> the names of tasks it depends on. Must encode a DAG; the
/// cycle check lives in `validation.rs`.
pub type TaskDependencyCatalog = IndexMap<String, Vec<String>>;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "class")]
pub enum RiskScenarioEntry {
    ExponentialOperatingTime { seed: u64, mean_life: f64 },
    TimeSigmoid { seed: u64, sharpness: f64, limit: f64 },
}

pub type RiskScenarioCatalog = IndexMap<String, RiskScenarioEntry>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChargeStationEntry {
    pub coordinate: [f64; 2],
    pub charging_speed: f64,
}

pub type MapCatalog = IndexMap<String, ChargeStationEntry>;

/// robot_name -> ordered task names; must be a permutation over the
/// combined task set (checked in `validation.rs`).
pub type TaskPriorityCatalog = IndexMap<String, Vec<String>>;

/// One ensemble of risk scenarios applied together for one simulated
/// sample of the task-allocation objective (SPEC_FULL.md §4.7).
pub type ScenarioSample = Vec<String>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OptimizerParams {
    pub population_size: usize,
    pub generations: usize,
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
    pub seed: u64,
    pub representatives_k: usize,
}

fn default_tournament_size() -> usize {
    2
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PropertyFile {
    pub module_type: String,
    pub module: String,
    pub robot_type: String,
    pub robot: String,
    pub task: String,
    pub task_dependency: String,
    pub risk_scenario: String,
    pub map: String,
    #[serde(default)]
    pub task_priority: Option<String>,

    pub max_step: usize,
    pub training_samples: Vec<ScenarioSample>,
    #[serde(default)]
    pub validation_samples: Vec<ScenarioSample>,

    pub optimizer: OptimizerParams,
    #[serde(default = "default_scope")]
    pub residual_workload_scope: TaskSet,

    pub output_dir: String,
}

fn default_scope() -> TaskSet {
    TaskSet::Combined
}

impl PropertyFile {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        load_yaml(path)
    }
}

/// All five independent catalog documents named by a property file,
/// loaded and held together for validation and scenario construction.
pub struct Catalogs {
    pub module_types: ModuleTypeCatalog,
    pub modules: ModuleCatalog,
    pub robot_types: RobotTypeCatalog,
    pub robots: RobotCatalog,
    pub tasks: TaskCatalog,
    pub task_dependencies: TaskDependencyCatalog,
    pub risk_scenarios: RiskScenarioCatalog,
    pub map: MapCatalog,
    pub task_priority: Option<TaskPriorityCatalog>,
}

impl Catalogs {
    pub fn load(property_file: &PropertyFile, base_dir: &Path) -> Result<Self, ConfigError> {
        let resolve = |relative: &str| base_dir.join(relative);
        Ok(Self {
            module_types: load_yaml(&resolve(&property_file.module_type))?,
            modules: load_yaml(&resolve(&property_file.module))?,
            robot_types: load_yaml(&resolve(&property_file.robot_type))?,
            robots: load_yaml(&resolve(&property_file.robot))?,
            tasks: load_yaml(&resolve(&property_file.task))?,
            task_dependencies: load_yaml(&resolve(&property_file.task_dependency))?,
            risk_scenarios: load_yaml(&resolve(&property_file.risk_scenario))?,
            map: load_yaml(&resolve(&property_file.map))?,
            task_priority: property_file
                .task_priority
                .as_ref()
                .map(|relative| load_yaml(&resolve(relative)))
                .transpose()?,
        })
    }
}
