//! Modutask Entities - modules, robots, tasks, risk scenarios, charge
//! stations, and the cloneable scenario aggregate that owns all of them.

pub mod map;
pub mod module;
pub mod performance;
pub mod risk_scenario;
pub mod robot;
pub mod scenario;
pub mod task;

pub use map::{ChargeStation, SimulationMap};
pub use module::{Module, ModuleState, ModuleType};
pub use performance::PerformanceAttribute;
pub use risk_scenario::{ExponentialOperatingTime, RiskScenario, TimeSigmoid};
pub use robot::{Robot, RobotState, RobotType};
pub use scenario::Scenario;
pub use task::{Task, TaskHeader, TaskSet};
