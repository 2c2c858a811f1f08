//! Modutask Sim - the discrete-step simulator and fleet metrics.

pub mod agent;
pub mod metrics;
pub mod simulator;

pub use agent::{Agent, AgentState};
pub use metrics::{maximal_operating_time, total_remaining_workload, weighted_variance_remaining_workload};
pub use simulator::Simulator;
