//! Per-robot simulation agent: observable state plus the agent-local,
//! persistent-until-done task/charge binding (SPEC_FULL.md §4.3).
//!
//! The real `RobotAgent` source referenced by
//! `original_source/modutask/simulator/simulation.py` is missing from the
//! retrieved pack, so this is grounded directly on the step contract in
//! SPEC_FULL.md §4.3, cross-checked against `simulation.py`'s call
//! sequence (`decide_recharge` / `update_task` / `is_on_site` / `ready` /
//! `travel(scenarios)` / `set_state_work(scenarios)`).

use modutask_entities::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Move,
    Assigned,
    Charge,
    Work,
    NoEnergy,
    Defective,
}

/// What the agent is currently working toward. Distinct from a task's
/// own per-step `assigned_robots` list, which is cleared every step
/// regardless of variant. A binding survives across steps but is
/// re-checked every decide phase and cleared once its task completes
/// (or its dependencies are no longer satisfied), or once battery is
/// full for Charge; a cleared binding is eligible for reselection on
/// the same step.
#[derive(Debug, Clone)]
pub(crate) enum Binding {
    Task(String),
    Charge,
}

pub struct Agent {
    pub robot_name: String,
    pub task_priority: Vec<String>,
    pub(crate) state: AgentState,
    pub(crate) binding: Option<Binding>,
    /// Ephemeral Charge task synthesized from the nearest station when a
    /// recharge binding starts; never part of a scenario's task arena.
    pub(crate) charge_task: Option<Task>,
}

impl Agent {
    pub fn new(robot_name: impl Into<String>, task_priority: Vec<String>) -> Self {
        Self {
            robot_name: robot_name.into(),
            task_priority,
            state: AgentState::Idle,
            binding: None,
            charge_task: None,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn is_charging(&self) -> bool {
        matches!(self.binding, Some(Binding::Charge))
    }

    pub fn bound_task_name(&self) -> Option<&str> {
        match &self.binding {
            Some(Binding::Task(name)) => Some(name),
            _ => None,
        }
    }
}
