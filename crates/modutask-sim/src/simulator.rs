//! The discrete-step simulator: one `run_simulation` call advances every
//! agent and task by exactly one step, in the fixed order SPEC_FULL.md
//! §4.3 mandates and `original_source/modutask/simulator/simulation.py`'s
//! `Simulator.run_simulation` demonstrates:
//! agents decide (mirror/recharge/select/engage) → tasks execute once →
//! charge bindings execute → robot state is re-derived from the active
//! risk scenarios.

use indexmap::IndexMap;
use modutask_core::{ModutaskError, ModutaskResult};
use modutask_entities::{RiskScenario, RobotState, Scenario, Task, TaskSet};

use crate::agent::{Agent, AgentState, Binding};
use crate::metrics;

pub struct Simulator {
    pub scenario: Scenario,
    pub agents: IndexMap<String, Agent>,
    pub active_risk_scenarios: Vec<Box<dyn RiskScenario>>,
}

impl Simulator {
    pub fn new(
        scenario: Scenario,
        task_priorities: IndexMap<String, Vec<String>>,
        active_risk_scenarios: Vec<Box<dyn RiskScenario>>,
    ) -> ModutaskResult<Self> {
        let mut agents = IndexMap::new();
        for (name, robot) in &scenario.robots {
            let priority = task_priorities
                .get(name)
                .cloned()
                .unwrap_or_else(|| robot.task_priority.clone());
            agents.insert(name.clone(), Agent::new(name.clone(), priority));
        }
        Ok(Self {
            scenario,
            agents,
            active_risk_scenarios,
        })
    }

    pub fn run_simulation(&mut self) -> ModutaskResult<()> {
        let agent_names: Vec<String> = self.agents.keys().cloned().collect();
        for name in &agent_names {
            let mut agent = self.agents.remove(name).expect("agent present");
            decide_agent(&mut agent, &mut self.scenario)?;
            self.agents.insert(name.clone(), agent);
        }

        let task_names: Vec<String> = self.scenario.tasks.keys().cloned().collect();
        for name in &task_names {
            let progressed = {
                let task = self.scenario.tasks.get_mut(name).expect("task present");
                task.update(&mut self.scenario.robots, &mut self.scenario.modules)?
            };
            if progressed {
                let assigned: Vec<String> = self.scenario.tasks[name].assigned_robots().to_vec();
                for robot_name in assigned {
                    if let Some(agent) = self.agents.get_mut(&robot_name) {
                        agent.state = AgentState::Work;
                    }
                }
            }
            self.scenario.tasks.get_mut(name).expect("task present").release_robots();
        }

        for name in &agent_names {
            let mut charge_task = self
                .agents
                .get_mut(name)
                .expect("agent present")
                .charge_task
                .take();
            if let Some(task) = charge_task.as_mut() {
                task.update(&mut self.scenario.robots, &mut self.scenario.modules)?;
                task.release_robots();
            }
            self.agents.get_mut(name).expect("agent present").charge_task = charge_task;
        }

        for robot in self.scenario.robots.values_mut() {
            robot.update_state(&mut self.active_risk_scenarios, &mut self.scenario.modules);
        }
        Ok(())
    }

    pub fn run_steps(&mut self, max_step: usize) -> ModutaskResult<()> {
        for _ in 0..max_step {
            self.run_simulation()?;
        }
        Ok(())
    }

    pub fn total_remaining_workload(&self, scope: TaskSet) -> f64 {
        metrics::total_remaining_workload(&self.scenario.tasks, scope)
    }

    pub fn weighted_variance_remaining_workload(&self, scope: TaskSet) -> f64 {
        metrics::weighted_variance_remaining_workload(&self.scenario.tasks, scope)
    }

    pub fn maximal_operating_time(&self) -> f64 {
        metrics::maximal_operating_time(&self.scenario.modules)
    }
}

/// Runs one agent's decide phase: mirror terminal robot states, then
/// (if active) the recharge decision, task selection, and engage steps
/// from §4.3, in that order.
fn decide_agent(agent: &mut Agent, scenario: &mut Scenario) -> ModutaskResult<()> {
    let robot_name = agent.robot_name.clone();
    let robot_state = scenario
        .robots
        .get(&robot_name)
        .ok_or_else(|| ModutaskError::robot_not_found(robot_name.clone()))?
        .state();

    match robot_state {
        RobotState::NoEnergy => {
            agent.state = AgentState::NoEnergy;
            return Ok(());
        }
        RobotState::Defective => {
            agent.state = AgentState::Defective;
            return Ok(());
        }
        RobotState::Active => {}
    }

    if matches!(agent.binding, Some(Binding::Charge)) {
        let robot = &scenario.robots[&robot_name];
        if robot.total_battery(&scenario.modules) >= robot.total_max_battery(&scenario.modules) {
            agent.binding = None;
            agent.charge_task = None;
        }
    }

    if let Some(Binding::Task(name)) = &agent.binding {
        let still_eligible = scenario
            .tasks
            .get(name)
            .is_some_and(|task| !task.is_completed() && task.are_dependencies_completed(&scenario.tasks));
        if !still_eligible {
            agent.binding = None;
        }
    }

    if agent.binding.is_none() {
        let robot = &scenario.robots[&robot_name];
        if robot.total_battery(&scenario.modules) < robot.robot_type.recharge_trigger {
            if let Some(station) = scenario.map.nearest_station(robot.coordinate()) {
                let charge_task = Task::new_charge(
                    format!("charge_{robot_name}"),
                    station.coordinate(),
                    station.charging_speed,
                )?;
                agent.binding = Some(Binding::Charge);
                agent.charge_task = Some(charge_task);
            }
        }
    }

    if agent.binding.is_none() {
        for task_name in &agent.task_priority {
            if let Some(task) = scenario.tasks.get(task_name) {
                if !task.is_completed() && task.are_dependencies_completed(&scenario.tasks) {
                    agent.binding = Some(Binding::Task(task_name.clone()));
                    break;
                }
            }
        }
    }

    let target = match &agent.binding {
        Some(Binding::Task(name)) => scenario.tasks.get(name).map(Task::coordinate),
        Some(Binding::Charge) => agent.charge_task.as_ref().map(Task::coordinate),
        None => None,
    };
    let Some(target) = target else {
        agent.state = AgentState::Idle;
        return Ok(());
    };

    let robot_snapshot = scenario.robots[&robot_name].clone();
    if robot_snapshot.coordinate().coincides_with(&target) {
        match &agent.binding {
            Some(Binding::Task(name)) => {
                if let Some(task) = scenario.tasks.get_mut(name) {
                    task.assign_robot(&robot_snapshot)?;
                }
                agent.state = AgentState::Assigned;
            }
            Some(Binding::Charge) => {
                if let Some(task) = agent.charge_task.as_mut() {
                    task.assign_robot(&robot_snapshot)?;
                }
                agent.state = AgentState::Charge;
            }
            None => unreachable!("target is only Some when binding is Some"),
        }
    } else {
        let robot = scenario
            .robots
            .get_mut(&robot_name)
            .ok_or_else(|| ModutaskError::robot_not_found(robot_name.clone()))?;
        robot.travel(target, &mut scenario.modules)?;
        agent.state = AgentState::Move;
    }
    Ok(())
}
