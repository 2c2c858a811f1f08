//! The two minimization objectives NSGA-II evaluates (SPEC_FULL.md §4.7).
//! Task-allocation is grounded on `original_source/task_allocation.py`'s
//! `objective`; configuration on `original_source/optimize_configuration.py`'s
//! `objective`.

use indexmap::IndexMap;
use modutask_core::ModutaskResult;
use modutask_entities::{Module, PerformanceAttribute, RiskScenario, Robot, RobotState, Scenario, TaskSet};
use modutask_sim::Simulator;

use crate::catalogs::ScenarioSample;

fn average(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// For each training sample (an ensemble of risk-scenario names run
/// together), clones `scenario` fresh, runs `max_step` steps under
/// `task_priorities`, and collects (total remaining workload, weighted
/// variance of remaining workload, maximal operating time). Returns the
/// elementwise average across samples. `scope` selects which subset of
/// `scenario.tasks` the first two metrics are computed over.
pub fn task_allocation_objective(
    scenario: &Scenario,
    task_priorities: &IndexMap<String, Vec<String>>,
    max_step: usize,
    training_samples: &[ScenarioSample],
    scope: TaskSet,
) -> ModutaskResult<Vec<f64>> {
    let mut total_remaining = Vec::with_capacity(training_samples.len());
    let mut variance_remaining = Vec::with_capacity(training_samples.len());
    let mut max_operating_time = Vec::with_capacity(training_samples.len());

    for sample in training_samples {
        let local_scenario = scenario.clone_deep();
        let active_risk_scenarios: Vec<Box<dyn RiskScenario>> = sample
            .iter()
            .map(|name| {
                local_scenario
                    .risk_scenarios
                    .get(name)
                    .map(|scenario| scenario.clone_boxed())
                    .ok_or_else(|| modutask_core::ModutaskError::Validation(format!("training sample references unknown risk scenario '{name}'")))
            })
            .collect::<ModutaskResult<_>>()?;

        let mut simulator = Simulator::new(local_scenario, task_priorities.clone(), active_risk_scenarios)?;
        simulator.run_steps(max_step)?;

        total_remaining.push(simulator.total_remaining_workload(scope));
        variance_remaining.push(simulator.weighted_variance_remaining_workload(scope));
        max_operating_time.push(simulator.maximal_operating_time());
    }

    Ok(vec![
        average(&total_remaining),
        average(&variance_remaining),
        average(&max_operating_time),
    ])
}

/// Minimize (−ΣTRANSPORT, −ΣMANUFACTURE, −ΣMOBILITY, Σ operating_time,
/// Σ module-to-robot distance) over a candidate robot list's
/// `component_required` modules. Robot state is recomputed first (against
/// a private working copy of `modules`, never the caller's); if no robot
/// ends up ACTIVE the candidate is infeasible and every objective is +∞.
pub fn configuration_objective(robots: &[Robot], modules: &IndexMap<String, Module>) -> Vec<f64> {
    let mut working_modules = modules.clone();
    let mut sum_transport = 0.0;
    let mut sum_manufacture = 0.0;
    let mut sum_mobility = 0.0;
    let mut sum_operating_time = 0.0;
    let mut sum_module_distance = 0.0;
    let mut active_robot_count = 0usize;

    for robot in robots {
        let mut robot = robot.clone();
        robot.update_state(&mut Vec::new(), &mut working_modules);

        sum_transport += robot.robot_type.performance_of(PerformanceAttribute::Transport);
        sum_manufacture += robot.robot_type.performance_of(PerformanceAttribute::Manufacture);
        sum_mobility += robot.robot_type.performance_of(PerformanceAttribute::Mobility);
        for module_name in robot.component_required() {
            if let Some(module) = working_modules.get(module_name) {
                sum_operating_time += module.operating_time();
                sum_module_distance += module.coordinate().distance(&robot.coordinate());
            }
        }
        if robot.state() == RobotState::Active {
            active_robot_count += 1;
        }
    }

    if active_robot_count == 0 {
        return vec![f64::INFINITY; 5];
    }
    vec![-sum_transport, -sum_manufacture, -sum_mobility, sum_operating_time, sum_module_distance]
}

#[cfg(test)]
mod tests {
    use super::*;
    use modutask_core::Coordinate;
    use modutask_entities::{ModuleState, ModuleType, RobotType};
    use std::collections::HashMap;

    fn robot_type() -> RobotType {
        let mut required = IndexMap::new();
        required.insert("battery_pack".to_string(), 1);
        let mut performance = HashMap::new();
        performance.insert(PerformanceAttribute::Transport, 3.0);
        performance.insert(PerformanceAttribute::Manufacture, 2.0);
        performance.insert(PerformanceAttribute::Mobility, 1.0);
        RobotType {
            name: "hauler".to_string(),
            required_modules: required,
            performance,
            power_consumption: 0.0,
            recharge_trigger: 0.0,
        }
    }

    #[test]
    fn configuration_objective_rewards_transport_and_penalizes_distance() {
        let module_type = ModuleType::new("battery_pack", 10.0);
        let mut modules = IndexMap::new();
        modules.insert(
            "m1".to_string(),
            Module::new("m1", module_type, Coordinate::new(3.0, 0.0), 10.0, 5.0, ModuleState::Active).unwrap(),
        );
        let robot = Robot::new("r1", robot_type(), Coordinate::new(0.0, 0.0), vec!["m1".to_string()], vec![], &modules).unwrap();

        let objectives = configuration_objective(&[robot], &modules);
        assert_eq!(objectives.len(), 5);
        assert_eq!(objectives[0], -3.0);
        assert_eq!(objectives[1], -2.0);
        assert_eq!(objectives[2], -1.0);
        assert_eq!(objectives[3], 5.0);
        assert_eq!(objectives[4], 3.0);
    }

    #[test]
    fn configuration_objective_is_infeasible_with_no_active_robot() {
        let module_type = ModuleType::new("battery_pack", 10.0);
        let mut modules = IndexMap::new();
        modules.insert(
            "m1".to_string(),
            Module::new("m1", module_type, Coordinate::new(0.0, 0.0), 10.0, 0.0, ModuleState::Error).unwrap(),
        );
        // The module is ERROR, so it never mounts: the robot is DEFECTIVE.
        let robot = Robot::new("r1", robot_type(), Coordinate::new(0.0, 0.0), vec!["m1".to_string()], vec![], &modules).unwrap();
        assert_eq!(configuration_objective(&[robot], &modules), vec![f64::INFINITY; 5]);
    }
}
