//! Fleet-level scalar metrics computed over a scenario's tasks and
//! modules (SPEC_FULL.md §4.4), grounded on
//! `original_source/modutask/simulator/simulation.py`'s
//! `total_remaining_workload`/`variance_remaining_workload` and
//! `original_source/task_allocation.py`'s `maximal_operating_time`.

use indexmap::IndexMap;
use modutask_core::weighted_variance;

use modutask_entities::{Module, Robot, Task, TaskSet};

fn in_scope(task: &Task, scope: TaskSet) -> bool {
    match scope {
        TaskSet::Combined => true,
        TaskSet::Base => !task.is_generated(),
    }
}

/// Sum of `total_workload - completed_workload` over tasks in `scope`.
pub fn total_remaining_workload(tasks: &IndexMap<String, Task>, scope: TaskSet) -> f64 {
    tasks
        .values()
        .filter(|t| in_scope(t, scope))
        .map(|t| t.total_workload() - t.completed_workload())
        .sum()
}

/// Weighted variance of task coordinates, weighted by each task's
/// remaining workload, restricted to `scope`.
pub fn weighted_variance_remaining_workload(tasks: &IndexMap<String, Task>, scope: TaskSet) -> f64 {
    let mut points = Vec::new();
    let mut weights = Vec::new();
    for task in tasks.values().filter(|t| in_scope(t, scope)) {
        points.push(task.coordinate());
        weights.push(task.total_workload() - task.completed_workload());
    }
    weighted_variance(&points, &weights)
}

/// Maximum `operating_time` across every module in the scenario, mounted
/// or not. Zero if there are no modules.
pub fn maximal_operating_time(modules: &IndexMap<String, Module>) -> f64 {
    modules.values().map(Module::operating_time).fold(0.0, f64::max)
}
