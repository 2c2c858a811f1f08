//! A genome of robot configurations assembled from a shared module pool
//! (used for fleet-composition optimization). Grounded on
//! `original_source/modutask/optimizer/my_moo/core/encoding/configuration.py`.
//!
//! Unlike the Python original, which mutates `Robot` objects in place
//! (`component_required.remove`/`.append`, `mount_module`), every edit
//! here rebuilds the affected robot through `Robot::new` against the
//! shared module catalog, the same pattern `Scenario::clone_deep` already
//! uses to reconstruct robots after a structural change.

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use modutask_core::{Coordinate, SimRng};
use modutask_entities::{Module, Robot, RobotType};

use super::Variable;

pub struct ConfigurationVariable {
    pub modules: IndexMap<String, Module>,
    pub robot_types: IndexMap<String, RobotType>,
}

impl ConfigurationVariable {
    pub fn new(modules: IndexMap<String, Module>, robot_types: IndexMap<String, RobotType>) -> Self {
        Self { modules, robot_types }
    }

    /// Pick a random robot type, then greedily sample its required module
    /// counts from the ACTIVE, not-yet-used pool. Returns `None` as soon
    /// as one module type can't be satisfied, the same signal the sampling
    /// loop in `sample` uses to stop adding robots.
    fn sample_robot(&self, used: &HashSet<String>, index: usize, rng: &mut SimRng) -> Option<Robot> {
        let types: Vec<&RobotType> = self.robot_types.values().collect();
        let robot_type = (*rng.choose(&types)?).clone();

        let mut chosen: Vec<String> = Vec::new();
        for (module_type_name, &count) in &robot_type.required_modules {
            let mut candidates: Vec<String> = self
                .modules
                .values()
                .filter(|m| {
                    m.module_type.name == *module_type_name
                        && m.is_active()
                        && !used.contains(&m.name)
                        && !chosen.contains(&m.name)
                })
                .map(|m| m.name.clone())
                .collect();
            if candidates.len() < count {
                return None;
            }
            rng.shuffle(&mut candidates);
            chosen.extend(candidates.into_iter().take(count));
        }

        let coordinate = most_common_coordinate(&chosen, &self.modules);
        Robot::new(format!("robot_{index}"), robot_type, coordinate, chosen, Vec::new(), &self.modules).ok()
    }
}

impl Variable for ConfigurationVariable {
    type Genome = Vec<Robot>;

    fn sample(&self, rng: &mut SimRng) -> Self::Genome {
        let mut robots = Vec::new();
        let mut used = HashSet::new();
        let mut index = 0;
        while let Some(robot) = self.sample_robot(&used, index, rng) {
            used.extend(robot.component_required().iter().cloned());
            robots.push(robot);
            index += 1;
        }
        robots
    }

    /// Drop one random robot, sample a replacement from the freed module
    /// pool, then attempt one cross-robot module swap.
    fn mutate(&self, genome: &Self::Genome, rng: &mut SimRng) -> Self::Genome {
        let mut robots = genome.clone();
        if robots.is_empty() {
            return robots;
        }
        let remove_idx = rng.choose_index(robots.len()).expect("non-empty");
        robots.remove(remove_idx);

        let used: HashSet<String> = robots
            .iter()
            .flat_map(|r| r.component_required().iter().cloned())
            .collect();
        if let Some(replacement) = self.sample_robot(&used, remove_idx, rng) {
            robots.push(replacement);
        }
        mutate_cross(&mut robots, &self.modules, rng);
        robots
    }

    /// Replace one offspring robot (cloned from `a`) with a same-type
    /// candidate from `b`, then propagate the module names that changed
    /// hands to every other robot in the offspring that was using one of
    /// them.
    fn crossover(&self, a: &Self::Genome, b: &Self::Genome, rng: &mut SimRng) -> Self::Genome {
        let mut offspring = a.clone();
        if offspring.is_empty() || b.is_empty() {
            return offspring;
        }
        let idx = rng.choose_index(offspring.len()).expect("non-empty");
        let robot_a = offspring[idx].clone();
        let candidates: Vec<&Robot> = b.iter().filter(|r| r.robot_type.name == robot_a.robot_type.name).collect();
        let Some(&robot_b) = rng.choose(&candidates) else {
            return offspring;
        };

        let a_only: Vec<String> = robot_a
            .component_required()
            .iter()
            .filter(|m| !robot_b.component_required().contains(m))
            .cloned()
            .collect();
        let b_only: Vec<String> = robot_b
            .component_required()
            .iter()
            .filter(|m| !robot_a.component_required().contains(m))
            .cloned()
            .collect();
        let mut swap_map: IndexMap<String, String> = IndexMap::new();
        for (x, y) in a_only.iter().zip(b_only.iter()) {
            swap_map.insert(x.clone(), y.clone());
            swap_map.insert(y.clone(), x.clone());
        }

        if let Ok(replacement) = Robot::new(
            robot_a.name.clone(),
            robot_b.robot_type.clone(),
            robot_b.coordinate(),
            robot_b.component_required().to_vec(),
            robot_a.task_priority.clone(),
            &self.modules,
        ) {
            offspring[idx] = replacement;
        }

        for (i, robot) in offspring.iter_mut().enumerate() {
            if i == idx {
                continue;
            }
            let mut changed = false;
            let new_required: Vec<String> = robot
                .component_required()
                .iter()
                .map(|m| match swap_map.get(m) {
                    Some(repl) => {
                        changed = true;
                        repl.clone()
                    }
                    None => m.clone(),
                })
                .collect();
            if changed {
                if let Ok(rebuilt) = Robot::new(
                    robot.name.clone(),
                    robot.robot_type.clone(),
                    robot.coordinate(),
                    new_required,
                    robot.task_priority.clone(),
                    &self.modules,
                ) {
                    *robot = rebuilt;
                }
            }
        }
        offspring
    }

    fn validate(&self, genome: &Self::Genome) -> bool {
        let mut seen = HashSet::new();
        genome
            .iter()
            .all(|robot| robot.component_required().iter().all(|m| seen.insert(m.clone())))
    }

    fn equals(&self, a: &Self::Genome, b: &Self::Genome) -> bool {
        a.len() == b.len()
            && a.iter()
                .zip(b.iter())
                .all(|(ra, rb)| ra.robot_type.name == rb.robot_type.name && ra.component_required() == rb.component_required())
    }

    fn hash_genome(&self, genome: &Self::Genome) -> u64 {
        let mut acc = 0u64;
        for robot in genome {
            let mut h = DefaultHasher::new();
            robot.robot_type.name.hash(&mut h);
            acc ^= h.finish();
            for module_name in robot.component_required() {
                let mut hm = DefaultHasher::new();
                module_name.hash(&mut hm);
                acc ^= hm.finish();
            }
        }
        acc
    }
}

/// Swap one pair of same-module-type components between two random
/// robots, if such a pair exists. No-op on genomes with fewer than 2
/// robots, or when no type-compatible pair is found.
fn mutate_cross(robots: &mut [Robot], modules: &IndexMap<String, Module>, rng: &mut SimRng) {
    if robots.len() < 2 {
        return;
    }
    let i = rng.choose_index(robots.len()).expect("len >= 2");
    let mut j = rng.choose_index(robots.len()).expect("len >= 2");
    while j == i {
        j = rng.choose_index(robots.len()).expect("len >= 2");
    }

    let required_i = robots[i].component_required().to_vec();
    let required_j = robots[j].component_required().to_vec();

    let mut candidate_pairs = Vec::new();
    for (mi, module_i) in required_i.iter().enumerate() {
        let Some(type_i) = modules.get(module_i).map(|m| m.module_type.name.clone()) else {
            continue;
        };
        for (mj, module_j) in required_j.iter().enumerate() {
            if module_i == module_j {
                continue;
            }
            if modules.get(module_j).map(|m| m.module_type.name.as_str()) == Some(type_i.as_str()) {
                candidate_pairs.push((mi, mj));
            }
        }
    }
    let Some(&(mi, mj)) = rng.choose(&candidate_pairs) else {
        return;
    };

    let mut new_required_i = required_i.clone();
    let mut new_required_j = required_j.clone();
    new_required_i[mi] = required_j[mj].clone();
    new_required_j[mj] = required_i[mi].clone();

    let rebuilt_i = Robot::new(
        robots[i].name.clone(),
        robots[i].robot_type.clone(),
        robots[i].coordinate(),
        new_required_i,
        robots[i].task_priority.clone(),
        modules,
    );
    let rebuilt_j = Robot::new(
        robots[j].name.clone(),
        robots[j].robot_type.clone(),
        robots[j].coordinate(),
        new_required_j,
        robots[j].task_priority.clone(),
        modules,
    );
    if let (Ok(new_i), Ok(new_j)) = (rebuilt_i, rebuilt_j) {
        robots[i] = new_i;
        robots[j] = new_j;
    }
}

/// The coordinate shared by the most of `module_names`, used as the new
/// robot's starting position. Grouping uses coincidence rather than exact
/// float equality.
fn most_common_coordinate(module_names: &[String], modules: &IndexMap<String, Module>) -> Coordinate {
    let mut tally: Vec<(Coordinate, usize)> = Vec::new();
    for name in module_names {
        if let Some(module) = modules.get(name) {
            let coord = module.coordinate();
            match tally.iter_mut().find(|(c, _)| c.coincides_with(&coord)) {
                Some(entry) => entry.1 += 1,
                None => tally.push((coord, 1)),
            }
        }
    }
    tally
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(c, _)| c)
        .unwrap_or_else(|| Coordinate::new(0.0, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use modutask_entities::ModuleState;
    use std::collections::HashMap;
    use modutask_entities::PerformanceAttribute;

    fn catalog() -> (IndexMap<String, Module>, IndexMap<String, RobotType>) {
        let arm_type = modutask_entities::ModuleType::new("arm", 10.0);
        let wheel_type = modutask_entities::ModuleType::new("wheel", 10.0);

        let mut modules = IndexMap::new();
        for i in 0..4 {
            modules.insert(
                format!("arm_{i}"),
                Module::new(format!("arm_{i}"), arm_type.clone(), Coordinate::new(0.0, 0.0), 5.0, 0.0, ModuleState::Active).unwrap(),
            );
        }
        for i in 0..4 {
            modules.insert(
                format!("wheel_{i}"),
                Module::new(format!("wheel_{i}"), wheel_type.clone(), Coordinate::new(0.0, 0.0), 5.0, 0.0, ModuleState::Active).unwrap(),
            );
        }

        let mut required = IndexMap::new();
        required.insert("arm".to_string(), 1);
        required.insert("wheel".to_string(), 2);
        let robot_type = RobotType {
            name: "hauler".to_string(),
            required_modules: required,
            performance: HashMap::from([(PerformanceAttribute::Mobility, 1.0)]),
            power_consumption: 1.0,
            recharge_trigger: 1.0,
        };
        let mut robot_types = IndexMap::new();
        robot_types.insert("hauler".to_string(), robot_type);

        (modules, robot_types)
    }

    #[test]
    fn sample_produces_valid_non_overlapping_robots() {
        let (modules, robot_types) = catalog();
        let v = ConfigurationVariable::new(modules, robot_types);
        let mut rng = SimRng::new(7);
        let genome = v.sample(&mut rng);
        assert!(!genome.is_empty());
        assert!(v.validate(&genome));
        // 4 wheels / 2 per robot -> at most 2 robots fit.
        assert!(genome.len() <= 2);
    }

    #[test]
    fn mutate_preserves_validity() {
        let (modules, robot_types) = catalog();
        let v = ConfigurationVariable::new(modules, robot_types);
        let mut rng = SimRng::new(11);
        let genome = v.sample(&mut rng);
        for _ in 0..10 {
            let mutated = v.mutate(&genome, &mut rng);
            assert!(v.validate(&mutated));
        }
    }

    #[test]
    fn crossover_preserves_validity() {
        let (modules, robot_types) = catalog();
        let v = ConfigurationVariable::new(modules, robot_types);
        let mut rng = SimRng::new(13);
        let a = v.sample(&mut rng);
        let b = v.sample(&mut rng);
        let child = v.crossover(&a, &b, &mut rng);
        assert!(v.validate(&child));
    }
}
