//! NSGA-II: fast non-dominated sorting, crowding distance, tournament
//! selection, and the generational driver loop. Grounded on
//! `original_source/modutask/optimizer/my_moo/algorithms/nsgaii.py`.

use modutask_core::SimRng;

use crate::encoding::Variable;
use crate::individual::{Individual, DUPLICATE_RANK};
use crate::population::Population;
use crate::selection::dominates;

/// Rank every individual and split the population into fronts. Genome
/// duplicates (by `encoding.equals`) are excluded from the domination
/// comparisons entirely and assigned [`DUPLICATE_RANK`], so they always
/// lose tournament selection and truncation.
pub fn fast_non_dominated_sort<V: Variable>(individuals: &mut [Individual<V>], encoding: &V) -> Vec<Vec<usize>> {
    let n = individuals.len();
    let mut is_duplicate = vec![false; n];
    for i in 0..n {
        for j in 0..i {
            if !is_duplicate[j] && individuals[i].equals(&individuals[j], encoding) {
                is_duplicate[i] = true;
                break;
            }
        }
    }

    let mut dominated_sets: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count: Vec<usize> = vec![0; n];
    for i in 0..n {
        if is_duplicate[i] {
            individuals[i].rank = DUPLICATE_RANK;
            continue;
        }
        for j in 0..n {
            if i == j || is_duplicate[j] {
                continue;
            }
            if dominates(&individuals[i].objectives, &individuals[j].objectives) {
                dominated_sets[i].push(j);
            } else if dominates(&individuals[j].objectives, &individuals[i].objectives) {
                domination_count[i] += 1;
            }
        }
    }

    let mut fronts = Vec::new();
    let mut current_front: Vec<usize> = (0..n).filter(|&i| !is_duplicate[i] && domination_count[i] == 0).collect();
    let mut rank = 0;
    while !current_front.is_empty() {
        for &i in &current_front {
            individuals[i].rank = rank;
        }
        let mut next_front = Vec::new();
        for &p in &current_front {
            for &q in &dominated_sets[p] {
                domination_count[q] -= 1;
                if domination_count[q] == 0 {
                    next_front.push(q);
                }
            }
        }
        fronts.push(std::mem::take(&mut current_front));
        current_front = next_front;
        rank += 1;
    }
    fronts
}

/// Per-objective crowding distance within one front, boundary individuals
/// pinned to infinity. Objectives with zero spread contribute nothing.
pub fn calculate_crowding_distance<V: Variable>(individuals: &mut [Individual<V>], front: &[usize]) {
    for &i in front {
        individuals[i].crowding_distance = 0.0;
    }
    let m = front.len();
    if m == 0 {
        return;
    }
    let num_objectives = individuals[front[0]].objectives.len();
    for obj in 0..num_objectives {
        let mut sorted = front.to_vec();
        sorted.sort_by(|&a, &b| {
            individuals[a].objectives[obj]
                .partial_cmp(&individuals[b].objectives[obj])
                .expect("objective values are finite")
        });
        let min = individuals[sorted[0]].objectives[obj];
        let max = individuals[sorted[m - 1]].objectives[obj];
        individuals[sorted[0]].crowding_distance = f64::INFINITY;
        individuals[sorted[m - 1]].crowding_distance = f64::INFINITY;
        if m < 3 || (max - min).abs() < f64::EPSILON {
            continue;
        }
        for k in 1..m - 1 {
            let prev = individuals[sorted[k - 1]].objectives[obj];
            let next = individuals[sorted[k + 1]].objectives[obj];
            individuals[sorted[k]].crowding_distance += (next - prev) / (max - min);
        }
    }
}

/// Sample `tournament_size` individuals without replacement and return
/// the index of the one with the best (rank, -crowding_distance) key.
pub fn tournament_selection<V: Variable>(individuals: &[Individual<V>], tournament_size: usize, rng: &mut SimRng) -> usize {
    let mut indices: Vec<usize> = (0..individuals.len()).collect();
    rng.shuffle(&mut indices);
    indices.truncate(tournament_size.min(individuals.len()).max(1));
    indices
        .into_iter()
        .min_by(|&a, &b| {
            let key = |i: usize| (individuals[i].rank, -individuals[i].crowding_distance);
            let (ra, ca) = key(a);
            let (rb, cb) = key(b);
            ra.cmp(&rb).then(ca.partial_cmp(&cb).expect("crowding distances are comparable"))
        })
        .expect("tournament pool is non-empty")
}

/// Rank and crowd the current population once, then run tournament
/// selection + crossover + mutate `num_offspring` times.
pub fn generate_offspring<V: Variable>(
    population: &Population<V>,
    encoding: &V,
    num_offspring: usize,
    tournament_size: usize,
    rng: &mut SimRng,
) -> Vec<Individual<V>> {
    let mut individuals = population.individuals.clone();
    let fronts = fast_non_dominated_sort(&mut individuals, encoding);
    for front in &fronts {
        calculate_crowding_distance(&mut individuals, front);
    }

    (0..num_offspring)
        .map(|_| {
            let i1 = tournament_selection(&individuals, tournament_size, rng);
            let i2 = tournament_selection(&individuals, tournament_size, rng);
            let mut child = individuals[i1].crossover(&individuals[i2], encoding, rng);
            child.mutate(encoding, rng);
            child
        })
        .collect()
}

/// A full NSGA-II run: builds and evaluates an initial population, then
/// `evolve` advances it by the elitist generational loop (generate
/// offspring, evaluate, merge with the parent generation, sort into
/// fronts, fill the next generation front by front, splitting the
/// overflowing front by descending crowding distance).
pub struct NSGAII<V: Variable> {
    pub encoding: V,
    pub population: Population<V>,
    pub population_size: usize,
    pub tournament_size: usize,
}

impl<V: Variable> NSGAII<V> {
    pub fn new(
        encoding: V,
        population_size: usize,
        tournament_size: usize,
        objective_fn: &dyn Fn(&V::Genome) -> Vec<f64>,
        rng: &mut SimRng,
    ) -> Self {
        let mut population = Population::initialize(population_size, &encoding, rng);
        population.evaluate(objective_fn);
        Self {
            encoding,
            population,
            population_size,
            tournament_size,
        }
    }

    pub fn evolve(&mut self, generations: usize, objective_fn: &dyn Fn(&V::Genome) -> Vec<f64>, rng: &mut SimRng) {
        for _ in 0..generations {
            let mut offspring = generate_offspring(&self.population, &self.encoding, self.population_size, self.tournament_size, rng);
            for child in &mut offspring {
                child.set_objectives(objective_fn(&child.genome));
            }

            let mut combined: Vec<Individual<V>> = self.population.individuals.clone();
            combined.extend(offspring);
            let fronts = fast_non_dominated_sort(&mut combined, &self.encoding);
            for front in &fronts {
                calculate_crowding_distance(&mut combined, front);
            }

            let mut next_generation = Vec::with_capacity(self.population_size);
            for front in &fronts {
                if next_generation.len() + front.len() <= self.population_size {
                    next_generation.extend(front.iter().map(|&i| combined[i].clone()));
                } else {
                    let mut by_crowding = front.clone();
                    by_crowding.sort_by(|&a, &b| {
                        combined[b]
                            .crowding_distance
                            .partial_cmp(&combined[a].crowding_distance)
                            .expect("crowding distances are comparable")
                    });
                    let remaining = self.population_size - next_generation.len();
                    next_generation.extend(by_crowding.into_iter().take(remaining).map(|i| combined[i].clone()));
                    break;
                }
            }
            self.population = Population { individuals: next_generation };
        }
    }

    pub fn get_result(&self) -> &[Individual<V>] {
        &self.population.individuals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::MultiPermutationVariable;

    fn items() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    #[test]
    fn non_duplicate_front_zero_dominates_nothing_worse() {
        let encoding = MultiPermutationVariable::new(items(), 1);
        let mut rng = SimRng::new(1);
        let mut individuals: Vec<Individual<MultiPermutationVariable>> = (0..5)
            .map(|_| Individual::sampled(&encoding, &mut rng))
            .collect();
        for (i, ind) in individuals.iter_mut().enumerate() {
            ind.set_objectives(vec![i as f64, (4 - i) as f64]);
        }
        let fronts = fast_non_dominated_sort(&mut individuals, &encoding);
        assert_eq!(fronts.iter().map(|f| f.len()).sum::<usize>(), 5);
        assert_eq!(fronts[0].len(), 5);
    }

    #[test]
    fn duplicate_genomes_get_worst_rank() {
        let encoding = MultiPermutationVariable::new(items(), 1);
        let genome = encoding.sample(&mut SimRng::new(2));
        let mut individuals: Vec<Individual<MultiPermutationVariable>> = vec![
            Individual::new(genome.clone()),
            Individual::new(genome),
        ];
        individuals[0].set_objectives(vec![1.0, 1.0]);
        individuals[1].set_objectives(vec![1.0, 1.0]);
        fast_non_dominated_sort(&mut individuals, &encoding);
        assert_eq!(individuals[1].rank, DUPLICATE_RANK);
    }

    #[test]
    fn evolve_keeps_population_size_fixed() {
        let encoding = MultiPermutationVariable::new(items(), 1);
        let mut rng = SimRng::new(3);
        let objective_fn = |genome: &Vec<Vec<String>>| -> Vec<f64> {
            let row = &genome[0];
            vec![row.iter().map(|s| s.len()).sum::<usize>() as f64, row.len() as f64]
        };
        let mut nsga = NSGAII::new(encoding, 6, 2, &objective_fn, &mut rng);
        nsga.evolve(3, &objective_fn, &mut rng);
        assert_eq!(nsga.get_result().len(), 6);
    }
}
