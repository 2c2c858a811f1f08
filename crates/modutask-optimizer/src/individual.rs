//! A genome paired with its objective vector and NSGA-II bookkeeping
//! (rank, crowding distance). Grounded on
//! `original_source/modutask/optimizer/my_moo/core/individual.py`.

use modutask_core::SimRng;

use crate::encoding::Variable;

/// Rank assigned to genome-equal duplicates during non-dominated sorting,
/// pushing them to the back of every selection regardless of objectives.
pub const DUPLICATE_RANK: usize = usize::MAX;

pub struct Individual<V: Variable> {
    pub genome: V::Genome,
    pub objectives: Vec<f64>,
    pub rank: usize,
    pub crowding_distance: f64,
}

impl<V: Variable> Individual<V> {
    pub fn sampled(encoding: &V, rng: &mut SimRng) -> Self {
        Self::new(encoding.sample(rng))
    }

    pub fn new(genome: V::Genome) -> Self {
        Self {
            genome,
            objectives: Vec::new(),
            rank: 0,
            crowding_distance: 0.0,
        }
    }

    pub fn set_objectives(&mut self, values: Vec<f64>) {
        self.objectives = values;
    }

    pub fn crossover(&self, other: &Self, encoding: &V, rng: &mut SimRng) -> Self {
        Self::new(encoding.crossover(&self.genome, &other.genome, rng))
    }

    pub fn mutate(&mut self, encoding: &V, rng: &mut SimRng) {
        self.genome = encoding.mutate(&self.genome, rng);
    }

    pub fn equals(&self, other: &Self, encoding: &V) -> bool {
        encoding.equals(&self.genome, &other.genome)
    }

    pub fn hash_genome(&self, encoding: &V) -> u64 {
        encoding.hash_genome(&self.genome)
    }
}

impl<V: Variable> Clone for Individual<V> {
    fn clone(&self) -> Self {
        Self {
            genome: self.genome.clone(),
            objectives: self.objectives.clone(),
            rank: self.rank,
            crowding_distance: self.crowding_distance,
        }
    }
}
