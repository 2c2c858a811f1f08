//! A flat collection of individuals sharing one encoding. Grounded on
//! `original_source/modutask/optimizer/my_moo/core/population.py`.

use modutask_core::SimRng;

use crate::encoding::Variable;
use crate::individual::Individual;

pub struct Population<V: Variable> {
    pub individuals: Vec<Individual<V>>,
}

impl<V: Variable> Population<V> {
    pub fn initialize(size: usize, encoding: &V, rng: &mut SimRng) -> Self {
        let individuals = (0..size).map(|_| Individual::sampled(encoding, rng)).collect();
        Self { individuals }
    }

    pub fn evaluate(&mut self, objective_fn: impl Fn(&V::Genome) -> Vec<f64>) {
        for individual in &mut self.individuals {
            let values = objective_fn(&individual.genome);
            individual.set_objectives(values);
        }
    }
}

impl<V: Variable> Clone for Population<V> {
    fn clone(&self) -> Self {
        Self {
            individuals: self.individuals.clone(),
        }
    }
}
