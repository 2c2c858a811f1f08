//! A genome of `n_multi` independent permutations over a fixed item set
//! (used for per-robot task-priority lists). Grounded on
//! `original_source/modutask/optimizer/my_moo/core/encoding/multi_permutation.py`.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use modutask_core::SimRng;

use super::Variable;

#[derive(Debug, Clone)]
pub struct MultiPermutationVariable {
    pub items: Vec<String>,
    pub n_multi: usize,
}

impl MultiPermutationVariable {
    pub fn new(items: Vec<String>, n_multi: usize) -> Self {
        Self { items, n_multi }
    }
}

impl Variable for MultiPermutationVariable {
    type Genome = Vec<Vec<String>>;

    fn sample(&self, rng: &mut SimRng) -> Self::Genome {
        (0..self.n_multi)
            .map(|_| {
                let mut perm = self.items.clone();
                rng.shuffle(&mut perm);
                perm
            })
            .collect()
    }

    /// Swap mutation: each row independently has probability `1/n_multi`
    /// of having two distinct positions swapped.
    fn mutate(&self, genome: &Self::Genome, rng: &mut SimRng) -> Self::Genome {
        let p = 1.0 / self.n_multi.max(1) as f64;
        genome
            .iter()
            .map(|perm| {
                let mut new_perm = perm.clone();
                if new_perm.len() >= 2 && rng.gen_f64() < p {
                    let i = rng.gen_range(0..new_perm.len());
                    let mut j = rng.gen_range(0..new_perm.len());
                    while j == i {
                        j = rng.gen_range(0..new_perm.len());
                    }
                    new_perm.swap(i, j);
                }
                new_perm
            })
            .collect()
    }

    /// Order crossover (OX), row by row, with a random per-row choice of
    /// which parent supplies the retained slice.
    fn crossover(&self, a: &Self::Genome, b: &Self::Genome, rng: &mut SimRng) -> Self::Genome {
        a.iter()
            .zip(b.iter())
            .map(|(row_a, row_b)| {
                let (p1, p2) = if rng.gen_f64() < 0.5 { (row_a, row_b) } else { (row_b, row_a) };
                order_crossover(p1, p2, rng)
            })
            .collect()
    }

    fn validate(&self, genome: &Self::Genome) -> bool {
        if genome.len() != self.n_multi {
            return false;
        }
        let reference: HashSet<&String> = self.items.iter().collect();
        genome.iter().all(|perm| {
            perm.len() == self.items.len() && perm.iter().collect::<HashSet<_>>() == reference
        })
    }

    fn equals(&self, a: &Self::Genome, b: &Self::Genome) -> bool {
        a == b
    }

    fn hash_genome(&self, genome: &Self::Genome) -> u64 {
        genome
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, perm)| {
                let mut hasher = DefaultHasher::new();
                perm.hash(&mut hasher);
                acc.wrapping_add(hasher.finish().wrapping_mul((i + 1) as u64))
            })
    }
}

fn order_crossover(p1: &[String], p2: &[String], rng: &mut SimRng) -> Vec<String> {
    let size = p1.len();
    if size == 0 {
        return Vec::new();
    }
    let mut start = rng.gen_range(0..size);
    let mut end = rng.gen_range(0..size);
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }
    let mut child: Vec<Option<String>> = vec![None; size];
    for i in start..=end {
        child[i] = Some(p1[i].clone());
    }
    let taken: HashSet<String> = child.iter().filter_map(|x| x.clone()).collect();
    let mut fill = p2.iter().filter(|item| !taken.contains(item.as_str()));
    for slot in child.iter_mut() {
        if slot.is_none() {
            *slot = fill.next().cloned();
        }
    }
    child.into_iter().map(|x| x.expect("fill exhausted before slots")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into(), "d".into()]
    }

    #[test]
    fn sample_produces_n_multi_permutations_of_items() {
        let v = MultiPermutationVariable::new(items(), 3);
        let mut rng = SimRng::new(1);
        let genome = v.sample(&mut rng);
        assert!(v.validate(&genome));
        assert_eq!(genome.len(), 3);
    }

    #[test]
    fn crossover_produces_valid_offspring() {
        let v = MultiPermutationVariable::new(items(), 2);
        let mut rng = SimRng::new(2);
        let a = v.sample(&mut rng);
        let b = v.sample(&mut rng);
        let child = v.crossover(&a, &b, &mut rng);
        assert!(v.validate(&child));
    }

    #[test]
    fn mutate_keeps_genome_valid() {
        let v = MultiPermutationVariable::new(items(), 4);
        let mut rng = SimRng::new(3);
        let genome = v.sample(&mut rng);
        for _ in 0..20 {
            let mutated = v.mutate(&genome, &mut rng);
            assert!(v.validate(&mutated));
        }
    }
}
