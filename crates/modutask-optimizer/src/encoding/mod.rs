//! Pluggable genome encodings (SPEC_FULL.md §4.6), grounded on
//! `original_source/modutask/optimizer/my_moo/core/encoding/base.py`'s
//! `BaseVariable` abstract base.

mod configuration;
mod multi_permutation;

pub use configuration::ConfigurationVariable;
pub use multi_permutation::MultiPermutationVariable;

use modutask_core::SimRng;

/// A genome encoding: knows how to sample, mutate, recombine, validate,
/// and compare values of its own genome type. The RNG is always passed
/// in explicitly rather than drawn from a hidden global (§4.6/§9).
pub trait Variable {
    type Genome: Clone;

    fn sample(&self, rng: &mut SimRng) -> Self::Genome;
    fn mutate(&self, genome: &Self::Genome, rng: &mut SimRng) -> Self::Genome;
    fn crossover(&self, a: &Self::Genome, b: &Self::Genome, rng: &mut SimRng) -> Self::Genome;
    fn validate(&self, genome: &Self::Genome) -> bool;
    fn equals(&self, a: &Self::Genome, b: &Self::Genome) -> bool;
    fn hash_genome(&self, genome: &Self::Genome) -> u64;
}
