//! Modutask Optimizer - a generic NSGA-II core over pluggable variable
//! encodings (SPEC_FULL.md §4.6/§4.7/§4.8), grounded on
//! `original_source/modutask/optimizer/my_moo`.

pub mod encoding;
pub mod individual;
pub mod nsgaii;
pub mod population;
pub mod selection;

pub use encoding::{ConfigurationVariable, MultiPermutationVariable, Variable};
pub use individual::Individual;
pub use nsgaii::{calculate_crowding_distance, fast_non_dominated_sort, NSGAII};
pub use population::Population;
pub use selection::{dominates, non_dominated, select_kmeans_representatives};
