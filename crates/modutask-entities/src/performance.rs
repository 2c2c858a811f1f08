//! The fixed robot performance attribute set (SPEC_FULL.md §3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerformanceAttribute {
    Transport,
    Manufacture,
    Mobility,
}

impl PerformanceAttribute {
    pub const ALL: [PerformanceAttribute; 3] = [
        PerformanceAttribute::Transport,
        PerformanceAttribute::Manufacture,
        PerformanceAttribute::Mobility,
    ];
}
