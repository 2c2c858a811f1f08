//! Error taxonomy for modutask (see SPEC_FULL.md §7)

use thiserror::Error;

/// Structured diagnostics for every fatal condition the core can raise.
///
/// Variants map directly onto the taxonomy in SPEC_FULL.md §7: validation
/// errors are raised while loading catalogs, invariant errors while running
/// a simulation step, and scenario errors while cloning.
#[derive(Error, Debug)]
pub enum ModutaskError {
    /// Malformed catalog, unknown cross-reference, cyclic dependency, or
    /// any other condition that is fatal at load time.
    #[error("validation error: {0}")]
    Validation(String),

    /// A runtime invariant was violated: e.g. mutating an ERROR module,
    /// travelling without enough battery, assigning a robot at the wrong
    /// coordinate, a transport step leaving a carrier behind.
    #[error("invariant violated for {entity}: {message}")]
    Invariant { entity: String, message: String },

    /// An entity referenced by name could not be found in its arena.
    #[error("{entity_type} not found: {name}")]
    NotFound {
        entity_type: &'static str,
        name: String,
    },

    /// A risk scenario could not be reconstructed deterministically from
    /// (name, seed) while cloning.
    #[error("scenario '{name}' is not reproducible: {message}")]
    ScenarioNotReproducible { name: String, message: String },

    /// IO error encountered while loading or saving catalogs/results.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ModutaskError {
    pub fn module_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Module",
            name: name.into(),
        }
    }

    pub fn robot_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Robot",
            name: name.into(),
        }
    }

    pub fn task_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Task",
            name: name.into(),
        }
    }

    pub fn charge_station_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "ChargeStation",
            name: name.into(),
        }
    }

    pub fn invariant(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invariant {
            entity: entity.into(),
            message: message.into(),
        }
    }
}

/// Result type alias used throughout modutask.
pub type ModutaskResult<T> = Result<T, ModutaskError>;
