//! Modutask Config - catalog and property-file loading, validation,
//! scenario construction, objective functions, and result export.

pub mod catalogs;
pub mod loader;
pub mod objective;
pub mod output;
pub mod validation;

pub use catalogs::{Catalogs, ConfigError, PropertyFile};
pub use loader::{add_assembly_tasks, build_scenario, validate_task_priority};
pub use objective::{configuration_objective, task_allocation_objective};
pub use output::{write_end_of_run_snapshot, write_objectives_csv, write_robot_fleet, ObjectiveRow};
pub use validation::{validate_catalogs, FieldPath, ValidationError, ValidationErrorKind};
