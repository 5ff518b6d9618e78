pub mod cache;
pub mod cli;
pub mod commands;
pub mod compare;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod report;
pub mod sample;
pub mod telemetry;
pub mod validation;

pub use cache::{ContractType, SchemaCache};
pub use compare::{Change, ChangeKind, ComparisonReport, Severity, compare};
pub use error::{Result, TreatyError};
pub use sample::generate_sample;
pub use validation::{
    BodySchema, Direction, Expectation, PartialValidationConfig, Violation, ViolationKind,
    validate, validate_str,
};
