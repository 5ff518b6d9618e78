pub mod converter;
pub mod openapi;

pub use converter::{SchemaConverter, detect_cycles, to_schema_set};
pub use openapi::{load_openapi, load_schema_set, parse_openapi};
