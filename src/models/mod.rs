pub mod contract;
pub mod matcher;
pub mod openapi;
pub mod schema;

pub use contract::{ApiSchemaSet, EndpointId, EndpointSchemas};
pub use matcher::{Matcher, Template};
pub use schema::{Direction, PropertySchema, SchemaNode, Visibility};
