pub mod diff;
pub mod list;
pub mod sample;
pub mod validate;

pub use diff::execute_diff;
pub use list::execute_list;
pub use sample::execute_sample;
pub use validate::{ValidateOptions, execute_validate};

use crate::TreatyError;
use crate::models::contract::{ApiSchemaSet, EndpointId};
use crate::models::schema::SchemaNode;
use crate::validation::Direction;

/// Pick the body schema of one side of an endpoint.
///
/// Responses default to the first documented 2xx status that has a body.
pub fn select_schema<'a>(
    set: &'a ApiSchemaSet,
    endpoint: &str,
    direction: Direction,
    status: Option<&str>,
) -> crate::Result<&'a SchemaNode> {
    let id = EndpointId::parse(endpoint).ok_or_else(|| {
        TreatyError::EndpointNotFound(format!(
            "'{}' is not of the form \"METHOD /path\"",
            endpoint
        ))
    })?;
    let schemas = set
        .get(&id)
        .ok_or_else(|| TreatyError::EndpointNotFound(id.to_string()))?;

    match direction {
        Direction::Request => schemas.request.as_ref().ok_or_else(|| {
            TreatyError::EndpointNotFound(format!("{} has no JSON request body", id))
        }),
        Direction::Response => {
            let found = match status {
                Some(status) => schemas.response(status),
                None => schemas
                    .responses
                    .iter()
                    .filter(|(code, _)| code.starts_with('2'))
                    .find_map(|(_, schema)| schema.as_ref()),
            };
            found.ok_or_else(|| {
                TreatyError::EndpointNotFound(format!(
                    "{} has no JSON response body for status {}",
                    id,
                    status.unwrap_or("2xx")
                ))
            })
        }
    }
}
