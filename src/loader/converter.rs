use crate::error::{Result, TreatyError};
use crate::models::contract::{ApiSchemaSet, EndpointId, EndpointSchemas};
use crate::models::openapi::{
    AdditionalProperties, MediaType, OpenApiDocument, RefOr, RequestBody, Response, SchemaObject,
};
use crate::models::schema::{CompositionMode, PropertySchema, SchemaNode, Shape};
use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

const SCHEMA_PREFIX: &str = "#/components/schemas/";
const REQUEST_BODY_PREFIX: &str = "#/components/requestBodies/";
const RESPONSE_PREFIX: &str = "#/components/responses/";

/// Derive the body schemas of every operation in the document
pub fn to_schema_set(document: &OpenApiDocument) -> Result<ApiSchemaSet> {
    let empty = IndexMap::new();
    let components = document
        .components
        .as_ref()
        .map(|c| &c.schemas)
        .unwrap_or(&empty);

    detect_cycles(components)?;

    let mut converter = SchemaConverter::new(components);
    let mut set = ApiSchemaSet::new();
    set.title = Some(document.info.title.clone());
    set.version = Some(document.info.version.clone());

    for (path, item) in &document.paths {
        for (method, operation) in item.operations() {
            let id = EndpointId::new(method, path.clone());
            let mut schemas = EndpointSchemas::new();

            if let Some(body) = &operation.request_body {
                let body = resolve_request_body(document, body)?;
                if let Some(schema) = json_schema(&body.content) {
                    schemas.request = Some(converter.convert(schema)?);
                }
            }

            for (status, response) in &operation.responses {
                let response = resolve_response(document, response)?;
                let schema = json_schema(&response.content)
                    .map(|schema| converter.convert(schema))
                    .transpose()?;
                schemas.responses.insert(status.clone(), schema);
            }

            tracing::debug!(
                endpoint = %id,
                responses = schemas.responses.len(),
                "derived endpoint schemas"
            );
            set.insert(id, schemas);
        }
    }

    tracing::info!(
        title = %document.info.title,
        endpoints = set.len(),
        components = components.len(),
        "converted OpenAPI document"
    );
    Ok(set)
}

/// Reject component schemas that reference themselves, directly or transitively
pub fn detect_cycles(components: &IndexMap<String, SchemaObject>) -> Result<()> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();

    for name in components.keys() {
        index.insert(name.as_str(), graph.add_node(name.as_str()));
    }

    for (name, schema) in components {
        let Some(&from) = index.get(name.as_str()) else {
            continue;
        };
        for reference in schema.references() {
            // dangling references surface during conversion
            if let Some(&to) = component_name(reference).and_then(|target| index.get(target)) {
                graph.add_edge(from, to, ());
            }
        }
    }

    for component in tarjan_scc(&graph) {
        let self_loop = component.len() == 1 && graph.contains_edge(component[0], component[0]);
        if component.len() > 1 || self_loop {
            let mut members: Vec<String> = component
                .iter()
                .rev()
                .map(|&node| graph[node].to_string())
                .collect();
            members.push(members[0].clone());
            return Err(TreatyError::CyclicSchema(members));
        }
    }

    Ok(())
}

fn component_name(reference: &str) -> Option<&str> {
    reference.strip_prefix(SCHEMA_PREFIX)
}

fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Schema of the first JSON-like media type
fn json_schema(content: &IndexMap<String, MediaType>) -> Option<&SchemaObject> {
    content
        .iter()
        .filter(|(media_type, _)| is_json_media_type(media_type))
        .find_map(|(_, media)| media.schema.as_ref())
}

fn resolve_request_body<'a>(
    document: &'a OpenApiDocument,
    body: &'a RefOr<RequestBody>,
) -> Result<&'a RequestBody> {
    match body {
        RefOr::Item(body) => Ok(body),
        RefOr::Ref { reference } => reference
            .strip_prefix(REQUEST_BODY_PREFIX)
            .and_then(|name| document.components.as_ref()?.request_bodies.get(name))
            .ok_or_else(|| TreatyError::UnresolvedReference(reference.clone())),
    }
}

fn resolve_response<'a>(
    document: &'a OpenApiDocument,
    response: &'a RefOr<Response>,
) -> Result<&'a Response> {
    match response {
        RefOr::Item(response) => Ok(response),
        RefOr::Ref { reference } => reference
            .strip_prefix(RESPONSE_PREFIX)
            .and_then(|name| document.components.as_ref()?.responses.get(name))
            .ok_or_else(|| TreatyError::UnresolvedReference(reference.clone())),
    }
}

/// Converts OpenAPI schema objects into schema nodes, memoising resolved components.
///
/// Components must be free of cycles (see [`detect_cycles`]).
pub struct SchemaConverter<'a> {
    components: &'a IndexMap<String, SchemaObject>,
    resolved: HashMap<String, SchemaNode>,
}

impl<'a> SchemaConverter<'a> {
    pub fn new(components: &'a IndexMap<String, SchemaObject>) -> Self {
        Self {
            components,
            resolved: HashMap::new(),
        }
    }

    pub fn convert(&mut self, schema: &SchemaObject) -> Result<SchemaNode> {
        if let Some(reference) = &schema.reference {
            return self.resolve(reference);
        }

        let mut node = self.shape(schema)?;

        let type_allows_null = schema
            .schema_type
            .as_ref()
            .is_some_and(|t| t.names().contains(&"null"));
        if schema.nullable == Some(true) || type_allows_null {
            node = node.nullable();
        }
        if let Some(example) = &schema.example {
            node = node.with_example(example.clone());
        }
        if let Some(description) = &schema.description {
            node = node.with_description(description.clone());
        }
        Ok(node)
    }

    fn resolve(&mut self, reference: &str) -> Result<SchemaNode> {
        let name = component_name(reference)
            .ok_or_else(|| TreatyError::UnresolvedReference(reference.to_string()))?;
        if let Some(node) = self.resolved.get(name) {
            return Ok(node.clone());
        }

        let components = self.components;
        let schema = components
            .get(name)
            .ok_or_else(|| TreatyError::UnresolvedReference(reference.to_string()))?;
        let node = self.convert(schema)?;
        tracing::debug!(component = name, "resolved schema component");
        self.resolved.insert(name.to_string(), node.clone());
        Ok(node)
    }

    fn shape(&mut self, schema: &SchemaObject) -> Result<SchemaNode> {
        let composed = if !schema.all_of.is_empty() {
            self.composition(CompositionMode::AllOf, &schema.all_of, schema)?
        } else if !schema.one_of.is_empty() {
            self.composition(CompositionMode::OneOf, &schema.one_of, schema)?
        } else if !schema.any_of.is_empty() {
            self.composition(CompositionMode::AnyOf, &schema.any_of, schema)?
        } else {
            return self.plain(schema);
        };

        let has_object_keywords = !schema.properties.is_empty()
            || !schema.required.is_empty()
            || schema.additional_properties.is_some();
        if !has_object_keywords {
            return Ok(composed);
        }

        // sibling object keywords hold for the value alongside the composition
        let siblings = self.object(schema)?;
        match composed {
            SchemaNode {
                shape: Shape::Composition(mut composition),
                ..
            } if composition.mode == CompositionMode::AllOf => {
                composition.branches.push(siblings);
                Ok(SchemaNode::new(Shape::Composition(composition)))
            }
            other => Ok(SchemaNode::all_of(vec![other, siblings])),
        }
    }

    fn plain(&mut self, schema: &SchemaObject) -> Result<SchemaNode> {

        let types: Vec<&str> = schema
            .schema_type
            .as_ref()
            .map(|t| t.names())
            .unwrap_or_default()
            .into_iter()
            .filter(|name| *name != "null")
            .collect();
        let null_only = schema.schema_type.is_some() && types.is_empty();

        match types.as_slice() {
            [] if null_only => Ok(SchemaNode::null()),
            [] if !schema.properties.is_empty() || schema.additional_properties.is_some() => {
                self.typed("object", schema)
            }
            [] if schema.items.is_some() => self.typed("array", schema),
            [] => Ok(SchemaNode::any()),
            [single] => self.typed(single, schema),
            several => {
                let branches = several
                    .iter()
                    .map(|name| self.typed(name, schema))
                    .collect::<Result<Vec<_>>>()?;
                Ok(SchemaNode::any_of(branches))
            }
        }
    }

    fn typed(&mut self, type_name: &str, schema: &SchemaObject) -> Result<SchemaNode> {
        let node = match type_name {
            "string" => {
                let mut node = SchemaNode::string();
                if let Some(format) = &schema.format {
                    node = node.with_format(format);
                } else if let Some(pattern) = &schema.pattern {
                    node = node.with_pattern(pattern)?;
                }
                node.with_length(schema.min_length, schema.max_length)
            }
            "integer" => SchemaNode::integer().with_range(schema.minimum, schema.maximum),
            "number" => SchemaNode::number().with_range(schema.minimum, schema.maximum),
            "boolean" => SchemaNode::boolean(),
            "null" => SchemaNode::null(),
            "object" => self.object(schema)?,
            "array" => {
                let items = match &schema.items {
                    Some(items) => self.convert(items)?,
                    None => SchemaNode::any(),
                };
                SchemaNode::array(items).with_item_count(schema.min_items, schema.max_items)
            }
            other => {
                return Err(TreatyError::InvalidSchema(format!(
                    "unknown schema type '{}'",
                    other
                )));
            }
        };

        let node = match (&schema.enum_values, &schema.const_value) {
            (_, Some(value)) => node.with_const(value.clone()),
            (Some(values), None) => node.with_enum(values.clone()),
            (None, None) => node,
        };
        Ok(node)
    }

    fn object(&mut self, schema: &SchemaObject) -> Result<SchemaNode> {
        let mut node = SchemaNode::object();

        for (name, property) in &schema.properties {
            let mut prop = PropertySchema::new(name, self.convert(property)?);
            if property.read_only {
                prop = prop.read_only();
            } else if property.write_only {
                prop = prop.write_only();
            }
            node = node.with_property(prop, schema.required.contains(name));
        }

        // required names without a declaration still have to be present
        for name in &schema.required {
            if !schema.properties.contains_key(name) {
                node = node.required_property(name, SchemaNode::any());
            }
        }

        let additional = !matches!(
            schema.additional_properties,
            Some(AdditionalProperties::Allowed(false))
        );
        Ok(node.additional_properties(additional))
    }

    fn composition(
        &mut self,
        mode: CompositionMode,
        branches: &[SchemaObject],
        schema: &SchemaObject,
    ) -> Result<SchemaNode> {
        let nodes = branches
            .iter()
            .map(|branch| self.convert(branch))
            .collect::<Result<Vec<_>>>()?;
        let node = SchemaNode::composition(mode, nodes);

        let Some(discriminator) = &schema.discriminator else {
            return Ok(node);
        };

        let mapping: Vec<(String, usize)> = if discriminator.mapping.is_empty() {
            // implicit mapping: the component name of each referenced branch
            branches
                .iter()
                .enumerate()
                .filter_map(|(index, branch)| {
                    let name = component_name(branch.reference.as_deref()?)?;
                    Some((name.to_string(), index))
                })
                .collect()
        } else {
            discriminator
                .mapping
                .iter()
                .map(|(value, target)| {
                    let target = if target.starts_with('#') {
                        target.clone()
                    } else {
                        format!("{}{}", SCHEMA_PREFIX, target)
                    };
                    branches
                        .iter()
                        .position(|branch| branch.reference.as_deref() == Some(target.as_str()))
                        .map(|index| (value.clone(), index))
                        .ok_or_else(|| {
                            TreatyError::InvalidSchema(format!(
                                "discriminator value '{}' maps to '{}', which is not a branch",
                                value, target
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?
        };

        node.with_discriminator(&discriminator.property_name, mapping)
    }
}
