use super::coerce::coerce_primitive;
use super::context::ParseContext;
use super::error::{LocatedError, ValueError};
use super::style::Structural;
use crate::runtime_config::DecodeLimits;
use crate::spec::{SchemaNode, DEFAULT_PROPERTY_SCHEMA};
use crate::value::Value;
use indexmap::IndexMap;

/// Walk a structural value against its schema, coercing every leaf.
///
/// A value whose shape does not match the schema node (a scalar where an
/// array was declared, say) is passed through uncoerced; shape validation is
/// left to the host's schema validator. Passed-through values still count
/// against the depth and item limits. Properties the schema does not
/// declare are coerced as strings, which leaves them unchanged.
pub fn walk(
    node: &SchemaNode,
    value: Structural,
    ctx: &ParseContext<'_>,
    limits: &DecodeLimits,
) -> Result<Value, LocatedError> {
    match (node, value) {
        (SchemaNode::Primitive(schema), Structural::Text(text)) => {
            coerce_primitive(schema, Value::String(text)).map_err(|e| ctx.locate(e))
        }
        (SchemaNode::ArrayOf(items), Structural::Sequence(elements)) => {
            check_len(elements.len(), ctx, limits)?;
            let mut out = Vec::with_capacity(elements.len());
            for (i, element) in elements.into_iter().enumerate() {
                let child = ctx.index(i);
                check_depth(&child, limits)?;
                out.push(walk(items, element, &child, limits)?);
            }
            Ok(Value::Array(out))
        }
        (SchemaNode::ObjectOf(properties), Structural::Mapping(entries)) => {
            check_len(entries.len(), ctx, limits)?;
            let mut out = IndexMap::with_capacity(entries.len());
            for (key, entry) in entries {
                let schema = properties.get(&key).unwrap_or(&DEFAULT_PROPERTY_SCHEMA);
                let decoded = {
                    let child = ctx.key(&key);
                    check_depth(&child, limits)?;
                    walk(schema, entry, &child, limits)?
                };
                out.insert(key, decoded);
            }
            Ok(Value::Object(out))
        }
        (_, other) => {
            check_structure(&other, ctx, limits)?;
            Ok(other.into_value())
        }
    }
}

/// Apply the limits to a value the schema does not describe.
fn check_structure(
    value: &Structural,
    ctx: &ParseContext<'_>,
    limits: &DecodeLimits,
) -> Result<(), LocatedError> {
    match value {
        Structural::Sequence(elements) => {
            check_len(elements.len(), ctx, limits)?;
            for (i, element) in elements.iter().enumerate() {
                let child = ctx.index(i);
                check_depth(&child, limits)?;
                check_structure(element, &child, limits)?;
            }
        }
        Structural::Mapping(entries) => {
            check_len(entries.len(), ctx, limits)?;
            for (key, entry) in entries {
                let child = ctx.key(key);
                check_depth(&child, limits)?;
                check_structure(entry, &child, limits)?;
            }
        }
        Structural::Text(_) | Structural::Typed(_) => {}
    }
    Ok(())
}

fn check_len(len: usize, ctx: &ParseContext<'_>, limits: &DecodeLimits) -> Result<(), LocatedError> {
    if len > limits.max_items {
        return Err(ctx.locate(ValueError::TooManyItems {
            limit: limits.max_items,
        }));
    }
    Ok(())
}

fn check_depth(ctx: &ParseContext<'_>, limits: &DecodeLimits) -> Result<(), LocatedError> {
    if ctx.depth() > limits.max_depth {
        return Err(ctx.locate(ValueError::TooDeep {
            limit: limits.max_depth,
        }));
    }
    Ok(())
}
