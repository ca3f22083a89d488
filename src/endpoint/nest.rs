use super::types::ExampleValue;
use crate::error::ValidationError;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// A node in the nested body-parameter tree
///
/// Dotted segments of a flat parameter name open object levels, bracket
/// segments open list levels, and the original example values sit at the
/// leaves. Serializes as the plain JSON structure a request body would have.
#[derive(Debug, Clone, PartialEq)]
pub enum NestedValue {
    /// Leaf holding the parameter's example value
    Value(ExampleValue),
    Object(IndexMap<String, NestedValue>),
    List(Vec<NestedValue>),
}

impl NestedValue {
    /// All example values reachable under this node, in tree order
    pub fn leaves(&self) -> Vec<&ExampleValue> {
        match self {
            NestedValue::Value(example) => vec![example],
            NestedValue::Object(map) => map.values().flat_map(NestedValue::leaves).collect(),
            NestedValue::List(items) => items.iter().flat_map(NestedValue::leaves).collect(),
        }
    }
}

impl Serialize for NestedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NestedValue::Value(example) => example.serialize(serializer),
            NestedValue::Object(map) => map.serialize(serializer),
            NestedValue::List(items) => items.serialize(serializer),
        }
    }
}

/// One step of a flat parameter name: a map key or a list index
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Split a flat parameter name into path segments
///
/// `user.name` yields two keys; `items[].id` and `items[0].id` yield a key,
/// an index (`[]` counts as index 0), and a key. A name that starts with a
/// bare bracket (`[].id`, a root-is-array body) is filed under the literal
/// marker key `[]`.
fn parse_segments(name: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for piece in name.split('.') {
        let key_end = piece.find('[').unwrap_or(piece.len());
        let key = &piece[..key_end];
        if !key.is_empty() {
            segments.push(Segment::Key(key.to_string()));
        } else if segments.is_empty() {
            segments.push(Segment::Key("[]".to_string()));
        } else if key_end == piece.len() {
            // degenerate piece like the middle of "a..b"; keep it literal
            segments.push(Segment::Key(String::new()));
        }
        let mut rest = &piece[key_end..];
        while let Some(close) = rest.find(']') {
            let inner = &rest[1..close];
            if inner.is_empty() {
                segments.push(Segment::Index(0));
            } else if let Ok(index) = inner.parse::<usize>() {
                segments.push(Segment::Index(index));
            } else {
                segments.push(Segment::Key(inner.to_string()));
            }
            rest = &rest[close + 1..];
        }
    }
    segments
}

/// Regroup a flat name → example map into the nested tree
///
/// Lossless: the leaf values of the result are exactly the values of the
/// input map. Two names claiming the same path with incompatible shapes
/// (`user` as a value next to `user.name`) fail with a
/// [`ValidationError::ConflictingField`].
pub fn nest_parameters(
    clean: &IndexMap<String, ExampleValue>,
) -> Result<IndexMap<String, NestedValue>, ValidationError> {
    let mut root = IndexMap::new();
    for (name, example) in clean {
        let segments = parse_segments(name);
        match segments.split_first() {
            Some((Segment::Key(key), rest)) => {
                insert_into_map(&mut root, key, rest, example, name)?
            }
            // parse_segments always emits a leading key
            _ => {
                return Err(ValidationError::ConflictingField {
                    field: name.clone(),
                })
            }
        }
    }
    Ok(root)
}

fn empty_container(segment: &Segment) -> NestedValue {
    match segment {
        Segment::Key(_) => NestedValue::Object(IndexMap::new()),
        Segment::Index(_) => NestedValue::List(Vec::new()),
    }
}

/// List padding leaves empty objects behind; those slots are free to claim
fn is_vacant(node: &NestedValue) -> bool {
    matches!(node, NestedValue::Object(map) if map.is_empty())
}

fn insert_into_map(
    map: &mut IndexMap<String, NestedValue>,
    key: &str,
    rest: &[Segment],
    example: &ExampleValue,
    path: &str,
) -> Result<(), ValidationError> {
    match map.get_mut(key) {
        None => {
            if rest.is_empty() {
                map.insert(key.to_string(), NestedValue::Value(example.clone()));
            } else {
                let mut node = empty_container(&rest[0]);
                descend(&mut node, rest, example, path)?;
                map.insert(key.to_string(), node);
            }
            Ok(())
        }
        Some(node) => {
            if rest.is_empty() {
                if is_vacant(node) {
                    *node = NestedValue::Value(example.clone());
                    Ok(())
                } else {
                    Err(ValidationError::ConflictingField {
                        field: path.to_string(),
                    })
                }
            } else {
                descend(node, rest, example, path)
            }
        }
    }
}

fn descend(
    node: &mut NestedValue,
    segments: &[Segment],
    example: &ExampleValue,
    path: &str,
) -> Result<(), ValidationError> {
    match &segments[0] {
        Segment::Key(key) => match node {
            NestedValue::Object(map) => insert_into_map(map, key, &segments[1..], example, path),
            _ => Err(ValidationError::ConflictingField {
                field: path.to_string(),
            }),
        },
        Segment::Index(index) => match node {
            NestedValue::List(items) => {
                while items.len() <= *index {
                    items.push(NestedValue::Object(IndexMap::new()));
                }
                let child = &mut items[*index];
                if segments.len() == 1 {
                    if is_vacant(child) {
                        *child = NestedValue::Value(example.clone());
                        Ok(())
                    } else {
                        Err(ValidationError::ConflictingField {
                            field: path.to_string(),
                        })
                    }
                } else {
                    if is_vacant(child) {
                        *child = empty_container(&segments[1]);
                    }
                    descend(child, &segments[1..], example, path)
                }
            }
            _ => Err(ValidationError::ConflictingField {
                field: path.to_string(),
            }),
        },
    }
}
