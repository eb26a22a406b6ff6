//! In-place editing of collection documents.
//!
//! A document is a JSON object whose `item` array holds collections
//! (`{name, item: [...]}`) and request items (`{name, request}`). Only the
//! located entry's `request` field is replaced; the rest of the parsed tree,
//! including keys this module knows nothing about, is written back as read.

use crate::errors::CollectionError;
use serde_json::{Map, Value};

/// Replaces the `request` of `request_name`, looked up inside the top-level
/// collection `collection_name` when one is given, or directly in the
/// top-level `item` array otherwise. Duplicate names resolve to the first
/// match. Nothing is modified unless the whole lookup succeeds.
pub fn save_request(
    document: &mut Value,
    collection_name: Option<&str>,
    request_name: &str,
    payload: Value,
) -> Result<(), CollectionError> {
    let items = item_array(document)?;
    let target = match collection_name.filter(|name| !name.is_empty()) {
        Some(collection) => {
            let node = find_named(items, collection)
                .ok_or_else(|| CollectionError::collection_not_found(collection))?;
            if !node.contains_key("item") {
                return Err(CollectionError::collection_not_found(collection));
            }
            let requests = nested_items(node, collection)?;
            find_named(requests, request_name)
                .ok_or_else(|| CollectionError::request_not_found(request_name))?
        }
        None => find_named(items, request_name)
            .ok_or_else(|| CollectionError::request_not_found(request_name))?,
    };
    target.insert("request".to_string(), payload);
    Ok(())
}

/// Byte-level variant used by the store: parse, edit, pretty-print.
pub fn save_request_bytes(
    content: &[u8],
    collection_name: Option<&str>,
    request_name: &str,
    payload: Value,
) -> Result<Vec<u8>, CollectionError> {
    let mut document = parse_document(content)?;
    save_request(&mut document, collection_name, request_name, payload)?;
    render_document(&document)
}

pub fn parse_document(content: &[u8]) -> Result<Value, CollectionError> {
    serde_json::from_slice(content)
        .map_err(|err| CollectionError::Internal(format!("document is not valid JSON: {}", err)))
}

pub fn render_document(document: &Value) -> Result<Vec<u8>, CollectionError> {
    let mut rendered = serde_json::to_vec_pretty(document)
        .map_err(|err| CollectionError::Internal(err.to_string()))?;
    rendered.push(b'\n');
    Ok(rendered)
}

fn item_array(document: &mut Value) -> Result<&mut Vec<Value>, CollectionError> {
    let root = match document {
        Value::Object(map) => map,
        Value::Null => {
            return Err(CollectionError::InvalidStructure(
                "missing 'item' array.".to_string(),
            ))
        }
        _ => {
            return Err(CollectionError::InvalidStructure(
                "document root is not an object.".to_string(),
            ))
        }
    };
    let items = root
        .get_mut("item")
        .ok_or_else(|| CollectionError::InvalidStructure("missing 'item' array.".to_string()))?;
    as_object_array(items)
        .ok_or_else(|| CollectionError::InvalidStructure("'item' is not a valid array.".to_string()))
}

/// A collection whose `item` is not an array of objects is
/// `InvalidStructure`, not `Internal`, the same as a malformed top level.
fn nested_items<'a>(
    node: &'a mut Map<String, Value>,
    collection: &str,
) -> Result<&'a mut Vec<Value>, CollectionError> {
    node.get_mut("item")
        .and_then(as_object_array)
        .ok_or_else(|| {
            CollectionError::InvalidStructure(format!(
                "'item' of collection '{}' is not a valid array.",
                collection
            ))
        })
}

fn as_object_array(value: &mut Value) -> Option<&mut Vec<Value>> {
    let array = value.as_array_mut()?;
    array.iter().all(Value::is_object).then_some(array)
}

fn find_named<'a>(items: &'a mut [Value], name: &str) -> Option<&'a mut Map<String, Value>> {
    items
        .iter_mut()
        .filter_map(Value::as_object_mut)
        .find(|entry| entry.get("name").and_then(Value::as_str) == Some(name))
}
