// src/json.rs
//! The JSON bridge (A5): the concrete, implemented stand-in for the out-of-scope "JSON parser
//! collaborator" (§6). `serde_json::Number` is split onto `Tree::Integer`/`Tree::Decimal` using
//! the same exact-i64-else-decimal rule the finalized form uses for its own integer/decimal
//! split, so a JSON-sourced tree finalizes to the same raw types as an equivalent hand-built one.

use serde_json::{Map, Number, Value as Json};

use crate::buffer::{Atomic, FinalizedBuffer, RefCount};
use crate::error::DartError;
use crate::transition::{finalize, lift};
use crate::tree::Tree;

pub fn tree_from_json(value: &Json) -> Tree {
    match value {
        Json::Null => Tree::Null,
        Json::Bool(b) => Tree::Bool(*b),
        Json::Number(n) => tree_from_number(n),
        Json::String(s) => Tree::Str(s.clone()),
        Json::Array(items) => Tree::Array(items.iter().map(tree_from_json).collect()),
        Json::Object(map) => Tree::Object(map.iter().map(|(k, v)| (k.clone(), tree_from_json(v))).collect()),
    }
}

fn tree_from_number(n: &Number) -> Tree {
    match n.as_i64() {
        Some(i) => Tree::Integer(i),
        None => Tree::Decimal(n.as_f64().unwrap_or(f64::NAN)),
    }
}

pub fn json_from_tree(tree: &Tree) -> Json {
    match tree {
        Tree::Null => Json::Null,
        Tree::Bool(b) => Json::Bool(*b),
        Tree::Integer(i) => Json::Number(Number::from(*i)),
        Tree::Decimal(d) => Number::from_f64(*d).map(Json::Number).unwrap_or(Json::Null),
        Tree::Str(s) => Json::String(s.clone()),
        Tree::Array(items) => Json::Array(items.iter().map(json_from_tree).collect()),
        Tree::Object(pairs) => {
            let mut map = Map::with_capacity(pairs.len());
            for (k, v) in pairs {
                map.insert(k.clone(), json_from_tree(v));
            }
            Json::Object(map)
        }
    }
}

/// Parses `text` as JSON and finalizes it directly into a buffer (§6).
pub fn from_json_str(text: &str) -> Result<FinalizedBuffer<Atomic>, DartError> {
    let value: Json = serde_json::from_str(text).map_err(|_| DartError::InvalidJson)?;
    let tree = tree_from_json(&value);
    finalize(&tree)
}

/// Lifts `buffer` and renders it back out as a `serde_json::Value` (§6).
pub fn to_json_value<R: RefCount>(buffer: &FinalizedBuffer<R>) -> Json {
    let tree = lift(buffer);
    json_from_tree(&tree)
}
