//! JSON form of plan trees
//!
//! A node serializes to one object whose first key is the type tag:
//!
//! ```text
//! { "plan_node_type": "HASH",
//!   "output_schema": {...} | null,
//!   "estimated_cardinality": 42 | null,
//!   "children": [ ... ],
//!   "hash_keys": [ ... ] }
//! ```
//!
//! The variant payload's fields sit next to the common ones. Reading a
//! document back dispatches on the tag to exactly one payload type; an
//! unknown tag, a missing required field or a child count the variant does
//! not allow is rejected with [`PlannerError::MalformedPlan`] and nothing
//! is returned.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use tracing::{debug, warn};

use crate::planner::error::{PlannerError, PlannerResult};
use crate::planner::node::{PlanBody, PlanNode, PlanNodeType};
use crate::planner::schema::OutputSchema;

pub const KEY_NODE_TYPE: &str = "plan_node_type";
pub const KEY_OUTPUT_SCHEMA: &str = "output_schema";
pub const KEY_CARDINALITY: &str = "estimated_cardinality";
pub const KEY_CHILDREN: &str = "children";

const COMMON_KEYS: [&str; 4] = [KEY_NODE_TYPE, KEY_OUTPUT_SCHEMA, KEY_CARDINALITY, KEY_CHILDREN];

impl PlanNode {
    /// Serialize the subtree rooted at this node
    pub fn to_json(&self) -> PlannerResult<Json> {
        let mut obj = Map::new();
        obj.insert(
            KEY_NODE_TYPE.to_string(),
            Json::String(self.node_type().as_str().to_string()),
        );
        let schema = match self.output_schema() {
            Some(schema) => serde_json::to_value(schema.as_ref())?,
            None => Json::Null,
        };
        obj.insert(KEY_OUTPUT_SCHEMA.to_string(), schema);
        obj.insert(
            KEY_CARDINALITY.to_string(),
            serde_json::to_value(self.raw_estimated_cardinality())?,
        );
        let children = self
            .children()
            .iter()
            .map(PlanNode::to_json)
            .collect::<PlannerResult<Vec<_>>>()?;
        obj.insert(KEY_CHILDREN.to_string(), Json::Array(children));

        let body = match self.body() {
            PlanBody::SeqScan(p) => body_fields(p)?,
            PlanBody::IndexScan(p) => body_fields(p)?,
            PlanBody::CsvScan(p) => body_fields(p)?,
            PlanBody::Hash(p) => body_fields(p)?,
            PlanBody::Aggregate(p) => body_fields(p)?,
            PlanBody::Insert(p) => body_fields(p)?,
            PlanBody::CreateFunction(p) => body_fields(p)?,
        };
        obj.extend(body);
        Ok(Json::Object(obj))
    }

    /// Serialize to a compact JSON string
    pub fn to_json_string(&self) -> PlannerResult<String> {
        Ok(serde_json::to_string(&self.to_json()?)?)
    }

    /// Serialize to an indented JSON string
    pub fn to_json_pretty(&self) -> PlannerResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_json()?)?)
    }

    /// Reconstruct a tree; see [`deserialize_plan_node`]
    pub fn from_json(json: &Json) -> PlannerResult<PlanNode> {
        deserialize_plan_node(json)
    }

    /// Parse and reconstruct a tree from JSON text
    pub fn from_json_str(text: &str) -> PlannerResult<PlanNode> {
        let json: Json = serde_json::from_str(text)?;
        deserialize_plan_node(&json)
    }
}

fn body_fields<T: Serialize>(payload: &T) -> PlannerResult<Map<String, Json>> {
    match serde_json::to_value(payload)? {
        Json::Object(fields) => Ok(fields),
        other => Err(PlannerError::MalformedPlan(format!(
            "plan payload serialized to non-object {}",
            other
        ))),
    }
}

/// Reconstruct a plan tree from its JSON form
pub fn deserialize_plan_node(json: &Json) -> PlannerResult<PlanNode> {
    decode(json).map_err(|e| {
        warn!(error = %e, "Failed to reconstruct plan");
        e
    })
}

fn decode(json: &Json) -> PlannerResult<PlanNode> {
    let obj = json
        .as_object()
        .ok_or_else(|| malformed("plan node must be a JSON object"))?;

    let tag = obj
        .get(KEY_NODE_TYPE)
        .and_then(Json::as_str)
        .ok_or_else(|| malformed(format!("missing '{}'", KEY_NODE_TYPE)))?;
    let node_type = PlanNodeType::from_tag(tag)
        .ok_or_else(|| malformed(format!("unknown plan node type '{}'", tag)))?;

    let output_schema = match obj.get(KEY_OUTPUT_SCHEMA) {
        None | Some(Json::Null) => None,
        Some(schema) => Some(
            OutputSchema::deserialize(schema)
                .map_err(|e| malformed(format!("{} output_schema: {}", node_type, e)))?
                .into_ref(),
        ),
    };

    let estimated_cardinality = match obj.get(KEY_CARDINALITY) {
        None | Some(Json::Null) => None,
        Some(card) => Some(
            card.as_u64()
                .and_then(|c| u32::try_from(c).ok())
                .ok_or_else(|| {
                    malformed(format!("{} estimated_cardinality {} out of range", node_type, card))
                })?,
        ),
    };

    let children = match obj.get(KEY_CHILDREN) {
        None | Some(Json::Null) => Vec::new(),
        Some(Json::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, child)| {
                decode(child).map_err(|e| match e {
                    PlannerError::MalformedPlan(msg) => {
                        malformed(format!("child {} of {}: {}", i, node_type, msg))
                    }
                    other => other,
                })
            })
            .collect::<PlannerResult<Vec<_>>>()?,
        Some(_) => return Err(malformed(format!("{} children must be an array", node_type))),
    };

    debug!(tag = %node_type, children = children.len(), "Decoding plan node");

    let fields: Map<String, Json> = obj
        .iter()
        .filter(|(k, _)| !COMMON_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let body = match node_type {
        PlanNodeType::SeqScan => PlanBody::SeqScan(payload(node_type, fields)?),
        PlanNodeType::IndexScan => PlanBody::IndexScan(payload(node_type, fields)?),
        PlanNodeType::CsvScan => PlanBody::CsvScan(payload(node_type, fields)?),
        PlanNodeType::Hash => PlanBody::Hash(payload(node_type, fields)?),
        PlanNodeType::Aggregate => PlanBody::Aggregate(payload(node_type, fields)?),
        PlanNodeType::Insert => PlanBody::Insert(payload(node_type, fields)?),
        PlanNodeType::CreateFunc => PlanBody::CreateFunction(payload(node_type, fields)?),
    };

    PlanNode::assemble(body, children, output_schema, estimated_cardinality)
        .map_err(PlannerError::MalformedPlan)
}

fn payload<T: DeserializeOwned>(node_type: PlanNodeType, fields: Map<String, Json>) -> PlannerResult<T> {
    serde_json::from_value(Json::Object(fields))
        .map_err(|e| malformed(format!("{}: {}", node_type, e)))
}

fn malformed(msg: impl Into<String>) -> PlannerError {
    PlannerError::MalformedPlan(msg.into())
}
