//! JSON model manifests.
//!
//! A manifest declares a model's input slots, its output values, and the
//! node list that computes them. Nodes appear in execution order: every
//! value a node consumes must be an input slot or the output of an earlier
//! node. Validation happens once at load time so execution can assume a
//! well-formed graph.

use crate::error::{EngineError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tensorlink_core::{num_elements, ElementType};
use tracing::debug;

/// Current manifest format version.
pub const MANIFEST_VERSION: i64 = 1;

/// A parsed model manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Model name, for logs only.
    #[serde(default)]
    pub name: String,
    /// Manifest format version.
    #[serde(default = "default_version")]
    pub version: i64,
    /// Ordered input slot declarations.
    pub inputs: Vec<SlotDecl>,
    /// Ordered output value names.
    pub outputs: Vec<String>,
    /// Nodes in execution order.
    #[serde(default)]
    pub nodes: Vec<NodeDecl>,
}

fn default_version() -> i64 {
    MANIFEST_VERSION
}

/// Declaration of one input slot.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotDecl {
    /// Slot name.
    pub name: String,
    /// Canonical element type name.
    pub dtype: String,
    /// Expected dimensions; `-1` marks a dynamic dimension.
    pub dims: Vec<i64>,
}

/// Declaration of one graph node.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeDecl {
    /// Operator name.
    pub op: String,
    /// Optional node name, for logs and profiling.
    #[serde(default)]
    pub name: Option<String>,
    /// Consumed value names.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Produced value names.
    pub outputs: Vec<String>,
    /// Element type, for `Constant` nodes.
    #[serde(default)]
    pub dtype: Option<String>,
    /// Shape, for `Constant` nodes.
    #[serde(default)]
    pub dims: Option<Vec<i64>>,
    /// Literal element values, for `Constant` nodes of marshalable types.
    #[serde(default)]
    pub values: Option<Vec<serde_json::Value>>,
    /// Raw byte payload, for `Constant` nodes of types without a JSON
    /// representation.
    #[serde(default)]
    pub raw: Option<Vec<u8>>,
    /// Entry keys, for `MapConstruct` nodes.
    #[serde(default)]
    pub keys: Option<Vec<KeyDecl>>,
}

/// A map key in a manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum KeyDecl {
    /// Integer key.
    Int(i64),
    /// String key.
    Str(String),
}

/// Operators the executor understands.
pub const KNOWN_OPS: [&str; 4] = ["Identity", "Constant", "SequenceConstruct", "MapConstruct"];

impl NodeDecl {
    /// Stable label for logs and profiling events.
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}_{index}", self.op),
        }
    }
}

impl Manifest {
    /// Read and validate a manifest from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Parse and validate a manifest from a JSON string.
    pub fn from_json(text: &str) -> Result<Self> {
        let manifest: Manifest =
            serde_json::from_str(text).map_err(|e| EngineError::Parse(e.to_string()))?;
        manifest.validate()?;
        debug!(
            name = %manifest.name,
            inputs = manifest.inputs.len(),
            outputs = manifest.outputs.len(),
            nodes = manifest.nodes.len(),
            "parsed model manifest"
        );
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        if self.version > MANIFEST_VERSION {
            return Err(EngineError::Validation(format!(
                "manifest version {} is newer than supported version {MANIFEST_VERSION}",
                self.version
            )));
        }

        let mut defined: Vec<&str> = Vec::new();
        for slot in &self.inputs {
            if slot.name.is_empty() {
                return Err(EngineError::Validation("input slot with empty name".into()));
            }
            if defined.contains(&slot.name.as_str()) {
                return Err(EngineError::Validation(format!(
                    "duplicate input slot {:?}",
                    slot.name
                )));
            }
            ElementType::from_str(&slot.dtype)?;
            for &dim in &slot.dims {
                if dim < -1 {
                    return Err(EngineError::Validation(format!(
                        "input {:?} has invalid dimension {dim}",
                        slot.name
                    )));
                }
            }
            defined.push(&slot.name);
        }

        for (index, node) in self.nodes.iter().enumerate() {
            let label = node.label(index);
            if !KNOWN_OPS.contains(&node.op.as_str()) {
                return Err(EngineError::Validation(format!(
                    "node {label:?} uses unknown op {:?}",
                    node.op
                )));
            }
            for input in &node.inputs {
                if !defined.contains(&input.as_str()) {
                    return Err(EngineError::Validation(format!(
                        "node {label:?} consumes undefined value {input:?}"
                    )));
                }
            }
            validate_node_arity(node, &label)?;
            for output in &node.outputs {
                if defined.contains(&output.as_str()) {
                    return Err(EngineError::Validation(format!(
                        "value {output:?} is produced more than once"
                    )));
                }
                defined.push(output);
            }
        }

        if self.outputs.is_empty() {
            return Err(EngineError::Validation("manifest declares no outputs".into()));
        }
        for output in &self.outputs {
            if !defined.contains(&output.as_str()) {
                return Err(EngineError::Validation(format!(
                    "declared output {output:?} is never produced"
                )));
            }
        }
        Ok(())
    }
}

fn validate_node_arity(node: &NodeDecl, label: &str) -> Result<()> {
    let arity_err = |msg: &str| Err(EngineError::Validation(format!("node {label:?}: {msg}")));
    match node.op.as_str() {
        "Identity" => {
            if node.inputs.len() != 1 || node.outputs.len() != 1 {
                return arity_err("Identity takes exactly one input and one output");
            }
        }
        "Constant" => {
            if !node.inputs.is_empty() || node.outputs.len() != 1 {
                return arity_err("Constant takes no inputs and exactly one output");
            }
            let dtype_name = match &node.dtype {
                Some(name) => name,
                None => return arity_err("Constant requires a dtype"),
            };
            let dtype = ElementType::from_str(dtype_name)?;
            let dims = match &node.dims {
                Some(dims) => dims,
                None => return arity_err("Constant requires dims"),
            };
            let count = num_elements(dims)?;
            match (&node.values, &node.raw, dtype.byte_width()) {
                (Some(_), Some(_), _) => {
                    return arity_err("Constant takes either values or raw, not both")
                }
                (None, None, _) => return arity_err("Constant requires values or raw"),
                (Some(values), None, Some(_)) => {
                    if values.len() != count {
                        return arity_err(&format!(
                            "Constant declares {count} elements but provides {}",
                            values.len()
                        ));
                    }
                }
                (Some(_), None, None) => {
                    return arity_err(&format!(
                        "Constant of type {dtype} must use a raw payload"
                    ))
                }
                (None, Some(raw), Some(width)) => {
                    if raw.len() != count * width {
                        return arity_err(&format!(
                            "Constant raw payload is {} bytes, expected {}",
                            raw.len(),
                            count * width
                        ));
                    }
                }
                (None, Some(_), None) => {}
            }
        }
        "SequenceConstruct" => {
            if node.inputs.is_empty() || node.outputs.len() != 1 {
                return arity_err(
                    "SequenceConstruct takes at least one input and exactly one output",
                );
            }
        }
        "MapConstruct" => {
            if node.outputs.len() != 1 {
                return arity_err("MapConstruct takes exactly one output");
            }
            let keys = match &node.keys {
                Some(keys) => keys,
                None => return arity_err("MapConstruct requires keys"),
            };
            if keys.len() != node.inputs.len() {
                return arity_err(&format!(
                    "MapConstruct has {} keys for {} inputs",
                    keys.len(),
                    node.inputs.len()
                ));
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: &str = r#"{
        "name": "identity",
        "inputs": [{"name": "x", "dtype": "float32", "dims": [1, 3]}],
        "outputs": ["y"],
        "nodes": [{"op": "Identity", "inputs": ["x"], "outputs": ["y"]}]
    }"#;

    #[test]
    fn parses_identity_manifest() {
        let manifest = Manifest::from_json(IDENTITY).unwrap();
        assert_eq!(manifest.inputs.len(), 1);
        assert_eq!(manifest.outputs, vec!["y".to_string()]);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            Manifest::from_json("{not json"),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn rejects_unknown_op() {
        let text = r#"{
            "inputs": [{"name": "x", "dtype": "float32", "dims": [1]}],
            "outputs": ["y"],
            "nodes": [{"op": "Conv", "inputs": ["x"], "outputs": ["y"]}]
        }"#;
        assert!(matches!(
            Manifest::from_json(text),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn rejects_dangling_value_reference() {
        let text = r#"{
            "inputs": [{"name": "x", "dtype": "float32", "dims": [1]}],
            "outputs": ["y"],
            "nodes": [{"op": "Identity", "inputs": ["missing"], "outputs": ["y"]}]
        }"#;
        let err = Manifest::from_json(text).unwrap_err();
        assert!(err.to_string().contains("undefined value"));
    }

    #[test]
    fn rejects_undeclared_output() {
        let text = r#"{
            "inputs": [{"name": "x", "dtype": "float32", "dims": [1]}],
            "outputs": ["nowhere"]
        }"#;
        let err = Manifest::from_json(text).unwrap_err();
        assert!(err.to_string().contains("never produced"));
    }

    #[test]
    fn rejects_constant_with_wrong_element_count() {
        let text = r#"{
            "inputs": [],
            "outputs": ["c"],
            "nodes": [{"op": "Constant", "outputs": ["c"], "dtype": "float32",
                       "dims": [3], "values": [1.0, 2.0]}]
        }"#;
        let err = Manifest::from_json(text).unwrap_err();
        assert!(err.to_string().contains("declares 3 elements"));
    }

    #[test]
    fn rejects_newer_version() {
        let text = r#"{
            "version": 99,
            "inputs": [{"name": "x", "dtype": "float32", "dims": [1]}],
            "outputs": ["y"],
            "nodes": [{"op": "Identity", "inputs": ["x"], "outputs": ["y"]}]
        }"#;
        let err = Manifest::from_json(text).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn constant_of_unmarshalable_type_requires_raw() {
        let text = r#"{
            "inputs": [],
            "outputs": ["c"],
            "nodes": [{"op": "Constant", "outputs": ["c"], "dtype": "float16",
                       "dims": [2], "values": [1.0, 2.0]}]
        }"#;
        let err = Manifest::from_json(text).unwrap_err();
        assert!(err.to_string().contains("raw payload"));
    }
}
