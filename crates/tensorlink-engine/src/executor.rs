//! Graph execution over manifest nodes.
//!
//! Nodes run in declaration order against a value environment seeded from
//! the bound inputs. Input bytes are only materialized here, at execution
//! time; until this point the boundary holds borrowed views.

use crate::error::{EngineError, Result};
use crate::manifest::{KeyDecl, NodeDecl};
use crate::model::Model;
use crate::profiling::Profiler;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Instant;
use tensorlink_core::{ElementType, MapKey, TensorData, TensorView, Value};
use tracing::debug;

pub(crate) fn execute(
    model: &Model,
    inputs: &[TensorView<'_>],
    profiler: &Profiler,
) -> Result<Vec<Value>> {
    let manifest = model.manifest();
    if inputs.len() != manifest.inputs.len() {
        return Err(EngineError::Execution(format!(
            "model {:?} declares {} inputs but {} were bound",
            manifest.name,
            manifest.inputs.len(),
            inputs.len()
        )));
    }

    let mut values: HashMap<String, Value> = HashMap::new();
    for (slot, view) in manifest.inputs.iter().zip(inputs) {
        check_input(slot.name.as_str(), &slot.dims, slot.dtype.as_str(), view)?;
        values.insert(slot.name.clone(), Value::Tensor(view.to_owned_tensor()?));
    }

    for (index, node) in manifest.nodes.iter().enumerate() {
        let label = node.label(index);
        let started = Instant::now();
        let produced = run_node(node, &values)?;
        profiler.record(&label, &node.op, started, started.elapsed());
        debug!(node = %label, op = %node.op, "executed node");
        for (name, value) in produced {
            values.insert(name, value);
        }
    }

    manifest
        .outputs
        .iter()
        .map(|name| {
            values.get(name).cloned().ok_or_else(|| {
                EngineError::Execution(format!("output {name:?} was not produced"))
            })
        })
        .collect()
}

fn check_input(name: &str, declared_dims: &[i64], declared_dtype: &str, view: &TensorView<'_>) -> Result<()> {
    let expected = ElementType::from_str(declared_dtype)?;
    if view.dtype() != expected {
        return Err(EngineError::Execution(format!(
            "input {name:?} expects {expected}, got {}",
            view.dtype()
        )));
    }
    if view.shape().len() != declared_dims.len() {
        return Err(EngineError::Execution(format!(
            "input {name:?} expects rank {}, got shape {:?}",
            declared_dims.len(),
            view.shape()
        )));
    }
    for (&declared, &actual) in declared_dims.iter().zip(view.shape()) {
        // -1 marks a dynamic dimension.
        if declared >= 0 && declared != actual {
            return Err(EngineError::Execution(format!(
                "input {name:?} expects dimensions {declared_dims:?}, got {:?}",
                view.shape()
            )));
        }
    }
    Ok(())
}

fn run_node(node: &NodeDecl, values: &HashMap<String, Value>) -> Result<Vec<(String, Value)>> {
    let consume = |name: &String| -> Result<Value> {
        values.get(name).cloned().ok_or_else(|| {
            EngineError::Execution(format!("node consumes missing value {name:?}"))
        })
    };

    let produced = match node.op.as_str() {
        "Identity" => consume(&node.inputs[0])?,
        "Constant" => Value::Tensor(materialize_constant(node)?),
        "SequenceConstruct" => {
            let items = node.inputs.iter().map(consume).collect::<Result<Vec<_>>>()?;
            Value::Sequence(items)
        }
        "MapConstruct" => {
            let keys = node.keys.as_ref().map(Vec::as_slice).unwrap_or_default();
            let entries = keys
                .iter()
                .zip(&node.inputs)
                .map(|(key, input)| {
                    let key = match key {
                        KeyDecl::Int(v) => MapKey::Int(*v),
                        KeyDecl::Str(s) => MapKey::Str(s.clone()),
                    };
                    Ok((key, consume(input)?))
                })
                .collect::<Result<Vec<_>>>()?;
            Value::Map(entries)
        }
        other => {
            return Err(EngineError::Execution(format!("unknown op {other:?}")));
        }
    };

    Ok(vec![(node.outputs[0].clone(), produced)])
}

fn materialize_constant(node: &NodeDecl) -> Result<TensorData> {
    // Presence and counts were checked at manifest validation.
    let dtype = ElementType::from_str(node.dtype.as_deref().unwrap_or_default())?;
    let dims = node.dims.clone().unwrap_or_default();

    if let Some(raw) = &node.raw {
        return TensorData::new(dtype, dims, raw.clone()).map_err(EngineError::from);
    }

    let values = node.values.as_deref().unwrap_or_default();
    let mut data = Vec::with_capacity(values.len() * dtype.byte_width().unwrap_or(1));
    for value in values {
        encode_scalar(dtype, value, &mut data)?;
    }
    TensorData::new(dtype, dims, data).map_err(EngineError::from)
}

fn encode_scalar(dtype: ElementType, value: &serde_json::Value, out: &mut Vec<u8>) -> Result<()> {
    let bad = || EngineError::Validation(format!("constant value {value} is not a valid {dtype}"));
    match dtype {
        ElementType::F32 => out.extend((value.as_f64().ok_or_else(bad)? as f32).to_ne_bytes()),
        ElementType::F64 => out.extend(value.as_f64().ok_or_else(bad)?.to_ne_bytes()),
        ElementType::U8 => out.extend((value.as_u64().ok_or_else(bad)? as u8).to_ne_bytes()),
        ElementType::I8 => out.extend((value.as_i64().ok_or_else(bad)? as i8).to_ne_bytes()),
        ElementType::U16 => out.extend((value.as_u64().ok_or_else(bad)? as u16).to_ne_bytes()),
        ElementType::I16 => out.extend((value.as_i64().ok_or_else(bad)? as i16).to_ne_bytes()),
        ElementType::I32 => out.extend((value.as_i64().ok_or_else(bad)? as i32).to_ne_bytes()),
        ElementType::I64 => out.extend(value.as_i64().ok_or_else(bad)?.to_ne_bytes()),
        ElementType::U32 => out.extend((value.as_u64().ok_or_else(bad)? as u32).to_ne_bytes()),
        ElementType::U64 => out.extend(value.as_u64().ok_or_else(bad)?.to_ne_bytes()),
        ElementType::Bool => out.push(u8::from(value.as_bool().ok_or_else(bad)?)),
        // Types without a JSON literal form arrive via `raw`.
        _ => return Err(bad()),
    }
    Ok(())
}
