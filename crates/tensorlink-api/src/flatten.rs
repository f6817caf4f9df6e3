//! Output flattening: from composite value trees to a flat buffer list.
//!
//! Traversal is pre-order and depth-first over each top-level output in
//! declaration order, driven by an explicit worklist rather than native
//! recursion. Buffers are staged locally and only committed by the caller
//! once the whole traversal has succeeded; an error mid-traversal drops
//! the staged buffers with nothing half-populated left behind.

use crate::buffer::TypedBuffer;
use crate::error::{Error, Result};
use tensorlink_core::{TensorData, Value};
use tracing::{debug, trace};

/// Flatten output values into an ordered list of leaf buffers.
pub(crate) fn flatten_outputs(outputs: &[Value]) -> Result<Vec<TypedBuffer>> {
    let mut staged = Vec::new();
    let mut stack: Vec<&Value> = outputs.iter().rev().collect();

    while let Some(value) = stack.pop() {
        match value {
            Value::Tensor(tensor) => staged.push(convert_leaf(tensor)?),
            Value::Sequence(items) => {
                trace!(children = items.len(), "descending into sequence");
                stack.extend(items.iter().rev());
            }
            Value::Map(entries) => {
                // Keys are not surfaced in the flat list; only the values,
                // in entry order.
                debug!(entries = entries.len(), "descending into map, dropping keys");
                stack.extend(entries.iter().rev().map(|(_, v)| v));
            }
        }
    }

    Ok(staged)
}

/// Copy one tensor leaf into a host-owned buffer.
fn convert_leaf(tensor: &TensorData) -> Result<TypedBuffer> {
    let dtype = tensor.dtype();
    let width = dtype
        .byte_width()
        .ok_or_else(|| Error::UnsupportedType(dtype.to_string()))?;

    let byte_len = tensor.num_elements() * width;
    let source = tensor.data();
    if source.len() < byte_len {
        return Err(Error::Execution(format!(
            "tensor of {dtype} holds {} bytes, expected {byte_len}",
            source.len()
        )));
    }
    // Never read past the element count implied by the shape.
    Ok(TypedBuffer::new(
        dtype,
        tensor.shape().to_vec(),
        source[..byte_len].to_vec(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensorlink_core::{ElementType, MapKey};

    fn leaf(values: &[i32]) -> Value {
        Value::Tensor(TensorData::from_i32(vec![values.len() as i64], values).unwrap())
    }

    #[test]
    fn preorder_over_nested_containers() {
        let tree = vec![
            leaf(&[0]),
            Value::Sequence(vec![
                leaf(&[1]),
                Value::Sequence(vec![leaf(&[2]), leaf(&[3])]),
            ]),
            Value::Map(vec![
                (MapKey::Str("k".into()), leaf(&[4])),
                (MapKey::Int(9), leaf(&[5])),
            ]),
        ];
        let flat = flatten_outputs(&tree).unwrap();
        let firsts: Vec<i32> = flat
            .iter()
            .map(|b| i32::from_ne_bytes(b.data()[..4].try_into().unwrap()))
            .collect();
        assert_eq!(firsts, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn unsupported_leaf_aborts_the_whole_flatten() {
        let half = Value::Tensor(
            TensorData::new(ElementType::F16, vec![1], vec![0, 60]).unwrap(),
        );
        let tree = vec![leaf(&[1]), half, leaf(&[2])];
        let err = flatten_outputs(&tree).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }

    #[test]
    fn empty_output_list_flattens_to_nothing() {
        assert!(flatten_outputs(&[]).unwrap().is_empty());
    }
}
