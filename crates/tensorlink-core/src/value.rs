//! The recursive value model produced and consumed by the engine.
//!
//! A [`Value`] is either a tensor leaf or an ordered container (sequence or
//! map) of further values. Tensors come in two forms: [`TensorData`] owns
//! its byte storage and is what the engine hands back as output;
//! [`TensorView`] borrows caller storage and is how input data reaches the
//! engine without a copy.

use crate::dtype::ElementType;
use crate::error::{CoreError, Result};

/// Number of elements implied by a shape.
///
/// Dimensions must be non-negative and their product must fit in `usize`.
pub fn num_elements(shape: &[i64]) -> Result<usize> {
    let mut n: usize = 1;
    for &dim in shape {
        if dim < 0 {
            return Err(CoreError::InvalidShape(format!(
                "negative dimension {dim} in shape {shape:?}"
            )));
        }
        n = n
            .checked_mul(dim as usize)
            .ok_or_else(|| CoreError::InvalidShape(format!("element count of {shape:?} overflows")))?;
    }
    Ok(n)
}

/// A tensor that owns its byte storage.
///
/// For element types in the dispatch table the byte length is validated
/// against the shape at construction; for other kinds (which can exist
/// inside engine output trees but never cross the boundary) the storage is
/// held opaquely.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorData {
    dtype: ElementType,
    shape: Vec<i64>,
    data: Vec<u8>,
}

impl TensorData {
    /// Create a tensor from raw bytes.
    pub fn new(dtype: ElementType, shape: Vec<i64>, data: Vec<u8>) -> Result<Self> {
        let count = num_elements(&shape)?;
        if let Some(width) = dtype.byte_width() {
            let expected = count * width;
            if data.len() != expected {
                return Err(CoreError::ByteLengthMismatch {
                    dtype,
                    shape,
                    expected,
                    actual: data.len(),
                });
            }
        }
        Ok(Self { dtype, shape, data })
    }

    /// Create a float32 tensor from typed values.
    pub fn from_f32(shape: Vec<i64>, values: &[f32]) -> Result<Self> {
        let data = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        Self::new(ElementType::F32, shape, data)
    }

    /// Create a float64 tensor from typed values.
    pub fn from_f64(shape: Vec<i64>, values: &[f64]) -> Result<Self> {
        let data = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        Self::new(ElementType::F64, shape, data)
    }

    /// Create an int32 tensor from typed values.
    pub fn from_i32(shape: Vec<i64>, values: &[i32]) -> Result<Self> {
        let data = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        Self::new(ElementType::I32, shape, data)
    }

    /// Create an int64 tensor from typed values.
    pub fn from_i64(shape: Vec<i64>, values: &[i64]) -> Result<Self> {
        let data = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        Self::new(ElementType::I64, shape, data)
    }

    /// Element type of this tensor.
    pub fn dtype(&self) -> ElementType {
        self.dtype
    }

    /// Shape of this tensor.
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    /// Raw byte storage.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of elements.
    pub fn num_elements(&self) -> usize {
        // Shape was validated at construction.
        self.shape.iter().map(|&d| d as usize).product()
    }

    /// Borrow this tensor as a view.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            dtype: self.dtype,
            shape: &self.shape,
            data: &self.data,
        }
    }
}

/// A borrowed tensor over storage owned by someone else.
#[derive(Debug, Clone, Copy)]
pub struct TensorView<'a> {
    dtype: ElementType,
    shape: &'a [i64],
    data: &'a [u8],
}

impl<'a> TensorView<'a> {
    /// Create a view over borrowed bytes, validating the byte length for
    /// dispatch-table types.
    pub fn new(dtype: ElementType, shape: &'a [i64], data: &'a [u8]) -> Result<Self> {
        let count = num_elements(shape)?;
        if let Some(width) = dtype.byte_width() {
            let expected = count * width;
            if data.len() != expected {
                return Err(CoreError::ByteLengthMismatch {
                    dtype,
                    shape: shape.to_vec(),
                    expected,
                    actual: data.len(),
                });
            }
        }
        Ok(Self { dtype, shape, data })
    }

    /// Element type of this view.
    pub fn dtype(&self) -> ElementType {
        self.dtype
    }

    /// Shape of this view.
    pub fn shape(&self) -> &'a [i64] {
        self.shape
    }

    /// Borrowed byte storage.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Copy into an owned tensor.
    pub fn to_owned_tensor(&self) -> Result<TensorData> {
        TensorData::new(self.dtype, self.shape.to_vec(), self.data.to_vec())
    }
}

/// Key of a map entry. Keys are ordered with their entries but are never
/// surfaced through the flat output list.
#[derive(Debug, Clone, PartialEq)]
pub enum MapKey {
    /// Integer key.
    Int(i64),
    /// String key.
    Str(String),
}

/// A possibly-composite engine value: a tensor leaf, or an ordered
/// container of child values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Tensor leaf.
    Tensor(TensorData),
    /// Ordered sequence of values.
    Sequence(Vec<Value>),
    /// Ordered map entries; values are traversed in entry order.
    Map(Vec<(MapKey, Value)>),
}

impl Value {
    /// Whether this value is a tensor leaf.
    pub fn is_tensor(&self) -> bool {
        matches!(self, Value::Tensor(_))
    }

    /// Number of tensor leaves reachable from this value, counted in
    /// pre-order. Uses an explicit worklist; value trees are finite and
    /// acyclic.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(value) = stack.pop() {
            match value {
                Value::Tensor(_) => count += 1,
                Value::Sequence(items) => stack.extend(items.iter()),
                Value::Map(entries) => stack.extend(entries.iter().map(|(_, v)| v)),
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tensor_byte_length_is_validated() {
        let err = TensorData::new(ElementType::F32, vec![2, 2], vec![0u8; 15]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ByteLengthMismatch { expected: 16, actual: 15, .. }
        ));
        assert!(TensorData::new(ElementType::F32, vec![2, 2], vec![0u8; 16]).is_ok());
    }

    #[test]
    fn negative_dimensions_are_rejected() {
        let err = TensorData::new(ElementType::U8, vec![2, -1], vec![0u8; 2]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidShape(_)));
    }

    #[test]
    fn unsupported_kinds_hold_opaque_bytes() {
        // float16 has no dispatch-table width, so any byte length is kept.
        let tensor = TensorData::new(ElementType::F16, vec![3], vec![0u8; 6]).unwrap();
        assert_eq!(tensor.data().len(), 6);
        assert!(!tensor.dtype().is_supported());
    }

    #[test]
    fn view_round_trips_bytes() {
        let tensor = TensorData::from_f32(vec![1, 3], &[1.0, 2.0, 3.0]).unwrap();
        let view = tensor.view();
        assert_eq!(view.shape(), &[1, 3]);
        let owned = view.to_owned_tensor().unwrap();
        assert_eq!(owned, tensor);
    }

    #[test]
    fn leaf_count_traverses_nested_containers() {
        let leaf = || Value::Tensor(TensorData::from_i32(vec![1], &[7]).unwrap());
        let inner = Value::Sequence(vec![leaf(), leaf(), leaf()]);
        let map = Value::Map(vec![
            (MapKey::Str("a".into()), leaf()),
            (MapKey::Int(1), inner.clone()),
        ]);
        let tree = Value::Sequence(vec![inner, map, leaf()]);
        assert_eq!(tree.leaf_count(), 8);
    }

    #[test]
    fn zero_sized_dimensions_are_allowed() {
        let tensor = TensorData::new(ElementType::I64, vec![0, 4], Vec::new()).unwrap();
        assert_eq!(tensor.num_elements(), 0);
    }
}
