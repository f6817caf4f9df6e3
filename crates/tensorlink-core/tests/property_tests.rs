//! Property-based tests for the value model.
//!
//! Validates invariants that should hold for any shape and any supported
//! element type.

use proptest::prelude::*;
use tensorlink_core::{num_elements, ElementType, TensorData, SUPPORTED_TYPES};

// Strategy for generating valid tensor shapes.
fn shape_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(0i64..8, 1..4)
}

// Strategy for picking a supported element type.
fn dtype_strategy() -> impl Strategy<Value = ElementType> {
    (0..SUPPORTED_TYPES.len()).prop_map(|i| SUPPORTED_TYPES[i].dtype)
}

proptest! {
    #[test]
    fn element_count_matches_product(shape in shape_strategy()) {
        let expected: usize = shape.iter().map(|&d| d as usize).product();
        prop_assert_eq!(num_elements(&shape).unwrap(), expected);
    }

    #[test]
    fn exact_byte_length_constructs(shape in shape_strategy(), dtype in dtype_strategy()) {
        let width = dtype.byte_width().unwrap();
        let len = num_elements(&shape).unwrap() * width;
        let tensor = TensorData::new(dtype, shape.clone(), vec![0u8; len]).unwrap();
        prop_assert_eq!(tensor.shape(), shape.as_slice());
        prop_assert_eq!(tensor.data().len(), len);
    }

    #[test]
    fn short_byte_length_is_rejected(shape in shape_strategy(), dtype in dtype_strategy()) {
        let width = dtype.byte_width().unwrap();
        let len = num_elements(&shape).unwrap() * width;
        // Only shapes with at least one element can be made short.
        prop_assume!(len > 0);
        prop_assert!(TensorData::new(dtype, shape, vec![0u8; len - 1]).is_err());
    }

    #[test]
    fn wire_tags_are_stable(dtype in dtype_strategy()) {
        prop_assert_eq!(ElementType::from_wire(dtype.to_wire()).unwrap(), dtype);
    }
}
