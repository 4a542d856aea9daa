//! Shape validator — decides operator applicability from input shapes alone.
//!
//! A pure function: no numeric work happens here, and the same inputs always
//! give the same answer. The kernel library runs only after this accepts.

use crate::error::EvalError;
use crate::model::matrix::Shape;
use crate::model::node::OperatorKind;

/// Output shape of `op` applied to inputs with the given shapes, or
/// `ShapeMismatch` when the operator does not apply.
pub fn output_shape(op: OperatorKind, inputs: &[Shape]) -> Result<Shape, EvalError> {
    use OperatorKind::*;
    debug_assert_eq!(inputs.len(), op.arity());

    let mismatch = || EvalError::ShapeMismatch {
        op,
        inputs: inputs.to_vec(),
    };

    match op {
        // Elementwise pairs: identical shapes in, same shape out.
        Add | Subtract | ElementMultiply | ElementDivide => {
            if inputs[0] == inputs[1] {
                Ok(inputs[0])
            } else {
                Err(mismatch())
            }
        }
        ScalarMultiply => {
            if inputs[1].is_scalar() {
                Ok(inputs[0])
            } else {
                Err(mismatch())
            }
        }
        DotProduct => {
            if inputs[0].cols == inputs[1].rows {
                Ok(Shape::new(inputs[0].rows, inputs[1].cols))
            } else {
                Err(mismatch())
            }
        }
        CrossProduct => {
            if inputs[0].is_vector3() && inputs[1].is_vector3() {
                // Output takes the orientation of the first input.
                Ok(inputs[0])
            } else {
                Err(mismatch())
            }
        }
        Solve => {
            if inputs[0].is_square() && inputs[0].rows == inputs[1].rows {
                Ok(inputs[1])
            } else {
                Err(mismatch())
            }
        }
        Transpose => Ok(inputs[0].transposed()),
        Inverse => {
            if inputs[0].is_square() {
                Ok(inputs[0])
            } else {
                Err(mismatch())
            }
        }
        PseudoInverse => Ok(inputs[0].transposed()),
        Determinant | Trace => {
            if inputs[0].is_square() {
                Ok(Shape::new(1, 1))
            } else {
                Err(mismatch())
            }
        }
        Rank => Ok(Shape::new(1, 1)),
        Eigenvalues => {
            if inputs[0].is_square() {
                Ok(Shape::new(inputs[0].rows, 1))
            } else {
                Err(mismatch())
            }
        }
        Eigenvectors => {
            if inputs[0].is_square() {
                Ok(inputs[0])
            } else {
                Err(mismatch())
            }
        }
        Svd => Ok(Shape::new(inputs[0].rows.min(inputs[0].cols), 1)),
        ResultDisplay => Ok(inputs[0]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(r: usize, c: usize) -> Shape {
        Shape::new(r, c)
    }

    #[test]
    fn test_elementwise_requires_identical_shapes() {
        assert_eq!(
            output_shape(OperatorKind::Add, &[sh(2, 2), sh(2, 2)]),
            Ok(sh(2, 2))
        );
        assert!(output_shape(OperatorKind::Add, &[sh(2, 2), sh(2, 3)]).is_err());
    }

    #[test]
    fn test_scalar_multiply_requires_scalar_second_input() {
        assert_eq!(
            output_shape(OperatorKind::ScalarMultiply, &[sh(3, 2), sh(1, 1)]),
            Ok(sh(3, 2))
        );
        assert!(output_shape(OperatorKind::ScalarMultiply, &[sh(3, 2), sh(2, 2)]).is_err());
    }

    #[test]
    fn test_dot_product_inner_dimensions() {
        assert_eq!(
            output_shape(OperatorKind::DotProduct, &[sh(2, 3), sh(3, 2)]),
            Ok(sh(2, 2))
        );
        assert!(output_shape(OperatorKind::DotProduct, &[sh(2, 3), sh(2, 3)]).is_err());
    }

    #[test]
    fn test_cross_product_accepts_row_and_column_vectors() {
        assert_eq!(
            output_shape(OperatorKind::CrossProduct, &[sh(3, 1), sh(1, 3)]),
            Ok(sh(3, 1))
        );
        assert!(output_shape(OperatorKind::CrossProduct, &[sh(3, 1), sh(2, 1)]).is_err());
    }

    #[test]
    fn test_square_only_operators() {
        assert!(output_shape(OperatorKind::Inverse, &[sh(2, 3)]).is_err());
        assert!(output_shape(OperatorKind::Determinant, &[sh(2, 3)]).is_err());
        assert!(output_shape(OperatorKind::Eigenvalues, &[sh(2, 3)]).is_err());
        assert_eq!(
            output_shape(OperatorKind::Eigenvalues, &[sh(3, 3)]),
            Ok(sh(3, 1))
        );
    }

    #[test]
    fn test_shape_transforms() {
        assert_eq!(output_shape(OperatorKind::Transpose, &[sh(2, 3)]), Ok(sh(3, 2)));
        assert_eq!(
            output_shape(OperatorKind::PseudoInverse, &[sh(2, 3)]),
            Ok(sh(3, 2))
        );
        assert_eq!(output_shape(OperatorKind::Svd, &[sh(4, 2)]), Ok(sh(2, 1)));
        assert_eq!(
            output_shape(OperatorKind::Solve, &[sh(2, 2), sh(2, 3)]),
            Ok(sh(2, 3))
        );
        assert!(output_shape(OperatorKind::Solve, &[sh(2, 2), sh(3, 1)]).is_err());
    }

    #[test]
    fn test_validator_is_deterministic() {
        let first = output_shape(OperatorKind::DotProduct, &[sh(5, 7), sh(7, 3)]);
        for _ in 0..3 {
            assert_eq!(
                output_shape(OperatorKind::DotProduct, &[sh(5, 7), sh(7, 3)]),
                first
            );
        }
    }
}
