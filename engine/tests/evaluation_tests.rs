use approx::assert_relative_eq;
use engine::{EvalError, Matrix, MatrixEngine, OperatorKind, Shape};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn matrix(rows: &[Vec<f64>]) -> Matrix {
    Matrix::from_rows(rows).unwrap()
}

#[test]
fn test_add_two_matrices() {
    init_logging();
    let mut engine = MatrixEngine::new();
    let a = engine.add_data_node("A", matrix(&[vec![1.0, 2.0], vec![3.0, 4.0]]));
    let b = engine.add_data_node("B", matrix(&[vec![5.0, 6.0], vec![7.0, 8.0]]));
    let add = engine.add_operator_node("Add", OperatorKind::Add);
    engine.connect(a, add, 0).unwrap();
    engine.connect(b, add, 1).unwrap();

    assert_eq!(
        engine.evaluation_record(add).value(),
        Some(&matrix(&[vec![6.0, 8.0], vec![10.0, 12.0]]))
    );
}

#[test]
fn test_dot_product_shapes() {
    init_logging();
    let mut engine = MatrixEngine::new();
    let a = engine.add_data_node("A", matrix(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]));
    let b = engine.add_data_node("B", matrix(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]));
    let c = engine.add_data_node("C", matrix(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]));
    let dot = engine.add_operator_node("Dot", OperatorKind::DotProduct);
    engine.connect(a, dot, 0).unwrap();
    engine.connect(b, dot, 1).unwrap();
    assert_eq!(engine.output_shape(dot), Some(Shape::new(2, 2)));

    // Rewiring the second input to an incompatible shape flips the node
    // into a shape error; the query shape becomes unknown.
    engine.disconnect(dot, 1).unwrap();
    engine.connect(c, dot, 1).unwrap();
    assert!(matches!(
        engine.evaluation_record(dot).error(),
        Some(EvalError::ShapeMismatch { .. })
    ));
    assert_eq!(engine.output_shape(dot), None);
}

#[test]
fn test_inverse_of_singular_matrix() {
    init_logging();
    let mut engine = MatrixEngine::new();
    let a = engine.add_data_node("A", matrix(&[vec![1.0, 2.0], vec![2.0, 4.0]]));
    let inv = engine.add_operator_node("Inv", OperatorKind::Inverse);
    engine.connect(a, inv, 0).unwrap();
    assert_eq!(
        engine.evaluation_record(inv).error(),
        Some(&EvalError::SingularMatrix)
    );
}

#[test]
fn test_solve_linear_system() {
    init_logging();
    let mut engine = MatrixEngine::new();
    let a = engine.add_data_node("A", matrix(&[vec![2.0, 1.0], vec![1.0, 3.0]]));
    let b = engine.add_data_node("B", matrix(&[vec![5.0], vec![7.0]]));
    let solve = engine.add_operator_node("Solve", OperatorKind::Solve);
    engine.connect(a, solve, 0).unwrap();
    engine.connect(b, solve, 1).unwrap();

    let record = engine.evaluation_record(solve);
    let x = record.value().expect("solve should produce a value");
    assert_eq!(x.shape(), Shape::new(2, 1));
    assert_relative_eq!(x.get(0, 0), 1.6, epsilon = 1e-12);
    assert_relative_eq!(x.get(1, 0), 1.8, epsilon = 1e-12);
}

#[test]
fn test_incremental_recompute_leaves_unrelated_branch_alone() {
    init_logging();
    let mut engine = MatrixEngine::new();

    // Branch under edit: (A + B) -> Inverse.
    let a = engine.add_data_node("A", matrix(&[vec![1.0, 0.0], vec![0.0, 1.0]]));
    let b = engine.add_data_node("B", matrix(&[vec![1.0, 0.0], vec![0.0, 1.0]]));
    let add = engine.add_operator_node("Add", OperatorKind::Add);
    let inv = engine.add_operator_node("Inv", OperatorKind::Inverse);
    engine.connect(a, add, 0).unwrap();
    engine.connect(b, add, 1).unwrap();
    engine.connect(add, inv, 0).unwrap();

    // Unrelated branch.
    let c = engine.add_data_node("C", matrix(&[vec![1.0, 2.0, 3.0]]));
    let transpose = engine.add_operator_node("T", OperatorKind::Transpose);
    engine.connect(c, transpose, 0).unwrap();

    // A+B = 2I, so the inverse is I/2.
    assert_eq!(
        engine.evaluation_record(inv).value(),
        Some(&matrix(&[vec![0.5, 0.0], vec![0.0, 0.5]]))
    );
    let transpose_before = engine.evaluation_record(transpose);

    engine
        .set_literal_value(a, matrix(&[vec![3.0, 0.0], vec![0.0, 3.0]]))
        .unwrap();

    // The edited branch recomputed: A+B = 4I, inverse I/4.
    assert_eq!(
        engine.evaluation_record(inv).value(),
        Some(&matrix(&[vec![0.25, 0.0], vec![0.0, 0.25]]))
    );
    // The unrelated branch kept its exact prior record.
    assert_eq!(engine.evaluation_record(transpose), transpose_before);
}

#[test]
fn test_error_propagates_to_all_descendants() {
    init_logging();
    let mut engine = MatrixEngine::new();
    let a = engine.add_data_node("A", matrix(&[vec![1.0, 2.0], vec![2.0, 4.0]]));
    let inv = engine.add_operator_node("Inv", OperatorKind::Inverse);
    let scale = engine.add_operator_node("Scale", OperatorKind::ScalarMultiply);
    let k = engine.add_data_node("k", matrix(&[vec![2.0]]));
    let display = engine.add_operator_node("Out", OperatorKind::ResultDisplay);
    engine.connect(a, inv, 0).unwrap();
    engine.connect(inv, scale, 0).unwrap();
    engine.connect(k, scale, 1).unwrap();
    engine.connect(scale, display, 0).unwrap();

    let expected = EvalError::Upstream {
        origin: inv,
        cause: Box::new(EvalError::SingularMatrix),
    };
    assert_eq!(engine.evaluation_record(scale).error(), Some(&expected));
    assert_eq!(engine.evaluation_record(display).error(), Some(&expected));

    // Fixing the literal clears the whole chain.
    engine
        .set_literal_value(a, matrix(&[vec![1.0, 0.0], vec![0.0, 1.0]]))
        .unwrap();
    assert_eq!(
        engine.evaluation_record(display).value(),
        Some(&matrix(&[vec![2.0, 0.0], vec![0.0, 2.0]]))
    );
}

#[test]
fn test_new_operator_node_reports_missing_input() {
    init_logging();
    let mut engine = MatrixEngine::new();
    let add = engine.add_operator_node("Add", OperatorKind::Add);
    assert_eq!(
        engine.evaluation_record(add).error(),
        Some(&EvalError::MissingInput { port: 0 })
    );
}

#[test]
fn test_result_display_passes_value_through() {
    init_logging();
    let mut engine = MatrixEngine::new();
    let a = engine.add_data_node("A", matrix(&[vec![1.5, -2.5]]));
    let display = engine.add_operator_node("Out", OperatorKind::ResultDisplay);
    engine.connect(a, display, 0).unwrap();
    assert_eq!(
        engine.evaluation_record(display).value(),
        engine.evaluation_record(a).value()
    );
}

#[test]
fn test_unknown_node_reads_as_unset() {
    init_logging();
    let engine = MatrixEngine::new();
    let record = engine.evaluation_record(uuid::Uuid::new_v4());
    assert!(record.is_unset());
    assert_eq!(engine.output_shape(uuid::Uuid::new_v4()), None);
}

#[test]
fn test_repeated_edit_is_idempotent() {
    init_logging();
    let mut engine = MatrixEngine::new();
    let a = engine.add_data_node("A", matrix(&[vec![1.0, 2.0], vec![3.0, 4.0]]));
    let t = engine.add_operator_node("T", OperatorKind::Transpose);
    engine.connect(a, t, 0).unwrap();

    let value = matrix(&[vec![9.0, 8.0], vec![7.0, 6.0]]);
    engine.set_literal_value(a, value.clone()).unwrap();
    let first = engine.evaluation_record(t);
    engine.set_literal_value(a, value).unwrap();
    assert_eq!(engine.evaluation_record(t), first);
}

#[test]
fn test_fan_out_updates_every_consumer() {
    init_logging();
    let mut engine = MatrixEngine::new();
    let a = engine.add_data_node("A", matrix(&[vec![2.0, 0.0], vec![0.0, 2.0]]));
    let det = engine.add_operator_node("Det", OperatorKind::Determinant);
    let trace = engine.add_operator_node("Trace", OperatorKind::Trace);
    engine.connect(a, det, 0).unwrap();
    engine.connect(a, trace, 0).unwrap();

    assert_eq!(engine.evaluation_record(det).value(), Some(&matrix(&[vec![4.0]])));
    assert_eq!(engine.evaluation_record(trace).value(), Some(&matrix(&[vec![4.0]])));

    engine
        .set_literal_value(a, matrix(&[vec![3.0, 0.0], vec![0.0, 3.0]]))
        .unwrap();
    assert_eq!(engine.evaluation_record(det).value(), Some(&matrix(&[vec![9.0]])));
    assert_eq!(engine.evaluation_record(trace).value(), Some(&matrix(&[vec![6.0]])));
}
