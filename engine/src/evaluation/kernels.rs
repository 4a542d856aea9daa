//! Numeric kernel library — operator math over concrete matrices.
//!
//! Pure functions, invoked only after the shape validator accepts. Dense
//! decompositions (LU, SVD, eigen) are delegated to faer; elementwise work
//! stays on the row-major buffers. Any non-finite output is reported as
//! `NonFiniteResult` instead of being returned as a value.

use faer::linalg::solvers::{EvdError, Solve, Svd, SvdError};
use faer::{Mat, MatRef, Side, c64};

use crate::error::EvalError;
use crate::model::matrix::Matrix;
use crate::model::node::OperatorKind;

/// Relative determinant tolerance below which a square matrix is treated as
/// singular: `|det(A)| <= SINGULAR_TOL * max(1, ‖A‖_max)^n`.
const SINGULAR_TOL: f64 = 1e-10;

/// Relative bound on imaginary parts accepted as floating-point noise when a
/// general eigendecomposition is folded back to real values.
const IMAG_TOL: f64 = 1e-9;

/// Execute `op` on shape-validated inputs.
pub fn execute(op: OperatorKind, inputs: &[&Matrix]) -> Result<Matrix, EvalError> {
    use OperatorKind::*;
    debug_assert_eq!(inputs.len(), op.arity());

    match op {
        Add => zip(inputs[0], inputs[1], |a, b| a + b),
        Subtract => zip(inputs[0], inputs[1], |a, b| a - b),
        ElementMultiply => zip(inputs[0], inputs[1], |a, b| a * b),
        ElementDivide => {
            if inputs[1].data().iter().any(|v| *v == 0.0) {
                return Err(EvalError::DivisionByZero);
            }
            zip(inputs[0], inputs[1], |a, b| a / b)
        }
        ScalarMultiply => {
            let k = inputs[1].get(0, 0);
            let data = inputs[0].data().iter().map(|v| v * k).collect();
            finish(inputs[0].rows(), inputs[0].cols(), data)
        }
        DotProduct => {
            let product: Mat<f64> = to_faer(inputs[0]) * to_faer(inputs[1]);
            from_faer(product.as_ref())
        }
        CrossProduct => cross(inputs[0], inputs[1]),
        Solve => solve(inputs[0], inputs[1]),
        Transpose => transpose(inputs[0]),
        Inverse => inverse(inputs[0]),
        PseudoInverse => pseudo_inverse(inputs[0]),
        Determinant => finish(1, 1, vec![to_faer(inputs[0]).determinant()]),
        Trace => {
            let trace: f64 = (0..inputs[0].rows()).map(|i| inputs[0].get(i, i)).sum();
            finish(1, 1, vec![trace])
        }
        Rank => rank(inputs[0]),
        Eigenvalues => {
            let n = inputs[0].rows();
            let (values, _) = eigen_parts(inputs[0])?;
            finish(n, 1, values)
        }
        Eigenvectors => {
            let n = inputs[0].rows();
            let (_, vectors) = eigen_parts(inputs[0])?;
            finish(n, n, vectors)
        }
        Svd => {
            let values = singular_values(inputs[0])?;
            finish(values.len(), 1, values)
        }
        ResultDisplay => Ok(inputs[0].clone()),
    }
}

/// View a matrix as a faer matrix (zero-copy, row-major).
fn to_faer(m: &Matrix) -> MatRef<'_, f64> {
    MatRef::from_row_major_slice(m.data(), m.rows(), m.cols())
}

/// Copy a faer matrix back out, converting non-finite entries to an error.
fn from_faer(mat: MatRef<'_, f64>) -> Result<Matrix, EvalError> {
    let (rows, cols) = (mat.nrows(), mat.ncols());
    let mut data = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            data.push(mat[(i, j)]);
        }
    }
    finish(rows, cols, data)
}

fn finish(rows: usize, cols: usize, data: Vec<f64>) -> Result<Matrix, EvalError> {
    Matrix::from_vec(rows, cols, data).map_err(|_| EvalError::NonFiniteResult)
}

fn zip(a: &Matrix, b: &Matrix, f: impl Fn(f64, f64) -> f64) -> Result<Matrix, EvalError> {
    let data = a
        .data()
        .iter()
        .zip(b.data())
        .map(|(x, y)| f(*x, *y))
        .collect();
    finish(a.rows(), a.cols(), data)
}

fn transpose(m: &Matrix) -> Result<Matrix, EvalError> {
    let (rows, cols) = (m.rows(), m.cols());
    let mut data = Vec::with_capacity(rows * cols);
    for j in 0..cols {
        for i in 0..rows {
            data.push(m.get(i, j));
        }
    }
    finish(cols, rows, data)
}

fn cross(a: &Matrix, b: &Matrix) -> Result<Matrix, EvalError> {
    // Both inputs are length-3 vectors, so the buffers are 3 contiguous
    // entries regardless of orientation. Output follows `a`'s orientation.
    let (x, y) = (a.data(), b.data());
    let data = vec![
        x[1] * y[2] - x[2] * y[1],
        x[2] * y[0] - x[0] * y[2],
        x[0] * y[1] - x[1] * y[0],
    ];
    finish(a.rows(), a.cols(), data)
}

/// Singularity test used before LU-based kernels commit to a solve.
fn is_singular(mat: MatRef<'_, f64>, norm: f64) -> bool {
    let n = mat.nrows() as i32;
    mat.determinant().abs() <= SINGULAR_TOL * norm.max(1.0).powi(n)
}

fn inverse(m: &Matrix) -> Result<Matrix, EvalError> {
    let mat = to_faer(m);
    if is_singular(mat, m.max_abs()) {
        return Err(EvalError::SingularMatrix);
    }
    let lu = mat.partial_piv_lu();
    let mut x = Mat::<f64>::identity(m.rows(), m.rows());
    lu.solve_in_place(&mut x);
    from_faer(x.as_ref())
}

fn solve(a: &Matrix, b: &Matrix) -> Result<Matrix, EvalError> {
    let a_mat = to_faer(a);
    if is_singular(a_mat, a.max_abs()) {
        return Err(EvalError::SingularMatrix);
    }
    let lu = a_mat.partial_piv_lu();
    let mut x = to_faer(b).to_owned();
    lu.solve_in_place(&mut x);
    from_faer(x.as_ref())
}

/// Thin-SVD singular values in descending order.
fn singular_values(m: &Matrix) -> Result<Vec<f64>, EvalError> {
    let svd: Svd<f64> =
        Svd::new_thin(to_faer(m)).map_err(|_: SvdError| EvalError::NoConvergence)?;
    let s = svd.S();
    Ok((0..m.rows().min(m.cols())).map(|i| s[i]).collect())
}

/// Cutoff below which singular values count as zero (numpy's default).
fn rank_cutoff(m: &Matrix, s_max: f64) -> f64 {
    s_max * m.rows().max(m.cols()) as f64 * f64::EPSILON
}

fn rank(m: &Matrix) -> Result<Matrix, EvalError> {
    let s = singular_values(m)?;
    let cutoff = rank_cutoff(m, s[0]);
    let rank = s.iter().filter(|&&v| v > cutoff).count();
    finish(1, 1, vec![rank as f64])
}

fn pseudo_inverse(m: &Matrix) -> Result<Matrix, EvalError> {
    let (rows, cols) = (m.rows(), m.cols());
    let k = rows.min(cols);
    let svd: Svd<f64> =
        Svd::new_thin(to_faer(m)).map_err(|_: SvdError| EvalError::NoConvergence)?;
    let (u, s, v) = (svd.U(), svd.S(), svd.V());
    let cutoff = rank_cutoff(m, s[0]);

    // A⁺ = V · Σ⁺ · Uᵀ, zeroing singular values below the cutoff.
    let mut data = vec![0.0; cols * rows];
    for i in 0..cols {
        for j in 0..rows {
            let mut acc = 0.0;
            for t in 0..k {
                if s[t] > cutoff {
                    acc += v[(i, t)] * u[(j, t)] / s[t];
                }
            }
            data[i * rows + j] = acc;
        }
    }
    finish(cols, rows, data)
}

fn is_symmetric(m: &Matrix) -> bool {
    let tol = 1e-12 * m.max_abs().max(1.0);
    for i in 0..m.rows() {
        for j in 0..i {
            if (m.get(i, j) - m.get(j, i)).abs() > tol {
                return false;
            }
        }
    }
    true
}

/// Eigenvalues (length n) and eigenvectors (n×n row-major, columns are
/// vectors) of a square matrix.
///
/// Symmetric matrices take the real self-adjoint path. General matrices go
/// through the complex solver; if any eigenvalue keeps a non-negligible
/// imaginary part the result cannot be represented here and the kernel
/// reports `NoConvergence`.
fn eigen_parts(m: &Matrix) -> Result<(Vec<f64>, Vec<f64>), EvalError> {
    let n = m.rows();
    if is_symmetric(m) {
        let evd = to_faer(m)
            .self_adjoint_eigen(Side::Lower)
            .map_err(|_: EvdError| EvalError::NoConvergence)?;
        let s = evd.S();
        let u = evd.U();
        let values: Vec<f64> = (0..n).map(|i| s[i]).collect();
        let mut vectors = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                vectors.push(u[(i, j)]);
            }
        }
        return Ok((values, vectors));
    }

    let cmat = Mat::from_fn(n, n, |i, j| c64::new(m.get(i, j), 0.0));
    let evd = cmat
        .as_ref()
        .eigen()
        .map_err(|_: EvdError| EvalError::NoConvergence)?;
    let tol = IMAG_TOL * m.max_abs().max(1.0);

    let s = evd.S();
    let mut values = Vec::with_capacity(n);
    for i in 0..n {
        let lambda: c64 = s[i];
        if lambda.im.abs() > tol {
            return Err(EvalError::NoConvergence);
        }
        values.push(lambda.re);
    }

    // Each eigenvector carries an arbitrary complex phase; rotate it out
    // against the column's largest entry before insisting on real parts.
    let u = evd.U();
    let mut vectors = vec![0.0; n * n];
    for j in 0..n {
        let mut pivot = c64::new(1.0, 0.0);
        let mut best = 0.0;
        for i in 0..n {
            let z: c64 = u[(i, j)];
            let mag = (z.re * z.re + z.im * z.im).sqrt();
            if mag > best {
                best = mag;
                pivot = z;
            }
        }
        for i in 0..n {
            let z: c64 = u[(i, j)];
            let (re, im) = if best > 0.0 {
                (
                    (z.re * pivot.re + z.im * pivot.im) / best,
                    (z.im * pivot.re - z.re * pivot.im) / best,
                )
            } else {
                (z.re, z.im)
            };
            if im.abs() > tol {
                return Err(EvalError::NoConvergence);
            }
            vectors[i * n + j] = re;
        }
    }
    Ok((values, vectors))
}
