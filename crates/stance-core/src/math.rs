//! Numeric helpers shared by the kinematics and contact layers.
//!
//! The pseudo-inverse truncates small singular values instead of inflating
//! them, so rank-deficient Jacobians (fully stretched legs, contacts at a
//! kinematic singularity) degrade to a zero response in the lost directions.

use std::f64::consts::{PI, TAU};
use std::ops::Mul;

use nalgebra::constraint::{SameNumberOfColumns, SameNumberOfRows, ShapeConstraint};
use nalgebra::{DMatrix, Dim, Matrix, RawStorage, RealField};

/// Square a number.
#[inline]
pub fn square<T: Copy + Mul<Output = T>>(a: T) -> T {
    a * a
}

/// Whether two scalars differ by strictly less than `tol`.
#[inline]
pub fn almost_equal<T: RealField + Copy>(a: T, b: T, tol: T) -> bool {
    (a - b).abs() < tol
}

/// Whether every element-wise difference of `a` and `b` is strictly less
/// than `tol`.
///
/// Statically-sized operands must agree in shape at compile time.
///
/// # Panics
///
/// Panics if a dynamically-sized operand does not match the other's shape.
pub fn almost_equal_matrix<T, R1, C1, S1, R2, C2, S2>(
    a: &Matrix<T, R1, C1, S1>,
    b: &Matrix<T, R2, C2, S2>,
    tol: T,
) -> bool
where
    T: RealField + Copy,
    R1: Dim,
    C1: Dim,
    R2: Dim,
    C2: Dim,
    S1: RawStorage<T, R1, C1>,
    S2: RawStorage<T, R2, C2>,
    ShapeConstraint: SameNumberOfRows<R1, R2> + SameNumberOfColumns<C1, C2>,
{
    assert_eq!(
        a.shape(),
        b.shape(),
        "almost_equal_matrix requires operands of the same shape"
    );
    a.iter().zip(b.iter()).all(|(&x, &y)| (x - y).abs() < tol)
}

/// Moore-Penrose pseudo-inverse with singular-value truncation.
///
/// Singular values `<= sigma_threshold` contribute zero instead of
/// `1 / sigma`. The result is always `cols x rows`. A 1x1 input skips the
/// decomposition and is inverted directly when `|a| > sigma_threshold`.
pub fn pseudo_inverse(matrix: &DMatrix<f64>, sigma_threshold: f64) -> DMatrix<f64> {
    let (rows, cols) = matrix.shape();
    if rows == 0 || cols == 0 {
        return DMatrix::zeros(cols, rows);
    }

    if rows == 1 && cols == 1 {
        let a = matrix[(0, 0)];
        let inv = if a.abs() > sigma_threshold { a.recip() } else { 0.0 };
        return DMatrix::from_element(1, 1, inv);
    }

    let svd = matrix.clone().svd(true, true);
    let mut inverse = DMatrix::zeros(cols, rows);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return inverse;
    };

    // A^+ = sum_i v_i u_i^T / sigma_i over the retained singular values.
    for (i, &sigma) in svd.singular_values.iter().enumerate() {
        if sigma > sigma_threshold {
            let v_i = v_t.row(i).transpose();
            inverse.ger(sigma.recip(), &v_i, &u.column(i), 1.0);
        }
    }
    inverse
}

/// Wrap an angle to `(-pi, pi]`.
pub fn wrap_to_pi(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}
