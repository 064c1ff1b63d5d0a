//! Point-foot contacts with a linearized friction cone.
//!
//! Reaction force `F = [fx, fy, fz]`. The six rows of `Uf F <= ieq_vec`:
//!
//! ```text
//!    fx - mu_x fz <= 0
//!   -fx - mu_x fz <= 0
//!    fy - mu_y fz <= 0
//!   -fy - mu_y fz <= 0
//!   -fz           <= 0
//!    fz           <= f_max
//! ```

use nalgebra::{DMatrix, DVector};

use super::{ContactModel, copy_trailing_bias, copy_trailing_rows};
use crate::kinematics::ContactKinematics;

const DIM: usize = 3;
pub(super) const PYRAMID_ROWS: usize = 6;

/// Write the friction pyramid over the force columns `fx_col`, `fx_col + 1`
/// and `fx_col + 2` into rows `row..row + 6`.
pub(super) fn write_pyramid(uf: &mut DMatrix<f64>, row: usize, fx_col: usize, mu_x: f64, mu_y: f64) {
    let (fx, fy, fz) = (fx_col, fx_col + 1, fx_col + 2);
    uf[(row, fx)] = 1.0;
    uf[(row, fz)] = -mu_x;
    uf[(row + 1, fx)] = -1.0;
    uf[(row + 1, fz)] = -mu_x;
    uf[(row + 2, fy)] = 1.0;
    uf[(row + 2, fz)] = -mu_y;
    uf[(row + 3, fy)] = -1.0;
    uf[(row + 3, fz)] = -mu_y;
    uf[(row + 4, fz)] = -1.0;
    uf[(row + 5, fz)] = 1.0;
}

pub(super) fn write_pyramid_bounds(ieq_vec: &mut DVector<f64>, row: usize, max_fz: f64) {
    ieq_vec.rows_mut(row, PYRAMID_ROWS).fill(0.0);
    ieq_vec[row + 5] = max_fz;
}

pub(super) fn assert_friction(mu: f64, max_fz: f64) {
    assert!(mu.is_finite() && mu > 0.0, "friction coefficient must be positive, got {mu}");
    assert!(
        max_fz.is_finite() && max_fz > 0.0,
        "normal force limit must be positive, got {max_fz}"
    );
}

/// Isotropic point contact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointContact {
    mu: f64,
    max_fz: f64,
}

impl PointContact {
    /// # Panics
    ///
    /// Panics if `mu` or `max_fz` is not positive.
    #[must_use]
    pub fn new(mu: f64, max_fz: f64) -> Self {
        assert_friction(mu, max_fz);
        Self { mu, max_fz }
    }

    #[must_use]
    pub const fn mu(&self) -> f64 {
        self.mu
    }

    #[must_use]
    pub const fn max_fz(&self) -> f64 {
        self.max_fz
    }
}

impl ContactModel for PointContact {
    fn dim(&self) -> usize {
        DIM
    }

    fn constraint_rows(&self) -> usize {
        PYRAMID_ROWS
    }

    fn update_jc(&self, kinematics: &ContactKinematics, jc: &mut DMatrix<f64>) {
        copy_trailing_rows(kinematics, DIM, jc);
    }

    fn update_jc_dot_qdot(&self, kinematics: &ContactKinematics, jc_dot_qdot: &mut DVector<f64>) {
        copy_trailing_bias(kinematics, DIM, jc_dot_qdot);
    }

    fn update_uf(&self, uf: &mut DMatrix<f64>) {
        uf.fill(0.0);
        write_pyramid(uf, 0, 0, self.mu, self.mu);
    }

    fn update_ieq_vec(&self, ieq_vec: &mut DVector<f64>) {
        write_pyramid_bounds(ieq_vec, 0, self.max_fz);
    }
}

/// Point contact with distinct friction along the contact x and y axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnisotropicContact {
    mu_x: f64,
    mu_y: f64,
    max_fz: f64,
}

impl AnisotropicContact {
    /// # Panics
    ///
    /// Panics if either coefficient or `max_fz` is not positive.
    #[must_use]
    pub fn new(mu_x: f64, mu_y: f64, max_fz: f64) -> Self {
        assert_friction(mu_x, max_fz);
        assert_friction(mu_y, max_fz);
        Self { mu_x, mu_y, max_fz }
    }

    #[must_use]
    pub const fn mu_x(&self) -> f64 {
        self.mu_x
    }

    #[must_use]
    pub const fn mu_y(&self) -> f64 {
        self.mu_y
    }
}

impl ContactModel for AnisotropicContact {
    fn dim(&self) -> usize {
        DIM
    }

    fn constraint_rows(&self) -> usize {
        PYRAMID_ROWS
    }

    fn update_jc(&self, kinematics: &ContactKinematics, jc: &mut DMatrix<f64>) {
        copy_trailing_rows(kinematics, DIM, jc);
    }

    fn update_jc_dot_qdot(&self, kinematics: &ContactKinematics, jc_dot_qdot: &mut DVector<f64>) {
        copy_trailing_bias(kinematics, DIM, jc_dot_qdot);
    }

    fn update_uf(&self, uf: &mut DMatrix<f64>) {
        uf.fill(0.0);
        write_pyramid(uf, 0, 0, self.mu_x, self.mu_y);
    }

    fn update_ieq_vec(&self, ieq_vec: &mut DVector<f64>) {
        write_pyramid_bounds(ieq_vec, 0, self.max_fz);
    }
}
