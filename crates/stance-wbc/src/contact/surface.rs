//! Rectangular foot patch that transmits a full wrench.
//!
//! Reaction `F = [tau_x, tau_y, tau_z, fx, fy, fz]` about the patch center.
//! On top of the point-contact pyramid over `(fx, fy, fz)`, the center of
//! pressure stays inside a `2 lx x 2 ly` rectangle and the yaw moment is
//! bounded by torsional friction:
//!
//! ```text
//!   |tau_x| <= ly fz
//!   |tau_y| <= lx fz
//!   |tau_z| <= mu_t fz
//! ```

use nalgebra::{DMatrix, DVector};

use super::point::{PYRAMID_ROWS, assert_friction, write_pyramid, write_pyramid_bounds};
use super::{ContactModel, copy_trailing_bias, copy_trailing_rows};
use crate::kinematics::{ContactKinematics, SPATIAL_DIM};

const FX: usize = 3;
const FZ: usize = 5;
const ROWS: usize = PYRAMID_ROWS + 6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceContact {
    mu: f64,
    half_length: f64,
    half_width: f64,
    torsional_mu: f64,
    max_fz: f64,
}

impl SurfaceContact {
    /// `half_length` (lx) and `half_width` (ly) are the patch half-extents
    /// along the contact x and y axes.
    ///
    /// # Panics
    ///
    /// Panics if `mu` or `max_fz` is not positive and finite, or any patch
    /// parameter is negative.
    #[must_use]
    pub fn new(mu: f64, half_length: f64, half_width: f64, torsional_mu: f64, max_fz: f64) -> Self {
        assert_friction(mu, max_fz);
        assert!(
            half_length >= 0.0 && half_width >= 0.0 && torsional_mu >= 0.0,
            "patch dimensions must be non-negative"
        );
        Self {
            mu,
            half_length,
            half_width,
            torsional_mu,
            max_fz,
        }
    }
}

impl ContactModel for SurfaceContact {
    fn dim(&self) -> usize {
        SPATIAL_DIM
    }

    fn constraint_rows(&self) -> usize {
        ROWS
    }

    fn update_jc(&self, kinematics: &ContactKinematics, jc: &mut DMatrix<f64>) {
        copy_trailing_rows(kinematics, SPATIAL_DIM, jc);
    }

    fn update_jc_dot_qdot(&self, kinematics: &ContactKinematics, jc_dot_qdot: &mut DVector<f64>) {
        copy_trailing_bias(kinematics, SPATIAL_DIM, jc_dot_qdot);
    }

    fn update_uf(&self, uf: &mut DMatrix<f64>) {
        uf.fill(0.0);
        write_pyramid(uf, 0, FX, self.mu, self.mu);

        let moment_bounds = [self.half_width, self.half_length, self.torsional_mu];
        for (axis, bound) in moment_bounds.into_iter().enumerate() {
            let row = PYRAMID_ROWS + 2 * axis;
            uf[(row, axis)] = 1.0;
            uf[(row, FZ)] = -bound;
            uf[(row + 1, axis)] = -1.0;
            uf[(row + 1, FZ)] = -bound;
        }
    }

    fn update_ieq_vec(&self, ieq_vec: &mut DVector<f64>) {
        ieq_vec.fill(0.0);
        write_pyramid_bounds(ieq_vec, 0, self.max_fz);
    }
}
