//! Contact constraints handed to the whole-body controller.
//!
//! A [`ContactSpec`] owns the per-contact matrices the controller reads each
//! tick:
//!
//! - `Jc` (`dim x n_qdot`): maps generalized velocity to contact velocity
//! - `JcDotQdot` (`dim`): contact drift acceleration
//! - `Uf` (`rows x dim`) and `ieq_vec` (`rows`): admissible reaction forces
//!   satisfy `Uf * F <= ieq_vec`
//!
//! The reaction force is ordered so the normal component comes last, i.e.
//! `F[dim - 1] = fz`. Variants fill the matrices through [`ContactModel`].

mod point;
mod surface;

use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

use crate::kinematics::{ContactKinematics, SPATIAL_DIM};

pub use point::{AnisotropicContact, PointContact};
pub use surface::SurfaceContact;

/// Geometry-specific part of a contact.
///
/// Each hook writes into a buffer already sized by
/// [`ContactModel::dim`] and [`ContactModel::constraint_rows`].
pub trait ContactModel {
    /// Dimension of the reaction force.
    fn dim(&self) -> usize;

    /// Number of inequality rows in `Uf`.
    fn constraint_rows(&self) -> usize;

    fn update_jc(&self, kinematics: &ContactKinematics, jc: &mut DMatrix<f64>);

    fn update_jc_dot_qdot(&self, kinematics: &ContactKinematics, jc_dot_qdot: &mut DVector<f64>);

    fn update_uf(&self, uf: &mut DMatrix<f64>);

    fn update_ieq_vec(&self, ieq_vec: &mut DVector<f64>);
}

/// Copy the last `dim` rows of a spatial snapshot (angular rows first, so a
/// 3-dimensional contact takes the linear part).
fn copy_trailing_rows(kinematics: &ContactKinematics, dim: usize, jc: &mut DMatrix<f64>) {
    jc.copy_from(&kinematics.jacobian.rows(SPATIAL_DIM - dim, dim));
}

fn copy_trailing_bias(kinematics: &ContactKinematics, dim: usize, out: &mut DVector<f64>) {
    out.copy_from(&kinematics.jdot_qdot.rows(SPATIAL_DIM - dim, dim));
}

/// The closed set of contact geometries.
#[derive(Clone, Debug, PartialEq)]
pub enum ContactKind {
    Point(PointContact),
    Anisotropic(AnisotropicContact),
    Surface(SurfaceContact),
}

impl ContactKind {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Point(_) => "point",
            Self::Anisotropic(_) => "anisotropic",
            Self::Surface(_) => "surface",
        }
    }

    fn model(&self) -> &dyn ContactModel {
        match self {
            Self::Point(c) => c,
            Self::Anisotropic(c) => c,
            Self::Surface(c) => c,
        }
    }
}

impl From<PointContact> for ContactKind {
    fn from(c: PointContact) -> Self {
        Self::Point(c)
    }
}

impl From<AnisotropicContact> for ContactKind {
    fn from(c: AnisotropicContact) -> Self {
        Self::Anisotropic(c)
    }
}

impl From<SurfaceContact> for ContactKind {
    fn from(c: SurfaceContact) -> Self {
        Self::Surface(c)
    }
}

impl ContactModel for ContactKind {
    fn dim(&self) -> usize {
        self.model().dim()
    }

    fn constraint_rows(&self) -> usize {
        self.model().constraint_rows()
    }

    fn update_jc(&self, kinematics: &ContactKinematics, jc: &mut DMatrix<f64>) {
        self.model().update_jc(kinematics, jc);
    }

    fn update_jc_dot_qdot(&self, kinematics: &ContactKinematics, jc_dot_qdot: &mut DVector<f64>) {
        self.model().update_jc_dot_qdot(kinematics, jc_dot_qdot);
    }

    fn update_uf(&self, uf: &mut DMatrix<f64>) {
        self.model().update_uf(uf);
    }

    fn update_ieq_vec(&self, ieq_vec: &mut DVector<f64>) {
        self.model().update_ieq_vec(ieq_vec);
    }
}

/// One contact with its constraint matrices.
#[derive(Clone, Debug)]
pub struct ContactSpec {
    kind: ContactKind,
    kinematics: ContactKinematics,
    jc: DMatrix<f64>,
    jc_dot_qdot: DVector<f64>,
    uf: DMatrix<f64>,
    ieq_vec: DVector<f64>,
    fr_des: DVector<f64>,
    idx_fz: usize,
    is_set: bool,
}

impl ContactSpec {
    /// A contact over `n_qdot` generalized velocities. All matrices start
    /// zeroed at their declared sizes and the contact is unset.
    #[must_use]
    pub fn new(kind: impl Into<ContactKind>, n_qdot: usize) -> Self {
        let kind = kind.into();
        let dim = kind.dim();
        let rows = kind.constraint_rows();
        Self {
            kind,
            kinematics: ContactKinematics::zeros(n_qdot),
            jc: DMatrix::zeros(dim, n_qdot),
            jc_dot_qdot: DVector::zeros(dim),
            uf: DMatrix::zeros(rows, dim),
            ieq_vec: DVector::zeros(rows),
            fr_des: DVector::zeros(dim),
            idx_fz: dim - 1,
            is_set: false,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &ContactKind {
        &self.kind
    }

    /// Dimension of the reaction force.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.fr_des.len()
    }

    /// Number of rows of the reaction-force constraint.
    #[must_use]
    pub fn dim_rf_constraint(&self) -> usize {
        self.uf.nrows()
    }

    /// Index of the normal force inside the reaction vector.
    #[must_use]
    pub const fn fz_index(&self) -> usize {
        self.idx_fz
    }

    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.is_set
    }

    /// Replace the kinematic snapshot used by the next update.
    ///
    /// # Panics
    ///
    /// Panics if the snapshot spans a different number of generalized
    /// velocities than this contact.
    pub fn set_kinematics(&mut self, kinematics: ContactKinematics) {
        assert_eq!(
            kinematics.n_qdot(),
            self.jc.ncols(),
            "contact kinematics must span {} velocities",
            self.jc.ncols()
        );
        self.kinematics = kinematics;
    }

    /// Recompute `Jc`, `JcDotQdot`, `Uf` and `ieq_vec` from the current
    /// snapshot, in that order, and mark the contact active.
    ///
    /// Every step is infallible, so this always returns `true`.
    pub fn update_contact_spec(&mut self) -> bool {
        let model = self.kind.model();
        model.update_jc(&self.kinematics, &mut self.jc);
        model.update_jc_dot_qdot(&self.kinematics, &mut self.jc_dot_qdot);
        model.update_uf(&mut self.uf);
        model.update_ieq_vec(&mut self.ieq_vec);
        if !self.is_set {
            debug!(kind = self.kind.label(), "contact set");
        }
        self.is_set = true;
        trace!(kind = self.kind.label(), "contact spec updated");
        true
    }

    /// Mark the contact inactive. Matrices keep their last values.
    pub fn unset_contact(&mut self) {
        if self.is_set {
            debug!(kind = self.kind.label(), "contact unset");
        }
        self.is_set = false;
    }

    #[must_use]
    pub const fn contact_jacobian(&self) -> &DMatrix<f64> {
        &self.jc
    }

    #[must_use]
    pub const fn jc_dot_qdot(&self) -> &DVector<f64> {
        &self.jc_dot_qdot
    }

    #[must_use]
    pub const fn rf_constraint_matrix(&self) -> &DMatrix<f64> {
        &self.uf
    }

    #[must_use]
    pub const fn rf_inequality_vector(&self) -> &DVector<f64> {
        &self.ieq_vec
    }

    /// Desired reaction force. Zero until set.
    #[must_use]
    pub const fn rf_desired(&self) -> &DVector<f64> {
        &self.fr_des
    }

    /// # Panics
    ///
    /// Panics if `fr_des` does not have [`ContactSpec::dim`] entries.
    pub fn set_rf_desired(&mut self, fr_des: &DVector<f64>) {
        assert_eq!(fr_des.len(), self.dim(), "desired reaction force has wrong dimension");
        self.fr_des.copy_from(fr_des);
    }

    /// Largest constraint excess `max_i (Uf F - ieq_vec)_i`, clamped at zero.
    ///
    /// # Panics
    ///
    /// Panics if `force` does not have [`ContactSpec::dim`] entries.
    #[must_use]
    pub fn violation(&self, force: &DVector<f64>) -> f64 {
        assert_eq!(force.len(), self.dim(), "reaction force has wrong dimension");
        (&self.uf * force - &self.ieq_vec)
            .iter()
            .fold(0.0_f64, |acc, &v| acc.max(v))
    }

    /// Whether `force` satisfies every row within `tol`.
    #[must_use]
    pub fn is_feasible(&self, force: &DVector<f64>, tol: f64) -> bool {
        self.violation(force) <= tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::NUM_QDOT;
    use approx::assert_relative_eq;

    fn snapshot() -> ContactKinematics {
        let mut kin = ContactKinematics::zeros(NUM_QDOT);
        kin.jacobian = DMatrix::from_fn(SPATIAL_DIM, NUM_QDOT, |r, c| (10 * r + c) as f64);
        kin.jdot_qdot = DVector::from_fn(SPATIAL_DIM, |r, _| -(r as f64));
        kin
    }

    #[test]
    fn fresh_spec_is_zeroed_and_unset() {
        let spec = ContactSpec::new(PointContact::new(0.6, 250.0), NUM_QDOT);
        assert!(!spec.is_set());
        assert_eq!(spec.dim(), 3);
        assert_eq!(spec.fz_index(), 2);
        assert_eq!(spec.dim_rf_constraint(), 6);
        assert_eq!(spec.contact_jacobian().shape(), (3, NUM_QDOT));
        assert_eq!(spec.rf_constraint_matrix().shape(), (6, 3));
        assert!(spec.contact_jacobian().iter().all(|&v| v == 0.0));
        assert!(spec.rf_inequality_vector().iter().all(|&v| v == 0.0));
        assert!(spec.rf_desired().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn update_sets_and_unset_clears() {
        let mut spec = ContactSpec::new(PointContact::new(0.6, 250.0), NUM_QDOT);
        spec.set_kinematics(snapshot());
        assert!(spec.update_contact_spec());
        assert!(spec.is_set());
        assert_eq!(spec.dim_rf_constraint(), spec.rf_constraint_matrix().nrows());
        spec.unset_contact();
        assert!(!spec.is_set());
        // Matrices survive unset.
        assert_relative_eq!(spec.contact_jacobian()[(0, 0)], 30.0);
    }

    #[test]
    fn point_contact_takes_linear_rows() {
        let mut spec = ContactSpec::new(PointContact::new(0.6, 250.0), NUM_QDOT);
        spec.set_kinematics(snapshot());
        spec.update_contact_spec();
        let kin = snapshot();
        assert_eq!(spec.contact_jacobian(), &kin.jacobian.rows(3, 3).into_owned());
        assert_eq!(spec.jc_dot_qdot(), &kin.jdot_qdot.rows(3, 3).into_owned());
    }

    #[test]
    fn surface_contact_takes_full_snapshot() {
        let mut spec = ContactSpec::new(SurfaceContact::new(0.6, 0.1, 0.05, 0.02, 400.0), NUM_QDOT);
        spec.set_kinematics(snapshot());
        spec.update_contact_spec();
        assert_eq!(spec.dim(), 6);
        assert_eq!(spec.fz_index(), 5);
        assert_eq!(spec.contact_jacobian(), &snapshot().jacobian);
    }

    #[test]
    fn repeated_updates_are_idempotent() {
        let mut spec = ContactSpec::new(AnisotropicContact::new(0.5, 0.8, 300.0), NUM_QDOT);
        spec.set_kinematics(snapshot());
        spec.update_contact_spec();
        let uf = spec.rf_constraint_matrix().clone();
        let ieq = spec.rf_inequality_vector().clone();
        spec.update_contact_spec();
        assert_eq!(spec.rf_constraint_matrix(), &uf);
        assert_eq!(spec.rf_inequality_vector(), &ieq);
    }

    #[test]
    fn desired_force_round_trips() {
        let mut spec = ContactSpec::new(PointContact::new(0.6, 250.0), NUM_QDOT);
        let f = DVector::from_vec(vec![1.0, -2.0, 40.0]);
        spec.set_rf_desired(&f);
        assert_eq!(spec.rf_desired(), &f);
    }

    #[test]
    #[should_panic(expected = "wrong dimension")]
    fn desired_force_dimension_checked() {
        let mut spec = ContactSpec::new(PointContact::new(0.6, 250.0), NUM_QDOT);
        spec.set_rf_desired(&DVector::zeros(6));
    }

    #[test]
    #[should_panic(expected = "must span")]
    fn kinematics_width_checked() {
        let mut spec = ContactSpec::new(PointContact::new(0.6, 250.0), NUM_QDOT);
        spec.set_kinematics(ContactKinematics::zeros(7));
    }

    #[test]
    fn kind_dispatch_reports_dimensions() {
        let kinds: [ContactKind; 3] = [
            PointContact::new(0.6, 100.0).into(),
            AnisotropicContact::new(0.4, 0.7, 100.0).into(),
            SurfaceContact::new(0.6, 0.1, 0.05, 0.02, 100.0).into(),
        ];
        let dims: Vec<_> = kinds.iter().map(|k| (k.dim(), k.constraint_rows())).collect();
        assert_eq!(dims, vec![(3, 6), (3, 6), (6, 12)]);
        assert_eq!(kinds[2].label(), "surface");
    }
}
