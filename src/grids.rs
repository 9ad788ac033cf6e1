//! Borrowed-grid types standing in for the external collaborators.
//!
//! The field solver, charge solver and current solver live outside this
//! crate (spec §1: "out of scope"). What we describe here is the shape of
//! the grids they hand to [`crate::species::Species::advance`] for the
//! duration of one timestep: per-axis arrays of length `nx + 1`, the extra
//! entry being the upper guard cell.

use ndarray::{ArrayView1, ArrayViewMut1};

/// Interpolated electric and magnetic fields at particle positions,
/// `E_part`/`B_part` in spec §3/§4.4. Read-only for the duration of
/// `advance`.
#[derive(Clone, Copy)]
pub struct FieldGrid<'a> {
    /// `E_x`, length `nx + 1`.
    pub ex: ArrayView1<'a, f64>,
    /// `E_y`, length `nx + 1`.
    pub ey: ArrayView1<'a, f64>,
    /// `E_z`, length `nx + 1`.
    pub ez: ArrayView1<'a, f64>,
    /// `B_x`, length `nx + 1`.
    pub bx: ArrayView1<'a, f64>,
    /// `B_y`, length `nx + 1`.
    pub by: ArrayView1<'a, f64>,
    /// `B_z`, length `nx + 1`.
    pub bz: ArrayView1<'a, f64>,
}

impl<'a> FieldGrid<'a> {
    /// Number of cells implied by the array lengths (arrays are `nx + 1`
    /// long to hold the upper guard cell).
    #[must_use]
    pub fn nx(&self) -> usize {
        self.ex.len() - 1
    }
}

/// The charge density grid, `rho` in spec §4.5/§4.7: a scalar array of
/// length `nx + 1`, accumulated into during deposition. The guard cell is
/// folded back into the primary range by the external charge solver (or,
/// for the diagnostic report, by [`crate::diagnostics`]).
pub struct ChargeGrid<'a> {
    /// `rho`, length `nx + 1`.
    pub rho: ArrayViewMut1<'a, f64>,
}

/// The current density grid, `J` in spec §4.5: three per-axis arrays of
/// length `nx + 1`, accumulated into during deposition.
pub struct CurrentGrid<'a> {
    /// `J_x`, length `nx + 1`.
    pub jx: ArrayViewMut1<'a, f64>,
    /// `J_y`, length `nx + 1`.
    pub jy: ArrayViewMut1<'a, f64>,
    /// `J_z`, length `nx + 1`.
    pub jz: ArrayViewMut1<'a, f64>,
}
