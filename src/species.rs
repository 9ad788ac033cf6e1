//! The public façade: `SpeciesConfig` and `Species`, tying the buffer,
//! density profile, injector, pusher, sorter and diagnostics together
//! (spec §3, §6).

use std::time::Instant;

use ndarray::{Array1, Array2, ArrayViewMut1};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::buffer::ParticleBuffer;
use crate::density::{CellRange, Density, DensityContext, DensityProfile};
use crate::diagnostics::{self, Axis, AxisRange, ReportKind};
use crate::error::Result;
use crate::grids::{ChargeGrid, CurrentGrid, FieldGrid};
use crate::injector;
use crate::particle::Particle;
use crate::perf;
use crate::pusher;
use crate::rng::GaussianRng;
use crate::sorter;

/// The scalar configuration of a species (spec §3's species record, minus
/// the particle buffer and the density profile's running state).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesConfig {
    /// Identifier used in diagnostics.
    pub name: String,
    /// Mass-to-charge ratio; its sign is the particle's charge sign.
    pub m_q: f64,
    /// Reference macroparticles per cell. `0` disables injection entirely.
    pub ppc: usize,
    /// Fluid drift momentum.
    pub ufl: [f64; 3],
    /// Thermal momentum spread.
    pub uth: [f64; 3],
    /// Number of grid cells.
    pub nx: i32,
    /// Physical box length.
    pub box_size: f64,
    /// Timestep.
    pub dt: f64,
    /// Sort period; `0` disables periodic sorting.
    pub n_sort: u32,
    /// Reference density the profile is normalized against. `0` is
    /// coerced to `1.0` (spec §7).
    pub n_ref: f64,
}

impl SpeciesConfig {
    /// Build a configuration with the default sort period (16) and
    /// reference density (1.0).
    ///
    /// # Panics
    ///
    /// Panics if `nx <= 0` or `box_size <= 0.0`: both are asserted
    /// impossible by the subsystem's error-handling contract (spec §7).
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        m_q: f64,
        ppc: usize,
        ufl: [f64; 3],
        uth: [f64; 3],
        nx: i32,
        box_size: f64,
        dt: f64,
    ) -> Self {
        assert!(nx > 0, "nx must be positive");
        assert!(box_size > 0.0, "box_size must be positive");
        Self {
            name: name.into(),
            m_q,
            ppc,
            ufl,
            uth,
            nx,
            box_size,
            dt,
            n_sort: 16,
            n_ref: 1.0,
        }
    }

    /// Override the sort period.
    #[must_use]
    pub const fn with_n_sort(mut self, n_sort: u32) -> Self {
        self.n_sort = n_sort;
        self
    }

    /// Override the reference density. `0.0` is coerced to `1.0`.
    #[must_use]
    pub fn with_reference_density(mut self, n_ref: f64) -> Self {
        self.n_ref = if n_ref == 0.0 { 1.0 } else { n_ref };
        self
    }

    /// Cell width implied by `box_size / nx`.
    #[must_use]
    pub fn dx(&self) -> f64 {
        self.box_size / f64::from(self.nx)
    }
}

impl Default for SpeciesConfig {
    fn default() -> Self {
        Self::new("species", -1.0, 0, [0.0; 3], [0.0; 3], 1, 1.0, 0.0)
    }
}

/// One particle species: its configuration, buffer, density profile and
/// running iteration state. Owns its particle buffer exclusively (spec
/// §3's ownership note); field/charge/current grids are borrowed for the
/// duration of a single [`Species::advance`] call.
pub struct Species<'a> {
    config: SpeciesConfig,
    dx: f64,
    q: f64,
    density: DensityProfile<'a>,
    buffer: ParticleBuffer,
    rng: GaussianRng<Pcg32>,
    iter: u64,
    energy: f64,
}

impl<'a> Species<'a> {
    /// Construct a species and run its initial injection over the full
    /// grid (spec §3's "create" lifecycle step).
    #[must_use]
    pub fn new(config: SpeciesConfig, density_kind: Density<'a>, seed: u64) -> Self {
        let dx = config.dx();
        let q = if config.ppc == 0 {
            0.0
        } else {
            config.m_q.signum() * config.n_ref.abs() / config.ppc as f64
        };

        tracing::debug!(
            name = %config.name,
            nx = config.nx,
            ppc = config.ppc,
            q,
            "creating species"
        );

        let nx = config.nx;
        let mut species = Self {
            config,
            dx,
            q,
            density: DensityProfile::new(density_kind),
            buffer: ParticleBuffer::new(),
            rng: GaussianRng::from_seed(seed),
            iter: 0,
            energy: 0.0,
        };

        species
            .inject(CellRange::new(0, nx - 1))
            .expect("initial injection covers the species' own grid and cannot be out of range");

        species
    }

    /// This species' diagnostic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Number of live particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// `true` if the species currently holds no particles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Per-macroparticle charge.
    #[must_use]
    pub const fn q(&self) -> f64 {
        self.q
    }

    /// Cell width.
    #[must_use]
    pub const fn dx(&self) -> f64 {
        self.dx
    }

    /// Monotonic iteration counter.
    #[must_use]
    pub const fn iter(&self) -> u64 {
        self.iter
    }

    /// Total kinetic energy from the most recent [`Species::advance`] call.
    #[must_use]
    pub const fn energy(&self) -> f64 {
        self.energy
    }

    /// Total particles injected through this species' density profile so
    /// far, across every [`Species::inject`] call (including the initial
    /// one from [`Species::new`]).
    #[must_use]
    pub const fn total_particles_injected(&self) -> u64 {
        self.density.total_np_inj()
    }

    /// Total charge injected through this species so far.
    #[must_use]
    pub fn total_charge_injected(&self) -> f64 {
        self.q * self.density.total_np_inj() as f64
    }

    /// Append particles for cells `[range.lo, range.hi]` (spec §6's
    /// `inject`). Used both for the initial population and for a
    /// moving-window driver appending new cells as the window advances.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InjectionOutOfRange`] if `range` is not
    /// contained in `[0, nx)`.
    pub fn inject(&mut self, range: CellRange) -> Result<usize> {
        let ctx = DensityContext {
            ppc: self.config.ppc,
            dx: self.dx,
            nx: self.config.nx,
        };
        injector::inject(
            &mut self.buffer,
            &mut self.density,
            &ctx,
            range,
            self.config.ufl,
            self.config.uth,
            &mut self.rng,
        )
    }

    /// Ensure the particle buffer can hold at least `size` particles
    /// without a further reallocation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::AllocationFailed`] if the backing
    /// allocation cannot grow to the requested size.
    pub fn grow_buffer(&mut self, size: usize) -> Result<()> {
        self.buffer.reserve(size)
    }

    /// Advance every particle by one timestep: field interpolation, the
    /// Boris rotation, current/charge deposition, the periodic wrap, and
    /// (every `n_sort` steps) a reordering sort. Updates the energy
    /// diagnostic and the process-wide performance counters.
    pub fn advance(&mut self, fields: FieldGrid<'_>, charge: &mut ChargeGrid<'_>, current: &mut CurrentGrid<'_>) {
        let started = Instant::now();
        let sigma = pusher::advance(
            &mut self.buffer,
            fields,
            charge,
            current,
            self.q,
            self.config.m_q,
            self.config.dt,
            self.dx,
        );
        let elapsed = started.elapsed();

        self.energy = self.q * self.config.m_q * sigma * self.dx;
        perf::record(self.buffer.len() as u64, elapsed);

        self.iter += 1;
        if self.config.n_sort > 0 && self.iter % u64::from(self.config.n_sort) == 0 {
            sorter::sort_by_cell(&mut self.buffer, self.config.nx as usize);
        }
    }

    /// Diagnostic-only charge density deposition into a caller-supplied
    /// buffer of length `nx + 1` (spec §4.7).
    pub fn deposit_charge(&self, out: &mut ArrayViewMut1<'_, f64>) {
        diagnostics::charge_density(&self.buffer, self.q, out);
    }

    /// Diagnostic-only 2-D phase-space histogram (spec §4.7).
    pub fn deposit_pha(
        &self,
        axis_a: Axis,
        range_a: AxisRange,
        axis_b: Axis,
        range_b: AxisRange,
        out: &mut Array2<f64>,
    ) {
        diagnostics::deposit_pha(&self.buffer, self.q, self.dx, axis_a, range_a, axis_b, range_b, out);
    }

    /// Dispatch a diagnostic report to the kind it names (spec §6's
    /// `report`). `pha_shape`/`pha_ranges` are required for
    /// [`ReportKind::PhaseSpace`] and ignored otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is [`ReportKind::PhaseSpace`] and either
    /// `pha_shape` or `pha_ranges` is `None`.
    #[must_use]
    pub fn report(
        &self,
        kind: ReportKind,
        pha_shape: Option<(usize, usize)>,
        pha_ranges: Option<(AxisRange, AxisRange)>,
    ) -> Report {
        match kind {
            ReportKind::Charge => {
                let mut out = Array1::zeros(self.config.nx as usize + 1);
                self.deposit_charge(&mut out.view_mut());
                Report::Charge(out)
            }
            ReportKind::Particles => Report::Particles(self.buffer.as_slice().to_vec()),
            ReportKind::PhaseSpace { axis_a, axis_b } => {
                let (nx_a, nx_b) = pha_shape.expect("phase-space report requires a histogram shape");
                let (range_a, range_b) = pha_ranges.expect("phase-space report requires axis ranges");
                let mut out = Array2::zeros((nx_a, nx_b));
                self.deposit_pha(axis_a, range_a, axis_b, range_b, &mut out);
                Report::PhaseSpace(out)
            }
        }
    }

    /// Total particle-pushes recorded across every species since process
    /// start (spec §3's process-wide counters).
    #[must_use]
    pub fn npush(&self) -> u64 {
        perf::npush()
    }

    /// Total time spent pushing particles, across every species.
    #[must_use]
    pub fn time(&self) -> std::time::Duration {
        perf::time()
    }

    /// Average seconds per particle push, or `None` before the first push.
    #[must_use]
    pub fn perf(&self) -> Option<f64> {
        perf::perf()
    }
}

/// The populated data a [`Species::report`] call produced, ready to hand
/// to a diagnostic sink (spec §6's "dispatches to charge/pha/particle
/// sinks"; the sink itself is out of scope).
#[derive(Debug, Clone)]
pub enum Report {
    /// Charge density, length `nx + 1`.
    Charge(Array1<f64>),
    /// A 2-D phase-space histogram.
    PhaseSpace(Array2<f64>),
    /// A raw particle dump.
    Particles(Vec<Particle>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_runs_initial_injection_over_the_full_grid() {
        let config = SpeciesConfig::new("electrons", -1.0, 4, [0.0; 3], [0.0; 3], 8, 8.0, 0.1);
        let species = Species::new(config, Density::Uniform, 1);

        assert_eq!(species.len(), 8 * 4);
        assert_eq!(species.total_particles_injected(), 32);
    }

    #[test]
    fn zero_ppc_yields_an_empty_species() {
        let config = SpeciesConfig::new("electrons", -1.0, 0, [0.0; 3], [0.0; 3], 4, 4.0, 0.1);
        let species = Species::new(config, Density::Uniform, 1);

        assert!(species.is_empty());
        assert_eq!(species.q(), 0.0);
    }

    #[test]
    fn reference_density_zero_is_coerced_to_one() {
        let config = SpeciesConfig::new("ions", 1.0, 10, [0.0; 3], [0.0; 3], 4, 4.0, 0.1)
            .with_reference_density(0.0);
        let species = Species::new(config, Density::Uniform, 2);
        assert!((species.q() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn charge_report_matches_deposit_charge() {
        let config = SpeciesConfig::new("electrons", -1.0, 2, [0.0; 3], [0.0; 3], 4, 4.0, 0.1);
        let species = Species::new(config, Density::Uniform, 3);

        let mut direct = Array1::<f64>::zeros(5);
        species.deposit_charge(&mut direct.view_mut());

        match species.report(ReportKind::Charge, None, None) {
            Report::Charge(reported) => {
                assert_eq!(reported, direct);
            }
            _ => panic!("expected a charge report"),
        }
    }

    #[test]
    fn sort_triggers_every_n_sort_steps() {
        let config = SpeciesConfig::new("electrons", -1.0, 20, [0.0; 3], [0.3; 3], 8, 8.0, 0.01)
            .with_n_sort(2);
        let mut species = Species::new(config, Density::Uniform, 4);

        let nx = 8;
        let ex = Array1::<f64>::zeros(nx + 1);
        let ey = Array1::<f64>::zeros(nx + 1);
        let ez = Array1::<f64>::zeros(nx + 1);
        let bx = Array1::<f64>::zeros(nx + 1);
        let by = Array1::<f64>::zeros(nx + 1);
        let bz = Array1::<f64>::zeros(nx + 1);
        let mut rho = Array1::<f64>::zeros(nx + 1);
        let mut jx = Array1::<f64>::zeros(nx + 1);
        let mut jy = Array1::<f64>::zeros(nx + 1);
        let mut jz = Array1::<f64>::zeros(nx + 1);

        for _ in 0..2 {
            let fields = FieldGrid {
                ex: ex.view(),
                ey: ey.view(),
                ez: ez.view(),
                bx: bx.view(),
                by: by.view(),
                bz: bz.view(),
            };
            let mut charge = ChargeGrid { rho: rho.view_mut() };
            let mut current = CurrentGrid {
                jx: jx.view_mut(),
                jy: jy.view_mut(),
                jz: jz.view_mut(),
            };
            species.advance(fields, &mut charge, &mut current);
        }

        assert_eq!(species.iter(), 2);

        match species.report(ReportKind::Particles, None, None) {
            Report::Particles(particles) => {
                for pair in particles.windows(2) {
                    assert!(pair[0].ix <= pair[1].ix);
                }
            }
            _ => panic!("expected a particle dump"),
        }
    }
}
