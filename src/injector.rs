//! Materializing particles: combining a density profile with a thermal +
//! drift momentum model.
//!
//! Position placement and momentum placement are independent and
//! composable (spec §4.2): this module owns both halves, but neither the
//! pusher nor the diagnostics modules care how a particle arrived.

use rand::RngCore;

use crate::buffer::ParticleBuffer;
use crate::density::{CellRange, DensityContext, DensityProfile};
use crate::error::{Error, Result};
use crate::particle::Particle;
use crate::rng::GaussianRng;

/// Inject particles for `range`, placing positions from `density` and
/// momenta from the drift/thermal model `ufl`/`uth`. Returns the number of
/// particles placed.
///
/// # Errors
///
/// Returns [`Error::InjectionOutOfRange`] if `range` is not contained in
/// `[0, ctx.nx)`, without mutating `buffer` or `density`'s running state.
/// Returns [`Error::AllocationFailed`] if the particle buffer cannot grow
/// to hold the predicted particle count.
pub fn inject<R: RngCore>(
    buffer: &mut ParticleBuffer,
    density: &mut DensityProfile,
    ctx: &DensityContext,
    range: CellRange,
    ufl: [f64; 3],
    uth: [f64; 3],
    rng: &mut GaussianRng<R>,
) -> Result<usize> {
    if !range.is_empty() && (range.lo < 0 || range.hi >= ctx.nx) {
        tracing::warn!(
            lo = range.lo,
            hi = range.hi,
            nx = ctx.nx,
            "injection range outside the grid; aborting injection"
        );
        return Err(Error::InjectionOutOfRange {
            lo: range.lo,
            hi: range.hi,
            nx: ctx.nx,
        });
    }

    if range.is_empty() {
        return Ok(0);
    }

    let predicted = density.predict_count(range, ctx);
    buffer.reserve(buffer.len() + predicted)?;

    let mut positions = Vec::with_capacity(predicted);
    let placed = density.inject_positions(range, ctx, &mut positions);

    let start = buffer.len();
    for (ix, x) in positions {
        buffer.push(Particle::at_rest(ix, x));
    }

    assign_thermal_momenta(buffer, start, start + placed, ufl, uth, ctx.nx, rng);

    Ok(placed)
}

/// The two-pass thermal momentum algorithm (spec §4.2): draw Gaussian
/// momenta, then subtract each cell's mean so the net initial momentum of
/// every populated cell is exactly `count * ufl`, eliminating a sampling
/// noise source that would otherwise excite unphysical low-k modes.
fn assign_thermal_momenta<R: RngCore>(
    buffer: &mut ParticleBuffer,
    start: usize,
    end: usize,
    ufl: [f64; 3],
    uth: [f64; 3],
    nx: i32,
    rng: &mut GaussianRng<R>,
) {
    if start >= end {
        return;
    }

    // pass 1: draw raw thermal momenta
    for i in start..end {
        let p = &mut buffer[i];
        p.ux = uth[0] * rng.sample();
        p.uy = uth[1] * rng.sample();
        p.uz = uth[2] * rng.sample();
    }

    // pass 2: accumulate per-cell sums and counts
    let mut sum = vec![[0.0_f64; 3]; nx as usize];
    let mut count = vec![0_u32; nx as usize];
    for i in start..end {
        let p = buffer[i];
        let cell = p.ix as usize;
        sum[cell][0] += p.ux;
        sum[cell][1] += p.uy;
        sum[cell][2] += p.uz;
        count[cell] += 1;
    }

    // pass 3: rewrite u_i <- u_i + ufl - mean_cell
    for i in start..end {
        let p = &mut buffer[i];
        let cell = p.ix as usize;
        let n = f64::from(count[cell]);
        p.ux += ufl[0] - sum[cell][0] / n;
        p.uy += ufl[1] - sum[cell][1] / n;
        p.uz += ufl[2] - sum[cell][2] / n;
    }
}
