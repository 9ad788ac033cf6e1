//! Diagnostic deposition: charge-density reports and 2-D phase-space
//! histograms, plus the bit-packed report-type encoding (spec §4.7/§6).

use arrayvec::ArrayVec;
use itertools::iproduct;
use ndarray::{Array2, ArrayViewMut1};

use crate::buffer::ParticleBuffer;
use crate::particle::Particle;

/// Phase-space axes available to EM variants (spec §6 glossary: ES
/// variants instead expose `X1`/`V1`, not modeled here — out of scope for
/// this crate's 1-D EM focus).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Physical position.
    X1,
    /// Momentum, x component.
    U1,
    /// Momentum, y component.
    U2,
    /// Momentum, z component.
    U3,
}

impl Axis {
    const fn nibble(self) -> u32 {
        match self {
            Self::X1 => 1,
            Self::U1 => 2,
            Self::U2 => 3,
            Self::U3 => 4,
        }
    }

    const fn from_nibble(nibble: u32) -> Option<Self> {
        match nibble {
            1 => Some(Self::X1),
            2 => Some(Self::U1),
            3 => Some(Self::U2),
            4 => Some(Self::U3),
            _ => None,
        }
    }

    fn value(self, particle: &Particle, dx: f64) -> f64 {
        match self {
            // `ix` sits at local x = -0.5 and `ix + 1` at x = +0.5 (the same
            // convention `s0`/`s1` field-interpolation weights assume), so
            // the physical coordinate needs the half-cell offset added back.
            Self::X1 => (f64::from(particle.ix) + particle.x + 0.5) * dx,
            Self::U1 => particle.ux,
            Self::U2 => particle.uy,
            Self::U3 => particle.uz,
        }
    }
}

/// `rep_type & 0xF000`'s three diagnostic kinds (spec §6).
const CHARGE: u32 = 0x1000;
const PHA: u32 = 0x2000;
const PARTICLES: u32 = 0x3000;

/// The diagnostic report a caller asked for, decoded from (or encoded to)
/// the legacy bit-packed `rep_type` integer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportKind {
    /// Charge density, folded into the primary grid range.
    Charge,
    /// A 2-D phase-space histogram over `(axis_a, axis_b)`.
    PhaseSpace {
        /// First histogram axis.
        axis_a: Axis,
        /// Second histogram axis.
        axis_b: Axis,
    },
    /// Raw particle dump (handed to the diagnostic sink unchanged).
    Particles,
}

impl ReportKind {
    /// Encode to the legacy bit-packed representation.
    #[must_use]
    pub const fn encode(self) -> u32 {
        match self {
            Self::Charge => CHARGE,
            Self::Particles => PARTICLES,
            Self::PhaseSpace { axis_a, axis_b } => axis_a.nibble() | (axis_b.nibble() << 4) | PHA,
        }
    }

    /// Decode from the legacy bit-packed representation. Returns `None` for
    /// an unrecognized kind nibble or an invalid axis nibble.
    #[must_use]
    pub const fn decode(rep_type: u32) -> Option<Self> {
        match rep_type & 0xF000 {
            CHARGE => Some(Self::Charge),
            PARTICLES => Some(Self::Particles),
            PHA => {
                let Some(axis_a) = Axis::from_nibble(rep_type & 0x000F) else {
                    return None;
                };
                let Some(axis_b) = Axis::from_nibble((rep_type & 0x00F0) >> 4) else {
                    return None;
                };
                Some(Self::PhaseSpace { axis_a, axis_b })
            }
            _ => None,
        }
    }
}

/// The `[lo, hi)` range a phase-space axis is binned over.
#[derive(Debug, Clone, Copy)]
pub struct AxisRange {
    /// Lower edge.
    pub lo: f64,
    /// Upper edge.
    pub hi: f64,
}

/// Charge-density diagnostic: identical to the hot-path charge kernel
/// (spec §4.5) but into a caller-supplied buffer, with the upper guard
/// cell folded into cell `0` before returning (spec §4.7's periodic
/// aliasing note).
pub fn charge_density(buffer: &ParticleBuffer, q: f64, out: &mut ArrayViewMut1<f64>) {
    out.fill(0.0);
    for particle in buffer.as_slice() {
        let ix = particle.ix as usize;
        let s0 = 0.5 - particle.x;
        let s1 = 0.5 + particle.x;
        out[ix] += s0 * q;
        out[ix + 1] += s1 * q;
    }

    let guard_index = out.len() - 1;
    let guard = out[guard_index];
    out[0] += guard;
    out[guard_index] = guard;
}

/// Particles handled per chunk in the phase-space histogram's inner loop,
/// amortizing axis-projection overhead (spec §4.7; not a contract, an
/// implementation detail).
const PHA_CHUNK: usize = 1024;

/// CIC weights for one axis: which of the (up to two) neighboring bins a
/// continuous coordinate touches, and how much.
///
/// Uses `f64::floor`, a deliberate choice where the axis coordinate goes
/// negative: the legacy `(int)` truncation is not reproduced here (see
/// SPEC_FULL.md's phase-space rounding decision).
fn cic_weights(value: f64, range: AxisRange, nbins: usize) -> ArrayVec<(usize, f64), 2> {
    let mut out = ArrayVec::new();
    if nbins == 0 || range.hi <= range.lo {
        return out;
    }

    let coord = (value - range.lo) / (range.hi - range.lo) * nbins as f64 - 0.5;
    let i0f = coord.floor();
    let frac = coord - i0f;
    let (w0, w1) = (1.0 - frac, frac);

    if i0f >= 0.0 && (i0f as usize) < nbins {
        out.push((i0f as usize, w0));
    }
    let i1 = i0f + 1.0;
    if i1 >= 0.0 && (i1 as usize) < nbins {
        out.push((i1 as usize, w1));
    }
    out
}

/// Deposit a 2-D phase-space histogram of `axis_a` (rows) against
/// `axis_b` (columns) into `out`, shaped `[nx_a, nx_b]`. Particles whose
/// coordinate on an axis falls entirely outside that axis' range
/// contribute nothing for any bin combination involving it; a particle
/// straddling a range edge contributes only the in-range partial weight
/// (spec §4.7).
#[allow(clippy::too_many_arguments)]
pub fn deposit_pha(
    buffer: &ParticleBuffer,
    q: f64,
    dx: f64,
    axis_a: Axis,
    range_a: AxisRange,
    axis_b: Axis,
    range_b: AxisRange,
    out: &mut Array2<f64>,
) {
    let (nx_a, nx_b) = out.dim();

    for chunk in buffer.as_slice().chunks(PHA_CHUNK) {
        for particle in chunk {
            let va = axis_a.value(particle, dx);
            let vb = axis_b.value(particle, dx);
            let wa = cic_weights(va, range_a, nx_a);
            let wb = cic_weights(vb, range_b, nx_b);

            for (&(ia, wa_val), &(ib, wb_val)) in iproduct!(wa.iter(), wb.iter()) {
                out[[ia, ib]] += wa_val * wb_val * q;
            }
        }
    }
}
