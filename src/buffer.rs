//! The grow-only particle buffer.

use crate::error::{Error, Result};
use crate::particle::Particle;

/// Allocations are rounded up to a multiple of this many records, so that
/// injecting a handful of particles at a time doesn't reallocate every
/// call.
const GROWTH_QUANTUM: usize = 1024;

/// A contiguous, grow-only store of [`Particle`] records.
///
/// Shrinking is not supported (spec: "silent no-op"); the buffer only ever
/// grows, rounded up to a multiple of [`GROWTH_QUANTUM`]. A regrow may move
/// the backing allocation, so any raw pointers into the buffer must be
/// treated as invalidated across a call to [`ParticleBuffer::reserve`].
#[derive(Debug, Default, Clone)]
pub struct ParticleBuffer {
    particles: Vec<Particle>,
}

impl ParticleBuffer {
    /// An empty buffer with no backing allocation yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            particles: Vec::new(),
        }
    }

    /// Number of live particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// `true` if the buffer holds no particles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Current backing capacity (always a multiple of [`GROWTH_QUANTUM`],
    /// or `0`).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.particles.capacity()
    }

    /// Ensure at least `min_len` particles can be held without a further
    /// reallocation, rounding up to the growth quantum. A no-op if the
    /// buffer is already large enough: shrinking is never performed here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the backing allocation cannot
    /// grow to the requested capacity.
    pub fn reserve(&mut self, min_len: usize) -> Result<()> {
        if min_len <= self.particles.capacity() {
            return Ok(());
        }

        let rounded = min_len.div_ceil(GROWTH_QUANTUM) * GROWTH_QUANTUM;
        let additional = rounded - self.particles.len();
        self.particles
            .try_reserve(additional)
            .map_err(|_| Error::AllocationFailed { requested: rounded })?;
        tracing::trace!(
            min_len,
            rounded,
            new_capacity = self.particles.capacity(),
            "particle buffer grown"
        );
        Ok(())
    }

    /// Append one particle, growing the buffer first if necessary.
    ///
    /// # Panics
    ///
    /// Panics if the buffer cannot grow to hold the new particle; this
    /// mirrors `Vec::push`'s own infallible contract rather than surfacing
    /// [`Error::AllocationFailed`] from a push-time regrow. Callers that
    /// need a fallible path should call [`ParticleBuffer::reserve`]
    /// up front.
    pub fn push(&mut self, particle: Particle) {
        if self.particles.len() == self.particles.capacity() {
            self.reserve(self.particles.len() + 1)
                .expect("particle buffer growth failed");
        }
        self.particles.push(particle);
    }

    /// Borrow the particles.
    #[must_use]
    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    /// Mutably borrow the particles.
    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}

impl std::ops::Index<usize> for ParticleBuffer {
    type Output = Particle;

    fn index(&self, index: usize) -> &Self::Output {
        &self.particles[index]
    }
}

impl std::ops::IndexMut<usize> for ParticleBuffer {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.particles[index]
    }
}
