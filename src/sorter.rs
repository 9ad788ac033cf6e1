//! Counting sort by cell index, with an in-place cyclic permutation so no
//! second particle buffer is needed (spec §4.6).
//!
//! No teacher module does quite this; the shape below (three passes over
//! plain `Vec`s, no allocation beyond two scratch arrays) follows the
//! teacher's general taste for flat, allocation-light loops rather than
//! any specific borrowed routine.

use crate::buffer::ParticleBuffer;

/// Stable sort `buffer` by `ix`, ascending, in place. `nx` is the number of
/// cells (`ix` ranges over `[0, nx)`).
pub fn sort_by_cell(buffer: &mut ParticleBuffer, nx: usize) {
    let np = buffer.len();
    if np == 0 {
        return;
    }

    tracing::debug!(np, nx, "sorting particle buffer by cell");

    // pass 1: histogram cell occupancy
    let mut npic = vec![0_u32; nx];
    for i in 0..np {
        npic[buffer[i].ix as usize] += 1;
    }
    debug_assert_eq!(npic.iter().map(|&c| c as usize).sum::<usize>(), np);

    // pass 2: prefix sum to starting offsets
    let mut offset = vec![0_u32; nx];
    let mut running = 0_u32;
    for cell in 0..nx {
        offset[cell] = running;
        running += npic[cell];
    }

    // pass 2b: destination index for each particle, consuming the offsets
    let mut dest = vec![0_usize; np];
    for i in 0..np {
        let cell = buffer[i].ix as usize;
        dest[i] = offset[cell] as usize;
        offset[cell] += 1;
    }

    // dest is a bijection on [0, np); invert it so that cycles can be
    // walked as a gather (new[j] = old[inv[j]]) rather than a scatter,
    // which is the form that composes into a clean in-place cycle walk.
    let mut inv = vec![0_usize; np];
    for (i, &d) in dest.iter().enumerate() {
        inv[d] = i;
    }
    debug_assert!(dest.iter().all(|&d| d < np), "dest must be a bijection on [0, np)");

    // pass 3: in-place cyclic permutation, marking visited slots
    let mut visited = vec![false; np];
    for start in 0..np {
        if visited[start] {
            continue;
        }
        let carried = buffer[start];
        let mut j = start;
        loop {
            visited[j] = true;
            let k = inv[j];
            if k == start {
                buffer[j] = carried;
                break;
            }
            buffer[j] = buffer[k];
            j = k;
        }
    }
}
