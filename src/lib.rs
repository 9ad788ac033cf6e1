#![warn(clippy::all, clippy::pedantic)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

//! The particle species subsystem of a 1-D electromagnetic particle-in-cell
//! plasma code: injection, the relativistic Boris pusher, charge/current
//! deposition, periodic boundaries and cache-locality sorting.
//!
//! This crate owns the particle buffer and its lifecycle. It does not solve
//! Maxwell's equations, does not write diagnostic files, and does not drive
//! the simulation loop; those are external collaborators (see [`grids`]).

pub mod buffer;
pub mod density;
pub mod diagnostics;
pub mod error;
pub mod grids;
pub mod injector;
pub mod particle;
pub mod perf;
pub mod pusher;
pub mod rng;
pub mod sorter;
pub mod species;

pub use density::{CellRange, Density};
pub use diagnostics::{Axis, AxisRange, ReportKind};
pub use error::{Error, Result};
pub use grids::{ChargeGrid, CurrentGrid, FieldGrid};
pub use particle::Particle;
pub use species::{Report, Species, SpeciesConfig};
