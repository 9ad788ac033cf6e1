#![allow(missing_docs)]

use std::sync::{Arc, Mutex};

use float_cmp::approx_eq;
use pic1d_species::{CellRange, Density, Species, SpeciesConfig};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLog {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn uniform_injection_yields_exactly_ppc_times_nx_particles() {
    // Scenario 1 (spec §8): nx=4, ppc=2, Uniform, ufl=uth=0.
    let config = SpeciesConfig::new("electrons", -1.0, 2, [0.0; 3], [0.0; 3], 4, 4.0, 0.1);
    let species = Species::new(config, Density::Uniform, 11);

    assert_eq!(species.len(), 8);

    let report = species.report(pic1d_species::ReportKind::Particles, None, None);
    let pic1d_species::Report::Particles(particles) = report else {
        panic!("expected a particle dump");
    };

    for particle in &particles {
        assert!(
            approx_eq!(f64, particle.x, -0.25, epsilon = 1e-12)
                || approx_eq!(f64, particle.x, 0.25, epsilon = 1e-12)
        );
    }
    for ix in 0..4 {
        let count = particles.iter().filter(|p| p.ix == ix).count();
        assert_eq!(count, 2);
    }
}

#[test]
fn ramp_total_charge_matches_the_integral_within_one_particle() {
    // Scenario 2 (spec §8), in the non-trimmed regime (start at half a
    // cell so the negative-start trim does not engage).
    let dx = 0.5;
    let nx = 16;
    let ppc = 40;
    let start = dx / 2.0;
    let end = start + f64::from(nx) * dx;

    let config = SpeciesConfig::new("ions", 1.0, ppc, [0.0; 3], [0.0; 3], nx, f64::from(nx) * dx, 0.1);
    let density = Density::Ramp {
        start,
        end,
        n0: 0.5,
        n1: 1.5,
    };
    let species = Species::new(config, density, 7);

    let expected = 0.5 * (0.5 + 1.5) * f64::from(nx) * ppc as f64;
    let actual = species.len() as f64;
    assert!((actual - expected).abs() <= 1.0, "actual={actual}, expected={expected}");
}

#[test]
fn step_profile_only_injects_past_its_threshold() {
    let config = SpeciesConfig::new("electrons", -1.0, 3, [0.0; 3], [0.0; 3], 6, 6.0, 0.1);
    let species = Species::new(config, Density::Step { start: 3.0 }, 5);

    let report = species.report(pic1d_species::ReportKind::Particles, None, None);
    let pic1d_species::Report::Particles(particles) = report else {
        panic!("expected a particle dump");
    };

    assert!(!particles.is_empty());
    for particle in &particles {
        let u = f64::from(particle.ix) + particle.x;
        assert!(u > 3.0 - 0.5);
    }
}

#[test]
fn re_injecting_a_second_range_extends_the_running_total() {
    let config = SpeciesConfig::new("electrons", -1.0, 4, [0.0; 3], [0.0; 3], 8, 8.0, 0.1);
    let mut species = Species::new(config, Density::Uniform, 9);
    let after_construction = species.total_particles_injected();

    species.grow_buffer(species.len() + 100).unwrap();
    let placed = species.inject(CellRange::new(4, 7)).unwrap();

    assert_eq!(placed, 4 * 4);
    assert_eq!(species.total_particles_injected(), after_construction + placed as u64);
}

#[test]
fn injecting_beyond_the_grid_is_rejected_without_mutating_the_species() {
    let config = SpeciesConfig::new("electrons", -1.0, 4, [0.0; 3], [0.0; 3], 8, 8.0, 0.1);
    let mut species = Species::new(config, Density::Uniform, 9);
    let before = species.len();

    let err = species.inject(CellRange::new(0, 8)).unwrap_err();
    assert!(matches!(err, pic1d_species::Error::InjectionOutOfRange { .. }));
    assert_eq!(species.len(), before);
}

#[test]
fn out_of_range_injection_logs_a_warning() {
    let captured = CapturedLog(Arc::new(Mutex::new(Vec::new())));
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .without_time()
        .with_writer(captured.clone())
        .finish();

    let config = SpeciesConfig::new("electrons", -1.0, 4, [0.0; 3], [0.0; 3], 8, 8.0, 0.1);
    let mut species = Species::new(config, Density::Uniform, 9);

    tracing::subscriber::with_default(subscriber, || {
        let _ = species.inject(CellRange::new(0, 8));
    });

    let log = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert!(log.contains("injection range outside the grid"), "log was: {log}");
}
