#![allow(missing_docs)]

use ndarray::Array1;
use pic1d_species::{ChargeGrid, CurrentGrid, Density, FieldGrid, Species, SpeciesConfig};

fn zero_fields(nx: usize) -> [Array1<f64>; 6] {
    [
        Array1::zeros(nx + 1),
        Array1::zeros(nx + 1),
        Array1::zeros(nx + 1),
        Array1::zeros(nx + 1),
        Array1::zeros(nx + 1),
        Array1::zeros(nx + 1),
    ]
}

#[test]
fn advance_keeps_particles_within_their_invariant_ranges() {
    let nx = 6;
    let config = SpeciesConfig::new("electrons", -1.0, 8, [0.0; 3], [0.4, 0.2, 0.1], nx, f64::from(nx), 0.05);
    let mut species = Species::new(config, Density::Uniform, 123);

    let [mut ex, ey, ez, bx, by, bz] = zero_fields(nx as usize);
    ex.fill(0.2);
    let mut rho = Array1::<f64>::zeros(nx as usize + 1);
    let mut jx = Array1::<f64>::zeros(nx as usize + 1);
    let mut jy = Array1::<f64>::zeros(nx as usize + 1);
    let mut jz = Array1::<f64>::zeros(nx as usize + 1);

    for _ in 0..20 {
        rho.fill(0.0);
        jx.fill(0.0);
        jy.fill(0.0);
        jz.fill(0.0);

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

        let pic1d_species::Report::Particles(particles) =
            species.report(pic1d_species::ReportKind::Particles, None, None)
        else {
            panic!("expected a particle dump");
        };
        for particle in &particles {
            assert!(particle.x >= -0.5 && particle.x < 0.5, "x = {}", particle.x);
            assert!(particle.ix >= 0 && particle.ix < nx, "ix = {}", particle.ix);
        }
        assert!(species.energy() >= 0.0, "energy = {}", species.energy());
    }
}

#[test]
fn a_strong_kick_wraps_across_the_periodic_boundary() {
    let nx = 4;
    // ppc = 1 places the single particle at the canonical center of cell 0.
    let config = SpeciesConfig::new("electrons", -1.0, 1, [0.0; 3], [0.0; 3], nx, f64::from(nx), 0.9);
    let mut species = Species::new(config, Density::Uniform, 1);
    assert_eq!(species.len(), 1);

    let [mut ex, ey, ez, bx, by, bz] = zero_fields(nx as usize);
    ex.fill(1.0);
    let mut rho = Array1::<f64>::zeros(nx as usize + 1);
    let mut jx = Array1::<f64>::zeros(nx as usize + 1);
    let mut jy = Array1::<f64>::zeros(nx as usize + 1);
    let mut jz = Array1::<f64>::zeros(nx as usize + 1);

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

    let pic1d_species::Report::Particles(particles) =
        species.report(pic1d_species::ReportKind::Particles, None, None)
    else {
        panic!("expected a particle dump");
    };
    let particle = particles[0];

    assert!(particle.x >= -0.5 && particle.x < 0.5);
    // Started in cell 0; a kick this strong crosses exactly one cell
    // boundary, landing in cell 1 or (periodically) cell nx - 1.
    assert!(particle.ix == 1 || particle.ix == nx - 1, "ix = {}", particle.ix);
}

#[test]
fn charge_deposited_per_step_sums_to_total_species_charge() {
    let nx = 8;
    let config = SpeciesConfig::new("ions", 1.0, 16, [0.0; 3], [0.0; 3], nx, f64::from(nx), 0.05);
    let mut species = Species::new(config, Density::Uniform, 42);
    let n = species.len() as f64;
    let q = species.q();

    let [ex, ey, ez, bx, by, bz] = zero_fields(nx as usize);
    let mut rho = Array1::<f64>::zeros(nx as usize + 1);
    let mut jx = Array1::<f64>::zeros(nx as usize + 1);
    let mut jy = Array1::<f64>::zeros(nx as usize + 1);
    let mut jz = Array1::<f64>::zeros(nx as usize + 1);

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

    let total: f64 = rho.sum();
    assert!((total - n * q).abs() < 1e-9, "total={total}, expected={}", n * q);
}
