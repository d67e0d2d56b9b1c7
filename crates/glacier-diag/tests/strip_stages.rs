//! Built-in stages driven directly over strip-mesh blocks.

use std::sync::Arc;

use glacier_core::{ErrorFlags, Mask, TimeLevel};
use glacier_diag::remap::RemapStage;
use glacier_diag::surface::SurfaceStage;
use glacier_diag::upwind::UpwindStage;
use glacier_diag::vertex::VertexInterpolationStage;
use glacier_diag::{
    standard_phases, validate_pipeline, BlockOutcome, BlockStage, DiagnosticConfig, StageContext,
};
use glacier_test_utils::fixtures::{Strip, StripBuilder};
use glacier_test_utils::{ConstantSolver, MeanReconstructor, ThicknessClassifier};
use proptest::prelude::*;

fn run(strip: &mut Strip, stage: &dyn BlockStage, config: &DiagnosticConfig) -> BlockOutcome {
    let mut total = BlockOutcome::default();
    for block in strip.domain.blocks_mut() {
        let mut outcome = BlockOutcome::default();
        let (mesh, state) = block.split_mut(TimeLevel::Current);
        let mut ctx = StageContext::new(mesh, state, config, &mut outcome);
        stage.run(&mut ctx).unwrap();
        total.merge(outcome);
    }
    total
}

#[test]
fn standard_layout_with_mock_collaborators_is_valid() {
    let phases = standard_phases(
        Arc::new(ThicknessClassifier),
        Arc::new(ConstantSolver { speed: 1.0 }),
        Arc::new(MeanReconstructor),
    );
    assert_eq!(validate_pipeline(&phases), Ok(()));
}

#[test]
fn upwind_follows_velocity_sign() {
    let levels = 2;
    let mut strip = StripBuilder::new(5, 1).levels(levels).build();
    strip.for_each_cell(TimeLevel::Current, |g, c, s| {
        let h = 10.0 * (g + 1) as f64;
        s.layer_thickness[c * levels..(c + 1) * levels].fill(h);
    });
    let config = DiagnosticConfig::default();

    let set_speed = |strip: &mut Strip, v: f64| {
        for block in strip.domain.blocks_mut() {
            block
                .split_mut(TimeLevel::Current)
                .1
                .normal_velocity
                .fill(v);
        }
    };

    set_speed(&mut strip, 1.0);
    run(&mut strip, &UpwindStage, &config);
    let s = strip.domain.blocks()[0].state(TimeLevel::Current);
    // Edge g joins cells g and g + 1; positive flow carries cell g.
    for g in 0..4 {
        assert_eq!(s.layer_thickness_edge[g * levels], 10.0 * (g + 1) as f64);
    }

    set_speed(&mut strip, -1.0);
    run(&mut strip, &UpwindStage, &config);
    let s = strip.domain.blocks()[0].state(TimeLevel::Current);
    for g in 0..4 {
        assert_eq!(s.layer_thickness_edge[g * levels + 1], 10.0 * (g + 2) as f64);
    }
}

#[test]
fn linear_thickness_is_reproduced_at_interior_vertices() {
    let mut strip = StripBuilder::new(6, 1).build();
    strip.for_each_cell(TimeLevel::Current, |g, c, s| {
        s.thickness[c] = g as f64;
        s.upper_surface[c] = 2.0 * g as f64;
    });
    let outcome = run(&mut strip, &VertexInterpolationStage, &DiagnosticConfig::default());
    assert_eq!(outcome.degenerate_vertices, 0);

    let s = strip.domain.blocks()[0].state(TimeLevel::Current);
    for v in 1..5 {
        assert!((s.thickness_vertex[v] - v as f64).abs() < 1e-12);
        assert!((s.upper_surface_vertex[v] - 2.0 * v as f64).abs() < 1e-12);
    }
    // The missing neighbour past the strip end still counts in the area.
    assert!((s.thickness_vertex[0] - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn floating_shelf_sits_below_sea_level() {
    let mut strip = StripBuilder::new(4, 2).bed(vec![-500.0; 4]).build();
    let config = DiagnosticConfig::default();
    strip.for_each_cell(TimeLevel::Current, |_, c, s| {
        s.thickness[c] = 200.0;
        s.cell_mask[c] = ThicknessClassifier::classify_cell(200.0, -500.0, &config);
    });
    let outcome = run(&mut strip, &SurfaceStage, &config);
    assert_eq!(outcome.flags, ErrorFlags::NONE);

    let draft = 200.0 * 910.0 / 1028.0;
    for block in strip.domain.blocks() {
        let s = block.state(TimeLevel::Current);
        assert!(s.cell_mask.iter().all(|m| *m == Mask::FLOATING));
        for c in 0..s.thickness.len() {
            assert!((s.lower_surface[c] + draft).abs() < 1e-9);
            assert!((s.upper_surface[c] - (200.0 - draft)).abs() < 1e-9);
        }
    }
}

proptest! {
    #[test]
    fn remap_conserves_owned_mass_on_every_block(
        columns in prop::collection::vec(
            (prop::collection::vec(0.0f64..50.0, 3), 0.0f64..5.0),
            6,
        ),
        blocks in 1usize..4,
    ) {
        let levels = 3;
        let mut strip = StripBuilder::new(6, blocks).levels(levels).build();
        strip.for_each_cell(TimeLevel::Current, |g, c, s| {
            let (layers, tracer) = &columns[g];
            let h: f64 = layers.iter().sum();
            s.thickness[c] = h;
            s.layer_thickness[c * levels..(c + 1) * levels].copy_from_slice(layers);
            for k in 0..levels {
                s.tracers.set(0, k, c, *tracer);
            }
            s.cell_mask[c] = if h > 0.0 { Mask::GROUNDED } else { Mask::NO_ICE };
        });
        let before = strip.owned_mass(TimeLevel::Current);

        run(&mut strip, &RemapStage, &DiagnosticConfig::default());

        let after = strip.owned_mass(TimeLevel::Current);
        prop_assert!((before - after).abs() <= 1e-9 * before.max(1.0));

        // Uniform tracer columns stay uniform.
        for (b, block) in strip.domain.blocks().iter().enumerate() {
            let s = block.state(TimeLevel::Current);
            for (c, &g) in strip.cell_globals[b].iter().enumerate() {
                if s.thickness[c] > 1e-6 {
                    for k in 0..levels {
                        prop_assert!((s.tracers.get(0, k, c) - columns[g].1).abs() < 1e-9);
                    }
                }
            }
        }
    }
}
