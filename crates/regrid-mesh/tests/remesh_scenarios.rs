//! Whole-surface remeshing scenarios on the shared test surfaces.

use proptest::prelude::*;
use regrid_mesh::collapse::AbandonReason;
use regrid_mesh::{CollapseVerdict, HalfEdge, HalfEdgeMesh, MeshError, RegridState, RemeshConfig};
use regrid_test_utils::{assert_valid, edge_lengths, euler_characteristic, Surface};

fn longest(lengths: &[f64]) -> f64 {
    lengths.iter().copied().fold(0.0, f64::max)
}

fn records(mesh: &HalfEdgeMesh) -> Vec<HalfEdge> {
    mesh.half_edges()
        .unwrap()
        .into_iter()
        .map(|h| mesh.hedge(h).unwrap())
        .collect()
}

#[test]
fn icosahedron_split_quadruples_every_face() {
    let mut mesh = Surface::icosphere(0)
        .build(RemeshConfig::new(0.1, 1.0))
        .unwrap();
    assert_eq!(mesh.split().unwrap(), 30);
    assert_eq!(mesh.vertex_count(), 42);
    assert_eq!(mesh.face_count(), 80);
    assert_eq!(euler_characteristic(&mesh), 2);
    assert_valid(&mesh);
    for v in mesh.vertices().unwrap() {
        let valence = mesh.valence(v).unwrap();
        assert!(valence == 5 || valence == 6, "valence {valence}");
    }
}

#[test]
fn icosphere_remesh_shortens_edges() {
    let mut mesh = Surface::icosphere(0)
        .build(RemeshConfig::new(0.2, 0.6).with_remesh_iterations(4))
        .unwrap();
    let before = longest(&edge_lengths(&mesh).unwrap());
    let report = mesh.remesh().unwrap();
    assert!(report.split > 0);
    assert!(report.iterations <= 4);
    assert_valid(&mesh);
    assert_eq!(euler_characteristic(&mesh), 2);
    assert!(longest(&edge_lengths(&mesh).unwrap()) < before);
}

#[test]
fn stretched_sphere_remesh_stays_valid() {
    let mut mesh = Surface::icosphere(1)
        .scaled([2.0, 1.0, 1.0])
        .build(RemeshConfig::new(0.25, 0.6).with_remesh_iterations(3))
        .unwrap();
    mesh.remesh().unwrap();
    assert_valid(&mesh);
    assert_eq!(euler_characteristic(&mesh), 2);
    for h in mesh.half_edges().unwrap() {
        assert_eq!(mesh.hedge(h).unwrap().regrid, RegridState::None);
    }
}

#[test]
fn abandoned_collapse_leaves_no_trace() {
    let mut mesh = Surface::icosphere(0)
        .build(RemeshConfig::new(0.1, 4.0))
        .unwrap();
    let h = mesh.half_edges().unwrap()[0];
    let triangles = mesh.triangles().unwrap();
    let before = records(&mesh);

    assert_eq!(mesh.hedge_collapse(h).unwrap(), CollapseVerdict::Accepted);
    assert_ne!(mesh.valid(), regrid_mesh::ValidityReport::default());
    mesh.abandon_collapse(h).unwrap();

    assert_eq!(mesh.triangles().unwrap(), triangles);
    assert_eq!(records(&mesh), before);
    assert_valid(&mesh);
}

#[test]
fn neighbouring_requests_conflict() {
    let mut mesh = Surface::icosphere(0)
        .build(RemeshConfig::new(0.1, 4.0))
        .unwrap();
    let h = mesh.half_edges().unwrap()[0];
    assert_eq!(mesh.hedge_collapse(h).unwrap(), CollapseVerdict::Accepted);
    let next = mesh.hedge(h).unwrap().next;
    assert_eq!(
        mesh.hedge_collapse(next).unwrap(),
        CollapseVerdict::Abandoned(AbandonReason::Conflict)
    );
}

#[test]
fn committed_collapse_on_icosahedron() {
    let mut mesh = Surface::icosphere(0)
        .build(RemeshConfig::new(0.1, 4.0))
        .unwrap();
    let h = mesh.half_edges().unwrap()[0];
    let record = mesh.hedge(h).unwrap();
    let b = mesh.hedge(record.flip).unwrap().pivot;
    let survivor_expected = record.pivot.min(b);

    assert_eq!(mesh.hedge_collapse(h).unwrap(), CollapseVerdict::Accepted);
    let survivor = mesh.hface_collapse(h).unwrap();
    assert_eq!(survivor, survivor_expected);
    assert_eq!(mesh.vertex_count(), 11);
    assert_eq!(mesh.face_count(), 18);
    // 5 + 5, less one edge each for the merged edge and both opposite edges
    assert_eq!(mesh.valence(survivor).unwrap(), 6);
    assert_valid(&mesh);

    let stale = if survivor == record.pivot { b } else { record.pivot };
    assert_eq!(
        mesh.position(stale),
        Err(MeshError::Stale { node: stale })
    );
}

#[test]
fn collapse_that_folds_a_face_is_abandoned() {
    // drag a far neighbour of the first edge's start across the edge
    let mut surface = Surface::icosphere(0);
    surface.positions[1] = [-1.0, 0.75, 1.0];
    let mut mesh = surface.build(RemeshConfig::new(0.1, 4.0)).unwrap();
    let h = mesh.half_edges().unwrap()[0];
    let before = records(&mesh);
    let positions: Vec<_> = mesh
        .vertices()
        .unwrap()
        .into_iter()
        .map(|v| mesh.position(v).unwrap())
        .collect();

    assert_eq!(
        mesh.hedge_collapse(h).unwrap(),
        CollapseVerdict::Abandoned(AbandonReason::FlipsTriangle)
    );
    assert_eq!(records(&mesh), before);
    for (v, p) in mesh.vertices().unwrap().into_iter().zip(positions) {
        assert_eq!(mesh.position(v).unwrap(), p);
    }
}

#[test]
fn open_disc_refines_and_keeps_its_rim() {
    let mut mesh = Surface::disc(2)
        .build(RemeshConfig::new(0.15, 0.3))
        .unwrap();
    let report = mesh.remesh().unwrap();
    assert!(report.split > 0);
    assert_valid(&mesh);
    assert_eq!(euler_characteristic(&mesh), 1);
    assert!(mesh.boundary_edge_count() > 12);
    for v in mesh.vertices().unwrap() {
        let p = mesh.position(v).unwrap();
        assert!(p[2].abs() < 1e-12);
        if mesh.is_boundary_vertex(v).unwrap() {
            // rim vertices stay on the hexagon
            let radius = (p[0] * p[0] + p[1] * p[1]).sqrt();
            assert!(radius > 3f64.sqrt() / 2.0 - 1e-9, "rim vertex at {p:?}");
        }
    }
}

#[test]
fn open_disc_coarsens_inside_only() {
    let mut mesh = Surface::disc(3)
        .build(RemeshConfig::new(0.45, 4.0))
        .unwrap();
    let rim = mesh.boundary_edge_count();
    let report = mesh.remesh().unwrap();
    assert!(report.collapsed > 0);
    assert_eq!(mesh.boundary_edge_count(), rim);
    assert_valid(&mesh);
    assert_eq!(euler_characteristic(&mesh), 1);
}

#[test]
fn destroy_after_remesh() {
    let mut mesh = Surface::icosphere(1)
        .build(RemeshConfig::new(0.2, 0.4))
        .unwrap();
    mesh.remesh().unwrap();
    mesh.destroy().unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn perturbed_sphere_remesh_stays_valid(
        radii in prop::collection::vec(0.9f64..1.1, 42),
    ) {
        let mut mesh = Surface::icosphere(1)
            .with_radii(&radii)
            .build(RemeshConfig::new(0.2, 0.5).with_remesh_iterations(3))
            .unwrap();
        mesh.remesh().unwrap();
        let report = mesh.valid();
        prop_assert!(report.is_valid(), "invalid after remesh: {}", report);
        prop_assert_eq!(euler_characteristic(&mesh), 2);
    }

    #[test]
    fn lifted_disc_remesh_stays_valid(
        lift in prop::collection::vec(-0.1f64..0.1, 37),
    ) {
        let mut mesh = Surface::disc(3)
            .lifted(&lift)
            .build(RemeshConfig::new(0.15, 0.35).with_remesh_iterations(3))
            .unwrap();
        mesh.remesh().unwrap();
        let report = mesh.valid();
        prop_assert!(report.is_valid(), "invalid after remesh: {}", report);
        prop_assert_eq!(euler_characteristic(&mesh), 1);
    }
}
