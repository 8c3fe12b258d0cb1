//! Remesh a stretched sphere and print what each iteration did.
//!
//! Run with `RUST_LOG=debug` to see the per-pass log lines.

use regrid_bench::reference_profile;
use regrid_mesh::export;
use regrid_test_utils::edge_lengths;

fn main() {
    env_logger::init();
    println!("=== Regrid Remesh Demo ===\n");

    let mut mesh = reference_profile().unwrap();
    let config = mesh.config().clone();
    print_stats("initial", &mesh);

    for round in 1..=config.remesh_iterations {
        let split = mesh.split().unwrap();
        let collapse = mesh.collapse().unwrap();
        println!(
            "round {round}: {split} split, {} collapsed, {} abandoned",
            collapse.collapsed, collapse.abandoned
        );
        if split == 0 && collapse.collapsed == 0 {
            break;
        }
        mesh.smooth().unwrap();
        print_stats("  after smoothing", &mesh);
    }

    let report = mesh.valid();
    log::info!("final validity: {report}");
    println!("\nvalidity: {report}");
    if !mesh.log().is_empty() {
        println!("rejected requests:");
        for line in mesh.log().drain() {
            println!("  {line}");
        }
    }

    if let Some(path) = std::env::args().nth(1) {
        let mut file = std::fs::File::create(&path).unwrap();
        export::write_ascii(&mesh, &mut file).unwrap();
        println!("wrote {path}");
    }
}

fn print_stats(label: &str, mesh: &regrid_mesh::HalfEdgeMesh) {
    let lengths = edge_lengths(mesh).unwrap();
    let min = lengths.iter().copied().fold(f64::INFINITY, f64::min);
    let max = lengths.iter().copied().fold(0.0, f64::max);
    println!(
        "{label}: {} vertices, {} faces, edges {min:.3}..{max:.3}",
        mesh.vertex_count(),
        mesh.face_count()
    );
}
