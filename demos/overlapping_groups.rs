use neokmedoids::matrix::memberships;
use neokmedoids::{f1, purity, silhouette, NeoKMedoids};
use ndarray::Array2;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Two groups on a plane, one object halfway between them and one far
    // away. With a little overlap and a little outlier budget the bridge
    // should join both groups and the straggler should be dropped.
    let points: Vec<[f64; 2]> = vec![
        // Group A (near (0,0))
        [0.0, 0.0],
        [0.3, 0.1],
        [0.1, 0.4],
        [0.4, 0.3],
        // Group B (near (6,6))
        [6.0, 6.0],
        [6.3, 6.1],
        [6.1, 6.4],
        [6.4, 6.3],
        // Bridge
        [3.2, 3.2],
        // Straggler
        [40.0, -25.0],
    ];
    let n = points.len();
    let distances = Array2::from_shape_fn((n, n), |(i, j)| {
        let (a, b) = (points[i], points[j]);
        ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
    });

    let mut solver = NeoKMedoids::new().with_seed(7).with_c_max(50);
    let clusters = solver.cluster(&distances, 2, 0.0, 0.1)?;

    println!("medoids={:?}", solver.medoids().unwrap_or_default());
    println!("total_deviation={:.3}", solver.total_deviation().unwrap_or(f64::NAN));
    for (i, m) in memberships(&clusters).iter().enumerate() {
        println!("  object {i}: clusters {m:?}");
    }

    // Ground truth: bridge belongs to both groups, straggler to none.
    let mut truth = Array2::<u8>::zeros((n, 2));
    for i in 0..4 {
        truth[[i, 0]] = 1;
        truth[[i + 4, 1]] = 1;
    }
    truth[[8, 0]] = 1;
    truth[[8, 1]] = 1;

    println!("silhouette={:.3}", silhouette(&clusters, &distances));
    println!("purity={:.3}", purity(&truth, &clusters));
    println!("f1={:.3}", f1(&truth, &clusters));

    let converged = solver.restart_log().iter().filter(|r| r.converged).count();
    println!("restarts converged: {converged}/{}", solver.restart_log().len());

    Ok(())
}
