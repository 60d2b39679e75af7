use modgraph::eigen::{solve_symmetric, EigenOptions, Which};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // 1-D Laplacian on a path of n vertices, applied without forming the matrix.
    // Its eigenvalues are 2 - 2 cos(k pi / (n + 1)), k = 1..n.
    let n = 100;
    let laplacian = |y: &mut [f64], x: &[f64]| -> modgraph::Result<()> {
        for i in 0..n {
            let left = if i > 0 { x[i - 1] } else { 0.0 };
            let right = if i + 1 < n { x[i + 1] } else { 0.0 };
            y[i] = 2.0 * x[i] - left - right;
        }
        Ok(())
    };

    let mut opts = EigenOptions::new(n)
        .with_nev(4)
        .with_ncv(20)
        .with_which(Which::BothEnds)
        .with_seed(7);
    let result = solve_symmetric(laplacian, &mut opts, None, None, true)?;

    println!(
        "{} restart cycles, {} operator applications",
        opts.iterations, opts.op_applications
    );
    let exact = |k: usize| 2.0 - 2.0 * (k as f64 * std::f64::consts::PI / (n as f64 + 1.0)).cos();
    let expected = [exact(1), exact(2), exact(n - 1), exact(n)];
    for (value, want) in result.values.iter().zip(expected) {
        println!("  {value:.10}  (exact {want:.10})");
    }
    Ok(())
}
