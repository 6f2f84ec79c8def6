use binoculars::domain::{
    GradientConfig, KMeansConfig, KMeansInit, LinearConfig, LinearSolver, LogisticConfig,
};
use binoculars::fit::{MeanSquaredError, optimize};
use binoculars::math::{matrix_from_rows, solve};
use binoculars::models::{KMeans, LinearRegression, LogisticRegression, kmeans, logistic};
use binoculars::EstimatorError;
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rayon::ThreadPoolBuilder;

/// `n × 3` design with `y = Xβ + 0.5 + ε`.
fn noisy_regression(n: usize, seed: u64) -> (DMatrix<f64>, DVector<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.1).unwrap();
    let x = DMatrix::from_fn(n, 3, |_, _| rng.gen_range(-2.0..2.0));
    let beta = [1.0, -2.0, 0.75];
    let y = DVector::from_fn(n, |i, _| {
        (0..3).map(|j| beta[j] * x[(i, j)]).sum::<f64>() + 0.5 + noise.sample(&mut rng)
    });
    (x, y)
}

#[test]
fn closed_form_solvers_agree() {
    let (x, y) = noisy_regression(200, 11);
    let reference = solve(&x, &y, LinearSolver::Normal, true).unwrap();
    for method in [LinearSolver::Cholesky, LinearSolver::Qr, LinearSolver::Svd] {
        let w = solve(&x, &y, method, true).unwrap();
        for (a, b) in w.iter().zip(reference.iter()) {
            assert!((a - b).abs() <= 1e-6 * b.abs().max(1.0), "{method}: {a} vs {b}");
        }
    }
    assert!((reference[3] - 0.5).abs() < 0.05, "intercept is the last weight");
}

#[test]
fn gradient_solver_reaches_closed_form_without_noise() {
    let mut rng = StdRng::seed_from_u64(3);
    let x = DMatrix::from_fn(100, 2, |_, _| rng.gen_range(-1.0..1.0));
    let y = DVector::from_fn(100, |i, _| 3.0 * x[(i, 0)] - x[(i, 1)] + 2.0);

    let config = LinearConfig::default()
        .with_solver(LinearSolver::Gradient)
        .with_bias(true)
        .with_gradient(
            GradientConfig::default()
                .with_learning_rate(0.1)
                .with_epochs(2000)
                .with_batch_size(10)
                .with_random_state(5),
        );
    let mut model = LinearRegression::new(config);
    model.fit(&x, &y).unwrap();
    let exact = solve(&x, &y, LinearSolver::Normal, true).unwrap();
    let gd = model.weights().unwrap();
    assert!((gd - &exact).abs().max() < 1e-6);
}

#[test]
fn documented_linear_example() {
    let x = matrix_from_rows(&[vec![1.0, 1.0], vec![1.0, 2.0], vec![1.0, 3.0]]).unwrap();
    let y = DVector::from_row_slice(&[2.0, 4.0, 6.0]);
    let w = solve(&x, &y, LinearSolver::Normal, false).unwrap();
    // The first column is constant, so y = 0·x1 + 2·x2.
    assert!(w[0].abs() < 1e-10);
    assert!((w[1] - 2.0).abs() < 1e-10);
    assert!((&x * &w - &y).abs().max() < 1e-10);
}

#[test]
fn documented_kmeans_example() {
    let x = matrix_from_rows(&[
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![10.0, 0.0],
        vec![10.0, 1.0],
    ])
    .unwrap();
    for seed in [0, 1, 2, 42, 1234] {
        let out = kmeans::fit(
            &x,
            &KMeansConfig::default()
                .with_n_clusters(2)
                .with_random_state(seed),
        )
        .unwrap();
        let mut centroids: Vec<[f64; 2]> = (0..2)
            .map(|c| [out.centroids[(c, 0)], out.centroids[(c, 1)]])
            .collect();
        centroids.sort_by(|a, b| a[0].total_cmp(&b[0]));
        assert_eq!(centroids, vec![[0.0, 0.5], [10.0, 0.5]]);
    }
}

#[test]
fn kmeans_single_cluster_is_the_mean() {
    let mut rng = StdRng::seed_from_u64(8);
    let x = DMatrix::from_fn(37, 4, |_, _| rng.gen_range(-5.0..5.0));
    let mean = x.row_mean();
    for init in [KMeansInit::Random, KMeansInit::KMeansPlusPlus] {
        for seed in 0..5 {
            let config = KMeansConfig::default()
                .with_n_clusters(1)
                .with_init(init)
                .with_random_state(seed);
            let out = kmeans::fit(&x, &config).unwrap();
            assert!((out.centroids.row(0) - &mean).abs().max() < 1e-12);
        }
    }
}

#[test]
fn kmeans_predict_reproduces_training_assignment() {
    let mut rng = StdRng::seed_from_u64(21);
    let noise = Normal::new(0.0, 0.8).unwrap();
    let centers = [(-4.0, 0.0), (4.0, 0.0), (0.0, 5.0)];
    let x = DMatrix::from_fn(150, 2, |i, j| {
        let (cx, cy) = centers[i % 3];
        (if j == 0 { cx } else { cy }) + noise.sample(&mut rng)
    });

    let mut model = KMeans::new(
        KMeansConfig::default()
            .with_n_clusters(3)
            .with_init(KMeansInit::KMeansPlusPlus)
            .with_random_state(9),
    );
    model.fit(&x).unwrap();
    let fitted = model.last_fit().unwrap();
    assert_eq!(model.predict(&x).unwrap(), fitted.assignment);
    assert!(fitted.assignment.iter().all(|&c| c < 3));
}

#[test]
fn logistic_loss_does_not_increase() {
    let mut rng = StdRng::seed_from_u64(4);
    let n = 80;
    let x = DMatrix::from_fn(n, 2, |_, _| rng.gen_range(-1.0..1.0));
    let y = DVector::from_fn(n, |i, _| if x[(i, 0)] + x[(i, 1)] > 0.0 { 1.0 } else { 0.0 });

    let config = LogisticConfig::default()
        .with_bias(true)
        .with_learning_rate(0.5)
        .with_epochs(300)
        .with_batch_size(n);
    let mut model = LogisticRegression::new(config);
    model.fit(&x, &y).unwrap();

    let losses = model.losses();
    assert_eq!(losses.len(), 300);
    for pair in losses.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-12, "{} -> {}", pair[0], pair[1]);
    }

    let labels = logistic::classify(&model.predict(&x).unwrap(), 0.5);
    let correct = labels.iter().zip(y.iter()).filter(|(a, b)| a == b).count();
    assert!(correct as f64 / n as f64 > 0.9);
}

#[test]
fn parameters_round_trip() {
    let w = DVector::from_row_slice(&[0.5, -1.0, 2.0]);
    let mut linear = LinearRegression::default();
    linear.set_weights(w.clone());
    assert_eq!(linear.weights(), Some(&w));

    let mut logistic = LogisticRegression::default();
    logistic.set_weights(w.clone());
    assert_eq!(logistic.weights(), Some(&w));

    let c = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, -4.0, 5.5, 6.0]);
    let mut km = KMeans::default();
    km.set_centroids(c.clone());
    assert_eq!(km.centroids(), Some(&c));
}

#[test]
fn row_count_mismatch_is_reported_first() {
    // NaN and a non-binary target would also be rejected; shape wins.
    let x = DMatrix::from_row_slice(3, 1, &[1.0, f64::NAN, 3.0]);
    let y = DVector::from_row_slice(&[0.0, 2.0]);

    for method in [
        LinearSolver::Normal,
        LinearSolver::Gradient,
        LinearSolver::Cholesky,
        LinearSolver::Qr,
        LinearSolver::Svd,
    ] {
        let mut model = LinearRegression::new(LinearConfig::default().with_solver(method));
        assert!(matches!(
            model.fit(&x, &y),
            Err(EstimatorError::DimensionMismatch(_))
        ));
    }

    let mut model = LogisticRegression::new(LogisticConfig::default().with_epochs(0));
    assert!(matches!(
        model.fit(&x, &y),
        Err(EstimatorError::DimensionMismatch(_))
    ));
}

#[test]
fn unsupported_solver_names() {
    assert!(matches!(
        "newton".parse::<binoculars::domain::LogisticSolver>(),
        Err(EstimatorError::UnsupportedSolver { .. })
    ));
    assert!(matches!(
        "kmedoids".parse::<KMeansInit>(),
        Err(EstimatorError::UnsupportedSolver { .. })
    ));
}

#[test]
fn results_do_not_depend_on_thread_count() {
    let (x, y) = noisy_regression(1500, 5);
    let gd_config = GradientConfig::default()
        .with_learning_rate(0.05)
        .with_epochs(15)
        .with_batch_size(700)
        .with_random_state(9);
    let km_config = KMeansConfig::default()
        .with_n_clusters(4)
        .with_n_init(3)
        .with_random_state(21);

    let run = |threads: usize| {
        let pool = ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
        pool.install(|| {
            let gd = optimize(&x, &y, &MeanSquaredError, &gd_config).unwrap();
            let km = kmeans::fit(&x, &km_config).unwrap();
            (gd, km)
        })
    };

    let (gd_ref, km_ref) = run(1);
    for threads in [2, 8] {
        let (gd, km) = run(threads);
        assert_eq!(gd.weights, gd_ref.weights, "{threads} threads");
        assert_eq!(gd.losses, gd_ref.losses, "{threads} threads");
        assert_eq!(km.centroids, km_ref.centroids, "{threads} threads");
        assert_eq!(km.assignment, km_ref.assignment, "{threads} threads");
        assert_eq!(km.inertia, km_ref.inertia, "{threads} threads");
        assert_eq!(km.n_iter, km_ref.n_iter, "{threads} threads");
    }
}
