use approx::assert_abs_diff_eq;
use matrix_util::traits::StochasticOps;
use ndarray::prelude::*;
use rand::SeedableRng;

#[test]
fn normalize_rows_test() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let mut xx = Array2::<f64>::sample_stochastic_rows(100, 10, &mut rng);
    xx *= 17.0;

    let degenerate = xx.normalize_rows_inplace(1e-12);
    assert!(degenerate.is_empty());

    for row in xx.rows() {
        assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn floor_bounds_entries_away_from_zero() {
    let mut xx = array![[0.0_f32, 2.0], [5.0, 0.0]];
    xx.normalize_rows_inplace(1e-6);
    assert!(xx.iter().all(|&x| x >= 1e-7));
    assert!(xx.is_row_stochastic(1e-6));
}
