pub use ndarray::prelude::*;
pub use rayon::prelude::*;

use crate::traits::*;
use num_traits::{Float, FromPrimitive};
use rand::Rng;
use rand_distr::Exp1;

impl<T> StochasticOps for ndarray::Array2<T>
where
    T: Float + FromPrimitive + Send + Sync,
{
    type Mat = Self;
    type Scalar = T;

    fn sample_stochastic_rows<R: Rng>(nrow: usize, ncol: usize, rng: &mut R) -> Self::Mat {
        // sequential draws so that a seeded generator reproduces the matrix
        let mut mat = Array2::from_shape_simple_fn((nrow, ncol), || {
            let x: f64 = rng.sample(Exp1);
            T::from_f64(x).unwrap_or_else(T::one)
        });
        mat.normalize_rows_inplace(T::zero());
        mat
    }

    fn normalize_rows_inplace(&mut self, floor: Self::Scalar) -> Vec<usize> {
        let ncol = self.ncols();
        let uniform = T::from_usize(ncol).map(|n| T::one() / n);

        self.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .filter_map(|(i, mut row)| {
                let raw_sum = row.fold(T::zero(), |acc, &x| acc + x);

                if !(raw_sum.is_finite() && raw_sum > T::zero()) {
                    if let Some(u) = uniform {
                        row.fill(u);
                    }
                    return Some(i);
                }

                row.mapv_inplace(|x| if x > floor { x } else { floor });
                let denom = row.sum();
                row.mapv_inplace(|x| x / denom);
                None
            })
            .collect()
    }

    fn is_row_stochastic(&self, tol: Self::Scalar) -> bool {
        self.rows().into_iter().all(|row| {
            row.iter().all(|&x| x.is_finite() && x >= T::zero())
                && (row.sum() - T::one()).abs() <= tol
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;

    #[test]
    fn zero_row_becomes_uniform() {
        let mut xx = array![[0.0_f64, 0.0, 0.0, 0.0], [1.0, 3.0, 0.0, 4.0]];
        let fixed = xx.normalize_rows_inplace(1e-12);

        assert_eq!(fixed, vec![0]);
        for &x in xx.row(0).iter() {
            assert_abs_diff_eq!(x, 0.25);
        }
        assert_abs_diff_eq!(xx[[1, 1]], 3.0 / 8.0, epsilon = 1e-10);
        assert!(xx[[1, 2]] > 0.0);
        assert!(xx.is_row_stochastic(1e-12));
    }

    #[test]
    fn nan_row_is_recovered() {
        let mut xx = array![[f64::NAN, 1.0], [2.0, 2.0]];
        let fixed = xx.normalize_rows_inplace(1e-12);
        assert_eq!(fixed, vec![0]);
        assert_eq!(xx, array![[0.5, 0.5], [0.5, 0.5]]);
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let mut rng_a = rand::rngs::StdRng::seed_from_u64(7);
        let mut rng_b = rand::rngs::StdRng::seed_from_u64(7);
        let aa = Array2::<f64>::sample_stochastic_rows(5, 3, &mut rng_a);
        let bb = Array2::<f64>::sample_stochastic_rows(5, 3, &mut rng_b);
        assert_eq!(aa, bb);
        assert!(aa.is_row_stochastic(1e-12));
    }
}
