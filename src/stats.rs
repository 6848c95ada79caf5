//! Statistical reductions over grid arrays
//!
//! Per-time-step spatial reductions run on the global rayon pool; every
//! reduction accumulates in f64 to avoid precision loss and skips NaN and
//! infinite cells, returning NaN where a step has no valid cell at all.

use ndarray::{ArrayD, Axis};
use rayon::prelude::*;

/// Spatial mean and standard deviation per step along `time_axis`.
///
/// Each element of the returned vectors corresponds to one index along the
/// time axis; all remaining axes are treated as the spatial domain. The
/// standard deviation is the population deviation (divide by count).
pub fn mean_std_over_spatial(data: &ArrayD<f32>, time_axis: usize) -> (Vec<f32>, Vec<f32>) {
    let steps = data.shape()[time_axis];

    let pairs: Vec<(f32, f32)> = (0..steps)
        .into_par_iter()
        .map(|step| {
            let slab = data.index_axis(Axis(time_axis), step);

            let mut sum = 0.0_f64;
            let mut count = 0_u64;
            for &value in slab.iter() {
                if value.is_finite() {
                    sum += f64::from(value);
                    count += 1;
                }
            }
            if count == 0 {
                return (f32::NAN, f32::NAN);
            }
            let mean = sum / count as f64;

            let mut sq_sum = 0.0_f64;
            for &value in slab.iter() {
                if value.is_finite() {
                    let d = f64::from(value) - mean;
                    sq_sum += d * d;
                }
            }
            let std = (sq_sum / count as f64).sqrt();

            (mean as f32, std as f32)
        })
        .collect();

    pairs.into_iter().unzip()
}

/// Mean of a 1-D series, skipping non-finite values; NaN when empty
pub fn nan_mean(values: &[f32]) -> f32 {
    let mut sum = 0.0_f64;
    let mut count = 0_u64;
    for &v in values {
        if v.is_finite() {
            sum += f64::from(v);
            count += 1;
        }
    }
    if count == 0 {
        f32::NAN
    } else {
        (sum / count as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    #[test]
    fn mean_and_std_per_time_step() {
        // 2 time steps, 2x2 spatial grid
        let data = ArrayD::from_shape_vec(
            vec![2, 2, 2],
            vec![1.0, 2.0, 3.0, 4.0, 10.0, 10.0, 10.0, 10.0],
        )
        .unwrap();

        let (mean, std) = mean_std_over_spatial(&data, 0);
        assert_eq!(mean, vec![2.5, 10.0]);
        // population std of [1,2,3,4] is sqrt(1.25)
        assert!((std[0] - 1.25_f32.sqrt()).abs() < 1e-6);
        assert_eq!(std[1], 0.0);
    }

    #[test]
    fn skips_nan_cells() {
        let data =
            ArrayD::from_shape_vec(vec![1, 2, 2], vec![2.0, f32::NAN, 4.0, f32::INFINITY]).unwrap();
        let (mean, _) = mean_std_over_spatial(&data, 0);
        assert_eq!(mean, vec![3.0]);
    }

    #[test]
    fn all_invalid_step_is_nan() {
        let data = ArrayD::from_shape_vec(vec![1, 2], vec![f32::NAN, f32::NAN]).unwrap();
        let (mean, std) = mean_std_over_spatial(&data, 0);
        assert!(mean[0].is_nan());
        assert!(std[0].is_nan());
    }

    #[test]
    fn nan_mean_basics() {
        assert_eq!(nan_mean(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(nan_mean(&[1.0, f32::NAN, 3.0]), 2.0);
        assert!(nan_mean(&[]).is_nan());
    }
}
