//! NaN-aware statistics shared by the spectrum builder and the solver.

use ndarray::{ArrayView2, ArrayView3};

/// Median of the non-NaN values in `buf`, which is reordered in place.
///
/// Returns NaN when every value is NaN. Infinities participate like any
/// other value; only NaN marks a missing sample.
pub fn nan_median(buf: &mut [f32]) -> f32 {
    // Compact the non-NaN values to the front of the buffer.
    let mut kept = 0;
    for i in 0..buf.len() {
        let v = buf[i];
        if !v.is_nan() {
            buf[kept] = v;
            kept += 1;
        }
    }
    median_in_place(&mut buf[..kept])
}

/// NaN-aware median over every element of a cube. Used for the flat-offset
/// zero point of a corrected cube.
pub fn nan_median_cube(cube: ArrayView3<'_, f32>) -> f32 {
    let mut buf: Vec<f32> = cube.iter().copied().filter(|v| !v.is_nan()).collect();
    median_in_place(&mut buf)
}

/// NaN-aware population standard deviation (ddof = 0) of a 2-D slice.
/// Returns NaN when every value is NaN.
pub fn nan_std(values: ArrayView2<'_, f32>) -> f32 {
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for &v in values.iter() {
        if !v.is_nan() {
            sum += v as f64;
            count += 1;
        }
    }
    if count == 0 {
        return f32::NAN;
    }
    let mean = sum / count as f64;

    let mut var_sum = 0.0f64;
    for &v in values.iter() {
        if !v.is_nan() {
            let d = v as f64 - mean;
            var_sum += d * d;
        }
    }
    ((var_sum / count as f64).sqrt()) as f32
}

/// Median by partial selection via `select_nth_unstable`; does not sort.
fn median_in_place(values: &mut [f32]) -> f32 {
    let n = values.len();
    if n == 0 {
        f32::NAN
    } else if n == 1 {
        values[0]
    } else if n % 2 == 1 {
        let mid = n / 2;
        *values
            .select_nth_unstable_by(mid, |a, b| a.total_cmp(b))
            .1
    } else {
        let mid = n / 2;
        values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        values[..mid].select_nth_unstable_by(mid - 1, |a, b| a.total_cmp(b));
        (values[mid - 1] + values[mid]) / 2.0
    }
}
