use std::fmt;

use ndarray::{s, Array1, Array2, Array3, ArrayView1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::consts::PARALLEL_SAMPLE_THRESHOLD;
use crate::error::{AirglowError, Result};
use crate::stats::nan_std;

/// How the solver treats residual terms it cannot evaluate.
///
/// A term is unusable when the data sample, the sky sample, or the error
/// is non-finite, or when the error is zero. `Zero` silences such terms
/// and falls back to an unweighted fit when no usable term remains;
/// `Exclude` reports the fit as NaN in that case instead. On columns with
/// at least one usable term the two policies agree exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NanPolicy {
    Zero,
    Exclude,
}

impl Default for NanPolicy {
    fn default() -> Self {
        NanPolicy::Zero
    }
}

impl fmt::Display for NanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NanPolicy::Zero => write!(f, "zero"),
            NanPolicy::Exclude => write!(f, "exclude"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolverParams {
    #[serde(default)]
    pub nan_policy: NanPolicy,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            nan_policy: NanPolicy::Zero,
        }
    }
}

/// Fitted sky amplitude and goodness of fit for every spaxel of one cube.
#[derive(Clone, Debug)]
pub struct PixelScaleMap {
    /// Best-fit sky amplitude per spatial position.
    pub scale: Array2<f32>,
    /// Sum of squared weighted residuals at the fitted amplitude.
    pub chi_square: Array2<f32>,
}

/// Per-wavelength uncertainty of a cube, as the standard deviation of the
/// spatial plane scaled down by the root of the plane's sample count.
///
/// NaN samples are ignored; a plane with no finite sample gets NaN.
pub fn spectral_error(cube: &Array3<f32>) -> Array1<f32> {
    let (w, y, x) = cube.dim();
    let scale = ((y * x) as f64).sqrt();
    let mut err = Array1::<f32>::zeros(w);
    for wi in 0..w {
        err[wi] = (f64::from(nan_std(cube.index_axis(Axis(0), wi))) / scale) as f32;
    }
    err
}

/// Fit a single sky amplitude to every spaxel of the cube.
///
/// Each spatial position gets the scalar `a` minimizing the weighted
/// residual `(data - a * sky) / err` summed over wavelength, where `err`
/// is the cube's own [`spectral_error`]. The fit is the closed-form
/// weighted least-squares solution; unusable terms are handled per
/// [`NanPolicy`]. Parallelizes at the row level for large cubes.
pub fn solve_pixel_scales(
    cube: &Array3<f32>,
    sky: &Array1<f32>,
    params: &SolverParams,
) -> Result<PixelScaleMap> {
    let (w, y, x) = cube.dim();
    if sky.len() != w {
        return Err(AirglowError::SpectrumLength {
            spectrum: sky.len(),
            cube: w,
        });
    }

    let err = spectral_error(cube);
    let policy = params.nan_policy;

    if w * y * x >= PARALLEL_SAMPLE_THRESHOLD && y > 1 {
        // Row-parallel: each row owns its result buffer
        let rows: Vec<Vec<(f32, f32)>> = (0..y)
            .into_par_iter()
            .map(|yi| {
                let mut row_result = vec![(0.0f32, 0.0f32); x];
                for (xi, result) in row_result.iter_mut().enumerate() {
                    let column = cube.slice(s![.., yi, xi]);
                    *result = fit_pixel(column, sky.view(), err.view(), policy);
                }
                row_result
            })
            .collect();

        let mut scale = Array2::<f32>::zeros((y, x));
        let mut chi_square = Array2::<f32>::zeros((y, x));
        for (yi, row_data) in rows.into_iter().enumerate() {
            for (xi, (a, chi)) in row_data.into_iter().enumerate() {
                scale[[yi, xi]] = a;
                chi_square[[yi, xi]] = chi;
            }
        }
        Ok(PixelScaleMap { scale, chi_square })
    } else {
        // Sequential for small cubes
        let mut scale = Array2::<f32>::zeros((y, x));
        let mut chi_square = Array2::<f32>::zeros((y, x));
        for yi in 0..y {
            for xi in 0..x {
                let column = cube.slice(s![.., yi, xi]);
                let (a, chi) = fit_pixel(column, sky.view(), err.view(), policy);
                scale[[yi, xi]] = a;
                chi_square[[yi, xi]] = chi;
            }
        }
        Ok(PixelScaleMap { scale, chi_square })
    }
}

/// Closed-form weighted fit of `a` in `data ~ a * sky` for one spaxel.
///
/// Accumulates in f64. A wavelength sample contributes only when data,
/// sky, and error are all finite and the error is positive. Returns the
/// amplitude together with the chi-square evaluated at that amplitude;
/// residuals that come out non-finite add nothing to the chi-square.
fn fit_pixel(
    column: ArrayView1<'_, f32>,
    sky: ArrayView1<'_, f32>,
    err: ArrayView1<'_, f32>,
    policy: NanPolicy,
) -> (f32, f32) {
    let mut num = 0.0f64;
    let mut den = 0.0f64;
    for wi in 0..column.len() {
        let f = f64::from(column[wi]);
        let s = f64::from(sky[wi]);
        let e = f64::from(err[wi]);
        if f.is_finite() && s.is_finite() && e.is_finite() && e > 0.0 {
            num += s * f / (e * e);
            den += s * s / (e * e);
        }
    }

    let a = if den > 0.0 {
        num / den
    } else {
        match policy {
            NanPolicy::Zero => unweighted_scale(column, sky),
            NanPolicy::Exclude => f64::NAN,
        }
    };

    let mut chi = 0.0f64;
    for wi in 0..column.len() {
        let f = f64::from(column[wi]);
        let s = f64::from(sky[wi]);
        let e = f64::from(err[wi]);
        let r = (f - a * s) / e;
        if r.is_finite() {
            chi += r * r;
        }
    }
    (a as f32, chi as f32)
}

/// Ordinary least-squares amplitude over the finite samples, used when no
/// wavelength carries a usable weight.
fn unweighted_scale(column: ArrayView1<'_, f32>, sky: ArrayView1<'_, f32>) -> f64 {
    let mut num = 0.0f64;
    let mut den = 0.0f64;
    for wi in 0..column.len() {
        let f = f64::from(column[wi]);
        let s = f64::from(sky[wi]);
        if f.is_finite() && s.is_finite() {
            num += s * f;
            den += s * s;
        }
    }
    if den > 0.0 {
        num / den
    } else {
        f64::NAN
    }
}
