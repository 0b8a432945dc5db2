use ndarray::{Array1, Array3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use airglow_core::exposure::{Channel, ChannelId, Exposure, WavelengthAxis};

/// Wavelength axis with recognizable non-default values.
pub fn test_axis() -> WavelengthAxis {
    WavelengthAxis {
        crpix: 1.0,
        crval: 19_500.0,
        cdelt: 2.5,
        cunit: "Angstrom".to_string(),
    }
}

/// Channel id from a 1-based index, panicking on bad input.
pub fn chan(n: u8) -> ChannelId {
    ChannelId::new(n).expect("valid channel index")
}

/// Cube of one constant value.
pub fn uniform_cube(w: usize, y: usize, x: usize, fill: f32) -> Array3<f32> {
    Array3::from_elem((w, y, x), fill)
}

/// Sky-like spectrum: a positive pedestal with two emission lines.
///
/// Strictly positive everywhere, so every wavelength carries signal.
pub fn sky_line_spectrum(w: usize) -> Array1<f32> {
    let mut sky = Array1::<f32>::from_elem(w, 0.4);
    for &(center, height, width) in &[(0.25, 3.0, 0.02), (0.7, 5.0, 0.015)] {
        for wi in 0..w {
            let d = (wi as f32 / w as f32 - center) / width;
            sky[wi] += height * (-0.5 * d * d).exp();
        }
    }
    sky
}

/// Cube whose every spaxel is `amplitude * spectrum`, with no noise.
pub fn replicated_cube(spectrum: &Array1<f32>, amplitude: f32, y: usize, x: usize) -> Array3<f32> {
    let w = spectrum.len();
    let mut cube = Array3::<f32>::zeros((w, y, x));
    for wi in 0..w {
        let v = amplitude * spectrum[wi];
        cube.index_axis_mut(ndarray::Axis(0), wi).fill(v);
    }
    cube
}

/// Cube of `amplitude * spectrum + offset` plus seeded Gaussian noise.
pub fn noisy_cube(
    spectrum: &Array1<f32>,
    amplitude: f32,
    offset: f32,
    y: usize,
    x: usize,
    sigma: f32,
    seed: u64,
) -> Array3<f32> {
    let w = spectrum.len();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut cube = Array3::<f32>::zeros((w, y, x));
    for wi in 0..w {
        for yi in 0..y {
            for xi in 0..x {
                let n: f32 = rng.sample(StandardNormal);
                cube[[wi, yi, xi]] = amplitude * spectrum[wi] + offset + n * sigma;
            }
        }
    }
    cube
}

/// Attach a cube with the given target name to channel `n`.
pub fn add_labeled(exposure: &mut Exposure, n: u8, name: &str, cube: Array3<f32>) {
    let id = chan(n);
    exposure.set_target_name(id, name);
    exposure.set_channel(id, Channel::new(cube, test_axis()));
}
