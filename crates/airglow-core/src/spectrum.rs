use ndarray::{Array1, ArrayView3, Axis};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::classify::Classification;
use crate::consts::{BANK_COUNT, PARALLEL_SAMPLE_THRESHOLD};
use crate::error::{AirglowError, Result};
use crate::exposure::{Bank, Channel, ChannelId, Exposure, WavelengthAxis};
use crate::stats::nan_median;

/// A representative 1-D sky-residual spectrum derived from blank-sky cubes.
#[derive(Clone, Debug)]
pub struct SkySpectrum {
    /// Median flux per wavelength pixel.
    pub values: Array1<f32>,
    /// Wavelength axis carried from the first contributing channel.
    pub axis: WavelengthAxis,
    /// Channels whose cubes contributed samples.
    pub sources: Vec<ChannelId>,
}

/// Per-bank and combined sky spectra for one exposure.
///
/// Built once per exposure and treated as read-only during subtraction.
/// A bank that contributed no blank-sky channel has no entry; the
/// combined spectrum always exists.
#[derive(Clone, Debug)]
pub struct SkySpectrumSet {
    per_bank: [Option<SkySpectrum>; BANK_COUNT],
    combined: SkySpectrum,
}

impl SkySpectrumSet {
    pub fn bank(&self, bank: Bank) -> Option<&SkySpectrum> {
        self.per_bank[bank.index()].as_ref()
    }

    pub fn combined(&self) -> &SkySpectrum {
        &self.combined
    }
}

/// Build the per-bank and combined sky-residual spectra for one exposure.
///
/// Every blank-sky cube is stacked and reduced to a 1-D spectrum by a
/// NaN-aware median across the stack and both spatial axes. The combined
/// spectrum is the median over the concatenation of every contributing
/// cube, so banks with more blank-sky channels weigh proportionally more;
/// it is not an average of the per-bank medians.
///
/// Fails with [`AirglowError::InsufficientSkyData`] when no channel in the
/// exposure qualifies as a blank-sky reference, and with
/// [`AirglowError::ShapeMismatch`] when the contributing cubes disagree on
/// cube shape. Shape repair is deliberately not attempted.
pub fn build_sky_spectra(
    exposure: &Exposure,
    classification: &Classification,
) -> Result<SkySpectrumSet> {
    let mut contributors: Vec<(ChannelId, &Channel)> = Vec::new();
    for id in classification.sky_reference_ids() {
        if let Some(channel) = exposure.channel(id) {
            contributors.push((id, channel));
        }
    }

    if contributors.is_empty() {
        return Err(AirglowError::InsufficientSkyData {
            exposure: exposure.id.clone(),
        });
    }

    let expected = contributors[0].1.data.dim();
    for (id, channel) in &contributors {
        let actual = channel.data.dim();
        if actual != expected {
            return Err(AirglowError::ShapeMismatch {
                exposure: exposure.id.clone(),
                channel: *id,
                bank: id.bank(),
                expected: [expected.0, expected.1, expected.2],
                actual: [actual.0, actual.1, actual.2],
            });
        }
    }

    let axis = contributors[0].1.axis.clone();

    let combined = SkySpectrum {
        values: stack_median(&cube_views(&contributors)),
        axis: axis.clone(),
        sources: contributors.iter().map(|(id, _)| *id).collect(),
    };

    let mut per_bank: [Option<SkySpectrum>; BANK_COUNT] = [None, None, None];
    for bank in Bank::ALL {
        let members: Vec<(ChannelId, &Channel)> = contributors
            .iter()
            .filter(|(id, _)| id.bank() == bank)
            .copied()
            .collect();
        if members.is_empty() {
            debug!(exposure = %exposure.id, %bank, "no blank-sky channels on this bank");
            continue;
        }
        per_bank[bank.index()] = Some(SkySpectrum {
            values: stack_median(&cube_views(&members)),
            axis: axis.clone(),
            sources: members.iter().map(|(id, _)| *id).collect(),
        });
    }

    info!(
        exposure = %exposure.id,
        channels = combined.sources.len(),
        "built sky residual spectra"
    );
    Ok(SkySpectrumSet { per_bank, combined })
}

fn cube_views<'a>(channels: &[(ChannelId, &'a Channel)]) -> Vec<ArrayView3<'a, f32>> {
    channels.iter().map(|(_, c)| c.data.view()).collect()
}

/// Per-wavelength NaN-aware median across every cube's spatial samples.
///
/// All cubes must share one shape (checked by the caller). Parallelizes
/// at the wavelength level when the total sample count is large enough.
fn stack_median(cubes: &[ArrayView3<'_, f32>]) -> Array1<f32> {
    let (w, y, x) = cubes[0].dim();
    let samples_per_wavelength = cubes.len() * y * x;

    if w * samples_per_wavelength >= PARALLEL_SAMPLE_THRESHOLD {
        // Wavelength-parallel: each slice allocates its own sample buffer.
        let values: Vec<f32> = (0..w)
            .into_par_iter()
            .map(|wi| {
                let mut buf = Vec::with_capacity(samples_per_wavelength);
                for cube in cubes {
                    buf.extend(cube.index_axis(Axis(0), wi).iter().copied());
                }
                nan_median(&mut buf)
            })
            .collect();
        Array1::from_vec(values)
    } else {
        // Sequential for small stacks, reusing one buffer.
        let mut buf = Vec::with_capacity(samples_per_wavelength);
        let mut values = Array1::<f32>::zeros(w);
        for wi in 0..w {
            buf.clear();
            for cube in cubes {
                buf.extend(cube.index_axis(Axis(0), wi).iter().copied());
            }
            values[wi] = nan_median(&mut buf);
        }
        values
    }
}
