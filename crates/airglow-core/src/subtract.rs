use chrono::{DateTime, Utc};
use ndarray::{Axis, Zip};
use tracing::{debug, info, warn};

use crate::classify::{classify, Classification};
use crate::error::Result;
use crate::exposure::{Bank, ChannelId, Exposure};
use crate::solve::{solve_pixel_scales, SolverParams};
use crate::spectrum::{build_sky_spectra, SkySpectrumSet};
use crate::stats::nan_median_cube;

/// Record of one channel's correction.
#[derive(Clone, Debug)]
pub struct CorrectedChannel {
    pub channel: ChannelId,
    pub bank: Bank,
    /// True when the channel's own bank had no sky spectrum and the
    /// exposure-wide combined spectrum was used instead.
    pub used_combined: bool,
    /// Median level removed after subtraction; absent for channels that
    /// observe a dedicated reference target and must keep their level.
    pub flat_offset: Option<f32>,
    pub corrected_at: DateTime<Utc>,
}

/// Summary of one exposure's correction pass.
#[derive(Clone, Debug, Default)]
pub struct SubtractionReport {
    pub corrected: Vec<CorrectedChannel>,
    pub skipped: Vec<ChannelId>,
}

/// Subtract the fitted sky residual from every populated channel in place.
///
/// Each channel uses its own bank's sky spectrum, falling back to the
/// combined spectrum when the bank contributed no blank-sky channel. The
/// per-spaxel amplitude comes from [`solve_pixel_scales`]; the scaled
/// spectrum is then removed wavelength by wavelength. Channels whose
/// target is not a dedicated reference additionally lose their residual
/// median level. Channels without data are skipped and reported.
pub fn subtract_residuals(
    exposure: &mut Exposure,
    classification: &Classification,
    spectra: &SkySpectrumSet,
    params: &SolverParams,
) -> Result<SubtractionReport> {
    let mut report = SubtractionReport::default();

    for id in ChannelId::all() {
        let class = classification.get(id);
        if !class.has_data {
            debug!(exposure = %exposure.id, channel = %id, "no data, skipping");
            report.skipped.push(id);
            continue;
        }

        let (spectrum, used_combined) = match spectra.bank(class.bank) {
            Some(spectrum) => (spectrum, false),
            None => {
                warn!(
                    exposure = %exposure.id,
                    channel = %id,
                    bank = %class.bank,
                    "no bank spectrum, falling back to combined"
                );
                (spectra.combined(), true)
            }
        };

        let channel = match exposure.channel_mut(id) {
            Some(channel) => channel,
            None => continue,
        };

        let map = solve_pixel_scales(&channel.data, &spectrum.values, params)?;

        for (wi, mut plane) in channel.data.axis_iter_mut(Axis(0)).enumerate() {
            let s = spectrum.values[wi];
            Zip::from(&mut plane)
                .and(&map.scale)
                .for_each(|v, &a| *v -= a * s);
        }

        let flat_offset = if class.special_reference {
            None
        } else {
            let offset = nan_median_cube(channel.data.view());
            channel.data.mapv_inplace(|v| v - offset);
            Some(offset)
        };

        let corrected_at = Utc::now();
        channel.corrected_at = Some(corrected_at);
        report.corrected.push(CorrectedChannel {
            channel: id,
            bank: class.bank,
            used_combined,
            flat_offset,
            corrected_at,
        });
    }

    info!(
        exposure = %exposure.id,
        corrected = report.corrected.len(),
        skipped = report.skipped.len(),
        "subtracted sky residuals"
    );
    Ok(report)
}

/// Run the full correction for one exposure: classify channels, build the
/// sky spectra, then subtract the fitted residual from every channel.
pub fn correct_exposure(
    exposure: &mut Exposure,
    params: &SolverParams,
) -> Result<(SkySpectrumSet, SubtractionReport)> {
    info!(exposure = %exposure.id, "correcting sky residuals");
    let classification = classify(exposure);
    let spectra = build_sky_spectra(exposure, &classification)?;
    let report = subtract_residuals(exposure, &classification, &spectra, params)?;
    Ok((spectra, report))
}
