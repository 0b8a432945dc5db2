use chrono::{DateTime, Utc};
use ndarray::Array3;

use crate::consts::{CHANNELS_PER_BANK, CHANNEL_COUNT};
use crate::error::{AirglowError, Result};

/// Identifier of one IFU channel. Valid indices run 1..=24.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u8);

impl ChannelId {
    pub fn new(index: u8) -> Result<Self> {
        if (1..=CHANNEL_COUNT as u8).contains(&index) {
            Ok(Self(index))
        } else {
            Err(AirglowError::InvalidChannelIndex(index))
        }
    }

    /// All channel ids in ascending order.
    pub fn all() -> impl Iterator<Item = ChannelId> {
        (1..=CHANNEL_COUNT as u8).map(ChannelId)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Detector bank this channel is read out by: 1-8 -> One, 9-16 -> Two,
    /// 17-24 -> Three.
    pub fn bank(self) -> Bank {
        match (self.0 - 1) / CHANNELS_PER_BANK as u8 {
            0 => Bank::One,
            1 => Bank::Two,
            _ => Bank::Three,
        }
    }

    /// Zero-based storage slot inside an [`Exposure`].
    pub(crate) fn slot(self) -> usize {
        self.0 as usize - 1
    }

    pub(crate) fn from_slot(slot: usize) -> Self {
        debug_assert!(slot < CHANNEL_COUNT);
        Self(slot as u8 + 1)
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IFU {}", self.0)
    }
}

/// One of the three detectors, each reading out eight adjacent channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bank {
    One,
    Two,
    Three,
}

impl Bank {
    pub const ALL: [Bank; 3] = [Bank::One, Bank::Two, Bank::Three];

    /// Zero-based index, used for per-bank array storage.
    pub fn index(self) -> usize {
        match self {
            Bank::One => 0,
            Bank::Two => 1,
            Bank::Three => 2,
        }
    }

    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }
}

impl std::fmt::Display for Bank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "detector {}", self.number())
    }
}

/// Wavelength axis of a cube as carried by the channel header
/// (reference pixel, zero point, step, unit). The engine never resamples;
/// this descriptor only annotates derived 1-D spectra.
#[derive(Clone, Debug, PartialEq)]
pub struct WavelengthAxis {
    /// Reference pixel, 1-based per FITS convention.
    pub crpix: f64,
    /// Wavelength at the reference pixel.
    pub crval: f64,
    /// Wavelength step per pixel.
    pub cdelt: f64,
    /// Unit of `crval`/`cdelt`, e.g. "um".
    pub cunit: String,
}

impl Default for WavelengthAxis {
    fn default() -> Self {
        Self {
            crpix: 1.0,
            crval: 0.0,
            cdelt: 1.0,
            cunit: "pix".to_string(),
        }
    }
}

/// One channel's reconstructed data cube, indexed (wavelength, y, x).
/// NaN marks missing samples.
#[derive(Clone, Debug)]
pub struct Channel {
    pub data: Array3<f32>,
    pub axis: WavelengthAxis,
    /// Set by the residual subtractor once the cube has been corrected.
    pub corrected_at: Option<DateTime<Utc>>,
}

impl Channel {
    pub fn new(data: Array3<f32>, axis: WavelengthAxis) -> Self {
        Self {
            data,
            axis,
            corrected_at: None,
        }
    }

    /// A channel that is present in the exposure but holds no samples.
    /// Treated as absent by every processing stage.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Length of the wavelength axis.
    pub fn spectral_len(&self) -> usize {
        self.data.dim().0
    }
}

/// A single decoded exposure: up to 24 channel cubes plus the per-arm
/// target labels from the exposure-level header.
///
/// The engine reads this as immutable input everywhere except the
/// subtraction step, which rewrites channel data in place.
#[derive(Clone, Debug)]
pub struct Exposure {
    /// Identifier used in errors and logs, typically the source file stem.
    pub id: String,
    channels: Vec<Option<Channel>>,
    target_names: Vec<Option<String>>,
}

impl Exposure {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            channels: (0..CHANNEL_COUNT).map(|_| None).collect(),
            target_names: vec![None; CHANNEL_COUNT],
        }
    }

    pub fn set_channel(&mut self, id: ChannelId, channel: Channel) {
        self.channels[id.slot()] = Some(channel);
    }

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels[id.slot()].as_ref()
    }

    pub fn channel_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.channels[id.slot()].as_mut()
    }

    /// Labels exist independently of cube data; an arm can be named while
    /// its channel carries no samples.
    pub fn set_target_name(&mut self, id: ChannelId, name: impl Into<String>) {
        self.target_names[id.slot()] = Some(name.into());
    }

    pub fn target_name(&self, id: ChannelId) -> Option<&str> {
        self.target_names[id.slot()].as_deref()
    }

    /// Channels that are present and hold at least one sample.
    pub fn channels_with_data(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, c)| c.as_ref().is_some_and(|c| !c.is_empty()))
            .map(|(slot, _)| ChannelId::from_slot(slot))
    }
}
