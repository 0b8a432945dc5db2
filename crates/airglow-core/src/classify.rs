use crate::consts::CHANNEL_COUNT;
use crate::exposure::{Bank, ChannelId, Exposure};

/// Classification of one channel within an exposure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelClass {
    pub bank: Bank,
    /// Channel is present and holds at least one sample.
    pub has_data: bool,
    /// Blank-sky reference: target label contains "S1" or "S3" and the
    /// channel has data. These channels feed the sky spectra.
    pub sky_reference: bool,
    /// Target label contains "S2" and the channel has data. Exempt from
    /// the flat-offset removal after subtraction.
    pub special_reference: bool,
}

/// Per-channel classification for one exposure. Built once by
/// [`classify`], then threaded read-only through the later stages.
#[derive(Clone, Debug)]
pub struct Classification {
    classes: [ChannelClass; CHANNEL_COUNT],
}

impl Classification {
    pub fn get(&self, id: ChannelId) -> ChannelClass {
        self.classes[id.slot()]
    }

    /// Blank-sky reference channels in ascending channel order.
    pub fn sky_reference_ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.classes
            .iter()
            .enumerate()
            .filter(|(_, c)| c.sky_reference)
            .map(|(slot, _)| ChannelId::from_slot(slot))
    }

    pub fn has_sky_reference(&self) -> bool {
        self.classes.iter().any(|c| c.sky_reference)
    }
}

/// Determine, for every channel, its detector bank and whether it is a
/// blank-sky reference ("S1"/"S3") or the special "S2" reference.
///
/// Label matching is a case-sensitive substring test, following the
/// instrument's arm naming convention. Channels without data are
/// excluded from both reference categories regardless of label; a missing
/// label makes a channel neither.
pub fn classify(exposure: &Exposure) -> Classification {
    let classes = std::array::from_fn(|slot| {
        let id = ChannelId::from_slot(slot);
        let has_data = exposure
            .channel(id)
            .map_or(false, |channel| !channel.is_empty());
        let label = exposure.target_name(id);
        ChannelClass {
            bank: id.bank(),
            has_data,
            sky_reference: has_data
                && label.map_or(false, |l| l.contains("S1") || l.contains("S3")),
            special_reference: has_data && label.map_or(false, |l| l.contains("S2")),
        }
    });
    Classification { classes }
}
