/// Number of IFU channels in one exposure.
pub const CHANNEL_COUNT: usize = 24;

/// Number of IFU channels read out by each detector bank.
pub const CHANNELS_PER_BANK: usize = 8;

/// Number of detector banks.
pub const BANK_COUNT: usize = 3;

/// Minimum number of cube samples touched (spectral x spatial) to use
/// Rayon parallelism in the spectrum builder and the per-spaxel solver.
pub const PARALLEL_SAMPLE_THRESHOLD: usize = 65_536;
