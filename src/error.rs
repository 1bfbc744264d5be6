use crate::sat::System;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Frame or message length inconsistent with the wire format. `want` is
    /// the minimum required, or the maximum allowed when `have` exceeds it.
    #[error("bad length: have {have}, want {want}")]
    Length { have: usize, want: usize },

    /// Frame checksum does not match its contents.
    #[error("crc mismatch: computed {computed:#010x}, frame has {expected:#010x}")]
    Crc { computed: u32, expected: u32 },

    /// Frame header carries week number 0, i.e., the receiver has no time
    /// fix yet and the message cannot be placed on the time line.
    #[error("frame has no time context")]
    MissingTimeContext,

    /// Redundant issue-of-data copies in a GPS ephemeris disagree.
    #[error("issue of data mismatch: {iode} != {iode2}")]
    Integrity { iode: u32, iode2: u32 },

    /// Tracking status carries a system code outside the known set.
    #[error("unknown system code {0}")]
    UnknownSystem(u8),

    /// Tracking status carries a signal type with no mapping for its system.
    #[error("unknown signal type {sigtype} for {system:?}")]
    UnknownSignal { system: System, sigtype: u8 },

    /// PRN or slot number outside the valid range for the system.
    #[error("no satellite for {system:?} prn {prn}")]
    UnknownSatellite { system: System, prn: i32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
