//! Channel tracking status decoding.
//!
//! Every observation channel carries a 32-bit status word describing the
//! system, signal, and lock state of the tracking loop that produced it.

use serde::{Deserialize, Serialize};

use crate::sat::System;
use crate::{Error, Result};

/// Carrier band index within a satellite record: 0=L1 ... 5=L8.
pub type Band = usize;

/// Signal codes, named by their two-character RINEX observation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// L1 C/A (GPS, GLONASS, SBAS, QZSS) or E1C (Galileo)
    L1C,
    /// L1 P code; only reachable through an explicit priority override
    L1P,
    /// E1B
    L1B,
    /// B1I
    L1I,
    /// L2 P semi-codeless
    L2W,
    /// L2 C/A
    L2C,
    /// L2C combined; only reachable through an explicit priority override
    L2X,
    /// L5I
    L5I,
    /// B2I
    L7I,
    /// E5bQ
    L7Q,
    /// E5 AltBOC; only reachable through an explicit priority override
    L8Q,
}

impl Signal {
    /// The RINEX observation code suffix, e.g. `"1C"`.
    #[must_use]
    pub fn rinex_code(&self) -> &'static str {
        match self {
            Signal::L1C => "1C",
            Signal::L1P => "1P",
            Signal::L1B => "1B",
            Signal::L1I => "1I",
            Signal::L2W => "2W",
            Signal::L2C => "2C",
            Signal::L2X => "2X",
            Signal::L5I => "5I",
            Signal::L7I => "7I",
            Signal::L7Q => "7Q",
            Signal::L8Q => "8Q",
        }
    }
}

/// Per-system mapping from the wire signal type to (band, signal).
const GPS_SIGNALS: &[(u8, Band, Signal)] = &[
    (0, 0, Signal::L1C), // L1 C/A
    (9, 1, Signal::L2W), // L2 P semi-codeless
];
const GLONASS_SIGNALS: &[(u8, Band, Signal)] = &[
    (0, 0, Signal::L1C), // L1 C/A
    (5, 1, Signal::L2C), // L2 C/A
];
const SBAS_SIGNALS: &[(u8, Band, Signal)] = &[
    (0, 0, Signal::L1C), // L1 C/A
    (6, 2, Signal::L5I), // L5I
];
const GALILEO_SIGNALS: &[(u8, Band, Signal)] = &[
    (1, 0, Signal::L1B),  // E1B
    (2, 0, Signal::L1C),  // E1C
    (17, 1, Signal::L7Q), // E5bQ
];
const BEIDOU_SIGNALS: &[(u8, Band, Signal)] = &[
    (0, 0, Signal::L1I),  // B1I
    (17, 1, Signal::L7I), // B2I
];
const QZSS_SIGNALS: &[(u8, Band, Signal)] = &[
    (0, 0, Signal::L1C), // L1 C/A
    (9, 1, Signal::L2C), // L2 C/A
];

fn signal_table(system: System) -> &'static [(u8, Band, Signal)] {
    match system {
        System::Gps => GPS_SIGNALS,
        System::Glonass => GLONASS_SIGNALS,
        System::Sbas => SBAS_SIGNALS,
        System::Galileo => GALILEO_SIGNALS,
        System::BeiDou => BEIDOU_SIGNALS,
        System::Qzss => QZSS_SIGNALS,
    }
}

/// Decoded channel tracking status.
///
/// Tracking state values are receiver defined:
/// 0=idle, 2=wide frequency band pull-in, 3=narrow frequency band pull-in,
/// 4=phase lock loop, 7=frequency lock loop, 9=channel alignment,
/// 10=code search, 11=aided phase lock loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingStatus {
    pub system: System,
    pub signal: Signal,
    /// Carrier band the signal is stored under, before priority resolution.
    pub band: Band,
    /// Tracking state, 0-11.
    pub state: u8,
    pub phase_lock: bool,
    pub code_lock: bool,
    /// False while the GLONASS meander sequence parity is still unknown,
    /// which leaves a half-cycle ambiguity on the phase.
    pub parity_known: bool,
    /// True when the receiver has added a half cycle to the phase.
    pub half_cycle_added: bool,
}

impl TrackingStatus {
    /// Decode a 32-bit tracking status word.
    ///
    /// # Errors
    /// [`Error::UnknownSystem`] or [`Error::UnknownSignal`] when the word
    /// carries a combination outside the tables; callers skip the channel.
    pub fn decode(word: u32) -> Result<Self> {
        let state = (word & 0x1f) as u8;
        let phase_lock = (word >> 10) & 1 == 1;
        let parity_known = (word >> 11) & 1 == 1;
        let code_lock = (word >> 12) & 1 == 1;
        let system_code = ((word >> 16) & 0x7) as u8;
        let sigtype = ((word >> 21) & 0x1f) as u8;
        let half_cycle_added = (word >> 28) & 1 == 1;

        let system =
            System::from_code(system_code).ok_or(Error::UnknownSystem(system_code))?;
        let (band, signal) = signal_table(system)
            .iter()
            .find(|&&(t, _, _)| t == sigtype)
            .map(|&(_, band, signal)| (band, signal))
            .ok_or(Error::UnknownSignal { system, sigtype })?;

        Ok(TrackingStatus {
            system,
            signal,
            band,
            state,
            phase_lock,
            code_lock,
            parity_known,
            half_cycle_added,
        })
    }
}
