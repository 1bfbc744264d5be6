//! Satellite identities, carrier wavelengths, and the clock accuracy index.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const CLIGHT: f64 = 299_792_458.0;

pub const FREQ_L1: f64 = 1.575_42e9;
pub const FREQ_L2: f64 = 1.227_60e9;
pub const FREQ_L5: f64 = 1.176_45e9;
pub const FREQ_L6: f64 = 1.278_75e9;
pub const FREQ_L7: f64 = 1.207_14e9;
pub const FREQ_L8: f64 = 1.191_795e9;

/// GLONASS FDMA center frequencies and channel spacings.
pub const FREQ1_GLO: f64 = 1.602_00e9;
pub const DFRQ1_GLO: f64 = 0.562_50e6;
pub const FREQ2_GLO: f64 = 1.246_00e9;
pub const DFRQ2_GLO: f64 = 0.437_50e6;
pub const FREQ3_GLO: f64 = 1.202_025e9;

/// BeiDou B1I/B2I/B3I carrier frequencies.
pub const FREQ1_BDS: f64 = 1.561_098e9;
pub const FREQ2_BDS: f64 = 1.207_14e9;
pub const FREQ3_BDS: f64 = 1.268_52e9;

/// Base carrier frequencies per band index, used as the wavelength
/// fallback when no system-specific value is available.
const BASE_FREQS: [f64; 6] = [FREQ_L1, FREQ_L2, FREQ_L5, FREQ_L6, FREQ_L7, FREQ_L8];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum System {
    Gps,
    Glonass,
    Sbas,
    Galileo,
    BeiDou,
    Qzss,
}

impl System {
    /// Map the 3-bit system code from a tracking status word.
    pub(crate) fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => System::Gps,
            1 => System::Glonass,
            2 => System::Sbas,
            3 => System::Galileo,
            4 => System::BeiDou,
            5 => System::Qzss,
            _ => return None,
        })
    }
}

/// A validated satellite identity: system plus PRN (or slot number for
/// GLONASS, where PRN means orbital slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SatId {
    system: System,
    prn: u8,
}

impl SatId {
    /// Construct from a system and PRN, or `None` if the PRN is outside
    /// the valid range for the system.
    #[must_use]
    pub fn new(system: System, prn: i32) -> Option<Self> {
        let valid = match system {
            System::Gps => (1..=32).contains(&prn),
            System::Glonass => (1..=27).contains(&prn),
            System::Sbas => (120..=142).contains(&prn),
            System::Galileo => (1..=36).contains(&prn),
            System::BeiDou => (1..=63).contains(&prn),
            System::Qzss => (193..=202).contains(&prn),
        };
        valid.then(|| SatId {
            system,
            prn: prn as u8,
        })
    }

    #[must_use]
    pub fn system(&self) -> System {
        self.system
    }

    #[must_use]
    pub fn prn(&self) -> u8 {
        self.prn
    }
}

impl fmt::Display for SatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.system {
            System::Gps => write!(f, "G{:02}", self.prn),
            System::Glonass => write!(f, "R{:02}", self.prn),
            System::Sbas => write!(f, "S{:02}", self.prn - 100),
            System::Galileo => write!(f, "E{:02}", self.prn),
            System::BeiDou => write!(f, "C{:02}", self.prn),
            System::Qzss => write!(f, "J{:02}", self.prn - 192),
        }
    }
}

/// Carrier wavelength for a system and band index, ignoring GLONASS
/// FDMA channel offsets (see [`glonass_wavelength`]).
///
/// Returns `None` when the band is not defined for the system.
#[must_use]
pub fn wavelength(system: System, band: usize) -> Option<f64> {
    let freq = match system {
        System::Glonass => match band {
            2 => FREQ3_GLO,
            _ => return None,
        },
        System::BeiDou => match band {
            0 => FREQ1_BDS,
            1 => FREQ2_BDS,
            2 => FREQ3_BDS,
            _ => return None,
        },
        System::Galileo => match band {
            0 => FREQ_L1,
            1 => FREQ_L7,
            2 => FREQ_L5,
            _ => return None,
        },
        _ => match band {
            0 => FREQ_L1,
            1 => FREQ_L2,
            2 => FREQ_L5,
            _ => return None,
        },
    };
    Some(CLIGHT / freq)
}

/// GLONASS FDMA wavelength for bands 0/1 given the frequency channel
/// number, `None` for bands without FDMA channels.
#[must_use]
pub fn glonass_wavelength(band: usize, fcn: i16) -> Option<f64> {
    let freq = match band {
        0 => FREQ1_GLO + DFRQ1_GLO * f64::from(fcn),
        1 => FREQ2_GLO + DFRQ2_GLO * f64::from(fcn),
        _ => return None,
    };
    Some(CLIGHT / freq)
}

/// Fallback wavelength for a band when no system-specific value exists.
#[must_use]
pub fn base_wavelength(band: usize) -> f64 {
    CLIGHT / BASE_FREQS[band]
}

/// Decreasing-threshold table mapping a continuous user range accuracy
/// value (meters) to the broadcast accuracy index.
const URA_THRESHOLDS: [f64; 15] = [
    2.4, 3.4, 4.85, 6.85, 9.65, 13.65, 24.0, 48.0, 96.0, 192.0, 384.0, 768.0, 1536.0, 3072.0,
    6144.0,
];

/// Accuracy index for a continuous accuracy value.
#[must_use]
pub fn ura_index(ura: f64) -> u8 {
    URA_THRESHOLDS
        .iter()
        .position(|&t| t >= ura)
        .unwrap_or(URA_THRESHOLDS.len()) as u8
}
