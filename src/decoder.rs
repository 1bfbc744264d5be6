//! Receiver session state and message dispatch.

use std::collections::HashMap;
use std::io::Read;

use hifitime::Epoch;
use tracing::trace;
use typed_builder::TypedBuilder;

use crate::eph::{Ephemeris, GlonassEphemeris};
use crate::frame::{FrameAssembler, FrameReader, RawFrame};
use crate::obs::{ChannelLock, ObservationSet};
use crate::sat::SatId;
use crate::time;
use crate::{Error, Result};

/// Message id: range measurements.
pub const MSG_RANGE: u16 = 43;
/// Message id: compressed range measurements.
pub const MSG_RANGE_CMP: u16 = 140;
/// Message id: GPS ephemeris.
pub const MSG_GPS_EPH: u16 = 7;
/// Message id: GLONASS ephemeris.
pub const MSG_GLONASS_EPH: u16 = 723;
/// Message id: Galileo ephemeris.
pub const MSG_GALILEO_EPH: u16 = 1122;
/// Message id: BeiDou ephemeris.
pub const MSG_BEIDOU_EPH: u16 = 1047;

/// Galileo navigation message selection override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalileoNav {
    INav,
    FNav,
}

/// Decoder configuration.
///
/// Mirrors the receiver option strings; [`Config::parse`] accepts the
/// space-separated form, e.g. `"-EPHALL -GL1P"`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct Config {
    /// Store every decoded ephemeris, disabling change detection (`-EPHALL`).
    #[builder(default)]
    pub all_ephemerides: bool,
    /// Force the Galileo navigation source (`-GALINAV`/`-GALFNAV`).
    #[builder(default)]
    pub galileo_nav: Option<GalileoNav>,
    /// Restrict GPS L1 to the P code (`-GL1P`).
    #[builder(default)]
    pub gps_l1p_only: bool,
    /// Restrict GPS L2 to the combined L2C code (`-GL2X`).
    #[builder(default)]
    pub gps_l2x_only: bool,
    /// Restrict GLONASS L2 to the C/A code (`-RL2C`).
    #[builder(default)]
    pub glonass_l2c_only: bool,
    /// Restrict Galileo E1 to the data component (`-EL1B`).
    #[builder(default)]
    pub galileo_e1b_only: bool,
    /// Extended observation slots available beyond the base three.
    #[builder(default)]
    pub extended_slots: usize,
    /// Approximate receiver time used to extend truncated week numbers
    /// before the first timestamped frame has been seen.
    #[builder(default)]
    pub initial_time: Option<Epoch>,
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

impl Config {
    /// Parse a receiver option string.
    #[must_use]
    pub fn parse(opt: &str) -> Self {
        Config {
            all_ephemerides: opt.contains("-EPHALL"),
            galileo_nav: if opt.contains("-GALINAV") {
                Some(GalileoNav::INav)
            } else if opt.contains("-GALFNAV") {
                Some(GalileoNav::FNav)
            } else {
                None
            },
            gps_l1p_only: opt.contains("-GL1P"),
            gps_l2x_only: opt.contains("-GL2X"),
            glonass_l2c_only: opt.contains("-RL2C"),
            galileo_e1b_only: opt.contains("-EL1B"),
            extended_slots: 0,
            initial_time: None,
        }
    }
}

/// What a decoded frame contributed to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// Nothing: unknown message id, or an ephemeris that matched the
    /// stored record.
    None,
    /// The current observation set changed.
    Observations,
    /// The ephemeris record for this satellite was replaced.
    Ephemeris(SatId),
}

/// Decoded broadcast ephemeris tables.
#[derive(Debug, Clone, Default)]
pub struct NavStore {
    pub(crate) ephemeris: HashMap<SatId, Ephemeris>,
    pub(crate) glonass: HashMap<u8, GlonassEphemeris>,
}

impl NavStore {
    /// Stored ephemeris for a GPS, Galileo, or BeiDou satellite.
    #[must_use]
    pub fn ephemeris(&self, sat: SatId) -> Option<&Ephemeris> {
        self.ephemeris.get(&sat)
    }

    /// Stored GLONASS ephemeris for an orbital slot number.
    #[must_use]
    pub fn glonass(&self, slot: u8) -> Option<&GlonassEphemeris> {
        self.glonass.get(&slot)
    }

    pub fn iter_ephemeris(&self) -> impl Iterator<Item = &Ephemeris> {
        self.ephemeris.values()
    }

    pub fn iter_glonass(&self) -> impl Iterator<Item = (u8, &GlonassEphemeris)> {
        self.glonass.iter().map(|(slot, rec)| (*slot, rec))
    }
}

/// Decoder state for one receiver stream.
///
/// Owns the frame assembly buffer, the per-channel lock history, the
/// current observation set, and the ephemeris tables. Create one per
/// physical stream at stream start; two concurrent streams must each use
/// their own decoder. A failed frame never poisons the session: the next
/// call resynchronizes and continues.
#[derive(Debug, Default)]
pub struct Decoder {
    pub(crate) config: Config,
    assembler: FrameAssembler,
    pub(crate) time: Option<Epoch>,
    pub(crate) obs: ObservationSet,
    pub(crate) nav: NavStore,
    pub(crate) locks: HashMap<(SatId, usize), ChannelLock>,
    pub(crate) last_updated: Option<SatId>,
}

impl Decoder {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Decoder {
            config,
            ..Decoder::default()
        }
    }

    /// Feed one stream byte, decoding any frame it completes.
    ///
    /// # Errors
    /// Any framing or decode error for the frame this byte completed; the
    /// decoder remains usable and resynchronizes on the next call.
    pub fn push(&mut self, data: u8) -> Result<Update> {
        match self.assembler.push(data)? {
            Some(frame) => self.decode_frame(&frame),
            None => Ok(Update::None),
        }
    }

    /// Pull the next frame from `frames` and decode it. `Ok(None)` means
    /// end of stream.
    ///
    /// # Errors
    /// Same as [`Decoder::decode_frame`], plus source errors.
    pub fn next_from<R: Read>(&mut self, frames: &mut FrameReader<R>) -> Result<Option<Update>> {
        match frames.next_frame()? {
            Some(frame) => self.decode_frame(&frame).map(Some),
            None => Ok(None),
        }
    }

    /// Validate and decode one assembled frame, applying its effects to
    /// the session as a unit.
    ///
    /// # Errors
    /// [`Error::Crc`] for a corrupt frame, [`Error::MissingTimeContext`]
    /// when the receiver has no time fix, and the per-message errors of
    /// the individual decoders. Rejected frames mutate nothing.
    pub fn decode_frame(&mut self, frame: &RawFrame) -> Result<Update> {
        frame.check_crc()?;

        let message_id = frame.message_id();
        trace!(
            message_id,
            len = frame.len(),
            format = frame.format(),
            "frame"
        );

        let week = frame.week();
        if week == 0 {
            return Err(Error::MissingTimeContext);
        }
        let week = time::extend_week(i64::from(week), self.time.or(self.config.initial_time));
        let tow = f64::from(frame.tow_ms()) * 1e-3;
        let time = time::gpst_epoch(week, tow);
        self.time = Some(time);

        match message_id {
            MSG_RANGE => self.decode_range(frame, time),
            MSG_RANGE_CMP => self.decode_range_cmp(frame, time),
            MSG_GPS_EPH => self.decode_gps_eph(frame, time),
            MSG_GLONASS_EPH => self.decode_glonass_eph(frame, time),
            MSG_GALILEO_EPH => self.decode_galileo_eph(frame, time),
            MSG_BEIDOU_EPH => self.decode_beidou_eph(frame, time),
            _ => {
                trace!(message_id, "unhandled message");
                Ok(Update::None)
            }
        }
    }

    /// The observation set for the current epoch.
    #[must_use]
    pub fn observations(&self) -> &ObservationSet {
        &self.obs
    }

    /// The broadcast ephemeris tables.
    #[must_use]
    pub fn nav(&self) -> &NavStore {
        &self.nav
    }

    /// Session time: the epoch of the most recent timestamped frame.
    #[must_use]
    pub fn time(&self) -> Option<Epoch> {
        self.time
    }

    /// Satellite whose ephemeris was most recently replaced.
    #[must_use]
    pub fn last_updated(&self) -> Option<SatId> {
        self.last_updated
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
