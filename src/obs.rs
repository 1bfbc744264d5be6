//! Observation measurements and the two range message decoders.
//!
//! Both wire variants share the same channel loop: decode the tracking
//! status, resolve the storage slot, derive the satellite, maintain the
//! per-channel lock history for cycle-slip detection, and merge the
//! measurements into the current epoch's observation set.

use hifitime::Epoch;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::bytes::{extend_sign, Fields};
use crate::decoder::{Config, Decoder, Update};
use crate::frame::RawFrame;
use crate::sat::{self, SatId, System, CLIGHT, FREQ1_GLO, FREQ2_GLO};
use crate::trackstat::{Band, Signal, TrackingStatus};
use crate::Result;

/// Base number of carrier bands stored per satellite record.
pub const NFREQ: usize = 3;
/// Maximum configurable extended slots beyond the base bands.
pub const MAX_EXTENDED: usize = 3;
/// Storage slots per observation record.
pub const MAX_SLOTS: usize = NFREQ + MAX_EXTENDED;
/// Hard cap on satellites per epoch; channels beyond it are dropped.
pub const MAX_OBSERVATIONS: usize = 64;

/// Loss-of-lock: cycle slip detected.
pub const LLI_SLIP: u8 = 0x01;
/// Loss-of-lock: half-cycle ambiguity (parity unknown).
pub const LLI_HALF_CYCLE: u8 = 0x02;
/// Loss-of-lock: the receiver added a half cycle to the phase.
pub const LLI_HALF_ADDED: u8 = 0x04;

const RANGE_RECORD_LEN: usize = 44;
const RANGECMP_RECORD_LEN: usize = 24;

/// GLONASS PRN fields carry slot number plus this offset.
pub(crate) const GLONASS_PRN_OFFSET: i32 = 37;
/// Offset applied to the broadcast GLONASS frequency channel field.
pub(crate) const GLONASS_FCN_OFFSET: i16 = -7;
/// Carrier phase rollover constant, 2^23 cycles.
const PHASE_ROLLOVER: f64 = 8_388_608.0;
/// Largest encodable compressed lock time; a saturation sentinel, not a
/// tracking reset, so slip detection is suppressed at this value.
const LOCK_TIME_MAX: f64 = 65_535.968;

/// One signal's measurements within a satellite record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotObservation {
    /// Pseudorange (m); zero while the code loop is unlocked.
    pub pseudorange: f64,
    /// Carrier phase (cycles), increasing with receiver-satellite range;
    /// zero while the phase loop is unlocked.
    pub carrier_phase: f64,
    /// Doppler (Hz); zero while the phase loop is unlocked.
    pub doppler: f32,
    /// C/N0 quantized to 0.25 dBHz steps.
    pub snr: u8,
    /// Loss-of-lock indicator bits (`LLI_*`).
    pub lli: u8,
    pub signal: Option<Signal>,
}

/// All measurements for one satellite at one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub sat: SatId,
    pub time: Epoch,
    pub slots: [SlotObservation; MAX_SLOTS],
}

/// Observations accumulated for one epoch.
///
/// Frames whose time matches the buffered epoch to within 1 ns merge into
/// the same set, so compressed and uncompressed range messages sharing a
/// physical epoch produce one set; a frame at a new epoch restarts it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservationSet {
    records: Vec<ObservationRecord>,
}

impl ObservationSet {
    /// Epoch of the buffered records, if any.
    #[must_use]
    pub fn epoch(&self) -> Option<Epoch> {
        self.records.first().map(|r| r.time)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }

    #[must_use]
    pub fn get(&self, sat: SatId) -> Option<&ObservationRecord> {
        self.records.iter().find(|r| r.sat == sat)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ObservationRecord> {
        self.records.iter()
    }

    /// Find or create the record for `sat`, restarting the set first when
    /// `time` differs from the buffered epoch by more than 1 ns. Returns
    /// `None` when the per-epoch satellite cap is reached.
    fn upsert(&mut self, time: Epoch, sat: SatId) -> Option<&mut ObservationRecord> {
        if let Some(epoch) = self.epoch() {
            if (epoch - time).abs().to_seconds() > 1e-9 {
                self.records.clear();
            }
        }
        if let Some(i) = self.records.iter().position(|r| r.sat == sat) {
            return Some(&mut self.records[i]);
        }
        if self.records.len() >= MAX_OBSERVATIONS {
            return None;
        }
        self.records.push(ObservationRecord {
            sat,
            time,
            slots: Default::default(),
        });
        self.records.last_mut()
    }
}

impl<'a> IntoIterator for &'a ObservationSet {
    type Item = &'a ObservationRecord;
    type IntoIter = std::slice::Iter<'a, ObservationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Per-(satellite, slot) tracking history driving cycle-slip detection.
/// Updated on every accepted channel, never reset.
#[derive(Debug, Clone, Copy)]
pub struct ChannelLock {
    pub time: Epoch,
    pub lock_time: f64,
    pub half_cycle_added: bool,
}

/// Map a decoded signal to its storage slot, or discard it.
///
/// Explicit per-system overrides win over the default policy and discard
/// the channel when the decoded signal is not the selected variant.
/// Secondary signals route to extended slots only when the configured
/// capacity allows, and are otherwise discarded.
pub(crate) fn storage_slot(
    cfg: &Config,
    system: System,
    signal: Signal,
    band: Band,
) -> Option<usize> {
    let nex = cfg.extended_slots.min(MAX_EXTENDED);
    match system {
        System::Gps => {
            if cfg.gps_l1p_only && band == 0 {
                return (signal == Signal::L1P).then_some(0);
            }
            if cfg.gps_l2x_only && band == 1 {
                return (signal == Signal::L2X).then_some(1);
            }
            if signal == Signal::L1P {
                return (nex >= 1).then_some(NFREQ);
            }
            if signal == Signal::L2X {
                return (nex >= 2).then_some(NFREQ + 1);
            }
        }
        System::Glonass => {
            if cfg.glonass_l2c_only && band == 1 {
                return (signal == Signal::L2C).then_some(1);
            }
            if signal == Signal::L2C {
                return (nex >= 1).then_some(NFREQ);
            }
        }
        System::Galileo => {
            if cfg.galileo_e1b_only && band == 0 {
                return (signal == Signal::L1B).then_some(0);
            }
            if signal == Signal::L1B {
                return (nex >= 1).then_some(NFREQ);
            }
            if signal == Signal::L8Q {
                return (nex >= 3).then_some(NFREQ + 2);
            }
        }
        _ => {}
    }
    (band < NFREQ).then_some(band)
}

/// Quantize C/N0 to quarter-dBHz steps, clamping out-of-range inputs to 0.
fn quantize_snr(snr: f64) -> u8 {
    if (0.0..255.0).contains(&snr) {
        (snr * 4.0 + 0.5) as u8
    } else {
        0
    }
}

impl Decoder {
    /// Slip detection plus history update for one accepted channel;
    /// returns the loss-of-lock bits.
    fn update_lock(
        &mut self,
        sat: SatId,
        slot: usize,
        time: Epoch,
        lock_time: f64,
        status: TrackingStatus,
        suppress_slip: bool,
    ) -> u8 {
        let mut lli = 0;
        if let Some(prev) = self.locks.get(&(sat, slot)) {
            let elapsed = (time - prev.time).to_seconds();
            if !suppress_slip && lock_time - prev.lock_time + 0.05 <= elapsed {
                lli |= LLI_SLIP;
            }
        }
        if !status.parity_known {
            lli |= LLI_HALF_CYCLE;
        }
        if status.half_cycle_added {
            lli |= LLI_HALF_ADDED;
        }
        self.locks.insert(
            (sat, slot),
            ChannelLock {
                time,
                lock_time,
                half_cycle_added: status.half_cycle_added,
            },
        );
        lli
    }

    /// Record the GLONASS frequency channel number seen in a range message
    /// on the ephemeris store, unless a broadcast record for this satellite
    /// already owns the slot. The compressed observation decoder falls back
    /// to this channel number for its wavelength lookup.
    fn note_glonass_channel(&mut self, slot: u8, sat: SatId, fcn: i16) {
        let rec = self.nav.glonass.entry(slot).or_default();
        if rec.sat != Some(sat) {
            rec.frequency = fcn;
        }
    }

    /// Wavelength for the satellite and band, from the GLONASS frequency
    /// channel table where applicable.
    fn carrier_wavelength(&self, sat: SatId, band: Band) -> Option<f64> {
        if sat.system() == System::Glonass && band < 2 {
            return self
                .nav
                .glonass
                .get(&sat.prn())
                .filter(|rec| rec.sat == Some(sat))
                .and_then(|rec| sat::glonass_wavelength(band, rec.frequency));
        }
        sat::wavelength(sat.system(), band)
    }

    /// Decode an uncompressed range measurement message.
    pub(crate) fn decode_range(&mut self, frame: &RawFrame, time: Epoch) -> Result<Update> {
        let p = Fields::new(frame.payload());
        p.require(4)?;
        let nobs = p.u4(0) as usize;
        debug!(len = frame.len(), nobs, "range");
        p.require(4 + nobs * RANGE_RECORD_LEN)?;

        for i in 0..nobs {
            let off = 4 + i * RANGE_RECORD_LEN;

            let status = match TrackingStatus::decode(p.u4(off + 40)) {
                Ok(status) => status,
                Err(err) => {
                    trace!(channel = i, %err, "skipping channel");
                    continue;
                }
            };
            let Some(pos) = storage_slot(&self.config, status.system, status.signal, status.band)
            else {
                continue;
            };

            let mut prn = i32::from(p.u2(off));
            if status.system == System::Glonass {
                prn -= GLONASS_PRN_OFFSET;
            }
            let Some(sat) = SatId::new(status.system, prn) else {
                trace!(channel = i, system = ?status.system, prn, "satellite number error");
                continue;
            };
            // ambiguous parity invalidates the reading
            if status.system == System::Glonass && !status.parity_known {
                continue;
            }

            let gfrq = p.u2(off + 2);
            let mut psr = p.f8(off + 4);
            let mut adr = p.f8(off + 16);
            let mut dop = p.f4(off + 28);
            let snr = p.f4(off + 32);
            let lock_time = p.f4(off + 36);

            if status.system == System::Glonass {
                self.note_glonass_channel(sat.prn(), sat, gfrq as i16 + GLONASS_FCN_OFFSET);
            }

            let lli = self.update_lock(sat, pos, time, f64::from(lock_time), status, false);

            if !status.code_lock {
                psr = 0.0;
            }
            if !status.phase_lock {
                adr = 0.0;
                dop = 0.0;
            }

            if let Some(rec) = self.obs.upsert(time, sat) {
                rec.slots[pos] = SlotObservation {
                    pseudorange: psr,
                    carrier_phase: -adr,
                    doppler: dop,
                    snr: quantize_snr(f64::from(snr)),
                    lli,
                    signal: Some(status.signal),
                };
            }
        }
        Ok(Update::Observations)
    }

    /// Decode a compressed range measurement message.
    pub(crate) fn decode_range_cmp(&mut self, frame: &RawFrame, time: Epoch) -> Result<Update> {
        let p = Fields::new(frame.payload());
        p.require(4)?;
        let nobs = p.u4(0) as usize;
        debug!(len = frame.len(), nobs, "compressed range");
        p.require(4 + nobs * RANGECMP_RECORD_LEN)?;

        for i in 0..nobs {
            let off = 4 + i * RANGECMP_RECORD_LEN;

            let status = match TrackingStatus::decode(p.u4(off)) {
                Ok(status) => status,
                Err(err) => {
                    trace!(channel = i, %err, "skipping channel");
                    continue;
                }
            };
            let Some(pos) = storage_slot(&self.config, status.system, status.signal, status.band)
            else {
                continue;
            };

            let mut prn = i32::from(p.u1(off + 17));
            if status.system == System::Glonass {
                prn -= GLONASS_PRN_OFFSET;
            }
            let Some(sat) = SatId::new(status.system, prn) else {
                trace!(channel = i, system = ?status.system, prn, "satellite number error");
                continue;
            };
            // ambiguous parity invalidates the reading
            if status.system == System::Glonass && !status.parity_known {
                continue;
            }

            let mut dop = f64::from(extend_sign(p.u4(off + 4) & 0x0fff_ffff, 28)) / 256.0;
            let mut psr =
                f64::from(p.u4(off + 7) >> 4) / 128.0 + f64::from(p.u1(off + 11)) * 2_097_152.0;

            let wavelen = match self.carrier_wavelength(sat, status.band) {
                Some(w) if w > 0.0 => w,
                _ if status.system == System::Glonass => {
                    CLIGHT / if status.band == 0 { FREQ1_GLO } else { FREQ2_GLO }
                }
                _ => sat::base_wavelength(status.band),
            };

            // resolve the 2^23-cycle phase ambiguity against the pseudorange
            let mut adr = f64::from(p.i4(off + 12)) / 256.0;
            let rolls = (psr / wavelen + adr) / PHASE_ROLLOVER;
            adr = -adr + PHASE_ROLLOVER * (rolls + if rolls <= 0.0 { -0.5 } else { 0.5 }).floor();

            let lock_time = f64::from(p.u4(off + 18) & 0x1f_ffff) / 32.0;
            let lli = self.update_lock(
                sat,
                pos,
                time,
                lock_time,
                status,
                lock_time >= LOCK_TIME_MAX,
            );

            let snr = f64::from((p.u2(off + 20) & 0x3ff) >> 5) + 20.0;

            if !status.code_lock {
                psr = 0.0;
            }
            if !status.phase_lock {
                adr = 0.0;
                dop = 0.0;
            }

            if let Some(rec) = self.obs.upsert(time, sat) {
                rec.slots[pos] = SlotObservation {
                    pseudorange: psr,
                    carrier_phase: adr,
                    doppler: dop as f32,
                    snr: quantize_snr(snr),
                    lli,
                    signal: Some(status.signal),
                };
            }
        }
        Ok(Update::Observations)
    }
}
