//! Broadcast ephemeris records and the four ephemeris message decoders.

use hifitime::Epoch;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bytes::Fields;
use crate::decoder::{Decoder, GalileoNav, Update};
use crate::frame::RawFrame;
use crate::obs::{GLONASS_FCN_OFFSET, GLONASS_PRN_OFFSET};
use crate::sat::{self, SatId, System};
use crate::time::{self, HALF_WEEK};
use crate::{Error, Result};

/// Broadcast Keplerian ephemeris for GPS, Galileo, and BeiDou satellites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ephemeris {
    pub sat: SatId,
    /// Issue of data, ephemeris (IODNav for Galileo, AODE for BeiDou).
    pub iode: u32,
    /// Issue of data, clock (AODC for BeiDou).
    pub iodc: u32,
    /// Accuracy index (URA, or SISA for Galileo).
    pub accuracy: u8,
    /// Health word; layout is system specific. For Galileo this is the
    /// composite of the per-band health and validity sub-fields in the
    /// RINEX 3.03 bit layout.
    pub health: u32,
    /// Extended week number of `toe`.
    pub week: i64,
    /// Nav-message/frequency data source bits (RINEX 3.03); Galileo only.
    pub source: u32,
    /// Reference epoch of the orbit parameters.
    pub toe: Epoch,
    /// Reference epoch of the clock parameters.
    pub toc: Epoch,
    /// Reception stamp of the broadcast message.
    pub ttr: Epoch,
    /// Semi-major axis (m).
    pub a: f64,
    pub eccentricity: f64,
    pub i0: f64,
    pub omega0: f64,
    pub omega: f64,
    pub m0: f64,
    pub delta_n: f64,
    pub omega_dot: f64,
    pub i_dot: f64,
    pub crc: f64,
    pub crs: f64,
    pub cuc: f64,
    pub cus: f64,
    pub cic: f64,
    pub cis: f64,
    /// `toe` as seconds into `week`.
    pub toes: f64,
    pub af0: f64,
    pub af1: f64,
    pub af2: f64,
    /// Group delays: TGD/BGD E5a-E1/TGD1 and BGD E5b-E1/TGD2.
    pub tgd: [f64; 2],
}

/// Broadcast GLONASS ephemeris, keyed by orbital slot number.
///
/// A record may exist with `sat` unset, holding only the frequency channel
/// number observed in range messages before any broadcast ephemeris has
/// been decoded for the slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlonassEphemeris {
    pub sat: Option<SatId>,
    pub iode: u32,
    /// FDMA frequency channel number, -7..=6.
    pub frequency: i16,
    pub health: u32,
    /// Age of the operation information, days.
    pub age: u32,
    /// Reference epoch, on the GPS time base.
    pub toe: Option<Epoch>,
    /// Message frame time, on the GPS time base.
    pub tof: Option<Epoch>,
    /// ECEF position (m).
    pub position: [f64; 3],
    /// ECEF velocity (m/s).
    pub velocity: [f64; 3],
    /// ECEF acceleration (m/s^2).
    pub acceleration: [f64; 3],
    /// Clock bias (s).
    pub tau: f64,
    /// Relative frequency bias.
    pub gamma: f64,
}

impl Decoder {
    fn store_ephemeris<F>(&mut self, eph: Ephemeris, unchanged: F) -> Update
    where
        F: Fn(&Ephemeris, &Ephemeris) -> bool,
    {
        if !self.config.all_ephemerides {
            if let Some(old) = self.nav.ephemeris.get(&eph.sat) {
                if unchanged(old, &eph) {
                    return Update::None;
                }
            }
        }
        let sat = eph.sat;
        self.nav.ephemeris.insert(sat, eph);
        self.last_updated = Some(sat);
        Update::Ephemeris(sat)
    }

    /// Decode a GPS broadcast ephemeris message.
    pub(crate) fn decode_gps_eph(&mut self, frame: &RawFrame, time: Epoch) -> Result<Update> {
        let p = Fields::new(frame.payload());
        p.require(224)?;

        let prn = i32::from(p.u2(0));
        debug!(len = frame.len(), prn, "gps ephemeris");
        let sat = SatId::new(System::Gps, prn).ok_or(Error::UnknownSatellite {
            system: System::Gps,
            prn,
        })?;

        let tow = p.f8(4);
        let health = p.u4(12);
        let iode = p.u4(16);
        let iode2 = p.u4(20);
        let week = p.u4(24);
        let _zweek = p.u4(28);
        let toes = p.f8(32);
        let a = p.f8(40);
        let delta_n = p.f8(48);
        let m0 = p.f8(56);
        let eccentricity = p.f8(64);
        let omega = p.f8(72);
        let cuc = p.f8(80);
        let cus = p.f8(88);
        let crc = p.f8(96);
        let crs = p.f8(104);
        let cic = p.f8(112);
        let cis = p.f8(120);
        let i0 = p.f8(128);
        let i_dot = p.f8(136);
        let omega0 = p.f8(144);
        let omega_dot = p.f8(152);
        let iodc = p.u4(160);
        let toc = p.f8(164);
        let tgd0 = p.f8(172);
        let af0 = p.f8(180);
        let af1 = p.f8(188);
        let af2 = p.f8(196);
        let _as_on = p.u4(204);
        let _n = p.f8(208);
        let ura = p.f8(216);

        if iode != iode2 {
            return Err(Error::Integrity { iode, iode2 });
        }

        let mut week = time::extend_week(i64::from(week), Some(time));
        let toe = time::gpst_epoch(week, toes);
        let tt = (toe - time).to_seconds();
        if tt < -HALF_WEEK {
            week += 1;
        } else if tt > HALF_WEEK {
            week -= 1;
        }
        let toe = time::gpst_epoch(week, toes);
        let toc = time::gpst_epoch(week, toc);
        let ttr = time::adjust_tow(toe, tow);

        let eph = Ephemeris {
            sat,
            iode,
            iodc,
            accuracy: sat::ura_index(ura),
            health,
            week,
            source: 0,
            toe,
            toc,
            ttr,
            a,
            eccentricity,
            i0,
            omega0,
            omega,
            m0,
            delta_n,
            omega_dot,
            i_dot,
            crc,
            crs,
            cuc,
            cus,
            cic,
            cis,
            toes,
            af0,
            af1,
            af2,
            tgd: [tgd0, 0.0],
        };
        Ok(self.store_ephemeris(eph, |old, new| {
            old.toe == new.toe && old.iode == new.iode && old.iodc == new.iodc
        }))
    }

    /// Decode a GLONASS broadcast ephemeris message.
    pub(crate) fn decode_glonass_eph(&mut self, frame: &RawFrame, _time: Epoch) -> Result<Update> {
        let p = Fields::new(frame.payload());
        p.require(144)?;

        let prn = i32::from(p.u2(0)) - GLONASS_PRN_OFFSET;
        debug!(len = frame.len(), prn, "glonass ephemeris");
        let sat = SatId::new(System::Glonass, prn).ok_or(Error::UnknownSatellite {
            system: System::Glonass,
            prn,
        })?;
        let slot = sat.prn();

        let frequency = p.u2(2) as i16 + GLONASS_FCN_OFFSET;
        let week = i64::from(p.u2(6));
        // rounded to integer seconds
        let tow = (f64::from(p.u4(8)) / 1000.0 + 0.5).floor();
        let toff = f64::from(p.u4(12));
        let iode = p.u4(20) & 0x7f;
        let health = p.u4(24);
        let position = [p.f8(28), p.f8(36), p.f8(44)];
        let velocity = [p.f8(52), p.f8(60), p.f8(68)];
        let acceleration = [p.f8(76), p.f8(84), p.f8(92)];
        let tau = p.f8(100);
        let gamma = p.f8(116);
        let tof = f64::from(p.u4(124)) - toff; // glonass time -> gps time
        let age = p.u4(136);

        let toe = time::gpst_epoch(week, tow);
        let tof = time::gpst_epoch(week, time::adjust_day(tow, tof));

        if !self.config.all_ephemerides {
            if let Some(old) = self.nav.glonass.get(&slot) {
                if let Some(old_toe) = old.toe {
                    if (old_toe - toe).abs().to_seconds() < 1.0 && old.health == health {
                        return Ok(Update::None);
                    }
                }
            }
        }
        self.nav.glonass.insert(
            slot,
            GlonassEphemeris {
                sat: Some(sat),
                iode,
                frequency,
                health,
                age,
                toe: Some(toe),
                tof: Some(tof),
                position,
                velocity,
                acceleration,
                tau,
                gamma,
            },
        );
        self.last_updated = Some(sat);
        Ok(Update::Ephemeris(sat))
    }

    /// Decode a Galileo broadcast ephemeris message, carrying both I/NAV
    /// and F/NAV navigation sources in one frame.
    pub(crate) fn decode_galileo_eph(&mut self, frame: &RawFrame, time: Epoch) -> Result<Update> {
        let p = Fields::new(frame.payload());
        p.require(220)?;

        let prn = p.u4(0) as i32;
        let rcv_fnav = p.u4(4) & 1 == 1;
        let rcv_inav = p.u4(8) & 1 == 1;
        let svh_e1b = u32::from(p.u1(12)) & 3;
        let svh_e5a = u32::from(p.u1(13)) & 3;
        let svh_e5b = u32::from(p.u1(14)) & 3;
        let dvs_e1b = u32::from(p.u1(15)) & 1;
        let dvs_e5a = u32::from(p.u1(16)) & 1;
        let dvs_e5b = u32::from(p.u1(17)) & 1;
        let sisa = p.u1(18);
        let iode = p.u4(20); // IODNav
        let toes = f64::from(p.u4(24));
        let sqrt_a = p.f8(28);
        let delta_n = p.f8(36);
        let m0 = p.f8(44);
        let eccentricity = p.f8(52);
        let omega = p.f8(60);
        let cuc = p.f8(68);
        let cus = p.f8(76);
        let crc = p.f8(84);
        let crs = p.f8(92);
        let cic = p.f8(100);
        let cis = p.f8(108);
        let i0 = p.f8(116);
        let i_dot = p.f8(124);
        let omega0 = p.f8(132);
        let omega_dot = p.f8(140);
        let toc_fnav = p.u4(148);
        let af0_fnav = p.f8(152);
        let af1_fnav = p.f8(160);
        let af2_fnav = p.f8(168);
        let toc_inav = p.u4(176);
        let af0_inav = p.f8(180);
        let af1_inav = p.f8(188);
        let af2_inav = p.f8(196);
        let bgd_e5a = p.f8(204); // BGD: E5A-E1 (s)
        let bgd_e5b = p.f8(212); // BGD: E5B-E1 (s)

        let health = (svh_e5b << 7)
            | (dvs_e5b << 6)
            | (svh_e5a << 4)
            | (dvs_e5a << 3)
            | (svh_e1b << 1)
            | dvs_e1b;

        // navigation source selection
        let use_fnav = match self.config.galileo_nav {
            Some(GalileoNav::INav) => false,
            Some(GalileoNav::FNav) => true,
            None => !rcv_inav && rcv_fnav,
        };
        let (toc_sel, af0, af1, af2) = if use_fnav {
            (toc_fnav, af0_fnav, af1_fnav, af2_fnav)
        } else {
            (toc_inav, af0_inav, af1_inav, af2_inav)
        };
        // data source bits defined in rinex 3.03
        let source = if use_fnav {
            (1 << 1) | (1 << 8)
        } else {
            (1 << 0) | (1 << 9)
        };

        debug!(len = frame.len(), prn, iode, toes, "galileo ephemeris");
        let sat = SatId::new(System::Galileo, prn).ok_or(Error::UnknownSatellite {
            system: System::Galileo,
            prn,
        })?;

        // gps week = galileo week
        let (mut week, tow) = time::gpst_week_tow(time);
        let toe = time::gpst_epoch(week, toes);
        let tt = (toe - time).to_seconds();
        if tt < -HALF_WEEK {
            week += 1;
        } else if tt > HALF_WEEK {
            week -= 1;
        }
        let toe = time::gpst_epoch(week, toes);
        let toc = time::adjust_tow(toe, f64::from(toc_sel));
        let ttr = time::adjust_tow(toe, tow);

        let eph = Ephemeris {
            sat,
            iode,
            iodc: iode,
            accuracy: sisa,
            health,
            week,
            source,
            toe,
            toc,
            ttr,
            a: sqrt_a * sqrt_a,
            eccentricity,
            i0,
            omega0,
            omega,
            m0,
            delta_n,
            omega_dot,
            i_dot,
            crc,
            crs,
            cuc,
            cus,
            cic,
            cis,
            toes,
            af0,
            af1,
            af2,
            tgd: [bgd_e5a, bgd_e5b],
        };
        Ok(self.store_ephemeris(eph, |old, new| {
            old.iode == new.iode && old.source == new.source
        }))
    }

    /// Decode a BeiDou broadcast ephemeris message. Fields sit at fixed,
    /// non-contiguous offsets rather than in read order.
    pub(crate) fn decode_beidou_eph(&mut self, frame: &RawFrame, time: Epoch) -> Result<Update> {
        let p = Fields::new(frame.payload());
        p.require(232)?;

        let prn = p.u4(0) as i32;
        let week = p.u4(24);
        let ura = p.f8(224);
        let health = p.u4(12) & 1;
        let tgd = [p.f8(172), p.f8(180)]; // TGD1, TGD2
        let iodc = p.u4(160); // AODC
        let toc = f64::from(p.u4(164));
        let af0 = p.f8(188);
        let af1 = p.f8(196);
        let af2 = p.f8(204);
        let iode = p.u4(16); // AODE
        let toes = f64::from(p.u4(32));
        let eccentricity = p.f8(64);
        let omega = p.f8(72);
        let delta_n = p.f8(48);
        let m0 = p.f8(56);
        let omega0 = p.f8(144);
        let omega_dot = p.f8(152);
        let i0 = p.f8(128);
        let i_dot = p.f8(136);
        let cuc = p.f8(80);
        let cus = p.f8(88);
        let crc = p.f8(96);
        let crs = p.f8(104);
        let cic = p.f8(112);
        let cis = p.f8(120);
        let a = p.f8(40);

        debug!(len = frame.len(), prn, iode, toes, "beidou ephemeris");
        let sat = SatId::new(System::BeiDou, prn).ok_or(Error::UnknownSatellite {
            system: System::BeiDou,
            prn,
        })?;

        let eph = Ephemeris {
            sat,
            iode,
            iodc,
            accuracy: sat::ura_index(ura),
            health,
            week: i64::from(week),
            source: 0,
            toe: time::bdt_to_gpst(i64::from(week), toes),
            toc: time::bdt_to_gpst(i64::from(week), toc),
            ttr: time,
            a,
            eccentricity,
            i0,
            omega0,
            omega,
            m0,
            delta_n,
            omega_dot,
            i_dot,
            crc,
            crs,
            cuc,
            cus,
            cic,
            cis,
            toes,
            af0,
            af1,
            af2,
            tgd,
        };
        Ok(self.store_ephemeris(eph, |old, new| {
            old.toe == new.toe && old.iode == new.iode && old.iodc == new.iodc
        }))
    }
}
