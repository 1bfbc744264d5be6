//! GNSS time arithmetic on top of [`hifitime`].
//!
//! All epochs produced by the decoder live on the continuous GPS time
//! scale; GLONASS and BeiDou native times are shifted onto it here.

use hifitime::Epoch;

pub const SECS_PER_WEEK: f64 = 604_800.0;
pub const HALF_WEEK: f64 = 302_400.0;
const SECS_PER_DAY: f64 = 86_400.0;
const HALF_DAY: f64 = 43_200.0;

/// Floor applied to the reference week when extending truncated week
/// numbers, so that streams decoded without any time context still land
/// in the modern era.
pub const MIN_GPS_WEEK: i64 = 1560;

/// GPS week of the BeiDou time epoch (2006-01-01).
const BDT_WEEK0: i64 = 1356;
/// Constant offset of BDT behind GPST, seconds.
const BDT_GPST_SECS: f64 = 14.0;

/// Epoch for a GPS week number and time of week in seconds.
#[must_use]
pub fn gpst_epoch(week: i64, tow: f64) -> Epoch {
    Epoch::from_gpst_seconds(week as f64 * SECS_PER_WEEK + tow)
}

/// Split an epoch into GPS week number and time of week.
#[must_use]
pub fn gpst_week_tow(epoch: Epoch) -> (i64, f64) {
    let secs = epoch.to_gpst_seconds();
    let week = (secs / SECS_PER_WEEK).floor() as i64;
    (week, secs - week as f64 * SECS_PER_WEEK)
}

/// Extend a receiver-truncated (modulo-1024) week number against a
/// reference time, picking the roll nearest the reference week. Full
/// week numbers at or above the reference pass through unchanged.
#[must_use]
pub fn extend_week(week: i64, reference: Option<Epoch>) -> i64 {
    let ref_week = reference
        .map_or(MIN_GPS_WEEK, |e| gpst_week_tow(e).0)
        .max(MIN_GPS_WEEK);
    week + (ref_week - week + 512) / 1024 * 1024
}

/// Place `tow` in the week of `reference`, shifting by one week when the
/// difference exceeds half a week.
#[must_use]
pub fn adjust_tow(reference: Epoch, tow: f64) -> Epoch {
    let (week, tow_ref) = gpst_week_tow(reference);
    let mut tow = tow;
    if tow < tow_ref - HALF_WEEK {
        tow += SECS_PER_WEEK;
    } else if tow > tow_ref + HALF_WEEK {
        tow -= SECS_PER_WEEK;
    }
    gpst_epoch(week, tow)
}

/// Align a day-wrapped time of day `tod` to the day of `tow`, shifting by
/// one day when the difference exceeds 12 hours. Both arguments and the
/// result are seconds of week.
#[must_use]
pub fn adjust_day(tow: f64, tod: f64) -> f64 {
    let mut t = tod + (tow / SECS_PER_DAY).floor() * SECS_PER_DAY;
    if t < tow - HALF_DAY {
        t += SECS_PER_DAY;
    } else if t > tow + HALF_DAY {
        t -= SECS_PER_DAY;
    }
    t
}

/// BeiDou week number and seconds of week to an epoch on the GPS time base.
#[must_use]
pub fn bdt_to_gpst(week: i64, sec: f64) -> Epoch {
    gpst_epoch(BDT_WEEK0 + week, sec + BDT_GPST_SECS)
}
