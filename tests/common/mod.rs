//! Builders for synthetic receiver streams.

use unicore::checksum;
use unicore::frame::SYNC;

/// A complete frame around `payload`, with a valid trailing checksum.
pub fn build_frame(message_id: u16, week: u16, tow_ms: u32, payload: &[u8]) -> Vec<u8> {
    let mut dat = vec![0u8; 28];
    dat[0..3].copy_from_slice(&SYNC);
    dat[3] = 28;
    dat[4..6].copy_from_slice(&message_id.to_le_bytes());
    dat[8..10].copy_from_slice(&(payload.len() as u16).to_le_bytes());
    dat[14..16].copy_from_slice(&week.to_le_bytes());
    dat[16..20].copy_from_slice(&tow_ms.to_le_bytes());
    dat.extend_from_slice(payload);
    let crc = checksum(&dat);
    dat.extend_from_slice(&crc.to_le_bytes());
    dat
}

/// Tracking status word with tracking state 4, parity known, and both
/// loops locked.
pub fn trackstat_word(system: u8, sigtype: u8) -> u32 {
    4 | (1 << 10) | (1 << 11) | (1 << 12) | (u32::from(system) << 16) | (u32::from(sigtype) << 21)
}

/// One 44-byte uncompressed range channel record.
pub fn range_channel(prn: u16, psr: f64, adr: f64, dop: f32, snr: f32, lockt: f32, stat: u32) -> [u8; 44] {
    let mut b = [0u8; 44];
    b[0..2].copy_from_slice(&prn.to_le_bytes());
    b[4..12].copy_from_slice(&psr.to_le_bytes());
    b[16..24].copy_from_slice(&adr.to_le_bytes());
    b[28..32].copy_from_slice(&dop.to_le_bytes());
    b[32..36].copy_from_slice(&snr.to_le_bytes());
    b[36..40].copy_from_slice(&lockt.to_le_bytes());
    b[40..44].copy_from_slice(&stat.to_le_bytes());
    b
}

pub fn range_payload(channels: &[[u8; 44]]) -> Vec<u8> {
    let mut payload = (channels.len() as u32).to_le_bytes().to_vec();
    for ch in channels {
        payload.extend_from_slice(ch);
    }
    payload
}

/// A 224-byte GPS ephemeris payload with matching issue-of-data copies.
pub fn gps_eph_payload(prn: u16, iode: u32, week: u32, toes: f64) -> Vec<u8> {
    let mut b = vec![0u8; 224];
    b[0..2].copy_from_slice(&prn.to_le_bytes());
    b[4..12].copy_from_slice(&(toes + 1.0).to_le_bytes()); // tow
    b[16..20].copy_from_slice(&iode.to_le_bytes());
    b[20..24].copy_from_slice(&iode.to_le_bytes());
    b[24..28].copy_from_slice(&week.to_le_bytes());
    b[32..40].copy_from_slice(&toes.to_le_bytes());
    b[40..48].copy_from_slice(&2.655_9e7_f64.to_le_bytes()); // A
    b[160..164].copy_from_slice(&iode.to_le_bytes()); // iodc
    b[164..172].copy_from_slice(&toes.to_le_bytes()); // toc
    b[216..224].copy_from_slice(&2.0_f64.to_le_bytes()); // ura
    b
}
