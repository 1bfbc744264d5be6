mod common;

use common::{build_frame, gps_eph_payload, range_channel, range_payload, trackstat_word};
use rand::Rng;
use unicore::sat::{SatId, System};
use unicore::{time, Config, Decoder, Error, FrameReader, Update};

const WEEK: u16 = 2297;
const TOW_MS: u32 = 345_600_000;

/// Garbage, a range frame, a GPS ephemeris (twice), an unknown message,
/// and a range frame at the next epoch.
fn sample_stream() -> Vec<u8> {
    let mut dat = vec![0x00, 0xaa, 0x44, 0x13, 0xff, 0x12];

    let channels = [
        range_channel(1, 2.05e7, -1.08e8, 900.0, 46.5, 120.0, trackstat_word(0, 0)),
        range_channel(42, 1.95e7, -1.04e8, -450.0, 41.0, 80.0, trackstat_word(1, 0)),
    ];
    dat.extend_from_slice(&build_frame(43, WEEK, TOW_MS, &range_payload(&channels)));

    let eph = gps_eph_payload(5, 17, 2297, 345_600.0);
    dat.extend_from_slice(&build_frame(7, WEEK, TOW_MS, &eph));
    dat.extend_from_slice(&build_frame(7, WEEK, TOW_MS + 1000, &eph));

    dat.extend_from_slice(&build_frame(308, WEEK, TOW_MS + 1000, &[0u8; 8]));

    let late = [range_channel(
        1,
        2.05e7,
        -1.08e8,
        890.0,
        46.5,
        121.0,
        trackstat_word(0, 0),
    )];
    dat.extend_from_slice(&build_frame(
        43,
        WEEK,
        TOW_MS + 1000,
        &range_payload(&late),
    ));
    dat
}

#[test]
fn stream_decode_end_to_end() {
    let dat = sample_stream();
    let mut frames = FrameReader::new(&dat[..]);
    let mut decoder = Decoder::new(Config::default());

    let mut updates = Vec::new();
    while let Some(update) = decoder.next_from(&mut frames).unwrap() {
        updates.push(update);
    }

    let g05 = SatId::new(System::Gps, 5).unwrap();
    assert_eq!(
        updates,
        vec![
            Update::Observations,
            Update::Ephemeris(g05),
            Update::None, // duplicate ephemeris
            Update::None, // unknown message id
            Update::Observations,
        ]
    );

    // the second range frame restarted the epoch with one satellite
    let obs = decoder.observations();
    assert_eq!(obs.len(), 1);
    assert_eq!(obs.epoch(), Some(time::gpst_epoch(2297, 345_601.0)));
    let rec = obs.get(SatId::new(System::Gps, 1).unwrap()).unwrap();
    assert_eq!(rec.slots[0].pseudorange, 2.05e7);
    assert_eq!(rec.slots[0].carrier_phase, 1.08e8);

    assert!(decoder.nav().ephemeris(g05).is_some());
    assert_eq!(decoder.last_updated(), Some(g05));
    assert_eq!(decoder.time(), Some(time::gpst_epoch(2297, 345_601.0)));
}

#[test]
fn byte_push_matches_frame_reader() {
    let dat = sample_stream();

    let mut pushed = Decoder::new(Config::default());
    let mut push_updates = Vec::new();
    for &b in &dat {
        match pushed.push(b) {
            Ok(Update::None) => {}
            Ok(update) => push_updates.push(update),
            Err(err) => panic!("push failed: {err}"),
        }
    }

    let mut frames = FrameReader::new(&dat[..]);
    let mut pulled = Decoder::new(Config::default());
    let mut pull_updates = Vec::new();
    while let Some(update) = pulled.next_from(&mut frames).unwrap() {
        if update != Update::None {
            pull_updates.push(update);
        }
    }

    assert_eq!(push_updates, pull_updates);
    assert_eq!(pushed.time(), pulled.time());
    assert_eq!(pushed.observations().records(), pulled.observations().records());
}

#[test]
fn corruption_never_mutates_state() {
    let channels = [range_channel(
        9,
        2.1e7,
        -1.1e8,
        700.0,
        44.0,
        60.0,
        trackstat_word(0, 0),
    )];
    let good = build_frame(43, WEEK, TOW_MS, &range_payload(&channels));

    let mut rng = rand::thread_rng();
    for _ in 0..32 {
        let mut bad = good.clone();
        let bit = rng.gen_range(24..bad.len() * 8); // leave the sync+length area alone
        bad[bit / 8] ^= 1 << (bit % 8);

        let mut decoder = Decoder::new(Config::default());
        let mut frames = FrameReader::new(&bad[..]);
        // content damage fails the crc; length-field damage either truncates
        // the stream (no frame) or trips the frame size limit
        match decoder.next_from(&mut frames) {
            Err(Error::Crc { .. }) | Err(Error::Length { .. }) | Ok(None) => {}
            other => panic!("corrupt frame accepted: {other:?}"),
        }
        assert!(decoder.observations().is_empty());
        assert_eq!(decoder.time(), None);
    }
}

#[test]
fn length_error_then_resync() {
    // a sync marker followed by an oversize length field, then a frame
    let mut dat = vec![0xaa, 0x44, 0x12, 28, 0, 0, 0, 0, 0xff, 0xff];
    dat.extend_from_slice(&build_frame(308, WEEK, TOW_MS, &[]));

    let mut frames = FrameReader::new(&dat[..]);
    assert!(matches!(frames.next_frame(), Err(Error::Length { .. })));
    let frame = frames.next_frame().unwrap().unwrap();
    assert_eq!(frame.message_id(), 308);
    assert!(frames.next_frame().unwrap().is_none());
}
