//! Frame checksum primitive.

use crc::{Algorithm, Crc};

/// CRC-32 as computed by the receiver: reflected polynomial 0x04C11DB7
/// with zero initial value and zero final xor.
const CRC32_ALG: Algorithm<u32> = Algorithm {
    width: 32,
    poly: 0x04c1_1db7,
    init: 0x0000_0000,
    refin: true,
    refout: true,
    xorout: 0x0000_0000,
    check: 0x2dfd_2d88,
    residue: 0x0000_0000,
};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC32_ALG);

/// Checksum over `dat`, as appended (little-endian) to every frame.
#[must_use]
pub fn checksum(dat: &[u8]) -> u32 {
    CRC32.checksum(dat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    /// Bitwise reference implementation.
    fn reference(dat: &[u8]) -> u32 {
        let mut crc = 0u32;
        for &b in dat {
            crc ^= u32::from(b);
            for _ in 0..8 {
                crc = if crc & 1 == 1 {
                    (crc >> 1) ^ 0xedb8_8320
                } else {
                    crc >> 1
                };
            }
        }
        crc
    }

    #[test]
    fn known_value() {
        assert_eq!(checksum(b"123456789"), 0x2dfd_2d88);
    }

    #[test]
    fn empty_header() {
        // 28-byte header: sync + header length, everything else zero
        let mut dat = hex::decode("aa44121c").unwrap();
        dat.resize(28, 0);
        assert_eq!(checksum(&dat), 0x11de_1197);
    }

    #[test]
    fn matches_reference() {
        let mut rng = rand::thread_rng();
        for len in [0usize, 1, 3, 28, 100, 1024] {
            let dat: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            assert_eq!(checksum(&dat), reference(&dat), "len={len}");
        }
    }

    #[test]
    fn single_bit_corruption_detected() {
        let mut rng = rand::thread_rng();
        let dat: Vec<u8> = (0..256).map(|_| rng.gen()).collect();
        let good = checksum(&dat);
        for _ in 0..64 {
            let mut bad = dat.clone();
            let bit = rng.gen_range(0..bad.len() * 8);
            bad[bit / 8] ^= 1 << (bit % 8);
            assert_ne!(checksum(&bad), good);
        }
    }
}
