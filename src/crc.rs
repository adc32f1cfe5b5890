//! Sensirion CRC-8: polynomial 0x31, init 0xff, MSB first, no reflection,
//! no final XOR.
//!
//! See the SGP41 datasheet, section "Checksum Calculation".

const POLYNOMIAL: u8 = 0x31;
const INIT: u8 = 0xff;

pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = INIT;

    for byte in data {
        crc ^= byte;

        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ POLYNOMIAL;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}

pub fn check_crc(data: &[u8], crc: u8) -> bool {
    crc8(data) == crc
}

/// Encodes a word as a big-endian triplet: two data bytes and their CRC.
pub fn encode_word(word: u16) -> [u8; 3] {
    let [hi, lo] = word.to_be_bytes();
    [hi, lo, crc8(&[hi, lo])]
}

/// Decodes a triplet, returning `None` if the checksum does not match.
pub fn decode_word(triplet: &[u8; 3]) -> Option<u16> {
    if check_crc(&triplet[..2], triplet[2]) {
        Some(u16::from_be_bytes([triplet[0], triplet[1]]))
    } else {
        None
    }
}
