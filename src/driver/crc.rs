//! # Driver datagram CRC-8
//!
//! **Polynomial**: 0x07 (x^8 + x^2 + x + 1)
//! **Initial Value**: 0x00
//! **Bit order**: each byte is fed least-significant bit first.

/// CRC-8 polynomial.
const CRC8_POLY: u8 = 0x07;

/// MSB-first lookup table. Bytes are bit-reversed on the way in.
const CRC8_TABLE: [u8; 256] = generate_crc8_table();

const fn generate_crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ CRC8_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Datagram CRC using the lookup table.
pub fn crc8(data: &[u8]) -> u8 {
    data.iter()
        .fold(0u8, |crc, &byte| CRC8_TABLE[(crc ^ byte.reverse_bits()) as usize])
}

/// Datagram CRC, one bit at a time as the chip documents it.
pub fn crc8_bitwise(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;

    for &byte in data {
        let mut current = byte;
        for _ in 0..8 {
            if ((crc >> 7) ^ (current & 0x01)) != 0 {
                crc = (crc << 1) ^ CRC8_POLY;
            } else {
                crc <<= 1;
            }
            current >>= 1;
        }
    }

    crc
}
