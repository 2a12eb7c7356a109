//! CRC-64 used as the key derivation function for 64-bit strength.
//!
//! MSB-first table-driven CRC over the ECMA-182 polynomial, initial value and
//! final XOR all-ones, no reflection (the CRC-64/WE parameter set). Output is
//! the big-endian encoding of the register.

/// Generator polynomial, processed most significant bit first.
const POLYNOMIAL: u64 = 0x42F0_E1EB_A9EA_3693;

/// Initial register value and final XOR mask.
const INIT: u64 = 0xFFFF_FFFF_FFFF_FFFF;

/// Lookup table, computed at compile time.
const CRC64_TABLE: [u64; 256] = generate_table();

/// Each entry is its index shifted through 64 rounds of the polynomial.
const fn generate_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u64;
        let mut j = 0;
        while j < 64 {
            if crc & (1 << 63) == 0 {
                crc <<= 1;
            } else {
                crc = (crc << 1) ^ POLYNOMIAL;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Compute the CRC-64 of `data` as an integer.
#[inline]
pub fn checksum_u64(data: &[u8]) -> u64 {
    let mut crc = INIT;
    for &byte in data {
        let index = ((crc >> 56) ^ u64::from(byte)) & 0xFF;
        crc = (crc << 8) ^ CRC64_TABLE[index as usize];
    }
    crc ^ INIT
}

/// Compute the CRC-64 of `data` as 8 big-endian bytes.
///
/// This is the exact key (or IV) used for 64-bit strength.
#[inline]
pub fn checksum(data: &[u8]) -> [u8; 8] {
    checksum_u64(data).to_be_bytes()
}
