//! The 8-byte addressed packet sent over infrared.
//!
//! Layout: `[0x55, group, unit, opcode, arg0, arg1, arg2, checksum]` where
//! the checksum is the 8-bit sum of bytes 0 to 6. Colorspot packets reuse the
//! unit byte as a marker (`0xFE` set, `0xFD` play).

use crate::types::Command;

/// Start byte of every datagram.
pub const START_BYTE: u8 = 0x55;

/// Unit address marking a "set colorspot" datagram.
pub const SET_COLORSPOT_UNIT: u8 = 0xFE;

/// Unit address marking a "play colorspot" datagram.
pub const PLAY_COLORSPOT_UNIT: u8 = 0xFD;

/// Datagram length in bytes.
pub const DATAGRAM_LEN: usize = 8;

/// An 8-byte infrared datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Datagram([u8; DATAGRAM_LEN]);

impl Datagram {
    /// Builds a datagram from the seven payload bytes and appends the checksum.
    pub fn seal(payload: [u8; DATAGRAM_LEN - 1]) -> Self {
        let mut bytes = [0u8; DATAGRAM_LEN];
        bytes[..DATAGRAM_LEN - 1].copy_from_slice(&payload);
        bytes[DATAGRAM_LEN - 1] = checksum(&payload);
        Self(bytes)
    }

    /// Wraps eight bytes verbatim, without touching the checksum.
    #[inline]
    pub const fn from_bytes(bytes: [u8; DATAGRAM_LEN]) -> Self {
        Self(bytes)
    }

    /// Generic passthrough: `{0x55, group, unit, opcode, a0, a1, a2, chk}`.
    pub fn command(group: u8, unit: u8, command: Command) -> Self {
        let [a0, a1, a2] = command.args;
        Self::seal([START_BYTE, group, unit, command.opcode, a0, a1, a2])
    }

    /// `{0x55, group, 0xFE, position, r, g, b, chk}`.
    pub fn set_colorspot(group: u8, position: u8, rgb: [u8; 3]) -> Self {
        let [r, g, b] = rgb;
        Self::seal([START_BYTE, group, SET_COLORSPOT_UNIT, position, r, g, b])
    }

    /// `{0x55, group, 0xFD, position, opcode, 0, 0, chk}`.
    pub fn play_colorspot(group: u8, position: u8, opcode: u8) -> Self {
        Self::seal([START_BYTE, group, PLAY_COLORSPOT_UNIT, position, opcode, 0, 0])
    }

    /// Returns the raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; DATAGRAM_LEN] {
        &self.0
    }

    /// Returns true if the last byte is the sum of the first seven.
    pub fn is_valid(&self) -> bool {
        self.0[DATAGRAM_LEN - 1] == checksum(&self.0[..DATAGRAM_LEN - 1])
    }
}

/// Unsigned 8-bit sum of `bytes`, wrapping.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_wraps_mod_256() {
        assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn documented_fade_to_purple_packet() {
        // 0x55,0,0,'c',0xff,0x00,0xff -> 0xb6
        let dg = Datagram::command(0, 0, Command::new(b'c', [0xFF, 0x00, 0xFF]));
        assert_eq!(dg.as_bytes()[7], 0xB6);
        assert!(dg.is_valid());
    }

    #[test]
    fn documented_colorspot_packets() {
        let set = Datagram::set_colorspot(0, 3, [0x00, 0xFF, 0xFF]);
        assert_eq!(set.as_bytes(), &[0x55, 0, 0xFE, 3, 0x00, 0xFF, 0xFF, 0x54]);

        let play = Datagram::play_colorspot(0, 3, 0);
        assert_eq!(play.as_bytes(), &[0x55, 0, 0xFD, 3, 0, 0, 0, 0x55]);
    }

    #[test]
    fn verbatim_datagram_keeps_bad_checksum() {
        let dg = Datagram::from_bytes([1, 2, 3, 4, 5, 6, 7, 0]);
        assert!(!dg.is_valid());
        assert_eq!(dg.as_bytes()[7], 0);
    }
}
