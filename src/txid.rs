//! Transaction ID Helpers
//!
//! Centralized handling of the two txid byte orders.
//!
//! BYTE ORDERS:
//! - Display order: what explorers and the Blockchair dumps print as hex
//! - Internal order: what block files and merkle trees consume
//!
//! The two are a full reversal of the 32-byte array. Never reinterpret the
//! bytes as integers to convert between them.

use std::fmt;

use crate::constants::TXID_LEN;

/// 32-byte transaction id, stored in internal byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Txid([u8; TXID_LEN]);

impl Txid {
    /// Parse a display-order hex txid (64 chars, either case).
    ///
    /// Fails on odd length, non-hex characters, or any decoded length
    /// other than 32 bytes.
    pub fn from_display_hex<T: AsRef<[u8]>>(hex: T) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; TXID_LEN];
        hex::decode_to_slice(hex, &mut bytes)?;
        bytes.reverse();
        Ok(Txid(bytes))
    }

    /// Wrap bytes that are already in internal order
    pub fn from_internal_bytes(bytes: [u8; TXID_LEN]) -> Self {
        Txid(bytes)
    }

    /// Internal-order bytes, as written to block files
    pub fn as_bytes(&self) -> &[u8; TXID_LEN] {
        &self.0
    }

    /// Display-order bytes
    pub fn to_display_bytes(&self) -> [u8; TXID_LEN] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }

    pub fn to_display_hex(&self) -> String {
        hex::encode(self.to_display_bytes())
    }
}

impl fmt::LowerHex for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Bitcoin block 170, the first non-coinbase transaction
    const BLOCK_170_TX: &str = "f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16";

    #[test]
    fn test_from_display_hex_reverses() {
        let txid = Txid::from_display_hex(BLOCK_170_TX).unwrap();
        let bytes = txid.as_bytes();
        assert_eq!(bytes[0], 0x16);
        assert_eq!(bytes[1], 0x9e);
        assert_eq!(bytes[31], 0xf4);
    }

    #[test]
    fn test_display_round_trip() {
        let txid = Txid::from_display_hex(BLOCK_170_TX).unwrap();
        assert_eq!(txid.to_display_hex(), BLOCK_170_TX);
        assert_eq!(txid.to_string(), BLOCK_170_TX);
        assert_eq!(format!("{:x}", txid), BLOCK_170_TX);
    }

    #[test]
    fn test_uppercase_accepted() {
        let upper = BLOCK_170_TX.to_uppercase();
        let txid = Txid::from_display_hex(&upper).unwrap();
        assert_eq!(txid.to_display_hex(), BLOCK_170_TX);
    }

    #[test]
    fn test_full_reversal_not_word_swap() {
        let mut display = [0u8; TXID_LEN];
        for (i, b) in display.iter_mut().enumerate() {
            *b = i as u8;
        }
        let txid = Txid::from_display_hex(hex::encode(display)).unwrap();
        let expected: Vec<u8> = (0..TXID_LEN as u8).rev().collect();
        assert_eq!(txid.as_bytes().to_vec(), expected);
        assert_eq!(txid.to_display_bytes(), display);
    }

    #[test]
    fn test_odd_length_rejected() {
        let err = Txid::from_display_hex(&BLOCK_170_TX[..63]).unwrap_err();
        assert_eq!(err, hex::FromHexError::OddLength);
    }

    #[test]
    fn test_short_rejected() {
        let err = Txid::from_display_hex(&BLOCK_170_TX[..62]).unwrap_err();
        assert_eq!(err, hex::FromHexError::InvalidStringLength);
    }

    #[test]
    fn test_long_rejected() {
        let long = format!("{}00", BLOCK_170_TX);
        let err = Txid::from_display_hex(long).unwrap_err();
        assert_eq!(err, hex::FromHexError::InvalidStringLength);
    }

    #[test]
    fn test_non_hex_rejected() {
        let bad = format!("zz{}", &BLOCK_170_TX[2..]);
        let err = Txid::from_display_hex(bad).unwrap_err();
        assert!(matches!(err, hex::FromHexError::InvalidHexCharacter { c: 'z', index: 0 }));
    }

    #[test]
    fn test_internal_bytes_identity() {
        let bytes = [0xabu8; TXID_LEN];
        let txid = Txid::from_internal_bytes(bytes);
        assert_eq!(txid.as_bytes(), &bytes);
    }
}
