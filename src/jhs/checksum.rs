use super::{PacketError, COMMAND_CHECKSUM_LEN, STATE_CHECKSUM_LEN};
use crate::stream::{ByteReader, StreamError};

/// Sum modulo 256 of the `body_len` bytes following the start marker.
///
/// The start marker, the checksum byte and the end marker are never covered.
pub fn checksum(packet: &[u8], body_len: usize) -> Result<u8, StreamError> {
    let mut reader = ByteReader::new(packet);
    reader.skip(1)?;

    let mut sum: u8 = 0;
    for _ in 0..body_len {
        sum = sum.wrapping_add(reader.read::<u8>()?);
    }
    Ok(sum)
}

pub fn command_checksum(packet: &[u8]) -> Result<u8, StreamError> {
    checksum(packet, COMMAND_CHECKSUM_LEN)
}

pub fn state_checksum(packet: &[u8]) -> Result<u8, StreamError> {
    checksum(packet, STATE_CHECKSUM_LEN)
}

/// Recomputes the checksum of a state packet and compares it with the one it carried.
pub fn validate_state_checksum(packet: &[u8], received: u8) -> Result<(), PacketError> {
    let calculated = state_checksum(packet)?;
    if calculated != received {
        return Err(PacketError::ChecksumMismatch {
            received,
            calculated,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_command_checksum() {
        // Power on
        assert_eq!(command_checksum(&hex!("a5 11 01 01 13 f5")), Ok(0x13));
        // Temperature 24
        assert_eq!(command_checksum(&hex!("a5 14 18 18 44 f5")), Ok(0x44));
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(checksum(&hex!("a5 ff ff ff"), 3), Ok(0xfd));
    }

    #[test]
    fn test_checksum_on_short_packet() {
        assert!(checksum(&hex!("a5 11"), 3).is_err());
        assert!(checksum(&[], 0).is_err());
    }

    #[test]
    fn test_validate_state_checksum() {
        let packet = hex!("a5 00 00 01 01 00 19 18 00 02 00 01 00 00 20 00 56 f5");
        assert_eq!(validate_state_checksum(&packet, 0x56), Ok(()));
        assert_eq!(
            validate_state_checksum(&packet, 0x7b),
            Err(PacketError::ChecksumMismatch {
                received: 0x7b,
                calculated: 0x56
            })
        );
    }
}
