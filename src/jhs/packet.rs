use thiserror::Error;

use super::{
    state_checksum, validate_state_checksum, DeviceState, PACKET_END_MARKER, PACKET_START_MARKER,
    STATE_PACKET_SIZE,
};
use crate::stream::{ByteReader, ByteWriter, StreamError};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketError {
    #[error("malformed packet: {0}")]
    Stream(#[from] StreamError),

    #[error("expected a {expected} byte packet, got {actual} bytes")]
    InvalidLength { expected: usize, actual: usize },

    #[error("unexpected byte {value:#04x} at marker offset {offset}")]
    UnexpectedMarker { offset: usize, value: u8 },

    #[error("repeated argument mismatch: {0:#04x} != {1:#04x}")]
    ArgumentMismatch(u8, u8),

    #[error("checksum mismatch: received {received:#04x}, calculated {calculated:#04x}")]
    ChecksumMismatch { received: u8, calculated: u8 },
}

/// A decoded state packet together with the checksum it carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatePacket {
    pub state: DeviceState,
    pub checksum: u8,
}

/*
Offset  Contents
0x00    start marker (0xa5)
0x01-02 blank
0x03    power
0x04    mode
0x05    sleep
0x06    ambient temperature
0x07    target temperature
0x08    unclassified
0x09    fan speed
0x0a    unclassified
0x0b    oscillation
0x0c-0d unclassified
0x0e    temperature unit
0x0f    water tank
0x10    checksum over 0x01..=0x0f
0x11    end marker (0xf5)
*/
impl StatePacket {
    /// Positionally decodes a framed state packet. The checksum is extracted
    /// but not validated, see [`StatePacket::decode_validated`].
    ///
    /// An enumerated field holding an unknown value fails the whole decode.
    pub fn decode(packet: &[u8]) -> Result<Self, PacketError> {
        if packet.len() != STATE_PACKET_SIZE {
            return Err(PacketError::InvalidLength {
                expected: STATE_PACKET_SIZE,
                actual: packet.len(),
            });
        }

        let mut reader = ByteReader::new(packet);
        reader.skip(3)?;
        let power = reader.read()?;
        let mode = reader.read()?;
        let sleep = reader.read()?;
        let ambient_temperature = reader.read()?;
        let target_temperature = reader.read()?;
        let byte_08 = reader.read()?;
        let fan_speed = reader.read()?;
        let byte_0a = reader.read()?;
        let oscillation = reader.read()?;
        let byte_0c = reader.read()?;
        let byte_0d = reader.read()?;
        let temperature_unit = reader.read()?;
        let water_tank = reader.read()?;
        let checksum = reader.read()?;
        reader.skip(1)?;

        Ok(StatePacket {
            state: DeviceState {
                power,
                mode,
                sleep,
                oscillation,
                ambient_temperature,
                target_temperature,
                fan_speed,
                temperature_unit,
                water_tank,
                byte_08,
                byte_0a,
                byte_0c,
                byte_0d,
            },
            checksum,
        })
    }

    /// Decodes and then checks the embedded checksum against the packet body.
    pub fn decode_validated(packet: &[u8]) -> Result<Self, PacketError> {
        let decoded = Self::decode(packet)?;
        validate_state_checksum(packet, decoded.checksum)?;
        Ok(decoded)
    }

    /// Builds the packet the unit would send for `state`, with a correct checksum.
    pub fn encode(state: &DeviceState) -> Result<[u8; STATE_PACKET_SIZE], StreamError> {
        let mut packet = [0u8; STATE_PACKET_SIZE];
        let mut writer = ByteWriter::new(&mut packet);
        write_state_body(&mut writer, state)?;

        let checksum = state_checksum(writer.written())?;
        writer.write(&checksum)?;
        writer.write(&PACKET_END_MARKER)?;
        Ok(packet)
    }
}

fn write_state_body(writer: &mut ByteWriter, state: &DeviceState) -> Result<(), StreamError> {
    writer.write(&PACKET_START_MARKER)?;
    writer.write_bytes(&[0x00, 0x00])?;
    writer.write(&state.power)?;
    writer.write(&state.mode)?;
    writer.write(&state.sleep)?;
    writer.write(&state.ambient_temperature)?;
    writer.write(&state.target_temperature)?;
    writer.write(&state.byte_08)?;
    writer.write(&state.fan_speed)?;
    writer.write(&state.byte_0a)?;
    writer.write(&state.oscillation)?;
    writer.write(&state.byte_0c)?;
    writer.write(&state.byte_0d)?;
    writer.write(&state.temperature_unit)?;
    writer.write(&state.water_tank)
}
