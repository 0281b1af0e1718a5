use strum::{AsRefStr, EnumIter, EnumString, FromRepr};
use thiserror::Error;

use super::{
    command_checksum, FanSpeed, Mode, PacketError, COMMAND_PACKET_SIZE, PACKET_END_MARKER,
    PACKET_START_MARKER,
};
use crate::stream::{ByteReader, ByteWriter, StreamError};
use crate::wire_enum;

pub type CommandPacket = [u8; COMMAND_PACKET_SIZE];

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, EnumIter, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Function {
    Power = 0x11,
    Mode = 0x12,
    Sleep = 0x13,
    Temperature = 0x14,
    Oscillation = 0x15,
    FanSpeed = 0x16,
}

wire_enum!(Function);

/// A single control request for the unit. Every variant carries exactly one
/// argument, which goes on the wire as one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Power(bool),
    Mode(Mode),
    Sleep(bool),
    // Raw setpoint, truncated to a byte when encoded
    Temperature(i32),
    FanSpeed(FanSpeed),
    Oscillation(bool),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("invalid switch value {0:?}, expected on/off")]
    InvalidSwitch(String),
    #[error("invalid mode {0:?}")]
    InvalidMode(String),
    #[error("invalid fan speed {0:?}")]
    InvalidFanSpeed(String),
    #[error("invalid temperature {0:?}")]
    InvalidTemperature(String),
}

impl Command {
    pub fn function(&self) -> Function {
        match self {
            Command::Power(_) => Function::Power,
            Command::Mode(_) => Function::Mode,
            Command::Sleep(_) => Function::Sleep,
            Command::Temperature(_) => Function::Temperature,
            Command::FanSpeed(_) => Function::FanSpeed,
            Command::Oscillation(_) => Function::Oscillation,
        }
    }

    pub fn argument(&self) -> u8 {
        match *self {
            Command::Power(on) | Command::Sleep(on) | Command::Oscillation(on) => u8::from(on),
            Command::Mode(mode) => mode as u8,
            Command::FanSpeed(speed) => speed as u8,
            Command::Temperature(value) => value as u8,
        }
    }

    /// Appends the 6-byte command packet to `writer`, or nothing if it does not fit.
    pub fn encode(&self, writer: &mut ByteWriter) -> Result<(), StreamError> {
        serialize_command(writer, self.function(), self.argument())
    }

    /// The command as a standalone packet.
    pub fn to_packet(&self) -> Result<CommandPacket, StreamError> {
        let mut packet = [0u8; COMMAND_PACKET_SIZE];
        self.encode(&mut ByteWriter::new(&mut packet))?;
        Ok(packet)
    }

    /// Parses a command packet as sent by a controller.
    pub fn decode(packet: &[u8]) -> Result<Self, PacketError> {
        if packet.len() != COMMAND_PACKET_SIZE {
            return Err(PacketError::InvalidLength {
                expected: COMMAND_PACKET_SIZE,
                actual: packet.len(),
            });
        }

        let mut reader = ByteReader::new(packet);
        expect_marker(&mut reader, PACKET_START_MARKER)?;
        let function: Function = reader.read()?;
        let argument: u8 = reader.read()?;
        let repeated: u8 = reader.read()?;
        if argument != repeated {
            return Err(PacketError::ArgumentMismatch(argument, repeated));
        }

        let received: u8 = reader.read()?;
        let calculated = command_checksum(packet)?;
        if received != calculated {
            return Err(PacketError::ChecksumMismatch {
                received,
                calculated,
            });
        }
        expect_marker(&mut reader, PACKET_END_MARKER)?;

        let byte = [argument];
        let mut argument = ByteReader::new(&byte);
        Ok(match function {
            Function::Power => Command::Power(argument.read()?),
            Function::Mode => Command::Mode(argument.read()?),
            Function::Sleep => Command::Sleep(argument.read()?),
            Function::Temperature => Command::Temperature(i32::from(byte[0])),
            Function::Oscillation => Command::Oscillation(argument.read()?),
            Function::FanSpeed => Command::FanSpeed(argument.read()?),
        })
    }

    /// Builds a command from a function and a human readable value such as
    /// `on`, `cool`, `high` or `24`.
    pub fn parse(function: Function, value: &str) -> Result<Self, ParseCommandError> {
        let switch = || match value {
            "on" | "true" | "1" => Ok(true),
            "off" | "false" | "0" => Ok(false),
            _ => Err(ParseCommandError::InvalidSwitch(value.into())),
        };

        Ok(match function {
            Function::Power => Command::Power(switch()?),
            Function::Sleep => Command::Sleep(switch()?),
            Function::Oscillation => Command::Oscillation(switch()?),
            Function::Mode => Command::Mode(
                value
                    .parse()
                    .map_err(|_| ParseCommandError::InvalidMode(value.into()))?,
            ),
            Function::FanSpeed => Command::FanSpeed(
                value
                    .parse()
                    .map_err(|_| ParseCommandError::InvalidFanSpeed(value.into()))?,
            ),
            Function::Temperature => Command::Temperature(
                value
                    .parse()
                    .map_err(|_| ParseCommandError::InvalidTemperature(value.into()))?,
            ),
        })
    }
}

/// Writes `START FUNC ARG ARG CHK END`. The argument is sent twice; the unit
/// expects the redundancy.
pub fn serialize_command(
    writer: &mut ByteWriter,
    function: Function,
    argument: u8,
) -> Result<(), StreamError> {
    let mut frame = [0u8; COMMAND_PACKET_SIZE];
    let mut staging = ByteWriter::new(&mut frame);

    staging.write(&PACKET_START_MARKER)?;
    staging.write(&function)?;
    for _ in 0..2 {
        staging.write(&argument)?;
    }
    let checksum = command_checksum(staging.written())?;
    staging.write(&checksum)?;
    staging.write(&PACKET_END_MARKER)?;

    writer.write_bytes(&frame)
}

fn expect_marker(reader: &mut ByteReader, marker: u8) -> Result<(), PacketError> {
    let offset = reader.position();
    let value: u8 = reader.read()?;
    if value != marker {
        return Err(PacketError::UnexpectedMarker { offset, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use strum::IntoEnumIterator;

    fn all_commands() -> Vec<Command> {
        let mut commands = vec![
            Command::Power(true),
            Command::Power(false),
            Command::Sleep(true),
            Command::Oscillation(false),
            Command::Temperature(16),
            Command::Temperature(31),
        ];
        commands.extend(Mode::iter().map(Command::Mode));
        commands.extend(FanSpeed::iter().map(Command::FanSpeed));
        commands
    }

    #[test]
    fn test_encode_known_packets() {
        let cases = [
            (Command::Power(true), hex!("a5 11 01 01 13 f5")),
            (Command::Power(false), hex!("a5 11 00 00 11 f5")),
            (Command::Mode(Mode::Cool), hex!("a5 12 01 01 14 f5")),
            (Command::Mode(Mode::Fan), hex!("a5 12 03 03 18 f5")),
            (Command::Sleep(true), hex!("a5 13 01 01 15 f5")),
            (Command::Temperature(24), hex!("a5 14 18 18 44 f5")),
            (Command::Oscillation(true), hex!("a5 15 01 01 17 f5")),
            (Command::FanSpeed(FanSpeed::High), hex!("a5 16 03 03 1c f5")),
        ];

        for (command, expected) in cases {
            let mut buf = [0u8; 16];
            let mut writer = ByteWriter::new(&mut buf);
            command.encode(&mut writer).unwrap();
            assert_eq!(writer.written(), &expected, "{:?}", command);
            assert_eq!(command.to_packet(), Ok(expected), "{:?}", command);
        }
    }

    #[test]
    fn test_encoded_frame_shape() {
        for command in all_commands() {
            let packet = command.to_packet().unwrap();
            assert_eq!(packet.len(), COMMAND_PACKET_SIZE);
            assert_eq!(packet[0], PACKET_START_MARKER);
            assert_eq!(packet[5], PACKET_END_MARKER);
            assert_eq!(packet[2], packet[3]);
            assert_eq!(command_checksum(&packet), Ok(packet[4]));
        }
    }

    #[test]
    fn test_to_packet_uses_shared_framing() {
        for command in all_commands() {
            let mut buf = [0u8; COMMAND_PACKET_SIZE];
            let mut writer = ByteWriter::new(&mut buf);
            serialize_command(&mut writer, command.function(), command.argument()).unwrap();
            assert_eq!(command.to_packet(), Ok(buf), "{:?}", command);
        }
    }

    #[test]
    fn test_encode_into_small_buffer_writes_nothing() {
        let mut buf = [0u8; 5];
        let mut writer = ByteWriter::new(&mut buf);
        assert!(Command::Power(true).encode(&mut writer).is_err());
        assert!(writer.is_empty());
        assert_eq!(buf, [0u8; 5]);
    }

    #[test]
    fn test_temperature_is_truncated() {
        assert_eq!(Command::Temperature(0x1_19).argument(), 0x19);
        assert_eq!(Command::Temperature(-1).argument(), 0xff);
    }

    #[test]
    fn test_decode() {
        for command in all_commands() {
            assert_eq!(Command::decode(&command.to_packet().unwrap()), Ok(command));
        }

        assert_eq!(
            Command::decode(&hex!("a5 11 01 00 12 f5")),
            Err(PacketError::ArgumentMismatch(0x01, 0x00))
        );
        assert_eq!(
            Command::decode(&hex!("a5 11 01 01 14 f5")),
            Err(PacketError::ChecksumMismatch {
                received: 0x14,
                calculated: 0x13
            })
        );
        assert_eq!(
            Command::decode(&hex!("a5 11 01 01 13 00")),
            Err(PacketError::UnexpectedMarker {
                offset: 5,
                value: 0x00
            })
        );
        assert!(Command::decode(&hex!("a5 17 01 01 19 f5")).is_err());
        assert!(Command::decode(&hex!("a5 12 09 09 24 f5")).is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!(Function::iter().count(), 6);
        assert_eq!("fan_speed".parse::<Function>().unwrap(), Function::FanSpeed);
        assert_eq!(
            Command::parse(Function::Power, "on"),
            Ok(Command::Power(true))
        );
        assert_eq!(
            Command::parse(Function::Mode, "dehumidify"),
            Ok(Command::Mode(Mode::Dehumidify))
        );
        assert_eq!(
            Command::parse(Function::Temperature, "22"),
            Ok(Command::Temperature(22))
        );
        assert_eq!(
            Command::parse(Function::FanSpeed, "turbo"),
            Err(ParseCommandError::InvalidFanSpeed("turbo".into()))
        );
        assert!(Command::parse(Function::Sleep, "maybe").is_err());
    }
}
