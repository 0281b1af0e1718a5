pub mod checksum;
pub use checksum::*;
pub mod command;
pub use command::*;
pub mod framer;
pub use framer::*;
pub mod packet;
pub use packet::*;

use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, FromRepr};

use crate::wire_enum;

pub const PACKET_START_MARKER: u8 = 0xa5;
pub const PACKET_END_MARKER: u8 = 0xf5;

// Host -> device: START FUNC ARG ARG CHK END
pub const COMMAND_PACKET_SIZE: usize = 6;
pub const COMMAND_CHECKSUM_LEN: usize = 3;

// Device -> host: START 00 00 PW MO SL AT TT R8 FS RA OS RC RD TU WT CHK END
pub const STATE_PACKET_SIZE: usize = 18;
pub const STATE_CHECKSUM_LEN: usize = 15;

pub const MAX_PACKET_SIZE: usize = STATE_PACKET_SIZE;

/// Line settings of the unit's serial port. Fixed by the device, never negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
}

impl SerialSettings {
    pub const JHS: SerialSettings = SerialSettings {
        baud_rate: 9600,
        data_bits: 8,
        parity: Parity::None,
        stop_bits: 1,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Parity {
    None,
    Even,
    Odd,
}

// Last known state reported by the unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceState {
    pub power: bool,

    pub mode: Mode,

    // Sleep preset
    pub sleep: bool,

    // Louver swing
    pub oscillation: bool,

    // Both temperatures are in the unit given by `temperature_unit`
    pub ambient_temperature: u8,
    pub target_temperature: u8,

    pub fan_speed: FanSpeed,

    pub temperature_unit: TemperatureUnit,

    pub water_tank: WaterTank,

    // Unclassified bytes, named after their packet offset. Kept verbatim to help
    // with further reverse-engineering of the protocol.
    pub byte_08: u8,
    pub byte_0a: u8,
    pub byte_0c: u8,
    pub byte_0d: u8,
}

#[repr(u8)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, FromRepr, EnumIter, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Cool = 0x01,
    Dehumidify = 0x02,
    Fan = 0x03,
    Heat = 0x04,
}

#[repr(u8)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, FromRepr, EnumIter, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FanSpeed {
    Low = 0x01,
    Medium = 0x02,
    High = 0x03,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, FromRepr, EnumIter, AsRefStr)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    Celsius = 0x20,
    Fahrenheit = 0x24,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, FromRepr, EnumIter, AsRefStr)]
#[serde(rename_all = "snake_case")]
pub enum WaterTank {
    Empty = 0x00,
    Full = 0x03,
}

wire_enum!(Mode, FanSpeed, TemperatureUnit, WaterTank);
