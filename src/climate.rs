//! The thermostat-style vocabulary the driver speaks to the outside world, and
//! the tables mapping it to and from the unit's own protocol values.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};
use tracing::warn;

use crate::jhs::{Command, DeviceState, FanSpeed, Mode, WaterTank};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClimateMode {
    Off,
    Cool,
    Heat,
    Dry,
    FanOnly,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClimateFanMode {
    Low,
    Medium,
    High,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClimatePreset {
    None,
    Sleep,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClimateSwingMode {
    Off,
    Vertical,
}

/// Published view of the unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClimateState {
    pub mode: ClimateMode,
    pub fan_mode: ClimateFanMode,
    pub preset: ClimatePreset,
    pub swing_mode: ClimateSwingMode,
    pub target_temperature: f32,
    pub current_temperature: f32,
}

impl From<&DeviceState> for ClimateState {
    fn from(state: &DeviceState) -> Self {
        Self {
            mode: if state.power {
                state.mode.into()
            } else {
                ClimateMode::Off
            },
            fan_mode: state.fan_speed.into(),
            preset: if state.sleep {
                ClimatePreset::Sleep
            } else {
                ClimatePreset::None
            },
            swing_mode: if state.oscillation {
                ClimateSwingMode::Vertical
            } else {
                ClimateSwingMode::Off
            },
            target_temperature: f32::from(state.target_temperature),
            current_temperature: f32::from(state.ambient_temperature),
        }
    }
}

impl From<Mode> for ClimateMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Cool => ClimateMode::Cool,
            Mode::Dehumidify => ClimateMode::Dry,
            Mode::Fan => ClimateMode::FanOnly,
            Mode::Heat => ClimateMode::Heat,
        }
    }
}

impl From<FanSpeed> for ClimateFanMode {
    fn from(speed: FanSpeed) -> Self {
        match speed {
            FanSpeed::Low => ClimateFanMode::Low,
            FanSpeed::Medium => ClimateFanMode::Medium,
            FanSpeed::High => ClimateFanMode::High,
        }
    }
}

impl From<ClimateFanMode> for FanSpeed {
    fn from(mode: ClimateFanMode) -> Self {
        match mode {
            ClimateFanMode::Low => FanSpeed::Low,
            ClimateFanMode::Medium => FanSpeed::Medium,
            ClimateFanMode::High => FanSpeed::High,
        }
    }
}

impl ClimateMode {
    /// Device mode for this climate mode, `None` for `Off`.
    pub fn device_mode(self) -> Option<Mode> {
        match self {
            ClimateMode::Off => None,
            ClimateMode::Cool => Some(Mode::Cool),
            ClimateMode::Dry => Some(Mode::Dehumidify),
            ClimateMode::FanOnly => Some(Mode::Fan),
            ClimateMode::Heat => Some(Mode::Heat),
        }
    }
}

/// Wet/dry signal published next to the climate state.
pub fn water_tank_full(state: &DeviceState) -> bool {
    state.water_tank == WaterTank::Full
}

/// A control request. Every field is optional and handled independently.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClimateCall {
    pub mode: Option<ClimateMode>,
    pub fan_mode: Option<ClimateFanMode>,
    pub preset: Option<ClimatePreset>,
    pub swing_mode: Option<ClimateSwingMode>,
    pub target_temperature: Option<f32>,
}

impl ClimateCall {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: ClimateMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_fan_mode(mut self, fan_mode: ClimateFanMode) -> Self {
        self.fan_mode = Some(fan_mode);
        self
    }

    pub fn with_preset(mut self, preset: ClimatePreset) -> Self {
        self.preset = Some(preset);
        self
    }

    pub fn with_swing_mode(mut self, swing_mode: ClimateSwingMode) -> Self {
        self.swing_mode = Some(swing_mode);
        self
    }

    pub fn with_target_temperature(mut self, temperature: f32) -> Self {
        self.target_temperature = Some(temperature);
        self
    }
}

/// Capability set. Requests outside of it are never translated into commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateTraits {
    pub min_temperature: f32,
    pub max_temperature: f32,
    pub temperature_step: f32,
    pub modes: Vec<ClimateMode>,
    pub fan_modes: Vec<ClimateFanMode>,
    pub presets: Vec<ClimatePreset>,
    pub swing_modes: Vec<ClimateSwingMode>,
}

impl Default for ClimateTraits {
    fn default() -> Self {
        Self {
            min_temperature: 16.0,
            max_temperature: 31.0,
            temperature_step: 1.0,
            modes: vec![
                ClimateMode::Off,
                ClimateMode::Cool,
                ClimateMode::Dry,
                ClimateMode::FanOnly,
            ],
            fan_modes: vec![ClimateFanMode::Low, ClimateFanMode::High],
            presets: vec![ClimatePreset::None, ClimatePreset::Sleep],
            swing_modes: vec![],
        }
    }
}

impl ClimateTraits {
    /// Translates `call` into the commands to send, in order. `powered` is the
    /// last known power state; an unknown state counts as off.
    pub fn translate(&self, call: &ClimateCall, powered: bool) -> Vec<Command> {
        let mut commands = Vec::new();

        if let Some(mode) = call.mode {
            if self.modes.contains(&mode) {
                let waking_up = !powered && mode != ClimateMode::Off;
                let turning_off = mode == ClimateMode::Off;

                // The unit has to be on before it accepts a mode change
                if waking_up || turning_off {
                    commands.push(Command::Power(waking_up));
                }
                if let Some(device_mode) = mode.device_mode() {
                    commands.push(Command::Mode(device_mode));
                }
            } else {
                warn!(mode = mode.as_ref(), "unsupported mode requested, ignoring");
            }
        }

        if let Some(fan_mode) = call.fan_mode {
            if self.fan_modes.contains(&fan_mode) {
                commands.push(Command::FanSpeed(fan_mode.into()));
            } else {
                warn!(fan_mode = fan_mode.as_ref(), "unsupported fan mode requested, ignoring");
            }
        }

        if let Some(preset) = call.preset {
            if self.presets.contains(&preset) {
                commands.push(Command::Sleep(preset == ClimatePreset::Sleep));
            } else {
                warn!(preset = preset.as_ref(), "unsupported preset requested, ignoring");
            }
        }

        if let Some(swing_mode) = call.swing_mode {
            if self.swing_modes.contains(&swing_mode) {
                commands.push(Command::Oscillation(swing_mode == ClimateSwingMode::Vertical));
            } else {
                warn!(swing_mode = swing_mode.as_ref(), "unsupported swing mode requested, ignoring");
            }
        }

        if let Some(temperature) = call.target_temperature {
            if (self.min_temperature..=self.max_temperature).contains(&temperature) {
                commands.push(Command::Temperature(temperature as i32));
            } else {
                warn!(
                    temperature,
                    min = self.min_temperature,
                    max = self.max_temperature,
                    "target temperature out of range, ignoring"
                );
            }
        }

        commands
    }
}
