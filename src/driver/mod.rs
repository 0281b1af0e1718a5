//! Tick-driven orchestration: serial bytes in, framed and validated device
//! state out; climate requests in, paced command packets out.
//!
//! Everything runs in the caller's scheduling context. Nothing blocks and no
//! failure stops the loop: bad packets and rejected commands are logged,
//! counted, and dropped.

pub mod clock;
pub use clock::*;
pub mod transport;
pub use transport::*;

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn, Level};

use crate::climate::{water_tank_full, ClimateCall, ClimateState, ClimateTraits};
use crate::config::Config;
use crate::jhs::{
    validate_state_checksum, Command, DeviceState, PacketFramer, SerialSettings, StatePacket,
    FRAMER_CAPACITY, MAX_PACKET_SIZE,
};
use crate::ring::RingBuffer;
use crate::stream::{ByteWriter, StreamError};

pub const RX_QUEUE_CAPACITY: usize = 128;
pub const TX_QUEUE_CAPACITY: usize = 8;
pub const DEFAULT_COMMAND_INTERVAL: Duration = Duration::from_millis(100);

/// An encoded packet waiting for transmission.
pub type OutboundPacket = heapless::Vec<u8, MAX_PACKET_SIZE>;

/// Receives the public view of the unit after every validated state packet.
pub trait StateSink {
    fn publish_climate(&mut self, state: &ClimateState);

    fn publish_water_tank(&mut self, _full: bool) {}
}

impl StateSink for () {
    fn publish_climate(&mut self, _state: &ClimateState) {}
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    #[error("command queue is full")]
    QueueFull,

    #[error("packet of {0} bytes exceeds the {} byte limit", MAX_PACKET_SIZE)]
    PacketTooLarge(usize),

    #[error("failed to encode command: {0}")]
    Encode(#[from] StreamError),
}

/// Cumulative counters since the driver was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DriverStats {
    pub bytes_received: u64,
    pub frames: u64,
    pub states: u64,
    pub decode_failures: u64,
    pub checksum_failures: u64,
    pub commands_queued: u64,
    pub commands_dropped: u64,
    pub commands_sent: u64,
    pub transport_errors: u64,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub bytes_read: usize,
    pub states: usize,
    pub rejected: usize,
    pub sent: bool,
}

pub struct Driver<T, C = MonotonicClock> {
    transport: T,
    clock: C,
    command_interval: Duration,
    traits: ClimateTraits,

    rx_queue: RingBuffer<u8, RX_QUEUE_CAPACITY>,
    tx_queue: RingBuffer<OutboundPacket, TX_QUEUE_CAPACITY>,
    framer: PacketFramer,

    // Last state that passed decoding and checksum validation
    state: Option<DeviceState>,
    last_send: Option<Duration>,
    stats: DriverStats,
}

impl<T: Transport, C: Clock> Driver<T, C> {
    pub fn new(transport: T, clock: C) -> Self {
        Self {
            transport,
            clock,
            command_interval: DEFAULT_COMMAND_INTERVAL,
            traits: ClimateTraits::default(),
            rx_queue: RingBuffer::new(),
            tx_queue: RingBuffer::new(),
            framer: PacketFramer::new(),
            state: None,
            last_send: None,
            stats: DriverStats::default(),
        }
    }

    pub fn from_config(transport: T, clock: C, config: &Config) -> Self {
        Self::new(transport, clock)
            .with_command_interval(config.driver.command_interval())
            .with_traits(config.climate.clone())
    }

    pub fn with_command_interval(mut self, interval: Duration) -> Self {
        self.command_interval = interval;
        self
    }

    pub fn with_traits(mut self, traits: ClimateTraits) -> Self {
        self.traits = traits;
        self
    }

    pub fn dump_config(&self) {
        let serial = SerialSettings::JHS;
        info!(
            frame_len = self.framer.frame_len(),
            baud_rate = serial.baud_rate,
            data_bits = serial.data_bits,
            parity = %serial.parity,
            stop_bits = serial.stop_bits,
            command_interval_ms = self.command_interval.as_millis() as u64,
            "JHS air conditioner driver"
        );
        info!(
            modes = ?self.traits.modes,
            fan_modes = ?self.traits.fan_modes,
            presets = ?self.traits.presets,
            swing_modes = ?self.traits.swing_modes,
            min_temperature = self.traits.min_temperature,
            max_temperature = self.traits.max_temperature,
            "supported climate traits"
        );
    }

    /// One scheduling step: pull input, decode whatever is complete, and send at
    /// most one queued command if the pacing interval allows it.
    pub fn tick<S: StateSink>(&mut self, sink: &mut S) -> TickReport {
        let bytes_read = self.read_transport();
        let (states, rejected) = self.parse_received(sink);
        let sent = self.send_queued();

        TickReport {
            bytes_read,
            states,
            rejected,
            sent,
        }
    }

    /// Queues the commands needed to fulfil `call`. Returns how many were queued.
    pub fn control(&mut self, call: &ClimateCall) -> usize {
        let powered = self.state.map_or(false, |s| s.power);
        self.traits
            .translate(call, powered)
            .into_iter()
            .filter(|command| self.enqueue(*command).is_ok())
            .count()
    }

    pub fn enqueue(&mut self, command: Command) -> Result<(), DriverError> {
        let mut buf = [0u8; MAX_PACKET_SIZE];
        let mut writer = ByteWriter::new(&mut buf);
        command.encode(&mut writer)?;
        self.enqueue_packet(writer.written())
    }

    pub fn enqueue_packet(&mut self, packet: &[u8]) -> Result<(), DriverError> {
        if self.tx_queue.is_full() {
            error!("command TX queue overflowed, last command ignored");
            self.stats.commands_dropped += 1;
            return Err(DriverError::QueueFull);
        }

        let packet = OutboundPacket::from_slice(packet).map_err(|_| {
            error!(len = packet.len(), "command packet too large, ignoring");
            self.stats.commands_dropped += 1;
            DriverError::PacketTooLarge(packet.len())
        })?;

        self.tx_queue
            .push(packet)
            .map_err(|_| DriverError::QueueFull)?;
        self.stats.commands_queued += 1;
        Ok(())
    }

    pub fn state(&self) -> Option<&DeviceState> {
        self.state.as_ref()
    }

    pub fn climate_state(&self) -> Option<ClimateState> {
        self.state.as_ref().map(ClimateState::from)
    }

    pub fn stats(&self) -> &DriverStats {
        &self.stats
    }

    pub fn traits(&self) -> &ClimateTraits {
        &self.traits
    }

    pub fn pending_commands(&self) -> usize {
        self.tx_queue.len()
    }

    pub fn pending_bytes(&self) -> usize {
        self.rx_queue.len()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn read_transport(&mut self) -> usize {
        let available = match self.transport.bytes_available() {
            Ok(available) => available,
            Err(e) => {
                warn!(error = %e, "failed to poll transport");
                self.stats.transport_errors += 1;
                return 0;
            }
        };

        // Whatever does not fit stays in the transport until the next tick
        let mut read = 0;
        for _ in 0..available.min(self.rx_queue.free()) {
            let Some(byte) = self.transport.read_byte() else {
                break;
            };
            if self.rx_queue.push(byte).is_err() {
                break;
            }
            read += 1;
        }

        self.stats.bytes_received += read as u64;
        read
    }

    fn parse_received<S: StateSink>(&mut self, sink: &mut S) -> (usize, usize) {
        let mut packet = [0u8; FRAMER_CAPACITY];
        let (mut states, mut rejected) = (0, 0);

        while let Some(byte) = self.rx_queue.pop() {
            self.framer.feed(byte);
            if !self.framer.is_packet_ready() {
                continue;
            }

            let len = self.framer.take_packet(&mut packet);
            if len == 0 {
                continue;
            }
            self.stats.frames += 1;

            if self.handle_packet(&packet[..len], sink) {
                states += 1;
            } else {
                rejected += 1;
            }
        }

        (states, rejected)
    }

    fn handle_packet<S: StateSink>(&mut self, packet: &[u8], sink: &mut S) -> bool {
        dump_packet("Received packet", packet);

        let decoded = match StatePacket::decode(packet) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, "undecodable AC state packet, ignoring");
                self.stats.decode_failures += 1;
                return false;
            }
        };

        if let Err(e) = validate_state_checksum(packet, decoded.checksum) {
            warn!(error = %e, "invalid AC state packet checksum, ignoring");
            self.stats.checksum_failures += 1;
            return false;
        }

        let state = decoded.state;
        dump_state(&state);
        self.state = Some(state);
        self.stats.states += 1;

        sink.publish_climate(&ClimateState::from(&state));
        sink.publish_water_tank(water_tank_full(&state));
        true
    }

    fn send_queued(&mut self) -> bool {
        if self.tx_queue.is_empty() {
            return false;
        }

        let now = self.clock.now();
        if let Some(last) = self.last_send {
            if now.saturating_sub(last) < self.command_interval {
                return false;
            }
        }

        let Some(packet) = self.tx_queue.pop() else {
            return false;
        };
        match self.transport.write_bytes(&packet) {
            Ok(()) => {
                dump_packet("Sent packet", &packet);
                self.stats.commands_sent += 1;
            }
            Err(e) => {
                warn!(error = %e, "failed to write command packet");
                self.stats.transport_errors += 1;
            }
        }
        self.last_send = Some(now);
        true
    }
}

fn dump_packet(title: &str, data: &[u8]) {
    if tracing::enabled!(Level::DEBUG) {
        debug!(len = data.len(), data = %hex::encode_upper(data), "{}", title);
    }
}

fn dump_state(state: &DeviceState) {
    debug!(
        power = state.power,
        mode = state.mode.as_ref(),
        sleep = state.sleep,
        oscillation = state.oscillation,
        ambient_temperature = state.ambient_temperature,
        target_temperature = state.target_temperature,
        fan_speed = state.fan_speed.as_ref(),
        temperature_unit = state.temperature_unit.as_ref(),
        water_tank = state.water_tank.as_ref(),
        byte_08 = state.byte_08,
        byte_0a = state.byte_0a,
        byte_0c = state.byte_0c,
        byte_0d = state.byte_0d,
        "AC state"
    );
}
