use std::time::Duration;

use hex_literal::hex;
use jhs_ac::{
    climate::{
        ClimateCall, ClimateFanMode, ClimateMode, ClimatePreset, ClimateState, ClimateSwingMode,
        ClimateTraits,
    },
    config::Config,
    driver::{Driver, ManualClock, MemoryTransport, StateSink, TX_QUEUE_CAPACITY},
    jhs::{
        Command, DeviceState, FanSpeed, Mode, StatePacket, TemperatureUnit, WaterTank,
        STATE_PACKET_SIZE,
    },
};

#[derive(Default)]
struct RecordingSink {
    climate: Vec<ClimateState>,
    water_tank: Vec<bool>,
}

impl StateSink for RecordingSink {
    fn publish_climate(&mut self, state: &ClimateState) {
        self.climate.push(*state);
    }

    fn publish_water_tank(&mut self, full: bool) {
        self.water_tank.push(full);
    }
}

fn device_state() -> DeviceState {
    DeviceState {
        power: true,
        mode: Mode::Cool,
        sleep: false,
        oscillation: false,
        ambient_temperature: 28,
        target_temperature: 22,
        fan_speed: FanSpeed::High,
        temperature_unit: TemperatureUnit::Celsius,
        water_tank: WaterTank::Empty,
        byte_08: 0x00,
        byte_0a: 0x00,
        byte_0c: 0x00,
        byte_0d: 0x00,
    }
}

fn new_driver() -> (Driver<MemoryTransport, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    (Driver::new(MemoryTransport::new(), clock.clone()), clock)
}

#[test]
fn publishes_state_from_noisy_stream() {
    let (mut driver, _) = new_driver();
    let mut sink = RecordingSink::default();

    let packet = StatePacket::encode(&device_state()).unwrap();
    driver.transport_mut().receive(&[0x00, 0x00]);
    driver.transport_mut().receive(&packet);

    let report = driver.tick(&mut sink);
    assert_eq!(report.bytes_read, STATE_PACKET_SIZE + 2);
    assert_eq!(report.states, 1);
    assert_eq!(driver.state(), Some(&device_state()));

    assert_eq!(sink.climate.len(), 1);
    assert_eq!(sink.climate[0].mode, ClimateMode::Cool);
    assert_eq!(sink.climate[0].fan_mode, ClimateFanMode::High);
    assert_eq!(sink.climate[0].current_temperature, 28.0);
    assert_eq!(sink.water_tank, vec![false]);
}

#[test]
fn packet_split_across_ticks() {
    let (mut driver, _) = new_driver();
    let mut sink = RecordingSink::default();
    let packet = StatePacket::encode(&device_state()).unwrap();

    driver.transport_mut().receive(&packet[..7]);
    assert_eq!(driver.tick(&mut sink).states, 0);
    assert!(driver.state().is_none());

    driver.transport_mut().receive(&packet[7..]);
    assert_eq!(driver.tick(&mut sink).states, 1);
    assert_eq!(sink.climate.len(), 1);
}

#[test]
fn corrupted_packets_never_touch_state() {
    let (mut driver, _) = new_driver();
    let mut sink = RecordingSink::default();

    let good = StatePacket::encode(&device_state()).unwrap();
    driver.transport_mut().receive(&good);
    driver.tick(&mut sink);

    for offset in 1..=15 {
        let mut corrupted = good;
        corrupted[offset] = corrupted[offset].wrapping_add(1);
        driver.transport_mut().receive(&corrupted);
        let report = driver.tick(&mut sink);
        assert_eq!(report.rejected, 1, "offset {}", offset);
        assert_eq!(driver.state(), Some(&device_state()), "offset {}", offset);
    }

    let stats = driver.stats();
    assert_eq!(stats.frames, 16);
    assert_eq!(stats.states, 1);
    assert_eq!(stats.checksum_failures + stats.decode_failures, 15);
    assert_eq!(sink.climate.len(), 1);
}

#[test]
fn overlong_garbage_then_valid_packet() {
    let (mut driver, _) = new_driver();
    let mut sink = RecordingSink::default();

    let mut stream = vec![0xa5];
    stream.extend([0x42; 40]);
    stream.extend(StatePacket::encode(&device_state()).unwrap());
    driver.transport_mut().receive(&stream);

    let report = driver.tick(&mut sink);
    assert_eq!(report.states, 1);
    assert_eq!(report.rejected, 0);
}

#[test]
fn second_command_waits_for_interval() {
    let (mut driver, clock) = new_driver();
    driver.enqueue(Command::Power(true)).unwrap();
    driver.enqueue(Command::Temperature(24)).unwrap();

    assert!(driver.tick(&mut ()).sent);
    assert_eq!(driver.transport().sent().len(), 1);

    for _ in 0..9 {
        clock.advance(Duration::from_millis(10));
        assert!(!driver.tick(&mut ()).sent);
    }
    assert_eq!(driver.transport().sent().len(), 1);

    clock.advance(Duration::from_millis(10));
    assert!(driver.tick(&mut ()).sent);

    let sent = driver.transport_mut().take_sent();
    assert_eq!(&sent[0][..], &hex!("a5 11 01 01 13 f5"));
    assert_eq!(&sent[1][..], &hex!("a5 14 18 18 44 f5"));
    assert_eq!(driver.stats().commands_sent, 2);
}

#[test]
fn climate_call_round_trip() {
    let (mut driver, clock) = new_driver();
    driver = driver.with_traits(ClimateTraits {
        swing_modes: vec![ClimateSwingMode::Off, ClimateSwingMode::Vertical],
        ..Default::default()
    });

    let call = ClimateCall::new()
        .with_mode(ClimateMode::Dry)
        .with_fan_mode(ClimateFanMode::Low)
        .with_preset(ClimatePreset::Sleep)
        .with_swing_mode(ClimateSwingMode::Vertical)
        .with_target_temperature(20.0);
    assert_eq!(driver.control(&call), 6);

    for _ in 0..6 {
        driver.tick(&mut ());
        clock.advance(Duration::from_millis(100));
    }

    let sent: Vec<Command> = driver
        .transport()
        .sent()
        .iter()
        .map(|packet| Command::decode(packet).unwrap())
        .collect();
    assert_eq!(
        sent,
        vec![
            Command::Power(true),
            Command::Mode(Mode::Dehumidify),
            Command::FanSpeed(FanSpeed::Low),
            Command::Sleep(true),
            Command::Oscillation(true),
            Command::Temperature(20),
        ]
    );
}

#[test]
fn full_command_queue_drops_new_commands() {
    let (mut driver, _) = new_driver();
    let call = ClimateCall::new().with_target_temperature(18.0);
    for _ in 0..TX_QUEUE_CAPACITY {
        assert_eq!(driver.control(&call), 1);
    }

    assert_eq!(driver.control(&call), 0);
    assert_eq!(driver.pending_commands(), TX_QUEUE_CAPACITY);
    assert_eq!(driver.stats().commands_dropped, 1);
}

#[test]
fn driver_from_config() {
    let config: Config = "[driver]\ncommand_interval_ms = 500\n[climate]\nmodes = [\"off\", \"heat\"]"
        .parse()
        .unwrap();
    let clock = ManualClock::new();
    let mut driver = Driver::from_config(MemoryTransport::new(), clock.clone(), &config);

    assert_eq!(
        driver.control(&ClimateCall::new().with_mode(ClimateMode::Heat)),
        2
    );
    assert_eq!(
        driver.control(&ClimateCall::new().with_mode(ClimateMode::Cool)),
        0
    );

    driver.tick(&mut ());
    clock.advance(Duration::from_millis(499));
    assert!(!driver.tick(&mut ()).sent);
    clock.advance(Duration::from_millis(1));
    assert!(driver.tick(&mut ()).sent);
}
