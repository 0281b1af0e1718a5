use std::{
    fs::File,
    io::{self, BufReader, Write},
    path::PathBuf,
    time::Duration,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};

use jhs_ac::{
    climate::{
        ClimateCall, ClimateFanMode, ClimateMode, ClimatePreset, ClimateState, ClimateSwingMode,
    },
    config::{init_logging, Config},
    driver::{Driver, Lines, ManualClock, StateSink, Transport},
    jhs::{Command, DeviceState, Function, PacketFramer, StatePacket, FRAMER_CAPACITY},
};

#[derive(Parser, Debug)]
#[command(name = "jhs-ac", version, about = "JHS air conditioner serial protocol tool")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Reads hex-encoded serial captures from stdin and prints every valid state packet as JSON
    Decode,

    /// Prints the hex encoding of a single command packet, e.g. `encode mode cool`
    Encode { function: Function, value: String },

    /// Runs the driver against a capture file with a simulated clock
    Replay {
        /// Hex capture of the bytes received from the unit, one chunk per line
        #[arg(long)]
        capture: PathBuf,

        #[arg(long)]
        mode: Option<ClimateMode>,

        #[arg(long)]
        fan: Option<ClimateFanMode>,

        #[arg(long)]
        preset: Option<ClimatePreset>,

        #[arg(long)]
        swing: Option<ClimateSwingMode>,

        #[arg(long)]
        temperature: Option<f32>,

        /// Simulated time between two driver ticks
        #[arg(long, default_value_t = 10)]
        tick_ms: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    init_logging(&config.logging)?;

    match cli.command {
        Cmd::Decode => decode(),
        Cmd::Encode { function, value } => {
            let command = Command::parse(function, &value)?;
            println!("{}", hex::encode(command.to_packet()?));
            Ok(())
        }
        Cmd::Replay {
            capture,
            mode,
            fan,
            preset,
            swing,
            temperature,
            tick_ms,
        } => {
            let call = ClimateCall {
                mode,
                fan_mode: fan,
                preset,
                swing_mode: swing,
                target_temperature: temperature,
            };
            replay(&config, capture, call, Duration::from_millis(tick_ms))
        }
    }
}

fn decode() -> anyhow::Result<()> {
    let mut input = Lines::new(Box::new(io::stdin().lock()), Box::new(io::sink()));
    decode_states(&mut input, |state| {
        println!("{}", serde_json::to_string(state)?);
        io::stdout().flush()?;
        Ok(())
    })
}

/// Frames every byte `input` delivers and hands each validated state to `emit`.
fn decode_states<T, F>(input: &mut T, mut emit: F) -> anyhow::Result<()>
where
    T: Transport,
    T::Error: Send + Sync + 'static,
    F: FnMut(&DeviceState) -> anyhow::Result<()>,
{
    let mut framer = PacketFramer::new();
    let mut packet = [0u8; FRAMER_CAPACITY];

    while input.bytes_available()? > 0 {
        while let Some(byte) = input.read_byte() {
            framer.feed(byte);
            let len = framer.take_packet(&mut packet);
            if len == 0 {
                continue;
            }

            match StatePacket::decode_validated(&packet[..len]) {
                Ok(decoded) => emit(&decoded.state)?,
                Err(e) => warn!(
                    error = %e,
                    packet = %hex::encode_upper(&packet[..len]),
                    "skipping state packet"
                ),
            }
        }
    }

    Ok(())
}

fn replay(
    config: &Config,
    capture: PathBuf,
    call: ClimateCall,
    tick: Duration,
) -> anyhow::Result<()> {
    let reader = BufReader::new(
        File::open(&capture).with_context(|| format!("opening {}", capture.display()))?,
    );
    let transport = Lines::new(Box::new(reader), Box::new(io::stdout()));

    let clock = ManualClock::new();
    let mut driver = Driver::from_config(transport, clock.clone(), config);
    driver.dump_config();

    if call != ClimateCall::default() {
        let queued = driver.control(&call);
        info!(queued, "climate call translated");
    }

    let mut sink = JsonSink;
    loop {
        driver.tick(&mut sink);
        if driver.transport().is_finished()
            && driver.pending_bytes() == 0
            && driver.pending_commands() == 0
        {
            break;
        }
        clock.advance(tick);
    }

    println!("{}", json!({ "stats": driver.stats() }));
    Ok(())
}

/// Prints published state as JSON lines on stdout.
struct JsonSink;

impl StateSink for JsonSink {
    fn publish_climate(&mut self, state: &ClimateState) {
        println!("{}", json!({ "climate": state }));
    }

    fn publish_water_tank(&mut self, full: bool) {
        println!("{}", json!({ "water_tank_full": full }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_decode_states_from_capture() {
        let capture = "\
# noise, then a packet split over two lines
00 ff
a5 00 00 01 01 00 19 18 00
02 00 01 00 00 20 00 56 f5

# same packet with a corrupted target temperature
a5 00 00 01 01 00 19 1e 00 02 00 01 00 00 20 00 56 f5
a5000001010019180002000100002000 56f5
";
        let mut input = Lines::new(Box::new(Cursor::new(capture)), Box::new(io::sink()));

        let mut states = Vec::new();
        decode_states(&mut input, |state| {
            states.push(*state);
            Ok(())
        })
        .unwrap();

        assert_eq!(states.len(), 2);
        assert!(states.iter().all(|s| s.ambient_temperature == 25));
        assert!(input.is_finished());
    }

    #[test]
    fn test_decode_states_rejects_bad_hex() {
        let mut input = Lines::new(Box::new(Cursor::new("a5 0")), Box::new(io::sink()));
        assert!(decode_states(&mut input, |_| Ok(())).is_err());
    }
}
