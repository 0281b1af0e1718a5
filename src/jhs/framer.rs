use heapless::Vec;
use tracing::{trace, warn};

use super::{PACKET_END_MARKER, PACKET_START_MARKER, STATE_PACKET_SIZE};

/// Capacity of the accumulation buffer, with headroom over the largest frame.
pub const FRAMER_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramerState {
    /// Waiting for a start marker, every other byte is discarded.
    Idle,
    Accumulating,
    /// A full frame is buffered and waiting to be taken.
    Complete,
}

/// Extracts fixed-length frames from a byte stream, one byte at a time.
///
/// There is no length field in the protocol: a frame is complete when the end
/// marker shows up exactly at the last position. A frame that grows past that
/// length is dropped and the framer goes back to hunting for a start marker.
#[derive(Debug, Clone)]
pub struct PacketFramer {
    state: FramerState,
    buffer: Vec<u8, FRAMER_CAPACITY>,
    frame_len: usize,
}

impl PacketFramer {
    pub fn new() -> Self {
        Self::with_frame_len(STATE_PACKET_SIZE)
    }

    /// `frame_len` is clamped to [`FRAMER_CAPACITY`].
    pub fn with_frame_len(frame_len: usize) -> Self {
        Self {
            state: FramerState::Idle,
            buffer: Vec::new(),
            frame_len: frame_len.clamp(2, FRAMER_CAPACITY),
        }
    }

    pub fn feed(&mut self, byte: u8) {
        match self.state {
            FramerState::Idle => {
                if byte == PACKET_START_MARKER {
                    self.buffer.clear();
                    self.append(byte);
                    self.state = FramerState::Accumulating;
                } else {
                    trace!(byte, "discarding byte outside of a frame");
                }
            }
            FramerState::Accumulating => {
                if self.buffer.len() >= self.frame_len {
                    warn!(
                        len = self.buffer.len(),
                        "frame exceeded {} bytes without an end marker, resynchronizing",
                        self.frame_len
                    );
                    self.reset();
                    return;
                }

                if byte == PACKET_END_MARKER && self.buffer.len() == self.frame_len - 1 {
                    self.state = FramerState::Complete;
                }
                self.append(byte);
            }
            // Held until the consumer drains the frame
            FramerState::Complete => {}
        }
    }

    pub fn is_packet_ready(&self) -> bool {
        self.state == FramerState::Complete
    }

    /// Copies the buffered frame into `out` and returns its length. Returns 0 when
    /// no frame is ready. A frame that does not fit in `out` is dropped.
    pub fn take_packet(&mut self, out: &mut [u8]) -> usize {
        if !self.is_packet_ready() {
            return 0;
        }

        let len = self.buffer.len();
        let copied = match out.get_mut(..len) {
            Some(dest) => {
                dest.copy_from_slice(&self.buffer);
                len
            }
            None => {
                warn!(len, capacity = out.len(), "frame does not fit destination, dropped");
                0
            }
        };
        self.reset();
        copied
    }

    pub fn state(&self) -> FramerState {
        self.state
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Bytes of the frame currently being accumulated.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = FramerState::Idle;
    }

    fn append(&mut self, byte: u8) {
        if self.buffer.push(byte).is_err() {
            self.reset();
        }
    }
}

impl Default for PacketFramer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const COOLING: [u8; STATE_PACKET_SIZE] =
        hex!("a5 00 00 01 01 00 19 18 00 02 00 01 00 00 20 00 56 f5");

    fn feed_all(framer: &mut PacketFramer, bytes: &[u8]) -> usize {
        let mut ready = 0;
        for &byte in bytes {
            framer.feed(byte);
            if framer.is_packet_ready() {
                ready += 1;
            }
        }
        ready
    }

    #[test]
    fn test_resynchronizes_after_noise() {
        let mut framer = PacketFramer::new();
        framer.feed(0x00);
        framer.feed(0x00);
        assert_eq!(framer.state(), FramerState::Idle);

        assert_eq!(feed_all(&mut framer, &COOLING), 1);
        let mut out = [0u8; 64];
        assert_eq!(framer.take_packet(&mut out), STATE_PACKET_SIZE);
        assert_eq!(&out[..STATE_PACKET_SIZE], &COOLING);
        assert_eq!(framer.state(), FramerState::Idle);
        assert_eq!(framer.take_packet(&mut out), 0);
    }

    #[test]
    fn test_overlong_frame_is_dropped() {
        let mut framer = PacketFramer::new();
        let mut stream = vec![PACKET_START_MARKER];
        stream.extend(std::iter::repeat(0x11).take(STATE_PACKET_SIZE + 4));

        assert_eq!(feed_all(&mut framer, &stream), 0);
        assert_eq!(framer.state(), FramerState::Idle);
        assert!(framer.buffered().is_empty());
    }

    #[test]
    fn test_early_end_marker_is_payload() {
        let mut framer = PacketFramer::new();
        let mut packet = COOLING;
        packet[5] = PACKET_END_MARKER;

        assert_eq!(feed_all(&mut framer, &packet), 1);
        let mut out = [0u8; STATE_PACKET_SIZE];
        assert_eq!(framer.take_packet(&mut out), STATE_PACKET_SIZE);
        assert_eq!(out, packet);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut framer = PacketFramer::new();
        let mut out = [0u8; STATE_PACKET_SIZE];
        let mut frames = 0;
        for &byte in COOLING.iter().chain(hex!("f5 00").iter()).chain(COOLING.iter()) {
            framer.feed(byte);
            if framer.take_packet(&mut out) > 0 {
                assert_eq!(out, COOLING);
                frames += 1;
            }
        }
        assert_eq!(frames, 2);
    }

    #[test]
    fn test_ready_frame_ignores_further_bytes() {
        let mut framer = PacketFramer::new();
        feed_all(&mut framer, &COOLING);
        framer.feed(PACKET_START_MARKER);
        framer.feed(0x01);

        let mut out = [0u8; STATE_PACKET_SIZE];
        assert_eq!(framer.take_packet(&mut out), STATE_PACKET_SIZE);
        assert_eq!(out, COOLING);
    }

    #[test]
    fn test_small_destination_drops_frame() {
        let mut framer = PacketFramer::new();
        feed_all(&mut framer, &COOLING);

        let mut out = [0u8; 4];
        assert_eq!(framer.take_packet(&mut out), 0);
        assert_eq!(framer.state(), FramerState::Idle);
        assert_eq!(out, [0u8; 4]);
    }

    #[test]
    fn test_custom_frame_len() {
        let mut framer = PacketFramer::with_frame_len(6);
        assert_eq!(framer.frame_len(), 6);
        assert_eq!(feed_all(&mut framer, &hex!("a5 11 01 01 13 f5")), 1);

        assert_eq!(PacketFramer::with_frame_len(100).frame_len(), FRAMER_CAPACITY);
    }
}
