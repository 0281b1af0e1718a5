use std::{
    convert::Infallible,
    io::{BufRead, Write},
};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Raw byte link to the unit, usually a UART at 9600 8N1.
pub trait Transport {
    type Error: std::error::Error;

    /// Bytes that can be read right now without blocking.
    fn bytes_available(&mut self) -> Result<usize, Self::Error>;
    fn read_byte(&mut self) -> Option<u8>;
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}

/// In-memory link: received bytes are queued by hand, written packets are kept.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    rx: BytesMut,
    sent: Vec<Bytes>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues bytes as if the unit had sent them.
    pub fn receive(&mut self, data: &[u8]) {
        self.rx.put_slice(data);
    }

    pub fn sent(&self) -> &[Bytes] {
        &self.sent
    }

    pub fn take_sent(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.sent)
    }
}

impl Transport for MemoryTransport {
    type Error = Infallible;

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        Ok(self.rx.remaining())
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.has_remaining().then(|| self.rx.get_u8())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.sent.push(Bytes::copy_from_slice(data));
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum LinesError {
    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("failed to decode hex line: {0}")]
    HexDecodeError(#[from] hex::FromHexError),
}

/// Serial capture as hex lines: one chunk of received bytes per input line,
/// one hex line per written packet. Blank lines and `#` comments are skipped.
pub struct Lines {
    reader: Box<dyn BufRead>,
    writer: Box<dyn Write>,
    pending: BytesMut,
    eof: bool,
}

impl Lines {
    pub fn new(reader: Box<dyn BufRead>, writer: Box<dyn Write>) -> Self {
        Self {
            reader,
            writer,
            pending: BytesMut::new(),
            eof: false,
        }
    }

    /// True once the input is exhausted and every received byte was read.
    pub fn is_finished(&self) -> bool {
        self.eof && self.pending.is_empty()
    }

    fn fill(&mut self) -> Result<(), LinesError> {
        let mut line = String::new();
        while self.pending.is_empty() && !self.eof {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                self.eof = true;
                break;
            }

            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let compact: String = line.split_whitespace().collect();
            self.pending.put_slice(&hex::decode(compact)?);
        }
        Ok(())
    }
}

impl Transport for Lines {
    type Error = LinesError;

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        self.fill()?;
        Ok(self.pending.len())
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.pending.has_remaining().then(|| self.pending.get_u8())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        writeln!(self.writer, "{}", hex::encode(data))?;
        self.writer.flush()?;
        Ok(())
    }
}
