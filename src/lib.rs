//! jhs_ac
//!
//! Serial protocol driver for JHS portable air conditioners. The unit talks
//! at 9600 baud, 8 data bits, no parity and 1 stop bit (9600 8N1); this crate
//! does not open the port itself, it frames, decodes and encodes the bytes
//! travelling over it.
//!
//! The unit streams 18 byte state packets; the host answers with 6 byte
//! command packets. Both start with `0xa5`, end with `0xf5`, and carry a
//! sum-mod-256 checksum in their second to last byte.
//!
//! ## General Usage
//!
//! ```
//! use jhs_ac::driver::{Driver, ManualClock, MemoryTransport};
//! use jhs_ac::jhs::{Command, Mode};
//!
//! let mut driver = Driver::new(MemoryTransport::new(), ManualClock::new());
//!
//! // A state packet as received from the unit, after a byte of line noise
//! driver.transport_mut().receive(&[
//!     0x00, 0xa5, 0x00, 0x00, 0x01, 0x01, 0x00, 0x19, 0x18, 0x00,
//!     0x02, 0x00, 0x01, 0x00, 0x00, 0x20, 0x00, 0x56, 0xf5,
//! ]);
//! driver.enqueue(Command::Mode(Mode::Fan)).unwrap();
//! driver.tick(&mut ());
//!
//! assert_eq!(driver.state().unwrap().ambient_temperature, 25);
//! assert_eq!(
//!     &driver.transport().sent()[0][..],
//!     &[0xa5, 0x12, 0x03, 0x03, 0x18, 0xf5]
//! );
//! ```

pub mod climate;
pub mod config;
pub mod driver;
pub mod jhs;
pub mod ring;
pub mod stream;
