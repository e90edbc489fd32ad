//! picopkt: lightweight framed packet protocol for byte-stream links
//!
//! This crate frames application messages for point-to-point and multi-drop
//! byte pipes (UART, RS-485, USB CDC, ...) and reconstructs them through a
//! streaming, byte-at-a-time state machine that tolerates partial arrivals
//! and malformed data.
//!
//! # Frame Format
//!
//! ```text
//! +-------+--------+--------+---------+-------+-------+----------+-------+-------+
//! | START | [FROM] | [TO]   | [FLAGS] | [CMD] | LEN   | DATA     | [CRC] | STOP  |
//! | 0xAA  | addr   | addr   | varint  | u8    |varint | LEN bytes| 1/4 B | 0x55  |
//! +-------+--------+--------+---------+-------+-------+----------+-------+-------+
//! ```
//!
//! Bracketed sections are feature-gated per instance; parser and encoder
//! consult the same predicate so the wire layout always agrees. The CRC
//! (Dallas/1-Wire CRC-8 or ISO-HDLC CRC-32) covers FROM through DATA.
//! There is no escape mechanism: payload bytes equal to the delimiters are
//! legal, the explicit length governs.
//!
//! # Features
//!
//! - Streaming receive state machine, resumable across partial reads
//! - Exact pre-flight capacity check on transmit; no partial frames
//! - Per-instance runtime feature selection (addresses, flags, command,
//!   checksum width)
//! - Zero heap use; payload capacity fixed at compile time
//! - `no_std` support; the `std` feature only adds error-trait impls
//!
//! # Example
//!
//! ```rust
//! use picopkt::{Fifo, Packet, ReadResult};
//! use heapless::Deque;
//!
//! let mut pkt: Packet<Deque<u8, 64>, Deque<u8, 64>> =
//!     Packet::new(Deque::new(), Deque::new());
//! pkt.set_addr(0x12);
//!
//! // Encode a frame into the TX FIFO
//! pkt.write(0x11, 0, 0x85, b"Hello World\r\n")?;
//!
//! // Loop it back, the way a UART driver would move bytes
//! let (tx, rx) = pkt.rings_mut();
//! while let Some(byte) = tx.read_byte() {
//!     rx.write(&[byte]);
//! }
//!
//! // And decode
//! assert_eq!(pkt.read()?, ReadResult::Valid);
//! assert_eq!(pkt.from(), 0x12);
//! assert_eq!(pkt.cmd(), 0x85);
//! assert_eq!(pkt.data(), b"Hello World\r\n");
//! # Ok::<(), picopkt::Error>(())
//! ```

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod fifo;
pub mod packet;
pub mod varint;

// Re-export main types
pub use config::{Config, Feature, Features, Mode, ADDR_BROADCAST, INPROG_TIMEOUT_MS};
pub use crc::{Crc, CrcKind};
pub use error::{Error, ReadResult, Result};
pub use fifo::Fifo;
pub use packet::{Event, EventFn, Packet};

/// Byte that opens every frame; never escaped
pub const START_BYTE: u8 = 0xAA;

/// Byte that closes every frame; never escaped
pub const STOP_BYTE: u8 = 0x55;
