//! Transmit encoder: single-call frame serialization into the TX FIFO
//!
//! The encoder mirrors the parser's wire layout exactly — both consult the
//! same presence predicate. Capacity is verified up front against the
//! precise frame size, so a failed write leaves the FIFO untouched and a
//! passed check cannot run out of space halfway through.

use crate::config::Feature;
use crate::crc::{Crc, CrcKind};
use crate::error::{Error, Result};
use crate::fifo::Fifo;
use crate::packet::{Event, Packet};
use crate::varint;
use crate::{START_BYTE, STOP_BYTE};

impl<TX: Fifo, RX: Fifo, const MAX_DATA_LEN: usize> Packet<TX, RX, MAX_DATA_LEN> {
    /// Encode one frame and enqueue it into the TX FIFO
    ///
    /// `to`, `flags` and `cmd` are ignored when the corresponding feature is
    /// not active for this instance. Fails with [`Error::Memory`] when the
    /// FIFO lacks space for the complete frame; nothing is written in that
    /// case.
    pub fn write(&mut self, to: u32, flags: u32, cmd: u8, data: &[u8]) -> Result<()> {
        self.emit(Event::PreWrite);
        let res = self.write_frame(to, flags, cmd, data);
        if res.is_ok() {
            self.emit(Event::Write);
        }
        self.emit(Event::PostWrite);
        res
    }

    fn write_frame(&mut self, to: u32, flags: u32, cmd: u8, data: &[u8]) -> Result<()> {
        let use_addr = self.feature_on(Feature::Addr);
        let use_ext = self.feature_on(Feature::AddrExtended);
        let use_flags = self.feature_on(Feature::Flags);
        let use_cmd = self.feature_on(Feature::Cmd);
        let use_crc = self.feature_on(Feature::Crc);

        let len = u32::try_from(data.len()).map_err(|_| Error::Memory)?;

        // Exact frame size: start/stop, gated header sections, length,
        // payload, checksum
        let mut required = 2usize;
        if use_addr {
            if use_ext {
                required += varint::encoded_len(self.addr) + varint::encoded_len(to);
            } else {
                required += 2;
            }
        }
        if use_flags {
            required += varint::encoded_len(flags);
        }
        if use_cmd {
            required += 1;
        }
        required += varint::encoded_len(len) + data.len();
        if use_crc {
            required += self.crc_kind().width();
        }

        if self.tx.free() < required {
            return Err(Error::Memory);
        }

        let mut crc = Crc::new(self.crc_kind());

        // Start byte is outside the checksum-covered region
        self.tx.write(&[START_BYTE]);

        if use_addr {
            if use_ext {
                let addr = self.addr;
                self.put_varint(addr, &mut crc);
                self.put_varint(to, &mut crc);
            } else {
                let pair = [self.addr as u8, to as u8];
                self.put_covered(&pair, &mut crc);
            }
        }

        if use_flags {
            self.put_varint(flags, &mut crc);
        }

        if use_cmd {
            self.put_covered(&[cmd], &mut crc);
        }

        self.put_varint(len, &mut crc);
        if !data.is_empty() {
            self.put_covered(data, &mut crc);
        }

        if use_crc {
            let value = crc.finish();
            match crc.kind() {
                CrcKind::Crc8 => {
                    self.tx.write(&[value as u8]);
                }
                CrcKind::Crc32 => {
                    self.tx.write(&value.to_le_bytes());
                }
            }
        }

        self.tx.write(&[STOP_BYTE]);
        Ok(())
    }

    /// Enqueue bytes that belong to the checksum-covered region
    #[inline]
    fn put_covered(&mut self, bytes: &[u8], crc: &mut Crc) {
        crc.update(bytes);
        self.tx.write(bytes);
    }

    #[inline]
    fn put_varint(&mut self, value: u32, crc: &mut Crc) {
        let mut buf = [0u8; varint::MAX_VARINT_LEN];
        let used = varint::encode_u32(value, &mut buf);
        self.put_covered(&buf[..used], crc);
    }
}
