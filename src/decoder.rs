//! Byte-driven receive state machine
//!
//! The parser consumes whatever the RX FIFO currently holds, one byte at a
//! time, and carries its position in the frame across invocations. A frame
//! interrupted mid-air simply resumes on the next call; malformed frames
//! fail fast and leave the machine armed for the next start byte.

use crate::config::Feature;
use crate::error::{Error, ReadResult, Result};
use crate::fifo::Fifo;
use crate::packet::{Event, Packet, State};
use crate::varint::MAX_VARINT_LEN;
use crate::{START_BYTE, STOP_BYTE};

impl<TX: Fifo, RX: Fifo, const MAX_DATA_LEN: usize> Packet<TX, RX, MAX_DATA_LEN> {
    /// Pump the parser over the bytes currently queued in the RX FIFO
    ///
    /// Returns as soon as a frame completes or fails; remaining bytes stay
    /// queued for the next invocation. With the FIFO drained mid-frame the
    /// call reports [`ReadResult::InProgress`], or
    /// [`ReadResult::WaitingForData`] when no frame has started.
    pub fn read(&mut self) -> Result<ReadResult> {
        self.emit(Event::PreRead);

        let mut consumed = false;
        let mut outcome = None;
        while let Some(byte) = self.rx.read_byte() {
            consumed = true;
            match self.step(byte) {
                Ok(None) => continue,
                Ok(Some(result)) => {
                    outcome = Some(Ok(result));
                    break;
                }
                Err(err) => {
                    outcome = Some(Err(err));
                    break;
                }
            }
        }

        let res = outcome.unwrap_or_else(|| {
            if self.work.state == State::Start {
                Ok(ReadResult::WaitingForData)
            } else {
                Ok(ReadResult::InProgress)
            }
        });

        if consumed {
            self.emit(Event::Read);
        }
        self.emit(Event::PostRead);
        res
    }

    /// Advance the machine by one byte; `Some` result ends the invocation
    fn step(&mut self, byte: u8) -> Result<Option<ReadResult>> {
        match self.work.state {
            State::Start => {
                // Anything before the start byte is line noise
                if byte == START_BYTE {
                    self.begin_frame();
                    let first = self.first_section();
                    self.set_state(first);
                }
            }
            State::From => {
                self.crc_in(byte);
                if self.feature_on(Feature::AddrExtended) {
                    if (self.work.index as usize) < MAX_VARINT_LEN {
                        self.work.from |= ((byte & 0x7F) as u32) << (7 * self.work.index);
                    }
                    self.work.index += 1;
                    if byte & 0x80 == 0 {
                        self.set_state(State::To);
                    }
                } else {
                    self.work.from = byte as u32;
                    self.set_state(State::To);
                }
            }
            State::To => {
                self.crc_in(byte);
                if self.feature_on(Feature::AddrExtended) {
                    if (self.work.index as usize) < MAX_VARINT_LEN {
                        self.work.to |= ((byte & 0x7F) as u32) << (7 * self.work.index);
                    }
                    self.work.index += 1;
                    if byte & 0x80 == 0 {
                        let next = self.section_after(State::To);
                        self.set_state(next);
                    }
                } else {
                    self.work.to = byte as u32;
                    let next = self.section_after(State::To);
                    self.set_state(next);
                }
            }
            State::Flags => {
                self.crc_in(byte);
                if (self.work.index as usize) < MAX_VARINT_LEN {
                    self.work.flags |= ((byte & 0x7F) as u32) << (7 * self.work.index);
                }
                self.work.index += 1;
                if byte & 0x80 == 0 {
                    let next = self.section_after(State::Flags);
                    self.set_state(next);
                }
            }
            State::Cmd => {
                self.crc_in(byte);
                self.work.cmd = byte;
                self.set_state(State::Len);
            }
            State::Len => {
                self.crc_in(byte);
                if (self.work.index as usize) < MAX_VARINT_LEN {
                    self.work.len |= ((byte & 0x7F) as u32) << (7 * self.work.index);
                }
                self.work.index += 1;
                // Last length byte has the continuation bit clear
                if byte & 0x80 == 0 {
                    let next = if self.work.len == 0 {
                        self.tail_section()
                    } else {
                        State::Data
                    };
                    self.set_state(next);
                }
            }
            State::Data => {
                if (self.work.index as usize) >= MAX_DATA_LEN {
                    self.reset();
                    return Err(Error::Memory);
                }
                self.crc_in(byte);
                self.data[self.work.index as usize] = byte;
                self.work.index += 1;
                if self.work.index == self.work.len {
                    let next = self.tail_section();
                    self.set_state(next);
                }
            }
            State::Crc => {
                self.work.crc_recv |= (byte as u32) << (8 * self.work.index);
                self.work.index += 1;
                if self.work.index as usize == self.work.crc.kind().width() {
                    if self.work.crc_recv == self.work.crc.finish() {
                        self.set_state(State::Stop);
                    } else {
                        self.reset();
                        return Err(Error::Crc);
                    }
                }
            }
            State::Stop => {
                self.set_state(State::Start);
                if byte == STOP_BYTE {
                    return Ok(Some(ReadResult::Valid));
                }
                return Err(Error::Stop);
            }
        }
        Ok(None)
    }

    #[inline]
    fn crc_in(&mut self, byte: u8) {
        if self.feature_on(Feature::Crc) {
            self.work.crc.update_byte(byte);
        }
    }
}
