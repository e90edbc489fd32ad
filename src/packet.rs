//! Packet instance: per-peer state, accessors and the process watchdog

use crate::config::{Config, Feature, Features, Mode};
use crate::crc::{Crc, CrcKind};
use crate::error::{ReadResult, Result};
use crate::fifo::Fifo;

/// Protocol milestones reported through the event hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A read invocation is starting
    PreRead,
    /// A read invocation returned
    PostRead,
    /// A read invocation consumed at least one byte
    Read,
    /// A write invocation is starting
    PreWrite,
    /// A write invocation returned
    PostWrite,
    /// A frame was fully enqueued into the TX FIFO
    Write,
    /// `process` observed a complete valid frame
    Pkt,
    /// `process` abandoned an in-progress frame after the idle window
    Timeout,
}

/// Event hook signature; a plain function pointer, no capture
pub type EventFn<TX, RX, const MAX_DATA_LEN: usize> = fn(&Packet<TX, RX, MAX_DATA_LEN>, Event);

/// Receive-machine position between bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum State {
    /// Waiting for the start byte
    #[default]
    Start,
    /// Collecting the source address
    From,
    /// Collecting the destination address
    To,
    /// Collecting the user flags varint
    Flags,
    /// Collecting the command byte
    Cmd,
    /// Collecting the payload length varint
    Len,
    /// Collecting payload bytes
    Data,
    /// Collecting checksum bytes
    Crc,
    /// Waiting for the stop byte
    Stop,
}

/// Scratch zone zeroed on every start byte
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RxWork {
    pub(crate) state: State,
    /// Byte counter for the multi-byte sections
    pub(crate) index: u32,
    pub(crate) from: u32,
    pub(crate) to: u32,
    pub(crate) flags: u32,
    pub(crate) cmd: u8,
    pub(crate) len: u32,
    pub(crate) crc: Crc,
    /// Received checksum, assembled little-endian
    pub(crate) crc_recv: u32,
}

/// One protocol endpoint: configuration, FIFOs, receive state and the
/// decoded frame
///
/// `MAX_DATA_LEN` bounds the payload of a single frame; a longer declared
/// length fails the frame with [`Error::Memory`](crate::Error::Memory).
pub struct Packet<TX, RX, const MAX_DATA_LEN: usize = 256> {
    pub(crate) cfg: Config,
    pub(crate) features: Features,
    pub(crate) addr: u32,
    pub(crate) tx: TX,
    pub(crate) rx: RX,
    pub(crate) evt_fn: Option<EventFn<TX, RX, MAX_DATA_LEN>>,
    pub(crate) last_rx_time: u32,
    pub(crate) data: [u8; MAX_DATA_LEN],
    pub(crate) work: RxWork,
}

impl<TX: Fifo, RX: Fifo, const MAX_DATA_LEN: usize> Packet<TX, RX, MAX_DATA_LEN> {
    /// Create an instance with the default configuration (compact
    /// addressing, command byte and CRC-8 always on)
    pub fn new(tx: TX, rx: RX) -> Self {
        Self::with_config(tx, rx, Config::default())
    }

    /// Create an instance with an explicit configuration
    pub fn with_config(tx: TX, rx: RX, cfg: Config) -> Self {
        Self {
            cfg,
            features: Features::all(),
            addr: 0,
            tx,
            rx,
            evt_fn: None,
            last_rx_time: 0,
            data: [0; MAX_DATA_LEN],
            work: RxWork::default(),
        }
    }

    /// Set the local node address
    #[inline]
    pub fn set_addr(&mut self, addr: u32) {
        self.addr = addr;
    }

    /// Local node address
    #[inline]
    pub fn addr(&self) -> u32 {
        self.addr
    }

    /// Set or clear the runtime flag of a feature; only observable for
    /// features configured as [`Mode::Dynamic`]
    #[inline]
    pub fn set_enabled(&mut self, feature: Feature, on: bool) {
        self.features.set(feature, on);
    }

    /// Register the event hook
    #[inline]
    pub fn set_evt_fn(&mut self, evt_fn: EventFn<TX, RX, MAX_DATA_LEN>) {
        self.evt_fn = Some(evt_fn);
    }

    /// Instance configuration
    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Discard any partially assembled frame and return to idle
    #[inline]
    pub fn reset(&mut self) {
        self.work = RxWork::default();
    }

    /// Pump the parser, then run the idle watchdog
    ///
    /// `now` is a caller-supplied monotonic millisecond tick; arithmetic is
    /// wrapping. A frame stuck mid-reception for longer than the configured
    /// idle window is abandoned and [`Event::Timeout`] is emitted.
    pub fn process(&mut self, now: u32) -> Result<ReadResult> {
        let res = self.read();
        match res {
            Ok(ReadResult::Valid) => {
                self.last_rx_time = now;
                self.emit(Event::Pkt);
            }
            Ok(ReadResult::InProgress) => {
                if now.wrapping_sub(self.last_rx_time) >= self.cfg.inprog_timeout {
                    self.reset();
                    self.last_rx_time = now;
                    self.emit(Event::Timeout);
                }
            }
            _ => {
                self.last_rx_time = now;
            }
        }
        res
    }

    /// Source address of the last decoded frame
    #[inline]
    pub fn from(&self) -> u32 {
        self.work.from
    }

    /// Destination address of the last decoded frame
    #[inline]
    pub fn to(&self) -> u32 {
        self.work.to
    }

    /// User flags of the last decoded frame
    #[inline]
    pub fn flags(&self) -> u32 {
        self.work.flags
    }

    /// Command byte of the last decoded frame
    #[inline]
    pub fn cmd(&self) -> u8 {
        self.work.cmd
    }

    /// Payload length of the last decoded frame
    #[inline]
    pub fn data_len(&self) -> usize {
        (self.work.len as usize).min(MAX_DATA_LEN)
    }

    /// Payload of the last decoded frame
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data[..self.data_len()]
    }

    /// Whether the last decoded frame is addressed to this node
    #[inline]
    pub fn is_for_me(&self) -> bool {
        self.work.to == self.addr
    }

    /// Whether the last decoded frame is addressed to the broadcast sentinel
    #[inline]
    pub fn is_broadcast(&self) -> bool {
        self.work.to == self.cfg.broadcast_addr
    }

    /// TX FIFO, for the transport driver to drain
    #[inline]
    pub fn tx_mut(&mut self) -> &mut TX {
        &mut self.tx
    }

    /// RX FIFO, for the transport driver to fill
    #[inline]
    pub fn rx_mut(&mut self) -> &mut RX {
        &mut self.rx
    }

    /// Both FIFOs at once, for loopback-style drivers
    #[inline]
    pub fn rings_mut(&mut self) -> (&mut TX, &mut RX) {
        (&mut self.tx, &mut self.rx)
    }

    /// Presence predicate: whether `feature` is active on the wire for this
    /// instance. Parser and encoder both consult this, so the layouts agree.
    #[inline]
    pub(crate) fn feature_on(&self, feature: Feature) -> bool {
        match self.cfg.mode(feature) {
            Mode::Disabled => false,
            Mode::Always => true,
            Mode::Dynamic => self.features.has(feature),
        }
    }

    /// Checksum polynomial selected for this instance
    #[inline]
    pub(crate) fn crc_kind(&self) -> CrcKind {
        if self.feature_on(Feature::Crc32) {
            CrcKind::Crc32
        } else {
            CrcKind::Crc8
        }
    }

    /// First wire section following the start byte
    pub(crate) fn first_section(&self) -> State {
        if self.feature_on(Feature::Addr) {
            State::From
        } else if self.feature_on(Feature::Flags) {
            State::Flags
        } else if self.feature_on(Feature::Cmd) {
            State::Cmd
        } else {
            State::Len
        }
    }

    /// Next enabled section once a header section completes
    pub(crate) fn section_after(&self, current: State) -> State {
        match current {
            State::From => State::To,
            State::To => {
                if self.feature_on(Feature::Flags) {
                    State::Flags
                } else if self.feature_on(Feature::Cmd) {
                    State::Cmd
                } else {
                    State::Len
                }
            }
            State::Flags => {
                if self.feature_on(Feature::Cmd) {
                    State::Cmd
                } else {
                    State::Len
                }
            }
            _ => State::Len,
        }
    }

    /// Section following the payload (or the length, for empty payloads)
    #[inline]
    pub(crate) fn tail_section(&self) -> State {
        if self.feature_on(Feature::Crc) {
            State::Crc
        } else {
            State::Stop
        }
    }

    /// Enter `state` and restart the section byte counter
    #[inline]
    pub(crate) fn set_state(&mut self, state: State) {
        self.work.state = state;
        self.work.index = 0;
    }

    /// Zero the scratch zone and arm the checksum for a new frame
    #[inline]
    pub(crate) fn begin_frame(&mut self) {
        self.work = RxWork {
            crc: Crc::new(self.crc_kind()),
            ..RxWork::default()
        };
    }

    #[inline]
    pub(crate) fn emit(&self, event: Event) {
        if let Some(evt_fn) = self.evt_fn {
            evt_fn(self, event);
        }
    }
}
