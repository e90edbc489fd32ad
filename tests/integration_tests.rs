//! End-to-end tests for picopkt
//!
//! Frames are encoded into the TX FIFO, moved to the RX FIFO the way a
//! transport driver would, and decoded back; every wire-format feature
//! combination is exercised on a fully dynamic configuration.

use std::sync::atomic::{AtomicU32, Ordering};

use heapless::Deque;
use picopkt::{
    Config, Crc, CrcKind, Error, Event, Feature, Fifo, Mode, Packet, ReadResult, START_BYTE,
    STOP_BYTE,
};

type Ring = Deque<u8, 128>;
type TestPacket = Packet<Ring, Ring, 256>;

fn loopback(pkt: &mut TestPacket) {
    let (tx, rx) = pkt.rings_mut();
    while let Some(byte) = tx.read_byte() {
        rx.write(&[byte]);
    }
}

fn drain_tx(pkt: &mut TestPacket) -> Vec<u8> {
    let mut wire = Vec::new();
    while let Some(byte) = pkt.tx_mut().read_byte() {
        wire.push(byte);
    }
    wire
}

fn feed(pkt: &mut TestPacket, bytes: &[u8]) {
    assert_eq!(pkt.rx_mut().write(bytes), bytes.len());
}

/// One write → loopback → read pass on a fully dynamic instance
fn run_roundtrip(
    use_addr: bool,
    use_addr_ext: bool,
    use_flags: bool,
    use_cmd: bool,
    use_crc: bool,
    use_crc32: bool,
) {
    let mut our_addr = 0x1234_5678u32;
    let mut dest_addr = 0x8765_4321u32;
    let flags = 0xACCE_550Fu32;
    let cmd = 0x85u8;
    let data = b"Hello World123456789\r\n";

    // Compact addressing carries a single raw byte
    if !use_addr_ext {
        our_addr &= 0xFF;
        dest_addr &= 0xFF;
    }

    let mut pkt = TestPacket::with_config(Ring::new(), Ring::new(), Config::dynamic());
    pkt.set_addr(our_addr);
    pkt.set_enabled(Feature::Addr, use_addr);
    pkt.set_enabled(Feature::AddrExtended, use_addr_ext);
    pkt.set_enabled(Feature::Flags, use_flags);
    pkt.set_enabled(Feature::Cmd, use_cmd);
    pkt.set_enabled(Feature::Crc, use_crc);
    pkt.set_enabled(Feature::Crc32, use_crc32);

    pkt.write(dest_addr, flags, cmd, data).unwrap();
    loopback(&mut pkt);

    let ctx = format!(
        "addr={} ext={} flags={} cmd={} crc={} crc32={}",
        use_addr, use_addr_ext, use_flags, use_cmd, use_crc, use_crc32
    );
    assert_eq!(pkt.read(), Ok(ReadResult::Valid), "{}", ctx);
    assert_eq!(pkt.data(), data, "{}", ctx);
    if use_addr {
        assert_eq!(pkt.from(), our_addr, "{}", ctx);
        assert_eq!(pkt.to(), dest_addr, "{}", ctx);
    }
    if use_flags {
        assert_eq!(pkt.flags(), flags, "{}", ctx);
    }
    if use_cmd {
        assert_eq!(pkt.cmd(), cmd, "{}", ctx);
    }
}

#[test]
fn test_feature_matrix_roundtrip() {
    for mask in 0u32..64 {
        run_roundtrip(
            mask & 0x01 != 0,
            mask & 0x02 != 0,
            mask & 0x04 != 0,
            mask & 0x08 != 0,
            mask & 0x10 != 0,
            mask & 0x20 != 0,
        );
    }
}

#[test]
fn test_wire_image_default_layout() {
    let mut pkt = TestPacket::new(Ring::new(), Ring::new());
    pkt.set_addr(0x12);

    pkt.write(0x11, 0, 0x85, b"Hello World\r\n").unwrap();
    let wire = drain_tx(&mut pkt);

    assert_eq!(wire.len(), 20);
    assert_eq!(
        &wire[..5],
        &[START_BYTE, 0x12, 0x11, 0x85, 0x0D],
        "header bytes"
    );
    assert_eq!(&wire[5..18], b"Hello World\r\n");
    assert_eq!(wire[19], STOP_BYTE);

    let mut crc = Crc::new(CrcKind::Crc8);
    crc.update(&wire[1..18]);
    assert_eq!(wire[18] as u32, crc.finish());

    feed(&mut pkt, &wire);
    assert_eq!(pkt.read(), Ok(ReadResult::Valid));
    assert_eq!(pkt.from(), 0x12);
    assert_eq!(pkt.to(), 0x11);
    assert_eq!(pkt.cmd(), 0x85);
    assert_eq!(pkt.data_len(), 13);
    assert_eq!(pkt.data(), b"Hello World\r\n");
}

#[test]
fn test_crc32_frame_roundtrip() {
    let cfg = Config {
        crc32: Mode::Always,
        ..Config::default()
    };
    let mut pkt = TestPacket::with_config(Ring::new(), Ring::new(), cfg);
    pkt.set_addr(0x12);

    pkt.write(0x11, 0, 0x85, b"Hello World\r\n").unwrap();
    let wire = drain_tx(&mut pkt);

    // Three bytes longer than the CRC-8 variant
    assert_eq!(wire.len(), 23);

    let mut crc = Crc::new(CrcKind::Crc32);
    crc.update(&wire[1..18]);
    assert_eq!(&wire[18..22], &crc.finish().to_le_bytes());

    feed(&mut pkt, &wire);
    assert_eq!(pkt.read(), Ok(ReadResult::Valid));
    assert_eq!(pkt.data(), b"Hello World\r\n");
}

#[test]
fn test_extended_addresses_across_varint_boundaries() {
    let cfg = Config {
        addr_extended: Mode::Always,
        ..Config::default()
    };
    let pairs = [
        (0x7Fu32, 0x7Fu32),
        (0x80, 0x80),
        (0x3FFF, 0x4000),
        (0x1234_5678, 0x8765_4321),
        (0xFFFF_FFFF, 0xFFFF_FFFF),
    ];

    for &(own, dest) in &pairs {
        let mut pkt = TestPacket::with_config(Ring::new(), Ring::new(), cfg);
        pkt.set_addr(own);

        pkt.write(dest, 0, 0x42, b"addr").unwrap();
        loopback(&mut pkt);

        assert_eq!(pkt.read(), Ok(ReadResult::Valid), "own={:#x}", own);
        assert_eq!(pkt.from(), own);
        assert_eq!(pkt.to(), dest);
        assert_eq!(pkt.data(), b"addr");
    }
}

#[test]
fn test_broadcast_frame() {
    let mut pkt = TestPacket::new(Ring::new(), Ring::new());
    pkt.set_addr(0x12);

    pkt.write(0xFF, 0, 0x01, &[]).unwrap();
    loopback(&mut pkt);

    assert_eq!(pkt.read(), Ok(ReadResult::Valid));
    assert!(pkt.is_broadcast());
    assert!(!pkt.is_for_me());
    assert_eq!(pkt.data_len(), 0);
}

#[test]
fn test_addressed_to_me() {
    let mut sender = TestPacket::new(Ring::new(), Ring::new());
    sender.set_addr(0x12);
    sender.write(0x11, 0, 0x03, b"direct").unwrap();
    let wire = drain_tx(&mut sender);

    let mut receiver = TestPacket::new(Ring::new(), Ring::new());
    receiver.set_addr(0x11);
    feed(&mut receiver, &wire);

    assert_eq!(receiver.read(), Ok(ReadResult::Valid));
    assert!(receiver.is_for_me());
    assert!(!receiver.is_broadcast());
    assert_eq!(receiver.from(), 0x12);
}

#[test]
fn test_crc_corruption_then_clean_frame() {
    let mut pkt = TestPacket::new(Ring::new(), Ring::new());
    pkt.set_addr(0x12);

    pkt.write(0x11, 0, 0x85, b"Hello World\r\n").unwrap();
    let mut wire = drain_tx(&mut pkt);

    let crc_pos = wire.len() - 2;
    wire[crc_pos] ^= 0x04;
    feed(&mut pkt, &wire);
    assert_eq!(pkt.read(), Err(Error::Crc));

    pkt.write(0x11, 0, 0x85, b"Hello World\r\n").unwrap();
    loopback(&mut pkt);
    assert_eq!(pkt.read(), Ok(ReadResult::Valid));
    assert_eq!(pkt.data(), b"Hello World\r\n");
}

#[test]
fn test_single_bit_corruption_is_never_silently_accepted() {
    let mut pkt = TestPacket::new(Ring::new(), Ring::new());
    pkt.set_addr(0x12);
    pkt.write(0x11, 0, 0x85, b"Hello World\r\n").unwrap();
    let wire = drain_tx(&mut pkt);

    // Flip every bit of the checksum-covered region in turn
    for pos in 1..wire.len() - 2 {
        for bit in 0..8 {
            let mut corrupt = wire.clone();
            corrupt[pos] ^= 1 << bit;

            let mut rx_pkt = TestPacket::new(Ring::new(), Ring::new());
            rx_pkt.set_addr(0x12);
            feed(&mut rx_pkt, &corrupt);

            // Drive the parser over everything that arrived
            let mut last = rx_pkt.read();
            while last == Ok(ReadResult::InProgress) && !Fifo::is_empty(rx_pkt.rx_mut()) {
                last = rx_pkt.read();
            }

            let silently_ok = last == Ok(ReadResult::Valid)
                && rx_pkt.data() == b"Hello World\r\n"
                && rx_pkt.from() == 0x12
                && rx_pkt.to() == 0x11
                && rx_pkt.cmd() == 0x85;
            assert!(!silently_ok, "pos={} bit={} slipped through", pos, bit);
        }
    }
}

#[test]
fn test_truncated_frame_is_never_valid() {
    let mut pkt = TestPacket::new(Ring::new(), Ring::new());
    pkt.set_addr(0x12);
    pkt.write(0x11, 0, 0x85, b"Hello World\r\n").unwrap();
    let wire = drain_tx(&mut pkt);

    for cut in 0..wire.len() {
        let mut rx_pkt = TestPacket::new(Ring::new(), Ring::new());
        feed(&mut rx_pkt, &wire[..cut]);

        let res = rx_pkt.read();
        assert!(
            res == Ok(ReadResult::InProgress) || res == Ok(ReadResult::WaitingForData),
            "prefix of {} bytes gave {:?}",
            cut,
            res
        );
    }
}

#[test]
fn test_chunking_is_observationally_equivalent() {
    let mut pkt = TestPacket::new(Ring::new(), Ring::new());
    pkt.set_addr(0x12);
    pkt.write(0x11, 0, 0x85, b"Hello World\r\n").unwrap();
    let wire = drain_tx(&mut pkt);

    for chunk_size in 1..=wire.len() {
        let mut rx_pkt = TestPacket::new(Ring::new(), Ring::new());
        let mut result = Ok(ReadResult::WaitingForData);

        for chunk in wire.chunks(chunk_size) {
            feed(&mut rx_pkt, chunk);
            result = rx_pkt.read();
        }

        assert_eq!(result, Ok(ReadResult::Valid), "chunk size {}", chunk_size);
        assert_eq!(rx_pkt.from(), 0x12);
        assert_eq!(rx_pkt.to(), 0x11);
        assert_eq!(rx_pkt.cmd(), 0x85);
        assert_eq!(rx_pkt.data(), b"Hello World\r\n");
    }
}

#[test]
fn test_payload_at_capacity_boundary() {
    let mut pkt: Packet<Ring, Ring, 8> = Packet::new(Ring::new(), Ring::new());
    pkt.set_addr(0x01);

    pkt.write(0x02, 0, 0x10, b"12345678").unwrap();
    let (tx, rx) = pkt.rings_mut();
    while let Some(byte) = tx.read_byte() {
        rx.write(&[byte]);
    }
    assert_eq!(pkt.read(), Ok(ReadResult::Valid));
    assert_eq!(pkt.data(), b"12345678");

    // One byte past the payload capacity fails the frame
    pkt.write(0x02, 0, 0x10, b"123456789").unwrap();
    let (tx, rx) = pkt.rings_mut();
    while let Some(byte) = tx.read_byte() {
        rx.write(&[byte]);
    }
    assert_eq!(pkt.read(), Err(Error::Memory));

    // Flush what remains of the failed frame, then recover cleanly
    pkt.rx_mut().reset();
    pkt.write(0x02, 0, 0x10, b"ok").unwrap();
    let (tx, rx) = pkt.rings_mut();
    while let Some(byte) = tx.read_byte() {
        rx.write(&[byte]);
    }
    assert_eq!(pkt.read(), Ok(ReadResult::Valid));
    assert_eq!(pkt.data(), b"ok");
}

#[test]
fn test_write_preflight_keeps_fifo_untouched() {
    let mut pkt: Packet<Deque<u8, 16>, Ring, 256> = Packet::new(Deque::new(), Ring::new());
    pkt.set_addr(0x01);

    pkt.write(0x02, 0, 0x10, b"short").unwrap();
    let queued = Fifo::len(pkt.tx_mut());

    // Second frame does not fit next to the first one
    assert_eq!(pkt.write(0x02, 0, 0x10, b"too long now"), Err(Error::Memory));
    assert_eq!(Fifo::len(pkt.tx_mut()), queued);
}

#[test]
fn test_truncation_then_watchdog_timeout() {
    static TIMEOUTS: AtomicU32 = AtomicU32::new(0);
    static PACKETS: AtomicU32 = AtomicU32::new(0);

    fn hook(_pkt: &TestPacket, event: Event) {
        match event {
            Event::Timeout => {
                TIMEOUTS.fetch_add(1, Ordering::Relaxed);
            }
            Event::Pkt => {
                PACKETS.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    let mut pkt = TestPacket::new(Ring::new(), Ring::new());
    pkt.set_addr(0x12);
    pkt.set_evt_fn(hook);

    pkt.write(0x11, 0, 0x85, b"Hello World\r\n").unwrap();
    let wire = drain_tx(&mut pkt);

    // Everything but the stop byte, then silence
    feed(&mut pkt, &wire[..wire.len() - 1]);
    assert_eq!(pkt.process(0), Ok(ReadResult::InProgress));
    assert_eq!(TIMEOUTS.load(Ordering::Relaxed), 0);

    // Idle window elapsed: the half-received frame is abandoned
    assert_eq!(pkt.process(100), Ok(ReadResult::InProgress));
    assert_eq!(TIMEOUTS.load(Ordering::Relaxed), 1);

    // A complete frame goes through cleanly afterwards
    feed(&mut pkt, &wire);
    assert_eq!(pkt.process(150), Ok(ReadResult::Valid));
    assert_eq!(PACKETS.load(Ordering::Relaxed), 1);
    assert_eq!(pkt.data(), b"Hello World\r\n");
}

#[test]
fn test_read_write_event_sequence() {
    static PRE_WRITE: AtomicU32 = AtomicU32::new(0);
    static WRITES: AtomicU32 = AtomicU32::new(0);
    static POST_WRITE: AtomicU32 = AtomicU32::new(0);
    static PRE_READ: AtomicU32 = AtomicU32::new(0);
    static READS: AtomicU32 = AtomicU32::new(0);
    static POST_READ: AtomicU32 = AtomicU32::new(0);

    fn hook(_pkt: &TestPacket, event: Event) {
        let counter = match event {
            Event::PreWrite => &PRE_WRITE,
            Event::Write => &WRITES,
            Event::PostWrite => &POST_WRITE,
            Event::PreRead => &PRE_READ,
            Event::Read => &READS,
            Event::PostRead => &POST_READ,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    let mut pkt = TestPacket::new(Ring::new(), Ring::new());
    pkt.set_addr(0x12);
    pkt.set_evt_fn(hook);

    // Read on an empty FIFO: bracketing events only
    assert_eq!(pkt.read(), Ok(ReadResult::WaitingForData));
    assert_eq!(
        (PRE_READ.load(Ordering::Relaxed), READS.load(Ordering::Relaxed)),
        (1, 0)
    );
    assert_eq!(POST_READ.load(Ordering::Relaxed), 1);

    pkt.write(0x11, 0, 0x85, b"evt").unwrap();
    assert_eq!(
        (
            PRE_WRITE.load(Ordering::Relaxed),
            WRITES.load(Ordering::Relaxed),
            POST_WRITE.load(Ordering::Relaxed)
        ),
        (1, 1, 1)
    );

    loopback(&mut pkt);
    assert_eq!(pkt.read(), Ok(ReadResult::Valid));
    assert_eq!(READS.load(Ordering::Relaxed), 1);
    assert_eq!(POST_READ.load(Ordering::Relaxed), 2);

    // A failed write still brackets, but no Write milestone
    let big = [0u8; 200];
    assert_eq!(pkt.write(0x11, 0, 0x85, &big), Err(Error::Memory));
    assert_eq!(
        (
            PRE_WRITE.load(Ordering::Relaxed),
            WRITES.load(Ordering::Relaxed),
            POST_WRITE.load(Ordering::Relaxed)
        ),
        (2, 1, 2)
    );
}

#[test]
fn test_stop_impostor_inside_payload() {
    let mut pkt = TestPacket::new(Ring::new(), Ring::new());
    pkt.set_addr(0x12);

    // Payload full of frame delimiters; the declared length governs
    let payload = [STOP_BYTE, START_BYTE, STOP_BYTE, STOP_BYTE, START_BYTE];
    pkt.write(0x11, 0, 0x02, &payload).unwrap();
    loopback(&mut pkt);

    assert_eq!(pkt.read(), Ok(ReadResult::Valid));
    assert_eq!(pkt.data(), &payload);
}

#[test]
fn test_flags_roundtrip_values() {
    let cfg = Config {
        flags: Mode::Always,
        ..Config::default()
    };

    for &flags in &[0u32, 1, 0x7F, 0x80, 0x3FFF, 0x4000, 0xACCE_550F, u32::MAX] {
        let mut pkt = TestPacket::with_config(Ring::new(), Ring::new(), cfg);
        pkt.set_addr(0x12);

        pkt.write(0x11, flags, 0x85, b"f").unwrap();
        loopback(&mut pkt);

        assert_eq!(pkt.read(), Ok(ReadResult::Valid), "flags={:#x}", flags);
        assert_eq!(pkt.flags(), flags);
    }
}
