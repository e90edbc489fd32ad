//! Basic usage example for picopkt
//!
//! Run with: cargo run --example basic_usage

use heapless::Deque;
use picopkt::{Config, Event, Fifo, Mode, Packet, ReadResult};

type Ring = Deque<u8, 256>;
type DemoPacket = Packet<Ring, Ring, 256>;

fn loopback(pkt: &mut DemoPacket) {
    // Stand-in for a UART driver moving bytes from one end to the other
    let (tx, rx) = pkt.rings_mut();
    while let Some(byte) = tx.read_byte() {
        rx.write(&[byte]);
    }
}

fn print_frame(pkt: &DemoPacket) {
    println!(
        "  Decoded: from={:#04x}, to={:#04x}, cmd={:#04x}, len={}, data={:?}",
        pkt.from(),
        pkt.to(),
        pkt.cmd(),
        pkt.data_len(),
        std::str::from_utf8(pkt.data()).unwrap_or("?")
    );
}

fn event_hook(pkt: &DemoPacket, event: Event) {
    match event {
        Event::Pkt => {
            println!("  [event] valid packet received");
            print_frame(pkt);
        }
        Event::Timeout => println!("  [event] receive timeout, frame abandoned"),
        _ => {}
    }
}

fn main() -> Result<(), picopkt::Error> {
    println!("picopkt Basic Usage Example");
    println!("===========================");

    // Example 1: default layout (compact addresses, command, CRC-8)
    println!("\n1. Default Layout:");
    {
        let mut pkt = DemoPacket::new(Ring::new(), Ring::new());
        pkt.set_addr(0x12);

        pkt.write(0x11, 0, 0x85, b"Hello World\r\n")?;
        println!("  Enqueued {} wire bytes", Fifo::len(pkt.tx_mut()));

        loopback(&mut pkt);
        assert_eq!(pkt.read()?, ReadResult::Valid);
        print_frame(&pkt);
        println!("  for me: {}, broadcast: {}", pkt.is_for_me(), pkt.is_broadcast());
    }

    // Example 2: event-driven processing with the watchdog
    println!("\n2. Event Hook and process():");
    {
        let mut pkt = DemoPacket::new(Ring::new(), Ring::new());
        pkt.set_addr(0x12);
        pkt.set_evt_fn(event_hook);

        pkt.write(0x11, 0, 0x01, b"event driven")?;
        loopback(&mut pkt);

        // The hook reports the packet; process also runs the idle watchdog
        pkt.process(0)?;
    }

    // Example 3: a half-received frame is recycled by the watchdog
    println!("\n3. Receive Timeout:");
    {
        let mut pkt = DemoPacket::new(Ring::new(), Ring::new());
        pkt.set_addr(0x12);
        pkt.set_evt_fn(event_hook);

        pkt.write(0x11, 0, 0x02, b"going nowhere")?;

        // Deliver everything except the final stop byte
        let (tx, rx) = pkt.rings_mut();
        while let Some(byte) = tx.read_byte() {
            if Fifo::is_empty(tx) {
                break;
            }
            rx.write(&[byte]);
        }

        pkt.process(0)?;
        println!("  ... 120 ms of line silence ...");
        pkt.process(120)?;
    }

    // Example 4: extended varint addresses, user flags, CRC-32
    println!("\n4. Extended Addressing, Flags and CRC-32:");
    {
        let cfg = Config {
            addr_extended: Mode::Always,
            flags: Mode::Always,
            crc32: Mode::Always,
            ..Config::default()
        };
        let mut pkt = DemoPacket::with_config(Ring::new(), Ring::new(), cfg);
        pkt.set_addr(0x1234_5678);

        pkt.write(0x8765_4321, 0xACCE_550F, 0x85, b"wide header")?;
        println!("  Enqueued {} wire bytes", Fifo::len(pkt.tx_mut()));

        loopback(&mut pkt);
        assert_eq!(pkt.read()?, ReadResult::Valid);
        println!(
            "  Decoded: from={:#010x}, to={:#010x}, flags={:#010x}, data={:?}",
            pkt.from(),
            pkt.to(),
            pkt.flags(),
            std::str::from_utf8(pkt.data()).unwrap_or("?")
        );
    }

    // Example 5: broadcast to every node on the drop
    println!("\n5. Broadcast:");
    {
        let mut pkt = DemoPacket::new(Ring::new(), Ring::new());
        pkt.set_addr(0x12);

        pkt.write(0xFF, 0, 0x01, &[])?;
        loopback(&mut pkt);

        assert_eq!(pkt.read()?, ReadResult::Valid);
        println!("  broadcast: {}, for me: {}", pkt.is_broadcast(), pkt.is_for_me());
    }

    println!("\nAll examples completed successfully!");
    Ok(())
}
