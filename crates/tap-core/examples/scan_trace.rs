//! Prints the deterministic trace of an instruction scan followed by a data
//! scan against a two-register bank.

use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use tap_core::{
    RegisterLayout, ScanRegister, Tap, TapConfig, TapPins, TraceEvent, TraceSink,
};
use thiserror as _;

struct PrintSink;

impl TraceSink for PrintSink {
    fn on_event(&mut self, event: TraceEvent) {
        match event {
            TraceEvent::StateChanged { from, to } => println!("state   {from:?} -> {to:?}"),
            TraceEvent::Captured { address, value } => {
                println!("capture [{address:#04x}] -> {value:#010b}");
            }
            TraceEvent::Updated { address, value } => {
                println!("update  [{address:#04x}] <- {value:#010b}");
            }
            TraceEvent::Shifted {
                register,
                bit_in,
                bit_out,
            } => {
                let path = match register {
                    ScanRegister::Data => "DR",
                    ScanRegister::Instruction => "IR",
                };
                println!(
                    "shift   {path} in={} out={}",
                    u8::from(bit_in),
                    u8::from(bit_out)
                );
            }
        }
    }
}

/// One full TCK cycle with enough ticks per level for the synchronizers.
fn clock(tap: &mut Tap, sink: &mut PrintSink, tms: bool, tdi: bool) {
    for _ in 0..3 {
        tap.tick_traced(TapPins::drive(false, tms, tdi), sink);
    }
    for _ in 0..3 {
        tap.tick_traced(TapPins::drive(true, tms, tdi), sink);
    }
    for _ in 0..3 {
        tap.tick_traced(TapPins::drive(false, tms, tdi), sink);
    }
}

fn shift(tap: &mut Tap, sink: &mut PrintSink, value: u64, len: u8) {
    for index in 0..len {
        let bit = (value >> index) & 1 != 0;
        clock(tap, sink, index == len - 1, bit);
    }
}

fn main() {
    let config = TapConfig::new(vec![
        RegisterLayout {
            address: 2,
            width: 8,
        },
        RegisterLayout {
            address: 5,
            width: 3,
        },
    ]);
    let mut tap = Tap::new(&config).expect("example configuration is valid");
    tap.port_mut(2)
        .expect("port 2 is configured")
        .set_read_bus(0xA5);

    let mut sink = PrintSink;

    // Leave reset, select register 2, then scan eight bits through it.
    clock(&mut tap, &mut sink, false, false);

    clock(&mut tap, &mut sink, true, false);
    clock(&mut tap, &mut sink, true, false);
    clock(&mut tap, &mut sink, false, false);
    clock(&mut tap, &mut sink, false, false);
    shift(&mut tap, &mut sink, 2, 5);
    clock(&mut tap, &mut sink, true, false);
    clock(&mut tap, &mut sink, false, false);

    clock(&mut tap, &mut sink, true, false);
    clock(&mut tap, &mut sink, false, false);
    clock(&mut tap, &mut sink, false, false);
    shift(&mut tap, &mut sink, 0x3C, 8);
    clock(&mut tap, &mut sink, true, false);
    clock(&mut tap, &mut sink, false, false);

    let port = tap.port(2).expect("port 2 is configured");
    println!("final   write_bus={:#04x}", port.write_bus());
}
