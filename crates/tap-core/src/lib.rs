//! IEEE 1149.1 JTAG Test Access Port (TAP) controller engine.
//!
//! A reusable protocol engine meant to be embedded inside a larger design:
//! the host supplies a bank of addressable registers, drives the external
//! pins one internal clock tick at a time, and consumes the capture/update
//! strobes the controller routes to whichever register the instruction
//! register currently selects.
//!
//! Known gap: the TRST pin is declared on [`TapPins`] but wired to nothing,
//! matching the modeled hardware. The only reset mechanism is the protocol
//! itself — five TCK cycles with TMS held high reach TEST-LOGIC-RESET from
//! any state.

/// Engine configuration and setup-time validation.
pub mod config;
pub use config::{
    ConfigError, RegisterLayout, TapConfig, DEFAULT_IR_RESET, DEFAULT_IR_WIDTH, MAX_SCAN_WIDTH,
};

/// Input-domain conditioning: synchronizers and TCK edge detection.
pub mod signal;
pub use signal::{EdgeDetector, Synchronizer, TckEdge};

/// Width-tracked shift-register primitive for the scan paths.
pub mod shift;
pub use shift::ShiftRegister;

/// The 16-state TAP controller state machine.
pub mod state;
pub use state::TapState;

/// Addressable register ports and instruction-code routing.
pub mod bank;
pub use bank::RegisterPort;

/// The TAP controller engine tick loop.
pub mod tap;
pub use tap::{ScanRegister, Tap, TapPins, TickOutcome, TraceEvent, TraceSink};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
