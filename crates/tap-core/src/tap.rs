//! The TAP controller engine: one deterministic tick over the synchronizers,
//! edge detector, sample latch, state machine, and scan-path routing.

use crate::bank::{RegisterBank, RegisterPort};
use crate::config::{ConfigError, TapConfig};
use crate::shift::ShiftRegister;
use crate::signal::{EdgeDetector, Synchronizer, TckEdge};
use crate::state::TapState;

/// External pin sample presented to the engine for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(clippy::struct_excessive_bools)]
pub struct TapPins {
    /// Protocol clock (TCK).
    pub tck: bool,
    /// Mode select (TMS), sampled at rising TCK edges.
    pub tms: bool,
    /// Serial data in (TDI), sampled at rising TCK edges.
    pub tdi: bool,
    /// Asynchronous test-logic reset (TRST).
    ///
    /// Declared for pin compatibility but not wired into any logic: the
    /// modeled hardware leaves this line unimplemented, and no semantics are
    /// invented here. Hold TMS high for five TCK cycles to reset instead.
    pub trst: bool,
}

impl TapPins {
    /// Pin sample with the three driven lines set and TRST low.
    #[must_use]
    pub const fn drive(tck: bool, tms: bool, tdi: bool) -> Self {
        Self {
            tck,
            tms,
            tdi,
            trst: false,
        }
    }
}

/// Which scan path a shifted bit moved through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanRegister {
    /// The shared data-register path.
    Data,
    /// The instruction register.
    Instruction,
}

/// Deterministic trace events emitted in execution order during a traced
/// tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// The controller changed state at a falling edge.
    StateChanged {
        /// State before the edge.
        from: TapState,
        /// State after the edge.
        to: TapState,
    },
    /// The addressed port's read bus was captured into the DR path.
    Captured {
        /// Instruction code of the addressed port.
        address: u64,
        /// Value loaded into DR.
        value: u64,
    },
    /// DR contents were committed to the addressed port's write bus.
    Updated {
        /// Instruction code of the addressed port.
        address: u64,
        /// Value latched onto the write bus.
        value: u64,
    },
    /// One bit was clocked through a scan path.
    Shifted {
        /// The scan path that moved.
        register: ScanRegister,
        /// Bit inserted at the top of the shift window.
        bit_in: bool,
        /// Bit that fell out of the serial output.
        bit_out: bool,
    },
}

/// Sink for deterministic trace hooks.
pub trait TraceSink {
    /// Receives one event; called in execution order within a tick.
    fn on_event(&mut self, event: TraceEvent);
}

struct NullSink;

impl TraceSink for NullSink {
    fn on_event(&mut self, _event: TraceEvent) {}
}

/// Externally observable activity of one engine tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickOutcome {
    /// Edge detected on the synchronized protocol clock this tick.
    pub edge: TckEdge,
    /// `(from, to)` evaluated at a falling edge; `from` and `to` may be
    /// equal for self-transitions. `None` on ticks without a falling edge.
    pub transition: Option<(TapState, TapState)>,
}

/// The TAP controller engine.
///
/// A pure reactive process: given the current state and the pin sample for
/// one internal clock tick, [`Tap::tick`] deterministically computes the
/// next state and outputs. All mutation of IR, DR, and the register ports
/// happens inside the tick; hosts only read port state and present read-bus
/// values between ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Tap {
    sync_tck: Synchronizer,
    sync_tms: Synchronizer,
    sync_tdi: Synchronizer,
    edges: EdgeDetector,
    sampled_tms: bool,
    sampled_tdi: bool,
    state: TapState,
    ir: ShiftRegister,
    ir_reset: u64,
    dr: ShiftRegister,
    bank: RegisterBank,
    tdo: bool,
}

impl Tap {
    /// Builds an engine from a validated configuration. The controller
    /// starts in TEST-LOGIC-RESET with the IR holding its reset value and
    /// every port's reset strobe asserted.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configuration violates a
    /// setup-time invariant; the state machine never starts on a faulty
    /// configuration.
    pub fn new(config: &TapConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut bank = RegisterBank::new(&config.registers);
        bank.drive_reset_all(true);
        let dr_width = bank.dr_width();
        Ok(Self {
            sync_tck: Synchronizer::new(),
            sync_tms: Synchronizer::new(),
            sync_tdi: Synchronizer::new(),
            edges: EdgeDetector::new(),
            sampled_tms: false,
            sampled_tdi: false,
            state: TapState::TestLogicReset,
            ir: ShiftRegister::with_value(config.ir_width, config.ir_reset),
            ir_reset: config.ir_reset,
            dr: ShiftRegister::new(dr_width),
            bank,
            tdo: false,
        })
    }

    /// Advances one internal clock tick with the given pin sample.
    pub fn tick(&mut self, pins: TapPins) -> TickOutcome {
        self.tick_traced(pins, &mut NullSink)
    }

    /// Advances one tick, dispatching [`TraceEvent`]s to `sink` in
    /// execution order.
    pub fn tick_traced(&mut self, pins: TapPins, sink: &mut dyn TraceSink) -> TickOutcome {
        let tck = self.sync_tck.sample(pins.tck);
        let tms = self.sync_tms.sample(pins.tms);
        let tdi = self.sync_tdi.sample(pins.tdi);
        let edge = self.edges.detect(tck);

        // Capture/update strobes from the previous tick are one tick wide.
        self.bank.clear_strobes();

        if edge.is_rising() {
            self.sampled_tms = tms;
            self.sampled_tdi = tdi;
        }

        let transition = if edge.is_falling() {
            let from = self.state;
            self.falling_edge_actions(sink);
            let to = from.step(self.sampled_tms);
            self.state = to;
            if from != to {
                sink.on_event(TraceEvent::StateChanged { from, to });
            }
            Some((from, to))
        } else {
            None
        };

        // Level behavior of the (possibly new) current state.
        let in_reset = self.state == TapState::TestLogicReset;
        self.bank.drive_reset_all(in_reset);
        if in_reset {
            self.ir.load(self.ir_reset);
        }
        self.tdo = match self.state {
            TapState::ShiftDr => self.dr.lsb(),
            TapState::ShiftIr => self.ir.lsb(),
            _ => false,
        };

        TickOutcome { edge, transition }
    }

    /// Side effects of the state the falling edge occurs in, before the
    /// transition is taken.
    fn falling_edge_actions(&mut self, sink: &mut dyn TraceSink) {
        let address = self.ir.value();
        match self.state {
            TapState::CaptureDr => {
                if let Some(port) = self.bank.selected_mut(address) {
                    let value = port.read_bus();
                    port.strobe_capture();
                    self.dr.load(value);
                    sink.on_event(TraceEvent::Captured { address, value });
                }
            }
            TapState::ShiftDr => {
                if let Some(port) = self.bank.selected_mut(address) {
                    let bit_out = self.dr.lsb();
                    self.dr.shift_in_within(port.width(), self.sampled_tdi);
                    sink.on_event(TraceEvent::Shifted {
                        register: ScanRegister::Data,
                        bit_in: self.sampled_tdi,
                        bit_out,
                    });
                }
            }
            TapState::UpdateDr => {
                let dr_value = self.dr.value();
                if let Some(port) = self.bank.selected_mut(address) {
                    port.strobe_update(dr_value);
                    let value = port.write_bus();
                    sink.on_event(TraceEvent::Updated { address, value });
                }
            }
            TapState::ShiftIr => {
                let bit_out = self.ir.lsb();
                self.ir.shift_in(self.sampled_tdi);
                sink.on_event(TraceEvent::Shifted {
                    register: ScanRegister::Instruction,
                    bit_in: self.sampled_tdi,
                    bit_out,
                });
            }
            _ => {}
        }
    }

    /// Current controller state.
    #[must_use]
    pub const fn state(&self) -> TapState {
        self.state
    }

    /// Serial data out (TDO). Presents the active shift register's LSB
    /// during a shift state and is low everywhere else.
    #[must_use]
    pub const fn tdo(&self) -> bool {
        self.tdo
    }

    /// Live instruction register value (the current register selection).
    #[must_use]
    pub const fn ir(&self) -> u64 {
        self.ir.value()
    }

    /// Instruction register width in bits.
    #[must_use]
    pub const fn ir_width(&self) -> u8 {
        self.ir.width()
    }

    /// Current contents of the shared DR scan path.
    #[must_use]
    pub const fn dr(&self) -> u64 {
        self.dr.value()
    }

    /// Width of the shared DR scan path (the widest configured port).
    #[must_use]
    pub const fn dr_width(&self) -> u8 {
        self.dr.width()
    }

    /// The delayed "settled low" pulse of the protocol clock: high exactly
    /// one tick after each falling edge. Consumed by no state action;
    /// carried for signal-level compatibility with the modeled hardware.
    #[must_use]
    pub const fn tck_settled_low(&self) -> bool {
        self.edges.settled_low()
    }

    /// The port configured at `address`, if any.
    #[must_use]
    pub fn port(&self, address: u64) -> Option<&RegisterPort> {
        self.bank.port(address)
    }

    /// Mutable access to the port at `address`, for presenting read-bus
    /// values.
    pub fn port_mut(&mut self, address: u64) -> Option<&mut RegisterPort> {
        self.bank.port_mut(address)
    }

    /// Configured instruction codes in ascending order.
    #[must_use]
    pub fn addresses(&self) -> impl Iterator<Item = u64> + '_ {
        self.bank.addresses()
    }
}

#[cfg(test)]
mod tests {
    use super::{ScanRegister, Tap, TapPins, TraceEvent, TraceSink};
    use crate::config::{RegisterLayout, TapConfig};
    use crate::signal::TckEdge;
    use crate::state::TapState;

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<TraceEvent>,
    }

    impl TraceSink for RecordingSink {
        fn on_event(&mut self, event: TraceEvent) {
            self.events.push(event);
        }
    }

    fn single_port_tap() -> Tap {
        let config = TapConfig::new(vec![RegisterLayout {
            address: 1,
            width: 4,
        }]);
        Tap::new(&config).expect("valid configuration")
    }

    /// Drives one full TCK cycle, holding each level long enough for the
    /// two-stage synchronizer to pass it through.
    fn clock(tap: &mut Tap, tms: bool, tdi: bool) {
        for _ in 0..4 {
            tap.tick(TapPins::drive(false, tms, tdi));
        }
        for _ in 0..4 {
            tap.tick(TapPins::drive(true, tms, tdi));
        }
        for _ in 0..4 {
            tap.tick(TapPins::drive(false, tms, tdi));
        }
    }

    #[test]
    fn powers_up_in_test_logic_reset_with_ir_at_reset_value() {
        let tap = single_port_tap();
        assert_eq!(tap.state(), TapState::TestLogicReset);
        assert_eq!(tap.ir(), 0x01);
        assert!(tap.port(1).expect("port 1 is configured").reset_strobe());
        assert!(!tap.tdo());
    }

    #[test]
    fn idle_pins_cause_no_transition() {
        let mut tap = single_port_tap();
        for _ in 0..32 {
            let outcome = tap.tick(TapPins::default());
            assert_eq!(outcome.edge, TckEdge::Steady);
            assert!(outcome.transition.is_none());
        }
        assert_eq!(tap.state(), TapState::TestLogicReset);
    }

    #[test]
    fn falling_edges_drive_transitions_from_sampled_tms() {
        let mut tap = single_port_tap();
        clock(&mut tap, false, false);
        assert_eq!(tap.state(), TapState::RunTestIdle);
        clock(&mut tap, true, false);
        assert_eq!(tap.state(), TapState::SelectDrScan);
        clock(&mut tap, false, false);
        assert_eq!(tap.state(), TapState::CaptureDr);
    }

    #[test]
    fn reset_strobe_holds_for_the_whole_reset_state() {
        let mut tap = single_port_tap();
        clock(&mut tap, true, false);
        assert!(tap.port(1).expect("port 1 is configured").reset_strobe());

        clock(&mut tap, false, false);
        assert_eq!(tap.state(), TapState::RunTestIdle);
        assert!(!tap.port(1).expect("port 1 is configured").reset_strobe());
    }

    #[test]
    fn trst_is_accepted_and_ignored() {
        let mut tap = single_port_tap();
        clock(&mut tap, false, false);
        assert_eq!(tap.state(), TapState::RunTestIdle);

        let mut asserted = TapPins::drive(false, false, false);
        asserted.trst = true;
        for _ in 0..8 {
            tap.tick(asserted);
        }
        assert_eq!(tap.state(), TapState::RunTestIdle);
        assert_eq!(tap.ir(), 0x01);
    }

    #[test]
    fn traced_scan_reports_capture_shift_and_update() {
        let mut tap = single_port_tap();
        tap.port_mut(1)
            .expect("port 1 is configured")
            .set_read_bus(0b1010);

        let mut sink = RecordingSink::default();
        let mut clock_traced = |tap: &mut Tap, tms: bool, tdi: bool| {
            for _ in 0..4 {
                tap.tick_traced(TapPins::drive(false, tms, tdi), &mut sink);
            }
            for _ in 0..4 {
                tap.tick_traced(TapPins::drive(true, tms, tdi), &mut sink);
            }
            for _ in 0..4 {
                tap.tick_traced(TapPins::drive(false, tms, tdi), &mut sink);
            }
        };

        // The IR reset value addresses the port directly, so a DR scan needs
        // no instruction scan first. Four bits of zeros are shifted in; the
        // final data bit is clocked on the edge that exits SHIFT-DR.
        clock_traced(&mut tap, false, false);
        clock_traced(&mut tap, true, false);
        clock_traced(&mut tap, false, false);
        clock_traced(&mut tap, false, false);
        for _ in 0..3 {
            clock_traced(&mut tap, false, false);
        }
        clock_traced(&mut tap, true, false);
        clock_traced(&mut tap, true, false);
        clock_traced(&mut tap, false, false);

        assert!(sink
            .events
            .contains(&TraceEvent::Captured { address: 1, value: 0b1010 }));
        assert!(sink
            .events
            .contains(&TraceEvent::Updated { address: 1, value: 0 }));
        let shifted = sink
            .events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    TraceEvent::Shifted {
                        register: ScanRegister::Data,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(shifted, 4);
    }
}
