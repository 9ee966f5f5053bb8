//! Pin-level host-side scan driver for the `tap-core` TAP engine.
//!
//! Drives an embedded [`Tap`] the way a JTAG adapter drives a real part:
//! one full TCK cycle at a time, holding each clock level across enough
//! engine ticks for the input synchronizers to settle, sampling TDO at the
//! rising edge and presenting TMS/TDI ahead of it. The driver keeps an
//! independent mirror of the controller state, advanced with the same pure
//! transition function the engine uses, and navigates between states by the
//! shortest TMS path.

use std::collections::VecDeque;

use tap_core::{Tap, TapPins, TapState};

/// Longest supported scan, bounded by the engine's 64-bit scan paths.
pub const MAX_SCAN_BITS: u8 = 64;

// Ticks per TCK level. Two low ticks push TMS/TDI through the synchronizers
// before the rising edge; three ticks per remaining level land the falling
// edge on the final tick of the cycle, so one-tick strobes are still
// observable when `clock` returns.
const SETUP_TICKS: u32 = 2;
const LEVEL_TICKS: u32 = 3;

/// Host-side scan driver owning a TAP engine.
#[derive(Debug, Clone)]
pub struct Probe {
    tap: Tap,
    mirror: TapState,
}

impl Probe {
    /// Wraps an engine, mirroring its current state.
    #[must_use]
    pub fn new(tap: Tap) -> Self {
        let mirror = tap.state();
        Self { tap, mirror }
    }

    /// The driver's view of the controller state.
    #[must_use]
    pub const fn state(&self) -> TapState {
        self.mirror
    }

    /// Shared access to the driven engine.
    #[must_use]
    pub const fn tap(&self) -> &Tap {
        &self.tap
    }

    /// Mutable access to the driven engine, for presenting read-bus values.
    pub const fn tap_mut(&mut self) -> &mut Tap {
        &mut self.tap
    }

    /// Releases the engine.
    #[must_use]
    pub fn into_tap(self) -> Tap {
        self.tap
    }

    /// Runs one full TCK cycle with the given TMS/TDI levels and returns the
    /// TDO bit valid at the rising edge.
    pub fn clock(&mut self, tms: bool, tdi: bool) -> bool {
        self.hold_level(false, tms, tdi, SETUP_TICKS);
        let sampled_tdo = self.tap.tdo();
        self.hold_level(true, tms, tdi, LEVEL_TICKS);
        self.hold_level(false, tms, tdi, LEVEL_TICKS);
        self.mirror = self.mirror.step(tms);
        sampled_tdo
    }

    fn hold_level(&mut self, tck: bool, tms: bool, tdi: bool, ticks: u32) {
        for _ in 0..ticks {
            self.tap.tick(TapPins::drive(tck, tms, tdi));
        }
    }

    /// Drives TMS high for five cycles, reaching TEST-LOGIC-RESET from any
    /// state.
    pub fn reset(&mut self) {
        for _ in 0..5 {
            self.clock(true, false);
        }
    }

    /// Clocks `cycles` TCK cycles with TMS low.
    pub fn run_idle(&mut self, cycles: u32) {
        for _ in 0..cycles {
            self.clock(false, false);
        }
    }

    /// Navigates to `target` by the shortest TMS path from the current
    /// state.
    pub fn goto(&mut self, target: TapState) {
        for tms in tms_path(self.mirror, target) {
            self.clock(tms, false);
        }
    }

    /// Scans `len` bits of `value` through the instruction register and
    /// returns the bits shifted out, LSB-first. Enters SHIFT-IR from
    /// wherever the controller is, raises TMS on the final bit, passes
    /// UPDATE-IR, and parks in RUN-TEST-IDLE. `len` is clamped to
    /// [`MAX_SCAN_BITS`]; a zero-length scan is a no-op.
    pub fn scan_ir(&mut self, value: u64, len: u8) -> u64 {
        self.scan(TapState::ShiftIr, value, len)
    }

    /// Scans `len` bits of `value` through the data-register path and
    /// returns the captured bits shifted out, LSB-first. Enters SHIFT-DR
    /// from wherever the controller is, raises TMS on the final bit, passes
    /// UPDATE-DR, and parks in RUN-TEST-IDLE. `len` is clamped to
    /// [`MAX_SCAN_BITS`]; a zero-length scan is a no-op.
    pub fn scan_dr(&mut self, value: u64, len: u8) -> u64 {
        self.scan(TapState::ShiftDr, value, len)
    }

    fn scan(&mut self, shift_state: TapState, value: u64, len: u8) -> u64 {
        let len = len.min(MAX_SCAN_BITS);
        if len == 0 {
            return 0;
        }
        self.goto(shift_state);
        let mut out = 0_u64;
        for index in 0..len {
            let last = index == len - 1;
            let bit_in = (value >> index) & 1 != 0;
            if self.clock(last, bit_in) {
                out |= 1 << index;
            }
        }
        // Exit1 -> Update -> Run-Test/Idle.
        self.clock(true, false);
        self.clock(false, false);
        out
    }
}

/// Shortest TMS sequence from `from` to `target`, breadth-first over the
/// 16-state transition graph.
fn tms_path(from: TapState, target: TapState) -> Vec<bool> {
    if from == target {
        return Vec::new();
    }
    let mut visited = [false; 16];
    let mut queue: VecDeque<(TapState, Vec<bool>)> = VecDeque::new();
    queue.push_back((from, Vec::new()));
    while let Some((state, path)) = queue.pop_front() {
        for tms in [false, true] {
            let next = state.step(tms);
            let mut grown = path.clone();
            grown.push(tms);
            if next == target {
                return grown;
            }
            let slot = TapState::ALL
                .iter()
                .position(|candidate| *candidate == next)
                .unwrap_or(0);
            if !visited[slot] {
                visited[slot] = true;
                queue.push_back((next, grown));
            }
        }
    }
    // The transition graph is strongly connected; the search always returns
    // before the queue drains.
    Vec::new()
}

#[cfg(test)]
mod tests {
    use tap_core::TapState;

    use super::tms_path;

    fn walk(mut state: TapState, path: &[bool]) -> TapState {
        for tms in path {
            state = state.step(*tms);
        }
        state
    }

    #[test]
    fn paths_land_on_their_target_from_every_state_pair() {
        for from in TapState::ALL {
            for target in TapState::ALL {
                let path = tms_path(from, target);
                if from == target {
                    assert!(path.is_empty());
                } else {
                    assert_eq!(walk(from, &path), target, "{from:?} -> {target:?}");
                }
            }
        }
    }

    #[test]
    fn idle_to_shift_dr_takes_the_canonical_route() {
        assert_eq!(
            tms_path(TapState::RunTestIdle, TapState::ShiftDr),
            vec![true, false, false]
        );
    }

    #[test]
    fn idle_to_shift_ir_takes_the_canonical_route() {
        assert_eq!(
            tms_path(TapState::RunTestIdle, TapState::ShiftIr),
            vec![true, true, false, false]
        );
    }

    #[test]
    fn reset_path_is_five_tms_highs_at_most() {
        for from in TapState::ALL {
            assert!(tms_path(from, TapState::TestLogicReset).len() <= 5);
        }
    }
}
