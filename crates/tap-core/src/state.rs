//! The 16-state IEEE 1149.1 TAP controller state machine.

/// TAP controller state.
///
/// The exact IEEE 1149.1 set. The machine is circular; there is no terminal
/// state. Transitions are evaluated only at falling edges of the protocol
/// clock, branching on the TMS value sampled at the preceding rising edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TapState {
    /// All test logic held in reset; IR reloads its reset value each tick.
    #[default]
    TestLogicReset,
    /// Parking state between scans.
    RunTestIdle,
    /// Branch point toward a data-register scan.
    SelectDrScan,
    /// The addressed port's read bus is loaded into DR.
    CaptureDr,
    /// DR shifts one bit per falling edge; TDO presents its LSB.
    ShiftDr,
    /// First exit from the DR shift path; TDO forced low.
    Exit1Dr,
    /// DR scan paused; no register mutation.
    PauseDr,
    /// Re-entry point back into SHIFT-DR or on to UPDATE-DR.
    Exit2Dr,
    /// DR contents are committed to the addressed port's write bus.
    UpdateDr,
    /// Branch point toward an instruction-register scan.
    SelectIrScan,
    /// Entry into the IR shift path.
    CaptureIr,
    /// IR shifts one bit per falling edge; TDO presents its LSB.
    ShiftIr,
    /// First exit from the IR shift path; TDO forced low.
    Exit1Ir,
    /// IR scan paused; no register mutation.
    PauseIr,
    /// Re-entry point back into SHIFT-IR or on to UPDATE-IR.
    Exit2Ir,
    /// The shifted instruction becomes the live selection.
    UpdateIr,
}

impl TapState {
    /// Every controller state, in the standard enumeration order.
    pub const ALL: [Self; 16] = [
        Self::TestLogicReset,
        Self::RunTestIdle,
        Self::SelectDrScan,
        Self::CaptureDr,
        Self::ShiftDr,
        Self::Exit1Dr,
        Self::PauseDr,
        Self::Exit2Dr,
        Self::UpdateDr,
        Self::SelectIrScan,
        Self::CaptureIr,
        Self::ShiftIr,
        Self::Exit1Ir,
        Self::PauseIr,
        Self::Exit2Ir,
        Self::UpdateIr,
    ];

    /// Pure transition function: the state entered by a falling edge with
    /// the given sampled TMS level.
    #[must_use]
    pub const fn step(self, tms: bool) -> Self {
        match self {
            Self::TestLogicReset => {
                if tms {
                    Self::TestLogicReset
                } else {
                    Self::RunTestIdle
                }
            }
            Self::RunTestIdle | Self::UpdateDr | Self::UpdateIr => {
                if tms {
                    Self::SelectDrScan
                } else {
                    Self::RunTestIdle
                }
            }
            Self::SelectDrScan => {
                if tms {
                    Self::SelectIrScan
                } else {
                    Self::CaptureDr
                }
            }
            Self::CaptureDr | Self::ShiftDr => {
                if tms {
                    Self::Exit1Dr
                } else {
                    Self::ShiftDr
                }
            }
            Self::Exit1Dr => {
                if tms {
                    Self::UpdateDr
                } else {
                    Self::PauseDr
                }
            }
            Self::PauseDr => {
                if tms {
                    Self::Exit2Dr
                } else {
                    Self::PauseDr
                }
            }
            Self::Exit2Dr => {
                if tms {
                    Self::UpdateDr
                } else {
                    Self::ShiftDr
                }
            }
            Self::SelectIrScan => {
                if tms {
                    Self::TestLogicReset
                } else {
                    Self::CaptureIr
                }
            }
            Self::CaptureIr | Self::ShiftIr => {
                if tms {
                    Self::Exit1Ir
                } else {
                    Self::ShiftIr
                }
            }
            Self::Exit1Ir => {
                if tms {
                    Self::UpdateIr
                } else {
                    Self::PauseIr
                }
            }
            Self::PauseIr => {
                if tms {
                    Self::Exit2Ir
                } else {
                    Self::PauseIr
                }
            }
            Self::Exit2Ir => {
                if tms {
                    Self::UpdateIr
                } else {
                    Self::ShiftIr
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::TapState;

    #[rstest]
    #[case(TapState::TestLogicReset, true, TapState::TestLogicReset)]
    #[case(TapState::TestLogicReset, false, TapState::RunTestIdle)]
    #[case(TapState::RunTestIdle, true, TapState::SelectDrScan)]
    #[case(TapState::RunTestIdle, false, TapState::RunTestIdle)]
    #[case(TapState::SelectDrScan, true, TapState::SelectIrScan)]
    #[case(TapState::SelectDrScan, false, TapState::CaptureDr)]
    #[case(TapState::CaptureDr, true, TapState::Exit1Dr)]
    #[case(TapState::CaptureDr, false, TapState::ShiftDr)]
    #[case(TapState::ShiftDr, true, TapState::Exit1Dr)]
    #[case(TapState::ShiftDr, false, TapState::ShiftDr)]
    #[case(TapState::Exit1Dr, true, TapState::UpdateDr)]
    #[case(TapState::Exit1Dr, false, TapState::PauseDr)]
    #[case(TapState::PauseDr, true, TapState::Exit2Dr)]
    #[case(TapState::PauseDr, false, TapState::PauseDr)]
    #[case(TapState::Exit2Dr, true, TapState::UpdateDr)]
    #[case(TapState::Exit2Dr, false, TapState::ShiftDr)]
    #[case(TapState::UpdateDr, true, TapState::SelectDrScan)]
    #[case(TapState::UpdateDr, false, TapState::RunTestIdle)]
    #[case(TapState::SelectIrScan, true, TapState::TestLogicReset)]
    #[case(TapState::SelectIrScan, false, TapState::CaptureIr)]
    #[case(TapState::CaptureIr, true, TapState::Exit1Ir)]
    #[case(TapState::CaptureIr, false, TapState::ShiftIr)]
    #[case(TapState::ShiftIr, true, TapState::Exit1Ir)]
    #[case(TapState::ShiftIr, false, TapState::ShiftIr)]
    #[case(TapState::Exit1Ir, true, TapState::UpdateIr)]
    #[case(TapState::Exit1Ir, false, TapState::PauseIr)]
    #[case(TapState::PauseIr, true, TapState::Exit2Ir)]
    #[case(TapState::PauseIr, false, TapState::PauseIr)]
    #[case(TapState::Exit2Ir, true, TapState::UpdateIr)]
    #[case(TapState::Exit2Ir, false, TapState::ShiftIr)]
    #[case(TapState::UpdateIr, true, TapState::SelectDrScan)]
    #[case(TapState::UpdateIr, false, TapState::RunTestIdle)]
    fn transition_table_row(
        #[case] from: TapState,
        #[case] tms: bool,
        #[case] to: TapState,
    ) {
        assert_eq!(from.step(tms), to);
    }

    #[test]
    fn default_is_test_logic_reset() {
        assert_eq!(TapState::default(), TapState::TestLogicReset);
    }

    #[test]
    fn five_tms_high_steps_reset_from_every_state() {
        for start in TapState::ALL {
            let mut state = start;
            for _ in 0..5 {
                state = state.step(true);
            }
            assert_eq!(state, TapState::TestLogicReset, "from {start:?}");
        }
    }

    #[test]
    fn every_state_is_reachable_from_reset() {
        let mut reached = std::collections::HashSet::new();
        let mut frontier = vec![TapState::TestLogicReset];
        while let Some(state) = frontier.pop() {
            if reached.insert(state) {
                frontier.push(state.step(false));
                frontier.push(state.step(true));
            }
        }
        assert_eq!(reached.len(), TapState::ALL.len());
    }
}
