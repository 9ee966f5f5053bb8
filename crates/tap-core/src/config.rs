//! Engine configuration and setup-time validation.

use thiserror::Error;

use crate::shift::width_mask;

/// Widest supported scan path (IR or any register port), in bits.
pub const MAX_SCAN_WIDTH: u8 = 64;

/// Default instruction register width.
pub const DEFAULT_IR_WIDTH: u8 = 5;

/// Default instruction register reset value.
pub const DEFAULT_IR_RESET: u64 = 0x01;

/// Layout of one addressable register: its instruction code and bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterLayout {
    /// Instruction code that selects this register.
    pub address: u64,
    /// Width of the register's read and write buses, in bits.
    pub width: u8,
}

/// Immutable configuration for a TAP engine instance.
///
/// The register list sizes each port and the shared DR scan path (DR width =
/// maximum port width). Widths are fixed for the life of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TapConfig {
    /// Instruction register width, in bits.
    pub ir_width: u8,
    /// Value reloaded into the instruction register during TEST-LOGIC-RESET.
    pub ir_reset: u64,
    /// Addressable register layouts, one per instruction code.
    pub registers: Vec<RegisterLayout>,
}

impl TapConfig {
    /// Creates a configuration with the canonical IR defaults (width 5,
    /// reset value `0x01`).
    #[must_use]
    pub const fn new(registers: Vec<RegisterLayout>) -> Self {
        Self {
            ir_width: DEFAULT_IR_WIDTH,
            ir_reset: DEFAULT_IR_RESET,
            registers,
        }
    }

    /// Checks every setup-time invariant of the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] violated, in declaration order of
    /// the register list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ir_width == 0 || self.ir_width > MAX_SCAN_WIDTH {
            return Err(ConfigError::IrWidth {
                width: self.ir_width,
            });
        }
        if self.ir_reset & !width_mask(self.ir_width) != 0 {
            return Err(ConfigError::IrResetRange {
                value: self.ir_reset,
                width: self.ir_width,
            });
        }
        if self.registers.is_empty() {
            return Err(ConfigError::EmptyRegisterMap);
        }

        let mut seen = std::collections::BTreeSet::new();
        for layout in &self.registers {
            if layout.width == 0 || layout.width > MAX_SCAN_WIDTH {
                return Err(ConfigError::RegisterWidth {
                    address: layout.address,
                    width: layout.width,
                });
            }
            if layout.address & !width_mask(self.ir_width) != 0 {
                return Err(ConfigError::AddressRange {
                    address: layout.address,
                    ir_width: self.ir_width,
                });
            }
            if !seen.insert(layout.address) {
                return Err(ConfigError::DuplicateAddress {
                    address: layout.address,
                });
            }
        }
        Ok(())
    }
}

/// Configuration faults rejected before the state machine begins running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ConfigError {
    /// Instruction register width outside the supported scan-path range.
    #[error("instruction register width {width} is outside 1..={MAX_SCAN_WIDTH}")]
    IrWidth {
        /// Rejected width.
        width: u8,
    },
    /// Instruction register reset value wider than the instruction register.
    #[error("instruction register reset value {value:#x} does not fit {width} bits")]
    IrResetRange {
        /// Rejected reset value.
        value: u64,
        /// Configured instruction register width.
        width: u8,
    },
    /// No registers configured; the DR scan-path width would be undefined.
    #[error("register map is empty")]
    EmptyRegisterMap,
    /// Two register layouts share one instruction code.
    #[error("duplicate register address {address:#x}")]
    DuplicateAddress {
        /// The repeated instruction code.
        address: u64,
    },
    /// Register width outside the supported scan-path range.
    #[error("register {address:#x} width {width} is outside 1..={MAX_SCAN_WIDTH}")]
    RegisterWidth {
        /// Instruction code of the rejected layout.
        address: u64,
        /// Rejected width.
        width: u8,
    },
    /// Register address that the configured instruction register cannot hold.
    #[error("register address {address:#x} does not fit a {ir_width}-bit instruction register")]
    AddressRange {
        /// Rejected instruction code.
        address: u64,
        /// Configured instruction register width.
        ir_width: u8,
    },
}
