//! Input-domain conditioning: two-stage synchronizers and TCK edge detection.

/// Two-stage synchronizer for one externally driven line.
///
/// The external protocol lines have no known phase relationship to the
/// internal clock; each passes through two sequential stages before any other
/// logic reads it. Pure pass-through with two ticks of added latency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Synchronizer {
    stage1: bool,
    stage2: bool,
}

impl Synchronizer {
    /// Creates a synchronizer with both stages low.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stage1: false,
            stage2: false,
        }
    }

    /// Advances one tick with the raw line level and returns the
    /// synchronized value (the raw level from two ticks ago).
    pub const fn sample(&mut self, raw: bool) -> bool {
        let synchronized = self.stage2;
        self.stage2 = self.stage1;
        self.stage1 = raw;
        synchronized
    }
}

/// Edge activity of the synchronized protocol clock over one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TckEdge {
    /// No transition this tick.
    Steady,
    /// Low-to-high transition.
    Rising,
    /// High-to-low transition.
    Falling,
}

impl TckEdge {
    /// `true` for a low-to-high transition.
    #[must_use]
    pub const fn is_rising(self) -> bool {
        matches!(self, Self::Rising)
    }

    /// `true` for a high-to-low transition.
    #[must_use]
    pub const fn is_falling(self) -> bool {
        matches!(self, Self::Falling)
    }
}

/// Rising/falling pulse derivation for the synchronized protocol clock.
///
/// Also carries the one-tick-delayed copy of the falling pulse (the
/// "settled low" signal). That pulse is consumed by no state action; it is
/// an intentional latent signal of the modeled hardware, kept for
/// signal-level compatibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct EdgeDetector {
    previous: bool,
    fell_last_tick: bool,
    settled_low: bool,
}

impl EdgeDetector {
    /// Creates a detector that treats the clock as having been low.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            previous: false,
            fell_last_tick: false,
            settled_low: false,
        }
    }

    /// Advances one tick with the synchronized clock level and classifies
    /// the transition.
    pub const fn detect(&mut self, tck: bool) -> TckEdge {
        let edge = match (self.previous, tck) {
            (false, true) => TckEdge::Rising,
            (true, false) => TckEdge::Falling,
            _ => TckEdge::Steady,
        };
        self.settled_low = self.fell_last_tick;
        self.fell_last_tick = edge.is_falling();
        self.previous = tck;
        edge
    }

    /// The delayed falling pulse: high exactly one tick after each falling
    /// edge.
    #[must_use]
    pub const fn settled_low(&self) -> bool {
        self.settled_low
    }
}
