//! Precomputed status frames and the current-selection logic.

use panelbridge_frame::{Frame, Result};

use crate::protocol;

/// The selectable display states, one per panel button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// Every segment lit; also what the OK button returns to.
    Default,
    /// Only the day-A segment.
    DayA,
    /// Only the day-B segment.
    DayB,
    /// Only the clock digits.
    Clock,
}

/// Holds the precomputed status frames and which one is current.
///
/// Frames are checksummed once at construction and never mutated;
/// switching the current status is a total replacement. Exactly one
/// status is current at any time.
#[derive(Debug)]
pub struct StatusStore {
    default: Frame,
    day_a: Frame,
    day_b: Frame,
    clock: Frame,
    current: StatusKind,
}

impl StatusStore {
    /// Build the store from the fixed status payload tables.
    pub fn new() -> Result<Self> {
        Ok(Self {
            default: Frame::from_payload(&protocol::STATUS_DEFAULT)?,
            day_a: Frame::from_payload(&protocol::STATUS_DAY_A)?,
            day_b: Frame::from_payload(&protocol::STATUS_DAY_B)?,
            clock: Frame::from_payload(&protocol::STATUS_CLOCK)?,
            current: StatusKind::Default,
        })
    }

    /// The active status frame, for periodic transmission.
    pub fn current(&self) -> &Frame {
        match self.current {
            StatusKind::Default => &self.default,
            StatusKind::DayA => &self.day_a,
            StatusKind::DayB => &self.day_b,
            StatusKind::Clock => &self.clock,
        }
    }

    /// Which status is active.
    pub fn current_kind(&self) -> StatusKind {
        self.current
    }

    /// Switch the current status if the frame is a known button report.
    ///
    /// Matches the incoming payload against the four button command
    /// payloads; returns true on a switch. Anything else leaves the
    /// selection untouched (frames may still be logged elsewhere).
    pub fn select_by_command(&mut self, frame: &Frame) -> bool {
        let kind = match frame.payload() {
            p if p == protocol::BUTTON_DAY_A => StatusKind::DayA,
            p if p == protocol::BUTTON_DAY_B => StatusKind::DayB,
            p if p == protocol::BUTTON_OK => StatusKind::Default,
            p if p == protocol::BUTTON_CLOCK => StatusKind::Clock,
            _ => return false,
        };

        tracing::info!(from = ?self.current, to = ?kind, "status switched by button");
        self.current = kind;
        true
    }
}
