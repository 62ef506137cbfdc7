//! Upload progress phases.
//!
//! The bar is split in two halves: the first tracks bytes handed to the
//! transport, the second is a cosmetic animation played once the response
//! has arrived.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Share of the bar covered by the real transfer.
pub const UPLOAD_SHARE_PERCENT: f64 = 50.0;

/// Upload cycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    #[default]
    Idle,
    Uploading,
    Processing,
    Complete,
}

impl UploadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadPhase::Idle => "idle",
            UploadPhase::Uploading => "uploading",
            UploadPhase::Processing => "processing",
            UploadPhase::Complete => "complete",
        }
    }

    /// Status label shown next to the bar.
    pub fn label(&self) -> &'static str {
        match self {
            UploadPhase::Idle => "",
            UploadPhase::Uploading => "Uploading...",
            UploadPhase::Processing => "Processing with YOLOv5...",
            UploadPhase::Complete => "Complete!",
        }
    }
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current phase and bar percentage (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct UploadProgressState {
    pub phase: UploadPhase,
    pub percent: f64,
}

impl UploadProgressState {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Enter the uploading phase at 0%.
    pub fn begin_upload(&mut self) {
        self.phase = UploadPhase::Uploading;
        self.percent = 0.0;
    }

    /// Record a transfer notification. Returns the new percentage, or `None`
    /// when the notification is ignored (unknown total or wrong phase).
    pub fn record_transfer(&mut self, sent: u64, total: Option<u64>) -> Option<f64> {
        if self.phase != UploadPhase::Uploading {
            return None;
        }
        let total = total.filter(|t| *t > 0)?;
        let ratio = (sent.min(total) as f64) / (total as f64);
        self.percent = ratio * UPLOAD_SHARE_PERCENT;
        Some(self.percent)
    }

    /// Response received: pin the bar to the halfway mark.
    pub fn begin_processing(&mut self) {
        self.phase = UploadPhase::Processing;
        self.percent = UPLOAD_SHARE_PERCENT;
    }

    /// Advance the simulated half by `step` points. Reaching 100 moves the
    /// state to `Complete`. Returns the new percentage.
    pub fn advance(&mut self, step: f64) -> f64 {
        if self.phase != UploadPhase::Processing {
            return self.percent;
        }
        self.percent = (self.percent + step).min(100.0);
        if self.percent >= 100.0 {
            self.phase = UploadPhase::Complete;
        }
        self.percent
    }

    pub fn reset(&mut self) {
        *self = Self::idle();
    }

    pub fn is_complete(&self) -> bool {
        self.phase == UploadPhase::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_scaled_to_first_half() {
        let mut state = UploadProgressState::idle();
        state.begin_upload();
        assert_eq!(state.record_transfer(25, Some(100)), Some(12.5));
        assert_eq!(state.record_transfer(100, Some(100)), Some(50.0));
    }

    #[test]
    fn test_transfer_without_total_is_ignored() {
        let mut state = UploadProgressState::idle();
        state.begin_upload();
        assert_eq!(state.record_transfer(10, None), None);
        assert_eq!(state.record_transfer(10, Some(0)), None);
        assert_eq!(state.percent, 0.0);
    }

    #[test]
    fn test_transfer_ignored_outside_uploading() {
        let mut state = UploadProgressState::idle();
        assert_eq!(state.record_transfer(10, Some(10)), None);
    }

    #[test]
    fn test_simulated_sequence_takes_ten_steps() {
        let mut state = UploadProgressState::idle();
        state.begin_upload();
        state.begin_processing();
        assert_eq!(state.percent, 50.0);

        let mut steps = 0;
        while !state.is_complete() {
            state.advance(5.0);
            steps += 1;
        }
        assert_eq!(steps, 10);
        assert_eq!(state.percent, 100.0);
        assert_eq!(state.phase, UploadPhase::Complete);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut state = UploadProgressState::idle();
        state.begin_upload();
        state.begin_processing();
        state.reset();
        assert_eq!(state, UploadProgressState::idle());
        assert_eq!(state.phase.label(), "");
    }
}
