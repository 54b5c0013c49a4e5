#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedSatellite {
    pub norad_id: u32,
    pub label: String,
}

impl TrackedSatellite {
    pub fn new(norad_id: u32, label: impl Into<String>) -> Self {
        Self {
            norad_id,
            label: label.into(),
        }
    }
}

/// Satellites overhead in the current cycle, in evaluation order.
pub type OverheadSet = Vec<TrackedSatellite>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub norad_id: u32,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub overhead: OverheadSet,
    /// `None` when every satellite was backing off.
    pub refreshed: Option<RefreshOutcome>,
}
