use crate::emit::DispatchReport;
use crate::visibility::RefreshOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Forever,
    Once,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CadenceState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub overhead: usize,
    pub refreshed: Option<RefreshOutcome>,
    /// `None` when no line was emitted.
    pub dispatch: Option<DispatchReport>,
}

impl CycleReport {
    pub fn emitted(&self) -> bool {
        self.dispatch.is_some()
    }
}
