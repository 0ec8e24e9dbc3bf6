//! Two-state monitoring session control.

/// Whether polling is allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Monitoring,
}

impl SessionState {
    /// Label of the control that changes this state ("Start" while idle).
    pub fn action_label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Start",
            SessionState::Monitoring => "Stop",
        }
    }

    /// Short status word for the header.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "IDLE",
            SessionState::Monitoring => "LIVE",
        }
    }
}

/// The start/stop control gating the poll loop.
///
/// Starting is reported to the caller so it can sync charts and open a
/// poll chain. Stopping only flips the state; the poll loop notices at its
/// next tick boundary.
#[derive(Debug, Clone, Default)]
pub struct SessionToggle {
    state: SessionState,
}

impl SessionToggle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_monitoring(&self) -> bool {
        self.state == SessionState::Monitoring
    }

    /// Returns `true` if this call moved the session from idle to monitoring.
    pub fn start(&mut self) -> bool {
        let transitioned = self.state == SessionState::Idle;
        self.state = SessionState::Monitoring;
        transitioned
    }

    /// Returns `true` if this call moved the session from monitoring to idle.
    pub fn stop(&mut self) -> bool {
        let transitioned = self.state == SessionState::Monitoring;
        self.state = SessionState::Idle;
        transitioned
    }
}
