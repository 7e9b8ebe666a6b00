//! Navigation Gate Module
//!
//! Chooses between the unauthenticated flow (login/register) and the
//! authenticated flow (tabbed screens) from the session state.

use serde::Serialize;

use crate::session::SessionState;

/// Which top-level flow the frontend should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NavFlow {
    Loading,
    AuthFlow,
    MainFlow,
}

/// State machine over `NavFlow`.
///
/// Transitions: `Loading` settles into either flow; login moves
/// `AuthFlow → MainFlow`; logout moves `MainFlow → AuthFlow`. There is no
/// terminal state.
pub struct NavigationGate {
    flow: NavFlow,
}

impl NavigationGate {
    pub fn new() -> Self {
        Self {
            flow: NavFlow::Loading,
        }
    }

    pub fn flow(&self) -> NavFlow {
        self.flow
    }

    /// Feed the latest session state; returns the new flow only when a
    /// transition happened.
    pub fn observe(&mut self, state: &SessionState) -> Option<NavFlow> {
        let next = match state {
            // Session still settling; the gate holds its current flow.
            SessionState::Loading => self.flow,
            SessionState::Authenticated(_) => NavFlow::MainFlow,
            SessionState::Unauthenticated => NavFlow::AuthFlow,
        };

        if next == self.flow {
            None
        } else {
            self.flow = next;
            Some(next)
        }
    }
}

impl Default for NavigationGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_loading() {
        assert_eq!(NavigationGate::new().flow(), NavFlow::Loading);
    }

    #[test]
    fn loading_settles_to_auth_flow_when_unauthenticated() {
        let mut gate = NavigationGate::new();
        assert_eq!(
            gate.observe(&SessionState::Unauthenticated),
            Some(NavFlow::AuthFlow)
        );
    }

    #[test]
    fn loading_settles_to_main_flow_when_authenticated() {
        let mut gate = NavigationGate::new();
        assert_eq!(
            gate.observe(&SessionState::Authenticated("tok".into())),
            Some(NavFlow::MainFlow)
        );
    }

    #[test]
    fn login_moves_auth_flow_to_main_flow() {
        let mut gate = NavigationGate::new();
        gate.observe(&SessionState::Unauthenticated);
        assert_eq!(
            gate.observe(&SessionState::Authenticated("tok".into())),
            Some(NavFlow::MainFlow)
        );
    }

    #[test]
    fn logout_moves_main_flow_to_auth_flow() {
        let mut gate = NavigationGate::new();
        gate.observe(&SessionState::Authenticated("tok".into()));
        assert_eq!(
            gate.observe(&SessionState::Unauthenticated),
            Some(NavFlow::AuthFlow)
        );
    }

    #[test]
    fn redelivery_of_the_same_state_is_not_a_transition() {
        let mut gate = NavigationGate::new();
        gate.observe(&SessionState::Unauthenticated);
        assert_eq!(gate.observe(&SessionState::Unauthenticated), None);
        assert_eq!(gate.flow(), NavFlow::AuthFlow);
    }

    #[test]
    fn loading_session_state_holds_the_current_flow() {
        let mut gate = NavigationGate::new();
        gate.observe(&SessionState::Authenticated("tok".into()));
        assert_eq!(gate.observe(&SessionState::Loading), None);
        assert_eq!(gate.flow(), NavFlow::MainFlow);
    }
}
