//! Per-screen state, reducers and controllers.
//!
//! Every screen follows the same loop: the controller checks the state,
//! builds a request (or rejects it locally), marks the screen `Submitting`,
//! dispatches under the screen's cancellation token, and feeds the
//! resolution back through the reducer. Reducers are pure; controllers are
//! the only place that touches the clock or the network.

pub mod chat;
pub mod disease;
pub mod profile;
pub mod translator;
pub mod weather;

use crate::dispatch::{Dispatcher, Reducer, Screen};
use crate::resolve::{Fallback, Resolution};
use crate::transport::Transport;

/// What a controller decided after looking at the current state.
pub(crate) enum Plan<Ev, E> {
    /// Nothing to do (already submitting, or nothing to send).
    Skip,
    /// Refused locally; apply the event, make no call.
    Reject(Ev),
    /// Apply the event, then dispatch the endpoint.
    Dispatch(Ev, E),
}

/// Drive one submit cycle. Returns `true` when a resolution was applied,
/// `false` when the plan skipped or rejected, or the screen closed first.
pub(crate) async fn submit<T, S, E>(
    dispatcher: &Dispatcher<T>,
    screen: &Screen<S>,
    plan: impl FnOnce(&S) -> Plan<S::Event, E>,
    finish: impl FnOnce(Resolution<E::Response>) -> S::Event,
) -> bool
where
    T: Transport,
    S: Reducer + Clone,
    E: Fallback + Sync,
{
    let endpoint = screen.transition(|state| match plan(state) {
        Plan::Skip => (None, None),
        Plan::Reject(event) => (Some(event), None),
        Plan::Dispatch(event, endpoint) => (Some(event), Some(endpoint)),
    });
    let Some(endpoint) = endpoint else {
        return false;
    };
    match dispatcher.dispatch(&endpoint, screen.token()).await {
        Some(resolution) => {
            screen.apply(finish(resolution));
            !screen.is_closed()
        }
        None => false,
    }
}
