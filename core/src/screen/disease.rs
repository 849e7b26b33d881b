//! Disease detection screen: one photo in, one analysis out.

use std::sync::Arc;

use super::{submit, Plan};
use crate::dispatch::{Dispatcher, Phase, Reducer, Screen};
use crate::error::ValidationError;
use crate::resolve::{Alert, Permission, Resolution};
use crate::session::{IdentityProvider, SessionContext};
use crate::transport::Transport;
use crate::types::DiseaseAnalysis;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiseaseState {
    /// Base64 photo from the camera or library.
    pub image: Option<String>,
    pub description: String,
    pub phase: Phase,
    pub analysis: Option<String>,
    pub alert: Option<Alert>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiseaseEvent {
    ImageSelected(String),
    DescriptionChanged(String),
    PermissionDenied(Permission),
    Rejected(ValidationError),
    Submitted,
    Resolved(Resolution<DiseaseAnalysis>),
    AlertDismissed,
    Reset,
}

impl Reducer for DiseaseState {
    type Event = DiseaseEvent;

    fn reduce(mut self, event: DiseaseEvent) -> Self {
        match event {
            DiseaseEvent::ImageSelected(data) => {
                self.image = Some(data);
                self.analysis = None;
            }
            DiseaseEvent::DescriptionChanged(text) => self.description = text,
            DiseaseEvent::PermissionDenied(permission) => {
                self.alert = Some(Alert::permission_denied(permission));
            }
            DiseaseEvent::Rejected(err) => self.alert = Some(Alert::validation(&err)),
            DiseaseEvent::Submitted => {
                if self.phase == Phase::Idle && self.image.is_some() {
                    self.phase = Phase::Submitting;
                    self.alert = None;
                }
            }
            DiseaseEvent::Resolved(resolution) => {
                if self.phase != Phase::Submitting {
                    return self;
                }
                self.phase = Phase::Idle;
                match resolution {
                    Resolution::Live(result) | Resolution::Degraded { value: result, .. } => {
                        self.analysis = Some(result.analysis);
                    }
                    Resolution::Failed(alert) => self.alert = Some(alert),
                }
            }
            DiseaseEvent::AlertDismissed => self.alert = None,
            DiseaseEvent::Reset => {
                if self.phase == Phase::Idle {
                    self = Self::default();
                }
            }
        }
        self
    }
}

pub struct DiseaseController<T> {
    dispatcher: Arc<Dispatcher<T>>,
    session: SessionContext,
    screen: Screen<DiseaseState>,
}

impl<T: Transport> DiseaseController<T> {
    pub fn mount(dispatcher: Arc<Dispatcher<T>>, identity: &dyn IdentityProvider) -> Self {
        Self {
            dispatcher,
            session: SessionContext::start(identity),
            screen: Screen::mount(DiseaseState::default()),
        }
    }

    pub fn screen(&self) -> Screen<DiseaseState> {
        self.screen.clone()
    }

    pub fn state(&self) -> DiseaseState {
        self.screen.snapshot()
    }

    pub fn apply(&self, event: DiseaseEvent) {
        self.screen.apply(event);
    }

    pub async fn analyze(&self) -> bool {
        let builder = self.dispatcher.builder(&self.session);
        submit(
            &self.dispatcher,
            &self.screen,
            |state: &DiseaseState| {
                if state.phase == Phase::Submitting {
                    return Plan::Skip;
                }
                match builder.detect_disease(state.image.as_deref(), &state.description) {
                    Ok(endpoint) => Plan::Dispatch(DiseaseEvent::Submitted, endpoint),
                    Err(err) => Plan::Reject(DiseaseEvent::Rejected(err)),
                }
            },
            DiseaseEvent::Resolved,
        )
        .await
    }
}

impl<T> Drop for DiseaseController<T> {
    fn drop(&mut self) {
        self.screen.close();
    }
}
