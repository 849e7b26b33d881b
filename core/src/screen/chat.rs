//! Chat screen: an append-only conversation with the farming assistant.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{submit, Plan};
use crate::dispatch::{Dispatcher, Phase, Reducer, Screen};
use crate::error::ValidationError;
use crate::resolve::{Alert, Permission, Resolution};
use crate::session::{IdentityProvider, SessionContext};
use crate::transport::Transport;
use crate::types::ChatReply;

pub const WELCOME_MESSAGE: &str =
    "സ്വാഗതം! നിങ്ങളുടെ കൃഷി ചോദ്യങ്ങൾ ചോദിക്കൂ. Welcome! Ask your farming questions.";

/// Bubble text for a user turn that only carries a photo.
pub const IMAGE_ONLY_BUBBLE: &str = "Shared an image";

pub const QUICK_QUESTIONS: [&str; 5] = [
    "What crops are best for this season?",
    "How to prevent pests organically?",
    "വിത്തുകൾ എപ്പോൾ നടണം?",
    "Soil preparation tips",
    "Irrigation schedule help",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
    pub has_image: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatState {
    messages: Vec<ChatMessage>,
    pub input: String,
    pub image: Option<String>,
    pub phase: Phase,
    /// Set while the last bot reply was a stand-in.
    pub offline_notice: Option<String>,
    pub alert: Option<Alert>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    InputChanged(String),
    QuickQuestion(String),
    ImageAttached(String),
    ImageCleared,
    PermissionDenied(Permission),
    Rejected(ValidationError),
    Submitted { at: DateTime<Utc> },
    Resolved { resolution: Resolution<ChatReply>, at: DateTime<Utc> },
    AlertDismissed,
}

impl ChatState {
    /// Fresh conversation holding only the welcome message.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            messages: vec![ChatMessage {
                id: Uuid::new_v4(),
                text: WELCOME_MESSAGE.to_string(),
                is_user: false,
                timestamp: now,
                has_image: false,
            }],
            input: String::new(),
            image: None,
            phase: Phase::Idle,
            offline_notice: None,
            alert: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether the send control is enabled.
    pub fn can_submit(&self) -> bool {
        self.phase == Phase::Idle && (!self.input.trim().is_empty() || self.image.is_some())
    }

    fn push(&mut self, text: String, is_user: bool, has_image: bool, at: DateTime<Utc>) {
        let timestamp = self.messages.last().map_or(at, |last| at.max(last.timestamp));
        self.messages.push(ChatMessage {
            id: Uuid::new_v4(),
            text,
            is_user,
            timestamp,
            has_image,
        });
    }
}

impl Reducer for ChatState {
    type Event = ChatEvent;

    fn reduce(mut self, event: ChatEvent) -> Self {
        match event {
            ChatEvent::InputChanged(text) | ChatEvent::QuickQuestion(text) => self.input = text,
            ChatEvent::ImageAttached(data) => self.image = Some(data),
            ChatEvent::ImageCleared => self.image = None,
            ChatEvent::PermissionDenied(permission) => {
                self.alert = Some(Alert::permission_denied(permission));
            }
            ChatEvent::Rejected(err) => self.alert = Some(Alert::validation(&err)),
            ChatEvent::Submitted { at } => {
                if !self.can_submit() {
                    return self;
                }
                let text = self.input.trim();
                let text = if text.is_empty() { IMAGE_ONLY_BUBBLE } else { text }.to_string();
                let has_image = self.image.is_some();
                self.push(text, true, has_image, at);
                self.input.clear();
                self.alert = None;
                self.phase = Phase::Submitting;
            }
            ChatEvent::Resolved { resolution, at } => {
                if self.phase != Phase::Submitting {
                    return self;
                }
                self.phase = Phase::Idle;
                match resolution {
                    Resolution::Live(reply) => {
                        // The photo stays attached until the backend has seen it.
                        self.image = None;
                        self.offline_notice = None;
                        self.push(reply.response, false, false, at);
                    }
                    Resolution::Degraded { value, reason } => {
                        self.offline_notice = Some(reason);
                        self.push(value.response, false, false, at);
                    }
                    Resolution::Failed(alert) => self.alert = Some(alert),
                }
            }
            ChatEvent::AlertDismissed => self.alert = None,
        }
        self
    }
}

/// Owns one mounted chat screen and its session.
pub struct ChatController<T> {
    dispatcher: Arc<Dispatcher<T>>,
    session: SessionContext,
    screen: Screen<ChatState>,
}

impl<T: Transport> ChatController<T> {
    pub fn mount(dispatcher: Arc<Dispatcher<T>>, identity: &dyn IdentityProvider) -> Self {
        Self {
            dispatcher,
            session: SessionContext::start(identity),
            screen: Screen::mount(ChatState::new(Utc::now())),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn screen(&self) -> Screen<ChatState> {
        self.screen.clone()
    }

    pub fn state(&self) -> ChatState {
        self.screen.snapshot()
    }

    pub fn apply(&self, event: ChatEvent) {
        self.screen.apply(event);
    }

    /// Send the current draft. The user bubble is appended before the call;
    /// the bot bubble (live or apology) when it resolves.
    pub async fn send(&self) -> bool {
        let builder = self.dispatcher.builder(&self.session);
        submit(
            &self.dispatcher,
            &self.screen,
            |state: &ChatState| {
                if state.phase == Phase::Submitting {
                    return Plan::Skip;
                }
                match builder.chat(&state.input, state.image.as_deref()) {
                    Ok(endpoint) => {
                        Plan::Dispatch(ChatEvent::Submitted { at: Utc::now() }, endpoint)
                    }
                    Err(err) => Plan::Reject(ChatEvent::Rejected(err)),
                }
            },
            |resolution| ChatEvent::Resolved {
                resolution,
                at: Utc::now(),
            },
        )
        .await
    }
}

impl<T> Drop for ChatController<T> {
    fn drop(&mut self) {
        self.screen.close();
    }
}
