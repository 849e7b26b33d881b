//! Translator screen with an in-memory, newest-first history.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{submit, Plan};
use crate::dispatch::{Dispatcher, Phase, Reducer, Screen};
use crate::error::ValidationError;
use crate::resolve::{Alert, Resolution};
use crate::session::{IdentityProvider, SessionContext};
use crate::transport::Transport;
use crate::types::Translation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
}

pub const LANGUAGES: [Language; 3] = [
    Language {
        code: "english",
        name: "English",
        native_name: "English",
    },
    Language {
        code: "hindi",
        name: "Hindi",
        native_name: "हिंदी",
    },
    Language {
        code: "malayalam",
        name: "Malayalam",
        native_name: "മലയാളം",
    },
];

impl Language {
    pub fn find(code: &str) -> Option<&'static Language> {
        LANGUAGES.iter().find(|lang| lang.code == code)
    }
}

/// Picker label such as `Hindi (हिंदी)`; unknown codes are shown as-is.
pub fn language_display(code: &str) -> String {
    match Language::find(code) {
        Some(lang) => format!("{} ({})", lang.name, lang.native_name),
        None => code.to_string(),
    }
}

/// One completed translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRecord {
    pub id: Uuid,
    pub original_text: String,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorState {
    pub input: String,
    pub translated: String,
    pub source_language: String,
    pub target_language: String,
    history: Vec<TranslationRecord>,
    pub phase: Phase,
    pub alert: Option<Alert>,
}

impl Default for TranslatorState {
    fn default() -> Self {
        Self {
            input: String::new(),
            translated: String::new(),
            source_language: "english".to_string(),
            target_language: "hindi".to_string(),
            history: Vec::new(),
            phase: Phase::Idle,
            alert: None,
        }
    }
}

impl TranslatorState {
    /// Completed translations, newest first.
    pub fn history(&self) -> &[TranslationRecord] {
        &self.history
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranslatorEvent {
    InputChanged(String),
    SourceSelected(String),
    TargetSelected(String),
    /// Swap both the languages and the texts.
    Swapped,
    /// Clear the input and output boxes. History is kept.
    Cleared,
    Rejected(ValidationError),
    Submitted,
    Resolved {
        resolution: Resolution<Translation>,
        at: DateTime<Utc>,
    },
    AlertDismissed,
}

impl Reducer for TranslatorState {
    type Event = TranslatorEvent;

    fn reduce(mut self, event: TranslatorEvent) -> Self {
        match event {
            TranslatorEvent::InputChanged(text) => self.input = text,
            TranslatorEvent::SourceSelected(code) => self.source_language = code,
            TranslatorEvent::TargetSelected(code) => self.target_language = code,
            TranslatorEvent::Swapped => {
                std::mem::swap(&mut self.source_language, &mut self.target_language);
                std::mem::swap(&mut self.input, &mut self.translated);
            }
            TranslatorEvent::Cleared => {
                self.input.clear();
                self.translated.clear();
            }
            TranslatorEvent::Rejected(err) => self.alert = Some(Alert::validation(&err)),
            TranslatorEvent::Submitted => {
                if self.phase == Phase::Idle {
                    self.phase = Phase::Submitting;
                    self.alert = None;
                }
            }
            TranslatorEvent::Resolved { resolution, at } => {
                if self.phase != Phase::Submitting {
                    return self;
                }
                self.phase = Phase::Idle;
                match resolution {
                    Resolution::Live(t) => {
                        self.translated = t.translated_text.clone();
                        self.history.insert(
                            0,
                            TranslationRecord {
                                id: Uuid::new_v4(),
                                original_text: t.original_text,
                                translated_text: t.translated_text,
                                source_language: t.source_language,
                                target_language: t.target_language,
                                timestamp: at,
                            },
                        );
                    }
                    // A stand-in is shown but never recorded as a translation.
                    Resolution::Degraded { value, .. } => self.translated = value.translated_text,
                    Resolution::Failed(alert) => self.alert = Some(alert),
                }
            }
            TranslatorEvent::AlertDismissed => self.alert = None,
        }
        self
    }
}

pub struct TranslatorController<T> {
    dispatcher: Arc<Dispatcher<T>>,
    session: SessionContext,
    screen: Screen<TranslatorState>,
}

impl<T: Transport> TranslatorController<T> {
    pub fn mount(dispatcher: Arc<Dispatcher<T>>, identity: &dyn IdentityProvider) -> Self {
        Self {
            dispatcher,
            session: SessionContext::start(identity),
            screen: Screen::mount(TranslatorState::default()),
        }
    }

    pub fn screen(&self) -> Screen<TranslatorState> {
        self.screen.clone()
    }

    pub fn state(&self) -> TranslatorState {
        self.screen.snapshot()
    }

    pub fn apply(&self, event: TranslatorEvent) {
        self.screen.apply(event);
    }

    pub async fn translate(&self) -> bool {
        let builder = self.dispatcher.builder(&self.session);
        submit(
            &self.dispatcher,
            &self.screen,
            |state: &TranslatorState| {
                if state.phase == Phase::Submitting {
                    return Plan::Skip;
                }
                let built =
                    builder.translate(&state.input, &state.source_language, &state.target_language);
                match built {
                    Ok(endpoint) => Plan::Dispatch(TranslatorEvent::Submitted, endpoint),
                    Err(err) => Plan::Reject(TranslatorEvent::Rejected(err)),
                }
            },
            |resolution| TranslatorEvent::Resolved {
                resolution,
                at: Utc::now(),
            },
        )
        .await
    }
}

impl<T> Drop for TranslatorController<T> {
    fn drop(&mut self) {
        self.screen.close();
    }
}
