//! Response resolver: one explicit failure policy per endpoint.
//!
//! # Design
//! Every dispatched request ends in a [`Resolution`]. A decoded success is
//! `Live`. A failure either substitutes a stand-in value, tagged `Degraded`
//! with the reason so the screen can show an offline notice, or becomes a
//! blocking `Failed` alert that leaves screen data untouched. Which one
//! applies is decided by the endpoint's [`Fallback`] impl and nowhere else.

use chrono::{DateTime, Utc};

use crate::endpoint::{
    ChatHistory, CreateFarmer, DetectDisease, Endpoint, Escalate, GetFarmer, GetWeather, Health,
    ListEscalations, ListFarmers, SendChat, Translate, UpdateFarmer,
};
use crate::error::{ApiError, ValidationError};
use crate::types::{ChatReply, FarmerProfile, WeatherSnapshot};

/// Bot reply appended when the chat backend cannot be reached.
pub const CHAT_APOLOGY: &str =
    "Sorry, I couldn't process your message. Please try again or contact support.";

pub const PLACEHOLDER_TEMPERATURE: f64 = 28.5;
pub const PLACEHOLDER_HUMIDITY: f64 = 75.0;
pub const PLACEHOLDER_RAINFALL: f64 = 5.2;
pub const PLACEHOLDER_FORECAST: &str = "Partly cloudy with chance of light rain";

/// A blocking, user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

/// Device capability the farmer declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Camera,
    PhotoLibrary,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn validation(err: &ValidationError) -> Self {
        let title = match err {
            ValidationError::MissingImage => "No Image",
            ValidationError::EmptyTranslationText | ValidationError::EmptyMessage => {
                "Input Required"
            }
            ValidationError::SameLanguage | ValidationError::MissingLanguage => "Language Error",
            ValidationError::InvalidImage | ValidationError::ImageTooLarge { .. } => "Image Error",
            _ => "Error",
        };
        Self::new(title, err.to_string())
    }

    pub fn permission_denied(permission: Permission) -> Self {
        let message = match permission {
            Permission::Camera => "Camera permission is required to take photos.",
            Permission::PhotoLibrary => "Camera roll permission is required to select images.",
        };
        Self::new("Permission needed", message)
    }
}

/// Outcome of one request as seen by a screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    /// Decoded from a successful backend response.
    Live(T),
    /// Locally fabricated stand-in; `reason` explains what failed.
    Degraded { value: T, reason: String },
    /// Nothing to show; surface the alert.
    Failed(Alert),
}

impl<T> Resolution<T> {
    pub fn is_live(&self) -> bool {
        matches!(self, Resolution::Live(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Resolution::Degraded { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Resolution::Live(value) | Resolution::Degraded { value, .. } => Some(value),
            Resolution::Failed(_) => None,
        }
    }

    pub fn alert(&self) -> Option<&Alert> {
        match self {
            Resolution::Failed(alert) => Some(alert),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Live(value) => Resolution::Live(f(value)),
            Resolution::Degraded { value, reason } => Resolution::Degraded {
                value: f(value),
                reason,
            },
            Resolution::Failed(alert) => Resolution::Failed(alert),
        }
    }
}

/// Failure policy of an endpoint.
pub trait Fallback: Endpoint {
    /// Resolution to use when the request failed with `error`. `now` stamps
    /// any fabricated value.
    fn fallback(&self, error: &ApiError, now: DateTime<Utc>) -> Resolution<Self::Response>;
}

/// Apply the endpoint's policy to a finished exchange.
pub fn resolve<E: Fallback>(
    endpoint: &E,
    outcome: Result<E::Response, ApiError>,
    now: DateTime<Utc>,
) -> Resolution<E::Response> {
    match outcome {
        Ok(value) => Resolution::Live(value),
        Err(ApiError::Validation(err)) => Resolution::Failed(Alert::validation(&err)),
        Err(error) => {
            let resolution = endpoint.fallback(&error, now);
            match &resolution {
                Resolution::Degraded { reason, .. } => {
                    tracing::warn!(endpoint = E::NAME, %reason, "serving fallback data");
                }
                Resolution::Failed(alert) => {
                    tracing::warn!(
                        endpoint = E::NAME,
                        %error,
                        title = %alert.title,
                        "request failed"
                    );
                }
                Resolution::Live(_) => {}
            }
            resolution
        }
    }
}

fn offline_reason(error: &ApiError) -> String {
    match error {
        ApiError::Transport(_) => "Backend unreachable; showing offline data".to_string(),
        ApiError::NotFound => "No record on the server; showing demo data".to_string(),
        ApiError::HttpError { status, .. } => {
            format!("Backend returned HTTP {status}; showing offline data")
        }
        other => format!("Unusable backend response ({other}); showing offline data"),
    }
}

impl Fallback for SendChat {
    fn fallback(&self, error: &ApiError, _now: DateTime<Utc>) -> Resolution<ChatReply> {
        Resolution::Degraded {
            value: ChatReply {
                response: CHAT_APOLOGY.to_string(),
                message_id: None,
                timestamp: None,
            },
            reason: offline_reason(error),
        }
    }
}

impl Fallback for DetectDisease {
    fn fallback(&self, _error: &ApiError, _now: DateTime<Utc>) -> Resolution<Self::Response> {
        Resolution::Failed(Alert::new(
            "Analysis Failed",
            "Sorry, could not analyze the image. Please try again.",
        ))
    }
}

impl Fallback for Translate {
    fn fallback(&self, _error: &ApiError, _now: DateTime<Utc>) -> Resolution<Self::Response> {
        Resolution::Failed(Alert::new(
            "Translation Failed",
            "Sorry, could not translate the text. Please try again.",
        ))
    }
}

impl Fallback for GetWeather {
    fn fallback(&self, error: &ApiError, now: DateTime<Utc>) -> Resolution<WeatherSnapshot> {
        Resolution::Degraded {
            value: placeholder_weather(&self.location, now),
            reason: offline_reason(error),
        }
    }
}

impl Fallback for GetFarmer {
    fn fallback(&self, error: &ApiError, now: DateTime<Utc>) -> Resolution<FarmerProfile> {
        Resolution::Degraded {
            value: demo_profile(&self.id, now),
            reason: offline_reason(error),
        }
    }
}

fn save_failed<T>() -> Resolution<T> {
    Resolution::Failed(Alert::new("Error", "Failed to save profile. Please try again."))
}

impl Fallback for CreateFarmer {
    fn fallback(&self, _error: &ApiError, _now: DateTime<Utc>) -> Resolution<FarmerProfile> {
        save_failed()
    }
}

impl Fallback for UpdateFarmer {
    fn fallback(&self, _error: &ApiError, _now: DateTime<Utc>) -> Resolution<()> {
        save_failed()
    }
}

macro_rules! alert_fallback {
    ($endpoint:ty, $title:expr, $message:expr) => {
        impl Fallback for $endpoint {
            fn fallback(
                &self,
                _error: &ApiError,
                _now: DateTime<Utc>,
            ) -> Resolution<Self::Response> {
                Resolution::Failed(Alert::new($title, $message))
            }
        }
    };
}

alert_fallback!(Health, "Offline", "The farming assistant service is not reachable.");
alert_fallback!(ListFarmers, "Error", "Could not load farmer profiles. Please try again.");
alert_fallback!(ChatHistory, "Error", "Could not load previous conversations. Please try again.");
alert_fallback!(
    Escalate,
    "Escalation Failed",
    "Could not reach the agriculture officers. Please try again."
);
alert_fallback!(ListEscalations, "Error", "Could not load your escalations. Please try again.");

/// Stand-in reading for `location`; every numeric field populated.
pub fn placeholder_weather(location: &str, now: DateTime<Utc>) -> WeatherSnapshot {
    WeatherSnapshot {
        location: location.to_string(),
        temperature: PLACEHOLDER_TEMPERATURE,
        humidity: PLACEHOLDER_HUMIDITY,
        rainfall: PLACEHOLDER_RAINFALL,
        forecast: PLACEHOLDER_FORECAST.to_string(),
        updated_at: now,
    }
}

/// Demo record shown when the farmer's profile cannot be loaded.
pub fn demo_profile(id: &str, now: DateTime<Utc>) -> FarmerProfile {
    FarmerProfile {
        id: id.to_string(),
        name: "Demo Farmer".to_string(),
        phone: "+91 9876543210".to_string(),
        location: "Kochi".to_string(),
        crops: vec!["Rice".to_string(), "Vegetables".to_string()],
        farm_size: Some("2-5 acres".to_string()),
        created_at: now,
    }
}
