//! Typed endpoint descriptors.
//!
//! # Design
//! Each backend route is a small struct implementing [`Endpoint`]: it knows
//! its method, its path (with percent-encoded segments), the JSON body it
//! carries and the type its success body decodes into. `FarmClient::build`
//! and `FarmClient::parse` are written once against the trait, so adding a
//! route never duplicates request or status handling.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, Result};
use crate::http::HttpMethod;
use crate::types::{
    ChatRecord, ChatReply, ChatRequest, DiseaseAnalysis, DiseaseRequest, Escalation,
    EscalationReceipt, EscalationRequest, FarmerProfile, HealthStatus, ProfileInput,
    TranslateRequest, Translation, WeatherSnapshot,
};

/// A backend route: path, method, request type and response type.
pub trait Endpoint {
    /// JSON body sent with the request. `()` for routes without one.
    type Body: Serialize;
    /// Decoded success body.
    type Response: DeserializeOwned;

    const METHOD: HttpMethod;
    /// Short name used in logs.
    const NAME: &'static str;

    /// Path below the base URL, starting with `/`.
    fn path(&self) -> String;

    fn body(&self) -> Option<&Self::Body> {
        None
    }

    fn decode(body: &str) -> Result<Self::Response> {
        serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }
}

fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// `GET /api/`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Health;

impl Endpoint for Health {
    type Body = ();
    type Response = HealthStatus;
    const METHOD: HttpMethod = HttpMethod::Get;
    const NAME: &'static str = "health";

    fn path(&self) -> String {
        "/api/".to_string()
    }
}

/// `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendChat(pub ChatRequest);

impl Endpoint for SendChat {
    type Body = ChatRequest;
    type Response = ChatReply;
    const METHOD: HttpMethod = HttpMethod::Post;
    const NAME: &'static str = "chat";

    fn path(&self) -> String {
        "/api/chat".to_string()
    }

    fn body(&self) -> Option<&ChatRequest> {
        Some(&self.0)
    }
}

/// `GET /api/chat/{farmer_id}[?session_id=...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatHistory {
    pub farmer_id: String,
    pub session_id: Option<String>,
}

impl Endpoint for ChatHistory {
    type Body = ();
    type Response = Vec<ChatRecord>;
    const METHOD: HttpMethod = HttpMethod::Get;
    const NAME: &'static str = "chat_history";

    fn path(&self) -> String {
        let mut path = format!("/api/chat/{}", segment(&self.farmer_id));
        if let Some(session_id) = &self.session_id {
            path.push_str("?session_id=");
            path.push_str(&segment(session_id));
        }
        path
    }
}

/// `POST /api/detect-disease`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectDisease(pub DiseaseRequest);

impl Endpoint for DetectDisease {
    type Body = DiseaseRequest;
    type Response = DiseaseAnalysis;
    const METHOD: HttpMethod = HttpMethod::Post;
    const NAME: &'static str = "detect_disease";

    fn path(&self) -> String {
        "/api/detect-disease".to_string()
    }

    fn body(&self) -> Option<&DiseaseRequest> {
        Some(&self.0)
    }
}

/// `POST /api/translate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translate(pub TranslateRequest);

impl Endpoint for Translate {
    type Body = TranslateRequest;
    type Response = Translation;
    const METHOD: HttpMethod = HttpMethod::Post;
    const NAME: &'static str = "translate";

    fn path(&self) -> String {
        "/api/translate".to_string()
    }

    fn body(&self) -> Option<&TranslateRequest> {
        Some(&self.0)
    }
}

/// `GET /api/weather/{location}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetWeather {
    pub location: String,
}

impl Endpoint for GetWeather {
    type Body = ();
    type Response = WeatherSnapshot;
    const METHOD: HttpMethod = HttpMethod::Get;
    const NAME: &'static str = "weather";

    fn path(&self) -> String {
        format!("/api/weather/{}", segment(&self.location))
    }
}

/// `GET /api/farmers/{id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetFarmer {
    pub id: String,
}

impl Endpoint for GetFarmer {
    type Body = ();
    type Response = FarmerProfile;
    const METHOD: HttpMethod = HttpMethod::Get;
    const NAME: &'static str = "get_farmer";

    fn path(&self) -> String {
        format!("/api/farmers/{}", segment(&self.id))
    }
}

/// `GET /api/farmers`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFarmers;

impl Endpoint for ListFarmers {
    type Body = ();
    type Response = Vec<FarmerProfile>;
    const METHOD: HttpMethod = HttpMethod::Get;
    const NAME: &'static str = "list_farmers";

    fn path(&self) -> String {
        "/api/farmers".to_string()
    }
}

/// `POST /api/farmers`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFarmer(pub ProfileInput);

impl Endpoint for CreateFarmer {
    type Body = ProfileInput;
    type Response = FarmerProfile;
    const METHOD: HttpMethod = HttpMethod::Post;
    const NAME: &'static str = "create_farmer";

    fn path(&self) -> String {
        "/api/farmers".to_string()
    }

    fn body(&self) -> Option<&ProfileInput> {
        Some(&self.0)
    }
}

/// `PUT /api/farmers/{id}`. The response body is not part of the contract
/// and is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFarmer {
    pub id: String,
    pub input: ProfileInput,
}

impl Endpoint for UpdateFarmer {
    type Body = ProfileInput;
    type Response = ();
    const METHOD: HttpMethod = HttpMethod::Put;
    const NAME: &'static str = "update_farmer";

    fn path(&self) -> String {
        format!("/api/farmers/{}", segment(&self.id))
    }

    fn body(&self) -> Option<&ProfileInput> {
        Some(&self.input)
    }

    fn decode(_body: &str) -> Result<()> {
        Ok(())
    }
}

/// `POST /api/escalate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escalate(pub EscalationRequest);

impl Endpoint for Escalate {
    type Body = EscalationRequest;
    type Response = EscalationReceipt;
    const METHOD: HttpMethod = HttpMethod::Post;
    const NAME: &'static str = "escalate";

    fn path(&self) -> String {
        "/api/escalate".to_string()
    }

    fn body(&self) -> Option<&EscalationRequest> {
        Some(&self.0)
    }
}

/// `GET /api/escalations/{farmer_id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEscalations {
    pub farmer_id: String,
}

impl Endpoint for ListEscalations {
    type Body = ();
    type Response = Vec<Escalation>;
    const METHOD: HttpMethod = HttpMethod::Get;
    const NAME: &'static str = "list_escalations";

    fn path(&self) -> String {
        format!("/api/escalations/{}", segment(&self.farmer_id))
    }
}
