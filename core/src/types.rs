//! Wire DTOs for the farm assistant backend.
//!
//! # Design
//! These mirror the backend's JSON shapes field for field and are defined
//! independently of the mock-server crate; integration tests catch schema
//! drift. Optional response fields the screens never read (`message_id`,
//! `detection_id`, ...) default to `None` so older backends still parse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a chat turn carries an attached photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub farmer_id: String,
    pub message: String,
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    pub session_id: String,
}

/// Success body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Body of `POST /api/detect-disease`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseRequest {
    pub farmer_id: String,
    pub image_data: String,
    pub description: String,
}

/// Success body of `POST /api/detect-disease`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseAnalysis {
    pub analysis: String,
    #[serde(default)]
    pub detection_id: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Body of `POST /api/translate`. Language fields carry catalogue codes
/// such as `"english"` or `"malayalam"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
}

/// Success body of `POST /api/translate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub original_text: String,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
}

/// Success body of `GET /api/weather/{location}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: String,
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    pub forecast: String,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// A farmer record as owned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmerProfile {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub location: String,
    #[serde(default)]
    pub crops: Vec<String>,
    #[serde(default)]
    pub farm_size: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/farmers` and `PUT /api/farmers/{id}`: a full profile
/// without its id. Saves always send every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileInput {
    pub name: String,
    pub phone: String,
    pub location: String,
    #[serde(default)]
    pub crops: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_size: Option<String>,
}

impl From<&FarmerProfile> for ProfileInput {
    fn from(profile: &FarmerProfile) -> Self {
        Self {
            name: profile.name.clone(),
            phone: profile.phone.clone(),
            location: profile.location.clone(),
            crops: profile.crops.clone(),
            farm_size: profile.farm_size.clone(),
        }
    }
}

/// One stored chat exchange from `GET /api/chat/{farmer_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: String,
    pub farmer_id: String,
    pub message: String,
    pub response: String,
    pub message_type: MessageType,
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub session_id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationStatus {
    Pending,
    Assigned,
    Resolved,
}

/// Body of `POST /api/escalate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationRequest {
    pub farmer_id: String,
    pub query: String,
    pub priority: Priority,
}

/// Success body of `POST /api/escalate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationReceipt {
    pub message: String,
    pub escalation_id: String,
    pub estimated_response: String,
}

/// One entry of `GET /api/escalations/{farmer_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    pub id: String,
    pub farmer_id: String,
    pub query: String,
    pub priority: Priority,
    pub status: EscalationStatus,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Success body of `GET /api/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub message: String,
}

/// Datetime (de)serialization tolerant of the backend's naive UTC values.
///
/// The backend writes UTC datetimes without an offset
/// (`2024-05-01T10:00:00.123456`); anything without an offset is read as UTC.
/// Output is always RFC 3339.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => super::serialize(dt, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn chat_request_omits_absent_image() {
        let req = ChatRequest {
            farmer_id: "farmer_demo_001".to_string(),
            message: "Hello".to_string(),
            message_type: MessageType::Text,
            image_data: None,
            session_id: "s1".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["message_type"], "text");
        assert!(json.get("image_data").is_none());
    }

    #[test]
    fn naive_backend_timestamp_is_read_as_utc() {
        let body = r#"{"location":"Kochi","temperature":28.5,"humidity":75.0,"rainfall":5.2,
            "forecast":"Sunny","updated_at":"2024-05-01T10:00:00.123456"}"#;
        let snapshot: WeatherSnapshot = serde_json::from_str(body).unwrap();
        assert_eq!(
            snapshot.updated_at.timestamp(),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap().timestamp()
        );
    }

    #[test]
    fn rfc3339_timestamp_with_offset_is_normalized() {
        let parsed = timestamp::parse("2024-05-01T15:30:00+05:30").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        let body = r#"{"response":"hi","timestamp":"yesterday"}"#;
        assert!(serde_json::from_str::<ChatReply>(body).is_err());
    }

    #[test]
    fn chat_reply_extra_fields_are_optional() {
        let reply: ChatReply = serde_json::from_str(r#"{"response":"Plant rice."}"#).unwrap();
        assert_eq!(reply.response, "Plant rice.");
        assert!(reply.message_id.is_none());
        assert!(reply.timestamp.is_none());
    }

    #[test]
    fn profile_without_farm_size_parses() {
        let body = r#"{"id":"f1","name":"Anu","phone":"123","location":"Kollam",
            "created_at":"2024-01-01T00:00:00Z"}"#;
        let profile: FarmerProfile = serde_json::from_str(body).unwrap();
        assert!(profile.crops.is_empty());
        assert!(profile.farm_size.is_none());
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(serde_json::to_value(Priority::High).unwrap(), "high");
    }
}
