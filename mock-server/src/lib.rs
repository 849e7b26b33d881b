//! In-memory mock of the farm assistant backend.
//!
//! Every `/api` route the client uses is served from process-local state
//! with deterministic canned replies. Timestamps are written naive (no
//! offset) the way the real backend writes them. `failing_app` answers 500
//! on every route and is used to drive the client's fallbacks.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const HEALTH_MESSAGE: &str = "AI Farming Assistant API is running";
pub const ESCALATION_MESSAGE: &str =
    "Your query has been forwarded to agriculture officers. They will contact you soon.";
pub const ESCALATION_ETA: &str = "24-48 hours";

/// Readings served for any location.
pub const WEATHER_TEMPERATURE: f64 = 31.0;
pub const WEATHER_HUMIDITY: f64 = 82.0;
pub const WEATHER_RAINFALL: f64 = 12.5;
pub const WEATHER_FORECAST: &str = "Heavy rain with thunderstorms";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Farmer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub location: String,
    #[serde(default)]
    pub crops: Vec<String>,
    #[serde(default)]
    pub farm_size: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Deserialize)]
pub struct FarmerInput {
    pub name: String,
    pub phone: String,
    pub location: String,
    #[serde(default)]
    pub crops: Vec<String>,
    #[serde(default)]
    pub farm_size: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatInput {
    pub farmer_id: String,
    pub message: String,
    #[serde(default = "text_type")]
    pub message_type: String,
    #[serde(default)]
    pub image_data: Option<String>,
    pub session_id: String,
}

fn text_type() -> String {
    "text".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatEntry {
    pub id: String,
    pub farmer_id: String,
    pub message: String,
    pub response: String,
    pub message_type: String,
    pub image_data: Option<String>,
    pub created_at: NaiveDateTime,
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct DiseaseInput {
    pub farmer_id: String,
    pub image_data: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct TranslateInput {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
}

#[derive(Deserialize)]
pub struct EscalationInput {
    pub farmer_id: String,
    pub query: String,
    #[serde(default = "medium")]
    pub priority: String,
}

fn medium() -> String {
    "medium".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EscalationEntry {
    pub id: String,
    pub farmer_id: String,
    pub query: String,
    pub priority: String,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub session_id: Option<String>,
}

#[derive(Default)]
pub struct Store {
    pub farmers: HashMap<String, Farmer>,
    pub chats: Vec<ChatEntry>,
    pub escalations: Vec<EscalationEntry>,
}

pub type Db = Arc<RwLock<Store>>;

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn detail(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": message })))
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/", get(health))
        .route("/api/chat", post(send_chat))
        .route("/api/chat/{farmer_id}", get(chat_history))
        .route("/api/detect-disease", post(detect_disease))
        .route("/api/translate", post(translate))
        .route("/api/weather/{location}", get(weather))
        .route("/api/farmers", get(list_farmers).post(create_farmer))
        .route("/api/farmers/{id}", get(get_farmer).put(update_farmer))
        .route("/api/escalate", post(escalate))
        .route("/api/escalations/{farmer_id}", get(list_escalations))
        .with_state(db)
}

/// Backend that is up but broken: every request gets a 500.
pub fn failing_app() -> Router {
    Router::new().fallback(|| async {
        tracing::warn!("failing mode: rejecting request");
        detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    })
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_failing(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, failing_app()).await
}

async fn health() -> Json<Value> {
    Json(json!({ "message": HEALTH_MESSAGE }))
}

/// Canned assistant reply; echoes the question so tests can match it.
pub fn chat_reply(message: &str, has_image: bool) -> String {
    if has_image {
        format!(
            "I looked at your photo. About \"{message}\": keep the leaves dry and remove affected parts."
        )
    } else {
        format!(
            "About \"{message}\": for Kerala conditions, consider rice, banana and vegetables this season."
        )
    }
}

async fn send_chat(State(db): State<Db>, Json(input): Json<ChatInput>) -> ApiResult<Json<Value>> {
    if input.message.trim().is_empty() {
        return Err(detail(StatusCode::UNPROCESSABLE_ENTITY, "message must not be empty"));
    }
    let entry = ChatEntry {
        id: Uuid::new_v4().to_string(),
        response: chat_reply(&input.message, input.image_data.is_some()),
        farmer_id: input.farmer_id,
        message: input.message,
        message_type: input.message_type,
        image_data: input.image_data,
        created_at: now(),
        session_id: input.session_id,
    };
    tracing::info!(farmer_id = %entry.farmer_id, session_id = %entry.session_id, "chat message");
    let reply = json!({
        "response": entry.response,
        "message_id": entry.id,
        "timestamp": entry.created_at,
    });
    db.write().await.chats.push(entry);
    Ok(Json(reply))
}

/// Newest first, at most 50, optionally narrowed to one session.
async fn chat_history(
    State(db): State<Db>,
    Path(farmer_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<ChatEntry>> {
    let store = db.read().await;
    let mut entries: Vec<ChatEntry> = store
        .chats
        .iter()
        .filter(|c| c.farmer_id == farmer_id)
        .filter(|c| query.session_id.as_ref().is_none_or(|s| *s == c.session_id))
        .cloned()
        .collect();
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries.truncate(50);
    Json(entries)
}

async fn detect_disease(Json(input): Json<DiseaseInput>) -> ApiResult<Json<Value>> {
    if input.image_data.is_empty() {
        return Err(detail(StatusCode::UNPROCESSABLE_ENTITY, "image_data is required"));
    }
    tracing::info!(farmer_id = %input.farmer_id, "disease detection");
    let noted = if input.description.is_empty() {
        String::new()
    } else {
        format!(" You reported: {}.", input.description)
    };
    Ok(Json(json!({
        "analysis": format!(
            "Plant: banana. Issue: Sigatoka leaf spot (moderate).{noted} Treatment: remove affected leaves, spray neem oil weekly."
        ),
        "detection_id": Uuid::new_v4().to_string(),
        "timestamp": now(),
    })))
}

/// A few fixed phrases; anything else is tagged with the target language.
pub fn canned_translation(text: &str, target: &str) -> String {
    match (text, target) {
        ("Thank you", "malayalam") => "നന്ദി".to_string(),
        ("Thank you", "hindi") => "धन्यवाद".to_string(),
        ("Water", "malayalam") => "വെള്ളം".to_string(),
        ("Water", "hindi") => "पानी".to_string(),
        _ => format!("[{target}] {text}"),
    }
}

async fn translate(Json(input): Json<TranslateInput>) -> Json<Value> {
    tracing::info!(source = %input.source_language, target = %input.target_language, "translate");
    Json(json!({
        "original_text": input.text,
        "translated_text": canned_translation(&input.text, &input.target_language),
        "source_language": input.source_language,
        "target_language": input.target_language,
    }))
}

async fn weather(Path(location): Path<String>) -> Json<Value> {
    Json(json!({
        "location": location,
        "temperature": WEATHER_TEMPERATURE,
        "humidity": WEATHER_HUMIDITY,
        "rainfall": WEATHER_RAINFALL,
        "forecast": WEATHER_FORECAST,
        "updated_at": now(),
    }))
}

async fn list_farmers(State(db): State<Db>) -> Json<Vec<Farmer>> {
    let store = db.read().await;
    let mut farmers: Vec<Farmer> = store.farmers.values().cloned().collect();
    farmers.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    farmers.truncate(100);
    Json(farmers)
}

async fn create_farmer(State(db): State<Db>, Json(input): Json<FarmerInput>) -> Json<Farmer> {
    let farmer = Farmer {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        phone: input.phone,
        location: input.location,
        crops: input.crops,
        farm_size: input.farm_size,
        created_at: now(),
    };
    tracing::info!(id = %farmer.id, "farmer created");
    db.write().await.farmers.insert(farmer.id.clone(), farmer.clone());
    Json(farmer)
}

async fn get_farmer(State(db): State<Db>, Path(id): Path<String>) -> ApiResult<Json<Farmer>> {
    let store = db.read().await;
    store
        .farmers
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Farmer not found"))
}

/// Wholesale replace. An unknown id is created under that id.
async fn update_farmer(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<FarmerInput>,
) -> Json<Farmer> {
    let mut store = db.write().await;
    let created_at = store.farmers.get(&id).map_or_else(now, |f| f.created_at);
    let farmer = Farmer {
        id: id.clone(),
        name: input.name,
        phone: input.phone,
        location: input.location,
        crops: input.crops,
        farm_size: input.farm_size,
        created_at,
    };
    tracing::info!(%id, "farmer updated");
    store.farmers.insert(id, farmer.clone());
    Json(farmer)
}

async fn escalate(
    State(db): State<Db>,
    Json(input): Json<EscalationInput>,
) -> ApiResult<Json<Value>> {
    if !matches!(input.priority.as_str(), "low" | "medium" | "high") {
        return Err(detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            "priority must be low, medium or high",
        ));
    }
    let entry = EscalationEntry {
        id: Uuid::new_v4().to_string(),
        farmer_id: input.farmer_id,
        query: input.query,
        priority: input.priority,
        status: "pending".to_string(),
        created_at: now(),
    };
    tracing::info!(farmer_id = %entry.farmer_id, priority = %entry.priority, "escalation");
    let receipt = json!({
        "message": ESCALATION_MESSAGE,
        "escalation_id": entry.id,
        "estimated_response": ESCALATION_ETA,
    });
    db.write().await.escalations.push(entry);
    Ok(Json(receipt))
}

async fn list_escalations(
    State(db): State<Db>,
    Path(farmer_id): Path<String>,
) -> Json<Vec<EscalationEntry>> {
    let store = db.read().await;
    Json(
        store
            .escalations
            .iter()
            .filter(|e| e.farmer_id == farmer_id)
            .take(20)
            .cloned()
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_serialize_without_offset() {
        let farmer = Farmer {
            id: "f1".to_string(),
            name: "Anu".to_string(),
            phone: "1".to_string(),
            location: "Kollam".to_string(),
            crops: vec![],
            farm_size: None,
            created_at: NaiveDateTime::parse_from_str(
                "2024-05-01T10:00:00.5",
                "%Y-%m-%dT%H:%M:%S%.f",
            )
            .unwrap(),
        };
        let json = serde_json::to_value(&farmer).unwrap();
        assert_eq!(json["created_at"], "2024-05-01T10:00:00.500");
    }

    #[test]
    fn farmer_input_defaults_optional_fields() {
        let input: FarmerInput =
            serde_json::from_str(r#"{"name":"Anu","phone":"1","location":"Kollam"}"#).unwrap();
        assert!(input.crops.is_empty());
        assert!(input.farm_size.is_none());
    }

    #[test]
    fn chat_input_defaults_to_text() {
        let input: ChatInput =
            serde_json::from_str(r#"{"farmer_id":"f","message":"hi","session_id":"s"}"#).unwrap();
        assert_eq!(input.message_type, "text");
    }

    #[test]
    fn canned_translations() {
        assert_eq!(canned_translation("Thank you", "malayalam"), "നന്ദി");
        assert_eq!(canned_translation("Good morning", "hindi"), "[hindi] Good morning");
    }

    #[test]
    fn chat_reply_echoes_question() {
        assert!(chat_reply("When to sow?", false).contains("When to sow?"));
        assert!(chat_reply("Leaf spots", true).starts_with("I looked at your photo"));
    }
}
