//! Request builder: form state in, typed endpoint out.
//!
//! # Design
//! Every rule a screen used to check inline lives here, so a request that
//! reaches the transport is always well-formed. Builders are pure: they
//! trim, validate and assemble, returning `ValidationError` with the
//! user-facing message when a rule fails. The session context supplies the
//! farmer and session ids threaded into each body.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::endpoint::{
    ChatHistory, CreateFarmer, DetectDisease, Escalate, GetFarmer, GetWeather, ListEscalations,
    SendChat, Translate, UpdateFarmer,
};
use crate::error::ValidationError;
use crate::session::SessionContext;
use crate::types::{
    ChatRequest, DiseaseRequest, EscalationRequest, MessageType, Priority, ProfileInput,
    TranslateRequest,
};

/// Message sent on the farmer's behalf when only a photo is attached.
pub const IMAGE_ONLY_PROMPT: &str = "Please analyze this plant image";

type Result<T> = std::result::Result<T, ValidationError>;

/// Editable profile fields as held by the profile screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    pub name: String,
    pub phone: String,
    pub location: String,
    pub farm_size: String,
    pub crops: Vec<String>,
}

/// Target of a profile save: create when no profile exists yet, otherwise a
/// wholesale update of the farmer's record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSave {
    Create(CreateFarmer),
    Update(UpdateFarmer),
}

impl ProfileSave {
    pub fn input(&self) -> &ProfileInput {
        match self {
            ProfileSave::Create(CreateFarmer(input)) => input,
            ProfileSave::Update(UpdateFarmer { input, .. }) => input,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestBuilder<'a> {
    session: &'a SessionContext,
    max_image_bytes: usize,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(session: &'a SessionContext, max_image_bytes: usize) -> Self {
        Self {
            session,
            max_image_bytes,
        }
    }

    /// Chat needs non-blank text or a photo. A photo alone is sent with
    /// [`IMAGE_ONLY_PROMPT`].
    pub fn chat(&self, text: &str, image: Option<&str>) -> Result<SendChat> {
        let text = text.trim();
        let image = image.map(|raw| self.image(raw)).transpose()?;
        if text.is_empty() && image.is_none() {
            return Err(ValidationError::EmptyMessage);
        }
        let message = if text.is_empty() { IMAGE_ONLY_PROMPT } else { text };
        let message_type = if image.is_some() {
            MessageType::Image
        } else {
            MessageType::Text
        };
        Ok(SendChat(ChatRequest {
            farmer_id: self.session.farmer_id().to_string(),
            message: message.to_string(),
            message_type,
            image_data: image,
            session_id: self.session.session_id().to_string(),
        }))
    }

    pub fn detect_disease(&self, image: Option<&str>, description: &str) -> Result<DetectDisease> {
        let image = image.ok_or(ValidationError::MissingImage)?;
        Ok(DetectDisease(DiseaseRequest {
            farmer_id: self.session.farmer_id().to_string(),
            image_data: self.image(image)?,
            description: description.trim().to_string(),
        }))
    }

    pub fn translate(&self, text: &str, source: &str, target: &str) -> Result<Translate> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyTranslationText);
        }
        let (source, target) = (source.trim(), target.trim());
        if source.is_empty() || target.is_empty() {
            return Err(ValidationError::MissingLanguage);
        }
        if source.eq_ignore_ascii_case(target) {
            return Err(ValidationError::SameLanguage);
        }
        Ok(Translate(TranslateRequest {
            text: text.to_string(),
            source_language: source.to_string(),
            target_language: target.to_string(),
        }))
    }

    pub fn weather(&self, location: &str) -> Result<GetWeather> {
        let location = location.trim();
        if location.is_empty() {
            return Err(ValidationError::EmptyLocation);
        }
        Ok(GetWeather {
            location: location.to_string(),
        })
    }

    pub fn load_profile(&self) -> GetFarmer {
        GetFarmer {
            id: self.session.farmer_id().to_string(),
        }
    }

    pub fn save_profile(&self, draft: &ProfileDraft, exists: bool) -> Result<ProfileSave> {
        let input = profile_input(draft)?;
        Ok(if exists {
            ProfileSave::Update(UpdateFarmer {
                id: self.session.farmer_id().to_string(),
                input,
            })
        } else {
            ProfileSave::Create(CreateFarmer(input))
        })
    }

    /// History for this farmer; scoped to the current session when asked.
    pub fn chat_history(&self, this_session_only: bool) -> ChatHistory {
        ChatHistory {
            farmer_id: self.session.farmer_id().to_string(),
            session_id: this_session_only.then(|| self.session.session_id().to_string()),
        }
    }

    pub fn escalate(&self, query: &str, priority: Priority) -> Result<Escalate> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        Ok(Escalate(EscalationRequest {
            farmer_id: self.session.farmer_id().to_string(),
            query: query.to_string(),
            priority,
        }))
    }

    pub fn escalations(&self) -> ListEscalations {
        ListEscalations {
            farmer_id: self.session.farmer_id().to_string(),
        }
    }

    /// Normalize a base64 photo: strip a `data:` URL prefix and whitespace,
    /// check it decodes, and enforce the size limit on the decoded bytes.
    fn image(&self, raw: &str) -> Result<String> {
        let payload = match raw.trim().split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => raw.trim(),
        };
        let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        if cleaned.is_empty() {
            return Err(ValidationError::InvalidImage);
        }
        let decoded = STANDARD.decode(&cleaned).map_err(|_| ValidationError::InvalidImage)?;
        if decoded.len() > self.max_image_bytes {
            return Err(ValidationError::ImageTooLarge {
                size: decoded.len(),
                limit: self.max_image_bytes,
            });
        }
        Ok(cleaned)
    }
}

/// Encode raw photo bytes the way the camera wrapper hands them over.
pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

fn profile_input(draft: &ProfileDraft) -> Result<ProfileInput> {
    let required = |value: &str, field: &'static str| {
        let value = value.trim();
        if value.is_empty() {
            Err(ValidationError::MissingField(field))
        } else {
            Ok(value.to_string())
        }
    };
    let name = required(&draft.name, "name")?;
    let phone = required(&draft.phone, "phone")?;
    let location = required(&draft.location, "location")?;

    let mut crops: Vec<String> = Vec::with_capacity(draft.crops.len());
    for crop in draft.crops.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        if !crops.iter().any(|seen| seen == crop) {
            crops.push(crop.to_string());
        }
    }

    let farm_size = Some(draft.farm_size.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(ProfileInput {
        name,
        phone,
        location,
        crops,
        farm_size,
    })
}
