//! Profile screen: load the farmer's record, edit a local draft, save it
//! back wholesale.

use std::sync::Arc;

use super::{submit, Plan};
use crate::dispatch::{Dispatcher, Phase, Reducer, Screen};
use crate::error::ValidationError;
use crate::request::{ProfileDraft, ProfileSave};
use crate::resolve::{Alert, Resolution};
use crate::session::{IdentityProvider, SessionContext};
use crate::transport::Transport;
use crate::types::{FarmerProfile, ProfileInput};

pub const AVAILABLE_CROPS: [&str; 12] = [
    "Rice",
    "Coconut",
    "Rubber",
    "Pepper",
    "Cardamom",
    "Coffee",
    "Tea",
    "Banana",
    "Vegetables",
    "Spices",
    "Fruits",
    "Flowers",
];

pub const LOCATION_OPTIONS: [&str; 14] = [
    "Thiruvananthapuram",
    "Kollam",
    "Pathanamthitta",
    "Alappuzha",
    "Kottayam",
    "Idukki",
    "Ernakulam",
    "Thrissur",
    "Palakkad",
    "Malappuram",
    "Kozhikode",
    "Wayanad",
    "Kannur",
    "Kasaragod",
];

pub const FARM_SIZE_OPTIONS: [&str; 5] = [
    "Less than 1 acre",
    "1-2 acres",
    "2-5 acres",
    "5-10 acres",
    "More than 10 acres",
];

impl From<&FarmerProfile> for ProfileDraft {
    fn from(profile: &FarmerProfile) -> Self {
        Self {
            name: profile.name.clone(),
            phone: profile.phone.clone(),
            location: profile.location.clone(),
            farm_size: profile.farm_size.clone().unwrap_or_default(),
            crops: profile.crops.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileState {
    pub profile: Option<FarmerProfile>,
    pub draft: ProfileDraft,
    pub editing: bool,
    pub phase: Phase,
    /// Set while `profile` is the demo stand-in.
    pub offline_notice: Option<String>,
    pub alert: Option<Alert>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileEvent {
    LoadStarted,
    Loaded(Resolution<FarmerProfile>),
    EditStarted,
    /// Discard draft changes and leave edit mode.
    EditCancelled,
    NameChanged(String),
    PhoneChanged(String),
    LocationChanged(String),
    FarmSizeChanged(String),
    CropToggled(String),
    Rejected(ValidationError),
    SaveStarted,
    Saved(Resolution<FarmerProfile>),
    AlertDismissed,
}

impl Reducer for ProfileState {
    type Event = ProfileEvent;

    fn reduce(mut self, event: ProfileEvent) -> Self {
        match event {
            ProfileEvent::LoadStarted | ProfileEvent::SaveStarted => {
                if self.phase == Phase::Idle {
                    self.phase = Phase::Submitting;
                    self.alert = None;
                }
            }
            ProfileEvent::Loaded(resolution) => {
                if self.phase != Phase::Submitting {
                    return self;
                }
                self.phase = Phase::Idle;
                match resolution {
                    Resolution::Live(profile) => {
                        self.draft = ProfileDraft::from(&profile);
                        self.profile = Some(profile);
                        self.offline_notice = None;
                    }
                    Resolution::Degraded { value, reason } => {
                        self.draft = ProfileDraft::from(&value);
                        self.profile = Some(value);
                        self.offline_notice = Some(reason);
                    }
                    Resolution::Failed(alert) => self.alert = Some(alert),
                }
            }
            ProfileEvent::EditStarted => self.editing = true,
            ProfileEvent::EditCancelled => {
                self.draft = self.profile.as_ref().map(ProfileDraft::from).unwrap_or_default();
                self.editing = false;
            }
            ProfileEvent::NameChanged(v) => self.draft.name = v,
            ProfileEvent::PhoneChanged(v) => self.draft.phone = v,
            ProfileEvent::LocationChanged(v) => self.draft.location = v,
            ProfileEvent::FarmSizeChanged(v) => self.draft.farm_size = v,
            ProfileEvent::CropToggled(crop) => {
                if let Some(pos) = self.draft.crops.iter().position(|c| *c == crop) {
                    self.draft.crops.remove(pos);
                } else {
                    self.draft.crops.push(crop);
                }
            }
            ProfileEvent::Rejected(err) => self.alert = Some(Alert::validation(&err)),
            ProfileEvent::Saved(resolution) => {
                if self.phase != Phase::Submitting {
                    return self;
                }
                self.phase = Phase::Idle;
                match resolution {
                    Resolution::Live(profile) | Resolution::Degraded { value: profile, .. } => {
                        self.draft = ProfileDraft::from(&profile);
                        self.profile = Some(profile);
                        self.offline_notice = None;
                        self.editing = false;
                        self.alert = Some(Alert::new("Success", "Profile saved successfully"));
                    }
                    Resolution::Failed(alert) => self.alert = Some(alert),
                }
            }
            ProfileEvent::AlertDismissed => self.alert = None,
        }
        self
    }
}

/// `existing` with every editable field replaced by `input`.
fn merge(existing: &FarmerProfile, input: &ProfileInput) -> FarmerProfile {
    FarmerProfile {
        id: existing.id.clone(),
        name: input.name.clone(),
        phone: input.phone.clone(),
        location: input.location.clone(),
        crops: input.crops.clone(),
        farm_size: input.farm_size.clone(),
        created_at: existing.created_at,
    }
}

pub struct ProfileController<T> {
    dispatcher: Arc<Dispatcher<T>>,
    session: SessionContext,
    screen: Screen<ProfileState>,
}

impl<T: Transport> ProfileController<T> {
    pub fn mount(dispatcher: Arc<Dispatcher<T>>, identity: &dyn IdentityProvider) -> Self {
        Self {
            dispatcher,
            session: SessionContext::start(identity),
            screen: Screen::mount(ProfileState::default()),
        }
    }

    pub fn screen(&self) -> Screen<ProfileState> {
        self.screen.clone()
    }

    pub fn state(&self) -> ProfileState {
        self.screen.snapshot()
    }

    pub fn apply(&self, event: ProfileEvent) {
        self.screen.apply(event);
    }

    pub async fn load(&self) -> bool {
        let builder = self.dispatcher.builder(&self.session);
        submit(
            &self.dispatcher,
            &self.screen,
            |state: &ProfileState| {
                if state.phase == Phase::Submitting {
                    return Plan::Skip;
                }
                Plan::Dispatch(ProfileEvent::LoadStarted, builder.load_profile())
            },
            ProfileEvent::Loaded,
        )
        .await
    }

    /// Validate the draft and write it back: update when a profile is
    /// loaded (demo included), create otherwise.
    pub async fn save(&self) -> bool {
        let builder = self.dispatcher.builder(&self.session);
        let planned = self.screen.transition(|state| {
            if state.phase == Phase::Submitting {
                return (None, None);
            }
            match builder.save_profile(&state.draft, state.profile.is_some()) {
                Ok(save) => (Some(ProfileEvent::SaveStarted), Some((save, state.profile.clone()))),
                Err(err) => (Some(ProfileEvent::Rejected(err)), None),
            }
        });
        let Some((save, existing)) = planned else {
            return false;
        };

        let token = self.screen.token();
        let resolution = match save {
            ProfileSave::Create(endpoint) => self.dispatcher.dispatch(&endpoint, token).await,
            ProfileSave::Update(endpoint) => {
                let merged = match &existing {
                    Some(existing) => merge(existing, &endpoint.input),
                    None => return false,
                };
                self.dispatcher
                    .dispatch(&endpoint, token)
                    .await
                    .map(|resolution| resolution.map(|()| merged))
            }
        };
        match resolution {
            Some(resolution) => {
                self.screen.apply(ProfileEvent::Saved(resolution));
                !self.screen.is_closed()
            }
            None => false,
        }
    }
}

impl<T> Drop for ProfileController<T> {
    fn drop(&mut self) {
        self.screen.close();
    }
}
