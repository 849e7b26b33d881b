//! Weather screen and the farming advice derived from a snapshot.

use std::sync::Arc;

use super::{submit, Plan};
use crate::dispatch::{Dispatcher, Phase, Reducer, Screen};
use crate::error::ValidationError;
use crate::resolve::{Alert, Resolution};
use crate::session::{IdentityProvider, SessionContext};
use crate::transport::Transport;
use crate::types::WeatherSnapshot;

pub const LOCATIONS: [&str; 6] = [
    "Kochi",
    "Thiruvananthapuram",
    "Kozhikode",
    "Thrissur",
    "Kollam",
    "Palakkad",
];

pub const DEFAULT_LOCATION: &str = "Kochi";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherIcon {
    Rainy,
    PartlySunny,
    Sunny,
}

impl WeatherIcon {
    pub fn for_forecast(forecast: &str) -> Self {
        let forecast = forecast.to_lowercase();
        if forecast.contains("rain") {
            WeatherIcon::Rainy
        } else if forecast.contains("cloud") {
            WeatherIcon::PartlySunny
        } else if forecast.contains("sun") {
            WeatherIcon::Sunny
        } else {
            WeatherIcon::PartlySunny
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBand {
    Hot,
    Warm,
    Mild,
    Cool,
}

impl TemperatureBand {
    pub fn for_celsius(temperature: f64) -> Self {
        if temperature > 35.0 {
            TemperatureBand::Hot
        } else if temperature > 30.0 {
            TemperatureBand::Warm
        } else if temperature > 25.0 {
            TemperatureBand::Mild
        } else {
            TemperatureBand::Cool
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advice {
    IrrigateForHeat,
    WatchFungalDisease,
    ProtectFromHeavyRain,
    IncreaseWatering,
    StakeTallPlants,
}

impl Advice {
    pub fn message(self) -> &'static str {
        match self {
            Advice::IrrigateForHeat => "High temperature - ensure adequate irrigation",
            Advice::WatchFungalDisease => "High humidity - watch for fungal diseases",
            Advice::ProtectFromHeavyRain => "Heavy rain expected - protect young plants",
            Advice::IncreaseWatering => "Low rainfall - increase watering frequency",
            Advice::StakeTallPlants => "Windy conditions - stake tall plants",
        }
    }
}

/// Shown when no rule fires.
pub const FAVORABLE_CONDITIONS: &str =
    "Current weather conditions are favorable for farming activities.";

pub fn farming_advice(snapshot: &WeatherSnapshot) -> Vec<Advice> {
    let mut advice = Vec::new();
    if snapshot.temperature > 35.0 {
        advice.push(Advice::IrrigateForHeat);
    }
    if snapshot.humidity > 80.0 {
        advice.push(Advice::WatchFungalDisease);
    }
    if snapshot.rainfall > 10.0 {
        advice.push(Advice::ProtectFromHeavyRain);
    } else if snapshot.rainfall < 2.0 {
        advice.push(Advice::IncreaseWatering);
    }
    if snapshot.forecast.to_lowercase().contains("wind") {
        advice.push(Advice::StakeTallPlants);
    }
    advice
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherState {
    pub location: String,
    pub snapshot: Option<WeatherSnapshot>,
    /// Set while `snapshot` is a stand-in rather than a backend reading.
    pub offline_notice: Option<String>,
    pub phase: Phase,
    pub alert: Option<Alert>,
    /// Location of the request in flight.
    requested: Option<String>,
    /// The last result was dropped because the selection changed meanwhile.
    stale: bool,
}

impl WeatherState {
    /// Whether the shown reading no longer matches the selection and a
    /// refetch is due.
    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

impl Default for WeatherState {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION.to_string(),
            snapshot: None,
            offline_notice: None,
            phase: Phase::Idle,
            alert: None,
            requested: None,
            stale: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherEvent {
    LocationSelected(String),
    Rejected(ValidationError),
    /// A fetch for the given location started.
    Submitted(String),
    Resolved(Resolution<WeatherSnapshot>),
    AlertDismissed,
}

impl Reducer for WeatherState {
    type Event = WeatherEvent;

    fn reduce(mut self, event: WeatherEvent) -> Self {
        match event {
            WeatherEvent::LocationSelected(location) => self.location = location,
            WeatherEvent::Rejected(err) => self.alert = Some(Alert::validation(&err)),
            WeatherEvent::Submitted(location) => {
                if self.phase == Phase::Idle {
                    self.phase = Phase::Submitting;
                    self.requested = Some(location);
                    self.stale = false;
                }
            }
            WeatherEvent::Resolved(resolution) => {
                if self.phase != Phase::Submitting {
                    return self;
                }
                self.phase = Phase::Idle;
                if self.requested.take().as_deref() != Some(self.location.as_str()) {
                    self.stale = true;
                    return self;
                }
                match resolution {
                    Resolution::Live(snapshot) => {
                        self.snapshot = Some(snapshot);
                        self.offline_notice = None;
                    }
                    Resolution::Degraded { value, reason } => {
                        self.snapshot = Some(value);
                        self.offline_notice = Some(reason);
                    }
                    Resolution::Failed(alert) => self.alert = Some(alert),
                }
            }
            WeatherEvent::AlertDismissed => self.alert = None,
        }
        self
    }
}

pub struct WeatherController<T> {
    dispatcher: Arc<Dispatcher<T>>,
    session: SessionContext,
    screen: Screen<WeatherState>,
}

impl<T: Transport> WeatherController<T> {
    pub fn mount(dispatcher: Arc<Dispatcher<T>>, identity: &dyn IdentityProvider) -> Self {
        Self {
            dispatcher,
            session: SessionContext::start(identity),
            screen: Screen::mount(WeatherState::default()),
        }
    }

    pub fn screen(&self) -> Screen<WeatherState> {
        self.screen.clone()
    }

    pub fn state(&self) -> WeatherState {
        self.screen.snapshot()
    }

    pub fn apply(&self, event: WeatherEvent) {
        self.screen.apply(event);
    }

    /// Change location and fetch its reading. When a fetch is already in
    /// flight this returns `false` and that fetch picks up the new selection.
    pub async fn select_location(&self, location: &str) -> bool {
        self.screen.apply(WeatherEvent::LocationSelected(location.to_string()));
        self.refresh().await
    }

    /// Fetch the reading for the selected location, again if the selection
    /// moved while waiting. Also used on mount and pull-to-refresh.
    pub async fn refresh(&self) -> bool {
        let mut applied = false;
        while self.fetch().await {
            applied = true;
            if !self.screen.snapshot().is_stale() {
                break;
            }
        }
        applied
    }

    async fn fetch(&self) -> bool {
        let builder = self.dispatcher.builder(&self.session);
        submit(
            &self.dispatcher,
            &self.screen,
            |state: &WeatherState| {
                if state.phase == Phase::Submitting {
                    return Plan::Skip;
                }
                match builder.weather(&state.location) {
                    Ok(endpoint) => {
                        let location = endpoint.location.clone();
                        Plan::Dispatch(WeatherEvent::Submitted(location), endpoint)
                    }
                    Err(err) => Plan::Reject(WeatherEvent::Rejected(err)),
                }
            },
            WeatherEvent::Resolved,
        )
        .await
    }
}

impl<T> Drop for WeatherController<T> {
    fn drop(&mut self) {
        self.screen.close();
    }
}
