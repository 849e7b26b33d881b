//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises the core two
//! ways: the sans-IO client over ureq (host-does-IO path), and the screen
//! controllers over the reqwest transport. A second server in failing mode
//! drives every fallback policy.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use farm_core::config::BACKEND_URL_VAR;
use farm_core::endpoint::{
    ChatHistory, CreateFarmer, DetectDisease, Escalate, GetFarmer, GetWeather, Health,
    ListEscalations, ListFarmers, SendChat, Translate, UpdateFarmer,
};
use farm_core::request::encode_image;
use farm_core::resolve::{CHAT_APOLOGY, PLACEHOLDER_TEMPERATURE};
use farm_core::screen::chat::{ChatController, ChatEvent};
use farm_core::screen::disease::{DiseaseController, DiseaseEvent};
use farm_core::screen::profile::{ProfileController, ProfileEvent};
use farm_core::screen::translator::{TranslatorController, TranslatorEvent};
use farm_core::screen::weather::WeatherController;
use farm_core::types::{Priority, ProfileInput};
use farm_core::{
    ApiError, ClientConfig, Dispatcher, FarmClient, HttpMethod, HttpRequest, HttpResponse, Phase,
    ReqwestTransport, RequestBuilder, SessionContext, StaticIdentity, Transport,
};

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// client handle status interpretation.
fn execute(req: HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.url).call(),
        (HttpMethod::Post, Some(body)) => agent
            .post(&req.url)
            .content_type("application/json")
            .send(body.as_bytes()),
        (HttpMethod::Post, None) => agent.post(&req.url).send_empty(),
        (HttpMethod::Put, Some(body)) => agent
            .put(&req.url)
            .content_type("application/json")
            .send(body.as_bytes()),
        (HttpMethod::Put, None) => agent.put(&req.url).send_empty(),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    HttpResponse::new(status, body)
}

/// Start the mock on its own thread and runtime, for the blocking ureq path.
fn spawn_blocking_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

async fn spawn_server(failing: bool) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if failing {
            mock_server::run_failing(listener).await
        } else {
            mock_server::run(listener).await
        }
    });
    addr
}

fn dispatcher(addr: SocketAddr) -> Arc<Dispatcher<ReqwestTransport>> {
    let config = ClientConfig::new(&format!("http://{addr}"));
    let transport = ReqwestTransport::new(&config).unwrap();
    Arc::new(Dispatcher::new(&config, transport))
}

fn identity(id: &str) -> StaticIdentity {
    StaticIdentity(id.to_string())
}

#[test]
fn sans_io_lifecycle() {
    let addr = spawn_blocking_server();
    let client = FarmClient::new(&format!("http://{addr}"));
    let session = SessionContext::with_session_id("farmer_it", "session_it");
    let builder = RequestBuilder::new(&session, 1024);

    // Step 1: health.
    let health = client.parse::<Health>(execute(client.build(&Health).unwrap())).unwrap();
    assert!(health.message.contains("running"));

    // Step 2: unknown farmer is NotFound.
    let req = client.build(&builder.load_profile()).unwrap();
    let err = client.parse::<GetFarmer>(execute(req)).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Step 3: create, then fetch by the server-assigned id.
    let input = ProfileInput {
        name: "Lakshmi".to_string(),
        phone: "+91 90000 11111".to_string(),
        location: "Palakkad".to_string(),
        crops: vec!["Rice".to_string()],
        farm_size: None,
    };
    let req = client.build(&CreateFarmer(input.clone())).unwrap();
    let created = client.parse::<CreateFarmer>(execute(req)).unwrap();
    assert_eq!(created.name, "Lakshmi");
    let get = GetFarmer { id: created.id.clone() };
    let fetched = client.parse::<GetFarmer>(execute(client.build(&get).unwrap())).unwrap();
    assert_eq!(fetched, created);

    // Step 4: wholesale update.
    let update = UpdateFarmer {
        id: created.id.clone(),
        input: ProfileInput {
            farm_size: Some("1-2 acres".to_string()),
            ..input
        },
    };
    client
        .parse::<UpdateFarmer>(execute(client.build(&update).unwrap()))
        .unwrap();
    let fetched = client.parse::<GetFarmer>(execute(client.build(&get).unwrap())).unwrap();
    assert_eq!(fetched.farm_size.as_deref(), Some("1-2 acres"));
    assert_eq!(fetched.created_at, created.created_at);

    let farmers = client
        .parse::<ListFarmers>(execute(client.build(&ListFarmers).unwrap()))
        .unwrap();
    assert_eq!(farmers.len(), 1);

    // Step 5: chat, then read it back scoped to this session.
    let chat = builder.chat("When should I sow paddy?", None).unwrap();
    let reply = client.parse::<SendChat>(execute(client.build(&chat).unwrap())).unwrap();
    assert!(reply.response.contains("When should I sow paddy?"));
    assert!(reply.timestamp.is_some());

    let history = builder.chat_history(true);
    let records = client.parse::<ChatHistory>(execute(client.build(&history).unwrap())).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].session_id, "session_it");

    // Step 6: translate, weather, disease.
    let translate = builder.translate("Thank you", "english", "hindi").unwrap();
    let translation = client
        .parse::<Translate>(execute(client.build(&translate).unwrap()))
        .unwrap();
    assert_eq!(translation.translated_text, "धन्यवाद");

    let weather = builder.weather("Kozhikode").unwrap();
    let snapshot = client
        .parse::<GetWeather>(execute(client.build(&weather).unwrap()))
        .unwrap();
    assert_eq!(snapshot.location, "Kozhikode");

    let photo = encode_image(b"leaf photo");
    let detect = builder.detect_disease(Some(&photo), "brown patches").unwrap();
    let analysis = client
        .parse::<DetectDisease>(execute(client.build(&detect).unwrap()))
        .unwrap();
    assert!(analysis.analysis.contains("brown patches"));

    // Step 7: escalate and list.
    let escalate = builder.escalate("Leaves curling on pepper vines", Priority::High).unwrap();
    let receipt = client
        .parse::<Escalate>(execute(client.build(&escalate).unwrap()))
        .unwrap();
    assert_eq!(receipt.estimated_response, "24-48 hours");
    let listed = client
        .parse::<ListEscalations>(execute(client.build(&builder.escalations()).unwrap()))
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].priority, Priority::High);
}

#[tokio::test]
async fn controllers_against_live_server() {
    let addr = spawn_server(false).await;
    let dispatcher = dispatcher(addr);
    let farmer = identity("farmer_it");

    // Chat: welcome + user + bot.
    let chat = ChatController::mount(Arc::clone(&dispatcher), &farmer);
    chat.apply(ChatEvent::InputChanged("What crops grow best now?".to_string()));
    assert!(chat.send().await);
    let state = chat.state();
    assert_eq!(state.messages().len(), 3);
    assert!(state.messages()[1].is_user);
    assert!(state.messages()[2].text.contains("What crops grow best now?"));
    assert!(state.offline_notice.is_none());
    assert_eq!(state.phase, Phase::Idle);

    // Translator: live result recorded in history.
    let translator = TranslatorController::mount(Arc::clone(&dispatcher), &farmer);
    translator.apply(TranslatorEvent::InputChanged("Thank you".to_string()));
    translator.apply(TranslatorEvent::TargetSelected("malayalam".to_string()));
    assert!(translator.translate().await);
    let state = translator.state();
    assert_eq!(state.translated, "നന്ദി");
    assert_eq!(state.history().len(), 1);

    // Weather: default location, then a new one.
    let weather = WeatherController::mount(Arc::clone(&dispatcher), &farmer);
    assert!(weather.refresh().await);
    assert_eq!(weather.state().snapshot.unwrap().location, "Kochi");
    assert!(weather.select_location("Kollam").await);
    let state = weather.state();
    assert_eq!(state.snapshot.unwrap().location, "Kollam");
    assert!(state.offline_notice.is_none());

    // Disease detection.
    let disease = DiseaseController::mount(Arc::clone(&dispatcher), &farmer);
    disease.apply(DiseaseEvent::ImageSelected(encode_image(b"leaf")));
    disease.apply(DiseaseEvent::DescriptionChanged("yellow spots".to_string()));
    assert!(disease.analyze().await);
    assert!(disease.state().analysis.unwrap().contains("yellow spots"));

    // Profile: unknown farmer shows demo data; saving writes it for real.
    let profile = ProfileController::mount(Arc::clone(&dispatcher), &farmer);
    assert!(profile.load().await);
    let state = profile.state();
    assert_eq!(state.profile.as_ref().unwrap().name, "Demo Farmer");
    assert!(state.offline_notice.is_some());

    profile.apply(ProfileEvent::EditStarted);
    profile.apply(ProfileEvent::NameChanged("Lakshmi".to_string()));
    profile.apply(ProfileEvent::CropToggled("Pepper".to_string()));
    assert!(profile.save().await);
    let state = profile.state();
    assert!(!state.editing);
    assert_eq!(state.alert.as_ref().unwrap().title, "Success");
    assert_eq!(state.profile.as_ref().unwrap().name, "Lakshmi");

    assert!(profile.load().await);
    let state = profile.state();
    assert!(state.offline_notice.is_none());
    let loaded = state.profile.unwrap();
    assert_eq!(loaded.name, "Lakshmi");
    assert_eq!(loaded.crops, vec!["Rice", "Vegetables", "Pepper"]);
}

#[tokio::test]
async fn fallbacks_against_failing_server() {
    let addr = spawn_server(true).await;
    let dispatcher = dispatcher(addr);
    let farmer = identity("farmer_it");

    // Chat degrades to the apology bubble.
    let chat = ChatController::mount(Arc::clone(&dispatcher), &farmer);
    chat.apply(ChatEvent::InputChanged("hello".to_string()));
    assert!(chat.send().await);
    let state = chat.state();
    assert_eq!(state.messages().len(), 3);
    assert_eq!(state.messages()[2].text, CHAT_APOLOGY);
    assert!(state.offline_notice.is_some());

    // Translation fails loudly and history is untouched.
    let translator = TranslatorController::mount(Arc::clone(&dispatcher), &farmer);
    translator.apply(TranslatorEvent::InputChanged("Water".to_string()));
    assert!(translator.translate().await);
    let state = translator.state();
    assert_eq!(state.alert.as_ref().unwrap().title, "Translation Failed");
    assert!(state.history().is_empty());
    assert_eq!(state.phase, Phase::Idle);

    // Weather shows the placeholder for the requested location.
    let weather = WeatherController::mount(Arc::clone(&dispatcher), &farmer);
    assert!(weather.select_location("Thrissur").await);
    let state = weather.state();
    let snapshot = state.snapshot.unwrap();
    assert_eq!(snapshot.location, "Thrissur");
    assert_eq!(snapshot.temperature, PLACEHOLDER_TEMPERATURE);
    assert!(state.offline_notice.is_some());

    // Disease detection raises an alert.
    let disease = DiseaseController::mount(Arc::clone(&dispatcher), &farmer);
    disease.apply(DiseaseEvent::ImageSelected(encode_image(b"leaf")));
    assert!(disease.analyze().await);
    let state = disease.state();
    assert_eq!(state.alert.unwrap().title, "Analysis Failed");
    assert!(state.analysis.is_none());

    // Profile falls back to demo data, and saving it fails.
    let profile = ProfileController::mount(Arc::clone(&dispatcher), &farmer);
    assert!(profile.load().await);
    assert_eq!(profile.state().profile.unwrap().name, "Demo Farmer");
    assert!(profile.save().await);
    let state = profile.state();
    assert_eq!(state.alert.unwrap().title, "Error");
}

/// Forwards to an inner transport and counts calls.
struct Counting<T> {
    inner: T,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl<T: Transport> Transport for Counting<T> {
    async fn execute(&self, request: HttpRequest) -> farm_core::error::Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(request).await
    }
}

#[tokio::test]
async fn local_rejections_never_reach_the_network() {
    let addr = spawn_server(false).await;
    let config = ClientConfig::new(&format!("http://{addr}"));
    let calls = Arc::new(AtomicUsize::new(0));
    let transport = Counting {
        inner: ReqwestTransport::new(&config).unwrap(),
        calls: Arc::clone(&calls),
    };
    let dispatcher = Arc::new(Dispatcher::new(&config, transport));
    let farmer = identity("farmer_it");

    let translator = TranslatorController::mount(Arc::clone(&dispatcher), &farmer);
    translator.apply(TranslatorEvent::InputChanged("Water".to_string()));
    translator.apply(TranslatorEvent::TargetSelected("English".to_string()));
    assert!(!translator.translate().await);
    let state = translator.state();
    assert_eq!(state.alert.as_ref().unwrap().title, "Language Error");
    assert!(state.history().is_empty());

    let chat = ChatController::mount(Arc::clone(&dispatcher), &farmer);
    chat.apply(ChatEvent::InputChanged("   ".to_string()));
    assert!(!chat.send().await);
    assert_eq!(chat.state().messages().len(), 1);

    let disease = DiseaseController::mount(Arc::clone(&dispatcher), &farmer);
    assert!(!disease.analyze().await);
    assert_eq!(disease.state().alert.unwrap().title, "No Image");

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dispatcher_from_env_keeps_first_backend_url() {
    let addr = spawn_server(false).await;
    std::env::set_var(BACKEND_URL_VAR, format!("http://{addr}/"));
    let dispatcher = Dispatcher::from_env().unwrap();
    assert_eq!(dispatcher.client().base_url(), format!("http://{addr}"));

    std::env::set_var(BACKEND_URL_VAR, "http://127.0.0.1:9");
    let again = Dispatcher::from_env().unwrap();
    assert_eq!(again.client().base_url(), format!("http://{addr}"));
    let health = again.send(&Health).await.unwrap();
    assert!(health.message.contains("running"));
}
