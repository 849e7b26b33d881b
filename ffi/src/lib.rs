//! C-ABI wrapper around `farm-core`.
//!
//! # Overview
//! Exposes request building and response resolution through `extern "C"`
//! functions so the mobile shell can perform the HTTP round-trip itself and
//! still get the core's validation rules and failure policies.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Each endpoint has a `farm_build_*` / `farm_resolve_*` pair taking the
//!   same arguments. Resolve rebuilds the endpoint so its fallback (demo
//!   profile, placeholder weather, chat apology) knows what was asked for.
//! - A null response pointer means the host's transport failed.
//! - The C caller owns all returned pointers and must call the matching
//!   `farm_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use chrono::Utc;
use farm_core::config::DEFAULT_MAX_IMAGE_BYTES;
use farm_core::endpoint::{DetectDisease, Endpoint, GetFarmer, GetWeather, SendChat, Translate};
use farm_core::error::ApiError;
use farm_core::http::HttpResponse;
use farm_core::{
    resolve, Alert, Fallback, FarmClient, ProfileDraft, ProfileSave, RequestBuilder, Resolution,
    SessionContext, StaticIdentity, ValidationError,
};
use serde::Serialize;

use types::*;

/// Endpoint built from C arguments: `Err(name)` for a null required
/// argument, `Ok(Err(_))` when a validation rule fails.
type Built<E> = Result<Result<E, ValidationError>, &'static str>;

/// Copy a C string argument; `None` when null.
fn read(p: *const c_char) -> Option<String> {
    if p.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned())
    }
}

fn required(p: *const c_char, name: &'static str) -> Result<String, &'static str> {
    read(p).ok_or(name)
}

fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse::new(resp.status, read(resp.body).unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Client and session lifecycle
// ---------------------------------------------------------------------------

/// Create a new `FarmClient` bound to `base_url`.
///
/// Returns null if `base_url` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `farm_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn farm_client_new(base_url: *const c_char) -> *mut FfiFarmClient {
    catch_unwind(|| match read(base_url) {
        Some(url) => Box::into_raw(Box::new(FfiFarmClient {
            inner: FarmClient::new(&url),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        })),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `farm_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn farm_client_free(client: *mut FfiFarmClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

/// Start a session for `farmer_id` (the demo farmer when null) and return
/// its id. Free with `farm_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn farm_session_new(farmer_id: *const c_char) -> *mut c_char {
    catch_unwind(|| {
        let identity = read(farmer_id).map(StaticIdentity).unwrap_or_default();
        c_string(SessionContext::start(&identity).session_id())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Endpoint construction shared by build and resolve
// ---------------------------------------------------------------------------

fn with_builder<E>(
    client: &FfiFarmClient,
    farmer_id: String,
    session_id: String,
    f: impl FnOnce(&RequestBuilder<'_>) -> Result<E, ValidationError>,
) -> Result<E, ValidationError> {
    let session = SessionContext::with_session_id(farmer_id, session_id);
    f(&RequestBuilder::new(&session, client.max_image_bytes))
}

fn chat_endpoint(
    client: &FfiFarmClient,
    farmer_id: *const c_char,
    session_id: *const c_char,
    text: *const c_char,
    image: *const c_char,
) -> Built<SendChat> {
    let farmer_id = required(farmer_id, "farmer_id")?;
    let session_id = required(session_id, "session_id")?;
    let text = required(text, "text")?;
    let image = read(image);
    Ok(with_builder(client, farmer_id, session_id, |b| b.chat(&text, image.as_deref())))
}

fn disease_endpoint(
    client: &FfiFarmClient,
    farmer_id: *const c_char,
    image: *const c_char,
    description: *const c_char,
) -> Built<DetectDisease> {
    let farmer_id = required(farmer_id, "farmer_id")?;
    let image = read(image);
    let description = read(description).unwrap_or_default();
    Ok(with_builder(client, farmer_id, String::new(), |b| {
        b.detect_disease(image.as_deref(), &description)
    }))
}

fn translate_endpoint(
    client: &FfiFarmClient,
    text: *const c_char,
    source: *const c_char,
    target: *const c_char,
) -> Built<Translate> {
    let text = required(text, "text")?;
    let source = required(source, "source_language")?;
    let target = required(target, "target_language")?;
    Ok(with_builder(client, String::new(), String::new(), |b| {
        b.translate(&text, &source, &target)
    }))
}

fn weather_endpoint(client: &FfiFarmClient, location: *const c_char) -> Built<GetWeather> {
    let location = required(location, "location")?;
    Ok(with_builder(client, String::new(), String::new(), |b| b.weather(&location)))
}

fn farmer_endpoint(client: &FfiFarmClient, farmer_id: *const c_char) -> Built<GetFarmer> {
    let farmer_id = required(farmer_id, "farmer_id")?;
    Ok(with_builder(client, farmer_id, String::new(), |b| Ok(b.load_profile())))
}

#[allow(clippy::too_many_arguments)]
fn save_endpoint(
    client: &FfiFarmClient,
    farmer_id: *const c_char,
    name: *const c_char,
    phone: *const c_char,
    location: *const c_char,
    farm_size: *const c_char,
    crops: *const *const c_char,
    crops_len: u32,
    exists: bool,
) -> Built<ProfileSave> {
    let farmer_id = required(farmer_id, "farmer_id")?;
    if crops.is_null() && crops_len > 0 {
        return Err("crops");
    }
    let crops = if crops_len == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(crops, crops_len as usize) }
            .iter()
            .filter_map(|c| read(*c))
            .collect()
    };
    let draft = ProfileDraft {
        name: read(name).unwrap_or_default(),
        phone: read(phone).unwrap_or_default(),
        location: read(location).unwrap_or_default(),
        farm_size: read(farm_size).unwrap_or_default(),
        crops,
    };
    Ok(with_builder(client, farmer_id, String::new(), |b| b.save_profile(&draft, exists)))
}

// ---------------------------------------------------------------------------
// Generic build / resolve
// ---------------------------------------------------------------------------

fn build_request<E: Endpoint>(client: &FfiFarmClient, built: Built<E>) -> *mut FfiBuildResult {
    match built {
        Err(name) => FfiBuildResult::null_arg(name),
        Ok(Err(invalid)) => FfiBuildResult::invalid(invalid),
        Ok(Ok(endpoint)) => match client.inner.build(&endpoint) {
            Ok(req) => FfiBuildResult::ok(req),
            Err(e) => FfiBuildResult::from_error(e),
        },
    }
}

/// Parse the host's response (or its absence) and apply the endpoint's
/// failure policy.
fn resolve_endpoint<E: Fallback>(
    client: &FfiFarmClient,
    endpoint: &E,
    response: *const FfiHttpResponse,
) -> (Resolution<E::Response>, FfiErrorCode, u16) {
    let (outcome, status) = if response.is_null() {
        (Err(ApiError::Transport("host reported no response".to_string())), 0)
    } else {
        let resp = unsafe { &*response };
        (client.inner.parse::<E>(ffi_response_to_core(resp)), resp.status)
    };
    let (code, status) = match &outcome {
        Ok(_) => (FfiErrorCode::Ok, status),
        Err(e) => error_code(e),
    };
    (resolve(endpoint, outcome, Utc::now()), code, status)
}

fn resolve_response<E>(
    client: &FfiFarmClient,
    built: Built<E>,
    response: *const FfiHttpResponse,
) -> *mut FfiResolution
where
    E: Fallback,
    E::Response: Serialize,
{
    match built {
        Err(name) => FfiResolution::null_arg(name),
        Ok(Err(invalid)) => {
            let alert = Alert::validation(&invalid);
            FfiResolution::from_core::<E::Response>(
                Resolution::Failed(alert),
                FfiErrorCode::Validation,
                0,
            )
        }
        Ok(Ok(endpoint)) => {
            let (resolution, code, status) = resolve_endpoint(client, &endpoint, response);
            FfiResolution::from_core(resolution, code, status)
        }
    }
}

/// Borrow the client or bail out with a null-argument result.
macro_rules! client_or {
    ($client:expr, $result:ty) => {{
        if $client.is_null() {
            return <$result>::null_arg("client");
        }
        unsafe { &*$client }
    }};
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Build `POST /api/chat`. `image` (base64, optional `data:` prefix) may be
/// null; `text` may be empty when an image is given.
#[unsafe(no_mangle)]
pub extern "C" fn farm_build_chat(
    client: *const FfiFarmClient,
    farmer_id: *const c_char,
    session_id: *const c_char,
    text: *const c_char,
    image: *const c_char,
) -> *mut FfiBuildResult {
    catch_unwind(|| {
        let client = client_or!(client, FfiBuildResult);
        build_request(client, chat_endpoint(client, farmer_id, session_id, text, image))
    })
    .unwrap_or_else(|_| FfiBuildResult::panic("panic in farm_build_chat"))
}

/// Resolve a chat exchange. Failures degrade to the apology reply.
#[unsafe(no_mangle)]
pub extern "C" fn farm_resolve_chat(
    client: *const FfiFarmClient,
    farmer_id: *const c_char,
    session_id: *const c_char,
    text: *const c_char,
    image: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiResolution {
    catch_unwind(|| {
        let client = client_or!(client, FfiResolution);
        let built = chat_endpoint(client, farmer_id, session_id, text, image);
        resolve_response(client, built, response)
    })
    .unwrap_or_else(|_| FfiResolution::panic("panic in farm_resolve_chat"))
}

// ---------------------------------------------------------------------------
// Disease detection
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn farm_build_detect_disease(
    client: *const FfiFarmClient,
    farmer_id: *const c_char,
    image: *const c_char,
    description: *const c_char,
) -> *mut FfiBuildResult {
    catch_unwind(|| {
        let client = client_or!(client, FfiBuildResult);
        build_request(client, disease_endpoint(client, farmer_id, image, description))
    })
    .unwrap_or_else(|_| FfiBuildResult::panic("panic in farm_build_detect_disease"))
}

#[unsafe(no_mangle)]
pub extern "C" fn farm_resolve_detect_disease(
    client: *const FfiFarmClient,
    farmer_id: *const c_char,
    image: *const c_char,
    description: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiResolution {
    catch_unwind(|| {
        let client = client_or!(client, FfiResolution);
        resolve_response(client, disease_endpoint(client, farmer_id, image, description), response)
    })
    .unwrap_or_else(|_| FfiResolution::panic("panic in farm_resolve_detect_disease"))
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn farm_build_translate(
    client: *const FfiFarmClient,
    text: *const c_char,
    source_language: *const c_char,
    target_language: *const c_char,
) -> *mut FfiBuildResult {
    catch_unwind(|| {
        let client = client_or!(client, FfiBuildResult);
        build_request(client, translate_endpoint(client, text, source_language, target_language))
    })
    .unwrap_or_else(|_| FfiBuildResult::panic("panic in farm_build_translate"))
}

#[unsafe(no_mangle)]
pub extern "C" fn farm_resolve_translate(
    client: *const FfiFarmClient,
    text: *const c_char,
    source_language: *const c_char,
    target_language: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiResolution {
    catch_unwind(|| {
        let client = client_or!(client, FfiResolution);
        resolve_response(
            client,
            translate_endpoint(client, text, source_language, target_language),
            response,
        )
    })
    .unwrap_or_else(|_| FfiResolution::panic("panic in farm_resolve_translate"))
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn farm_build_weather(
    client: *const FfiFarmClient,
    location: *const c_char,
) -> *mut FfiBuildResult {
    catch_unwind(|| {
        let client = client_or!(client, FfiBuildResult);
        build_request(client, weather_endpoint(client, location))
    })
    .unwrap_or_else(|_| FfiBuildResult::panic("panic in farm_build_weather"))
}

/// Resolve a weather reading. Failures degrade to placeholder values for
/// the requested location.
#[unsafe(no_mangle)]
pub extern "C" fn farm_resolve_weather(
    client: *const FfiFarmClient,
    location: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiResolution {
    catch_unwind(|| {
        let client = client_or!(client, FfiResolution);
        resolve_response(client, weather_endpoint(client, location), response)
    })
    .unwrap_or_else(|_| FfiResolution::panic("panic in farm_resolve_weather"))
}

// ---------------------------------------------------------------------------
// Farmer profile
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn farm_build_get_farmer(
    client: *const FfiFarmClient,
    farmer_id: *const c_char,
) -> *mut FfiBuildResult {
    catch_unwind(|| {
        let client = client_or!(client, FfiBuildResult);
        build_request(client, farmer_endpoint(client, farmer_id))
    })
    .unwrap_or_else(|_| FfiBuildResult::panic("panic in farm_build_get_farmer"))
}

/// Resolve a profile load. Failures degrade to the demo profile.
#[unsafe(no_mangle)]
pub extern "C" fn farm_resolve_get_farmer(
    client: *const FfiFarmClient,
    farmer_id: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiResolution {
    catch_unwind(|| {
        let client = client_or!(client, FfiResolution);
        resolve_response(client, farmer_endpoint(client, farmer_id), response)
    })
    .unwrap_or_else(|_| FfiResolution::panic("panic in farm_resolve_get_farmer"))
}

/// Build a profile save: `PUT /api/farmers/{farmer_id}` when `exists`,
/// otherwise `POST /api/farmers`. `farm_size` may be null; `crops` points to
/// `crops_len` C strings and may be null when `crops_len` is 0.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub extern "C" fn farm_build_save_farmer(
    client: *const FfiFarmClient,
    farmer_id: *const c_char,
    name: *const c_char,
    phone: *const c_char,
    location: *const c_char,
    farm_size: *const c_char,
    crops: *const *const c_char,
    crops_len: u32,
    exists: bool,
) -> *mut FfiBuildResult {
    catch_unwind(|| {
        let client = client_or!(client, FfiBuildResult);
        let built = save_endpoint(
            client, farmer_id, name, phone, location, farm_size, crops, crops_len, exists,
        );
        match built {
            Err(arg) => FfiBuildResult::null_arg(arg),
            Ok(Err(invalid)) => FfiBuildResult::invalid(invalid),
            Ok(Ok(ProfileSave::Create(endpoint))) => build_request(client, Ok(Ok(endpoint))),
            Ok(Ok(ProfileSave::Update(endpoint))) => build_request(client, Ok(Ok(endpoint))),
        }
    })
    .unwrap_or_else(|_| FfiBuildResult::panic("panic in farm_build_save_farmer"))
}

/// Resolve a profile save. A create yields the stored profile; an update
/// echoes the saved fields, since the backend's update body is not part of
/// the contract.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub extern "C" fn farm_resolve_save_farmer(
    client: *const FfiFarmClient,
    farmer_id: *const c_char,
    name: *const c_char,
    phone: *const c_char,
    location: *const c_char,
    farm_size: *const c_char,
    crops: *const *const c_char,
    crops_len: u32,
    exists: bool,
    response: *const FfiHttpResponse,
) -> *mut FfiResolution {
    catch_unwind(|| {
        let client = client_or!(client, FfiResolution);
        let built = save_endpoint(
            client, farmer_id, name, phone, location, farm_size, crops, crops_len, exists,
        );
        match built {
            Err(arg) => FfiResolution::null_arg(arg),
            Ok(Err(invalid)) => {
                let alert = Alert::validation(&invalid);
                FfiResolution::from_core::<()>(
                    Resolution::Failed(alert),
                    FfiErrorCode::Validation,
                    0,
                )
            }
            Ok(Ok(ProfileSave::Create(endpoint))) => {
                resolve_response(client, Ok(Ok(endpoint)), response)
            }
            Ok(Ok(ProfileSave::Update(endpoint))) => {
                let (resolution, code, status) = resolve_endpoint(client, &endpoint, response);
                let saved = endpoint.input;
                FfiResolution::from_core(resolution.map(|()| saved), code, status)
            }
        }
    })
    .unwrap_or_else(|_| FfiResolution::panic("panic in farm_resolve_save_farmer"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

fn free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let req = unsafe { Box::from_raw(req) };
    farm_free_string(req.url);
    farm_free_string(req.body);
    if !req.headers.is_null() && req.headers_len > 0 {
        let slice = std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize);
        let headers = unsafe { Box::from_raw(slice) };
        for h in headers.iter() {
            farm_free_string(h.key);
            farm_free_string(h.value);
        }
    }
}

/// Free an `FfiBuildResult` and the request it carries. Safe to call with
/// null.
#[unsafe(no_mangle)]
pub extern "C" fn farm_free_build_result(result: *mut FfiBuildResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        farm_free_string(result.error_message);
        free_request(result.request);
    });
}

/// Free an `FfiResolution` returned by any `farm_resolve_*` function. Safe
/// to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn farm_free_resolution(resolution: *mut FfiResolution) {
    if resolution.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let r = unsafe { Box::from_raw(resolution) };
        for s in [r.payload_json, r.degraded_reason, r.alert_title, r.alert_message] {
            farm_free_string(s);
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn farm_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:8001";

    fn cs(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    fn text(p: *const c_char) -> String {
        unsafe { CStr::from_ptr(p) }.to_str().unwrap().to_string()
    }

    fn client() -> *mut FfiFarmClient {
        let url = cs(BASE);
        farm_client_new(url.as_ptr())
    }

    fn payload(r: &FfiResolution) -> serde_json::Value {
        serde_json::from_str(&text(r.payload_json)).unwrap()
    }

    #[test]
    fn client_new_and_free() {
        let client = client();
        assert!(!client.is_null());
        farm_client_free(client);
    }

    #[test]
    fn client_new_null_returns_null() {
        assert!(farm_client_new(std::ptr::null()).is_null());
    }

    #[test]
    fn free_functions_accept_null() {
        farm_client_free(std::ptr::null_mut());
        farm_free_build_result(std::ptr::null_mut());
        farm_free_resolution(std::ptr::null_mut());
        farm_free_string(std::ptr::null_mut());
    }

    #[test]
    fn session_ids_are_fresh() {
        let farmer = cs("farmer_demo_001");
        let a = farm_session_new(farmer.as_ptr());
        let b = farm_session_new(std::ptr::null());
        assert!(text(a).starts_with("session_"));
        assert_ne!(text(a), text(b));
        farm_free_string(a);
        farm_free_string(b);
    }

    #[test]
    fn build_chat_produces_post_with_json_body() {
        let client = client();
        let (farmer, session, msg) = (
            cs("farmer_demo_001"),
            cs("session_1"),
            cs("  What crops grow best now? "),
        );
        let result = farm_build_chat(
            client,
            farmer.as_ptr(),
            session.as_ptr(),
            msg.as_ptr(),
            std::ptr::null(),
        );
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        let req = unsafe { &*r.request };
        assert!(matches!(req.method, FfiHttpMethod::Post));
        assert_eq!(text(req.url), format!("{BASE}/api/chat"));
        assert_eq!(req.headers_len, 1);
        let body: serde_json::Value = serde_json::from_str(&text(req.body)).unwrap();
        assert_eq!(body["message"], "What crops grow best now?");
        assert_eq!(body["session_id"], "session_1");
        assert_eq!(body["message_type"], "text");
        farm_free_build_result(result);
        farm_client_free(client);
    }

    #[test]
    fn blank_chat_is_a_validation_error_without_request() {
        let client = client();
        let (farmer, session, msg) = (cs("f"), cs("s"), cs("   "));
        let result = farm_build_chat(
            client,
            farmer.as_ptr(),
            session.as_ptr(),
            msg.as_ptr(),
            std::ptr::null(),
        );
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Validation);
        assert!(r.request.is_null());
        assert_eq!(text(r.error_message), "Type a message or attach a photo first");
        farm_free_build_result(result);
        farm_client_free(client);
    }

    #[test]
    fn same_language_translation_is_rejected() {
        let client = client();
        let (t, src, dst) = (cs("Water"), cs("english"), cs("English"));
        let result = farm_build_translate(client, t.as_ptr(), src.as_ptr(), dst.as_ptr());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::Validation);
        farm_free_build_result(result);

        let resolution = farm_resolve_translate(
            client,
            t.as_ptr(),
            src.as_ptr(),
            dst.as_ptr(),
            std::ptr::null(),
        );
        let r = unsafe { &*resolution };
        assert_eq!(r.outcome, FfiOutcome::Failed);
        assert_eq!(text(r.alert_title), "Language Error");
        farm_free_resolution(resolution);
        farm_client_free(client);
    }

    #[test]
    fn weather_location_is_encoded() {
        let client = client();
        let loc = cs("North Paravur");
        let result = farm_build_weather(client, loc.as_ptr());
        let req = unsafe { &*(*result).request };
        assert!(matches!(req.method, FfiHttpMethod::Get));
        assert_eq!(text(req.url), format!("{BASE}/api/weather/North%20Paravur"));
        assert!(req.body.is_null());
        farm_free_build_result(result);
        farm_client_free(client);
    }

    #[test]
    fn missing_weather_response_degrades_to_placeholder() {
        let client = client();
        let loc = cs("Thrissur");
        let resolution = farm_resolve_weather(client, loc.as_ptr(), std::ptr::null());
        let r = unsafe { &*resolution };
        assert_eq!(r.outcome, FfiOutcome::Degraded);
        assert_eq!(r.error_code, FfiErrorCode::Transport);
        assert!(!r.degraded_reason.is_null());
        let value = payload(r);
        assert_eq!(value["location"], "Thrissur");
        assert_eq!(value["temperature"], 28.5);
        farm_free_resolution(resolution);
        farm_client_free(client);
    }

    #[test]
    fn translate_server_error_raises_alert() {
        let client = client();
        let (t, src, dst) = (cs("Water"), cs("english"), cs("hindi"));
        let body = cs(r#"{"detail":"Translation failed"}"#);
        let resp = FfiHttpResponse {
            status: 500,
            body: body.as_ptr(),
        };
        let resolution =
            farm_resolve_translate(client, t.as_ptr(), src.as_ptr(), dst.as_ptr(), &resp);
        let r = unsafe { &*resolution };
        assert_eq!(r.outcome, FfiOutcome::Failed);
        assert_eq!(r.error_code, FfiErrorCode::Http);
        assert_eq!(r.http_status, 500);
        assert_eq!(text(r.alert_title), "Translation Failed");
        assert!(r.payload_json.is_null());
        farm_free_resolution(resolution);
        farm_client_free(client);
    }

    #[test]
    fn unknown_farmer_shows_demo_profile() {
        let client = client();
        let id = cs("farmer_demo_001");
        let body = cs(r#"{"detail":"Farmer not found"}"#);
        let resp = FfiHttpResponse {
            status: 404,
            body: body.as_ptr(),
        };
        let resolution = farm_resolve_get_farmer(client, id.as_ptr(), &resp);
        let r = unsafe { &*resolution };
        assert_eq!(r.outcome, FfiOutcome::Degraded);
        assert_eq!(r.error_code, FfiErrorCode::NotFound);
        let value = payload(r);
        assert_eq!(value["name"], "Demo Farmer");
        assert_eq!(value["id"], "farmer_demo_001");
        farm_free_resolution(resolution);
        farm_client_free(client);
    }

    #[test]
    fn live_chat_reply_is_passed_through() {
        let client = client();
        let (farmer, session, msg) = (cs("f"), cs("s"), cs("hello"));
        let body = cs(
            r#"{"response":"Namaskaram!","message_id":"m1","timestamp":"2024-06-01T08:00:00.5"}"#,
        );
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let resolution = farm_resolve_chat(
            client,
            farmer.as_ptr(),
            session.as_ptr(),
            msg.as_ptr(),
            std::ptr::null(),
            &resp,
        );
        let r = unsafe { &*resolution };
        assert_eq!(r.outcome, FfiOutcome::Live);
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.http_status, 200);
        assert_eq!(payload(r)["response"], "Namaskaram!");
        farm_free_resolution(resolution);
        farm_client_free(client);
    }

    #[test]
    fn save_farmer_update_round() {
        let client = client();
        let (id, name, phone, loc, size) = (
            cs("farmer_demo_001"),
            cs("Anu"),
            cs("+91 1"),
            cs("Kollam"),
            cs(""),
        );
        let rice = cs("Rice");
        let crops = [rice.as_ptr(), rice.as_ptr()];

        let result = farm_build_save_farmer(
            client,
            id.as_ptr(),
            name.as_ptr(),
            phone.as_ptr(),
            loc.as_ptr(),
            size.as_ptr(),
            crops.as_ptr(),
            crops.len() as u32,
            true,
        );
        let req = unsafe { &*(*result).request };
        assert!(matches!(req.method, FfiHttpMethod::Put));
        assert_eq!(text(req.url), format!("{BASE}/api/farmers/farmer_demo_001"));
        let body: serde_json::Value = serde_json::from_str(&text(req.body)).unwrap();
        assert_eq!(body["crops"], serde_json::json!(["Rice"]));
        assert!(body.get("farm_size").is_none());
        farm_free_build_result(result);

        let ok = cs(r#"{"message":"updated"}"#);
        let resp = FfiHttpResponse {
            status: 200,
            body: ok.as_ptr(),
        };
        let resolution = farm_resolve_save_farmer(
            client,
            id.as_ptr(),
            name.as_ptr(),
            phone.as_ptr(),
            loc.as_ptr(),
            size.as_ptr(),
            crops.as_ptr(),
            crops.len() as u32,
            true,
            &resp,
        );
        let r = unsafe { &*resolution };
        assert_eq!(r.outcome, FfiOutcome::Live);
        assert_eq!(payload(r)["name"], "Anu");
        farm_free_resolution(resolution);
        farm_client_free(client);
    }

    #[test]
    fn save_farmer_missing_name_is_rejected() {
        let client = client();
        let id = cs("f");
        let result = farm_build_save_farmer(
            client,
            id.as_ptr(),
            std::ptr::null(),
            std::ptr::null(),
            std::ptr::null(),
            std::ptr::null(),
            std::ptr::null(),
            0,
            false,
        );
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Validation);
        assert!(text(r.error_message).contains("name"));
        farm_free_build_result(result);
        farm_client_free(client);
    }

    #[test]
    fn disease_without_image_is_rejected() {
        let client = client();
        let id = cs("f");
        let result =
            farm_build_detect_disease(client, id.as_ptr(), std::ptr::null(), std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Validation);
        assert_eq!(text(r.error_message), "Please select or take a photo first");
        farm_free_build_result(result);
        farm_client_free(client);
    }

    #[test]
    fn null_client_and_args_are_reported() {
        let result = farm_build_weather(std::ptr::null(), std::ptr::null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        farm_free_build_result(result);

        let client = client();
        let result = farm_build_weather(client, std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        assert_eq!(text(r.error_message), "null argument: location");
        farm_free_build_result(result);

        let resolution = farm_resolve_get_farmer(client, std::ptr::null(), std::ptr::null());
        assert_eq!(unsafe { &*resolution }.error_code, FfiErrorCode::NullArg);
        farm_free_resolution(resolution);
        farm_client_free(client);
    }
}
