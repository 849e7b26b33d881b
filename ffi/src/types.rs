//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Resolved payloads cross as JSON text so
//! the host decodes them with its own models. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use farm_core::error::ApiError;
use farm_core::http::HttpMethod;
use farm_core::{Alert, FarmClient, Resolution, ValidationError};
use serde::Serialize;

/// Opaque handle to a `FarmClient`. C callers receive a pointer to this and
/// pass it back into every FFI function.
pub struct FfiFarmClient {
    pub(crate) inner: FarmClient,
    pub(crate) max_image_bytes: usize,
}

/// Allocate a C string, dropping any interior NUL bytes.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    let mut bytes = s.into();
    bytes.retain(|b| *b != 0);
    CString::new(bytes).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data. `url` is absolute.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: farm_core::HttpRequest) -> *mut Self {
        let body = match req.body {
            Some(b) => c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
            body,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The host builds this after executing a request and passes a pointer to a
/// `farm_resolve_*` function. The FFI layer reads but does not free it.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NotFound = 1,
    Http = 2,
    Deserialization = 3,
    Serialization = 4,
    Panic = 5,
    NullArg = 6,
    Validation = 7,
    Transport = 8,
    Cancelled = 9,
    Config = 10,
}

/// Error code and HTTP status (0 when none) for an `ApiError`.
pub(crate) fn error_code(err: &ApiError) -> (FfiErrorCode, u16) {
    match err {
        ApiError::Validation(_) => (FfiErrorCode::Validation, 0),
        ApiError::NotFound => (FfiErrorCode::NotFound, 404),
        ApiError::HttpError { status, .. } => (FfiErrorCode::Http, *status),
        ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
        ApiError::DeserializationError(_) => (FfiErrorCode::Deserialization, 0),
        ApiError::SerializationError(_) => (FfiErrorCode::Serialization, 0),
        ApiError::Cancelled => (FfiErrorCode::Cancelled, 0),
        ApiError::Config(_) => (FfiErrorCode::Config, 0),
    }
}

/// Outcome of a `farm_build_*` call: a request to execute, or the reason
/// none was built. `request` is null whenever `error_code` is not `Ok`.
#[repr(C)]
pub struct FfiBuildResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub request: *mut FfiHttpRequest,
}

impl FfiBuildResult {
    pub(crate) fn ok(req: farm_core::HttpRequest) -> *mut Self {
        Box::into_raw(Box::new(FfiBuildResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            request: FfiHttpRequest::from_core(req),
        }))
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        Self::error(error_code(&err).0, &err.to_string())
    }

    /// `error_message` carries the user-facing validation message.
    pub(crate) fn invalid(err: ValidationError) -> *mut Self {
        Self::error(FfiErrorCode::Validation, &err.to_string())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, msg)
    }

    fn error(code: FfiErrorCode, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiBuildResult {
            error_code: code,
            error_message: c_string(msg),
            request: std::ptr::null_mut(),
        }))
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiOutcome {
    /// Backend data.
    Live = 0,
    /// Stand-in data; show `degraded_reason` as an offline notice.
    Degraded = 1,
    /// No data; show the alert.
    Failed = 2,
}

/// Result envelope for every `farm_resolve_*` call.
///
/// `payload_json` is set for `Live` and `Degraded`; `alert_title` and
/// `alert_message` for `Failed`. `error_code` and `http_status` describe the
/// underlying failure, if any, even when a stand-in was served.
#[repr(C)]
pub struct FfiResolution {
    pub outcome: FfiOutcome,
    pub payload_json: *mut c_char,
    pub degraded_reason: *mut c_char,
    pub alert_title: *mut c_char,
    pub alert_message: *mut c_char,
    pub error_code: FfiErrorCode,
    pub http_status: u16,
}

impl FfiResolution {
    pub(crate) fn from_core<T: Serialize>(
        resolution: Resolution<T>,
        code: FfiErrorCode,
        http_status: u16,
    ) -> *mut Self {
        let null = std::ptr::null_mut;
        let (outcome, value, reason, alert) = match resolution {
            Resolution::Live(value) => (FfiOutcome::Live, Some(value), null(), None),
            Resolution::Degraded { value, reason } => {
                (FfiOutcome::Degraded, Some(value), c_string(reason), None)
            }
            Resolution::Failed(alert) => (FfiOutcome::Failed, None, null(), Some(alert)),
        };
        let (payload_json, code) = match value.map(|v| serde_json::to_string(&v)) {
            Some(Ok(json)) => (c_string(json), code),
            Some(Err(_)) => (null(), FfiErrorCode::Serialization),
            None => (null(), code),
        };
        let (alert_title, alert_message) = match alert {
            Some(Alert { title, message }) => (c_string(title), c_string(message)),
            None => (null(), null()),
        };
        Box::into_raw(Box::new(FfiResolution {
            outcome,
            payload_json,
            degraded_reason: reason,
            alert_title,
            alert_message,
            error_code: code,
            http_status,
        }))
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failed(FfiErrorCode::NullArg, "Error", &format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failed(FfiErrorCode::Panic, "Error", msg)
    }

    fn failed(code: FfiErrorCode, title: &str, message: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiResolution {
            outcome: FfiOutcome::Failed,
            payload_json: std::ptr::null_mut(),
            degraded_reason: std::ptr::null_mut(),
            alert_title: c_string(title),
            alert_message: c_string(message),
            error_code: code,
            http_status: 0,
        }))
    }
}
