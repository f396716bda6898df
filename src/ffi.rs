//! FFI interface for C/C++ hosts
//!
//! The host fetches the page itself and hands over the HTML plus a JSON
//! request; the extracted record comes back as JSON.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use serde::Deserialize;

use crate::client::{extract_app_page, AppRequest, BASE_URL};

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via free_extraction_result
#[repr(C)]
pub struct ExtractionResultFFI {
    /// JSON-serialized record (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if extraction failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Request JSON: an app request plus the URL the HTML was fetched from
#[derive(Debug, Deserialize)]
struct FfiRequest {
    #[serde(flatten)]
    request: AppRequest,
    #[serde(default)]
    url: Option<String>,
}

/// Extract an app record from fetched detail page HTML.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `request_json` - JSON request, e.g. `{"appId": "com.example", "lang": "en"}` (null-terminated)
///
/// When `url` is absent from the request, the canonical details URL is used.
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `request_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_extraction_result`
#[no_mangle]
pub unsafe extern "C" fn extract_app_from_html(
    html_ptr: *const c_char,
    html_len: usize,
    request_json: *const c_char,
) -> ExtractionResultFFI {
    let html = if html_ptr.is_null() || html_len == 0 {
        String::new()
    } else {
        let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
        match std::str::from_utf8(slice) {
            Ok(s) => s.to_string(),
            Err(_) => return make_error_result("Invalid UTF-8 in HTML content"),
        }
    };

    let request_str = if request_json.is_null() {
        return make_error_result("Request JSON is null");
    } else {
        match CStr::from_ptr(request_json).to_str() {
            Ok(s) => s,
            Err(_) => return make_error_result("Invalid UTF-8 in request JSON"),
        }
    };

    let FfiRequest { request, url } = match serde_json::from_str(request_str) {
        Ok(r) => r,
        Err(e) => return make_error_result(&format!("Failed to parse request JSON: {}", e)),
    };

    let url = match url {
        Some(url) => url,
        None => match request.details_url(BASE_URL) {
            Ok(url) => url.to_string(),
            Err(e) => return make_error_result(&e.to_string()),
        },
    };

    let record = match extract_app_page(&html, &request, &url) {
        Ok(record) => record,
        Err(e) => return make_error_result(&e.to_string()),
    };

    match serde_json::to_string(&record) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ExtractionResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

/// Free an ExtractionResultFFI returned by extract_app_from_html
///
/// # Safety
/// - `result` must have been returned by `extract_app_from_html`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_extraction_result(result: ExtractionResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

fn make_error_result(msg: &str) -> ExtractionResultFFI {
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    ExtractionResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
