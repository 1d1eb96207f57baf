use serde::Serialize;

use crate::http::{HttpHeaders, HttpRequest, HttpResponse};
use crate::version::VERSION;

pub const ROOT_BANNER: &str = "Ollama is running";

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
}

/// Handle GET/HEAD request to "/"
pub fn handle_root(_request: &HttpRequest) -> HttpResponse {
    let mut headers = HttpHeaders::new();
    headers.insert("Content-Type", "text/plain; charset=utf-8");
    HttpResponse::ok(headers, ROOT_BANNER.as_bytes().to_vec())
}

/// Handle GET request to "/api/version"
pub fn handle_version(_request: &HttpRequest) -> HttpResponse {
    match serde_json::to_vec(&VersionResponse { version: VERSION }) {
        Ok(body) => {
            let mut headers = HttpHeaders::new();
            headers.insert("Content-Type", "application/json; charset=utf-8");
            HttpResponse::ok(headers, body)
        }
        Err(e) => {
            log::error!("Failed to serialize version response: {}", e);
            HttpResponse::internal_server_error()
        }
    }
}
