use std::sync::Arc;

use itertools::Itertools;

use crate::compression;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

use super::handlers::{handle_root, handle_version};

const ALLOWED_METHODS: &[HttpMethod] = &[HttpMethod::Get, HttpMethod::Head, HttpMethod::Options];
const PREFLIGHT_MAX_AGE_SECS: u32 = 600;

/// Outcome of checking a request's `Origin` header against the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginDecision {
    /// No `Origin` header: not a cross-origin browser request.
    SameOrigin,
    Allowed(String),
    Denied(String),
}

/// Dispatches requests to handlers and applies the origin policy.
#[derive(Debug, Clone)]
pub struct Router {
    allowed_origins: Arc<[String]>,
}

impl Router {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Router {
            allowed_origins: allowed_origins.into(),
        }
    }

    pub fn check_origin(&self, request: &HttpRequest) -> OriginDecision {
        match request.headers.get("Origin") {
            None => OriginDecision::SameOrigin,
            Some(origin) if self.allowed_origins.iter().any(|o| o == origin) => {
                OriginDecision::Allowed(origin.to_string())
            }
            Some(origin) => OriginDecision::Denied(origin.to_string()),
        }
    }

    /// Produce a complete response, including Content-Length and CORS headers.
    pub fn handle(&self, request: &HttpRequest) -> HttpResponse {
        let mut response = match self.check_origin(request) {
            OriginDecision::Denied(origin) => {
                log::debug!("Rejecting request from origin {}", origin);
                HttpResponse::forbidden()
            }
            OriginDecision::Allowed(origin) => {
                let mut response = self.route(request);
                response.headers.insert("Access-Control-Allow-Origin", origin);
                response.headers.insert("Vary", "Origin");
                response
            }
            OriginDecision::SameOrigin => self.route(request),
        };

        compression::negotiate(request, &mut response);
        // 204 carries no body and must not advertise a length.
        if response.status != 204 {
            response
                .headers
                .insert("Content-Length", response.body.len().to_string());
        }

        // HEAD keeps the GET headers, Content-Length included, but sends no body.
        if request.method == HttpMethod::Head {
            response.body.clear();
        }
        response
    }

    fn route(&self, request: &HttpRequest) -> HttpResponse {
        if request.method == HttpMethod::Options {
            return Self::preflight(request);
        }
        if !matches!(request.method, HttpMethod::Get | HttpMethod::Head) {
            let mut response = HttpResponse::method_not_allowed();
            response.headers.insert("Allow", Self::allow_header());
            return response;
        }

        match request.path() {
            "/" => handle_root(request),
            "/api/version" => handle_version(request),
            _ => HttpResponse::not_found(),
        }
    }

    fn preflight(request: &HttpRequest) -> HttpResponse {
        let mut response = HttpResponse::no_content();
        response.headers.insert("Allow", Self::allow_header());
        response
            .headers
            .insert("Access-Control-Allow-Methods", Self::allow_header());
        if let Some(requested) = request.headers.get("Access-Control-Request-Headers") {
            response
                .headers
                .insert("Access-Control-Allow-Headers", requested);
        }
        response
            .headers
            .insert("Access-Control-Max-Age", PREFLIGHT_MAX_AGE_SECS.to_string());
        response
    }

    fn allow_header() -> String {
        ALLOWED_METHODS.iter().map(HttpMethod::as_str).join(", ")
    }
}
