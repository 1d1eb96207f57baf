use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

/// HTTP request methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(format!("Unknown HTTP method: {}", s)),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP headers - case-insensitive key lookup
#[derive(Debug, Clone, Default)]
pub struct HttpHeaders {
    headers: HashMap<String, String>,
}

impl HttpHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.headers.insert(key.into().to_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(&key.to_lowercase()).map(|v| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.headers.contains_key(&key.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.headers.iter()
    }

    /// Whether a comma-separated header such as `Accept-Encoding` lists `token`.
    pub fn has_token(&self, key: &str, token: &str) -> bool {
        self.get(key).is_some_and(|value| {
            value
                .split(',')
                .map(|t| t.split(';').next().unwrap_or("").trim())
                .any(|t| t.eq_ignore_ascii_case(token))
        })
    }
}

/// HTTP request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub uri: String,
    pub http_version: String,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(
        method: HttpMethod,
        uri: String,
        http_version: String,
        headers: HttpHeaders,
        body: Vec<u8>,
    ) -> Self {
        HttpRequest {
            method,
            uri,
            http_version,
            headers,
            body,
        }
    }

    /// Request target without its query string
    pub fn path(&self) -> &str {
        self.uri.split(['?', '#']).next().unwrap_or("")
    }

    /// Whether the client asked for the connection to end after this exchange.
    pub fn wants_close(&self) -> bool {
        if self.headers.contains("Connection") {
            self.headers.has_token("Connection", "close")
        } else {
            self.http_version == "HTTP/1.0"
        }
    }
}

/// HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub http_version: String,
    pub status: u16,
    pub reason_phrase: String,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(
        status: u16,
        reason_phrase: impl Into<String>,
        headers: HttpHeaders,
        body: Vec<u8>,
    ) -> Self {
        HttpResponse {
            http_version: "HTTP/1.1".to_string(),
            status,
            reason_phrase: reason_phrase.into(),
            headers,
            body,
        }
    }

    pub fn ok(headers: HttpHeaders, body: Vec<u8>) -> Self {
        Self::new(200, "OK", headers, body)
    }

    pub fn no_content() -> Self {
        Self::new(204, "No Content", HttpHeaders::new(), Vec::new())
    }

    pub fn bad_request() -> Self {
        Self::new(400, "Bad Request", HttpHeaders::new(), Vec::new())
    }

    pub fn forbidden() -> Self {
        Self::new(403, "Forbidden", HttpHeaders::new(), Vec::new())
    }

    pub fn not_found() -> Self {
        Self::new(404, "Not Found", HttpHeaders::new(), Vec::new())
    }

    pub fn method_not_allowed() -> Self {
        Self::new(405, "Method Not Allowed", HttpHeaders::new(), Vec::new())
    }

    pub fn internal_server_error() -> Self {
        Self::new(500, "Internal Server Error", HttpHeaders::new(), Vec::new())
    }

    /// Format the status line and headers as bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut result = format!(
            "{} {} {}\r\n",
            self.http_version, self.status, self.reason_phrase
        );

        // Sorted for deterministic output
        for (key, value) in self.headers.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
            result.push_str(&format!("{}: {}\r\n", key, value));
        }

        result.push_str("\r\n");
        result.into_bytes()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut response = self.serialize();
        response.extend_from_slice(&self.body);
        response
    }
}
