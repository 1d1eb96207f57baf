use std::io::{Result as IoResult, Write};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::http::{HttpRequest, HttpResponse};

/// Compress data using gzip
pub fn gzip_encode(data: &[u8]) -> IoResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut encoder = GzEncoder::new(&mut buffer, Compression::default());
    encoder.write_all(data)?;
    encoder.finish()?;
    Ok(buffer)
}

/// Gzip the response body in place when the request accepts it. Empty bodies
/// and already-encoded responses are left alone.
pub fn negotiate(request: &HttpRequest, response: &mut HttpResponse) {
    if response.body.is_empty()
        || response.headers.contains("Content-Encoding")
        || !request.headers.has_token("Accept-Encoding", "gzip")
    {
        return;
    }

    match gzip_encode(&response.body) {
        Ok(compressed) => {
            let vary = vary_with(response, "Accept-Encoding");
            response.body = compressed;
            response.headers.insert("Content-Encoding", "gzip");
            response.headers.insert("Vary", vary);
        }
        Err(e) => log::warn!("gzip encoding failed, sending identity body: {}", e),
    }
}

fn vary_with(response: &HttpResponse, field: &str) -> String {
    match response.headers.get("Vary") {
        Some(existing) if !existing.is_empty() => format!("{}, {}", existing, field),
        _ => field.to_string(),
    }
}
