use std::io::{BufRead, Error, ErrorKind};

use nom::{
    bytes::complete::{take_till1, take_while1},
    character::complete::{char, space0, space1},
    combinator::{all_consuming, map_res, rest},
    sequence::{separated_pair, tuple},
    IResult,
};

use crate::http::types::{HttpHeaders, HttpMethod, HttpRequest};

/// Upper bound on a request body this server will buffer.
const MAX_BODY_SIZE: usize = 1024 * 1024;

fn is_token_char(c: char) -> bool {
    !c.is_whitespace() && c != ':'
}

fn request_line(input: &str) -> IResult<&str, (HttpMethod, &str, &str)> {
    let (input, (method, _, uri, _, version)) = tuple((
        map_res(take_while1(|c: char| c.is_ascii_alphabetic()), |m: &str| {
            m.parse::<HttpMethod>()
        }),
        space1,
        take_till1(char::is_whitespace),
        space1,
        take_till1(char::is_whitespace),
    ))(input)?;
    Ok((input, (method, uri, version)))
}

fn header_line(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(take_while1(is_token_char), tuple((char(':'), space0)), rest)(input)
}

fn invalid(message: String) -> Error {
    Error::new(ErrorKind::InvalidData, message)
}

fn parse_request_line(line: &str) -> Result<(HttpMethod, String, String), Error> {
    let line = line.trim_end();
    let (_, (method, uri, version)) = all_consuming(request_line)(line)
        .map_err(|_| invalid(format!("Malformed HTTP request line: '{}'", line)))?;
    if !version.starts_with("HTTP/") {
        return Err(invalid(format!("Unsupported protocol: '{}'", version)));
    }
    Ok((method, uri.to_string(), version.to_string()))
}

fn parse_headers<R: BufRead>(reader: &mut R) -> Result<HttpHeaders, Error> {
    let mut headers = HttpHeaders::new();
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                "Connection closed inside headers",
            ));
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }

        let (_, (key, value)) = header_line(trimmed)
            .map_err(|_| invalid(format!("Malformed HTTP header: '{}'", trimmed)))?;

        headers.insert(key, value.trim());
    }

    Ok(headers)
}

/// Content-Length from headers, 0 when absent
fn get_content_length(headers: &HttpHeaders) -> Result<usize, Error> {
    let length = match headers.get("Content-Length") {
        Some(value) => value
            .parse::<usize>()
            .map_err(|_| invalid(format!("Invalid Content-Length value: '{}'", value)))?,
        None => 0,
    };
    if length > MAX_BODY_SIZE {
        return Err(invalid(format!("Request body too large: {} bytes", length)));
    }
    Ok(length)
}

/// Read one request from `reader`. Returns `Ok(None)` when the peer closed the
/// connection before sending a request line.
pub fn parse_request<R: BufRead>(reader: &mut R) -> Result<Option<HttpRequest>, Error> {
    let mut request_line = String::new();
    if reader.read_line(&mut request_line)? == 0 {
        return Ok(None);
    }

    let (method, uri, http_version) = parse_request_line(&request_line)?;
    let headers = parse_headers(reader)?;

    let content_length = get_content_length(&headers)?;
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body)?;

    Ok(Some(HttpRequest::new(method, uri, http_version, headers, body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_request_line_valid() {
        let (method, uri, version) = parse_request_line("GET /api/version HTTP/1.1\r\n").unwrap();
        assert_eq!(method, HttpMethod::Get);
        assert_eq!(uri, "/api/version");
        assert_eq!(version, "HTTP/1.1");
    }

    #[test]
    fn test_parse_request_line_options() {
        let (method, uri, _) = parse_request_line("OPTIONS * HTTP/1.1\r\n").unwrap();
        assert_eq!(method, HttpMethod::Options);
        assert_eq!(uri, "*");
    }

    #[test]
    fn test_parse_request_line_invalid() {
        assert!(parse_request_line("GET /index.html").is_err());
        assert!(parse_request_line("INVALID /path HTTP/1.1").is_err());
        assert!(parse_request_line("GET / SPDY/3").is_err());
        assert!(parse_request_line("").is_err());
    }

    #[test]
    fn test_parse_request_line_rejects_trailing_tokens() {
        assert!(parse_request_line("GET / HTTP/1.1 garbage extra\r\n").is_err());
        assert!(parse_request_line("GET / HTTP/1.1 \r\n").is_ok());
    }

    #[test]
    fn test_header_line() {
        let (_, (key, value)) = header_line("Origin: http://localhost:3000").unwrap();
        assert_eq!(key, "Origin");
        assert_eq!(value, "http://localhost:3000");
        assert!(header_line(": nokey").is_err());
        assert!(header_line("no colon here").is_err());
    }

    #[test]
    fn test_get_content_length() {
        let mut headers = HttpHeaders::new();
        assert_eq!(get_content_length(&headers).unwrap(), 0);
        headers.insert("Content-Length", "42");
        assert_eq!(get_content_length(&headers).unwrap(), 42);
        headers.insert("Content-Length", "not-a-number");
        assert!(get_content_length(&headers).is_err());
        headers.insert("Content-Length", (MAX_BODY_SIZE + 1).to_string());
        assert!(get_content_length(&headers).is_err());
    }

    #[test]
    fn test_parse_request_with_body() {
        let raw = b"POST /api HTTP/1.1\r\nHost: localhost\r\nContent-Length: 4\r\n\r\nping";
        let mut reader = Cursor::new(&raw[..]);
        let request = parse_request(&mut reader).unwrap().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.headers.get("host"), Some("localhost"));
        assert_eq!(request.body, b"ping");
    }

    #[test]
    fn test_parse_pipelined_requests() {
        let raw = b"GET / HTTP/1.1\r\n\r\nGET /api/version HTTP/1.1\r\n\r\n";
        let mut reader = Cursor::new(&raw[..]);
        let first = parse_request(&mut reader).unwrap().unwrap();
        let second = parse_request(&mut reader).unwrap().unwrap();
        assert_eq!(first.uri, "/");
        assert_eq!(second.uri, "/api/version");
        assert!(parse_request(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_parse_truncated_headers() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\n";
        let mut reader = Cursor::new(&raw[..]);
        let err = parse_request(&mut reader).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }
}
