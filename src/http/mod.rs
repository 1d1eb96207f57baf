pub mod types;
pub mod parser;

pub use types::{HttpMethod, HttpRequest, HttpResponse, HttpHeaders};
pub use parser::parse_request;
