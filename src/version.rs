/// Identifier of this package build.
pub const VERSION: &str = "0.0.1";

pub fn version() -> &'static str {
    VERSION
}
