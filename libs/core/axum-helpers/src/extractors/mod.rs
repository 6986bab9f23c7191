//! Custom extractors for common request handling patterns

mod uuid_path;
mod validated_json;

pub use uuid_path::UuidPath;
pub use validated_json::ValidatedJson;
