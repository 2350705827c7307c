pub mod cors_headers;
pub mod method_not_allowed;
pub mod not_found;
pub mod trace_response_body;
pub mod unsupported_media_type;
