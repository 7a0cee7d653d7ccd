//! HTTP protocol layer module
//!
//! Response builders and body collection shared by every endpoint.

pub mod body;
pub mod response;

// Re-export commonly used types
pub use body::{read_limited, BodyError};
pub use response::{
    apply_server_header, build_404_response, build_405_response, build_health_response,
    build_preflight_response, error_response, json_response,
};
