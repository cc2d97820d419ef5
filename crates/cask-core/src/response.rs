//! API response envelope.
//!
//! Every query operation answered by a serving layer wraps its payload in
//! the same envelope: `{ "success": bool, "data": T | null,
//! "error_message": string | null }`. The core has no notion of HTTP
//! status; translating errors into status codes is the serving layer's job.

use serde::{Deserialize, Serialize};

/// Uniform envelope for query responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error_message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error_message: None,
        }
    }

    /// A failed response carrying a user-facing message.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error_message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope() {
        let resp = ApiResponse::ok(vec!["zig-clap".to_string()]);
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(
            json,
            r#"{"success":true,"data":["zig-clap"],"error_message":null}"#
        );
    }

    #[test]
    fn test_err_envelope() {
        let resp: ApiResponse<()> = ApiResponse::err("package not found");
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(
            json,
            r#"{"success":false,"data":null,"error_message":"package not found"}"#
        );
    }
}
