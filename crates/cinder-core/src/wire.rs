//! JSON bodies shared by the HTTP server and `HttpBackend`
//!
//! Responses reuse `CreateReceipt` and `NoteView` from the store as-is.

use serde::{Deserialize, Serialize};

pub use cinder_store::{CreateReceipt, NoteView};

/// `POST /api/notes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub id: String,
    pub blob: String,
    pub ttl_minutes: f64,
    #[serde(default)]
    pub burn_after_read: bool,
    #[serde(default)]
    pub max_views: Option<u32>,
}

/// Body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub const NOTES_PATH: &str = "/api/notes";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let req: CreateNoteRequest =
            serde_json::from_str(r#"{"id":"abcdef","blob":"x","ttlMinutes":5}"#).unwrap();
        assert!(!req.burn_after_read);
        assert_eq!(req.max_views, None);
        assert_eq!(req.ttl_minutes, 5.0);
    }

    #[test]
    fn test_request_field_names() {
        let req = CreateNoteRequest {
            id: "abcdef".to_string(),
            blob: "x".to_string(),
            ttl_minutes: 1.5,
            burn_after_read: true,
            max_views: Some(4),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["ttlMinutes"], 1.5);
        assert_eq!(value["burnAfterRead"], true);
        assert_eq!(value["maxViews"], 4);
    }
}
