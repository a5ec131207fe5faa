use serde::Serialize;

use crate::dispatch::Data;

/// The JSON wrapper around every response.
///
/// Success carries `data`, failure carries `message`; the absent one is
/// left out of the JSON entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub is_success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    pub fn success(email: &str, data: Data) -> Self {
        Self {
            is_success: true,
            official_email: Some(email.to_string()),
            data: Some(data),
            message: None,
        }
    }

    pub fn healthy(email: &str) -> Self {
        Self {
            is_success: true,
            official_email: Some(email.to_string()),
            data: None,
            message: None,
        }
    }

    pub fn failure(email: &str, message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            official_email: Some(email.to_string()),
            data: None,
            message: Some(message.into()),
        }
    }

    /// Sent by the rate limiter, which runs before any handler.
    pub fn throttled() -> Self {
        Self {
            is_success: false,
            official_email: None,
            data: None,
            message: Some(crate::consts::TOO_MANY_REQUESTS_MESSAGE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_omits_message() {
        let json = serde_json::to_value(Envelope::success("a@b.c", Data::Number(2))).unwrap();
        assert_eq!(
            json,
            json!({"is_success": true, "official_email": "a@b.c", "data": 2})
        );
    }

    #[test]
    fn failure_omits_data() {
        let json = serde_json::to_value(Envelope::failure("a@b.c", "nope")).unwrap();
        assert_eq!(
            json,
            json!({"is_success": false, "official_email": "a@b.c", "message": "nope"})
        );
    }

    #[test]
    fn throttled_has_no_email() {
        let json = serde_json::to_value(Envelope::throttled()).unwrap();
        assert_eq!(json, json!({"is_success": false, "message": "Too many requests"}));
    }
}
