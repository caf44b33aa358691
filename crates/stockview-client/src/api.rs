//! Wire types for the analysis service and reply validation

use crate::error::{AnalysisError, Result, UNEXPECTED_RESPONSE};
use crate::input::AnalysisMode;
use serde::Serialize;
use serde_json::Value;

const STATUS_SUCCESS: &str = "success";

/// Body of `POST /analyze`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequestBody {
    pub stock_symbol: String,
    pub analysis_type: AnalysisMode,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequestBody {
    pub user_question: String,
}

/// Raw HTTP reply as seen by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    /// Reason phrase, e.g. "Service Unavailable"
    pub status_text: String,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    /// 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `"<code> <reason>"`
    pub fn status_line(&self) -> String {
        format!("{} {}", self.status, self.status_text)
            .trim_end()
            .to_string()
    }
}

/// Top-level JSON object returned by the service
///
/// Built leniently from any JSON value: fields of the wrong type are treated
/// as absent rather than failing the parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisEnvelope {
    pub status: Option<String>,
    pub data: Option<String>,
    pub message: Option<String>,
    pub stock_symbol: Option<String>,
    pub analysis_type: Option<String>,
}

impl AnalysisEnvelope {
    pub fn from_value(value: &Value) -> Self {
        Self {
            status: string_field(value, "status"),
            data: string_field(value, "data"),
            message: string_field(value, "message"),
            stock_symbol: string_field(value, "stock_symbol"),
            analysis_type: string_field(value, "analysis_type"),
        }
    }

    /// Whether the echoed symbol and mode, when present, match what was sent
    pub fn echoes(&self, sent: &AnalysisRequestBody) -> bool {
        let symbol_ok = self
            .stock_symbol
            .as_deref()
            .is_none_or(|s| s.eq_ignore_ascii_case(&sent.stock_symbol));
        let mode_ok = self
            .analysis_type
            .as_deref()
            .is_none_or(|m| m == sent.analysis_type.as_str());
        symbol_ok && mode_ok
    }

    /// Markdown payload if the envelope satisfies the success contract
    pub fn into_markdown(self) -> Result<String> {
        match (self.status.as_deref(), self.data) {
            (Some(STATUS_SUCCESS), Some(data)) if !data.is_empty() => Ok(data),
            _ => Err(AnalysisError::Protocol(
                self.message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| UNEXPECTED_RESPONSE.to_string()),
            )),
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Turn a raw reply into markdown or the error the user should see
///
/// - non-2xx: the body's `message`, else `"<code> <reason>"`
/// - 2xx: the envelope's `data` when `status == "success"`, else its
///   `message`, else "Unexpected API response"
pub fn interpret_reply(reply: &HttpReply) -> Result<String> {
    parse_reply(reply)?.into_markdown()
}

/// Status check plus envelope parse, without applying the success contract
///
/// Non-2xx replies and 2xx bodies that are not JSON fail here.
pub fn parse_reply(reply: &HttpReply) -> Result<AnalysisEnvelope> {
    if !reply.is_success() {
        let message = serde_json::from_str::<Value>(&reply.body)
            .ok()
            .and_then(|body| string_field(&body, "message"))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| reply.status_line());
        return Err(AnalysisError::HttpStatus {
            status: reply.status,
            message,
        });
    }

    let body: Value = serde_json::from_str(&reply.body).map_err(|e| {
        AnalysisError::Protocol(format!("Invalid JSON in API response: {e}"))
    })?;
    Ok(AnalysisEnvelope::from_value(&body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_wire_format() {
        let body = AnalysisRequestBody {
            stock_symbol: "AAPL".to_string(),
            analysis_type: AnalysisMode::NewsImpact,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"stock_symbol": "AAPL", "analysis_type": "News Impact"})
        );
    }

    #[test]
    fn test_success_envelope() {
        let reply = HttpReply::new(
            200,
            "OK",
            r##"{"status":"success","stock_symbol":"AAPL","analysis_type":"Complete Analysis","data":"# Hi"}"##,
        );
        assert_eq!(interpret_reply(&reply).unwrap(), "# Hi");
    }

    #[test]
    fn test_http_error_with_message() {
        let reply = HttpReply::new(500, "Internal Server Error", r#"{"message":"server overloaded"}"#);
        assert_eq!(
            interpret_reply(&reply).unwrap_err(),
            AnalysisError::HttpStatus {
                status: 500,
                message: "server overloaded".to_string()
            }
        );
    }

    #[test]
    fn test_http_error_without_parsable_body() {
        let reply = HttpReply::new(503, "Service Unavailable", "<html>down</html>");
        assert_eq!(
            interpret_reply(&reply).unwrap_err().to_string(),
            "503 Service Unavailable"
        );

        let reply = HttpReply::new(400, "Bad Request", r#"{"status":"error","message":""}"#);
        assert_eq!(interpret_reply(&reply).unwrap_err().to_string(), "400 Bad Request");
    }

    #[test]
    fn test_missing_data_is_protocol_error() {
        let reply = HttpReply::new(200, "OK", r#"{"status":"success"}"#);
        assert_eq!(
            interpret_reply(&reply).unwrap_err(),
            AnalysisError::Protocol("Unexpected API response".to_string())
        );

        let reply = HttpReply::new(200, "OK", r#"{"status":"success","data":""}"#);
        assert_eq!(interpret_reply(&reply).unwrap_err().to_string(), "Unexpected API response");
    }

    #[test]
    fn test_error_status_in_2xx_envelope() {
        let reply = HttpReply::new(200, "OK", r#"{"status":"error","message":"Invalid 'analysis_type'"}"#);
        assert_eq!(interpret_reply(&reply).unwrap_err().to_string(), "Invalid 'analysis_type'");
    }

    #[test]
    fn test_non_object_and_wrong_types() {
        let reply = HttpReply::new(200, "OK", "[1, 2]");
        assert_eq!(interpret_reply(&reply).unwrap_err().to_string(), "Unexpected API response");

        let reply = HttpReply::new(200, "OK", r#"{"status":"success","data":42}"#);
        assert_eq!(interpret_reply(&reply).unwrap_err().to_string(), "Unexpected API response");
    }

    #[test]
    fn test_invalid_json_on_2xx() {
        let reply = HttpReply::new(200, "OK", "not json");
        let err = interpret_reply(&reply).unwrap_err();
        assert!(matches!(err, AnalysisError::Protocol(ref m) if m.starts_with("Invalid JSON in API response")));
    }

    #[test]
    fn test_envelope_echo_check() {
        let sent = AnalysisRequestBody {
            stock_symbol: "AAPL".to_string(),
            analysis_type: AnalysisMode::CompleteAnalysis,
        };

        let reply = HttpReply::new(
            200,
            "OK",
            r#"{"status":"success","stock_symbol":"AAPL","analysis_type":"Complete Analysis","data":"x"}"#,
        );
        assert!(parse_reply(&reply).unwrap().echoes(&sent));

        let reply = HttpReply::new(200, "OK", r#"{"status":"success","data":"x"}"#);
        assert!(parse_reply(&reply).unwrap().echoes(&sent));

        let reply = HttpReply::new(200, "OK", r#"{"status":"success","stock_symbol":"MSFT","data":"x"}"#);
        assert!(!parse_reply(&reply).unwrap().echoes(&sent));

        let reply = HttpReply::new(200, "OK", r#"{"status":"success","analysis_type":"News Impact","data":"x"}"#);
        assert!(!parse_reply(&reply).unwrap().echoes(&sent));
    }

    #[test]
    fn test_status_line_without_reason() {
        let reply = HttpReply::new(599, "", "");
        assert_eq!(reply.status_line(), "599");
    }
}
