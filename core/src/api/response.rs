use crate::api::result::{AnalysisResult, Visualization};
use crate::prelude::{AnalyzeError, AnalyzeResult};
use serde_json::Value;

/// Maps an HTTP status and raw body to the session outcome.
///
/// The body is inspected as loose JSON so that a partially valid payload
/// still yields the server's `error` string when one is present.
pub fn interpret_response(status: u16, body: &[u8]) -> AnalyzeResult<AnalysisResult> {
    let parsed = serde_json::from_slice::<Value>(body);
    let message = parsed.as_ref().ok().and_then(error_field);

    if !(200..300).contains(&status) {
        return Err(AnalyzeError::Server { status, message });
    }

    let value = parsed.map_err(|err| AnalyzeError::MalformedResponse {
        message: None,
        detail: format!("body is not JSON: {}", err),
    })?;

    let anomaly_count = count_field(&value, "anomaly_count").map_err(|detail| {
        AnalyzeError::MalformedResponse {
            message: message.clone(),
            detail,
        }
    })?;
    let total_pixels = count_field(&value, "total_pixels").map_err(|detail| {
        AnalyzeError::MalformedResponse {
            message: message.clone(),
            detail,
        }
    })?;
    let visualization = value
        .get("visualization")
        .and_then(Value::as_str)
        .filter(|payload| !payload.is_empty())
        .map(Visualization::from_base64);

    Ok(AnalysisResult {
        anomaly_count,
        total_pixels,
        visualization,
    })
}

fn error_field(value: &Value) -> Option<String> {
    value
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn count_field(value: &Value, name: &str) -> Result<u64, String> {
    match value.get(name) {
        None | Some(Value::Null) => Err(format!("missing field `{}`", name)),
        Some(field) => field
            .as_u64()
            .ok_or_else(|| format!("field `{}` is not a non-negative integer", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::GENERIC_FAILURE_MESSAGE;

    #[test]
    fn success_body_becomes_result() {
        let body = br#"{"anomaly_count": 7, "total_pixels": 1000, "visualization": "iVBORw=="}"#;
        let result = interpret_response(200, body).unwrap();
        assert_eq!(result.anomaly_count, 7);
        assert_eq!(result.total_pixels, 1000);
        assert_eq!(
            result.visualization.unwrap().data_uri(),
            "data:image/png;base64,iVBORw=="
        );
    }

    #[test]
    fn error_status_uses_server_message() {
        let err = interpret_response(400, br#"{"error": "unsupported format"}"#).unwrap_err();
        assert_eq!(
            err,
            AnalyzeError::Server {
                status: 400,
                message: Some("unsupported format".into())
            }
        );
        assert_eq!(err.user_message(), "unsupported format");
    }

    #[test]
    fn error_status_without_json_falls_back() {
        let err = interpret_response(502, b"<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn missing_totals_are_malformed() {
        let err = interpret_response(200, br#"{"anomaly_count": 4}"#).unwrap_err();
        match &err {
            AnalyzeError::MalformedResponse { detail, .. } => {
                assert!(detail.contains("total_pixels"))
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn negative_counts_are_malformed() {
        let err =
            interpret_response(200, br#"{"anomaly_count": -1, "total_pixels": 10}"#).unwrap_err();
        assert!(matches!(err, AnalyzeError::MalformedResponse { .. }));
    }

    #[test]
    fn non_json_success_is_malformed() {
        let err = interpret_response(200, b"ok").unwrap_err();
        assert!(matches!(
            err,
            AnalyzeError::MalformedResponse { message: None, .. }
        ));
    }

    #[test]
    fn malformed_success_keeps_error_field() {
        let err = interpret_response(200, br#"{"error": "model not loaded"}"#).unwrap_err();
        assert_eq!(err.user_message(), "model not loaded");
    }

    #[test]
    fn zero_totals_are_accepted() {
        let result =
            interpret_response(200, br#"{"anomaly_count": 0, "total_pixels": 0}"#).unwrap();
        assert_eq!(result.percentage_label(), "N/A");
    }
}
