use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PredictionStatus {
    Success,
    Error,
}

/// Outcome of a single prediction call. Delegate failures are folded into
/// an `Error`-status result so callers always receive a well-formed object.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub quantity: i64,
    pub status: PredictionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionResult {
    pub fn success(name: impl ToString, path: impl ToString, quantity: i64) -> Self {
        Self {
            name: name.to_string(),
            path: Some(path.to_string()),
            quantity,
            status: PredictionStatus::Success,
            error: None,
        }
    }

    pub fn failure(name: impl ToString, quantity: i64, error: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            path: None,
            quantity,
            status: PredictionStatus::Error,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_serializes_without_error_field() {
        let result = PredictionResult::success("widget", "Electronics/Widgets", 5);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["name"], "widget");
        assert_eq!(json["path"], "Electronics/Widgets");
        assert_eq!(json["quantity"], 5);
        assert_eq!(json["status"], "SUCCESS");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failure_serializes_without_path_field() {
        let result = PredictionResult::failure("broken", 1, "bad input");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "ERROR");
        assert_eq!(json["error"], "bad input");
        assert!(json.get("path").is_none());
    }
}
