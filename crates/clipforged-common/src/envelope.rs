//! The result envelope every operation returns.

use serde::{Deserialize, Serialize};

/// Outcome of one user-facing operation.
///
/// Serialized in camelCase with absent fields omitted:
/// `{ "success": true, "message": "...", "outputFile": "clip.mp4" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            output: None,
            output_file: None,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output: None,
            output_file: None,
            error: Some(error.into()),
        }
    }

    /// Attach captured process output; empty output is left out.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        let output = output.into();
        self.output = (!output.is_empty()).then_some(output);
        self
    }

    pub fn with_output_file(mut self, file: impl Into<String>) -> Self {
        self.output_file = Some(file.into());
        self
    }
}
