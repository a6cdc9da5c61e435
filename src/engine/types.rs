use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDiag {
    pub tool: String,
    pub exe: String,
    pub version: Option<String>,
    pub ok: bool,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ToolDiag {
    pub fn failed(tool: &str, exe: &str, error: impl Into<String>) -> Self {
        Self {
            tool: tool.to_string(),
            exe: exe.to_string(),
            version: None,
            ok: false,
            languages: Vec::new(),
            error: Some(error.into()),
        }
    }
}
