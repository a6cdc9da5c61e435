use crate::{
    engine::{PageRenderer, TextRecognizer},
    pipeline::MealExtractor,
    report::MealResult,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    pub input: PathBuf,
    #[serde(default)]
    pub day: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub input: PathBuf,
    pub day: Value,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meals: Option<MealResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn parse_requests(raw: &str) -> Result<Vec<BatchRequest>> {
    serde_json::from_str(raw).with_context(|| "parsing requests JSON")
}

/// Runs requests in order. A bad weekday turns into an `ok: false` entry and the
/// batch moves on; render and OCR failures end it.
pub fn run_batch<R: PageRenderer, O: TextRecognizer>(
    extractor: &MealExtractor<R, O>,
    requests: Vec<BatchRequest>,
) -> Result<Vec<BatchEntry>> {
    let mut entries = Vec::with_capacity(requests.len());
    for (i, req) in requests.into_iter().enumerate() {
        info!("request {} input={} day={}", i, req.input.display(), req.day);
        let (meals, error) = match extractor.get_meals_value(&req.input, &req.day) {
            Ok(meals) => (Some(meals), None),
            Err(err) if err.is_input_error() => {
                warn!("request {} skipped: {}", i, err);
                (None, Some(err.to_string()))
            }
            Err(err) => {
                return Err(anyhow::Error::new(err).context(format!("request {i} failed")));
            }
        };
        entries.push(BatchEntry {
            input: req.input,
            day: req.day,
            ok: meals.is_some(),
            meals,
            error,
        });
    }
    Ok(entries)
}
