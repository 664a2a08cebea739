//! Interpreting inference replies as analysis results
//!
//! Replies are free-form text. The first JSON object in the text that has
//! the analysis shape is used; anything else is a [`ParseError`], and the
//! caller substitutes [`fallback_result`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::types::{AnalysisResult, Impact, Improvement};

/// Range the synthetic drag coefficient is drawn from
pub const FALLBACK_DRAG_RANGE: (f64, f64) = (0.30, 0.45);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    drag_coefficient: Value,
    #[serde(default)]
    improvements: Vec<RawImprovement>,
}

#[derive(Debug, Deserialize)]
struct RawImprovement {
    #[serde(default)]
    area: String,
    impact: Impact,
    #[serde(default)]
    description: String,
    #[serde(default)]
    reduction: Value,
}

/// Parse and validate a reply.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, ParseError> {
    let raw = extract(text)?;
    validate(raw)
}

/// Synthetic result used when the reply cannot be trusted.
///
/// The drag coefficient is drawn from [`FALLBACK_DRAG_RANGE`] with a seed
/// derived from `asset_descriptor`, so the same asset always gets the same
/// value.
pub fn fallback_result(asset_descriptor: &str) -> AnalysisResult {
    let mut rng = StdRng::seed_from_u64(fnv1a(asset_descriptor.as_bytes()));
    let (lo, hi) = FALLBACK_DRAG_RANGE;
    let drag = round3(lo + rng.gen::<f64>() * (hi - lo));

    AnalysisResult::new(
        drag,
        vec![
            Improvement::new(
                "Front Spoiler",
                Impact::High,
                "Add front air dam to reduce airflow under vehicle",
                "0.025",
            ),
            Improvement::new(
                "Rear Slope",
                Impact::Medium,
                "Reduce rear window angle by 5-8 degrees",
                "0.018",
            ),
            Improvement::new(
                "Side Mirrors",
                Impact::Low,
                "Streamline mirror housings and reduce frontal area",
                "0.008",
            ),
            Improvement::new(
                "Wheel Wells",
                Impact::Medium,
                "Add wheel well covers and optimize tire geometry",
                "0.012",
            ),
        ],
    )
}

/// Find the first JSON object in `text` with the analysis shape.
fn extract(text: &str) -> Result<RawAnalysis, ParseError> {
    let trimmed = text.trim();
    if let Ok(raw) = serde_json::from_str::<RawAnalysis>(trimmed) {
        return Ok(raw);
    }

    let mut last_error = None;
    for (start, _) in trimmed.match_indices('{') {
        // Read exactly one value from here, ignoring whatever prose follows.
        let mut stream = serde_json::Deserializer::from_str(&trimmed[start..]).into_iter::<RawAnalysis>();
        match stream.next() {
            Some(Ok(raw)) => return Ok(raw),
            Some(Err(e)) => last_error = Some(e.to_string()),
            None => {}
        }
    }

    match last_error {
        Some(e) => Err(ParseError::Malformed(e)),
        None => Err(ParseError::NoJsonObject),
    }
}

fn validate(raw: RawAnalysis) -> Result<AnalysisResult, ParseError> {
    let drag = match &raw.drag_coefficient {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ParseError::Malformed(format!("dragCoefficient is {}", raw.drag_coefficient)))?;

    let rounded = round3(drag);
    if !rounded.is_finite() || rounded <= 0.0 || rounded >= 1.0 {
        return Err(ParseError::DragOutOfRange(drag));
    }

    if raw.improvements.is_empty() {
        return Err(ParseError::NoImprovements);
    }

    let mut improvements = Vec::with_capacity(raw.improvements.len());
    for (i, item) in raw.improvements.into_iter().enumerate() {
        let area = item.area.trim();
        if area.is_empty() {
            return Err(ParseError::MissingArea(i));
        }
        let reduction = match item.reduction {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        improvements.push(Improvement {
            area: area.to_string(),
            impact: item.impact,
            description: item.description,
            reduction,
        });
    }

    Ok(AnalysisResult::new(rounded, improvements))
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// 64-bit FNV-1a; stable across runs and platforms.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}
