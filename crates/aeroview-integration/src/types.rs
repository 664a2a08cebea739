use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::InferenceConfig;

/// Request body for `models/{model}:generateContent`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateRequest {
    /// A single-turn request carrying `prompt`
    pub fn from_prompt(prompt: impl Into<String>, config: &InferenceConfig) -> Self {
        Self {
            contents: vec![Content {
                role: None,
                parts: vec![Part {
                    text: Some(prompt.into()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: config.temperature,
                top_k: config.top_k,
                top_p: config.top_p,
                max_output_tokens: config.max_output_tokens,
            },
        }
    }
}

/// One turn of content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Sampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

/// Response from `generateContent`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateResponse {
    /// Text of the first candidate, with its parts joined
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Minimal description of an uploaded asset sent for analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub asset_descriptor: String,
}

impl AnalysisRequest {
    pub fn new(asset_descriptor: impl Into<String>) -> Self {
        Self {
            asset_descriptor: asset_descriptor.into(),
        }
    }

    /// Natural-language prompt asking for a JSON-formatted assessment
    pub fn prompt(&self) -> String {
        format!(
            r#"Analyze a {} 3D model for aerodynamic performance. Provide:
1. A realistic drag coefficient (Cd) value between 0.25-0.45
2. 4 specific aerodynamic improvement suggestions with detailed descriptions
3. Each improvement should include the area, impact level (High/Medium/Low), description, and estimated Cd reduction

Format your response as JSON with this structure:
{{
  "dragCoefficient": number,
  "improvements": [
    {{
      "area": "string",
      "impact": "High|Medium|Low",
      "description": "string",
      "reduction": "string"
    }}
  ]
}}"#,
            self.asset_descriptor
        )
    }
}

/// Expected effect of an improvement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl FromStr for Impact {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Impact::Low),
            "medium" => Ok(Impact::Medium),
            "high" => Ok(Impact::High),
            other => Err(format!("unknown impact level '{}'", other)),
        }
    }
}

impl TryFrom<String> for Impact {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Impact::Low => "Low",
            Impact::Medium => "Medium",
            Impact::High => "High",
        };
        f.write_str(name)
    }
}

/// One suggested change to the body shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Improvement {
    pub area: String,
    pub impact: Impact,
    pub description: String,
    /// Estimated drag coefficient reduction, as reported
    pub reduction: String,
}

impl Improvement {
    pub fn new(area: &str, impact: Impact, description: &str, reduction: &str) -> Self {
        Self {
            area: area.to_string(),
            impact,
            description: description.to_string(),
            reduction: reduction.to_string(),
        }
    }
}

/// Drag coefficients below this rate as excellent
pub const EXCELLENT_DRAG_THRESHOLD: f64 = 0.35;

/// Headline verdict on a drag coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DragRating {
    Excellent,
    NeedsImprovement,
}

impl DragRating {
    pub fn for_coefficient(drag_coefficient: f64) -> Self {
        if drag_coefficient < EXCELLENT_DRAG_THRESHOLD {
            DragRating::Excellent
        } else {
            DragRating::NeedsImprovement
        }
    }
}

impl fmt::Display for DragRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DragRating::Excellent => f.write_str("Excellent"),
            DragRating::NeedsImprovement => f.write_str("Needs Improvement"),
        }
    }
}

/// A validated performance assessment.
///
/// Only this crate constructs results, and only after validation, so a
/// value of this type always has a drag coefficient in (0, 1) and at least
/// one improvement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    drag_coefficient: f64,
    improvements: Vec<Improvement>,
}

impl AnalysisResult {
    pub(crate) fn new(drag_coefficient: f64, improvements: Vec<Improvement>) -> Self {
        Self {
            drag_coefficient,
            improvements,
        }
    }

    pub fn drag_coefficient(&self) -> f64 {
        self.drag_coefficient
    }

    pub fn improvements(&self) -> &[Improvement] {
        &self.improvements
    }

    pub fn rating(&self) -> DragRating {
        DragRating::for_coefficient(self.drag_coefficient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_serde() {
        let req = GenerateRequest::from_prompt("Hello", &InferenceConfig::default());
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Hello");
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);
        assert!(json["contents"][0].get("role").is_none());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let json = r#"{
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }"#;
        let resp: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.text().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_response_without_candidates() {
        let resp: GenerateResponse = serde_json::from_str(r#"{"promptFeedback": {}}"#).unwrap();
        assert!(resp.text().is_none());
    }

    #[test]
    fn test_impact_is_case_insensitive() {
        let impacts: Vec<Impact> = serde_json::from_str(r#"["High", "medium", " LOW "]"#).unwrap();
        assert_eq!(impacts, vec![Impact::High, Impact::Medium, Impact::Low]);
        assert!(serde_json::from_str::<Impact>(r#""Extreme""#).is_err());
        assert_eq!(Impact::Medium.to_string(), "Medium");
    }

    #[test]
    fn test_prompt_mentions_asset_and_shape() {
        let prompt = AnalysisRequest::new("coupe.glb").prompt();
        assert!(prompt.contains("Analyze a coupe.glb 3D model"));
        assert!(prompt.contains("\"dragCoefficient\": number"));
    }

    #[test]
    fn test_drag_rating_threshold() {
        assert_eq!(DragRating::for_coefficient(0.28), DragRating::Excellent);
        assert_eq!(DragRating::for_coefficient(0.349), DragRating::Excellent);
        assert_eq!(DragRating::for_coefficient(0.35), DragRating::NeedsImprovement);
        assert_eq!(DragRating::NeedsImprovement.to_string(), "Needs Improvement");

        let result = AnalysisResult::new(0.41, vec![Improvement::new("Roof", Impact::Low, "", "")]);
        assert_eq!(result.rating(), DragRating::NeedsImprovement);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = AnalysisResult::new(0.31, vec![Improvement::new("Roof", Impact::Low, "Smooth", "0.002")]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["dragCoefficient"], 0.31);
        assert_eq!(json["improvements"][0]["impact"], "Low");
    }
}
