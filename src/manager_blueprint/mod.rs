pub mod errors;
mod models;

use std::time::Duration;
use reqwest::Client;
use serde_json::json;
use crate::initialization::BlueprintConfig;
use crate::manager_blueprint::errors::BlueprintError;
use crate::manager_blueprint::models::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part};
use crate::models::RoofDimensions;

const PROMPT: &str = "You are an expert architect who can read building blueprints. \
Your task is to analyze the provided blueprint image and extract the overall rooftop dimensions. \
Identify the main roof of the building. Determine its total length and width in meters. \
Return only these two values.";

const EMPTY_OUTPUT: &str = "Failed to get a response from the AI model.";

/// Blueprint manager, asks a vision model for the roof dimensions shown on a blueprint photo
///
pub struct Blueprint {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl Blueprint {
    /// Returns a new instance of the Blueprint struct
    ///
    /// # Arguments
    ///
    /// * 'config' - blueprint configuration
    pub fn new(config: &BlueprintConfig) -> Result<Self, BlueprintError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.to_string(),
            model: config.model.to_string(),
            api_key: config.api_key.to_string(),
        })
    }

    /// Extracts roof length and width in meters from a blueprint image
    ///
    /// # Arguments
    ///
    /// * 'data_uri' - the image as 'data:<mimetype>;base64,<encoded_data>'
    pub async fn extract_dimensions(&self, data_uri: &str) -> Result<RoofDimensions, BlueprintError> {
        let (mime_type, data) = split_data_uri(data_uri)?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let req = self.client.post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(mime_type, data))
            .send().await?;

        let status = req.status();
        if !status.is_success() {
            return Err(BlueprintError::Service(format!("{:?}", status)));
        }

        let json = req.text().await?;

        parse_dimensions(&json)
    }
}

/// Splits a base64 data URI into its mime type and payload
///
/// # Arguments
///
/// * 'data_uri' - the data URI to split
fn split_data_uri(data_uri: &str) -> Result<(&str, &str), BlueprintError> {
    let rest = data_uri.strip_prefix("data:")
        .ok_or_else(|| BlueprintError::Input("blueprint must be a data URI".to_string()))?;

    let (mime_type, data) = rest.split_once(";base64,")
        .ok_or_else(|| BlueprintError::Input("blueprint data URI must be base64 encoded".to_string()))?;

    if mime_type.is_empty() || data.is_empty() {
        return Err(BlueprintError::Input("blueprint data URI lacks mime type or payload".to_string()));
    }

    Ok((mime_type, data))
}

fn build_request(mime_type: &str, data: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts: vec![
                Part { text: Some(PROMPT.to_string()), inline_data: None },
                Part {
                    text: None,
                    inline_data: Some(InlineData { mime_type: mime_type.to_string(), data: data.to_string() }),
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: json!({
                "type": "OBJECT",
                "properties": {
                    "length": { "type": "NUMBER", "description": "The length of the main roof in meters." },
                    "width": { "type": "NUMBER", "description": "The width of the main roof in meters." }
                },
                "required": ["length", "width"]
            }),
        },
    }
}

/// Reads the structured model output out of a generateContent response
///
/// # Arguments
///
/// * 'json' - response body
fn parse_dimensions(json: &str) -> Result<RoofDimensions, BlueprintError> {
    let response: GenerateContentResponse = serde_json::from_str(json)?;

    let text = response.candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .find(|t| !t.trim().is_empty())
        .ok_or_else(|| BlueprintError::Document(EMPTY_OUTPUT.to_string()))?;

    let dimensions: RoofDimensions = serde_json::from_str(&text)?;
    if !(dimensions.length.is_finite() && dimensions.width.is_finite())
        || dimensions.length <= 0.0 || dimensions.width <= 0.0 {
        return Err(BlueprintError::Document(format!(
            "model returned unusable dimensions {} x {}", dimensions.length, dimensions.width)));
    }

    Ok(dimensions)
}
