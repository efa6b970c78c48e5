//! Client for the latex2image rendering service.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const CONVERSION_URL: &str =
    "https://e1kf0882p7.execute-api.us-east-1.amazonaws.com/default/latex2image";
const OUTPUT_FORMAT: &str = "JPG";
const OUTPUT_SCALE: &str = "1000%";

/// One outbound call per render; no caching, no retries.
#[derive(Clone)]
pub struct RenderClient {
    client: reqwest::Client,
}

#[derive(Serialize)]
struct RenderRequest {
    #[serde(rename = "latexInput")]
    latex_input: String,
    #[serde(rename = "outputFormat")]
    output_format: &'static str,
    #[serde(rename = "outputScale")]
    output_scale: &'static str,
}

#[derive(Deserialize, Debug)]
struct RenderResponse {
    #[serde(rename = "imageUrl")]
    image_url: String,
}

/// Wrap a formula in the display environment the service renders.
fn wrap_display(formula: &str) -> String {
    format!("\\begin{{align*}}\n{formula}\n\\end{{align*}}\n")
}

/// Map a response to a render outcome. A server-error status is the one
/// defined failure signal; anything else must carry an image URL.
fn interpret(status: reqwest::StatusCode, body: &str) -> Result<Option<String>, String> {
    if status.is_server_error() {
        return Ok(None);
    }
    let parsed: RenderResponse =
        serde_json::from_str(body).map_err(|e| format!("Failed to parse response: {e}"))?;
    Ok(Some(parsed.image_url))
}

impl RenderClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    /// Render a formula to an image URL.
    ///
    /// `Ok(None)` means the service rejected the input. `Err` is a transport
    /// or decoding problem; callers treat it the same as a failed render.
    pub async fn render(&self, formula: &str) -> Result<Option<String>, String> {
        let request = RenderRequest {
            latex_input: wrap_display(formula),
            output_format: OUTPUT_FORMAT,
            output_scale: OUTPUT_SCALE,
        };

        let response = self
            .client
            .post(CONVERSION_URL)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("HTTP error: {e}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response: {e}"))?;

        debug!("Renderer response status: {status}");
        if status.is_server_error() {
            warn!("Renderer reported {status} for formula: {formula}");
        }

        interpret(status, &body)
    }
}
