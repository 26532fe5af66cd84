//! Gemini-backed assistant -- sleep coaching and workout verification over
//! the `generateContent` REST endpoint.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{SleepAdvisor, WorkoutVerification, WorkoutVerifier, SLEEP_ADVICE_EMPTY};
use crate::activity::ActivityEntry;
use crate::error::ExternalServiceError;
use crate::rewards::ActivityKind;
use crate::storage::AssistantConfig;

/// Nights of history included in the sleep prompt.
const PRIOR_NIGHTS: usize = 7;

const WORKOUT_PROMPT: &str = "Analyze this image. It is a user attempting to prove they are working out to unlock screentime.
1. Identify if a person is exercising or if it's workout equipment/gym setting.
2. Estimate the exercise type (e.g. Pushups, Squats, Gym Selfie).
3. Award \"Screentime Minutes\" between 5 and 30 based on intensity implied. If invalid, 0.
4. Provide a short, hype-man style comment.

Return JSON.";

pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl GeminiClient {
    /// Build a client from settings, reading the API key from the configured
    /// environment variable (absent key is reported on first call).
    pub fn new(settings: &AssistantConfig) -> Self {
        let api_key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
            api_key_env: settings.api_key_env.clone(),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// POST a request body and return the concatenated text parts of the
    /// first candidate.
    async fn generate(&self, body: Value) -> Result<String, ExternalServiceError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ExternalServiceError::MissingApiKey {
                env_var: self.api_key_env.clone(),
            })?;

        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ExternalServiceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ExternalServiceError::Malformed(e.to_string()))?;
        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(ExternalServiceError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl SleepAdvisor for GeminiClient {
    async fn analyze(
        &self,
        hours: f64,
        quality: u8,
        prior: &[ActivityEntry],
    ) -> Result<String, ExternalServiceError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": sleep_prompt(hours, quality, prior) }] }]
        });
        match self.generate(body).await {
            Err(ExternalServiceError::EmptyResponse) => Ok(SLEEP_ADVICE_EMPTY.to_string()),
            other => other,
        }
    }
}

#[async_trait]
impl WorkoutVerifier for GeminiClient {
    async fn verify(&self, image: &[u8]) -> Result<WorkoutVerification, ExternalServiceError> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": "image/jpeg", "data": STANDARD.encode(image) } },
                    { "text": WORKOUT_PROMPT }
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "verified": { "type": "BOOLEAN" },
                        "exerciseType": { "type": "STRING" },
                        "estimatedRepsOrIntensity": { "type": "STRING" },
                        "screentimeMinutesAwarded": { "type": "NUMBER" },
                        "motivationalComment": { "type": "STRING" }
                    },
                    "required": ["verified", "exerciseType", "screentimeMinutesAwarded", "motivationalComment"]
                }
            }
        });

        let text = self.generate(body).await?;
        parse_verification(&text)
    }
}

fn sleep_prompt(hours: f64, quality: u8, prior: &[ActivityEntry]) -> String {
    let mut prompt = format!(
        "I slept {hours} hours last night with a subjective quality of {quality}/10.\n"
    );

    let recent: Vec<String> = prior
        .iter()
        .rev()
        .filter(|e| e.kind == ActivityKind::Sleep)
        .filter_map(|e| e.sleep.as_ref())
        .take(PRIOR_NIGHTS)
        .map(|s| format!("{}h (quality {})", s.hours, s.quality))
        .collect();
    if !recent.is_empty() {
        prompt.push_str(&format!("Previous nights, most recent first: {}.\n", recent.join(", ")));
    }

    prompt.push_str(
        "Based on this, give me a short, 2-sentence actionable piece of advice to improve my \
         energy today or sleep better tonight.\nAdopt a supportive but disciplined coach persona.",
    );
    prompt
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Wire shape of the verification JSON; the model reports minutes as a
/// JSON number that may carry a fraction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerificationPayload {
    verified: bool,
    exercise_type: String,
    #[serde(default)]
    estimated_reps_or_intensity: Option<String>,
    screentime_minutes_awarded: f64,
    motivational_comment: String,
}

fn parse_verification(text: &str) -> Result<WorkoutVerification, ExternalServiceError> {
    let payload: VerificationPayload =
        serde_json::from_str(text.trim()).map_err(|e| ExternalServiceError::Malformed(e.to_string()))?;
    let minutes = if payload.screentime_minutes_awarded.is_finite() {
        payload.screentime_minutes_awarded.floor() as i64
    } else {
        0
    };
    Ok(WorkoutVerification {
        verified: payload.verified,
        exercise_type: payload.exercise_type,
        estimated_reps_or_intensity: payload.estimated_reps_or_intensity,
        screentime_minutes_awarded: minutes,
        comment: payload.motivational_comment,
    })
}
