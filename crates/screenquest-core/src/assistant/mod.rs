//! External assistant: sleep advice and workout verification.
//!
//! The ledger never talks to the assistant directly. Callers resolve an
//! assistant call with [`resolve_sleep_advice`] or [`resolve_workout`] first,
//! which bound the wait and downgrade every failure to a neutral value, and
//! only then hand the resolved value to the session. A call that is dropped
//! before it resolves has therefore applied nothing.

pub mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::activity::ActivityEntry;
use crate::error::ExternalServiceError;

pub use gemini::GeminiClient;

/// Advice shown when the advisor fails or times out.
pub const SLEEP_ADVICE_FALLBACK: &str = "Could not analyze sleep data at this time. Try again later.";

/// Advice shown when the advisor answered with nothing.
pub const SLEEP_ADVICE_EMPTY: &str = "Keep tracking your sleep to get better insights.";

/// Comment attached to a downgraded workout verification.
pub const WORKOUT_FAILURE_COMMENT: &str = "AI connection failed. Ensure your API key is valid.";

/// Verdict on a workout capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutVerification {
    pub verified: bool,
    pub exercise_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_reps_or_intensity: Option<String>,
    /// As proposed by the verifier; clamped by the reward table when applied.
    pub screentime_minutes_awarded: i64,
    pub comment: String,
}

impl WorkoutVerification {
    /// Terminal "unverified" result with zero reward.
    pub fn unverified(comment: impl Into<String>) -> Self {
        Self {
            verified: false,
            exercise_type: "Unknown".to_string(),
            estimated_reps_or_intensity: Some("N/A".to_string()),
            screentime_minutes_awarded: 0,
            comment: comment.into(),
        }
    }
}

/// Turns a night of sleep into a short coaching note.
#[async_trait]
pub trait SleepAdvisor: Send + Sync {
    async fn analyze(
        &self,
        hours: f64,
        quality: u8,
        prior: &[ActivityEntry],
    ) -> Result<String, ExternalServiceError>;
}

/// Judges whether an image shows someone working out.
#[async_trait]
pub trait WorkoutVerifier: Send + Sync {
    async fn verify(&self, image: &[u8]) -> Result<WorkoutVerification, ExternalServiceError>;
}

/// Ask the advisor, waiting at most `timeout`. Never fails.
pub async fn resolve_sleep_advice<A>(
    advisor: &A,
    hours: f64,
    quality: u8,
    prior: &[ActivityEntry],
    timeout: Duration,
) -> String
where
    A: SleepAdvisor + ?Sized,
{
    match tokio::time::timeout(timeout, advisor.analyze(hours, quality, prior)).await {
        Ok(Ok(text)) if text.trim().is_empty() => SLEEP_ADVICE_EMPTY.to_string(),
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "sleep analysis failed");
            SLEEP_ADVICE_FALLBACK.to_string()
        }
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "sleep analysis timed out");
            SLEEP_ADVICE_FALLBACK.to_string()
        }
    }
}

/// Ask the verifier, waiting at most `timeout`. Failures and timeouts come
/// back as an unverified result.
pub async fn resolve_workout<V>(verifier: &V, image: &[u8], timeout: Duration) -> WorkoutVerification
where
    V: WorkoutVerifier + ?Sized,
{
    match tokio::time::timeout(timeout, verifier.verify(image)).await {
        Ok(Ok(verification)) => verification,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "workout verification failed");
            WorkoutVerification::unverified(WORKOUT_FAILURE_COMMENT)
        }
        Err(_) => {
            let err = ExternalServiceError::Timeout {
                timeout_secs: timeout.as_secs(),
            };
            tracing::warn!(error = %err, "workout verification timed out");
            WorkoutVerification::unverified(WORKOUT_FAILURE_COMMENT)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAdvisor(Result<&'static str, ()>);

    #[async_trait]
    impl SleepAdvisor for FixedAdvisor {
        async fn analyze(
            &self,
            _hours: f64,
            _quality: u8,
            _prior: &[ActivityEntry],
        ) -> Result<String, ExternalServiceError> {
            self.0
                .map(str::to_string)
                .map_err(|_| ExternalServiceError::EmptyResponse)
        }
    }

    struct SlowVerifier;

    #[async_trait]
    impl WorkoutVerifier for SlowVerifier {
        async fn verify(&self, _image: &[u8]) -> Result<WorkoutVerification, ExternalServiceError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(WorkoutVerification {
                verified: true,
                exercise_type: "Pushups".into(),
                estimated_reps_or_intensity: None,
                screentime_minutes_awarded: 30,
                comment: "too late".into(),
            })
        }
    }

    struct BrokenVerifier;

    #[async_trait]
    impl WorkoutVerifier for BrokenVerifier {
        async fn verify(&self, _image: &[u8]) -> Result<WorkoutVerification, ExternalServiceError> {
            Err(ExternalServiceError::Status {
                status: 500,
                body: "boom".into(),
            })
        }
    }

    #[tokio::test]
    async fn advice_passes_through() {
        let advice = resolve_sleep_advice(
            &FixedAdvisor(Ok("Sleep earlier.")),
            7.0,
            7,
            &[],
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(advice, "Sleep earlier.");
    }

    #[tokio::test]
    async fn advisor_failure_falls_back() {
        let advice =
            resolve_sleep_advice(&FixedAdvisor(Err(())), 7.0, 7, &[], Duration::from_secs(1)).await;
        assert_eq!(advice, SLEEP_ADVICE_FALLBACK);
    }

    #[tokio::test]
    async fn blank_advice_is_replaced() {
        let advice =
            resolve_sleep_advice(&FixedAdvisor(Ok("  ")), 7.0, 7, &[], Duration::from_secs(1)).await;
        assert_eq!(advice, SLEEP_ADVICE_EMPTY);
    }

    #[tokio::test(start_paused = true)]
    async fn verifier_timeout_is_unverified() {
        let verdict = resolve_workout(&SlowVerifier, b"jpeg", Duration::from_secs(5)).await;
        assert!(!verdict.verified);
        assert_eq!(verdict.screentime_minutes_awarded, 0);
        assert_eq!(verdict.comment, WORKOUT_FAILURE_COMMENT);
    }

    #[tokio::test]
    async fn verifier_error_is_unverified() {
        let verdict = resolve_workout(&BrokenVerifier, b"jpeg", Duration::from_secs(5)).await;
        assert!(!verdict.verified);
        assert_eq!(verdict.exercise_type, "Unknown");
    }
}
