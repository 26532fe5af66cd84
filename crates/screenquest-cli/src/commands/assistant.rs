//! Sleep advice and workout verification through the configured assistant.

use serde_json::json;
use std::path::Path;

use screenquest_core::{
    resolve_sleep_advice, resolve_workout, GeminiClient, Notifier, Outcome, Session,
    TracingNotifier,
};

use super::load_config;

fn messages(outcomes: &[Outcome]) -> Vec<String> {
    outcomes.iter().map(Outcome::message).collect()
}

pub fn sleep(hours: f64, quality: u8, config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    screenquest_core::activity::validate_sleep(hours, quality)?;
    let config = load_config(config_path)?;
    let client = GeminiClient::new(&config.assistant);
    if !client.has_api_key() {
        tracing::warn!(env_var = %config.assistant.api_key_env, "no assistant API key configured");
    }

    let mut session = Session::from_config(&config);
    let runtime = tokio::runtime::Runtime::new()?;
    let advice = runtime.block_on(resolve_sleep_advice(
        &client,
        hours,
        quality,
        &session.sleep_history(),
        config.assistant.timeout(),
    ));

    let outcomes = session.log_sleep(hours, quality, Some(advice.clone()))?;
    TracingNotifier.notify_all(&outcomes);
    let report = json!({
        "advice": advice,
        "messages": messages(&outcomes),
        "stats": session.stats(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn workout(image: &Path, config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(image)
        .map_err(|e| format!("cannot read image {}: {e}", image.display()))?;
    let config = load_config(config_path)?;
    let client = GeminiClient::new(&config.assistant);

    let runtime = tokio::runtime::Runtime::new()?;
    let verification = runtime.block_on(resolve_workout(&client, &bytes, config.assistant.timeout()));

    let mut session = Session::from_config(&config);
    let outcomes = session.apply_workout(verification.clone())?;
    TracingNotifier.notify_all(&outcomes);
    let report = json!({
        "verification": verification,
        "messages": messages(&outcomes),
        "stats": session.stats(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
