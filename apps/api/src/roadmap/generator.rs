//! Roadmap generation pipeline: prompt build → provider call (with local
//! fallback) → response normalization → personalization scoring.

use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::{ModelOutput, RoadmapModel};
use crate::models::profile::UserProfileRequest;
use crate::models::roadmap::{GenerationMetadata, RoadmapResponse};
use crate::roadmap::normalize::parse_roadmap;
use crate::roadmap::prompts::{build_user_prompt, ROADMAP_SYSTEM_PROMPT};
use crate::roadmap::scoring::calculate_personalization_score;

/// Generates a personalized roadmap for the given profile.
///
/// The hosted provider is tried first; on any provider error the local
/// fallback gets one attempt. When both fail, the primary error is surfaced
/// (the fallback failure is only logged).
pub async fn generate_roadmap(
    profile: &UserProfileRequest,
    primary: &dyn RoadmapModel,
    fallback: &dyn RoadmapModel,
    config: &Config,
) -> Result<RoadmapResponse, AppError> {
    let prompt = build_user_prompt(profile);

    let started = Instant::now();
    let (output, provider) = call_with_fallback(primary, fallback, &prompt).await?;
    let latency_ms = started.elapsed().as_millis() as u64;

    let roadmap = parse_roadmap(&output.data)?;
    let personalization_score = calculate_personalization_score(profile, &roadmap);

    info!(
        provider,
        model = %output.model,
        latency_ms,
        personalization_score,
        nodes = roadmap.nodes.len(),
        "roadmap generated"
    );

    Ok(RoadmapResponse {
        success: true,
        roadmap,
        metadata: GenerationMetadata {
            model: output.model,
            provider: provider.to_string(),
            input_tokens: output.input_tokens,
            output_tokens: output.output_tokens,
            latency_ms,
            prompt_version: config.prompt_version.clone(),
            personalization_score: Some(personalization_score),
            generated_at: Utc::now().to_rfc3339(),
        },
        error: None,
    })
}

async fn call_with_fallback<'a>(
    primary: &'a dyn RoadmapModel,
    fallback: &'a dyn RoadmapModel,
    prompt: &str,
) -> Result<(ModelOutput, &'static str), AppError> {
    match primary.generate_json(ROADMAP_SYSTEM_PROMPT, prompt).await {
        Ok(output) => Ok((output, primary.name())),
        Err(primary_err) => {
            warn!(
                provider = primary.name(),
                error = %primary_err,
                "primary provider failed, trying local fallback"
            );
            match fallback.generate_json(ROADMAP_SYSTEM_PROMPT, prompt).await {
                Ok(output) => Ok((output, fallback.name())),
                Err(fallback_err) => {
                    warn!(
                        provider = fallback.name(),
                        error = %fallback_err,
                        "fallback provider failed"
                    );
                    Err(AppError::Llm(primary_err))
                }
            }
        }
    }
}
