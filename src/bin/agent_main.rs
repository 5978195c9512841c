//! Process entry point for the conversational voice agent.
//!
//! This binary owns the ambient startup sequence common to every deployment
//! (tracing init, configuration load, LLM provider construction) and then
//! hands off to [`turnwise::agent::Agent`]. The room/transport SDK, VAD
//! engine, STT engine, and TTS engine are external collaborators (see the
//! crate's `transport`, `vad`, `stt`, and `tts` modules) that a deployment
//! wires in as concrete trait implementations; this binary validates and
//! prewarms everything that can be constructed from configuration alone.

use std::sync::Arc;
use turnwise::config::Config;
use turnwise::llm::LlmProviderFactory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("turnwise-agent starting");

    let config = Config::from_env().map_err(|e| {
        tracing::error!(error = %e, "failed to load configuration");
        anyhow::anyhow!("configuration error: {e}")
    })?;

    let llm: Arc<dyn turnwise::llm::LlmProvider> = Arc::from(LlmProviderFactory::from_config(&config));
    tracing::info!(
        provider = llm.provider_type(),
        model = llm.model_name(),
        "LLM provider prewarmed"
    );

    tracing::warn!(
        "room transport, VAD engine, STT engine, and TTS engine are external collaborators; \
         wire concrete implementations of turnwise::{{transport,vad,stt,tts}} traits into \
         turnwise::agent::Agent before running a job"
    );

    tracing::info!("turnwise-agent configuration valid, prewarm complete");
    Ok(())
}
