//! Provider routing.

use std::sync::Arc;

use augmented_core::{ProviderKind, StructuredDecoder};
use tracing::info;

use crate::{AnthropicClient, ChatProvider, OpenAiClient};

/// Builds the streaming client for `kind`.
///
/// `api_base` only applies to OpenAI-compatible endpoints.
pub fn connect(kind: ProviderKind, api_key: &str, api_base: Option<&str>) -> Arc<dyn ChatProvider> {
    info!("Connecting provider: {}", kind);
    match kind {
        ProviderKind::Anthropic => Arc::new(AnthropicClient::new(api_key)),
        ProviderKind::OpenAi => Arc::new(OpenAiClient::new(api_key, api_base)),
    }
}

/// Builds a structured-output decoder. Only the OpenAI client offers strict
/// JSON-schema responses, so this always targets OpenAI.
pub fn connect_decoder(api_key: &str, api_base: Option<&str>, model: Option<&str>) -> Arc<dyn StructuredDecoder> {
    let client = OpenAiClient::new(api_key, api_base);
    match model {
        Some(model) => Arc::new(client.with_structured_model(model)),
        None => Arc::new(client),
    }
}
