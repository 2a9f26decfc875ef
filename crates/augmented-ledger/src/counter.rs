//! Token counting.

use std::sync::{Arc, OnceLock};

use tiktoken_rs::CoreBPE;
use tracing::warn;

/// Counts the tokens of a piece of text.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

impl<F> TokenCounter for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn count(&self, text: &str) -> usize {
        self(text)
    }
}

/// Exact GPT-4 token counts using the `cl100k_base` encoding.
///
/// The encoding tables are built once per process and shared by every clone.
#[derive(Clone)]
pub struct TiktokenCounter {
    bpe: Arc<CoreBPE>,
}

impl TiktokenCounter {
    /// Returns the shared `cl100k_base` counter, or `None` when the encoding
    /// could not be loaded.
    pub fn cl100k() -> Option<Self> {
        static BPE: OnceLock<Option<Arc<CoreBPE>>> = OnceLock::new();
        BPE.get_or_init(|| match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(Arc::new(bpe)),
            Err(e) => {
                warn!("cl100k_base encoding unavailable: {}", e);
                None
            }
        })
        .clone()
        .map(|bpe| Self { bpe })
    }
}

impl std::fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenCounter").field("encoding", &"cl100k_base").finish()
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// Default oracle: `cl100k_base` when it loads, else [`EstimatingCounter`].
pub fn default_counter() -> Arc<dyn TokenCounter> {
    match TiktokenCounter::cl100k() {
        Some(counter) => Arc::new(counter),
        None => Arc::new(EstimatingCounter::default()),
    }
}

/// Character-based estimate, roughly four characters per token for English.
#[derive(Debug, Clone, Copy)]
pub struct EstimatingCounter {
    chars_per_token: f32,
}

impl EstimatingCounter {
    pub fn new(chars_per_token: f32) -> Self {
        Self { chars_per_token: chars_per_token.max(1.0) }
    }
}

impl Default for EstimatingCounter {
    fn default() -> Self {
        Self::new(4.0)
    }
}

impl TokenCounter for EstimatingCounter {
    fn count(&self, text: &str) -> usize {
        let chars = text.chars().count();
        if chars == 0 {
            return 0;
        }
        (chars as f32 / self.chars_per_token).ceil() as usize
    }
}
