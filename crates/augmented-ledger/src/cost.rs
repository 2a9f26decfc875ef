//! Model cost table and model-name normalization.
//!
//! All rates are USD per 1,000 tokens.

use serde::{Deserialize, Serialize};

/// Per-1,000-token USD rates for one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    pub input: f64,
    /// Rate applied to tool-result tokens; falls back to `input`.
    pub cached_input: Option<f64>,
    pub output: f64,
}

impl CostModel {
    /// Rates of an unknown model.
    pub const ZERO: CostModel = CostModel { input: 0.0, cached_input: Some(0.0), output: 0.0 };

    const fn new(input: f64, cached_input: f64, output: f64) -> Self {
        Self { input, cached_input: Some(cached_input), output }
    }

    pub fn tool_input_rate(&self) -> f64 {
        self.cached_input.unwrap_or(self.input)
    }
}

/// Whether a model takes an effort hint and a completion-token budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelClass {
    Reasoning,
    NonReasoning,
}

impl ModelClass {
    /// Classifies a model by name.
    ///
    /// Known reasoning models are matched exactly after normalization; any
    /// other `o<digit>...` name is treated as reasoning-class too.
    pub fn of(model: &str) -> Self {
        let normalized = normalize_model_name(model);
        if REASONING_COSTS.iter().any(|(name, _)| *name == normalized) {
            return ModelClass::Reasoning;
        }
        let mut chars = normalized.chars();
        match (chars.next(), chars.next()) {
            (Some('o'), Some(d)) if d.is_ascii_digit() => ModelClass::Reasoning,
            _ => ModelClass::NonReasoning,
        }
    }

    pub fn is_reasoning(&self) -> bool {
        matches!(self, ModelClass::Reasoning)
    }
}

const REASONING_COSTS: &[(&str, CostModel)] = &[
    ("o1", CostModel::new(0.015, 0.0075, 0.060)),
    ("o1-mini", CostModel::new(0.0011, 0.00055, 0.0044)),
    ("o3-mini", CostModel::new(0.0011, 0.00055, 0.0044)),
];

const STANDARD_COSTS: &[(&str, CostModel)] = &[
    ("gpt-4o", CostModel::new(0.0025, 0.00125, 0.010)),
    ("chatgpt-4o-latest", CostModel::new(0.0025, 0.00125, 0.010)),
    ("gpt-4o-mini", CostModel::new(0.00015, 0.000075, 0.0006)),
    ("claude-3.5-sonnet", CostModel::new(0.003, 0.00375, 0.015)),
    ("claude-3.5-haiku", CostModel::new(0.001, 0.001, 0.005)),
    ("claude-3-opus", CostModel::new(0.015, 0.01875, 0.075)),
];

/// Canonical name and the spellings that resolve to it.
const ALIASES: &[(&str, &[&str])] = &[
    ("o1", &["o1", "o-1"]),
    ("o1-mini", &["o1mini", "o1-mini", "o1_mini"]),
    ("o3-mini", &["o3mini", "o3-mini", "o3_mini"]),
    ("gpt-4o", &["gpt4o", "gpt-4o", "gpt_4o"]),
    ("chatgpt-4o-latest", &["chatgpt4o", "chatgpt-4o", "chatgpt_4o", "chatgpt-4o-latest"]),
    ("gpt-4o-mini", &["gpt4omini", "gpt-4o-mini", "gpt_4o_mini"]),
    ("claude-3.5-sonnet", &["claude-3-5-sonnet", "claude35sonnet", "claude3.5sonnet", "claude-3.5-sonnet"]),
    ("claude-3.5-haiku", &["claude-3-5-haiku", "claude35haiku", "claude3.5haiku", "claude-3.5-haiku"]),
    ("claude-3-opus", &["claude3opus", "claude-3opus", "claude3-opus", "claude-3-opus"]),
];

fn squash(name: &str) -> String {
    name.to_lowercase().chars().filter(|c| *c != ' ' && *c != '.').collect()
}

/// Strips everything from the first `-20dd` (a date suffix such as `-20241022`).
fn strip_date_suffix(name: &str) -> &str {
    let bytes = name.as_bytes();
    for i in 0..bytes.len() {
        if bytes[i..].starts_with(b"-20")
            && bytes.get(i + 3).is_some_and(u8::is_ascii_digit)
            && bytes.get(i + 4).is_some_and(u8::is_ascii_digit)
        {
            return &name[..i];
        }
    }
    name
}

/// Resolves a model name to its canonical cost-table name.
///
/// The date suffix is stripped, then the name is compared (lowercased,
/// without spaces or dots) against the alias table. Unmatched names come
/// back date-stripped but otherwise unchanged.
///
/// ```rust
/// use augmented_ledger::normalize_model_name;
///
/// assert_eq!(normalize_model_name("claude-3-5-sonnet-20241022"), "claude-3.5-sonnet");
/// assert_eq!(normalize_model_name("my-finetune"), "my-finetune");
/// ```
pub fn normalize_model_name(model: &str) -> String {
    let stripped = strip_date_suffix(model.trim());
    let squashed = squash(stripped);
    ALIASES
        .iter()
        .find(|(_, spellings)| spellings.iter().any(|s| squash(s) == squashed))
        .map(|(canonical, _)| canonical.to_string())
        .unwrap_or_else(|| stripped.to_string())
}

/// Looks up rates by exact normalized name; unknown models cost nothing.
pub fn model_costs(model: &str) -> CostModel {
    let normalized = normalize_model_name(model);
    REASONING_COSTS
        .iter()
        .chain(STANDARD_COSTS.iter())
        .find(|(name, _)| *name == normalized)
        .map(|(_, costs)| *costs)
        .unwrap_or(CostModel::ZERO)
}
