//! Per-conversation token and cost accounting.

use std::sync::Arc;

use augmented_core::Role;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cost::{model_costs, normalize_model_name, CostModel, ModelClass};
use crate::counter::{default_counter, TokenCounter};

/// One logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub role: Role,
    pub token_count: usize,
    pub is_tool_result: bool,
}

/// Unrounded USD costs of a conversation so far.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostBreakdown {
    pub regular_input_cost: f64,
    pub tool_input_cost: f64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelNames {
    pub original: String,
    pub normalized: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageStats {
    pub total_messages: usize,
    pub tool_calls: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenStats {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub tool_tokens: usize,
    pub total_tokens: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDetails {
    pub regular_input_cost: f64,
    pub tool_input_cost: f64,
}

/// Costs rounded to six decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub input_cost: f64,
    pub input_details: InputDetails,
    pub output_cost: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub tokens: usize,
    pub is_tool: bool,
}

/// Serializable snapshot of a ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub model: ModelNames,
    pub message_stats: MessageStats,
    pub token_stats: TokenStats,
    pub costs: CostSummary,
    pub message_history: Vec<HistoryEntry>,
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Append-only token accounting for one conversation.
///
/// Totals are always derived from the entries, so `input + output` equals
/// the sum of all entry counts and `tool <= input` by construction.
pub struct TokenLedger {
    model: String,
    normalized: String,
    class: ModelClass,
    costs: CostModel,
    counter: Arc<dyn TokenCounter>,
    entries: Vec<LedgerEntry>,
}

impl TokenLedger {
    /// Creates a ledger for `model` counting with GPT-4 (`cl100k_base`)
    /// tokenization, falling back to the character estimate if the encoding
    /// fails to load.
    pub fn new(model: &str) -> Self {
        Self::with_counter(model, default_counter())
    }

    pub fn with_counter(model: &str, counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            model: model.to_string(),
            normalized: normalize_model_name(model),
            class: ModelClass::of(model),
            costs: model_costs(model),
            counter,
            entries: Vec::new(),
        }
    }

    /// Counts `content`, records an entry and returns its token count.
    ///
    /// Assistant messages count as output; every other role counts as input.
    /// Tool results are input tokens that are also tallied separately.
    pub fn log(&mut self, role: Role, content: &str, is_tool_result: bool) -> usize {
        let token_count = self.counter.count(content);
        self.entries.push(LedgerEntry { role, token_count, is_tool_result });
        token_count
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn normalized_model(&self) -> &str {
        &self.normalized
    }

    pub fn model_class(&self) -> ModelClass {
        self.class
    }

    pub fn costs(&self) -> CostModel {
        self.costs
    }

    pub fn input_tokens(&self) -> usize {
        self.entries.iter().filter(|e| e.role != Role::Assistant).map(|e| e.token_count).sum()
    }

    pub fn output_tokens(&self) -> usize {
        self.entries.iter().filter(|e| e.role == Role::Assistant).map(|e| e.token_count).sum()
    }

    /// Tool-result tokens, a subset of input tokens.
    pub fn tool_tokens(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.is_tool_result && e.role != Role::Assistant)
            .map(|e| e.token_count)
            .sum()
    }

    pub fn total_tokens(&self) -> usize {
        self.entries.iter().map(|e| e.token_count).sum()
    }

    pub fn tool_calls(&self) -> usize {
        self.entries.iter().filter(|e| e.is_tool_result).count()
    }

    /// Costs at the per-1,000-token rates of the model.
    pub fn cost(&self) -> CostBreakdown {
        let tool = self.tool_tokens() as f64;
        let regular = (self.input_tokens() - self.tool_tokens()) as f64;
        let output = self.output_tokens() as f64;

        let regular_input_cost = regular / 1000.0 * self.costs.input;
        let tool_input_cost = tool / 1000.0 * self.costs.tool_input_rate();
        let input_cost = regular_input_cost + tool_input_cost;
        let output_cost = output / 1000.0 * self.costs.output;

        CostBreakdown {
            regular_input_cost,
            tool_input_cost,
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
        }
    }

    pub fn summary(&self) -> LedgerSummary {
        let cost = self.cost();
        LedgerSummary {
            model: ModelNames { original: self.model.clone(), normalized: self.normalized.clone() },
            message_stats: MessageStats { total_messages: self.entries.len(), tool_calls: self.tool_calls() },
            token_stats: TokenStats {
                input_tokens: self.input_tokens(),
                output_tokens: self.output_tokens(),
                tool_tokens: self.tool_tokens(),
                total_tokens: self.total_tokens(),
            },
            costs: CostSummary {
                input_cost: round6(cost.input_cost),
                input_details: InputDetails {
                    regular_input_cost: round6(cost.regular_input_cost),
                    tool_input_cost: round6(cost.tool_input_cost),
                },
                output_cost: round6(cost.output_cost),
                total_cost: round6(cost.total_cost),
            },
            message_history: self
                .entries
                .iter()
                .map(|e| HistoryEntry { role: e.role, tokens: e.token_count, is_tool: e.is_tool_result })
                .collect(),
        }
    }

    /// Forgets every entry; the model and its rates are kept.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Writes the summary to the log.
    pub fn log_summary(&self) {
        let s = self.summary();
        info!("╔══════════════════════════════════════════════════════════════");
        info!("║ TOKEN USAGE AND COST SUMMARY");
        info!("║ Model: {} (normalized: {})", s.model.original, s.model.normalized);
        info!("╠══════════════════════════════════════════════════════════════");
        info!("║ Messages: {}, tool calls: {}", s.message_stats.total_messages, s.message_stats.tool_calls);
        info!(
            "║ Input tokens: {} (regular {}, tool {})",
            s.token_stats.input_tokens,
            s.token_stats.input_tokens - s.token_stats.tool_tokens,
            s.token_stats.tool_tokens
        );
        info!("║ Output tokens: {}", s.token_stats.output_tokens);
        info!("║ Total tokens: {}", s.token_stats.total_tokens);
        info!(
            "║ Input cost: ${:.6} (regular ${:.6}, tool ${:.6})",
            s.costs.input_cost, s.costs.input_details.regular_input_cost, s.costs.input_details.tool_input_cost
        );
        info!("║ Output cost: ${:.6}", s.costs.output_cost);
        info!("║ Total cost: ${:.6}", s.costs.total_cost);
        info!("╠──────────────────────────────────────────────────────────────");
        for (i, entry) in s.message_history.iter().enumerate() {
            let tool = if entry.is_tool { " (tool)" } else { "" };
            info!("║ {:>2}. {:<10}{} {} tokens", i + 1, entry.role.as_str(), tool, entry.tokens);
        }
        info!("╚══════════════════════════════════════════════════════════════");
    }
}
