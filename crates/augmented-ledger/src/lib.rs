//! Token and cost accounting for augmented sessions.
//!
//! - [`TokenLedger`]: per-conversation, append-only token accounting
//! - [`CostModel`], [`model_costs`]: USD rates per 1,000 tokens
//! - [`normalize_model_name`]: maps dated or loosely spelled names to table keys
//! - [`ModelClass`]: reasoning vs. standard models
//! - [`TokenCounter`]: the token oracle, exact by default ([`TiktokenCounter`])
//!   with [`EstimatingCounter`] as the fallback
//!
//! # Example
//!
//! ```rust
//! use augmented_core::Role;
//! use augmented_ledger::TokenLedger;
//!
//! let mut ledger = TokenLedger::new("claude-3-5-sonnet-20241022");
//! ledger.log(Role::User, "What is 2 + 3?", false);
//! ledger.log(Role::Tool, "5", true);
//! ledger.log(Role::Assistant, "2 + 3 = 5", false);
//!
//! let summary = ledger.summary();
//! assert_eq!(summary.model.normalized, "claude-3.5-sonnet");
//! assert!(summary.costs.total_cost > 0.0);
//! ```

mod cost;
mod counter;
mod ledger;

pub use cost::{model_costs, normalize_model_name, CostModel, ModelClass};
pub use counter::{default_counter, EstimatingCounter, TiktokenCounter, TokenCounter};
pub use ledger::{
    CostBreakdown, CostSummary, HistoryEntry, InputDetails, LedgerEntry, LedgerSummary, MessageStats, ModelNames,
    TokenLedger, TokenStats,
};
