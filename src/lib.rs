//! # Financial Decoder
//!
//! Turns uploaded financial statements (balance sheet, profit & loss, cash flow)
//! into written analysis from a hosted language model, plus simple trend charts
//! of the figures found in the data.
//!
//! ## Core Concepts
//!
//! - **Document Loader**: reads CSV/TSV, spreadsheet or plain-text statements into
//!   ordered columns or raw text
//! - **Prompt Composer**: fills the statement-specific template, or builds one
//!   persona-qualified "full diagnosis" prompt across every statement
//! - **Report Generator**: one completion call per prompt, failures surfaced as
//!   messages rather than errors that stop the run
//! - **Charts**: numeric values pulled from the data and drawn as index-vs-value lines
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_decoder::*;
//! use std::path::Path;
//!
//! let config = AppConfig::from_env()?;
//! let generator = ReportGenerator::new(GeminiClient::new(&config), config.model.clone());
//! let decoder = FinancialDecoder::new(generator);
//!
//! let mut statements = StatementSet::new();
//! statements.insert(load_path(StatementKind::BalanceSheet, Path::new("balance_sheet.csv"))?);
//!
//! let run = decoder.analyze(&statements).await?;
//! ```

pub mod charts;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod schema;

#[cfg(feature = "gemini")]
pub mod llm;

pub use charts::{
    extract_table_series, extract_text_series, scan_numeric_tokens, visualize, Chart,
    NumericSeries, Visualization,
};
pub use config::AppConfig;
pub use error::{DecoderError, Result};
pub use ingestion::*;
pub use pipeline::*;
pub use prompts::{ComposedPrompt, PromptComposer, PromptScope, PromptTemplate};
pub use report::*;
pub use schema::*;

#[cfg(feature = "gemini")]
pub use llm::GeminiClient;
