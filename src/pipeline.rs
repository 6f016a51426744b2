use log::{info, warn};
use serde::Serialize;

use crate::charts::{visualize, Visualization};
use crate::error::{DecoderError, Result};
use crate::ingestion::StatementSet;
use crate::prompts::{ComposedPrompt, PromptComposer};
use crate::report::{CompletionService, GeneratedReport, ReportGenerator};
use crate::schema::{Persona, StatementKind};

/// How prompts are built for one "generate" action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalysisMode {
    /// One independent prompt and report per uploaded statement.
    PerStatement { persona: Option<Persona> },
    /// One persona-qualified prompt covering every uploaded statement.
    FullDiagnosis { persona: Persona },
}

impl Default for AnalysisMode {
    fn default() -> Self {
        AnalysisMode::PerStatement { persona: None }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
pub enum ReportOutcome {
    Generated(GeneratedReport),
    Failed { message: String },
}

impl ReportOutcome {
    pub fn report(&self) -> Option<&GeneratedReport> {
        match self {
            ReportOutcome::Generated(report) => Some(report),
            ReportOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementAnalysis {
    pub kind: StatementKind,
    pub source_name: String,
    /// Present in per-statement mode only
    pub report: Option<ReportOutcome>,
    pub visualization: Visualization,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRun {
    pub mode: AnalysisMode,
    pub statements: Vec<StatementAnalysis>,
    /// Present in full-diagnosis mode only
    pub diagnosis: Option<ReportOutcome>,
}

pub struct FinancialDecoder<S> {
    generator: ReportGenerator<S>,
    mode: AnalysisMode,
}

impl<S: CompletionService> FinancialDecoder<S> {
    pub fn new(generator: ReportGenerator<S>) -> Self {
        Self {
            generator,
            mode: AnalysisMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: AnalysisMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// Runs one analysis over the present statements. Returns
    /// `NothingToAnalyze` before any external call when the set is empty.
    /// Report failures are recorded per outcome and never stop the charts.
    pub async fn analyze(&self, statements: &StatementSet) -> Result<AnalysisRun> {
        if statements.is_empty() {
            warn!("Generate requested with no statements loaded");
            return Err(DecoderError::NothingToAnalyze);
        }

        info!(
            "Analyzing {} statement(s) in {:?} mode",
            statements.len(),
            self.mode
        );

        let mut analyses = Vec::with_capacity(statements.len());
        for document in statements.iter() {
            let report = match self.mode {
                AnalysisMode::PerStatement { persona } => {
                    let prompt = PromptComposer::compose_statement(document, persona);
                    Some(self.run_prompt(&prompt).await)
                }
                AnalysisMode::FullDiagnosis { .. } => None,
            };

            analyses.push(StatementAnalysis {
                kind: document.kind,
                source_name: document.source_name.clone(),
                report,
                visualization: visualize(document.kind.chart_title(), &document.content),
            });
        }

        let diagnosis = match self.mode {
            AnalysisMode::FullDiagnosis { persona } => {
                match PromptComposer::compose_diagnosis(statements, persona) {
                    Some(prompt) => Some(self.run_prompt(&prompt).await),
                    None => None,
                }
            }
            AnalysisMode::PerStatement { .. } => None,
        };

        Ok(AnalysisRun {
            mode: self.mode,
            statements: analyses,
            diagnosis,
        })
    }

    async fn run_prompt(&self, prompt: &ComposedPrompt) -> ReportOutcome {
        match self.generator.generate(prompt).await {
            Ok(report) => ReportOutcome::Generated(report),
            Err(e) => {
                warn!("{:?} report failed: {}", prompt.scope, e);
                ReportOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}
