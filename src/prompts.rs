// Instruction templates for the statement analyses and the combined diagnosis

use serde::Serialize;

use crate::ingestion::StatementSet;
use crate::schema::{Persona, StatementKind, UploadedDocument};

/// Placeholder replaced by the serialized statement data.
pub const DATA_SLOT: &str = "{data}";

pub const BALANCE_SHEET_TEMPLATE: &str = r#"
You are a professional financial analyst.

Analyze the following Balance Sheet and provide:

- Summary of financial position
- Key assets and liabilities
- Financial strengths and weaknesses
- Investment insights

Balance Sheet Data:
{data}
"#;

pub const PROFIT_LOSS_TEMPLATE: &str = r#"
You are a financial expert.

Analyze the following Profit & Loss statement and provide:

- Revenue trends
- Expense analysis
- Net profit evaluation
- Business performance insights

Profit & Loss Data:
{data}
"#;

pub const CASH_FLOW_TEMPLATE: &str = r#"
You are a financial consultant.

Analyze the following Cash Flow statement and provide:

- Operating cash flow analysis
- Investing and financing review
- Liquidity position
- Risk factors

Cash Flow Data:
{data}
"#;

/// System instruction sent with every single-statement analysis.
pub const SYSTEM_INSTRUCTION_STATEMENT: &str = "You turn financial statements into clear, \
accurate written analysis. Base every observation on the figures supplied and say so when \
the data is insufficient to support a conclusion.";

/// System instruction sent with the combined diagnosis.
pub const SYSTEM_INSTRUCTION_DIAGNOSIS: &str = "You are a senior financial advisor producing \
a full financial diagnosis of a company from its statements. Cross-reference the statements \
with each other and never invent figures that are not present in the data.";

/// Fixed instruction that opens the combined diagnosis prompt, after the persona qualifier.
pub const DIAGNOSIS_INSTRUCTION: &str = r#"
Produce a full financial diagnosis from the statements below. Cover:

- Overall financial health
- Profitability and efficiency
- Liquidity and solvency
- Links and inconsistencies between the statements
- Key risks and recommended actions

Each statement is introduced by its label.
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub kind: StatementKind,
    pub instruction_body: &'static str,
    pub persona: Option<Persona>,
}

impl PromptTemplate {
    pub fn with_persona(mut self, persona: Option<Persona>) -> Self {
        self.persona = persona;
        self
    }

    /// Persona qualifier (if any) followed by the body with its data slot filled.
    pub fn render(&self, data: &str) -> String {
        let body = self.instruction_body.replacen(DATA_SLOT, data, 1);
        match self.persona {
            Some(persona) => format!("{}{}", persona.qualifier(), body.trim_start()),
            None => body,
        }
    }
}

impl StatementKind {
    pub fn template(&self) -> PromptTemplate {
        let instruction_body = match self {
            StatementKind::BalanceSheet => BALANCE_SHEET_TEMPLATE,
            StatementKind::ProfitLoss => PROFIT_LOSS_TEMPLATE,
            StatementKind::CashFlow => CASH_FLOW_TEMPLATE,
        };
        PromptTemplate {
            kind: *self,
            instruction_body,
            persona: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "scope", content = "kind")]
pub enum PromptScope {
    Statement(StatementKind),
    FullDiagnosis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    pub scope: PromptScope,
    pub text: String,
}

pub struct PromptComposer;

impl PromptComposer {
    pub fn compose_statement(
        document: &UploadedDocument,
        persona: Option<Persona>,
    ) -> ComposedPrompt {
        let data = document.content.serialize_for_prompt();
        let text = document.kind.template().with_persona(persona).render(&data);

        ComposedPrompt {
            scope: PromptScope::Statement(document.kind),
            text,
        }
    }

    /// One labeled block per present statement, in canonical order. Returns
    /// `None` when no statement is present.
    pub fn compose_diagnosis(statements: &StatementSet, persona: Persona) -> Option<ComposedPrompt> {
        if statements.is_empty() {
            return None;
        }

        let mut text = String::from(persona.qualifier());
        text.push_str(DIAGNOSIS_INSTRUCTION.trim_start());

        for document in statements.iter() {
            text.push_str(&format!(
                "\n{}:\n{}\n",
                document.kind.block_label(),
                document.content.serialize_for_prompt()
            ));
        }

        Some(ComposedPrompt {
            scope: PromptScope::FullDiagnosis,
            text,
        })
    }
}
