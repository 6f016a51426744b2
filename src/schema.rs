use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "PascalCase")]
pub enum StatementKind {
    /// Point-in-time position: assets, liabilities and equity
    BalanceSheet,
    /// Period performance: revenue, expenses and profit
    ProfitLoss,
    /// Period movements of cash across operating, investing and financing activities
    CashFlow,
}

impl StatementKind {
    /// Canonical order used wherever statements are listed together.
    pub const ALL: [StatementKind; 3] = [
        StatementKind::BalanceSheet,
        StatementKind::ProfitLoss,
        StatementKind::CashFlow,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            StatementKind::BalanceSheet => "Balance Sheet",
            StatementKind::ProfitLoss => "Profit & Loss",
            StatementKind::CashFlow => "Cash Flow",
        }
    }

    /// Label of this statement's block in a combined prompt.
    pub fn block_label(&self) -> &'static str {
        match self {
            StatementKind::BalanceSheet => "BALANCE_SHEET",
            StatementKind::ProfitLoss => "PROFIT_LOSS",
            StatementKind::CashFlow => "CASH_FLOW",
        }
    }

    pub fn analysis_heading(&self) -> String {
        format!("{} Analysis", self.title())
    }

    pub fn chart_title(&self) -> String {
        format!("{} Trends", self.title())
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum DocumentFormat {
    /// Comma or tab separated values
    DelimitedText,
    /// Excel or OpenDocument workbook
    Spreadsheet,
    /// Free-form UTF-8 text
    PlainText,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Classifies a raw cell. Only finite numbers count as numeric so that
    /// spellings like "NaN" or "inf" stay text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => CellValue::Number(value),
            _ => CellValue::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(value) => write!(f, "{}", value),
            CellValue::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// A column is numeric when it holds at least one number and no text.
    pub fn is_numeric(&self) -> bool {
        let mut has_number = false;
        for value in &self.values {
            match value {
                CellValue::Text(_) => return false,
                CellValue::Number(_) => has_number = true,
                CellValue::Empty => {}
            }
        }
        has_number
    }

    pub fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(CellValue::as_number)
    }
}

/// Ordered named columns of equal length. Column order is the source order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Builds a table from a header row and data rows. Short rows are padded
    /// with empty cells.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut columns: Vec<Column> = header
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.values.push(cells.next().unwrap_or(CellValue::Empty));
            }
        }

        Self { columns }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_numeric())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Flattens the table into an aligned text dump: a header line followed by
    /// one line per row. Column and row order are preserved and no row index
    /// is emitted.
    pub fn to_text_dump(&self) -> String {
        self.render_rows(self.row_count())
    }

    /// Same layout as [`Table::to_text_dump`], limited to the first `max_rows` rows.
    pub fn preview(&self, max_rows: usize) -> String {
        self.render_rows(max_rows.min(self.row_count()))
    }

    fn render_rows(&self, rows: usize) -> String {
        let cells: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|c| c.values.iter().take(rows).map(|v| v.to_string()).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&cells)
            .map(|(column, values)| {
                values
                    .iter()
                    .map(|v| v.chars().count())
                    .chain(std::iter::once(column.name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = Vec::with_capacity(rows + 1);
        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(column, width)| format!("{:>width$}", column.name, width = width))
            .collect();
        lines.push(header.join("  ").trim_end().to_string());

        for row in 0..rows {
            let line: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(values, width)| format!("{:>width$}", values[row], width = width))
                .collect();
            lines.push(line.join("  ").trim_end().to_string());
        }

        lines.join("\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "data")]
pub enum DocumentContent {
    Table(Table),
    Text(String),
}

impl DocumentContent {
    /// Text form substituted into prompts: tables are flattened, raw text is
    /// passed through unchanged.
    pub fn serialize_for_prompt(&self) -> String {
        match self {
            DocumentContent::Table(table) => table.to_text_dump(),
            DocumentContent::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedDocument {
    pub kind: StatementKind,
    pub format: DocumentFormat,
    /// Declared file name of the upload
    pub source_name: String,
    pub content: DocumentContent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum Persona {
    Analyst,
    Executive,
    Journalist,
}

impl Persona {
    /// Viewpoint text prefixed to prompts written for this persona.
    pub fn qualifier(&self) -> &'static str {
        match self {
            Persona::Analyst => {
                "Write from the viewpoint of a financial analyst: be rigorous, quantify every claim \
                 with the figures provided and call out ratios, trends and anomalies.\n\n"
            }
            Persona::Executive => {
                "Write from the viewpoint of a chief executive: stay concise, focus on what the \
                 numbers mean for strategy and decisions, and end with clear priorities.\n\n"
            }
            Persona::Journalist => {
                "Write from the viewpoint of a business journalist: explain the numbers in plain \
                 language for a general audience and lead with the most newsworthy finding.\n\n"
            }
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Persona::Analyst => "Analyst",
            Persona::Executive => "Executive",
            Persona::Journalist => "Journalist",
        };
        f.write_str(name)
    }
}
