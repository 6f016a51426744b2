use crate::error::{DecoderError, Result};
use crate::schema::{
    CellValue, DocumentContent, DocumentFormat, StatementKind, Table, UploadedDocument,
};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

impl DocumentFormat {
    pub fn from_file_name(name: &str) -> Result<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" | "tsv" => Ok(DocumentFormat::DelimitedText),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(DocumentFormat::Spreadsheet),
            "txt" => Ok(DocumentFormat::PlainText),
            _ => Err(DecoderError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// Reads one uploaded statement from a file handle, using the declared file
/// name to pick the parser.
pub fn load_document<R: Read>(
    kind: StatementKind,
    declared_name: &str,
    mut reader: R,
) -> Result<UploadedDocument> {
    let format = DocumentFormat::from_file_name(declared_name)?;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    debug!(
        "Loading {} from '{}' ({} bytes, {:?})",
        kind,
        declared_name,
        bytes.len(),
        format
    );

    let content = match format {
        DocumentFormat::DelimitedText => {
            let delimiter = if declared_name.to_lowercase().ends_with(".tsv") {
                b'\t'
            } else {
                b','
            };
            DocumentContent::Table(parse_delimited(declared_name, &bytes, delimiter)?)
        }
        DocumentFormat::Spreadsheet => {
            DocumentContent::Table(parse_spreadsheet(declared_name, bytes)?)
        }
        DocumentFormat::PlainText => DocumentContent::Text(
            String::from_utf8(bytes).map_err(|e| DecoderError::parse(declared_name, e))?,
        ),
    };

    Ok(UploadedDocument {
        kind,
        format,
        source_name: declared_name.to_string(),
        content,
    })
}

pub fn load_path(kind: StatementKind, path: &Path) -> Result<UploadedDocument> {
    let declared_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DecoderError::UnsupportedFormat(path.display().to_string()))?;
    let file = File::open(path)?;
    load_document(kind, declared_name, file)
}

fn header_name(raw: &str, index: usize) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        format!("Unnamed: {}", index)
    } else {
        trimmed.to_string()
    }
}

fn parse_delimited(name: &str, bytes: &[u8], delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(bytes);

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| DecoderError::parse(name, e))?
        .iter()
        .enumerate()
        .map(|(i, h)| header_name(h, i))
        .collect();

    if header.is_empty() {
        return Err(DecoderError::parse(name, "no columns found"));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DecoderError::parse(name, e))?;
        rows.push(record.iter().map(CellValue::parse).collect());
    }

    Ok(Table::from_rows(header, rows))
}

fn parse_spreadsheet(name: &str, bytes: Vec<u8>) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| DecoderError::parse(name, format!("failed to open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DecoderError::parse(name, "no sheets found in workbook"))?
        .map_err(|e| DecoderError::parse(name, e))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| DecoderError::parse(name, "first sheet is empty"))?
        .iter()
        .enumerate()
        .map(|(i, cell)| header_name(&cell_text(cell), i))
        .collect();

    let body = rows
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    Ok(Table::from_rows(header, body))
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) if f.is_finite() => CellValue::Number(*f),
        other => {
            let text = cell_text(other);
            if text.trim().is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(text)
            }
        }
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERR:{:?}", e),
    }
}

/// One file chosen for one statement slot.
#[derive(Debug, Clone)]
pub struct StatementUpload {
    pub kind: StatementKind,
    pub path: PathBuf,
}

impl StatementUpload {
    pub fn new(kind: StatementKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// A statement that could not be loaded. The slot is treated as absent.
#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub kind: StatementKind,
    pub source_name: String,
    pub message: String,
}

/// The statements present for one analysis, at most one per kind.
#[derive(Debug, Clone, Default)]
pub struct StatementSet {
    documents: BTreeMap<StatementKind, UploadedDocument>,
}

impl StatementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every upload; failures are collected instead of aborting the rest.
    pub fn load(uploads: &[StatementUpload]) -> (Self, Vec<LoadFailure>) {
        let mut set = Self::new();
        let mut failures = Vec::new();

        for upload in uploads {
            match load_path(upload.kind, &upload.path) {
                Ok(document) => {
                    info!("Loaded {} from {}", upload.kind, upload.path.display());
                    set.insert(document);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", upload.kind, e);
                    failures.push(LoadFailure {
                        kind: upload.kind,
                        source_name: upload.path.display().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        (set, failures)
    }

    pub fn insert(&mut self, document: UploadedDocument) -> Option<UploadedDocument> {
        self.documents.insert(document.kind, document)
    }

    pub fn get(&self, kind: StatementKind) -> Option<&UploadedDocument> {
        self.documents.get(&kind)
    }

    /// Present documents in canonical kind order.
    pub fn iter(&self) -> impl Iterator<Item = &UploadedDocument> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl FromIterator<UploadedDocument> for StatementSet {
    fn from_iter<I: IntoIterator<Item = UploadedDocument>>(iter: I) -> Self {
        let mut set = Self::new();
        for document in iter {
            set.insert(document);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DocumentFormat::from_file_name("q4.CSV").unwrap(),
            DocumentFormat::DelimitedText
        );
        assert_eq!(
            DocumentFormat::from_file_name("q4.tsv").unwrap(),
            DocumentFormat::DelimitedText
        );
        assert_eq!(
            DocumentFormat::from_file_name("book.xlsx").unwrap(),
            DocumentFormat::Spreadsheet
        );
        assert_eq!(
            DocumentFormat::from_file_name("notes.txt").unwrap(),
            DocumentFormat::PlainText
        );
        assert!(matches!(
            DocumentFormat::from_file_name("report.pdf"),
            Err(DecoderError::UnsupportedFormat(_))
        ));
        assert!(DocumentFormat::from_file_name("no_extension").is_err());
    }

    #[test]
    fn test_csv_preserves_column_order() {
        let data = "Year,Revenue,Cost,Notes\n2022,1000,400,steady\n2023,1200.5,450,\n";
        let doc = load_document(StatementKind::ProfitLoss, "pl.csv", data.as_bytes()).unwrap();

        let DocumentContent::Table(table) = &doc.content else {
            panic!("expected a table");
        };
        assert_eq!(table.column_names(), vec!["Year", "Revenue", "Cost", "Notes"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.columns[1].values[1], CellValue::Number(1200.5));
        assert_eq!(table.columns[3].values[1], CellValue::Empty);
        assert_eq!(doc.format, DocumentFormat::DelimitedText);
    }

    #[test]
    fn test_tsv_uses_tab_delimiter() {
        let data = "Item\tAmount\nCash\t50\n";
        let doc = load_document(StatementKind::BalanceSheet, "bs.tsv", data.as_bytes()).unwrap();
        let DocumentContent::Table(table) = &doc.content else {
            panic!("expected a table");
        };
        assert_eq!(table.column_names(), vec!["Item", "Amount"]);
    }

    #[test]
    fn test_blank_header_is_named() {
        let data = ",Amount\nCash,50\n";
        let doc = load_document(StatementKind::BalanceSheet, "bs.csv", data.as_bytes()).unwrap();
        let DocumentContent::Table(table) = &doc.content else {
            panic!("expected a table");
        };
        assert_eq!(table.column_names(), vec!["Unnamed: 0", "Amount"]);
    }

    #[test]
    fn test_ragged_csv_is_parse_error() {
        let data = "A,B\n1,2,3\n";
        let result = load_document(StatementKind::CashFlow, "cf.csv", data.as_bytes());
        assert!(matches!(result, Err(DecoderError::ParseError { .. })));
    }

    #[test]
    fn test_empty_csv_is_parse_error() {
        let result = load_document(StatementKind::CashFlow, "cf.csv", "".as_bytes());
        assert!(matches!(result, Err(DecoderError::ParseError { .. })));
    }

    #[test]
    fn test_plain_text_passthrough() {
        let text = "Net cash from operations: 5400\nCapex: 1200";
        let doc = load_document(StatementKind::CashFlow, "cf.txt", text.as_bytes()).unwrap();
        assert_eq!(doc.content, DocumentContent::Text(text.to_string()));
    }

    #[test]
    fn test_invalid_utf8_text_is_parse_error() {
        let bytes: &[u8] = &[0xff, 0xfe, 0x00];
        let result = load_document(StatementKind::CashFlow, "cf.txt", bytes);
        assert!(matches!(result, Err(DecoderError::ParseError { .. })));
    }

    #[test]
    fn test_garbage_spreadsheet_is_parse_error() {
        let result = load_document(
            StatementKind::BalanceSheet,
            "bs.xlsx",
            "not a workbook".as_bytes(),
        );
        assert!(matches!(result, Err(DecoderError::ParseError { .. })));
    }

    /// Minimal single-sheet xlsx package with inline strings.
    fn xlsx_fixture(rows: &[Vec<(&str, &str)>]) -> Vec<u8> {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let mut sheet_data = String::new();
        for (r, row) in rows.iter().enumerate() {
            sheet_data.push_str(&format!("<row r=\"{}\">", r + 1));
            for (reference, value) in row.iter() {
                if value.parse::<f64>().is_ok() {
                    sheet_data.push_str(&format!("<c r=\"{}\"><v>{}</v></c>", reference, value));
                } else {
                    sheet_data.push_str(&format!(
                        "<c r=\"{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                        reference, value
                    ));
                }
            }
            sheet_data.push_str("</row>");
        }

        let parts = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#.to_string(),
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_string(),
            ),
            (
                "xl/workbook.xml",
                r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#.to_string(),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                    sheet_data
                ),
            ),
        ];

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, body) in parts.iter() {
            writer.start_file(*name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_xlsx_preserves_columns_and_cell_types() {
        let bytes = xlsx_fixture(&[
            vec![("A1", "Item"), ("B1", "Current"), ("C1", "Prior")],
            vec![("A2", "Cash"), ("B2", "1500"), ("C2", "1200")],
            vec![("A3", "Inventory"), ("B3", "680.5")],
        ]);

        let document =
            load_document(StatementKind::BalanceSheet, "bs.xlsx", bytes.as_slice()).unwrap();
        assert_eq!(document.format, DocumentFormat::Spreadsheet);
        let DocumentContent::Table(table) = document.content else {
            panic!("expected a table");
        };

        assert_eq!(table.column_names(), vec!["Item", "Current", "Prior"]);
        assert_eq!(
            table.columns[0].values,
            vec![
                CellValue::Text("Cash".to_string()),
                CellValue::Text("Inventory".to_string())
            ]
        );
        assert_eq!(
            table.columns[1].values,
            vec![CellValue::Number(1500.0), CellValue::Number(680.5)]
        );
        assert_eq!(
            table.columns[2].values,
            vec![CellValue::Number(1200.0), CellValue::Empty]
        );
        let numeric: Vec<&str> = table.numeric_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(numeric, vec!["Current", "Prior"]);
    }

    #[test]
    fn test_spreadsheet_cell_mapping() {
        assert_eq!(cell_value(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(cell_value(&Data::Float(2.5)), CellValue::Number(2.5));
        assert_eq!(cell_value(&Data::Empty), CellValue::Empty);
        assert_eq!(
            cell_value(&Data::String("Cash".to_string())),
            CellValue::Text("Cash".to_string())
        );
        assert_eq!(
            cell_value(&Data::Bool(true)),
            CellValue::Text("TRUE".to_string())
        );
    }

    #[test]
    fn test_statement_set_orders_by_kind() {
        let cash = load_document(StatementKind::CashFlow, "cf.txt", "10 20".as_bytes()).unwrap();
        let balance =
            load_document(StatementKind::BalanceSheet, "bs.txt", "30 40".as_bytes()).unwrap();

        let set: StatementSet = vec![cash, balance].into_iter().collect();
        let kinds: Vec<StatementKind> = set.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![StatementKind::BalanceSheet, StatementKind::CashFlow]
        );
        assert!(set.get(StatementKind::ProfitLoss).is_none());
    }

    #[test]
    fn test_load_collects_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("bs.csv");
        let bad = dir.path().join("pl.csv");
        std::fs::write(&good, "Item,Amount\nCash,100\n").unwrap();
        std::fs::write(&bad, "A,B\n1,2,3\n").unwrap();

        let (set, failures) = StatementSet::load(&[
            StatementUpload::new(StatementKind::BalanceSheet, &good),
            StatementUpload::new(StatementKind::ProfitLoss, &bad),
            StatementUpload::new(StatementKind::CashFlow, dir.path().join("missing.txt")),
        ]);

        assert_eq!(set.len(), 1);
        assert!(set.get(StatementKind::BalanceSheet).is_some());
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].kind, StatementKind::ProfitLoss);
        assert_eq!(failures[1].kind, StatementKind::CashFlow);
    }
}
