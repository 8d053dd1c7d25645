use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use folio_core::{ExtractionSettings, Ledger, Transaction};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

pub const LEDGER_FILE: &str = "operations.csv";
pub const ARTIFACT_DIR: &str = "documents";

const CSV_HEADER: [&str; 4] = ["date", "merchant", "amount", "page"];
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Serialize)]
struct LedgerRow<'a> {
    date: &'a str,
    merchant: &'a str,
    amount: String,
    page: u32,
}

/// Writes the ledger as a BOM-prefixed UTF-8 CSV, replacing any previous file.
///
/// The header is written even when the ledger is empty.
pub fn write_ledger_csv(path: &Path, ledger: &Ledger) -> Result<(), ExportError> {
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file);
    writer.write_record(CSV_HEADER)?;
    for tx in ledger.transactions() {
        writer.serialize(LedgerRow {
            date: &tx.date,
            merchant: &tx.merchant,
            amount: tx.amount.to_string(),
            page: tx.page,
        })?;
    }
    writer.flush()?;
    Ok(())
}

// ── File naming ──────────────────────────────────────────────────────────────

fn re_unsafe() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"[^\w\-_. ]").expect("invalid regex"))
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Replaces characters unsafe in file names with `_`, trims and truncates.
pub fn sanitize(text: &str, max_chars: usize) -> String {
    let replaced = re_unsafe().replace_all(text, "_");
    truncate_chars(replaced.trim(), max_chars)
}

/// `<date>_<merchant>_<amount>.<extension>` with the amount's `.` as `_`.
pub fn artifact_file_name(tx: &Transaction, settings: &ExtractionSettings, extension: &str) -> String {
    let date = sanitize(&tx.date, settings.filename_max_chars);
    let merchant = truncate_chars(
        &sanitize(&tx.merchant, settings.filename_max_chars),
        settings.merchant_max_chars,
    );
    let amount = tx.amount.to_string().replace('.', "_");
    format!("{date}_{merchant}_{amount}.{extension}")
}

/// First free path for `file_name` in `dir`, appending `_(2)`, `_(3)`, ...
///
/// Check-then-write: concurrent writers into one directory are not coordinated.
pub fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = name.extension().map(|e| e.to_string_lossy().into_owned());

    (2u32..)
        .map(|n| match &extension {
            Some(ext) => dir.join(format!("{stem}_({n}).{ext}")),
            None => dir.join(format!("{stem}_({n})")),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{Amount, BoundingBox};
    use std::str::FromStr;

    fn tx(date: &str, merchant: &str, amount: &str, page: u32) -> Transaction {
        Transaction::new(
            page,
            date,
            merchant,
            Amount::from_str(amount).unwrap(),
            BoundingBox::new(10.0, 10.0, 100.0, 20.0),
        )
        .unwrap()
    }

    fn read(path: &Path) -> Vec<u8> {
        std::fs::read(path).unwrap()
    }

    // ── CSV ──────────────────────────────────────────────────────────────────

    #[test]
    fn csv_has_bom_header_and_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LEDGER_FILE);
        let ledger = Ledger::new(vec![
            tx("03/02/2024", "SUPERMERCADO XYZ", "1234.56", 1),
            tx("05.02.24", "REFUND, STORE", "-45.00", 2),
        ]);
        write_ledger_csv(&path, &ledger).unwrap();

        let bytes = read(&path);
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(
            text,
            "date,merchant,amount,page\n\
             03/02/2024,SUPERMERCADO XYZ,1234.56,1\n\
             05.02.24,\"REFUND, STORE\",-45.00,2\n"
        );
    }

    #[test]
    fn empty_ledger_still_gets_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LEDGER_FILE);
        write_ledger_csv(&path, &Ledger::default()).unwrap();
        assert_eq!(read(&path), b"\xEF\xBB\xBFdate,merchant,amount,page\n");
    }

    #[test]
    fn csv_is_overwritten_not_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LEDGER_FILE);
        let ledger = Ledger::new(vec![tx("01/02/2024", "A", "1.00", 1)]);
        write_ledger_csv(&path, &ledger).unwrap();
        let first = read(&path);
        write_ledger_csv(&path, &ledger).unwrap();
        assert_eq!(read(&path), first);
    }

    #[test]
    fn csv_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join(LEDGER_FILE);
        assert!(matches!(
            write_ledger_csv(&path, &Ledger::default()),
            Err(ExportError::Io(_))
        ));
    }

    // ── Names ────────────────────────────────────────────────────────────────

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize("03/02/2024", 80), "03_02_2024");
        assert_eq!(sanitize("  CAFÉ & BAR*  ", 80), "CAFÉ _ BAR_");
        assert_eq!(sanitize("a.b-c_d e", 80), "a.b-c_d e");
        assert_eq!(sanitize("abcdef", 3), "abc");
    }

    #[test]
    fn artifact_name_combines_fields() {
        let settings = ExtractionSettings::default();
        let t = tx("03/02/2024", "SUPERMERCADO XYZ", "1234.56", 1);
        assert_eq!(
            artifact_file_name(&t, &settings, "pdf"),
            "03_02_2024_SUPERMERCADO XYZ_1234_56.pdf"
        );
        let credit = tx("05.02.24", "REFUND", "-45.00", 1);
        assert_eq!(artifact_file_name(&credit, &settings, "pdf"), "05.02.24_REFUND_-45_00.pdf");
    }

    #[test]
    fn merchant_part_is_capped() {
        let settings = ExtractionSettings::default();
        let long = "M".repeat(100);
        let name = artifact_file_name(&tx("01/02/2024", &long, "1.00", 1), &settings, "pdf");
        assert_eq!(name, format!("01_02_2024_{}_1_00.pdf", "M".repeat(40)));
    }

    #[test]
    fn collisions_get_numbered_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let first = unique_path(dir.path(), "name.pdf");
        assert_eq!(first, dir.path().join("name.pdf"));
        std::fs::write(&first, b"x").unwrap();

        let second = unique_path(dir.path(), "name.pdf");
        assert_eq!(second, dir.path().join("name_(2).pdf"));
        std::fs::write(&second, b"x").unwrap();

        assert_eq!(unique_path(dir.path(), "name.pdf"), dir.path().join("name_(3).pdf"));
    }
}
