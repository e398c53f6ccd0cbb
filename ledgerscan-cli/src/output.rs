//! Printing extracted rows: aligned text table, CSV, or JSON.

use anyhow::{Context, Result};
use ledgerscan_core::{Transaction, format_amount};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::OutputFormat;

pub const HEADERS: [&str; 5] = ["Date", "Particulars", "Payments", "Receipts", "Balance"];

pub fn write_transactions(rows: &[Transaction], format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        OutputFormat::Table => write_table(rows, out),
        OutputFormat::Csv => write_csv(rows, out),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, rows).context("serialize json")?;
            writeln!(out)?;
            Ok(())
        }
    }
}

/// Display cells for one row, amounts formatted like the results table.
pub fn cells(t: &Transaction) -> [String; 5] {
    [
        t.date.clone(),
        t.particulars.clone(),
        format_amount(t.payments),
        format_amount(t.receipts),
        t.balance.clone(),
    ]
}

fn write_table(rows: &[Transaction], out: &mut dyn Write) -> Result<()> {
    let body: Vec<[String; 5]> = rows.iter().map(cells).collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for r in &body {
        for (w, c) in widths.iter_mut().zip(r.iter()) {
            *w = (*w).max(c.chars().count());
        }
    }

    let line = |cols: [&str; 5]| -> String {
        cols.iter()
            .zip(widths.iter())
            .enumerate()
            .map(|(i, (c, w))| {
                // amounts and balance right-aligned
                if i >= 2 {
                    format!("{c:>w$}")
                } else {
                    format!("{c:<w$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(out, "{}", line(HEADERS))?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", rule.join("  "))?;
    for r in &body {
        writeln!(out, "{}", line([&r[0], &r[1], &r[2], &r[3], &r[4]].map(|s| s.as_str())))?;
    }
    writeln!(out, "\n{} transaction(s)", rows.len())?;
    Ok(())
}

fn write_csv(rows: &[Transaction], out: &mut dyn Write) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for t in rows {
        wtr.serialize(t).context("write csv row")?;
    }
    if rows.is_empty() {
        wtr.write_record(["date", "particulars", "payments", "receipts", "balance"])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Default export name, e.g. `transactions-20261018-143005.csv`.
pub fn export_file_name(now: chrono::DateTime<chrono::Local>) -> PathBuf {
    PathBuf::from(format!("transactions-{}.csv", now.format("%Y%m%d-%H%M%S")))
}

pub fn export_csv(rows: &[Transaction], path: &Path) -> Result<()> {
    let mut f = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_csv(rows, &mut f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn rows() -> Vec<Transaction> {
        vec![
            Transaction {
                date: "01/01/24".to_string(),
                particulars: "Opening".to_string(),
                payments: None,
                receipts: Some(1000.0),
                balance: "1000.00 Cr".to_string(),
            },
            Transaction {
                date: "09/01/24".to_string(),
                particulars: "Cheque, 0042".to_string(),
                payments: Some(1250.5),
                receipts: None,
                balance: "250.50 Dr".to_string(),
            },
        ]
    }

    fn render(format: OutputFormat, rows: &[Transaction]) -> String {
        let mut buf = Vec::new();
        write_transactions(rows, format, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_table() {
        let s = render(OutputFormat::Table, &rows());
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines[0], "Date      Particulars   Payments  Receipts     Balance");
        assert_eq!(lines[2], "01/01/24  Opening              -  1,000.00  1000.00 Cr");
        assert_eq!(lines[3], "09/01/24  Cheque, 0042  1,250.50         -   250.50 Dr");
        assert!(s.ends_with("2 transaction(s)\n"));
    }

    #[test]
    fn test_csv_keeps_raw_values() {
        let s = render(OutputFormat::Csv, &rows());
        assert_eq!(
            s,
            "date,particulars,payments,receipts,balance\n\
             01/01/24,Opening,,1000.0,1000.00 Cr\n\
             09/01/24,\"Cheque, 0042\",1250.5,,250.50 Dr\n"
        );
    }

    #[test]
    fn test_csv_empty_still_has_header() {
        assert_eq!(
            render(OutputFormat::Csv, &[]),
            "date,particulars,payments,receipts,balance\n"
        );
    }

    #[test]
    fn test_json_round_trips() {
        let s = render(OutputFormat::Json, &rows());
        let back: Vec<Transaction> = serde_json::from_str(&s).unwrap();
        assert_eq!(back, rows());
    }

    #[test]
    fn test_export_file_name() {
        let now = chrono::Local.with_ymd_and_hms(2026, 10, 18, 14, 30, 5).unwrap();
        assert_eq!(
            export_file_name(now),
            PathBuf::from("transactions-20261018-143005.csv")
        );
    }
}
