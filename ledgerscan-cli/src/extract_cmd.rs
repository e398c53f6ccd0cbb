use anyhow::{Result, anyhow, bail};
use ledgerscan_core::{Event, Screen, Session};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::OutputFormat;
use crate::output;
use crate::paths::stage;

/// Extract once and print the rows. Fails with the same message the UI would show.
pub async fn run(
    mut session: Session,
    files: Vec<PathBuf>,
    format: OutputFormat,
    out_path: Option<&Path>,
) -> Result<()> {
    session.boot().await;
    if session.state().screen() == Screen::Gated {
        bail!("No API key selected. Run: ledgerscan auth set-key");
    }

    session.handle(Event::FilesSelected(stage(files))).await;
    session.handle(Event::ExtractRequested).await;

    let state = session.state();
    if let Some(e) = state.error() {
        return Err(anyhow!("{e}"));
    }

    let rows = state.transactions();
    info!(rows = rows.len(), "printing transactions");
    match out_path {
        Some(p) => {
            let mut f = std::fs::File::create(p)?;
            output::write_transactions(rows, format, &mut f)?;
            f.flush()?;
            eprintln!("Wrote {} transaction(s) to {}", rows.len(), p.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            if rows.is_empty() && format == OutputFormat::Table {
                writeln!(lock, "No transactions were found in the uploaded statement(s).")?;
            } else {
                output::write_transactions(rows, format, &mut lock)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ledgerscan_core::{
        CredentialError, CredentialService, ExtractionError, Extractor, MessageMarkers,
        StagedFile, Transaction,
    };
    use std::sync::Arc;

    struct Creds(bool);

    #[async_trait]
    impl CredentialService for Creds {
        async fn has_selected_credential(&self) -> Result<bool, CredentialError> {
            Ok(self.0)
        }
        async fn open_selection_dialog(&self) -> Result<(), CredentialError> {
            Ok(())
        }
    }

    struct Fixed(Result<Vec<Transaction>, ExtractionError>);

    #[async_trait]
    impl Extractor for Fixed {
        async fn extract(&self, _files: &[StagedFile]) -> Result<Vec<Transaction>, ExtractionError> {
            self.0.clone()
        }
    }

    fn session(key: bool, result: Result<Vec<Transaction>, ExtractionError>) -> Session {
        Session::new(
            Arc::new(Creds(key)),
            Arc::new(Fixed(result)),
            Arc::new(MessageMarkers::default()),
        )
    }

    fn row() -> Transaction {
        Transaction {
            date: "02/01/24".to_string(),
            particulars: "Salary".to_string(),
            payments: None,
            receipts: Some(5000.0),
            balance: "5000.00 Cr".to_string(),
        }
    }

    #[tokio::test]
    async fn test_writes_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.csv");

        run(
            session(true, Ok(vec![row()])),
            vec![PathBuf::from("p1.png")],
            OutputFormat::Csv,
            Some(&out),
        )
        .await
        .unwrap();

        let s = std::fs::read_to_string(&out).unwrap();
        assert!(s.contains("02/01/24,Salary,,5000.0,5000.00 Cr"));
    }

    #[tokio::test]
    async fn test_no_key_fails_before_extracting() {
        let err = run(session(false, Ok(vec![])), vec![PathBuf::from("p1.png")], OutputFormat::Table, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("auth set-key"));
    }

    #[tokio::test]
    async fn test_no_files_is_a_validation_error() {
        let err = run(session(true, Ok(vec![])), vec![], OutputFormat::Table, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please select at least one bank statement image.");
    }

    #[tokio::test]
    async fn test_invalid_key_message() {
        let err = run(
            session(true, Err(ExtractionError::service("400: API key not valid. Please pass a valid API key."))),
            vec![PathBuf::from("p1.png")],
            OutputFormat::Json,
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Your API key appears to be invalid. Please select a valid API key to continue."
        );
    }
}
