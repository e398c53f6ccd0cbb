use ledgerscan_core::{ExtractionError, Extractor, RunId, StagedFile, Transaction};
use std::sync::Arc;
use std::sync::mpsc::Sender;

#[derive(Debug)]
pub struct ExtractionDone {
    pub run: RunId,
    pub outcome: Result<Vec<Transaction>, ExtractionError>,
}

/// Run one extraction on the runtime and report back over `tx`.
///
/// No cancellation: the task runs until the service answers. The UI loop is
/// expected to have made the trigger inert for the duration.
pub fn spawn_extraction(
    handle: &tokio::runtime::Handle,
    extractor: Arc<dyn Extractor>,
    run: RunId,
    files: Vec<StagedFile>,
    tx: Sender<ExtractionDone>,
) {
    handle.spawn(async move {
        let outcome = extractor.extract(&files).await;
        // receiver gone means the UI already exited
        let _ = tx.send(ExtractionDone { run, outcome });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Echo;

    #[async_trait]
    impl Extractor for Echo {
        async fn extract(&self, files: &[StagedFile]) -> Result<Vec<Transaction>, ExtractionError> {
            Ok(files
                .iter()
                .map(|f| Transaction {
                    date: String::new(),
                    particulars: f.display_name(),
                    payments: None,
                    receipts: None,
                    balance: "0".to_string(),
                })
                .collect())
        }
    }

    #[test]
    fn test_result_arrives_with_run_id() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (tx, rx) = std::sync::mpsc::channel();

        spawn_extraction(
            rt.handle(),
            Arc::new(Echo),
            7,
            vec![StagedFile::new("a.png")],
            tx,
        );

        let done = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(done.run, 7);
        assert_eq!(done.outcome.unwrap()[0].particulars, "a.png");
    }
}
