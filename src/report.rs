use std::path::Path;
use crate::actors::RunSummary;
use crate::error::{OfficeError, Result};
use crate::metrics::Metrics;

// ============================================================================
// Run Report - JSON summary and metrics snapshot written after a run
// ============================================================================

pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    write_file(path, json)?;
    tracing::info!(path = %path.display(), "Run report written");
    Ok(())
}

pub fn write_metrics(path: &Path, metrics: &Metrics) -> Result<()> {
    let text = metrics.render()?;
    write_file(path, text)?;
    tracing::info!(path = %path.display(), "Metrics written");
    Ok(())
}

fn write_file(path: &Path, contents: String) -> Result<()> {
    std::fs::write(path, contents).map_err(|source| OfficeError::Output {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::OfficeCoordinator;
    use crate::config::OfficeConfig;
    use crate::transcript::Transcript;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_report_and_metrics_files() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("report.json");
        let metrics_path = dir.path().join("metrics.txt");

        let config = OfficeConfig::new(5, 2, 10, 5, 50).unwrap().with_seed(11);
        let coordinator =
            OfficeCoordinator::new(config.clone(), Arc::new(Transcript::in_memory())).unwrap();
        let metrics = coordinator.metrics().clone();
        let summary = coordinator.run().await.unwrap();

        write_summary(&report_path, &summary).unwrap();
        write_metrics(&metrics_path, &metrics).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(json["config"]["customers"], 5);
        assert_eq!(json["config"]["seed"], 11);
        assert_eq!(json["transcript_lines"], summary.transcript_lines);
        assert_eq!(json["final_queue_lengths"], serde_json::json!([0, 0, 0]));

        let parsed: RunSummary =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(parsed.run_id, summary.run_id);
        assert_eq!(parsed.config, config);

        let text = std::fs::read_to_string(&metrics_path).unwrap();
        assert!(text.contains("post_office_customers_admitted_total"));
        assert!(text.contains("post_office_worker_breaks_total"));
    }

    #[test]
    fn test_unwritable_path_is_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("metrics.txt");
        let metrics = Metrics::new().unwrap();

        let err = write_metrics(&path, &metrics).unwrap_err();
        assert!(matches!(err, OfficeError::Output { .. }));
    }
}
