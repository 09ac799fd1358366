// Report process adapter - Runs the external PDF report generator

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::ports::*;

/// Report generator invoked as `<command...> <work_dir> <video_result_id> <output_dir>`
pub struct ProcessReportGenerator {
    program: String,
    args: Vec<String>,
}

impl ProcessReportGenerator {
    /// Create from a whitespace-separated command line
    pub fn new(command_line: &str) -> Result<Self, DomainError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| DomainError::Config("report_command is empty".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Path the generator reported on its last stdout line, if it exists
    fn reported_path(stdout: &str) -> Option<PathBuf> {
        stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(PathBuf::from)
            .filter(|path| path.is_file())
    }
}

#[async_trait]
impl ReportGeneratorPort for ProcessReportGenerator {
    async fn generate(
        &self,
        work_dir: &Path,
        video_result_id: i64,
        output_dir: &Path,
    ) -> Result<PathBuf, DomainError> {
        debug!(program = %self.program, args = ?self.args, "Starting report generator");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(work_dir)
            .arg(video_result_id.to_string())
            .arg(output_dir)
            .output()
            .await
            .map_err(|e| DomainError::Report(format!("Failed to start {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(DomainError::Report(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let pdf = Self::reported_path(&stdout)
            .unwrap_or_else(|| output_dir.join(format!("{}.pdf", video_result_id)));
        if !pdf.is_file() {
            return Err(DomainError::Report(format!(
                "Report generator did not produce {}",
                pdf.display()
            )));
        }

        info!(path = %pdf.display(), "Report generated");
        Ok(pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_command_is_rejected() {
        assert!(matches!(
            ProcessReportGenerator::new("   "),
            Err(DomainError::Config(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_generator_output_is_located() {
        let dir = TempDir::new().unwrap();
        let script = "touch \"$3/$2.pdf\"";
        let generator = ProcessReportGenerator {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "report".to_string()],
        };

        let pdf = generator.generate(dir.path(), 42, dir.path()).await.unwrap();
        assert_eq!(pdf, dir.path().join("42.pdf"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_generator_is_a_report_error() {
        let dir = TempDir::new().unwrap();
        let generator = ProcessReportGenerator::new("false").unwrap();
        let err = generator.generate(dir.path(), 1, dir.path()).await.unwrap_err();
        assert!(matches!(err, DomainError::Report(_)));
    }
}
