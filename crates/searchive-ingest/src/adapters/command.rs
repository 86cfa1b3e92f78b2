//! Shared helpers for adapters that shell out to conversion tools.

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::process::Command;

use searchive_core::{Error, Result};

/// Run `cmd` under `timeout`, returning stdout. Non-zero exit, spawn failure
/// and timeout all become `Error::Extraction`; the child is killed on timeout.
pub(crate) async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Vec<u8>> {
    cmd.kill_on_drop(true);
    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| {
            Error::Extraction(format!(
                "External command timed out after {}s",
                timeout.as_secs()
            ))
        })?
        .map_err(|e| Error::Extraction(format!("Failed to execute command: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Extraction(format!(
            "Command failed ({}): {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(output.stdout)
}

/// Write `data` to a named temp file with `suffix` (e.g. ".docx").
pub(crate) fn write_temp(data: &[u8], suffix: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("searchive-")
        .suffix(suffix)
        .tempfile()
        .map_err(|e| Error::Extraction(format!("Failed to create temp file: {}", e)))?;
    file.write_all(data)
        .map_err(|e| Error::Extraction(format!("Failed to write temp file: {}", e)))?;
    Ok(file)
}

/// True if `program` runs and exits with one of `ok_codes`.
pub(crate) async fn tool_available(program: &str, arg: &str, ok_codes: &[i32]) -> bool {
    match Command::new(program).arg(arg).output().await {
        Ok(output) => output
            .status
            .code()
            .map(|c| ok_codes.contains(&c))
            .unwrap_or(false),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_extraction_error() {
        let err = run_with_timeout(
            &mut Command::new("searchive-no-such-tool"),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[tokio::test]
    async fn test_tool_available_false_for_missing_program() {
        assert!(!tool_available("searchive-no-such-tool", "--version", &[0]).await);
    }

    #[test]
    fn test_write_temp_keeps_suffix() {
        let file = write_temp(b"abc", ".docx").unwrap();
        assert!(file.path().to_string_lossy().ends_with(".docx"));
        assert_eq!(std::fs::read(file.path()).unwrap(), b"abc");
    }
}
