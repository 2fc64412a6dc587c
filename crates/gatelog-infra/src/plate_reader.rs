//! License plate OCR through an external command.
//!
//! The command line is split with shell rules, the image is written to a
//! temporary file whose path is appended as the last argument, and the
//! plate text is read from stdout.

use std::io::Write;

use log::{debug, warn};
use tokio::process::Command;

use gatelog_domain::repository::PlateReader;
use gatelog_types::{Error, Result};

/// Reply of a reader that saw no readable plate
const UNKNOWN_MARKER: &str = "UNKNOWN";

/// Plate reader backed by an external OCR command
#[derive(Debug, Clone, Default)]
pub struct CommandPlateReader {
    command: Option<String>,
}

impl CommandPlateReader {
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }

    pub fn is_configured(&self) -> bool {
        self.command
            .as_deref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Reader stdout to plate text; `UNKNOWN` and blank output mean no plate
pub fn parse_reader_output(stdout: &str) -> String {
    let text = stdout.trim();
    if text == UNKNOWN_MARKER {
        String::new()
    } else {
        text.to_string()
    }
}

impl PlateReader for CommandPlateReader {
    async fn recognize_plate(&self, image: &[u8]) -> Result<String> {
        let cmd_str = match self.command.as_deref() {
            Some(cmd) if !cmd.trim().is_empty() => cmd,
            _ => {
                warn!("event=plate_reader_skipped reason=not_configured");
                return Ok(String::new());
            }
        };

        let mut parts = shell_words::split(cmd_str)
            .map_err(|e| Error::OcrFailed(format!("invalid plate reader command: {}", e)))?;
        if parts.is_empty() {
            return Err(Error::OcrFailed("plate reader command is empty".to_string()));
        }
        let program = parts.remove(0);

        let mut image_file = tempfile::Builder::new()
            .prefix("gatelog_plate_")
            .suffix(".jpg")
            .tempfile()
            .map_err(|e| Error::OcrFailed(format!("cannot stage image: {}", e)))?;
        image_file
            .write_all(image)
            .and_then(|_| image_file.flush())
            .map_err(|e| Error::OcrFailed(format!("cannot stage image: {}", e)))?;

        debug!(
            "event=plate_reader_run program={} image={}",
            program,
            image_file.path().display()
        );

        let output = Command::new(&program)
            .args(&parts)
            .arg(image_file.path())
            .output()
            .await
            .map_err(|e| Error::OcrFailed(format!("failed to run {}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::OcrFailed(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }

        let plate = parse_reader_output(&String::from_utf8_lossy(&output.stdout));
        debug!("event=plate_reader_done detected={}", !plate.is_empty());
        Ok(plate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reader_output() {
        assert_eq!(parse_reader_output("  1กข 1234 กรุงเทพมหานคร\n"), "1กข 1234 กรุงเทพมหานคร");
        assert_eq!(parse_reader_output("UNKNOWN\n"), "");
        assert_eq!(parse_reader_output("   "), "");
    }

    #[tokio::test]
    async fn test_unconfigured_reader_detects_nothing() {
        let reader = CommandPlateReader::new(None);
        assert!(!reader.is_configured());
        assert_eq!(reader.recognize_plate(b"img").await.unwrap(), "");

        let blank = CommandPlateReader::new(Some("   ".to_string()));
        assert_eq!(blank.recognize_plate(b"img").await.unwrap(), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reads_plate_from_stdout() {
        // `cat` echoes the staged image back, standing in for an OCR tool
        let reader = CommandPlateReader::new(Some("cat".to_string()));
        let plate = reader.recognize_plate("1กก 9999\n".as_bytes()).await.unwrap();
        assert_eq!(plate, "1กก 9999");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_ocr_error() {
        let reader = CommandPlateReader::new(Some("false".to_string()));
        let err = reader.recognize_plate(b"img").await.unwrap_err();
        assert!(matches!(err, Error::OcrFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_program_is_ocr_error() {
        let reader = CommandPlateReader::new(Some("gatelog-no-such-ocr-tool --fast".to_string()));
        let err = reader.recognize_plate(b"img").await.unwrap_err();
        assert!(matches!(err, Error::OcrFailed(_)));
    }

    #[tokio::test]
    async fn test_unbalanced_quotes_rejected() {
        let reader = CommandPlateReader::new(Some("ocr 'unterminated".to_string()));
        let err = reader.recognize_plate(b"img").await.unwrap_err();
        assert!(matches!(err, Error::OcrFailed(_)));
    }
}
