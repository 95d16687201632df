//! External DOCX to PDF conversion
//!
//! The extender only needs "a PDF appears at this path"; how it gets there
//! is behind [`DocxConverter`]. The shipped implementation shells out to
//! LibreOffice in headless mode, one synchronous call per document, no
//! retries.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Converts one DOCX file into a PDF at a caller-chosen path.
pub trait DocxConverter {
    fn convert(&self, source: &Path, dest: &Path) -> Result<()>;
}

/// [`DocxConverter`] backed by LibreOffice (`soffice --headless`).
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    executable: PathBuf,
}

impl SofficeConverter {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl Default for SofficeConverter {
    fn default() -> Self {
        Self::new("soffice")
    }
}

impl DocxConverter for SofficeConverter {
    fn convert(&self, source: &Path, dest: &Path) -> Result<()> {
        if !source.exists() {
            return Err(Error::FileNotFound(source.to_path_buf()));
        }
        let out_dir = dest.parent().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "destination has no parent directory: {}",
                dest.display()
            ))
        })?;

        debug!(
            source = %source.display(),
            dest = %dest.display(),
            "converting DOCX with soffice"
        );

        let output = Command::new(&self.executable)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| {
                Error::DocxConversion(format!(
                    "failed to launch {}: {err}",
                    self.executable.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, "soffice conversion failed");
            return Err(Error::DocxConversion(format!(
                "{} exited with {}: {}",
                self.executable.display(),
                output.status,
                stderr.trim()
            )));
        }

        // soffice names its output after the source stem; move it into
        // place when that differs from the requested destination.
        let mut produced_name = source.file_stem().unwrap_or_default().to_os_string();
        produced_name.push(".pdf");
        let produced = out_dir.join(&produced_name);
        if !produced.exists() {
            return Err(Error::DocxConversion(format!(
                "no PDF produced for {}",
                source.display()
            )));
        }
        if produced != dest {
            std::fs::rename(&produced, dest)?;
        }

        Ok(())
    }
}
