use crate::{
    errors::EnrichError,
    providers::{OcrBackend, OcrOptions},
};
use async_trait::async_trait;
use image::{GrayImage, ImageFormat};
use std::io::Cursor;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// Runs the `tesseract` executable as a child process.
///
/// The page is piped in as PNG on stdin and the text is read from stdout, so
/// nothing touches the filesystem.
#[derive(Clone, Debug)]
pub struct TesseractProvider {
    binary: String,
}

impl TesseractProvider {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Checks that the executable can be spawned and reports its version.
    pub async fn probe(&self) -> Result<String, EnrichError> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await?;
        if !output.status.success() {
            return Err(EnrichError::OcrBackend(format!(
                "'{} --version' exited with {}",
                self.binary, output.status
            )));
        }
        // Older releases print the version on stderr.
        let banner = if output.stdout.is_empty() {
            &output.stderr
        } else {
            &output.stdout
        };
        let version = String::from_utf8_lossy(banner)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        info!("Found OCR backend: {version}");
        Ok(version)
    }
}

#[async_trait]
impl OcrBackend for TesseractProvider {
    async fn recognize(
        &self,
        image: &GrayImage,
        options: &OcrOptions,
    ) -> Result<String, EnrichError> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        debug!(lang = %options.lang, psm = options.psm, "--> Running tesseract");

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "--psm"])
            .arg(options.psm.to_string())
            .args(["-l", &options.lang])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&png).await?;
            // Dropping stdin closes the pipe so tesseract sees EOF.
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EnrichError::OcrBackend(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
