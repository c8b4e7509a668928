//! First-page rendering.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::ThumbnailConfig;
use super::error::RasterizeError;
use super::types::ThumbnailSpec;

/// Renders the first page of a PDF to a JPEG image.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Returns the name of this rasterizer implementation.
    fn name(&self) -> &str;

    /// Render page one of `pdf`, returning the encoded JPEG bytes.
    async fn render_first_page(
        &self,
        pdf: &Path,
        spec: &ThumbnailSpec,
    ) -> Result<Vec<u8>, RasterizeError>;

    /// Check that the rasterizer is usable.
    async fn validate(&self) -> Result<(), RasterizeError>;
}

/// Rasterizer backed by poppler's `pdftoppm`.
pub struct PdftoppmRasterizer {
    path: PathBuf,
    timeout_secs: u64,
}

impl PdftoppmRasterizer {
    pub fn new(config: &ThumbnailConfig) -> Self {
        Self {
            path: config.rasterizer_path.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    /// Creates a rasterizer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(&ThumbnailConfig::default())
    }

    /// Builds pdftoppm arguments. `-singlefile` makes the output `<prefix>.jpg`.
    fn build_args(&self, pdf: &Path, output_prefix: &Path, spec: &ThumbnailSpec) -> Vec<String> {
        vec![
            "-f".to_string(),
            "1".to_string(),
            "-l".to_string(),
            "1".to_string(),
            "-singlefile".to_string(),
            "-jpeg".to_string(),
            "-jpegopt".to_string(),
            format!("quality={}", spec.quality),
            "-scale-to-x".to_string(),
            spec.width.to_string(),
            "-scale-to-y".to_string(),
            spec.height.to_string(),
            pdf.to_string_lossy().to_string(),
            output_prefix.to_string_lossy().to_string(),
        ]
    }

    fn not_found_or_io(&self, e: std::io::Error) -> RasterizeError {
        if e.kind() == std::io::ErrorKind::NotFound {
            RasterizeError::BinaryNotFound {
                path: self.path.clone(),
            }
        } else {
            RasterizeError::Io(e)
        }
    }
}

#[async_trait]
impl Rasterizer for PdftoppmRasterizer {
    fn name(&self) -> &str {
        "pdftoppm"
    }

    async fn render_first_page(
        &self,
        pdf: &Path,
        spec: &ThumbnailSpec,
    ) -> Result<Vec<u8>, RasterizeError> {
        if !pdf.is_file() {
            return Err(RasterizeError::InputNotFound {
                path: pdf.to_path_buf(),
            });
        }

        let output_prefix = pdf.with_extension("cover");
        let output = output_prefix.with_extension("cover.jpg");
        let args = self.build_args(pdf, &output_prefix, spec);
        debug!("Running {} {:?}", self.path.display(), args);

        let run = Command::new(&self.path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let result = match timeout(Duration::from_secs(self.timeout_secs), run).await {
            Ok(result) => result.map_err(|e| self.not_found_or_io(e))?,
            Err(_) => {
                let _ = fs::remove_file(&output).await;
                return Err(RasterizeError::Timeout {
                    timeout_secs: self.timeout_secs,
                });
            }
        };

        if !result.status.success() {
            let _ = fs::remove_file(&output).await;
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            return Err(RasterizeError::Failed {
                code: result.status.code(),
                stderr: (!stderr.is_empty()).then_some(stderr),
            });
        }

        let bytes = match fs::read(&output).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RasterizeError::OutputMissing { path: output })
            }
            Err(e) => return Err(RasterizeError::Io(e)),
        };
        let _ = fs::remove_file(&output).await;

        if bytes.is_empty() {
            return Err(RasterizeError::OutputMissing { path: output });
        }
        Ok(bytes)
    }

    async fn validate(&self) -> Result<(), RasterizeError> {
        Command::new(&self.path)
            .arg("-v")
            .output()
            .await
            .map_err(|e| self.not_found_or_io(e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spec() -> ThumbnailSpec {
        ThumbnailSpec {
            width: 400,
            height: 600,
            quality: 85,
        }
    }

    fn rasterizer(path: &str) -> PdftoppmRasterizer {
        PdftoppmRasterizer::new(&ThumbnailConfig {
            rasterizer_path: PathBuf::from(path),
            ..Default::default()
        })
    }

    #[test]
    fn test_build_args() {
        let args = PdftoppmRasterizer::with_defaults().build_args(
            Path::new("/tmp/in.pdf"),
            Path::new("/tmp/in.cover"),
            &spec(),
        );
        assert_eq!(
            args,
            vec![
                "-f", "1", "-l", "1", "-singlefile", "-jpeg", "-jpegopt", "quality=85",
                "-scale-to-x", "400", "-scale-to-y", "600", "/tmp/in.pdf", "/tmp/in.cover",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_input() {
        let result = PdftoppmRasterizer::with_defaults()
            .render_first_page(Path::new("/nonexistent/in.pdf"), &spec())
            .await;
        assert!(matches!(result, Err(RasterizeError::InputNotFound { .. })));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let temp = TempDir::new().unwrap();
        let pdf = temp.path().join("in.pdf");
        std::fs::write(&pdf, "%PDF-1.7").unwrap();

        let rasterizer = rasterizer("libris-no-such-pdftoppm");
        let result = rasterizer.render_first_page(&pdf, &spec()).await;
        assert!(matches!(result, Err(RasterizeError::BinaryNotFound { .. })));
        assert!(matches!(
            rasterizer.validate().await,
            Err(RasterizeError::BinaryNotFound { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_binary() {
        let temp = TempDir::new().unwrap();
        let pdf = temp.path().join("in.pdf");
        std::fs::write(&pdf, "%PDF-1.7").unwrap();

        let result = rasterizer("false").render_first_page(&pdf, &spec()).await;
        assert!(matches!(
            result,
            Err(RasterizeError::Failed { code: Some(1), .. })
        ));
    }
}
