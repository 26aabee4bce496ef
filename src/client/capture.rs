//! Artifact writing for screenshots and PDFs.

use std::path::Path;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::Result;

// ============================================================================
// Artifact Writing
// ============================================================================

/// Writes `bytes` to `path`, creating it with permission bits `mode`.
///
/// The mode only applies on Unix and only when the file is created.
pub async fn write_artifact(path: &Path, bytes: &[u8], mode: u32) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    options.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;

    debug!(path = %path.display(), bytes = bytes.len(), "Artifact written");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
