//! File I/O for conversion inputs and outputs

use crate::types::*;
use std::path::Path;

/// Read a PDF file into memory
pub async fn read_pdf(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    Ok(tokio::fs::read(path).await?)
}

/// Write converted PDF bytes to a file
pub async fn write_pdf(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
