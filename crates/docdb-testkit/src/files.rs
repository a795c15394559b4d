//! Scratch files filled with random bytes.

use std::path::{Path, PathBuf};

use rand::RngCore;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::Result;

const CHUNK_SIZE: usize = 1024 * 1024;

/// Write `size` random bytes to a new `.bin` file in the temp dir and return its path.
pub async fn create_random_binary_file_in_tmp(size: u64) -> Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("{}.bin", uuid::Uuid::new_v4()));
    create_file_with_random_bytes(&path, size).await?;
    Ok(path)
}

/// Fails if `path` already exists.
pub async fn create_file_with_random_bytes(path: &Path, size: u64) -> Result<()> {
    debug!(path = %path.display(), size, "creating random file");
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut remaining = size;
    while remaining > 0 {
        let len = remaining.min(CHUNK_SIZE as u64) as usize;
        rand::thread_rng().fill_bytes(&mut buffer[..len]);
        file.write_all(&buffer[..len]).await?;
        remaining -= len as u64;
    }
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_exact_size_across_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        let size = CHUNK_SIZE as u64 + 17;
        create_file_with_random_bytes(&path, size).await.unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), size);
    }

    #[tokio::test]
    async fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, b"x").unwrap();
        assert!(create_file_with_random_bytes(&path, 4).await.is_err());
    }

    #[tokio::test]
    async fn tmp_file_has_bin_extension() {
        let path = create_random_binary_file_in_tmp(0).await.unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("bin"));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
        std::fs::remove_file(path).unwrap();
    }
}
