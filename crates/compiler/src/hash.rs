//! Streaming file digests for client display of placed artifacts.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use md5::Md5;
use pawnforge_core::{Error, Result};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};

const CHUNK_SIZE: usize = 8192;

/// Digest algorithms offered to clients. The historical default is md5.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            other => Err(Error::configuration(format!(
                "unsupported hash algorithm: '{other}'"
            ))),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        };
        f.write_str(name)
    }
}

/// Hex digest of a file's contents, streamed in chunks rather than loaded
/// whole.
pub async fn file_hash(path: &Path, algorithm: HashAlgorithm) -> Result<String> {
    match algorithm {
        HashAlgorithm::Md5 => digest_stream::<Md5>(path).await,
        HashAlgorithm::Sha1 => digest_stream::<Sha1>(path).await,
        HashAlgorithm::Sha256 => digest_stream::<Sha256>(path).await,
        HashAlgorithm::Sha512 => digest_stream::<Sha512>(path).await,
    }
}

async fn digest_stream<D: Digest>(path: &Path) -> Result<String> {
    let file = File::open(path)
        .await
        .map_err(|e| Error::file_system(path.to_path_buf(), "open file for hashing", e))?;
    let mut reader = BufReader::with_capacity(CHUNK_SIZE, file);
    let mut hasher = D::new();
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let n = reader
            .read(&mut buf)
            .await
            .map_err(|e| Error::file_system(path.to_path_buf(), "read file chunk for hashing", e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn known_vectors_for_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();

        assert_eq!(
            file_hash(&path, HashAlgorithm::Md5).await.unwrap(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            file_hash(&path, HashAlgorithm::Sha256).await.unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn same_file_hashes_identically_twice() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifact.amxx");
        std::fs::write(&path, b"compiled bytes").unwrap();

        let first = file_hash(&path, HashAlgorithm::Sha256).await.unwrap();
        let second = file_hash(&path, HashAlgorithm::Sha256).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn algorithms_disagree_on_the_same_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifact.amxx");
        std::fs::write(&path, b"compiled bytes").unwrap();

        let md5 = file_hash(&path, HashAlgorithm::Md5).await.unwrap();
        let sha1 = file_hash(&path, HashAlgorithm::Sha1).await.unwrap();
        assert_ne!(md5, sha1);
        assert_eq!(md5.len(), 32);
        assert_eq!(sha1.len(), 40);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let result = file_hash(Path::new("/nonexistent/file"), HashAlgorithm::Md5).await;
        assert!(result.is_err());
    }

    #[test]
    fn algorithm_parses_case_insensitively() {
        assert_eq!("MD5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
        assert_eq!(
            "sha512".parse::<HashAlgorithm>().unwrap(),
            HashAlgorithm::Sha512
        );
        assert!("crc32".parse::<HashAlgorithm>().is_err());
    }
}
