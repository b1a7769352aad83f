//! Checksums for downloaded archives
//!
//! Indexes publish checksums as `algorithm:hex`. `SHA-256` (any case, with
//! or without the dash) and `blake3` are understood.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Hash algorithms an index may name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha256,
    Blake3,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => f.write_str("SHA-256"),
            Self::Blake3 => f.write_str("blake3"),
        }
    }
}

/// Parsed `algorithm:hex` checksum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    pub algorithm: Algorithm,
    /// Lowercase hex digest
    pub digest: String,
}

impl Checksum {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (algorithm, digest) = raw
            .split_once(':')
            .ok_or_else(|| format!("invalid checksum '{raw}': expected 'algorithm:hex'"))?;

        let algorithm = match algorithm.to_ascii_lowercase().as_str() {
            "sha-256" | "sha256" => Algorithm::Sha256,
            "blake3" => Algorithm::Blake3,
            other => return Err(format!("unsupported checksum algorithm '{other}'")),
        };

        let digest = digest.trim().to_ascii_lowercase();
        if digest.is_empty() || hex::decode(&digest).is_err() {
            return Err(format!("invalid checksum '{raw}': digest is not hex"));
        }
        Ok(Self { algorithm, digest })
    }

    /// Compare against the digest of the file at `path`
    pub fn matches_file(&self, path: &Path) -> io::Result<bool> {
        Ok(hash_file(path, self.algorithm)? == self.digest)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.digest)
    }
}

/// Hex digest of a file's contents
pub fn hash_file(path: &Path, algorithm: Algorithm) -> io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buffer = [0u8; 8192];
    let mut sha = Sha256::new();
    let mut blake = blake3::Hasher::new();

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        match algorithm {
            Algorithm::Sha256 => sha.update(&buffer[..bytes_read]),
            Algorithm::Blake3 => {
                blake.update(&buffer[..bytes_read]);
            }
        }
    }

    Ok(match algorithm {
        Algorithm::Sha256 => hex::encode(sha.finalize()),
        Algorithm::Blake3 => blake.finalize().to_hex().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // sha256("test content")
    const TEST_SHA256: &str = "6ae8a75555209fd6c44157c0aed8016e763ff435a19cf186f76863140143ff72";

    #[test]
    fn test_parse_algorithms() {
        let sha = Checksum::parse(&format!("SHA-256:{}", TEST_SHA256.to_uppercase())).unwrap();
        assert_eq!(sha.algorithm, Algorithm::Sha256);
        assert_eq!(sha.digest, TEST_SHA256);
        assert_eq!(sha.to_string(), format!("SHA-256:{TEST_SHA256}"));

        assert_eq!(
            Checksum::parse("sha256:00ff").unwrap().algorithm,
            Algorithm::Sha256
        );
        assert_eq!(
            Checksum::parse("blake3:00ff").unwrap().algorithm,
            Algorithm::Blake3
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Checksum::parse("00ff").is_err());
        assert!(Checksum::parse("md5:00ff").unwrap_err().contains("md5"));
        assert!(Checksum::parse("sha256:xyz").is_err());
        assert!(Checksum::parse("sha256:").is_err());
    }

    #[test]
    fn test_hash_file_sha256() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.txt");
        std::fs::write(&path, "test content").unwrap();

        assert_eq!(hash_file(&path, Algorithm::Sha256).unwrap(), TEST_SHA256);
        let checksum = Checksum::parse(&format!("sha256:{TEST_SHA256}")).unwrap();
        assert!(checksum.matches_file(&path).unwrap());
    }

    #[test]
    fn test_hash_file_blake3() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.txt");
        std::fs::write(&path, "test content").unwrap();

        let expected = blake3::hash(b"test content").to_hex().to_string();
        assert_eq!(hash_file(&path, Algorithm::Blake3).unwrap(), expected);

        let other = Checksum::parse(&format!("blake3:{}", blake3::hash(b"x").to_hex())).unwrap();
        assert!(!other.matches_file(&path).unwrap());
    }

    #[test]
    fn test_hash_file_not_found() {
        assert!(hash_file(Path::new("/nonexistent/file.txt"), Algorithm::Sha256).is_err());
    }
}
