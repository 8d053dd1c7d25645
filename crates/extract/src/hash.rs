use std::fs::File;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of a statement file, recorded in the run summary so
/// a ledger can be traced back to the exact document it came from.
pub fn source_digest(path: &Path) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut File::open(path)?, &mut hasher)?;
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_statement_has_the_empty_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(
            source_digest(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn reissued_statement_gets_a_new_digest() {
        let dir = tempfile::tempdir().unwrap();
        let march = dir.path().join("march.pdf");
        let reissued = dir.path().join("march-reissued.pdf");
        std::fs::write(&march, b"15/03/2024 COFFEE 3,50").unwrap();
        std::fs::write(&reissued, b"15/03/2024 COFFEE 3,80").unwrap();

        let a = source_digest(&march).unwrap();
        assert_eq!(a.len(), 64);
        assert!(a.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        assert_ne!(a, source_digest(&reissued).unwrap());
    }

    #[test]
    fn unreadable_statement_is_io_error() {
        assert!(source_digest(Path::new("/definitely/not/here.pdf")).is_err());
    }
}
