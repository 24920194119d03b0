//! Fixed file-naming conventions for the transcript directory (§6.3).

use std::path::{Path, PathBuf};

use crate::byte_tree::ByteTree;
use crate::error::CoreResult;

pub fn active_threshold_path(dir: &Path) -> PathBuf {
    dir.join("ActiveThreshold")
}

pub fn ciphertexts_path(dir: &Path) -> PathBuf {
    dir.join("Ciphertexts")
}

pub fn correct_indices_path(dir: &Path) -> PathBuf {
    dir.join("CorrectIndices.bt")
}

pub fn decryption_factors_path(dir: &Path, party: usize) -> PathBuf {
    dir.join(format!("DecryptionFactors{party:02}.bt"))
}

pub fn commitment_path(dir: &Path, party: usize) -> PathBuf {
    dir.join(format!("DecrFactCommitment{party:02}.bt"))
}

pub fn reply_path(dir: &Path, party: usize) -> PathBuf {
    dir.join(format!("DecrFactReply{party:02}.bt"))
}

pub fn polynomial_in_exponent_path(dir: &Path) -> PathBuf {
    dir.join("PolynomialInExponent.bt")
}

pub fn full_public_key_path(dir: &Path) -> PathBuf {
    dir.join("FullPublicKey.bt")
}

/// Write `ActiveThreshold` as the 4-byte big-endian integer §6.3 specifies
/// (the one file in the layout that is not byte-tree encoded).
pub fn write_active_threshold(dir: &Path, threshold: u32) -> CoreResult<()> {
    std::fs::write(active_threshold_path(dir), threshold.to_be_bytes())?;
    Ok(())
}

pub fn write_tree(path: &Path, tree: &ByteTree) -> CoreResult<()> {
    tree.write_to_file(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_match_layout() {
        let dir = PathBuf::from("/tmp/example-sid");
        assert_eq!(decryption_factors_path(&dir, 3).file_name().unwrap(), "DecryptionFactors03.bt");
        assert_eq!(commitment_path(&dir, 12).file_name().unwrap(), "DecrFactCommitment12.bt");
        assert_eq!(reply_path(&dir, 1).file_name().unwrap(), "DecrFactReply01.bt");
    }

    #[test]
    fn writes_and_reads_back_a_tree() {
        let dir = std::env::temp_dir().join(format!("transcript-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let tree = ByteTree::leaf(vec![1, 2, 3]);
        let path = correct_indices_path(&dir);
        write_tree(&path, &tree).unwrap();
        let back = ByteTree::read_from_file(&path).unwrap().unwrap();
        assert_eq!(back, tree);
        std::fs::remove_dir_all(&dir).ok();
    }
}
