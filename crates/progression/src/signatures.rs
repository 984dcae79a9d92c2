//! One-hot chord vocabulary: every distinct chroma signature in a pool gets
//! an index.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chroma_theory::ChromaVector;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::frame::FrameMatrix;
use crate::{Error, Result};

#[derive(Serialize, Deserialize)]
struct SignatureFile {
    signatures: Vec<ChromaVector>,
}

/// Distinct chroma signatures in first-seen order, with the inverse map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureTable {
    signatures: Vec<ChromaVector>,
    index: HashMap<ChromaVector, usize>,
}

impl SignatureTable {
    /// Collect the distinct signatures of every frame in the pool.
    pub fn build(pool: &[FrameMatrix]) -> Self {
        let chroma = pool.iter().flat_map(|m| m.chroma_frames());
        Self::from_signatures(chroma)
    }

    /// Table over the given signatures; repeats keep their first index.
    pub fn from_signatures(signatures: impl IntoIterator<Item = ChromaVector>) -> Self {
        let mut table = Self::default();
        for chroma in signatures {
            if !table.index.contains_key(&chroma) {
                table.index.insert(chroma, table.signatures.len());
                table.signatures.push(chroma);
            }
        }
        table
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn signatures(&self) -> &[ChromaVector] {
        &self.signatures
    }

    pub fn index_of(&self, chroma: ChromaVector) -> Result<usize> {
        self.index
            .get(&chroma)
            .copied()
            .ok_or(Error::UnknownSignature(chroma))
    }

    pub fn signature(&self, index: usize) -> Result<ChromaVector> {
        self.signatures
            .get(index)
            .copied()
            .ok_or(Error::SignatureIndex {
                index,
                len: self.signatures.len(),
            })
    }

    /// One-hot index of every frame.
    pub fn encode(&self, matrix: &FrameMatrix) -> Result<Vec<usize>> {
        matrix
            .chroma_frames()
            .into_iter()
            .map(|c| self.index_of(c))
            .collect()
    }

    /// Chroma frames back from one-hot indices.
    pub fn decode(&self, indices: &[usize]) -> Result<FrameMatrix> {
        let chroma = indices
            .iter()
            .map(|&i| self.signature(i))
            .collect::<Result<Vec<_>>>()?;
        Ok(FrameMatrix::from_chroma(&chroma))
    }

    pub fn to_json(&self) -> Result<String> {
        let file = SignatureFile {
            signatures: self.signatures.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: SignatureFile = serde_json::from_str(json)?;
        Ok(Self::from_signatures(file.signatures))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json(&json)?;
        info!(path = %path.display(), signatures = table.len(), "loaded signature table");
        Ok(table)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), signatures = self.len(), "saved signature table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chroma(pcs: &[u8]) -> ChromaVector {
        ChromaVector::from_pitch_classes(pcs)
    }

    fn pool() -> Vec<FrameMatrix> {
        vec![
            FrameMatrix::from_chroma(&[chroma(&[0, 4, 7]), chroma(&[0, 4, 7]), chroma(&[5, 9, 0])]),
            FrameMatrix::from_chroma(&[chroma(&[]), chroma(&[5, 9, 0])]),
        ]
    }

    #[test]
    fn first_seen_order() {
        let table = SignatureTable::build(&pool());
        assert_eq!(
            table.signatures(),
            &[chroma(&[0, 4, 7]), chroma(&[0, 5, 9]), ChromaVector::EMPTY]
        );
        assert_eq!(table.index_of(ChromaVector::EMPTY).unwrap(), 2);
    }

    #[test]
    fn encode_decode() {
        let pool = pool();
        let table = SignatureTable::build(&pool);
        let indices = table.encode(&pool[0]).unwrap();
        assert_eq!(indices, vec![0, 0, 1]);
        assert_eq!(table.decode(&indices).unwrap(), pool[0]);
    }

    #[test]
    fn unknown_lookups_fail() {
        let table = SignatureTable::build(&pool());
        assert!(matches!(
            table.index_of(chroma(&[1, 2])),
            Err(Error::UnknownSignature(_))
        ));
        assert!(matches!(
            table.decode(&[0, 7]),
            Err(Error::SignatureIndex { index: 7, len: 3 })
        ));
    }

    #[test]
    fn json_layout() {
        let table = SignatureTable::from_signatures([chroma(&[0, 4, 7])]);
        let value: serde_json::Value = serde_json::from_str(&table.to_json().unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({ "signatures": ["100010010000"] }));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signatures.json");
        let table = SignatureTable::build(&pool());
        table.save(&path).unwrap();

        let loaded = SignatureTable::load(&path).unwrap();
        assert_eq!(loaded, table);
        assert_eq!(loaded.index_of(chroma(&[5, 9, 0])).unwrap(), 1);
    }

    #[test]
    fn load_missing_file() {
        let err = SignatureTable::load(Path::new("/nonexistent/signatures.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
