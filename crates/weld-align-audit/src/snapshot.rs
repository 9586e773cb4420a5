use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use weld_align_core::Vector3;

use crate::{AlignmentQuality, IntrinsicsHash};

/// Audit format version written into every snapshot.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("intrinsicsHash must not be blank")]
    BlankIntrinsicsHash,
    #[error("unsupported snapshot schemaVersion {found} (expected 1)")]
    UnsupportedSchemaVersion { found: u32 },
}

#[derive(thiserror::Error, Debug)]
pub enum SnapshotIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] SnapshotError),
}

/// Immutable audit record of an accepted alignment.
///
/// Serialized field names (`schemaVersion`, `intrinsicsHash`,
/// `reprojection.meanPx/maxPx/samples`, `gravity.x/y/z`) are a stable
/// contract for downstream evidence stores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawSnapshot")]
pub struct AlignmentSnapshot {
    schema_version: u32,
    intrinsics_hash: String,
    reprojection: AlignmentQuality,
    gravity: Vector3,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    schema_version: u32,
    intrinsics_hash: String,
    reprojection: AlignmentQuality,
    gravity: Vector3,
}

impl TryFrom<RawSnapshot> for AlignmentSnapshot {
    type Error = SnapshotError;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        if raw.schema_version != SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedSchemaVersion {
                found: raw.schema_version,
            });
        }
        AlignmentSnapshot::new(raw.intrinsics_hash, raw.reprojection, raw.gravity)
    }
}

impl AlignmentSnapshot {
    /// Fails if `intrinsics_hash` is empty or whitespace only. The string is
    /// otherwise stored verbatim. `gravity` is not constrained.
    pub fn new(
        intrinsics_hash: impl Into<String>,
        reprojection: AlignmentQuality,
        gravity: Vector3,
    ) -> Result<Self, SnapshotError> {
        let intrinsics_hash = intrinsics_hash.into();
        if intrinsics_hash.trim().is_empty() {
            return Err(SnapshotError::BlankIntrinsicsHash);
        }
        Ok(Self {
            schema_version: SCHEMA_VERSION,
            intrinsics_hash,
            reprojection,
            gravity,
        })
    }

    /// Snapshot keyed by a computed calibration fingerprint.
    pub fn from_hash(
        hash: IntrinsicsHash,
        reprojection: AlignmentQuality,
        gravity: Vector3,
    ) -> Result<Self, SnapshotError> {
        Self::new(hash.into_string(), reprojection, gravity)
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn intrinsics_hash(&self) -> &str {
        &self.intrinsics_hash
    }

    pub fn reprojection(&self) -> &AlignmentQuality {
        &self.reprojection
    }

    pub fn gravity(&self) -> Vector3 {
        self.gravity
    }

    pub fn to_json(&self) -> Result<String, SnapshotIoError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotIoError> {
        let raw: RawSnapshot = serde_json::from_str(json)?;
        Ok(Self::try_from(raw)?)
    }

    /// Write this snapshot to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SnapshotIoError> {
        let path = path.as_ref();
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::debug!("wrote alignment snapshot to {}", path.display());
        Ok(())
    }

    /// Load and re-validate a snapshot from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SnapshotIoError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quality() -> AlignmentQuality {
        AlignmentQuality::new(0.3, 0.9, 4).unwrap()
    }

    #[test]
    fn blank_hashes_are_rejected() {
        let g = Vector3::new(0.0, -9.81, 0.0);
        assert_eq!(
            AlignmentSnapshot::new("", quality(), g),
            Err(SnapshotError::BlankIntrinsicsHash)
        );
        assert_eq!(
            AlignmentSnapshot::new("   ", quality(), g),
            Err(SnapshotError::BlankIntrinsicsHash)
        );
        assert!(AlignmentSnapshot::new("\t\n", quality(), g).is_err());
    }

    #[test]
    fn hash_whitespace_is_preserved() {
        let s = AlignmentSnapshot::new(" abc ", quality(), Vector3::ZERO).unwrap();
        assert_eq!(s.intrinsics_hash(), " abc ");
        assert_eq!(s.schema_version(), 1);
    }

    #[test]
    fn gravity_is_unconstrained() {
        let s = AlignmentSnapshot::new("h", quality(), Vector3::new(3.0, 0.0, -12.0)).unwrap();
        assert_eq!(s.gravity(), Vector3::new(3.0, 0.0, -12.0));
    }

    #[test]
    fn json_field_names_are_stable() {
        let s = AlignmentSnapshot::new("abc", quality(), Vector3::new(0.0, -9.81, 0.0)).unwrap();
        assert_eq!(
            s.to_json().unwrap(),
            r#"{"schemaVersion":1,"intrinsicsHash":"abc","reprojection":{"meanPx":0.3,"maxPx":0.9,"samples":4},"gravity":{"x":0.0,"y":-9.81,"z":0.0}}"#
        );
    }

    #[test]
    fn deserialization_rejects_other_schema_versions() {
        let json = r#"{"schemaVersion":2,"intrinsicsHash":"abc","reprojection":{"meanPx":0.3,"maxPx":0.9,"samples":4},"gravity":{"x":0.0,"y":0.0,"z":0.0}}"#;
        assert!(matches!(
            AlignmentSnapshot::from_json(json),
            Err(SnapshotIoError::Invalid(
                SnapshotError::UnsupportedSchemaVersion { found: 2 }
            ))
        ));
        assert!(serde_json::from_str::<AlignmentSnapshot>(json).is_err());
    }

    #[test]
    fn deserialization_rejects_blank_hash_and_bad_metrics() {
        let blank = r#"{"schemaVersion":1,"intrinsicsHash":" ","reprojection":{"meanPx":0.3,"maxPx":0.9,"samples":4},"gravity":{"x":0.0,"y":0.0,"z":0.0}}"#;
        assert!(matches!(
            AlignmentSnapshot::from_json(blank),
            Err(SnapshotIoError::Invalid(SnapshotError::BlankIntrinsicsHash))
        ));

        let negative = r#"{"schemaVersion":1,"intrinsicsHash":"abc","reprojection":{"meanPx":-0.3,"maxPx":0.9,"samples":4},"gravity":{"x":0.0,"y":0.0,"z":0.0}}"#;
        assert!(matches!(
            AlignmentSnapshot::from_json(negative),
            Err(SnapshotIoError::Json(_))
        ));
    }
}
