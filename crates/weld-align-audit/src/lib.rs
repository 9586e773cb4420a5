//! Audit records for accepted alignments.
//!
//! - [`intrinsics_hash_v1`] / [`IntrinsicsHash`]: quantization-stable
//!   fingerprint of the calibration that produced an alignment.
//! - [`AlignmentQuality`]: validated reprojection error summary.
//! - [`AlignmentSnapshot`]: the immutable, versioned record handed to the
//!   evidence store, with JSON helpers.

mod intrinsics_hash;
mod quality;
mod snapshot;

pub use intrinsics_hash::{
    canonical_bytes_v1, intrinsics_hash_v1, to_millipixels, IntrinsicsHash, IntrinsicsHashExt,
    CANONICAL_LEN_V1,
};
pub use quality::{AlignmentQuality, QualityError};
pub use snapshot::{AlignmentSnapshot, SnapshotError, SnapshotIoError, SCHEMA_VERSION};
