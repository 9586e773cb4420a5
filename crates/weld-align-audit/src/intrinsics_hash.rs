//! Content-derived fingerprint of a camera calibration.
//!
//! Version 1 layout (42 bytes, big-endian):
//!
//! | bytes  | field                      |
//! |--------|----------------------------|
//! | 0..2   | ASCII `"v1"`               |
//! | 2..6   | `width` (`i32`)            |
//! | 6..10  | `height` (`i32`)           |
//! | 10..18 | `fx` millipixels (`i64`)   |
//! | 18..26 | `fy` millipixels (`i64`)   |
//! | 26..34 | `cx` millipixels (`i64`)   |
//! | 34..42 | `cy` millipixels (`i64`)   |
//!
//! The digest is SHA-256 over those bytes, encoded as unpadded base64url.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use weld_align_core::CameraIntrinsics;

#[cfg(feature = "tracing")]
use tracing::instrument;

pub const CANONICAL_LEN_V1: usize = 42;

const VERSION_TAG_V1: &[u8; 2] = b"v1";

/// Round half up to thousandths of a pixel: `floor(v * 1000 + 0.5)`.
///
/// NaN maps to `0` and infinities saturate to `i64::MIN`/`i64::MAX`.
#[inline]
pub fn to_millipixels(value: f64) -> i64 {
    (value * 1000.0 + 0.5).floor() as i64
}

/// The exact byte string hashed by [`intrinsics_hash_v1`].
pub fn canonical_bytes_v1(
    width: i32,
    height: i32,
    fx: f64,
    fy: f64,
    cx: f64,
    cy: f64,
) -> [u8; CANONICAL_LEN_V1] {
    let mut out = [0u8; CANONICAL_LEN_V1];
    out[0..2].copy_from_slice(VERSION_TAG_V1);
    out[2..6].copy_from_slice(&width.to_be_bytes());
    out[6..10].copy_from_slice(&height.to_be_bytes());
    for (slot, v) in out[10..].chunks_exact_mut(8).zip([fx, fy, cx, cy]) {
        slot.copy_from_slice(&to_millipixels(v).to_be_bytes());
    }
    out
}

/// 43-character base64url fingerprint of the given calibration.
#[cfg_attr(feature = "tracing", instrument(level = "trace"))]
pub fn intrinsics_hash_v1(width: i32, height: i32, fx: f64, fy: f64, cx: f64, cy: f64) -> String {
    let digest = Sha256::digest(canonical_bytes_v1(width, height, fx, fy, cx, cy));
    URL_SAFE_NO_PAD.encode(digest)
}

/// A version 1 intrinsics fingerprint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntrinsicsHash(String);

impl IntrinsicsHash {
    pub fn of(intrinsics: &CameraIntrinsics) -> Self {
        Self(intrinsics_hash_v1(
            intrinsics.width,
            intrinsics.height,
            intrinsics.fx,
            intrinsics.fy,
            intrinsics.cx,
            intrinsics.cy,
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for IntrinsicsHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<IntrinsicsHash> for String {
    fn from(h: IntrinsicsHash) -> Self {
        h.0
    }
}

/// `hash_v1()` on [`CameraIntrinsics`].
pub trait IntrinsicsHashExt {
    fn hash_v1(&self) -> IntrinsicsHash;
}

impl IntrinsicsHashExt for CameraIntrinsics {
    fn hash_v1(&self) -> IntrinsicsHash {
        IntrinsicsHash::of(self)
    }
}
