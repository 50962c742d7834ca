//! # Snapshot Format
//!
//! Binary serialization of a [`Session`], so a host can park a
//! questionnaire and resume it later. File I/O lives in the app layer.
//!
//! Format: Header (5 bytes) + postcard-serialized session.
//! - 4 bytes: Magic ("ESSA")
//! - 1 byte: Version
//!
//! The size limit and the header are checked before the payload is
//! decoded. Decoding re-validates names, scores, note lengths, the lifecycle
//! bounds and the shape of the factor selection. Catalog membership is not
//! known here; call [`Session::validate`] after loading.

use crate::{EssaError, Session, primitives};

/// Maximum accepted snapshot size.
///
/// A full grid of seven stages and nine factors with maximal notes stays
/// well below this.
pub const MAX_SNAPSHOT_SIZE: usize = 16 * 1024 * 1024; // 16 MB

/// Header length in bytes.
const HEADER_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The snapshot header precedes all session data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Create a header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), EssaError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(EssaError::DeserializationError(
                "Not an ESSA snapshot".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(EssaError::DeserializationError(format!(
                "Unsupported snapshot version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EssaError> {
        let header = bytes.get(..HEADER_SIZE).ok_or_else(|| {
            EssaError::DeserializationError("Snapshot header too short".to_string())
        })?;
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        Ok(Self {
            magic,
            version: header[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a session to bytes (header + payload).
pub fn session_to_bytes(session: &Session) -> Result<Vec<u8>, EssaError> {
    let payload = postcard::to_stdvec(session)
        .map_err(|e| EssaError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_SIZE + payload.len());
    result.extend_from_slice(&SnapshotHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize a session from bytes.
pub fn session_from_bytes(bytes: &[u8]) -> Result<Session, EssaError> {
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(EssaError::DeserializationError(format!(
            "Snapshot size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    postcard::from_bytes(&bytes[HEADER_SIZE..]).map_err(|e| {
        EssaError::DeserializationError(format!("Failed to decode session: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Catalog, Category, FactorName, StageName, Wizard};
    use std::collections::BTreeMap;

    fn sample() -> Session {
        let catalog = Catalog::standard();
        let mut session = Session::new("Snapshot", &catalog).expect("valid");
        let project = session.project_mut();
        project.set_trl(&catalog, 2).expect("valid");
        let stage = StageName::new("Use phase").expect("valid");
        project.set_scoping_stage(&stage, true).expect("known");
        project.select_default_factors(&catalog);
        for (_, factor) in project.active_factors() {
            project.set_score(&stage, &factor, 3, "note, with comma").expect("active");
        }
        session.advance();
        session
    }

    #[test]
    fn save_load_save_is_bit_exact() {
        let session = sample();
        let first = session_to_bytes(&session).expect("encode");
        let restored = session_from_bytes(&first).expect("decode");
        let second = session_to_bytes(&restored).expect("encode again");

        assert_eq!(restored, session);
        assert_eq!(first, second);
    }

    #[test]
    fn header_checked_before_payload() {
        let mut bytes = session_to_bytes(&sample()).expect("encode");
        bytes[0..4].copy_from_slice(b"XXXX");
        assert!(session_from_bytes(&bytes).is_err());

        bytes[0..4].copy_from_slice(b"ESSA");
        bytes[4] = primitives::FORMAT_VERSION + 1;
        assert!(session_from_bytes(&bytes).is_err());
    }

    #[test]
    fn truncated_data_rejected() {
        assert!(session_from_bytes(b"ESS").is_err());
        let bytes = session_to_bytes(&sample()).expect("encode");
        assert!(session_from_bytes(&bytes[..bytes.len() / 2]).is_err());
    }

    /// Encode a session field by field with a hand-built factor map.
    fn encode_with_factors(
        project: &crate::Project,
        factors: &BTreeMap<Category, Vec<FactorName>>,
    ) -> Vec<u8> {
        let fields = (
            (
                project.name(),
                project.description(),
                project.trl(),
                project.notes(),
                project.scoping(),
                factors,
                project.grid(),
            ),
            Wizard::new(),
        );
        let mut bytes = SnapshotHeader::new().to_bytes().to_vec();
        bytes.extend(postcard::to_stdvec(&fields).expect("encode"));
        bytes
    }

    #[test]
    fn tampered_selection_rejected() {
        let session = sample();
        let project = session.project();
        let mut factors: BTreeMap<Category, Vec<FactorName>> = Category::ALL
            .into_iter()
            .map(|c| (c, project.factors().in_category(c).to_vec()))
            .collect();

        let restored = session_from_bytes(&encode_with_factors(project, &factors)).expect("decode");
        assert_eq!(restored, Session::with_project(project.clone()));

        factors
            .get_mut(&Category::Environmental)
            .expect("selected")
            .push(FactorName::new("Not a catalog factor").expect("valid"));
        assert!(matches!(
            session_from_bytes(&encode_with_factors(project, &factors)),
            Err(EssaError::DeserializationError(_))
        ));
    }

    #[test]
    fn blank_name_rejected() {
        let mut bytes = session_to_bytes(&sample()).expect("encode");
        // "Snapshot" follows the header and its one-byte length prefix.
        let start = HEADER_SIZE + 1;
        bytes[start..start + 8].copy_from_slice(b"        ");
        assert!(session_from_bytes(&bytes).is_err());
    }
}
