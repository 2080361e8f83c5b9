use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::chunk::MediaChunk;
use super::error::RecorderError;

/// The single retrievable artifact assembled from a recording session.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaArtifact {
    /// Concatenated chunk bytes.
    pub data: Vec<u8>,

    /// MIME type taken from the first chunk.
    pub mime_type: String,

    pub metadata: ArtifactMetadata,
}

/// Metadata describing an assembled artifact.
///
/// Serializable for callers that export it alongside the bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: String,
    pub mime_type: String,
    pub created_at: String,
    /// Active recording duration in seconds, excluding paused time.
    pub duration_secs: f64,
    pub size_bytes: u64,
    pub chunk_count: usize,
    /// SHA-256 hex digest of the assembled bytes.
    pub checksum: String,
}

impl ArtifactMetadata {
    /// Serialize as pretty JSON for export.
    pub fn to_json(&self) -> Result<String, RecorderError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RecorderError::Unknown(format!("failed to serialize metadata: {}", e)))
    }
}

impl MediaArtifact {
    /// Concatenate an ordered chunk sequence into one artifact.
    ///
    /// The artifact takes the MIME type of the first chunk. An empty
    /// sequence yields no artifact.
    pub fn assemble(chunks: &[MediaChunk], duration_secs: f64) -> Option<Self> {
        let first = chunks.first()?;
        let mime_type = first.mime_type.clone();

        let total: usize = chunks.iter().map(|c| c.data.len()).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in chunks {
            data.extend_from_slice(&chunk.data);
        }

        let checksum = hex_encode(&Sha256::digest(&data));
        let metadata = ArtifactMetadata {
            id: uuid::Uuid::new_v4().to_string(),
            mime_type: mime_type.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
            duration_secs,
            size_bytes: data.len() as u64,
            chunk_count: chunks.len(),
            checksum,
        };

        Some(Self {
            data,
            mime_type,
            metadata,
        })
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
