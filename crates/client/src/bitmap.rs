//! Bitmap blob handling and debug persistence.
//!
//! `Bo` payloads carry the canvas as base64 over zlib-compressed pixel
//! data. The client never interprets pixel content; it decodes the blob
//! far enough to dump it to disk for offline inspection.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::debug;

/// Errors raised while decoding or persisting a bitmap blob.
#[derive(Debug, Error)]
pub enum BitmapError {
    /// The payload is not valid base64.
    #[error("bitmap payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Wrap IO errors when writing the dump.
    #[error("failed to write bitmap dump: {0}")]
    Io(#[from] io::Error),
}

/// Decode a wire bitmap payload into raw bytes.
///
/// A payload that does not inflate cleanly is kept as the base64-decoded
/// bytes; peers occasionally relay blobs they themselves never decoded.
pub fn decode_blob(payload: &str) -> Result<Vec<u8>, BitmapError> {
    let compressed = base64_decode(payload)?;
    Ok(inflate(&compressed).unwrap_or(compressed))
}

/// Encode raw bytes into a wire bitmap payload.
pub fn encode_blob(data: &[u8]) -> String {
    base64_encode(&deflate(data))
}

fn base64_encode(data: &[u8]) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    STANDARD.encode(data)
}

fn base64_decode(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    STANDARD.decode(payload)
}

/// Compression using flate2 (zlib, the format peers produce).
fn deflate(data: &[u8]) -> Vec<u8> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Decompression using flate2 (zlib).
fn inflate(compressed: &[u8]) -> io::Result<Vec<u8>> {
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    let mut decoder = ZlibDecoder::new(compressed);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

/// Writes received bitmaps to timestamped dump files.
#[derive(Debug)]
pub struct BitmapStore {
    dir: PathBuf,
    whiteboard: String,
}

impl BitmapStore {
    /// Create a store dumping into `dir` for the named whiteboard.
    pub fn new(dir: impl Into<PathBuf>, whiteboard: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            whiteboard: whiteboard.into(),
        }
    }

    /// Persist a received payload, naming the dump after its origin peer.
    pub fn persist(&self, peer: &str, payload: &str) -> Result<PathBuf, BitmapError> {
        self.persist_at(peer, payload, Local::now())
    }

    /// Persist with an explicit timestamp.
    pub fn persist_at(
        &self,
        peer: &str,
        payload: &str,
        when: DateTime<Local>,
    ) -> Result<PathBuf, BitmapError> {
        let data = decode_blob(payload)?;
        let name = format!(
            "flockdrawdump-{peer}-{}-{}.bitmap",
            self.whiteboard,
            when.format("%Y%m%dT%H%M%S%.3f")
        );
        let path = self.dir.join(name);

        fs::create_dir_all(&self.dir)?;
        fs::write(&path, &data)?;
        debug!("saved bitmap dump to {}", path.display());
        Ok(path)
    }

    /// The directory dumps are written into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn blob_roundtrips() {
        let pixels = vec![0u8, 1, 2, 3, 250, 251, 252, 253];
        let payload = encode_blob(&pixels);
        assert_eq!(decode_blob(&payload).expect("payload must decode"), pixels);
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert!(decode_blob("not base64!!!").is_err());
    }

    #[test]
    fn uncompressed_payload_is_kept_as_decoded_bytes() {
        let payload = base64_encode(b"plain bytes");
        assert_eq!(
            decode_blob(&payload).expect("payload must decode"),
            b"plain bytes"
        );
    }

    #[test]
    fn persist_writes_timestamped_dump() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = BitmapStore::new(dir.path(), "testone");

        let when = Local.with_ymd_and_hms(2024, 5, 17, 12, 30, 45).unwrap();
        let path = store
            .persist_at("alice", &encode_blob(b"canvas"), when)
            .expect("persist must succeed");

        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some("flockdrawdump-alice-testone-20240517T123045.000.bitmap")
        );
        assert_eq!(fs::read(&path).expect("dump must exist"), b"canvas");
    }
}
