//! Image encoding: file bytes → base64 text payload.
//!
//! The extraction service accepts images as base64 data-URIs embedded in
//! the JSON request body. The file's bytes are encoded exactly as they are
//! on disk, never re-encoded through an image codec: the payload must
//! decode back to the original bytes, and the camera's JPEG is already as
//! small as it is going to get.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// Encode the file at `path` as standard base64.
///
/// Round-trip lossless: decoding the returned string yields the file's
/// bytes exactly. I/O errors propagate to the caller; the failure aborts
/// only this image, never the batch.
pub fn encode_image(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let b64 = STANDARD.encode(&bytes);
    debug!("Encoded {} → {} bytes base64", path.display(), b64.len());
    Ok(b64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn round_trips_arbitrary_binary_exactly() {
        // Every byte value, twice, plus a JPEG-ish magic prefix
        let mut bytes: Vec<u8> = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend((0..=255u8).chain(0..=255u8));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let encoded = encode_image(file.path()).expect("encode should succeed");
        let decoded = STANDARD.decode(&encoded).expect("valid base64");
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn empty_file_encodes_to_empty_payload() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(encode_image(file.path()).unwrap(), "");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = encode_image(Path::new("/no/such/image.jpg")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
