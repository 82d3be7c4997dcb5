use dircmp_common::{Blake3Hash, InspectOp, InspectionError, DEFAULT_READ_BUFFER_SIZE};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Computes a fixed-length fingerprint of a file's full content
pub trait ContentDigester {
    fn digest(&self, path: &Path) -> Result<Blake3Hash, InspectionError>;
}

/// Streams a file through BLAKE3 in fixed-size chunks.
///
/// Used as an integrity check between two copies, not as a security property.
#[derive(Debug, Clone)]
pub struct Blake3Digester {
    buffer_size: usize,
}

impl Blake3Digester {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl Default for Blake3Digester {
    fn default() -> Self {
        Self::new(DEFAULT_READ_BUFFER_SIZE)
    }
}

impl ContentDigester for Blake3Digester {
    fn digest(&self, path: &Path) -> Result<Blake3Hash, InspectionError> {
        let mut file =
            File::open(path).map_err(|e| InspectionError::new(path, InspectOp::Open, e))?;
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0; self.buffer_size];

        loop {
            let n = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(InspectionError::new(path, InspectOp::Read, e)),
            };
            hasher.update(&buffer[..n]);
        }

        Ok(hasher.finalize().into())
    }
}
