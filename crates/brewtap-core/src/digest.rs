//! SHA-256 digests over artifact content.
//!
//! Formulas pin every download with a lowercase hex SHA-256, the same form
//! `shasum -a 256` prints.

use std::io::{self, Read};

use sha2::{Digest, Sha256};

/// Size of the buffer used when streaming a reader into the hasher.
const CHUNK: usize = 64 * 1024;

/// Computes the hex SHA-256 of an in-memory payload.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Streams `reader` to the end and returns its hex SHA-256 along with the
/// number of bytes consumed.
pub fn sha256_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<(String, u64)> {
    let mut h = Sha256::new();
    let mut buf = vec![0u8; CHUNK];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        h.update(&buf[..n]);
        total += n as u64;
    }
    Ok((format!("{:x}", h.finalize()), total))
}
