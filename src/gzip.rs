//! Gzip detection by content rather than file extension.

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// True when the file starts with the gzip magic bytes and its leading
/// content actually inflates. A matching magic number over corrupt data
/// reports false.
pub fn is_gzipped(path: impl AsRef<Path>) -> io::Result<bool> {
    let mut file = File::open(path.as_ref())?;
    let mut magic = [0u8; 2];
    match file.read_exact(&mut magic) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => return Ok(false),
        Err(error) => return Err(error),
    }
    if magic != GZIP_MAGIC {
        return Ok(false);
    }

    file.seek(SeekFrom::Start(0))?;
    let mut decoder = MultiGzDecoder::new(file);
    let mut probe = [0u8; 10];
    Ok(decoder.read(&mut probe).is_ok())
}
