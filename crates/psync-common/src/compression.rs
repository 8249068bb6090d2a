//! `compress`/`decompress` for the `CompressionScheme` enum: the reply
//! payload and the IBLT name component can each be sent either raw or
//! zlib-compressed, and both peers must agree on which.

use bytes::Bytes;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use psync_config::CompressionScheme;
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("failed to compress payload: {0}")]
    Compress(std::io::Error),
    #[error("failed to decompress payload: {0}")]
    Decompress(std::io::Error),
}

pub fn compress(scheme: CompressionScheme, bytes: &[u8]) -> Result<Bytes, CompressionError> {
    match scheme {
        CompressionScheme::Identity => Ok(Bytes::copy_from_slice(bytes)),
        CompressionScheme::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(bytes).map_err(CompressionError::Compress)?;
            Ok(encoder.finish().map_err(CompressionError::Compress)?.into())
        }
    }
}

pub fn decompress(scheme: CompressionScheme, bytes: &[u8]) -> Result<Bytes, CompressionError> {
    match scheme {
        CompressionScheme::Identity => Ok(Bytes::copy_from_slice(bytes)),
        CompressionScheme::Zlib => {
            let mut decoder = ZlibDecoder::new(bytes);
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(CompressionError::Decompress)?;
            Ok(out.into())
        }
    }
}
