use flate2::read::DeflateDecoder;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::Error;
use crate::io::ReadAt;
use anyhow::{Context, Result};

use super::crypto;
use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Upper bound on the buffer reserved up front from a header's size claim
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all files in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Read, decrypt and decompress one entry.
    ///
    /// `name` is only used in error messages. The CRC-32 of the result is
    /// checked against the central directory.
    pub async fn extract_to_memory(
        &self,
        entry: &ZipFileEntry,
        name: &str,
        password: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        if entry.uses_strong_encryption() || entry.compression_method == CompressionMethod::Aes {
            return Err(Error::UnsupportedEncryption {
                name: name.to_string(),
            }
            .into());
        }
        if let CompressionMethod::Unknown(method) = entry.compression_method {
            return Err(Error::UnsupportedCompression {
                name: name.to_string(),
                method,
            }
            .into());
        }

        // Get data offset
        let data_offset = self.parser.get_data_offset(entry).await?;

        // Read the stored bytes (encryption header included)
        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut raw)
            .await
            .with_context(|| format!("Cannot read data of {}", name))?;

        if entry.is_encrypted() {
            let password = password.ok_or_else(|| Error::PasswordRequired {
                name: name.to_string(),
            })?;
            let check_byte = if entry.has_data_descriptor() {
                (entry.last_mod_time >> 8) as u8
            } else {
                (entry.crc32 >> 24) as u8
            };
            raw = crypto::decrypt(password, raw, check_byte).ok_or_else(|| Error::BadPassword {
                name: name.to_string(),
            })?;
        }

        let data = match entry.compression_method {
            CompressionMethod::Deflate => {
                let mut out = Vec::with_capacity(entry.uncompressed_size.min(MAX_PREALLOC) as usize);
                if let Err(err) = DeflateDecoder::new(raw.as_slice()).read_to_end(&mut out) {
                    // A wrong password passes the check byte one time in 256
                    // and then yields garbage instead of a deflate stream.
                    if entry.is_encrypted() {
                        return Err(Error::BadPassword {
                            name: name.to_string(),
                        }
                        .into());
                    }
                    return Err(err).with_context(|| format!("Cannot inflate {}", name));
                }
                out
            }
            _ => raw,
        };

        let actual = crc32fast::hash(&data);
        if actual != entry.crc32 {
            return Err(Error::Crc {
                name: name.to_string(),
                expected: entry.crc32,
                actual,
            }
            .into());
        }

        Ok(data)
    }

    /// Extract file to disk
    pub async fn extract_to_file(
        &self,
        entry: &ZipFileEntry,
        name: &str,
        password: Option<&[u8]>,
        output_path: &Path,
    ) -> Result<()> {
        // Create parent directories if needed
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Cannot create directory {}", parent.display()))?;
            }
        }

        // Extract data before touching the target, so a bad password leaves no file
        let data = self.extract_to_memory(entry, name, password).await?;

        // Write to file
        let mut file = fs::File::create(output_path)
            .await
            .with_context(|| format!("Cannot create {}", output_path.display()))?;
        file.write_all(&data)
            .await
            .with_context(|| format!("Cannot write {}", output_path.display()))?;
        file.flush().await?;

        Ok(())
    }
}
