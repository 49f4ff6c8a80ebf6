//! In-memory ZIP writer for tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use encunzip::zip::crypto::{HEADER_LEN, ZipCryptoKeys};
use flate2::Compression;
use flate2::write::DeflateEncoder;

// 2023-06-01 12:34:56
const DOS_TIME: u16 = (12 << 11) | (34 << 5) | 28;
const DOS_DATE: u16 = (43 << 9) | (6 << 5) | 1;

struct Entry {
    name: Vec<u8>,
    data: Vec<u8>,
    deflate: bool,
    password: Option<Vec<u8>>,
    utf8: bool,
    data_descriptor: bool,
}

#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<Entry>,
    comment: Vec<u8>,
    zip64: bool,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, name: &[u8], data: &[u8], deflate: bool, password: Option<&[u8]>) -> Self {
        self.entries.push(Entry {
            name: name.to_vec(),
            data: data.to_vec(),
            deflate,
            password: password.map(<[u8]>::to_vec),
            utf8: false,
            data_descriptor: false,
        });
        self
    }

    pub fn file(self, name: &[u8], data: &[u8]) -> Self {
        self.push(name, data, false, None)
    }

    pub fn deflated(self, name: &[u8], data: &[u8]) -> Self {
        self.push(name, data, true, None)
    }

    pub fn encrypted(self, name: &[u8], data: &[u8], password: &[u8]) -> Self {
        self.push(name, data, true, Some(password))
    }

    pub fn utf8_file(mut self, name: &str, data: &[u8]) -> Self {
        self = self.push(name.as_bytes(), data, false, None);
        if let Some(last) = self.entries.last_mut() {
            last.utf8 = true;
        }
        self
    }

    /// Encrypted entry written the streaming way: sizes and CRC follow the
    /// data, so the password check byte comes from the modification time.
    pub fn encrypted_streamed(mut self, name: &[u8], data: &[u8], password: &[u8]) -> Self {
        self = self.push(name, data, true, Some(password));
        if let Some(last) = self.entries.last_mut() {
            last.data_descriptor = true;
        }
        self
    }

    /// Archive comment stored after the End of Central Directory record
    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    /// Write ZIP64 records, with every 32-bit size and offset saturated
    pub fn zip64(mut self) -> Self {
        self.zip64 = true;
        self
    }

    pub fn dir(self, name: &[u8]) -> Self {
        assert!(name.ends_with(b"/"));
        self.push(name, b"", false, None)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let crc = crc32fast::hash(&entry.data);
            let mut payload = if entry.deflate {
                let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
                enc.write_all(&entry.data).unwrap();
                enc.finish().unwrap()
            } else {
                entry.data.clone()
            };

            let mut flags = 0u16;
            if entry.utf8 {
                flags |= 1 << 11;
            }
            if entry.data_descriptor {
                flags |= 1 << 3;
            }
            if let Some(password) = &entry.password {
                flags |= 1;
                let check = if entry.data_descriptor {
                    (DOS_TIME >> 8) as u8
                } else {
                    (crc >> 24) as u8
                };
                let mut plain = vec![0x42u8; HEADER_LEN - 1];
                plain.push(check);
                plain.extend_from_slice(&payload);

                let mut keys = ZipCryptoKeys::new(password);
                payload = plain
                    .iter()
                    .map(|&p| {
                        let c = p ^ keys.stream_byte();
                        keys.update(p);
                        c
                    })
                    .collect();
            }

            let method: u16 = if entry.deflate { 8 } else { 0 };
            let version: u16 = if self.zip64 { 45 } else { 20 };
            let offset = out.len() as u64;
            let external: u32 = if entry.name.ends_with(b"/") { 0x10 } else { 0 };
            let compressed = payload.len() as u64;
            let uncompressed = entry.data.len() as u64;

            // Streamed entries leave the local CRC and sizes empty.
            let (local_crc, local_compressed, local_uncompressed) = if entry.data_descriptor {
                (0, 0, 0)
            } else if self.zip64 {
                (crc, u32::MAX, u32::MAX)
            } else {
                (crc, compressed as u32, uncompressed as u32)
            };
            let mut local_extra = Vec::new();
            if self.zip64 {
                local_extra.extend_from_slice(&1u16.to_le_bytes());
                local_extra.extend_from_slice(&16u16.to_le_bytes());
                local_extra.extend_from_slice(&uncompressed.to_le_bytes());
                local_extra.extend_from_slice(&compressed.to_le_bytes());
            }

            out.extend_from_slice(b"PK\x03\x04");
            out.extend_from_slice(&version.to_le_bytes());
            out.extend_from_slice(&flags.to_le_bytes());
            out.extend_from_slice(&method.to_le_bytes());
            out.extend_from_slice(&DOS_TIME.to_le_bytes());
            out.extend_from_slice(&DOS_DATE.to_le_bytes());
            out.extend_from_slice(&local_crc.to_le_bytes());
            out.extend_from_slice(&local_compressed.to_le_bytes());
            out.extend_from_slice(&local_uncompressed.to_le_bytes());
            out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
            out.extend_from_slice(&(local_extra.len() as u16).to_le_bytes());
            out.extend_from_slice(&entry.name);
            out.extend_from_slice(&local_extra);
            out.extend_from_slice(&payload);

            if entry.data_descriptor {
                out.extend_from_slice(b"PK\x07\x08");
                out.extend_from_slice(&crc.to_le_bytes());
                out.extend_from_slice(&(compressed as u32).to_le_bytes());
                out.extend_from_slice(&(uncompressed as u32).to_le_bytes());
            }

            // A bogus extra field first, so the ZIP64 one has to be searched for.
            let mut central_extra = vec![0x55, 0x54, 0x05, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
            let (central_compressed, central_uncompressed, central_offset) = if self.zip64 {
                central_extra.extend_from_slice(&1u16.to_le_bytes());
                central_extra.extend_from_slice(&24u16.to_le_bytes());
                central_extra.extend_from_slice(&uncompressed.to_le_bytes());
                central_extra.extend_from_slice(&compressed.to_le_bytes());
                central_extra.extend_from_slice(&offset.to_le_bytes());
                (u32::MAX, u32::MAX, u32::MAX)
            } else {
                (compressed as u32, uncompressed as u32, offset as u32)
            };

            central.extend_from_slice(b"PK\x01\x02");
            central.extend_from_slice(&version.to_le_bytes());
            central.extend_from_slice(&version.to_le_bytes());
            central.extend_from_slice(&flags.to_le_bytes());
            central.extend_from_slice(&method.to_le_bytes());
            central.extend_from_slice(&DOS_TIME.to_le_bytes());
            central.extend_from_slice(&DOS_DATE.to_le_bytes());
            central.extend_from_slice(&crc.to_le_bytes());
            central.extend_from_slice(&central_compressed.to_le_bytes());
            central.extend_from_slice(&central_uncompressed.to_le_bytes());
            central.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
            central.extend_from_slice(&(central_extra.len() as u16).to_le_bytes());
            central.extend_from_slice(&0u16.to_le_bytes()); // comment
            central.extend_from_slice(&0u16.to_le_bytes()); // disk
            central.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
            central.extend_from_slice(&external.to_le_bytes());
            central.extend_from_slice(&central_offset.to_le_bytes());
            central.extend_from_slice(&entry.name);
            central.extend_from_slice(&central_extra);
        }

        let cd_offset = out.len() as u64;
        out.extend_from_slice(&central);

        let count = self.entries.len() as u64;
        let (eocd_count, eocd_size, eocd_offset) = if self.zip64 {
            let eocd64_offset = out.len() as u64;
            out.extend_from_slice(b"PK\x06\x06");
            out.extend_from_slice(&44u64.to_le_bytes());
            out.extend_from_slice(&45u16.to_le_bytes());
            out.extend_from_slice(&45u16.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&count.to_le_bytes());
            out.extend_from_slice(&count.to_le_bytes());
            out.extend_from_slice(&(central.len() as u64).to_le_bytes());
            out.extend_from_slice(&cd_offset.to_le_bytes());

            out.extend_from_slice(b"PK\x06\x07");
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&eocd64_offset.to_le_bytes());
            out.extend_from_slice(&1u32.to_le_bytes());
            (u16::MAX, u32::MAX, u32::MAX)
        } else {
            (count as u16, central.len() as u32, cd_offset as u32)
        };

        out.extend_from_slice(b"PK\x05\x06");
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&eocd_count.to_le_bytes());
        out.extend_from_slice(&eocd_count.to_le_bytes());
        out.extend_from_slice(&eocd_size.to_le_bytes());
        out.extend_from_slice(&eocd_offset.to_le_bytes());
        out.extend_from_slice(&(self.comment.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.comment);
        out
    }

    pub fn write_to(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}
