//! ZIP archive parsing and extraction.
//!
//! This module reads ZIP archives without interpreting entry names: every
//! [`ZipFileEntry`] carries its name as the raw bytes found in the Central
//! Directory, so callers can apply whatever code page the archive was
//! written with.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`crypto`]: Traditional PKWARE decryption
//! - [`extractor`]: Reading, decrypting, inflating and verifying entry data
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB
//! - STORED and DEFLATE compression methods
//! - Traditional PKWARE encryption
//! - CRC-32 verification of extracted data
//!
//! ## Limitations
//!
//! - No AES or other strong encryption
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods

pub mod crypto;
mod extractor;
mod parser;
mod structures;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
