//! # encunzip
//!
//! List and extract ZIP archives whose entry names were written in a legacy
//! code page such as Shift-JIS (cp932), GBK or GB18030.
//!
//! ZIP stores file names as bytes. Unless an entry sets the UTF-8 flag, most
//! tools read those bytes as code page 437, which turns names produced by a
//! Japanese or Chinese Windows into garbage. This crate decodes them with a
//! codec chosen by the user instead, and can also decrypt entries protected
//! with traditional PKWARE encryption.
//!
//! ## Features
//!
//! - Short aliases for common codecs (`jp`, `ch1`, `ch2`, ...) plus any
//!   codec known to `encoding_rs` or code page 437
//! - Listing, flat extraction and structured extraction
//! - STORED and DEFLATE entries, ZIP64 archives
//! - Passwords encoded with their own codec
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use encunzip::{Codec, LocalFileReader, NameDecoder, ZipExtractor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let reader = Arc::new(LocalFileReader::new("file.zip".as_ref())?);
//!     let extractor = ZipExtractor::new(reader);
//!     let names = NameDecoder::new(Codec::from_name("jp")?, false);
//!
//!     for entry in extractor.list_files().await? {
//!         println!("{}", names.decode(&entry)?);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod encoding;
pub mod error;
pub mod io;
pub mod ops;
pub mod zip;

pub use cli::{Cli, Invocation, Operation};
pub use encoding::Codec;
pub use error::Error;
pub use io::{LocalFileReader, ReadAt};
pub use ops::{ExtractSummary, Layout, NameDecoder, run};
pub use zip::{ZipExtractor, ZipFileEntry};
