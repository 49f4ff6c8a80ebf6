use thiserror::Error;

/// Failures that end an invocation.
///
/// Archive-format and plain I/O failures travel as [`anyhow::Error`] with
/// context attached; the variants below are the ones callers (and tests)
/// need to tell apart.
#[derive(Debug, Error)]
pub enum Error {
    #[error("usage: {0}")]
    Usage(String),

    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),

    #[error("cannot decode file name {raw:02x?} as {codec}")]
    Decode { raw: Vec<u8>, codec: &'static str },

    #[error("password cannot be represented in {codec}")]
    PasswordEncode { codec: &'static str },

    #[error("{name}: file is encrypted, password required for extraction")]
    PasswordRequired { name: String },

    #[error("{name}: bad password")]
    BadPassword { name: String },

    #[error("{name}: bad CRC-32 (expected {expected:08x}, got {actual:08x})")]
    Crc {
        name: String,
        expected: u32,
        actual: u32,
    },

    #[error("{name}: unsupported compression method {method}")]
    UnsupportedCompression { name: String, method: u16 },

    #[error("{name}: unsupported encryption (only traditional PKWARE encryption is supported)")]
    UnsupportedEncryption { name: String },

    #[error("{0}: entry path escapes the output directory")]
    UnsafePath(String),
}

pub type Result<T> = std::result::Result<T, Error>;
