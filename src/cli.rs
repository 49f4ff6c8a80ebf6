use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::encoding::{self, Codec};
use crate::error::{Error, Result};

/// Token that opens the trailing password clause
const PASSWORD_CLAUSE: &str = "p";

/// Spellings of `--noencerr` accepted after the positionals
const NOENCERR_TOKENS: [&str; 2] = ["-noencerr", "--noencerr"];

#[derive(Parser, Debug)]
#[command(name = "encunzip")]
#[command(version)]
#[command(about = "List and extract ZIP files whose names use a non UTF-8 encoding", long_about = None)]
#[command(after_help = "Encoding table:\n  \
  japanese, jp      cp932\n  \
  chinese_1, ch1    gb18030\n  \
  chinese_2, ch2    gbk\n\
Any other codec name (utf-8, cp437, euc-kr, ...) is accepted as is.\n\n\
Options -v, -q and --noencerr may come first or after every positional.\n\n\
Examples:\n  \
  encunzip l jp file.zip                    list file.zip with cp932 names\n  \
  encunzip e utf-8 file.zip output          extract without directories\n  \
  encunzip x ch1 file.zip output            extract keeping directories\n  \
  encunzip e jp file.zip output p 1234 ch1  extract with password \"1234\" in gb18030")]
pub struct Cli {
    /// l = list, e = extract without file structure, x = extract with file structure
    #[arg(value_enum, value_name = "OPERATION")]
    pub operation: Operation,

    /// Encoding of the file names: a name from the encoding table or a codec name
    #[arg(value_name = "ENCODING")]
    pub encoding: String,

    /// ZIP file path
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// [OUTPUTDIR] [p PASSWORD PASSWORD_ENCODING]
    #[arg(value_name = "OUTPUTDIR", num_args = 0.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<String>,

    /// List verbosely (sizes, ratio, timestamps)
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Quiet mode, no extraction progress
    #[arg(short = 'q')]
    pub quiet: bool,

    /// Ignore file name decoding errors, falling back to the cp437 reading
    #[arg(long = "noencerr")]
    pub ignore_encoding_errors: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// List archive content
    #[value(name = "l")]
    List,
    /// Extract into one directory, dropping the stored paths
    #[value(name = "e")]
    ExtractFlat,
    /// Extract recreating the stored directory structure
    #[value(name = "x")]
    ExtractStructured,
}

impl Operation {
    pub fn is_extract(&self) -> bool {
        !matches!(self, Operation::List)
    }
}

/// A fully validated command, ready to run
#[derive(Debug)]
pub struct Invocation {
    pub operation: Operation,
    pub codec: Codec,
    pub archive: PathBuf,
    /// Always set for extraction; whatever was given for listing
    pub output_dir: Option<PathBuf>,
    pub password: Option<Vec<u8>>,
    pub verbose: bool,
    pub quiet: bool,
    pub ignore_encoding_errors: bool,
}

impl Cli {
    /// Validate the positional arguments and resolve every codec.
    ///
    /// Nothing here touches the filesystem, so usage mistakes surface before
    /// any directory is created.
    pub fn invocation(&self) -> Result<Invocation> {
        let mut verbose = self.verbose;
        let mut quiet = self.quiet;
        let mut ignore_encoding_errors = self.ignore_encoding_errors;
        let mut rest: Vec<&str> = self.rest.iter().map(String::as_str).collect();

        // Options may also trail the positionals. Only the tail is looked at,
        // and never OUTPUTDIR itself.
        let keep = usize::from(self.operation.is_extract());
        while rest.len() > keep {
            match rest[rest.len() - 1] {
                "-v" => verbose = true,
                "-q" => quiet = true,
                token if NOENCERR_TOKENS.contains(&token) => ignore_encoding_errors = true,
                _ => break,
            }
            rest.pop();
        }

        // Extraction always takes OUTPUTDIR first. A listing has none, so
        // "p" followed by more opens the clause there.
        let (output_dir, clause) = match (self.operation, rest.as_slice()) {
            (_, []) => (None, &[][..]),
            (Operation::List, [first, _, ..]) if *first == PASSWORD_CLAUSE => (None, &rest[..]),
            (_, [first, clause @ ..]) => (Some(PathBuf::from(*first)), clause),
        };

        let password = match clause {
            [] => None,
            [p, password, password_encoding] if *p == PASSWORD_CLAUSE => {
                let codec = Codec::from_name(password_encoding)?;
                log::debug!("password encoding {} -> {}", password_encoding, codec.name());
                Some(codec.encode(password)?)
            }
            [p, ..] if *p == PASSWORD_CLAUSE => {
                return Err(Error::Usage(
                    "'p' must be followed by PASSWORD and PASSWORD_ENCODING".to_string(),
                ));
            }
            [unexpected, ..] => {
                return Err(Error::Usage(format!("unexpected argument '{}'", unexpected)));
            }
        };

        if self.operation.is_extract() && output_dir.is_none() {
            return Err(Error::Usage(
                "OUTPUTDIR is required for operations 'e' and 'x'".to_string(),
            ));
        }

        let codec = Codec::from_name(&self.encoding)?;
        log::debug!(
            "file name encoding {} -> {} -> {}",
            self.encoding,
            encoding::resolve(&self.encoding),
            codec.name()
        );

        Ok(Invocation {
            operation: self.operation,
            codec,
            archive: self.archive.clone(),
            output_dir,
            password,
            verbose,
            quiet,
            ignore_encoding_errors,
        })
    }
}
