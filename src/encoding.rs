//! File name codecs.
//!
//! ZIP archives written by non-Unicode tools store entry names as raw bytes in
//! whatever code page the writer happened to use. This module maps the short
//! names users type (`jp`, `ch1`, ...) to codec identifiers and turns those
//! identifiers into a [`Codec`] that can decode names and encode passwords.
//!
//! Apart from IBM code page 437 (the ZIP default, which the WHATWG encoding
//! standard does not cover) every codec is backed by [`encoding_rs`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use encoding_rs::Encoding;

use crate::error::{Error, Result};

/// Friendly names accepted in place of a codec identifier.
///
/// Lookups are exact and case-sensitive.
static ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("japanese", "cp932"),
        ("jp", "cp932"),
        ("chinese_1", "gb18030"),
        ("ch1", "gb18030"),
        ("chinese_2", "gbk"),
        ("ch2", "gbk"),
    ])
});

/// Codec names in common use (mostly Windows code page numbers) that are not
/// WHATWG labels.
static EXTRA_LABELS: &[(&str, &Encoding)] = &[
    ("cp932", encoding_rs::SHIFT_JIS),
    ("932", encoding_rs::SHIFT_JIS),
    ("mskanji", encoding_rs::SHIFT_JIS),
    ("shiftjis", encoding_rs::SHIFT_JIS),
    ("cp936", encoding_rs::GBK),
    ("936", encoding_rs::GBK),
    ("cp949", encoding_rs::EUC_KR),
    ("949", encoding_rs::EUC_KR),
    ("uhc", encoding_rs::EUC_KR),
    ("cp950", encoding_rs::BIG5),
    ("950", encoding_rs::BIG5),
    ("cp65001", encoding_rs::UTF_8),
    ("u8", encoding_rs::UTF_8),
    ("eucjp", encoding_rs::EUC_JP),
    ("euckr", encoding_rs::EUC_KR),
    ("utf-16-le", encoding_rs::UTF_16LE),
    ("utf-16-be", encoding_rs::UTF_16BE),
];

const CP437_LABELS: &[&str] = &["cp437", "437", "ibm437", "ibm-437", "cspc8codepage437"];

/// Upper half of code page 437; the lower half is ASCII.
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];

/// Map a friendly name to a codec identifier.
///
/// Names missing from the alias table are returned unchanged and are expected
/// to be codec identifiers themselves.
pub fn resolve(name: &str) -> &str {
    ALIASES.get(name).copied().unwrap_or(name)
}

/// A validated text codec.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Codec {
    /// IBM PC code page 437, the encoding ZIP assumes when the UTF-8 flag is unset.
    Cp437,
    Standard(&'static Encoding),
}

impl Codec {
    /// Look up a codec identifier.
    ///
    /// Accepts WHATWG labels (`shift_jis`, `gbk`, `utf-8`, ...), Windows code
    /// page names (`cp932`, `cp936`, ...) and underscore spellings such as
    /// `euc_jp`. Matching ignores ASCII case and surrounding whitespace.
    pub fn for_label(label: &str) -> Result<Self> {
        let lower = label.trim().to_ascii_lowercase();
        let dashed = lower.replace('_', "-");

        if CP437_LABELS.contains(&dashed.as_str()) {
            return Ok(Codec::Cp437);
        }

        let encoding = Encoding::for_label(lower.as_bytes())
            .or_else(|| Encoding::for_label(dashed.as_bytes()))
            .or_else(|| {
                let compact = dashed.replace('-', "");
                EXTRA_LABELS
                    .iter()
                    .find(|(name, _)| *name == dashed || *name == compact)
                    .map(|(_, encoding)| *encoding)
            });

        match encoding {
            // The replacement encoding decodes everything to U+FFFD.
            Some(encoding) if encoding != encoding_rs::REPLACEMENT => {
                Ok(Codec::Standard(encoding))
            }
            _ => Err(Error::UnknownEncoding(label.to_string())),
        }
    }

    /// Resolve an alias or identifier straight to a codec.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::for_label(resolve(name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Codec::Cp437 => "IBM437",
            Codec::Standard(encoding) => encoding.name(),
        }
    }

    /// Decode `raw` strictly; any malformed sequence is an error.
    pub fn decode(&self, raw: &[u8]) -> Result<String> {
        match *self {
            Codec::Cp437 => Ok(decode_cp437(raw)),
            Codec::Standard(encoding) => encoding
                .decode_without_bom_handling_and_without_replacement(raw)
                .map(Cow::into_owned)
                .ok_or_else(|| Error::Decode {
                    raw: raw.to_vec(),
                    codec: self.name(),
                }),
        }
    }

    /// Encode `text`, failing if any character has no representation.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let unmappable = || Error::PasswordEncode { codec: self.name() };

        match *self {
            Codec::Cp437 => text
                .chars()
                .map(encode_cp437)
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(unmappable),
            // encoding_rs only ever emits UTF-8 for the UTF-16 family.
            Codec::Standard(encoding) if encoding == encoding_rs::UTF_16LE => {
                Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect())
            }
            Codec::Standard(encoding) if encoding == encoding_rs::UTF_16BE => {
                Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect())
            }
            Codec::Standard(encoding) => {
                let (bytes, _, had_unmappable) = encoding.encode(text);
                if had_unmappable {
                    Err(unmappable())
                } else {
                    Ok(bytes.into_owned())
                }
            }
        }
    }
}

/// Code page 437 maps every byte, so decoding cannot fail.
pub fn decode_cp437(raw: &[u8]) -> String {
    raw.iter()
        .map(|&b| {
            if b < 0x80 {
                b as char
            } else {
                CP437_HIGH[(b - 0x80) as usize]
            }
        })
        .collect()
}

fn encode_cp437(c: char) -> Option<u8> {
    if c.is_ascii() {
        return Some(c as u8);
    }
    CP437_HIGH
        .iter()
        .position(|&high| high == c)
        .map(|i| 0x80 + i as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_documented_codecs() {
        assert_eq!(resolve("japanese"), "cp932");
        assert_eq!(resolve("jp"), "cp932");
        assert_eq!(resolve("chinese_1"), "gb18030");
        assert_eq!(resolve("ch1"), "gb18030");
        assert_eq!(resolve("chinese_2"), "gbk");
        assert_eq!(resolve("ch2"), "gbk");
        assert_eq!(ALIASES.len(), 6);
    }

    #[test]
    fn unknown_names_pass_through() {
        assert_eq!(resolve("utf-8"), "utf-8");
        assert_eq!(resolve("JP"), "JP");
        assert_eq!(resolve("not-a-codec"), "not-a-codec");
    }

    #[test]
    fn every_alias_is_a_valid_codec() {
        for alias in ALIASES.keys() {
            assert!(Codec::from_name(alias).is_ok(), "{alias}");
        }
        assert_eq!(
            Codec::from_name("jp").unwrap(),
            Codec::Standard(encoding_rs::SHIFT_JIS)
        );
        assert_eq!(
            Codec::from_name("ch1").unwrap(),
            Codec::Standard(encoding_rs::GB18030)
        );
        assert_eq!(
            Codec::from_name("ch2").unwrap(),
            Codec::Standard(encoding_rs::GBK)
        );
    }

    #[test]
    fn label_spellings() {
        assert_eq!(Codec::for_label("UTF_8").unwrap(), Codec::Standard(encoding_rs::UTF_8));
        assert_eq!(Codec::for_label("euc_jp").unwrap(), Codec::Standard(encoding_rs::EUC_JP));
        assert_eq!(Codec::for_label("CP949").unwrap(), Codec::Standard(encoding_rs::EUC_KR));
        assert_eq!(Codec::for_label("cp1252").unwrap(), Codec::Standard(encoding_rs::WINDOWS_1252));
        assert_eq!(Codec::for_label("utf_16_le").unwrap(), Codec::Standard(encoding_rs::UTF_16LE));
        assert_eq!(Codec::for_label("cp437").unwrap(), Codec::Cp437);
        assert_eq!(Codec::for_label("IBM437").unwrap(), Codec::Cp437);
    }

    #[test]
    fn invalid_codecs_are_rejected() {
        for label in ["not-a-codec", "", "replacement", "iso-2022-kr"] {
            assert!(
                matches!(Codec::for_label(label), Err(Error::UnknownEncoding(_))),
                "{label:?}"
            );
        }
    }

    #[test]
    fn decodes_shift_jis_name() {
        // "日本語.txt" in cp932
        let raw = b"\x93\xfa\x96\x7b\x8c\xea.txt";
        assert_eq!(Codec::from_name("jp").unwrap().decode(raw).unwrap(), "日本語.txt");
    }

    #[test]
    fn decodes_gbk_name() {
        // "中文" in GBK
        let raw = b"\xd6\xd0\xce\xc4";
        assert_eq!(Codec::from_name("ch2").unwrap().decode(raw).unwrap(), "中文");
        assert_eq!(Codec::from_name("ch1").unwrap().decode(raw).unwrap(), "中文");
    }

    #[test]
    fn strict_decode_reports_malformed_bytes() {
        let err = Codec::from_name("utf-8").unwrap().decode(b"\xff\xfe").unwrap_err();
        assert!(matches!(err, Error::Decode { codec: "UTF-8", .. }));
    }

    #[test]
    fn cp437_covers_every_byte() {
        let all: Vec<u8> = (0..=255).collect();
        let text = decode_cp437(&all);
        assert_eq!(text.chars().count(), 256);
        assert_eq!(Codec::Cp437.encode(&text).unwrap(), all);
        assert_eq!(decode_cp437(b"\x81ber"), "über");
    }

    #[test]
    fn encodes_passwords() {
        let jp = Codec::from_name("jp").unwrap();
        assert_eq!(jp.encode("日本").unwrap(), b"\x93\xfa\x96\x7b");
        assert_eq!(jp.encode("1234").unwrap(), b"1234");

        let utf16 = Codec::for_label("utf-16le").unwrap();
        assert_eq!(utf16.encode("ab").unwrap(), b"a\0b\0");

        assert!(matches!(
            Codec::Cp437.encode("日本"),
            Err(Error::PasswordEncode { codec: "IBM437" })
        ));
        assert!(matches!(
            jp.encode("\u{1F600}"),
            Err(Error::PasswordEncode { .. })
        ));
    }
}
