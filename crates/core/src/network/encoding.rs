use std::borrow::Cow;

use encoding_rs::{Encoding, EUC_JP, SHIFT_JIS, UTF_8};

/// Candidate encodings, probed in order. UTF-8 goes first because its
/// validation is strict enough that a legacy file will almost never pass it.
pub const CANDIDATES: &[&Encoding] = &[UTF_8, SHIFT_JIS, EUC_JP];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode `bytes` with `encoding`, returning `None` on any malformed sequence.
pub fn decode_strict<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Option<Cow<'a, str>> {
    let body = if encoding == UTF_8 {
        bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
    } else {
        bytes
    };
    encoding.decode_without_bom_handling_and_without_replacement(body)
}
