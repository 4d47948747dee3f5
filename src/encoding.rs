//! Text encoding detection for log files that carry no declared charset.
//!
//! Detection first looks for a byte-order-mark. Without one, a byte-level
//! heuristic separates UTF-16 padded ASCII, plain ASCII, ISO-2022-JP, and
//! scores the remaining bytes as UTF-8, Shift_JIS and EUC-JP. Ties between the
//! scores are resolved by a fixed preference: EUC-JP, then UTF-8, then
//! Shift_JIS, then binary.

use encoding_rs::{EUC_JP, ISO_2022_JP, SHIFT_JIS, UTF_8, UTF_16BE, UTF_16LE};
use std::fmt;

const ESC: u8 = 0x1B;

const UTF32LE_BOM: [u8; 4] = [0xFF, 0xFE, 0x00, 0x00];

/// Escape sequences (without the leading ESC) that switch ISO-2022-JP
/// character sets.
const JIS_ESCAPES: [&[u8]; 10] = [
    b"$@", b"$B", b"$(D", b"$(O", b"$(Q", b"$(P", b"&@", b"(J", b"(I", b"(B",
];

/// A text encoding a log file can be decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    Ascii,
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    ShiftJis,
    EucJp,
    Iso2022Jp,
}

impl TextEncoding {
    /// Label used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Ascii => "us-ascii",
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
            TextEncoding::Utf32Le => "utf-32le",
            TextEncoding::ShiftJis => "shift_jis",
            TextEncoding::EucJp => "euc-jp",
            TextEncoding::Iso2022Jp => "iso-2022-jp",
        }
    }

    /// Decodes `bytes` into text, stripping a leading BOM that belongs to this
    /// encoding. Malformed sequences become U+FFFD.
    pub fn decode(self, bytes: &[u8]) -> String {
        let encoding = match self {
            // Detection only yields ASCII for bytes below 0x7F; anything the
            // writer appends later is treated as UTF-8.
            TextEncoding::Ascii => return String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Utf32Le => return decode_utf32le(bytes),
            TextEncoding::Utf8 => UTF_8,
            TextEncoding::Utf16Le => UTF_16LE,
            TextEncoding::Utf16Be => UTF_16BE,
            TextEncoding::ShiftJis => SHIFT_JIS,
            TextEncoding::EucJp => EUC_JP,
            TextEncoding::Iso2022Jp => ISO_2022_JP,
        };

        let (text, _had_errors) = encoding.decode_with_bom_removal(bytes);
        text.into_owned()
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw outcome of the byte classifier, before it is mapped to a decodable
/// [`TextEncoding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharCode {
    Ascii,
    Binary,
    EucJp,
    Jis,
    ShiftJis,
    Utf32Le,
    Utf32Be,
    Utf16Le,
    Utf16Be,
    /// UTF-8 recognised from its content.
    Utf8,
    /// UTF-8 announced by a BOM.
    Utf8Bom,
}

impl CharCode {
    /// Maps the classification to a decodable encoding. Binary data and
    /// big-endian UTF-32 have none.
    pub fn encoding(self) -> Option<TextEncoding> {
        match self {
            CharCode::Ascii => Some(TextEncoding::Ascii),
            CharCode::EucJp => Some(TextEncoding::EucJp),
            CharCode::Jis => Some(TextEncoding::Iso2022Jp),
            CharCode::ShiftJis => Some(TextEncoding::ShiftJis),
            CharCode::Utf8 | CharCode::Utf8Bom => Some(TextEncoding::Utf8),
            CharCode::Utf16Le => Some(TextEncoding::Utf16Le),
            CharCode::Utf16Be => Some(TextEncoding::Utf16Be),
            CharCode::Utf32Le => Some(TextEncoding::Utf32Le),
            CharCode::Utf32Be | CharCode::Binary => None,
        }
    }
}

/// Detects the encoding of `data`, or `None` when it cannot be read as text.
pub fn detect(data: &[u8]) -> Option<TextEncoding> {
    detect_char_code(data).encoding()
}

/// Classifies `data`, trusting a byte-order-mark when one is present.
pub fn detect_char_code(data: &[u8]) -> CharCode {
    detect_bom(data).unwrap_or_else(|| detect_without_bom(data))
}

fn detect_bom(data: &[u8]) -> Option<CharCode> {
    match data {
        [0xFF, 0xFE, 0x00, 0x00, ..] => Some(CharCode::Utf32Le),
        [0x00, 0x00, 0xFE, 0xFF, ..] => Some(CharCode::Utf32Be),
        [0xFF, 0xFE, ..] => Some(CharCode::Utf16Le),
        [0xFE, 0xFF, ..] => Some(CharCode::Utf16Be),
        [0xEF, 0xBB, 0xBF, ..] => Some(CharCode::Utf8Bom),
        _ => None,
    }
}

fn detect_without_bom(data: &[u8]) -> CharCode {
    if data.len() % 2 == 0 {
        // An empty buffer counts as big-endian padded ASCII.
        if data.first().is_none_or(|&b| b == 0x00) {
            return padded_ascii(data, Endian::Big);
        }
        if data[1] == 0x00 {
            return padded_ascii(data, Endian::Little);
        }
    }

    let (ascii_len, jis_escapes) = scan_ascii(data);
    if ascii_len == data.len() {
        return if jis_escapes > 0 {
            CharCode::Jis
        } else {
            CharCode::Ascii
        };
    }

    let rest = &data[ascii_len..];
    let Some(utf8) = utf8_score(rest) else {
        return CharCode::Binary;
    };
    let sjis = shift_jis_score(rest);
    let euc = euc_jp_score(rest);

    if euc > sjis && euc > utf8 {
        CharCode::EucJp
    } else if utf8 > sjis {
        CharCode::Utf8
    } else if sjis > -1 {
        CharCode::ShiftJis
    } else {
        CharCode::Binary
    }
}

#[derive(Clone, Copy)]
enum Endian {
    Big,
    Little,
}

/// UTF-16 without a BOM is only recognised when every code unit is ASCII.
fn padded_ascii(data: &[u8], endian: Endian) -> CharCode {
    let printable = |b: u8| (0x06..0x7F).contains(&b);

    let all_padded = data.chunks_exact(2).all(|unit| match endian {
        Endian::Big => unit[0] == 0x00 && printable(unit[1]),
        Endian::Little => printable(unit[0]) && unit[1] == 0x00,
    });

    match (all_padded, endian) {
        (false, _) => CharCode::Binary,
        (true, Endian::Big) => CharCode::Utf16Be,
        (true, Endian::Little) => CharCode::Utf16Le,
    }
}

/// Consumes the leading 7-bit run, stepping over ISO-2022-JP escapes.
/// Returns the length consumed and the number of escapes seen.
fn scan_ascii(data: &[u8]) -> (usize, usize) {
    let mut pos = 0;
    let mut escapes = 0;

    while pos < data.len() {
        let b = data[pos];
        if b < 0x03 || b >= 0x7F {
            break;
        }
        if b == ESC {
            let tail = &data[pos + 1..];
            if let Some(seq) = JIS_ESCAPES.iter().find(|seq| tail.starts_with(seq)) {
                escapes += 1;
                pos += seq.len();
            }
        }
        pos += 1;
    }

    (pos, escapes)
}

fn is_binary_byte(b: u8) -> bool {
    b < 0x03 || b == 0x7F || b == 0xFF
}

fn is_utf8_continuation(b: u8) -> bool {
    (0x80..=0xBF).contains(&b)
}

/// Scores `rest` as UTF-8. `None` means a binary byte was found; `Some(-1)`
/// means the bytes are not valid UTF-8.
fn utf8_score(rest: &[u8]) -> Option<i32> {
    let at = |i: usize| rest.get(i).copied().unwrap_or(0);
    let mut score: i32 = 0;
    let mut prev_wide = false;
    let mut pos = 0;

    while pos < rest.len() {
        let b1 = rest[pos];
        pos += 1;

        // The binary check keeps running after the score is rejected.
        if is_binary_byte(b1) {
            return None;
        }
        if b1 < 0x80 || score < 0 {
            continue;
        }

        let b2 = at(pos);
        if !(0xC2..0xF5).contains(&b1) {
            score = -1;
        } else if b1 < 0xE0 {
            if is_utf8_continuation(b2) {
                if prev_wide {
                    score += 1;
                    prev_wide = false;
                } else {
                    score += 2;
                }
                pos += 1;
            } else {
                score = -1;
            }
        } else if b1 < 0xF0 {
            let b3 = at(pos + 1);
            if is_utf8_continuation(b2) && is_utf8_continuation(b3) {
                if prev_wide {
                    score += 4;
                } else {
                    score += 3;
                    prev_wide = true;
                }
                pos += 2;
            } else {
                score = -1;
            }
        } else {
            let b3 = at(pos + 1);
            let b4 = at(pos + 2);
            if is_utf8_continuation(b2)
                && is_utf8_continuation(b3)
                && is_utf8_continuation(b4)
            {
                if prev_wide {
                    score += 6;
                } else {
                    score += 4;
                    prev_wide = true;
                }
                pos += 3;
            } else {
                score = -1;
            }
        }
    }

    Some(score)
}

fn shift_jis_score(rest: &[u8]) -> i32 {
    let at = |i: usize| rest.get(i).copied().unwrap_or(0);
    let mut score: i32 = 0;
    let mut prev_wide = false;
    let mut pos = 0;

    while score >= 0 && pos < rest.len() {
        let b1 = rest[pos];
        pos += 1;

        if b1 < 0x80 {
            continue;
        }
        if b1 == 0x80 || b1 == 0xA0 || b1 >= 0xFD {
            score = -1;
        } else if (0x81..0xA0).contains(&b1) || b1 > 0xDF {
            let b2 = at(pos);
            if b2 < 0x40 || b2 == 0x7F || b2 > 0xFC {
                score = -1;
            } else {
                if prev_wide {
                    score += 2;
                } else {
                    score += 1;
                    prev_wide = true;
                }
                pos += 1;
            }
        } else if !prev_wide {
            // half-width katakana
            score += 1;
        } else {
            prev_wide = false;
        }
    }

    score
}

fn euc_jp_score(rest: &[u8]) -> i32 {
    let at = |i: usize| rest.get(i).copied().unwrap_or(0);
    let mut score: i32 = 0;
    let mut prev_wide = false;
    let mut pos = 0;

    while score >= 0 && pos < rest.len() {
        let b1 = rest[pos];
        pos += 1;

        if b1 < 0x80 {
            continue;
        }

        let b2 = at(pos);
        if b1 == 0x8E {
            // SS2: half-width katakana
            if !(0xA1..=0xDF).contains(&b2) {
                score = -1;
            } else {
                if prev_wide {
                    score += 1;
                    prev_wide = false;
                } else {
                    score += 2;
                }
                pos += 1;
            }
        } else if b1 == 0x8F {
            // SS3: JIS X 0212, three bytes
            if b2 < 0xA1 || (pos + 1 < rest.len() && rest[pos + 1] < 0xA1) {
                score = -1;
            } else {
                if prev_wide {
                    score += 3;
                } else {
                    score += 1;
                    prev_wide = true;
                }
                pos += 2;
            }
        } else if b1 < 0xA1 || b2 < 0xA1 {
            score = -1;
        } else {
            if prev_wide {
                score += 2;
            } else {
                score += 1;
                prev_wide = true;
            }
            pos += 1;
        }
    }

    score
}

fn decode_utf32le(bytes: &[u8]) -> String {
    let body = bytes.strip_prefix(&UTF32LE_BOM).unwrap_or(bytes);

    body.chunks(4)
        .map(|unit| match unit {
            [a, b, c, d] => char::from_u32(u32::from_le_bytes([*a, *b, *c, *d]))
                .unwrap_or(char::REPLACEMENT_CHARACTER),
            _ => char::REPLACEMENT_CHARACTER,
        })
        .collect()
}
