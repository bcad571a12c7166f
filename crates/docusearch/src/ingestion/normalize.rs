//! Encoding-safe text normalization for extracted PDF text
//!
//! Extracted text is reduced to printable ASCII plus `\n` and `\t`. Common
//! typographic characters are transliterated first; anything else that cannot
//! be represented is dropped rather than failing the ingest.

/// Transliterations applied before non-ASCII characters are dropped
const TRANSLITERATIONS: &[(char, &str)] = &[
    // Hyphens and dashes
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
    ('\u{2012}', "-"),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
    ('\u{2015}', "--"),
    ('\u{2212}', "-"),
    // Quotation marks
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201A}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{201E}', "\""),
    ('\u{00AB}', "\""),
    ('\u{00BB}', "\""),
    // Bullets and symbols
    ('\u{2022}', "* "),
    ('\u{2026}', "..."),
    ('\u{00D7}', "x"),
    ('\u{00F7}', "/"),
    ('\u{00A9}', "(c)"),
    ('\u{00AE}', "(R)"),
    ('\u{2122}', "(TM)"),
    // Spaces
    ('\u{00A0}', " "),
    ('\u{2002}', " "),
    ('\u{2003}', " "),
    ('\u{2009}', " "),
    ('\u{200B}', ""),
    // Ligatures
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    // Latin letters that show up in author names
    ('\u{0131}', "i"),
    ('\u{0152}', "OE"),
    ('\u{0153}', "oe"),
    ('\u{00C6}', "AE"),
    ('\u{00E6}', "ae"),
    ('\u{00DF}', "ss"),
];

/// Normalize text so it is safe for any ASCII-only transport
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '\n' | '\t' => out.push(c),
            '\r' => {}
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => {
                if let Some((_, replacement)) = TRANSLITERATIONS.iter().find(|(from, _)| *from == c) {
                    out.push_str(replacement);
                } else if let Some(base) = strip_accent(c) {
                    out.push(base);
                }
            }
        }
    }

    out
}

/// Base letter for common accented Latin-1 characters
fn strip_accent(c: char) -> Option<char> {
    let base = match c {
        'À'..='Å' => 'A',
        'à'..='å' => 'a',
        'Ç' => 'C',
        'ç' => 'c',
        'È'..='Ë' => 'E',
        'è'..='ë' => 'e',
        'Ì'..='Ï' => 'I',
        'ì'..='ï' => 'i',
        'Ñ' => 'N',
        'ñ' => 'n',
        'Ò'..='Ö' | 'Ø' => 'O',
        'ò'..='ö' | 'ø' => 'o',
        'Ù'..='Ü' => 'U',
        'ù'..='ü' => 'u',
        'Ý' => 'Y',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(base)
}
