//! HTML entity escape/unescape.
//!
//! Contract:
//! - `escape_entities` replaces every character that has a named HTML 4.01
//!   entity with `&name;` and leaves everything else untouched.
//! - `unescape_entities` is intentionally *not* its strict inverse. In
//!   [`UnescapeMode::Default`] it matches possibly-unterminated named
//!   references greedily against the ISO-8859-1 table, the way browsers do on
//!   non-markup text (`&pounda` → `£a`). In [`UnescapeMode::Attribute`] only a
//!   well-formed full reference decodes (`&pounda` stays put), because greedy
//!   matching inside attribute values corrupts URLs.
//! - Numeric references (`&#215;`, `&#xD7;`) decode in both modes when the
//!   value is nonzero, below `0xFFFF`, and a valid scalar. Hex references
//!   require the terminating `;`; decimal references do not. Malformed or
//!   out-of-range numerics are left unchanged.

use std::collections::HashMap;
use std::sync::LazyLock;

use memchr::memchr;

/// ISO 8859-1 character entities. These are the only names eligible for
/// greedy prefix matching in [`UnescapeMode::Default`].
const BASIC_ENTITIES: &[(&str, u16)] = &[
    ("nbsp", 160),
    ("iexcl", 161),
    ("cent", 162),
    ("pound", 163),
    ("curren", 164),
    ("yen", 165),
    ("brvbar", 166),
    ("sect", 167),
    ("uml", 168),
    ("copy", 169),
    ("ordf", 170),
    ("laquo", 171),
    ("not", 172),
    ("shy", 173),
    ("reg", 174),
    ("macr", 175),
    ("deg", 176),
    ("plusmn", 177),
    ("sup2", 178),
    ("sup3", 179),
    ("acute", 180),
    ("micro", 181),
    ("para", 182),
    ("middot", 183),
    ("cedil", 184),
    ("sup1", 185),
    ("ordm", 186),
    ("raquo", 187),
    ("frac14", 188),
    ("frac12", 189),
    ("frac34", 190),
    ("iquest", 191),
    ("Agrave", 192),
    ("Aacute", 193),
    ("Acirc", 194),
    ("Atilde", 195),
    ("Auml", 196),
    ("Aring", 197),
    ("AElig", 198),
    ("Ccedil", 199),
    ("Egrave", 200),
    ("Eacute", 201),
    ("Ecirc", 202),
    ("Euml", 203),
    ("Igrave", 204),
    ("Iacute", 205),
    ("Icirc", 206),
    ("Iuml", 207),
    ("ETH", 208),
    ("Ntilde", 209),
    ("Ograve", 210),
    ("Oacute", 211),
    ("Ocirc", 212),
    ("Otilde", 213),
    ("Ouml", 214),
    ("times", 215),
    ("Oslash", 216),
    ("Ugrave", 217),
    ("Uacute", 218),
    ("Ucirc", 219),
    ("Uuml", 220),
    ("Yacute", 221),
    ("THORN", 222),
    ("szlig", 223),
    ("agrave", 224),
    ("aacute", 225),
    ("acirc", 226),
    ("atilde", 227),
    ("auml", 228),
    ("aring", 229),
    ("aelig", 230),
    ("ccedil", 231),
    ("egrave", 232),
    ("eacute", 233),
    ("ecirc", 234),
    ("euml", 235),
    ("igrave", 236),
    ("iacute", 237),
    ("icirc", 238),
    ("iuml", 239),
    ("eth", 240),
    ("ntilde", 241),
    ("ograve", 242),
    ("oacute", 243),
    ("ocirc", 244),
    ("otilde", 245),
    ("ouml", 246),
    ("divide", 247),
    ("oslash", 248),
    ("ugrave", 249),
    ("uacute", 250),
    ("ucirc", 251),
    ("uuml", 252),
    ("yacute", 253),
    ("thorn", 254),
    ("yuml", 255),
];

/// Symbols, Greek letters, markup-significant and i18n entities. Together
/// with [`BASIC_ENTITIES`] these form the full HTML 4.01 table.
const EXTENDED_ENTITIES: &[(&str, u16)] = &[
    ("fnof", 402),
    ("Alpha", 913),
    ("Beta", 914),
    ("Gamma", 915),
    ("Delta", 916),
    ("Epsilon", 917),
    ("Zeta", 918),
    ("Eta", 919),
    ("Theta", 920),
    ("Iota", 921),
    ("Kappa", 922),
    ("Lambda", 923),
    ("Mu", 924),
    ("Nu", 925),
    ("Xi", 926),
    ("Omicron", 927),
    ("Pi", 928),
    ("Rho", 929),
    ("Sigma", 931),
    ("Tau", 932),
    ("Upsilon", 933),
    ("Phi", 934),
    ("Chi", 935),
    ("Psi", 936),
    ("Omega", 937),
    ("alpha", 945),
    ("beta", 946),
    ("gamma", 947),
    ("delta", 948),
    ("epsilon", 949),
    ("zeta", 950),
    ("eta", 951),
    ("theta", 952),
    ("iota", 953),
    ("kappa", 954),
    ("lambda", 955),
    ("mu", 956),
    ("nu", 957),
    ("xi", 958),
    ("omicron", 959),
    ("pi", 960),
    ("rho", 961),
    ("sigmaf", 962),
    ("sigma", 963),
    ("tau", 964),
    ("upsilon", 965),
    ("phi", 966),
    ("chi", 967),
    ("psi", 968),
    ("omega", 969),
    ("thetasym", 977),
    ("upsih", 978),
    ("piv", 982),
    ("bull", 8226),
    ("hellip", 8230),
    ("prime", 8242),
    ("Prime", 8243),
    ("oline", 8254),
    ("frasl", 8260),
    ("weierp", 8472),
    ("image", 8465),
    ("real", 8476),
    ("trade", 8482),
    ("alefsym", 8501),
    ("larr", 8592),
    ("uarr", 8593),
    ("rarr", 8594),
    ("darr", 8595),
    ("harr", 8596),
    ("crarr", 8629),
    ("lArr", 8656),
    ("uArr", 8657),
    ("rArr", 8658),
    ("dArr", 8659),
    ("hArr", 8660),
    ("forall", 8704),
    ("part", 8706),
    ("exist", 8707),
    ("empty", 8709),
    ("nabla", 8711),
    ("isin", 8712),
    ("notin", 8713),
    ("ni", 8715),
    ("prod", 8719),
    ("sum", 8721),
    ("minus", 8722),
    ("lowast", 8727),
    ("radic", 8730),
    ("prop", 8733),
    ("infin", 8734),
    ("ang", 8736),
    ("and", 8743),
    ("or", 8744),
    ("cap", 8745),
    ("cup", 8746),
    ("int", 8747),
    ("there4", 8756),
    ("sim", 8764),
    ("cong", 8773),
    ("asymp", 8776),
    ("ne", 8800),
    ("equiv", 8801),
    ("le", 8804),
    ("ge", 8805),
    ("sub", 8834),
    ("sup", 8835),
    ("nsub", 8836),
    ("sube", 8838),
    ("supe", 8839),
    ("oplus", 8853),
    ("otimes", 8855),
    ("perp", 8869),
    ("sdot", 8901),
    ("lceil", 8968),
    ("rceil", 8969),
    ("lfloor", 8970),
    ("rfloor", 8971),
    ("lang", 9001),
    ("rang", 9002),
    ("loz", 9674),
    ("spades", 9824),
    ("clubs", 9827),
    ("hearts", 9829),
    ("diams", 9830),
    ("quot", 34),
    ("amp", 38),
    ("lt", 60),
    ("gt", 62),
    ("OElig", 338),
    ("oelig", 339),
    ("Scaron", 352),
    ("scaron", 353),
    ("Yuml", 376),
    ("circ", 710),
    ("tilde", 732),
    ("ensp", 8194),
    ("emsp", 8195),
    ("thinsp", 8201),
    ("zwnj", 8204),
    ("zwj", 8205),
    ("lrm", 8206),
    ("rlm", 8207),
    ("ndash", 8211),
    ("mdash", 8212),
    ("lsquo", 8216),
    ("rsquo", 8217),
    ("sbquo", 8218),
    ("ldquo", 8220),
    ("rdquo", 8221),
    ("bdquo", 8222),
    ("dagger", 8224),
    ("Dagger", 8225),
    ("permil", 8240),
    ("lsaquo", 8249),
    ("rsaquo", 8250),
    ("euro", 8364),
];

// Write-once lookup tables, populated on first use and immutable afterwards.
static BASIC_BY_NAME: LazyLock<HashMap<&'static str, char>> = LazyLock::new(|| {
    BASIC_ENTITIES
        .iter()
        .filter_map(|&(name, code)| char::from_u32(u32::from(code)).map(|c| (name, c)))
        .collect()
});

static FULL_BY_NAME: LazyLock<HashMap<&'static str, char>> = LazyLock::new(|| {
    BASIC_ENTITIES
        .iter()
        .chain(EXTENDED_ENTITIES)
        .filter_map(|&(name, code)| char::from_u32(u32::from(code)).map(|c| (name, c)))
        .collect()
});

static NAME_BY_CHAR: LazyLock<HashMap<char, &'static str>> = LazyLock::new(|| {
    BASIC_ENTITIES
        .iter()
        .chain(EXTENDED_ENTITIES)
        .filter_map(|&(name, code)| char::from_u32(u32::from(code)).map(|c| (c, name)))
        .collect()
});

/// Controls named-reference matching in [`unescape_entities`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnescapeMode {
    /// Greedy, browser-like matching of possibly-unterminated references.
    Default,
    /// Strict matching: only a well-formed full reference decodes. Use for
    /// attribute values, where greedy matching corrupts URLs.
    Attribute,
}

/// Longest entity name is 8 chars ("thetasym"); the original scanner caps the
/// candidate run at 11 chars after the `&`.
const MAX_REF_LEN: usize = 11;

/// Numeric references decode only below this bound.
const NUMERIC_LIMIT: u32 = 0xFFFF;

/// Returns the named entity for `c`, without delimiters, if one exists.
pub fn entity_name(c: char) -> Option<&'static str> {
    NAME_BY_CHAR.get(&c).copied()
}

/// Resolves an entity name to its character. `basic_only` restricts the
/// lookup to the ISO-8859-1 table.
fn entity_code(name: &str, basic_only: bool) -> Option<char> {
    if basic_only {
        BASIC_BY_NAME.get(name).copied()
    } else {
        FULL_BY_NAME.get(name).copied()
    }
}

/// Replaces every character that has a named entity with `&name;`.
pub fn escape_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match entity_name(c) {
            Some(name) => {
                out.push('&');
                out.push_str(name);
                out.push(';');
            }
            None => out.push(c),
        }
    }
    out
}

/// Decodes a single reference body (the part between `&` and `;`), e.g.
/// `"amp"` or `"#x2014"`. Returns `None` for anything unrecognized.
pub fn decode_entity_reference(charref: &str) -> Option<char> {
    if let Some(c) = entity_code(charref, false) {
        return Some(c);
    }
    let digits = charref.strip_prefix('#')?;
    let value = if let Some(hex) = digits.strip_prefix(['x', 'X']) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    if value == 0 || value >= NUMERIC_LIMIT {
        return None;
    }
    char::from_u32(value)
}

/// Approximate inverse of [`escape_entities`]; see the module docs for the
/// deliberate Default/Attribute asymmetry.
pub fn unescape_entities(html: &str, mode: UnescapeMode) -> String {
    let bytes = html.as_bytes();
    // Fast path: no ampersand, nothing can decode.
    if memchr(b'&', bytes).is_none() {
        return html.to_string();
    }

    let len = bytes.len();
    let mut out = String::with_capacity(len);
    let mut i = 0;
    let mut copy_start = 0;

    while i < len {
        if bytes[i] != b'&' {
            i += 1;
            continue;
        }

        let Some(step) = decode_reference_at(html, i, mode) else {
            i += 1;
            continue;
        };

        // Flush bytes up to '&' unchanged (preserves UTF-8).
        if copy_start < i {
            out.push_str(&html[copy_start..i]);
        }
        out.push(step.decoded);
        i = step.next;
        copy_start = i;
    }

    if copy_start < len {
        out.push_str(&html[copy_start..]);
    }
    out
}

struct Decoded {
    decoded: char,
    /// Byte index just past the consumed reference.
    next: usize,
}

/// Attempts to decode a reference starting at the `&` at byte `i`. Fails open:
/// `None` means the `&` is ordinary text.
fn decode_reference_at(html: &str, i: usize, mode: UnescapeMode) -> Option<Decoded> {
    let bytes = html.as_bytes();
    let len = bytes.len();
    debug_assert_eq!(bytes[i], b'&');

    let c1 = *bytes.get(i + 1)?;
    if c1 == b'#' {
        return decode_numeric_at(html, i);
    }

    // Candidate name: a bounded run of ASCII alphanumerics after the '&'.
    let end = len.min(i + 1 + MAX_REF_LEN);
    let mut j = i + 1;
    while j < end && bytes[j].is_ascii_alphanumeric() {
        j += 1;
    }
    let entity_ref = &html[i + 1..j];
    if entity_ref.is_empty() {
        return None;
    }

    let (decoded, used) = match mode {
        UnescapeMode::Default => {
            // Greedy prefix match against the basic table first: "&pounda"
            // decodes its "pound" prefix even with no semicolon in sight.
            let prefix_hit = (1..entity_ref.len())
                .find_map(|k| entity_code(&entity_ref[..k], true).map(|c| (c, k)));
            match prefix_hit {
                Some(hit) => hit,
                None => (entity_code(entity_ref, false)?, entity_ref.len()),
            }
        }
        UnescapeMode::Attribute => (entity_code(entity_ref, false)?, entity_ref.len()),
    };

    let mut next = i + 1 + used;
    if bytes.get(next) == Some(&b';') {
        next += 1;
    }
    Some(Decoded { decoded, next })
}

fn decode_numeric_at(html: &str, i: usize) -> Option<Decoded> {
    let bytes = html.as_bytes();
    let len = bytes.len();
    let c2 = *bytes.get(i + 2)?;

    if c2 == b'x' || c2 == b'X' {
        // Hex references must be semicolon-terminated.
        let mut value: u32 = 0;
        let mut j = i + 3;
        while j < len {
            let Some(hex) = (bytes[j] as char).to_digit(16) else {
                break;
            };
            value = value.saturating_mul(16).saturating_add(hex);
            j += 1;
        }
        if j == i + 3 || bytes.get(j) != Some(&b';') {
            return None;
        }
        if value == 0 || value >= NUMERIC_LIMIT {
            return None;
        }
        let decoded = char::from_u32(value)?;
        Some(Decoded { decoded, next: j + 1 })
    } else if c2.is_ascii_digit() {
        // Decimal references decode even without the semicolon.
        let mut value: u32 = 0;
        let mut j = i + 2;
        while j < len && bytes[j].is_ascii_digit() {
            value = value
                .saturating_mul(10)
                .saturating_add(u32::from(bytes[j] - b'0'));
            j += 1;
        }
        let mut next = j;
        if bytes.get(j) == Some(&b';') {
            next += 1;
        }
        if value == 0 || value >= NUMERIC_LIMIT {
            return None;
        }
        let decoded = char::from_u32(value)?;
        Some(Decoded { decoded, next })
    } else {
        None
    }
}
