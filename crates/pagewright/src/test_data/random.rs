//! Random value generators behind the placeholder tokens.

use rand::{Rng, RngCore};

const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const NON_ZERO_DIGITS: &str = "123456789";
const SPECIAL_SYMBOLS: &str = "~`@#$%^&*()_+!;%:?*";
const NOT_ENGLISH: &str = "¿ÀÁÂÃÄÅÆÇÈÉÊËÌÍÎÏÐÑÓÔÕÖ×ØÙÚÛÜÝÞßàáâãäåæçèéêëìíîïðñòóôõö÷øùúûüýÿ\
АБВГДЕЁЖЗИЙКЛМНОПРСТУФХЦЧШЩЪЫЬЭЮЯабвгдеёжзийклмнопрстуфхцчшщъыьэюя";

/// Character set of a generated string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    Alphabetical,
    Alphanumeric,
    /// Digits, never starting with `0`
    Numeric,
    SpecialSymbols,
    Spaces,
    AlphanumericWithSpecialSymbols,
    /// Latin-1 letters and Cyrillic; not reachable from a token
    NotEnglish,
}

impl StringKind {
    /// Kinds that have a `<...String(N)>` token
    pub const TOKEN_KINDS: [Self; 6] = [
        Self::Alphabetical,
        Self::Alphanumeric,
        Self::Numeric,
        Self::SpecialSymbols,
        Self::Spaces,
        Self::AlphanumericWithSpecialSymbols,
    ];

    /// Name used inside the placeholder token
    #[must_use]
    pub const fn token_name(self) -> &'static str {
        match self {
            Self::Alphabetical => "AlphabeticalString",
            Self::Alphanumeric => "AlphanumericString",
            Self::Numeric => "NumericString",
            Self::SpecialSymbols => "SpecialSymbolsString",
            Self::Spaces => "SpacesString",
            Self::AlphanumericWithSpecialSymbols => "AlphanumericStringWithSpecialSymbols",
            Self::NotEnglish => "NotEnglishString",
        }
    }

    /// Every character a string of this kind may contain
    #[must_use]
    pub fn charset(self) -> Vec<char> {
        let parts: &[&str] = match self {
            Self::Alphabetical => &[LOWER, UPPER],
            Self::Alphanumeric => &[LOWER, UPPER, DIGITS],
            Self::Numeric => &[DIGITS],
            Self::SpecialSymbols => &[SPECIAL_SYMBOLS],
            Self::Spaces => &[" "],
            Self::AlphanumericWithSpecialSymbols => &[LOWER, UPPER, DIGITS, SPECIAL_SYMBOLS],
            Self::NotEnglish => &[NOT_ENGLISH],
        };
        parts.iter().flat_map(|part| part.chars()).collect()
    }
}

/// `len` random characters of `kind`
pub fn random_string(rng: &mut dyn RngCore, kind: StringKind, len: usize) -> String {
    let charset = kind.charset();
    let mut out = String::with_capacity(len);
    for i in 0..len {
        if kind == StringKind::Numeric && i == 0 {
            out.push(pick(rng, &NON_ZERO_DIGITS.chars().collect::<Vec<_>>()));
        } else {
            out.push(pick(rng, &charset));
        }
    }
    out
}

fn pick(rng: &mut dyn RngCore, chars: &[char]) -> char {
    chars[rng.gen_range(0..chars.len())]
}

/// Decimal with an integer part in `min..=max` and a two-digit fraction.
///
/// Returns `None` when `min > max`.
pub fn random_decimal(rng: &mut dyn RngCore, min: u64, max: u64) -> Option<String> {
    if min > max {
        return None;
    }
    let integer = rng.gen_range(min..=max);
    let fraction = rng.gen_range(0..100u32);
    Some(format!("{integer}.{fraction:02}"))
}
