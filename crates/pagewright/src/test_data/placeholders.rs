//! Placeholder substitution for test-data fixtures.
//!
//! Tokens are matched case-insensitively and replaced textually, before the
//! fixture is parsed as JSON. Replacers run in a fixed order:
//!
//! 1. string length: `<AlphabeticalString(8)>`, `<NumericString(4)>`, ...
//! 2. date arithmetic: `<DateTime.Now(yyyy-MM-dd) + 3 days - 1 month>`
//! 3. GUIDs: `<GuidNew>`, `<GuidEmpty>`
//! 4. numeric range: `<Decimal(10,20)>`
//!
//! Every string, date and decimal token gets its own value. All `<GuidNew>`
//! tokens in one text share a single GUID.

use super::random::{random_decimal, random_string, StringKind};
use chrono::{Days, Local, Months, NaiveDate, NaiveDateTime, TimeDelta};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use regex::{Captures, Regex};
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{debug, warn};
use uuid::{Builder, Uuid};

const DEFAULT_DATE_FORMAT: &str = "yyyy-MM-dd";

// =============================================================================
// Clock
// =============================================================================

/// Source of "now" for date tokens
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(NaiveDateTime);

impl FixedClock {
    #[must_use]
    pub const fn new(now: NaiveDateTime) -> Self {
        Self(now)
    }

    /// Midnight of the given date, `None` for an invalid date
    #[must_use]
    pub fn at_date(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

// =============================================================================
// Replacers
// =============================================================================

/// What a replacer may draw on while substituting
pub struct ReplaceContext<'a> {
    pub rng: &'a mut dyn RngCore,
    pub clock: &'a dyn Clock,
}

impl fmt::Debug for ReplaceContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplaceContext")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// One family of placeholder tokens
pub trait PlaceholderReplacer: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// `text` with this family's tokens substituted
    fn replace(&self, text: &str, ctx: &mut ReplaceContext<'_>) -> String;
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("placeholder pattern is valid")
}

/// `<AlphabeticalString(N)>` and the other fixed-length string tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct StringLengthReplacer;

impl StringLengthReplacer {
    fn patterns() -> &'static [(StringKind, Regex)] {
        static PATTERNS: OnceLock<Vec<(StringKind, Regex)>> = OnceLock::new();
        PATTERNS.get_or_init(|| {
            StringKind::TOKEN_KINDS
                .iter()
                .map(|&kind| {
                    let pattern = format!(r"(?i)<{}\((\d+)\)>", kind.token_name());
                    (kind, compile(&pattern))
                })
                .collect()
        })
    }
}

impl PlaceholderReplacer for StringLengthReplacer {
    fn name(&self) -> &'static str {
        "string length"
    }

    fn replace(&self, text: &str, ctx: &mut ReplaceContext<'_>) -> String {
        let mut out = text.to_string();
        for (kind, regex) in Self::patterns() {
            out = regex
                .replace_all(&out, |caps: &Captures<'_>| match caps[1].parse::<usize>() {
                    Ok(len) => random_string(ctx.rng, *kind, len),
                    Err(_) => {
                        warn!(token = &caps[0], "String length out of range, token kept");
                        caps[0].to_string()
                    }
                })
                .into_owned();
        }
        out
    }
}

/// `<DateTime.Now(format) ± N unit ...>`
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeReplacer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Period {
    Hour,
    Day,
    Month,
    Year,
}

impl DateTimeReplacer {
    fn token() -> &'static Regex {
        static TOKEN: OnceLock<Regex> = OnceLock::new();
        TOKEN.get_or_init(|| {
            compile(
                r"(?i)<DateTime\.Now\(([A-Za-z:\-\\/]*)\)((?:\s?[+\-]\s?\d+\s?(?:hour|day|month|year)s?)*)>",
            )
        })
    }

    fn offset() -> &'static Regex {
        static OFFSET: OnceLock<Regex> = OnceLock::new();
        OFFSET.get_or_init(|| compile(r"(?i)([+\-])\s?(\d+)\s?(hour|day|month|year)"))
    }

    /// `now` shifted by every offset in `offsets`, left to right
    fn shift(now: NaiveDateTime, offsets: &str) -> Option<NaiveDateTime> {
        let mut value = now;
        for caps in Self::offset().captures_iter(offsets) {
            let negative = &caps[1] == "-";
            let amount: u32 = caps[2].parse().ok()?;
            let period = match caps[3].to_ascii_lowercase().as_str() {
                "hour" => Period::Hour,
                "day" => Period::Day,
                "month" => Period::Month,
                _ => Period::Year,
            };
            value = match period {
                Period::Hour => {
                    let delta = TimeDelta::try_hours(i64::from(amount))?;
                    if negative {
                        value.checked_sub_signed(delta)?
                    } else {
                        value.checked_add_signed(delta)?
                    }
                }
                Period::Day => {
                    let days = Days::new(u64::from(amount));
                    if negative {
                        value.checked_sub_days(days)?
                    } else {
                        value.checked_add_days(days)?
                    }
                }
                Period::Month | Period::Year => {
                    let months = if period == Period::Year {
                        amount.checked_mul(12)?
                    } else {
                        amount
                    };
                    if negative {
                        value.checked_sub_months(Months::new(months))?
                    } else {
                        value.checked_add_months(Months::new(months))?
                    }
                }
            };
        }
        Some(value)
    }
}

impl PlaceholderReplacer for DateTimeReplacer {
    fn name(&self) -> &'static str {
        "date time"
    }

    fn replace(&self, text: &str, ctx: &mut ReplaceContext<'_>) -> String {
        let now = ctx.clock.now();
        Self::token()
            .replace_all(text, |caps: &Captures<'_>| {
                let format = if caps[1].is_empty() {
                    DEFAULT_DATE_FORMAT
                } else {
                    &caps[1]
                };
                match Self::shift(now, &caps[2]) {
                    Some(value) => value.format(&to_strftime(format)).to_string(),
                    None => {
                        warn!(token = &caps[0], "Date offset out of range, token kept");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }
}

/// Translate a .NET custom date format (`yyyy-MM-dd HH:mm`) to strftime
pub fn to_strftime(format: &str) -> String {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            if let Some(&next) = chars.get(i + 1) {
                push_literal(&mut out, next);
            }
            i += 2;
            continue;
        }
        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        let spec = match (c, run) {
            ('y', 1) => Some("%-y"),
            ('y', 2) => Some("%y"),
            ('y', _) => Some("%Y"),
            ('M', 1) => Some("%-m"),
            ('M', 2) => Some("%m"),
            ('M', 3) => Some("%b"),
            ('M', _) => Some("%B"),
            ('d', 1) => Some("%-d"),
            ('d', 2) => Some("%d"),
            ('d', 3) => Some("%a"),
            ('d', _) => Some("%A"),
            ('H', 1) => Some("%-H"),
            ('H', _) => Some("%H"),
            ('h', 1) => Some("%-I"),
            ('h', _) => Some("%I"),
            ('m', 1) => Some("%-M"),
            ('m', _) => Some("%M"),
            ('s', 1) => Some("%-S"),
            ('s', _) => Some("%S"),
            ('t', 1) => Some("%p"),
            ('t', _) => Some("%p"),
            _ => None,
        };
        match spec {
            Some(spec) => out.push_str(spec),
            None => {
                for _ in 0..run {
                    push_literal(&mut out, c);
                }
            }
        }
        i += run;
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// `<GuidNew>` and `<GuidEmpty>`, 32 lowercase hex digits without dashes
#[derive(Debug, Clone, Copy, Default)]
pub struct GuidReplacer;

impl GuidReplacer {
    fn patterns() -> &'static (Regex, Regex) {
        static PATTERNS: OnceLock<(Regex, Regex)> = OnceLock::new();
        PATTERNS.get_or_init(|| (compile(r"(?i)<GuidNew>"), compile(r"(?i)<GuidEmpty>")))
    }
}

impl PlaceholderReplacer for GuidReplacer {
    fn name(&self) -> &'static str {
        "guid"
    }

    fn replace(&self, text: &str, ctx: &mut ReplaceContext<'_>) -> String {
        let (new, empty) = Self::patterns();
        let mut out = text.to_string();
        if new.is_match(&out) {
            let mut bytes = [0u8; 16];
            ctx.rng.fill_bytes(&mut bytes);
            let guid = Builder::from_random_bytes(bytes)
                .into_uuid()
                .simple()
                .to_string();
            out = new.replace_all(&out, guid.as_str()).into_owned();
        }
        let nil = Uuid::nil().simple().to_string();
        empty.replace_all(&out, nil.as_str()).into_owned()
    }
}

/// `<Decimal(min,max)>`; malformed tokens are left as they are
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericRangeReplacer;

impl NumericRangeReplacer {
    fn pattern() -> &'static Regex {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        PATTERN.get_or_init(|| compile(r"(?i)<Decimal\((\d+),(\d+)\)>"))
    }
}

impl PlaceholderReplacer for NumericRangeReplacer {
    fn name(&self) -> &'static str {
        "numeric range"
    }

    fn replace(&self, text: &str, ctx: &mut ReplaceContext<'_>) -> String {
        Self::pattern()
            .replace_all(text, |caps: &Captures<'_>| {
                let bounds = caps[1].parse::<u64>().ok().zip(caps[2].parse::<u64>().ok());
                match bounds.and_then(|(min, max)| random_decimal(ctx.rng, min, max)) {
                    Some(value) => value,
                    None => {
                        warn!(token = &caps[0], "Invalid decimal range, token kept");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }
}

// =============================================================================
// Engine
// =============================================================================

/// A supported token with an example
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfo {
    pub token: &'static str,
    pub description: &'static str,
}

const CATALOGUE: &[TokenInfo] = &[
    TokenInfo {
        token: "<AlphabeticalString(8)>",
        description: "N random latin letters",
    },
    TokenInfo {
        token: "<AlphanumericString(8)>",
        description: "N random letters and digits",
    },
    TokenInfo {
        token: "<NumericString(6)>",
        description: "N random digits, never starting with 0",
    },
    TokenInfo {
        token: "<SpecialSymbolsString(5)>",
        description: "N random symbols from ~`@#$%^&*()_+!;:?",
    },
    TokenInfo {
        token: "<SpacesString(3)>",
        description: "N spaces",
    },
    TokenInfo {
        token: "<AlphanumericStringWithSpecialSymbols(10)>",
        description: "N random letters, digits and symbols",
    },
    TokenInfo {
        token: "<DateTime.Now(yyyy-MM-dd) + 3 days>",
        description: "current time shifted by hours, days, months or years",
    },
    TokenInfo {
        token: "<GuidNew>",
        description: "new GUID, shared by every occurrence in the document",
    },
    TokenInfo {
        token: "<GuidEmpty>",
        description: "all-zero GUID",
    },
    TokenInfo {
        token: "<Decimal(10,20)>",
        description: "decimal with integer part in [min, max] and two fraction digits",
    },
];

/// Ordered chain of replacers with a clock and a random source
pub struct PlaceholderEngine {
    replacers: Vec<Box<dyn PlaceholderReplacer>>,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
}

impl fmt::Debug for PlaceholderEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaceholderEngine")
            .field("replacers", &self.replacers)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl Default for PlaceholderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaceholderEngine {
    /// System clock and an entropy-seeded generator
    #[must_use]
    pub fn new() -> Self {
        Self {
            replacers: vec![
                Box::new(StringLengthReplacer),
                Box::new(DateTimeReplacer),
                Box::new(GuidReplacer),
                Box::new(NumericRangeReplacer),
            ],
            clock: Arc::new(SystemClock),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Reproducible output for a given seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Names of the replacers in the order they run
    #[must_use]
    pub fn replacer_names(&self) -> Vec<&'static str> {
        self.replacers.iter().map(|r| r.name()).collect()
    }

    /// `text` with every supported token substituted
    pub fn replace_tokens(&self, text: &str) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut ctx = ReplaceContext {
            rng: &mut *rng,
            clock: self.clock.as_ref(),
        };
        let mut out = text.to_string();
        for replacer in &self.replacers {
            let next = replacer.replace(&out, &mut ctx);
            if next != out {
                debug!(replacer = replacer.name(), "Placeholders substituted");
            }
            out = next;
        }
        out
    }

    /// Every supported token with a short description
    #[must_use]
    pub const fn catalogue() -> &'static [TokenInfo] {
        CATALOGUE
    }
}
