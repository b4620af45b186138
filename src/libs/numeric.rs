//! Radix-aware number formatting and keystroke validation.
//!
//! [`NumberField`] is the editable record behind the numeric input widget. It
//! keeps the last committed value next to the text the user is typing, so an
//! unparseable keystroke never overwrites the committed number:
//!
//! ```text
//!            unparseable keystroke
//!   Clean ─────────────────────────▶ Editing
//!     ▲                                 │
//!     └─────────────────────────────────┘
//!      parseable keystroke (commit) / host sync
//! ```
//!
//! All functions here are total: malformed input is a normal editing state,
//! not an error. Only an invalid [`NumberConfig`] is rejected.

use std::borrow::Cow;

use serde::Deserialize;
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::trace;

mod exact;

/// Digit alphabet shared by every base; base `n` uses the first `n` characters.
pub const DIGITS: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const MIN_BASE: u32 = 2;
pub const MAX_BASE: u32 = 36;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FormatMode {
    /// Positional digits in the configured base
    #[default]
    Normal,
    /// Exponential notation, e.g. `1.5e+3`
    Scientific,
}

/// Visual style of the stepper buttons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Primary,
    Secondary,
    Outline,
    Ghost,
    Danger,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NumberConfigError {
    #[error("base {0} is outside the supported range 2..=36")]
    InvalidBase(u32),
    #[error("step must be a positive finite number, got {0}")]
    InvalidStep(f64),
    #[error("bound {0} is not a finite number")]
    NonFiniteBound(f64),
    #[error("min {min} is greater than max {max}")]
    InvertedBounds { min: f64, max: f64 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseNumberError {
    #[error("nothing to parse")]
    Empty,
    #[error("base {0} is outside the supported range 2..=36")]
    UnsupportedBase(u32),
    #[error("'{0}' is not a digit in base {1}")]
    InvalidDigit(char, u32),
    #[error("'{0}' is not a finite number literal")]
    InvalidLiteral(String),
}

/// Configuration of one numeric input. Supplied by the host, immutable per render.
#[derive(Clone, Debug, PartialEq)]
pub struct NumberConfig {
    pub base: u32,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: f64,
    pub format_mode: FormatMode,
    pub variant: Variant,
    /// Show the `base N` hint next to the text (normal mode only)
    pub show_base: bool,
}

impl Default for NumberConfig {
    fn default() -> Self {
        Self {
            base: 10,
            min: None,
            max: None,
            step: 1.0,
            format_mode: FormatMode::Normal,
            variant: Variant::Primary,
            show_base: true,
        }
    }
}

impl NumberConfig {
    pub fn with_base(self, base: u32) -> Self {
        Self { base, ..self }
    }
    pub fn with_min(self, min: f64) -> Self {
        Self {
            min: Some(min),
            ..self
        }
    }
    pub fn with_max(self, max: f64) -> Self {
        Self {
            max: Some(max),
            ..self
        }
    }
    pub fn with_step(self, step: f64) -> Self {
        Self { step, ..self }
    }
    pub fn with_format_mode(self, format_mode: FormatMode) -> Self {
        Self {
            format_mode,
            ..self
        }
    }
    pub fn with_variant(self, variant: Variant) -> Self {
        Self { variant, ..self }
    }
    pub fn with_show_base(self, show_base: bool) -> Self {
        Self { show_base, ..self }
    }

    /// Reject configurations the formatting and stepping rules cannot honor.
    pub fn validate(&self) -> Result<(), NumberConfigError> {
        if !(MIN_BASE..=MAX_BASE).contains(&self.base) {
            return Err(NumberConfigError::InvalidBase(self.base));
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(NumberConfigError::InvalidStep(self.step));
        }
        for bound in [self.min, self.max].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(NumberConfigError::NonFiniteBound(bound));
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(NumberConfigError::InvertedBounds { min, max });
            }
        }
        Ok(())
    }

    /// `max(min, min(max, x))`, where a missing bound imposes no limit.
    pub fn clamp(&self, x: f64) -> f64 {
        let mut value = x;
        if let Some(max) = self.max {
            value = value.min(max);
        }
        if let Some(min) = self.min {
            value = value.max(min);
        }
        value
    }

    /// The value committed when the field is emptied.
    pub fn cleared_value(&self) -> f64 {
        self.min.unwrap_or(0.0)
    }

    pub fn format(&self, value: f64) -> String {
        match self.format_mode {
            FormatMode::Normal => format_radix(value, self.base),
            FormatMode::Scientific => format_scientific(value),
        }
    }

    pub fn sanitize(&self, raw: &str) -> String {
        match self.format_mode {
            FormatMode::Normal => sanitize_radix(raw, self.base),
            FormatMode::Scientific => sanitize_scientific(raw),
        }
    }

    pub fn parse(&self, text: &str) -> Result<f64, ParseNumberError> {
        match self.format_mode {
            FormatMode::Normal => parse_radix(text, self.base),
            FormatMode::Scientific => parse_scientific(text),
        }
    }
}

/// The characters accepted in `base`: the first `base` characters of [`DIGITS`].
///
/// `base` is clamped into `2..=36`; callers validate it beforehand.
pub fn valid_digits(base: u32) -> &'static str {
    &DIGITS[..base.clamp(MIN_BASE, MAX_BASE) as usize]
}

/// Upper-case digits of `value` in `base`, with as many fraction digits as it
/// takes to tell `value` apart from its neighbouring doubles
/// (`9.5` in base 16 -> `9.8`). Integral digits are exact at any magnitude.
pub fn format_radix(value: f64, base: u32) -> String {
    if value.is_nan() {
        return "NAN".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-INFINITY" } else { "INFINITY" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let digits = exact::format_magnitude(value, base.clamp(MIN_BASE, MAX_BASE));
    if value < 0.0 {
        format!("-{digits}")
    } else {
        digits
    }
}

/// Exponential notation with the shortest round-tripping mantissa and an
/// explicitly signed exponent (`1500.0` -> `1.5e+3`, `0.00012` -> `1.2e-4`).
pub fn format_scientific(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-Infinity" } else { "Infinity" }.to_string();
    }
    // -0.0 prints as "0e+0"
    let value = if value == 0.0 { 0.0 } else { value };

    let formatted = format!("{value:e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => formatted,
    }
}

/// Upper-case `raw`, drop characters outside the base's alphabet and strip
/// leading zeros that precede another digit.
pub fn sanitize_radix(raw: &str, base: u32) -> String {
    let digits = valid_digits(base);
    let filtered: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| digits.contains(*c))
        .collect();
    strip_leading_zeros(&filtered).to_string()
}

fn strip_leading_zeros(text: &str) -> &str {
    let trimmed = text.trim_start_matches('0');
    if trimmed.is_empty() && !text.is_empty() {
        // keep a lone zero
        &text[text.len() - 1..]
    } else {
        trimmed
    }
}

/// Upper-case `raw` and keep only `0-9`, `E`, `.`, `+` and `-`.
pub fn sanitize_scientific(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, 'E' | '.' | '+' | '-'))
        .collect()
}

/// Parse a number written in `base`, case-insensitively, with an optional
/// leading `-` and an optional `.` before fraction digits. The result is the
/// nearest double; literals too large for one are rejected.
pub fn parse_radix(text: &str, base: u32) -> Result<f64, ParseNumberError> {
    if !(MIN_BASE..=MAX_BASE).contains(&base) {
        return Err(ParseNumberError::UnsupportedBase(base));
    }
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (integral, fraction) = body.split_once('.').unwrap_or((body, ""));
    if integral.is_empty() && fraction.is_empty() {
        return Err(ParseNumberError::Empty);
    }

    let digit_values = |part: &str| {
        part.chars()
            .map(|c| c.to_digit(base).ok_or(ParseNumberError::InvalidDigit(c, base)))
            .collect::<Result<Vec<_>, _>>()
    };
    let magnitude =
        exact::parse_magnitude(&digit_values(integral)?, &digit_values(fraction)?, base);
    if !magnitude.is_finite() {
        return Err(ParseNumberError::InvalidLiteral(text.to_string()));
    }
    Ok(if negative { -magnitude } else { magnitude })
}

/// Parse a decimal float literal with an optional exponent. Overflowing
/// literals such as `1E999` are rejected.
pub fn parse_scientific(text: &str) -> Result<f64, ParseNumberError> {
    if text.is_empty() {
        return Err(ParseNumberError::Empty);
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParseNumberError::InvalidLiteral(text.to_string())),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldState {
    /// The display text is the formatted committed value
    Clean,
    /// The user typed something that does not parse yet
    Editing,
}

/// Committed value plus the pending, possibly invalid, text being edited.
#[derive(Clone, Debug, PartialEq)]
pub struct NumberField {
    config: NumberConfig,
    committed: f64,
    pending: Option<String>,
}

impl NumberField {
    pub fn new(config: NumberConfig, value: f64) -> Result<Self, NumberConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            committed: value,
            pending: None,
        })
    }

    pub fn config(&self) -> &NumberConfig {
        &self.config
    }

    pub fn value(&self) -> f64 {
        self.committed
    }

    pub fn state(&self) -> FieldState {
        if self.pending.is_some() {
            FieldState::Editing
        } else {
            FieldState::Clean
        }
    }

    pub fn display_text(&self) -> Cow<'_, str> {
        match &self.pending {
            Some(text) => Cow::Borrowed(text.as_str()),
            None => Cow::Owned(self.config.format(self.committed)),
        }
    }

    /// The host pushed a value; any in-progress edit is discarded.
    pub fn sync(&mut self, value: f64) {
        self.committed = value;
        self.pending = None;
    }

    /// Swap in a new configuration (base, bounds, mode). Discards the edit.
    pub fn reconfigure(&mut self, config: NumberConfig) -> Result<(), NumberConfigError> {
        config.validate()?;
        self.config = config;
        self.pending = None;
        Ok(())
    }

    /// Validate the full text of the field after a keystroke.
    ///
    /// Returns the value to report to the host, or `None` when the text is
    /// left uncommitted.
    pub fn input(&mut self, raw: &str) -> Option<f64> {
        let filtered = self.config.sanitize(raw);
        if filtered.is_empty() {
            return Some(self.commit(self.config.cleared_value()));
        }

        match self.config.parse(&filtered) {
            Ok(parsed) => Some(self.commit(self.config.clamp(parsed))),
            Err(err) => {
                trace!("Keeping '{}' uncommitted: {}", filtered, err);
                self.pending = Some(filtered);
                None
            }
        }
    }

    pub fn can_increment(&self) -> bool {
        self.config.max.is_none_or(|max| self.committed < max)
    }

    pub fn can_decrement(&self) -> bool {
        self.config.min.is_none_or(|min| self.committed > min)
    }

    pub fn increment(&mut self) -> Option<f64> {
        if !self.can_increment() {
            return None;
        }
        let next = self.config.clamp(self.committed + self.config.step);
        Some(self.commit(next))
    }

    pub fn decrement(&mut self) -> Option<f64> {
        if !self.can_decrement() {
            return None;
        }
        let next = self.config.clamp(self.committed - self.config.step);
        Some(self.commit(next))
    }

    fn commit(&mut self, value: f64) -> f64 {
        self.committed = value;
        self.pending = None;
        value
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn field(config: NumberConfig, value: f64) -> NumberField {
        NumberField::new(config, value).unwrap()
    }

    #[test]
    fn hex_and_binary_formatting() {
        assert_eq!(format_radix(255.0, 16), "FF");
        assert_eq!(format_radix(5.0, 2), "101");
        assert_eq!(format_radix(35.0, 36), "Z");
        assert_eq!(format_radix(0.0, 7), "0");
        assert_eq!(format_radix(-10.0, 16), "-A");
        assert_eq!(format_radix(-0.0, 10), "0");
    }

    #[test]
    fn fractions_keep_their_radix_digits() {
        assert_eq!(format_radix(9.5, 16), "9.8");
        assert_eq!(format_radix(255.5, 16), "FF.8");
        assert_eq!(format_radix(0.5, 2), "0.1");
        assert_eq!(format_radix(0.1, 16), "0.1999999999999A");
        assert_eq!(format_radix(12.9, 10), "12.9");
        assert_eq!(format_radix(-0.4, 10), "-0.4");
        assert_eq!(format_radix(2.25, 36), "2.9");

        assert_eq!(parse_radix("9.8", 16), Ok(9.5));
        assert_eq!(parse_radix("-0.1", 2), Ok(-0.5));
        assert_eq!(parse_radix(".8", 16), Ok(0.5));
        assert_eq!(parse_radix("9.", 16), Ok(9.0));
        assert_eq!(
            parse_radix("1.2.3", 10),
            Err(ParseNumberError::InvalidDigit('.', 10))
        );
        assert_eq!(parse_radix("-.", 10), Err(ParseNumberError::Empty));
    }

    #[test]
    fn huge_values_format_every_digit() {
        let text = format_radix(1e300, 10);
        assert_eq!(text.len(), 301);
        assert_eq!(text, format!("{:.0}", 1e300));
        assert_eq!(parse_radix(&text, 10), Ok(1e300));

        let max = format_radix(f64::MAX, 2);
        assert_eq!(max, format!("{}{}", "1".repeat(53), "0".repeat(971)));
        assert_eq!(parse_radix(&max, 2), Ok(f64::MAX));

        let f = field(NumberConfig::default().with_base(16), -1e300);
        assert_eq!(f.config().parse(&f.display_text()), Ok(-1e300));
    }

    #[test]
    fn overflowing_digits_are_rejected() {
        let nines = "9".repeat(400);
        assert_eq!(
            parse_radix(&nines, 10),
            Err(ParseNumberError::InvalidLiteral(nines.clone()))
        );
        assert!(parse_radix(&"Z".repeat(5000), 36).is_err());
        // one binary digit past f64::MAX
        assert!(parse_radix(&"1".repeat(1025), 2).is_err());

        let mut f = field(NumberConfig::default(), 5.0);
        assert_eq!(f.input(&nines), None);
        assert_eq!(f.state(), FieldState::Editing);
        assert_eq!(f.value(), 5.0);
    }

    #[test]
    fn radix_round_trip() {
        let values = [
            0.0,
            1.0,
            7.0,
            35.0,
            36.0,
            255.0,
            1000.0,
            65_535.0,
            123_456_789.0,
            -1.0,
            -4096.0,
            9_007_199_254_740_991.0,
            0.1,
            1.0 / 3.0,
            -2.718_281_828_459_045,
            9.5,
            1e-7,
            123_456.789,
            1e300,
            -1.7e308,
            1e-300,
            5e-324,
            f64::MAX,
            f64::MIN_POSITIVE,
        ];
        for base in MIN_BASE..=MAX_BASE {
            for value in values {
                let text = format_radix(value, base);
                assert_eq!(
                    parse_radix(&text, base),
                    Ok(value),
                    "base {base}, text {text}"
                );
            }
        }
    }

    #[test]
    fn clamp_is_idempotent() {
        let configs = [
            NumberConfig::default(),
            NumberConfig::default().with_min(-3.0),
            NumberConfig::default().with_max(7.5),
            NumberConfig::default().with_min(0.0).with_max(10.0),
            NumberConfig::default().with_min(4.0).with_max(4.0),
        ];
        for config in &configs {
            for x in [-100.0, -3.0, 0.0, 4.0, 7.5, 9.99, 10.0, 1e12] {
                let once = config.clamp(x);
                assert_eq!(config.clamp(once), once);
            }
        }
        let bounded = &configs[3];
        assert_eq!(bounded.clamp(-1.0), 0.0);
        assert_eq!(bounded.clamp(11.0), 10.0);
        assert_eq!(bounded.clamp(5.0), 5.0);
    }

    #[test]
    fn sanitizer_only_keeps_base_alphabet() {
        let noise = "0123456789abcdefghijklmnopqrstuvwxyzABCXYZ!@# -+.e_";
        for base in MIN_BASE..=MAX_BASE {
            let allowed = valid_digits(base);
            assert_eq!(allowed.len(), base as usize);
            assert!(DIGITS.starts_with(allowed));
            let cleaned = sanitize_radix(noise, base);
            assert!(
                cleaned.chars().all(|c| allowed.contains(c)),
                "base {base} let through {cleaned}"
            );
        }
        assert_eq!(sanitize_radix("1021", 2), "101");
        assert_eq!(sanitize_radix("ff-gg", 16), "FF");
    }

    #[test]
    fn leading_zeros_are_normalized() {
        assert_eq!(sanitize_radix("007", 10), "7");
        assert_eq!(sanitize_radix("0", 10), "0");
        assert_eq!(sanitize_radix("000", 10), "0");
        assert_eq!(sanitize_radix("00a", 16), "A");
        assert_eq!(sanitize_radix("100", 10), "100");
    }

    #[test]
    fn scientific_formatting_matches_exponential_notation() {
        assert_eq!(format_scientific(1500.0), "1.5e+3");
        assert_eq!(format_scientific(1.0), "1e+0");
        assert_eq!(format_scientific(0.0), "0e+0");
        assert_eq!(format_scientific(-0.0), "0e+0");
        assert_eq!(format_scientific(0.00012), "1.2e-4");
        assert_eq!(format_scientific(-250.0), "-2.5e+2");
        assert_eq!(format_scientific(123_456.0), "1.23456e+5");
    }

    #[test]
    fn scientific_parsing() {
        assert_eq!(parse_scientific("2E2"), Ok(200.0));
        assert_eq!(parse_scientific("1.5E+3"), Ok(1500.0));
        assert_eq!(parse_scientific("-4E-1"), Ok(-0.4));
        assert_eq!(parse_scientific(".5"), Ok(0.5));
        assert!(parse_scientific("1E2E3").is_err());
        assert!(parse_scientific("E").is_err());
        assert!(parse_scientific("-").is_err());
        assert!(parse_scientific("1E999").is_err());
        assert_eq!(sanitize_scientific("1.5e+3 kg!"), "1.5E+3");
    }

    #[test]
    fn invalid_configs_fail_fast() {
        let invalid = [
            (
                NumberConfig::default().with_base(1),
                NumberConfigError::InvalidBase(1),
            ),
            (
                NumberConfig::default().with_base(37),
                NumberConfigError::InvalidBase(37),
            ),
            (
                NumberConfig::default().with_step(0.0),
                NumberConfigError::InvalidStep(0.0),
            ),
            (
                NumberConfig::default().with_step(-1.0),
                NumberConfigError::InvalidStep(-1.0),
            ),
            (
                NumberConfig::default().with_min(f64::NEG_INFINITY),
                NumberConfigError::NonFiniteBound(f64::NEG_INFINITY),
            ),
            (
                NumberConfig::default().with_min(5.0).with_max(1.0),
                NumberConfigError::InvertedBounds { min: 5.0, max: 1.0 },
            ),
        ];
        for (config, expected) in invalid {
            assert_eq!(NumberField::new(config, 0.0).unwrap_err(), expected);
        }
        assert!(parse_radix("1", 40).is_err());
    }

    #[test]
    fn scenario_a_hex_display() {
        let f = field(NumberConfig::default().with_base(16), 255.0);
        assert_eq!(f.display_text(), "FF");
        assert_eq!(f.state(), FieldState::Clean);
    }

    #[test]
    fn scenario_b_binary_display() {
        let f = field(NumberConfig::default().with_base(2), 5.0);
        assert_eq!(f.display_text(), "101");
    }

    #[test]
    fn scenario_c_increment_stops_at_max() {
        let mut f = field(NumberConfig::default().with_min(0.0).with_max(10.0), 10.0);
        assert!(!f.can_increment());
        assert!(f.can_decrement());
        assert_eq!(f.increment(), None);
        assert_eq!(f.value(), 10.0);

        f.sync(9.5);
        assert_eq!(f.increment(), Some(10.0));
        assert_eq!(f.decrement(), Some(9.0));
    }

    #[test]
    fn scenario_d_clearing_commits_min() {
        let mut f = field(NumberConfig::default().with_min(3.0), 42.0);
        assert_eq!(f.input(""), Some(3.0));
        assert_eq!(f.display_text(), "3");

        let mut unbounded = field(NumberConfig::default(), 42.0);
        assert_eq!(unbounded.input("!!"), Some(0.0));
        assert_eq!(unbounded.display_text(), "0");
    }

    #[test]
    fn scenario_e_scientific_mode() {
        let mut f = field(
            NumberConfig::default().with_format_mode(FormatMode::Scientific),
            1500.0,
        );
        assert_eq!(f.display_text(), "1.5e+3");
        assert_eq!(f.input("2E2"), Some(200.0));
        assert_eq!(f.display_text(), "2e+2");
    }

    #[test]
    fn scenario_f_base36_case_and_noise() {
        let mut f = field(NumberConfig::default().with_base(36), 0.0);
        assert_eq!(f.input("g"), Some(16.0));
        assert_eq!(f.display_text(), "G");
        assert_eq!(f.input("G!"), Some(16.0));
        assert_eq!(f.display_text(), "G");
    }

    #[test]
    fn unparseable_text_stays_pending_until_sync() {
        let mut f = field(
            NumberConfig::default().with_format_mode(FormatMode::Scientific),
            1.0,
        );
        assert_eq!(f.input("1e2e"), None);
        assert_eq!(f.state(), FieldState::Editing);
        assert_eq!(f.display_text(), "1E2E");
        assert_eq!(f.value(), 1.0);

        assert_eq!(f.input("1e2"), Some(100.0));
        assert_eq!(f.state(), FieldState::Clean);

        f.input("-");
        assert_eq!(f.state(), FieldState::Editing);
        f.sync(7.0);
        assert_eq!(f.state(), FieldState::Clean);
        assert_eq!(f.display_text(), "7e+0");
    }

    #[test]
    fn typed_values_are_clamped() {
        let mut f = field(NumberConfig::default().with_min(0.0).with_max(10.0), 5.0);
        assert_eq!(f.input("99"), Some(10.0));
        assert_eq!(f.display_text(), "10");

        let mut sci = field(
            NumberConfig::default()
                .with_format_mode(FormatMode::Scientific)
                .with_min(-1.0),
            0.0,
        );
        assert_eq!(sci.input("-5E0"), Some(-1.0));
        assert_eq!(sci.display_text(), "-1e+0");
    }

    #[test]
    fn reconfigure_rederives_display() {
        let mut f = field(NumberConfig::default(), 255.0);
        f.input("25x5");
        f.reconfigure(NumberConfig::default().with_base(16)).unwrap();
        assert_eq!(f.display_text(), "FF");
        assert!(f.reconfigure(NumberConfig::default().with_base(0)).is_err());
        assert_eq!(f.config().base, 16);
    }
}
