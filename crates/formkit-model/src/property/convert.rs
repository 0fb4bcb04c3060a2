//! Per-kind conversion of single values.

use std::fmt::Write as _;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use formkit_core::utils::text::format_message;
use formkit_core::value::{DATETIME_TRANSPORT_FORMAT, TIME_TRANSPORT_FORMAT};
use formkit_core::{Value, ValueFormat, SETTINGS};

use super::{DataProperty, PropertyKind};

/// Date/time patterns accepted on the wire, tried in order.
const DATETIME_WIRE_PATTERNS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

/// Time patterns accepted on the wire, tried in order.
const TIME_WIRE_PATTERNS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M:%S"];

impl DataProperty {
    /// Converts a single value to the given format using the rules of the
    /// property kind. Values that cannot be converted are returned as is, so
    /// the validators can report them.
    pub fn convert_value(&self, value: &Value, out: ValueFormat, input: Option<ValueFormat>) -> Value {
        let kind = self.kind();
        if kind.is_enum() {
            return self.convert_enum(value, out);
        }
        if kind.is_text() {
            return self.convert_text(value, out);
        }
        if kind.is_numeric() {
            return self.convert_number(value, out);
        }
        if kind.is_temporal() {
            return self.convert_temporal(value, out, input);
        }
        self.convert_boolean(value, out)
    }

    // ── Text ─────────────────────────────────────────────────────────

    fn convert_text(&self, value: &Value, out: ValueFormat) -> Value {
        let text = value.to_string();
        if out.is_typed() && self.kind() == PropertyKind::Guid {
            if let Ok(guid) = uuid::Uuid::parse_str(text.trim()) {
                return Value::String(guid.hyphenated().to_string());
            }
        }
        Value::String(text)
    }

    // ── Boolean ──────────────────────────────────────────────────────

    fn convert_boolean(&self, value: &Value, out: ValueFormat) -> Value {
        if out.is_string() {
            return Value::String(value.to_string());
        }
        match value {
            Value::Bool(_) => value.clone(),
            Value::Int(1) => Value::Bool(true),
            Value::Int(0) => Value::Bool(false),
            _ if self.is_value_null(value) => Value::Null,
            other => {
                let token = other.to_string().trim().to_lowercase();
                let settings = SETTINGS.get();
                if settings.true_strings.iter().any(|s| s.eq_ignore_ascii_case(&token)) {
                    Value::Bool(true)
                } else if settings.false_strings.iter().any(|s| s.eq_ignore_ascii_case(&token)) {
                    Value::Bool(false)
                } else {
                    other.clone()
                }
            }
        }
    }

    // ── Numbers ──────────────────────────────────────────────────────

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn to_number(&self, value: &Value) -> Value {
        let integral = self.kind().is_integral();
        match value {
            Value::Int(i) if !integral => Value::Decimal(*i as f64),
            Value::Int(_) => value.clone(),
            Value::Decimal(d) if integral && d.fract() == 0.0 && d.is_finite() => Value::Int(*d as i64),
            Value::Decimal(_) => value.clone(),
            _ if self.is_value_null(value) => Value::Null,
            Value::String(s) => {
                let s = s.trim();
                if integral {
                    if let Ok(i) = s.parse::<i64>() {
                        return Value::Int(i);
                    }
                    return s
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map_or_else(|| value.clone(), |f| Value::Int(f.trunc() as i64));
                }
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map_or_else(|| value.clone(), Value::Decimal)
            }
            other => other.clone(),
        }
    }

    fn convert_number(&self, value: &Value, out: ValueFormat) -> Value {
        if out.is_typed() {
            return self.to_number(value);
        }
        let number = self.to_number(value);
        let Some(n) = number.as_f64() else {
            return Value::String(value.to_string());
        };
        if out == ValueFormat::EditString {
            return Value::String(number.to_string());
        }
        Value::String(self.format_number(n, &number))
    }

    fn format_number(&self, n: f64, number: &Value) -> String {
        let settings = SETTINGS.get();
        match self.kind() {
            PropertyKind::Money | PropertyKind::PositiveMoney => {
                let digits = self.def.fraction_digits.unwrap_or(settings.money_fraction_digits);
                let amount = group_thousands(&format!("{:.*}", digits, n.abs()));
                let template = self.def.display_format.as_deref().unwrap_or(&settings.money_format);
                let formatted = format_message(template, &[amount]);
                if n < 0.0 {
                    format!("-{formatted}")
                } else {
                    formatted
                }
            }
            PropertyKind::Percent | PropertyKind::PercentFraction => {
                let digits = self.def.fraction_digits.unwrap_or(0);
                let s = format!("{:.*}%", digits, n * 100.0);
                self.apply_display_format(s)
            }
            _ => {
                let s = match self.def.fraction_digits {
                    Some(digits) if !self.kind().is_integral() => format!("{n:.digits$}"),
                    _ => number.to_string(),
                };
                self.apply_display_format(s)
            }
        }
    }

    fn apply_display_format(&self, s: String) -> String {
        match &self.def.display_format {
            Some(template) => format_message(template, &[s]),
            None => s,
        }
    }

    // ── Dates and times ──────────────────────────────────────────────

    fn edit_format(&self) -> String {
        if let Some(format) = &self.def.edit_format {
            return format.clone();
        }
        let settings = SETTINGS.get();
        match self.kind() {
            PropertyKind::Date => settings.date_edit_format.clone(),
            PropertyKind::Time => settings.time_edit_format.clone(),
            _ => settings.datetime_edit_format.clone(),
        }
    }

    fn temporal_display_format(&self) -> String {
        if let Some(format) = &self.def.display_format {
            return format.clone();
        }
        let settings = SETTINGS.get();
        match self.kind() {
            PropertyKind::Date => settings.date_display_format.clone(),
            PropertyKind::Time => settings.time_display_format.clone(),
            _ => settings.datetime_display_format.clone(),
        }
    }

    fn convert_temporal(&self, value: &Value, out: ValueFormat, input: Option<ValueFormat>) -> Value {
        let internal = self.to_temporal(value, input);
        let Some(stamp) = as_datetime(&internal) else {
            return if out == ValueFormat::Internal || out == ValueFormat::Transport {
                internal
            } else {
                Value::String(value.to_string())
            };
        };
        match out {
            ValueFormat::Internal => internal,
            ValueFormat::Transport => {
                let pattern = if self.kind() == PropertyKind::Time {
                    TIME_TRANSPORT_FORMAT
                } else {
                    DATETIME_TRANSPORT_FORMAT
                };
                Value::String(format_datetime(stamp, pattern).unwrap_or_else(|| value.to_string()))
            }
            ValueFormat::EditString => {
                Value::String(format_datetime(stamp, &self.edit_format()).unwrap_or_else(|| internal.to_string()))
            }
            ValueFormat::DisplayString => Value::String(
                format_datetime(stamp, &self.temporal_display_format())
                    .unwrap_or_else(|| internal.to_string()),
            ),
        }
    }

    /// Converts a value to the temporal variant of this kind, or returns it
    /// unchanged if it does not parse.
    fn to_temporal(&self, value: &Value, input: Option<ValueFormat>) -> Value {
        let kind = self.kind();
        let from_wire = input == Some(ValueFormat::Transport);
        let parsed = match value {
            Value::Date(d) => Some(d.and_time(NaiveTime::default())),
            Value::DateTime(dt) => Some(*dt),
            Value::Time(t) if kind == PropertyKind::Time => Some(NaiveDate::default().and_time(*t)),
            Value::String(s) => {
                let s = s.trim();
                if kind == PropertyKind::Time {
                    self.parse_time(s, from_wire).map(|t| NaiveDate::default().and_time(t))
                } else {
                    self.parse_datetime(s, from_wire)
                }
            }
            _ => None,
        };
        match parsed {
            Some(dt) => match kind {
                PropertyKind::Date => Value::Date(dt.date()),
                PropertyKind::Time => Value::Time(dt.time()),
                _ => Value::DateTime(dt),
            },
            None => value.clone(),
        }
    }

    /// Tries the wire patterns, then (unless the input came from the wire)
    /// the edit format.
    fn parse_datetime(&self, s: &str, from_wire: bool) -> Option<NaiveDateTime> {
        for pattern in DATETIME_WIRE_PATTERNS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, pattern) {
                return Some(dt);
            }
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_local());
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(d.and_time(NaiveTime::default()));
        }
        if from_wire {
            return None;
        }

        let edit = self.edit_format();
        let parsed = NaiveDateTime::parse_from_str(s, &edit)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, &edit)
                    .ok()
                    .map(|d| d.and_time(NaiveTime::default()))
            })
            .or_else(|| {
                let date_edit = &SETTINGS.get().date_edit_format;
                NaiveDate::parse_from_str(s, date_edit)
                    .ok()
                    .map(|d| d.and_time(NaiveTime::default()))
            })?;
        Some(rebase_two_digit_year(parsed))
    }

    fn parse_time(&self, s: &str, from_wire: bool) -> Option<NaiveTime> {
        if !from_wire && !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            return self.parse_time_digits(s);
        }
        for pattern in TIME_WIRE_PATTERNS {
            if let Ok(t) = NaiveTime::parse_from_str(s, pattern) {
                return Some(t);
            }
        }
        for pattern in DATETIME_WIRE_PATTERNS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, pattern) {
                return Some(dt.time());
            }
        }
        if from_wire {
            return None;
        }
        NaiveTime::parse_from_str(s, &self.edit_format()).ok()
    }

    /// Reads speed-entry digits: `HHMM` for four digits, otherwise a bare
    /// number of hours, or of minutes when it is 24 or more (or always, for
    /// a minutes-centric property).
    fn parse_time_digits(&self, s: &str) -> Option<NaiveTime> {
        if s.len() == 4 {
            let hours: u32 = s[..2].parse().ok()?;
            let minutes: u32 = s[2..].parse().ok()?;
            return NaiveTime::from_hms_opt(hours, minutes, 0);
        }
        let n: u32 = s.parse().ok()?;
        if (24..60).contains(&n) || (n < 24 && self.def.minutes_centric) {
            NaiveTime::from_hms_opt(0, n, 0)
        } else if n < 24 {
            NaiveTime::from_hms_opt(n, 0, 0)
        } else {
            None
        }
    }
}

fn as_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Date(d) => Some(d.and_time(NaiveTime::default())),
        Value::DateTime(dt) => Some(*dt),
        Value::Time(t) => Some(NaiveDate::default().and_time(*t)),
        _ => None,
    }
}

/// Formats with a `strftime` pattern, returning `None` for a pattern chrono
/// cannot render for a naive date/time.
fn format_datetime(stamp: NaiveDateTime, pattern: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", stamp.format(pattern)).ok()?;
    Some(out)
}

/// Moves a two-digit year into the current century, or the previous one
/// when it is at or above the configured pivot.
fn rebase_two_digit_year(dt: NaiveDateTime) -> NaiveDateTime {
    let year = dt.year();
    if !(0..100).contains(&year) {
        return dt;
    }
    let mut century = Local::now().year() / 100 * 100;
    if year >= SETTINGS.get().year_pivot {
        century -= 100;
    }
    dt.with_year(century + year).unwrap_or(dt)
}

/// Inserts `,` between groups of three integer digits.
fn group_thousands(number: &str) -> String {
    let (int_part, rest) = number.find('.').map_or((number, ""), |i| number.split_at(i));
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(number.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    grouped.push_str(rest);
    grouped
}
