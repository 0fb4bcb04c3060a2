//! String utility functions.
//!
//! Positional message templating used by validators and loaders, and the
//! conversions used to turn member names into user-facing labels.

use regex::Regex;
use std::sync::OnceLock;

/// Substitutes positional `{0}`, `{1}`, ... placeholders in `template`.
///
/// `{{` and `}}` produce literal braces. Placeholders without a matching
/// parameter are left untouched.
///
/// # Examples
///
/// ```
/// use formkit_core::utils::text::format_message;
///
/// assert_eq!(format_message("{0} is required.", &["Name"]), "Name is required.");
/// assert_eq!(format_message("{{{0}}}", &["x"]), "{x}");
/// assert_eq!(format_message("{1}", &["x"]), "{1}");
/// ```
pub fn format_message<S: AsRef<str>>(template: &str, params: &[S]) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{|\}\}|\{(\d+)\}").unwrap());

    re.replace_all(template, |caps: &regex::Captures<'_>| match &caps[0] {
        "{{" => "{".to_string(),
        "}}" => "}".to_string(),
        token => caps[1]
            .parse::<usize>()
            .ok()
            .and_then(|i| params.get(i))
            .map_or_else(|| token.to_string(), |p| p.as_ref().to_string()),
    })
    .into_owned()
}

/// Capitalizes the letter after the start of the string and after every
/// space, dot, dash, underscore or slash, dropping the separators.
///
/// # Examples
///
/// ```
/// use formkit_core::utils::text::to_camel_case;
///
/// assert_eq!(to_camel_case("first name"), "FirstName");
/// assert_eq!(to_camel_case("order-line_item"), "OrderLineItem");
/// ```
pub fn to_camel_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut upper_next = true;
    for c in s.chars() {
        if matches!(c, ' ' | '.' | '-' | '_' | '/') {
            upper_next = true;
            continue;
        }
        if upper_next {
            result.extend(c.to_uppercase());
            upper_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

/// Splits a PascalCase identifier into space-separated words.
///
/// Runs of capitals stay together as an acronym, ending before a capital that
/// starts a lowercase word.
///
/// # Examples
///
/// ```
/// use formkit_core::utils::text::pascal_to_words;
///
/// assert_eq!(pascal_to_words("FirstName"), "First Name");
/// assert_eq!(pascal_to_words("HTMLText"), "HTML Text");
/// assert_eq!(pascal_to_words("Age"), "Age");
/// ```
pub fn pascal_to_words(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                result.push(' ');
            }
        }
        result.push(c);
    }
    result
}
