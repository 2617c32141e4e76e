//! `CALCULATE[...]` evaluation and VND formatting
//!
//! Supported forms:
//! - `CALCULATE[n]`
//! - `CALCULATE[a op b]`
//! - `CALCULATE[income*a op b]` (rendered as `a%` when income is unknown)

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref LITERAL: Regex = Regex::new(r"CALCULATE\[\s*(\d+)\s*\]").unwrap();
    static ref BINARY: Regex = Regex::new(r"CALCULATE\[\s*(\d+)\s*([-+*/])\s*(\d+)\s*\]").unwrap();
    static ref INCOME_SHARE: Regex =
        Regex::new(r"CALCULATE\[\s*income\s*\*\s*(\d+)\s*([-+*/])\s*(\d+)\s*\]").unwrap();
}

/// Human-readable VND amount: `1.2 tỷ`, `9.6 triệu`, `600 nghìn`, `500`.
pub fn format_vnd(amount: f64) -> String {
    if amount >= 1_000_000_000.0 {
        format!("{:.1} tỷ", amount / 1_000_000_000.0)
    } else if amount >= 1_000_000.0 {
        format!("{:.1} triệu", amount / 1_000_000.0)
    } else if amount >= 1_000.0 {
        format!("{:.0} nghìn", amount / 1_000.0)
    } else {
        format!("{:.0}", amount)
    }
}

/// Rounded integer with comma thousands separators.
pub fn group_thousands(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        grouped.insert(0, '-');
    }
    grouped
}

fn apply(a: f64, op: &str, b: f64) -> Option<f64> {
    match op {
        "+" => Some(a + b),
        "-" => Some(a - b),
        "*" => Some(a * b),
        "/" if b != 0.0 => Some(a / b),
        _ => None,
    }
}

fn number(caps: &Captures, index: usize) -> f64 {
    caps[index].parse::<f64>().unwrap_or_default()
}

/// Replace every supported `CALCULATE[...]` with its formatted value.
/// Expressions that cannot be evaluated are left untouched.
pub fn evaluate_calculations(text: &str, income: Option<f64>) -> String {
    let text = LITERAL.replace_all(text, |caps: &Captures| format_vnd(number(caps, 1)));

    let text = BINARY.replace_all(&text, |caps: &Captures| {
        match apply(number(caps, 1), &caps[2], number(caps, 3)) {
            Some(value) => format_vnd(value),
            None => caps[0].to_string(),
        }
    });

    let text = INCOME_SHARE.replace_all(&text, |caps: &Captures| match income {
        Some(income) => match apply(income * number(caps, 1), &caps[2], number(caps, 3)) {
            Some(value) => format_vnd(value),
            None => caps[0].to_string(),
        },
        None => format!("{}%", &caps[1]),
    });

    text.into_owned()
}
