//! Slot signals written by the model in its `Analyzing:` line
//!
//! SET_INCOME[8000000]  SET_TARGET_MONEY[100000000]  SET_TARGET_TIME[20]
//! SET_INTEREST_RATE[3.5]  SET_RATE_PERIOD[MONTH]
//!
//! The model recalls earlier values in every analysis, so the last
//! occurrence of each signal wins.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INCOME: Regex = Regex::new(r"SET_INCOME\[\s*([\d.,]+)\s*\]").unwrap();
    static ref TARGET_MONEY: Regex = Regex::new(r"SET_TARGET_MONEY\[\s*([\d.,]+)\s*\]").unwrap();
    static ref TARGET_TIME: Regex = Regex::new(r"SET_TARGET_TIME\[\s*(\d+)\s*\]").unwrap();
    static ref INTEREST_RATE: Regex =
        Regex::new(r"SET_INTEREST_RATE\[\s*(\d+(?:[.,]\d+)?)\s*%?\s*\]").unwrap();
    static ref RATE_PERIOD: Regex =
        Regex::new(r"(?i)SET_RATE_PERIOD\[\s*(DAY|MONTH|YEAR)\s*\]").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatePeriod {
    Day,
    Month,
    Year,
}

impl RatePeriod {
    pub fn periods_per_year(&self) -> f64 {
        match self {
            RatePeriod::Day => 365.0,
            RatePeriod::Month => 12.0,
            RatePeriod::Year => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Signals {
    pub income: Option<f64>,
    pub target_money: Option<f64>,
    pub target_time: Option<u32>,
    pub interest_rate: Option<f64>,
    pub rate_period: Option<RatePeriod>,
}

impl Signals {
    pub fn has_target(&self) -> bool {
        self.target_money.is_some() || self.target_time.is_some()
    }
}

pub fn read_signals(text: &str) -> Signals {
    Signals {
        income: last_capture(&INCOME, text).and_then(parse_amount),
        target_money: last_capture(&TARGET_MONEY, text).and_then(parse_amount),
        target_time: last_capture(&TARGET_TIME, text).and_then(|t| t.parse().ok()),
        interest_rate: last_capture(&INTEREST_RATE, text)
            .and_then(|r| r.replace(',', ".").parse().ok()),
        rate_period: last_capture(&RATE_PERIOD, text).and_then(|p| {
            match p.to_ascii_uppercase().as_str() {
                "DAY" => Some(RatePeriod::Day),
                "MONTH" => Some(RatePeriod::Month),
                "YEAR" => Some(RatePeriod::Year),
                _ => None,
            }
        }),
    }
}

fn last_capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern
        .captures_iter(text)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

// Money signals are integers; separators such as 8,000,000 are dropped.
fn parse_amount(raw: &str) -> Option<f64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u64>().ok().map(|n| n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_savings_signals() {
        let text = " User is telling their income SET_INCOME[8000000]. Recall that user's request is how much money can be saved in 20 years SET_TARGET_TIME[20].\nCurrent stage: Stage 3";
        let signals = read_signals(text);
        assert_eq!(signals.income, Some(8_000_000.0));
        assert_eq!(signals.target_time, Some(20));
        assert_eq!(signals.target_money, None);
        assert!(signals.has_target());
    }

    #[test]
    fn test_last_occurrence_wins_and_separators_are_dropped() {
        let signals = read_signals("SET_INCOME[5000000] then SET_INCOME[12,000,000]");
        assert_eq!(signals.income, Some(12_000_000.0));
    }

    #[test]
    fn test_reads_loan_signals() {
        let signals = read_signals("rate SET_INTEREST_RATE[0,3] SET_RATE_PERIOD[day]");
        assert_eq!(signals.interest_rate, Some(0.3));
        assert_eq!(signals.rate_period, Some(RatePeriod::Day));

        let signals = read_signals("SET_INTEREST_RATE[3%] SET_RATE_PERIOD[MONTH]");
        assert_eq!(signals.interest_rate, Some(3.0));
        assert_eq!(signals.rate_period, Some(RatePeriod::Month));
    }

    #[test]
    fn test_no_signals() {
        assert_eq!(read_signals("User is asking about how to save money."), Signals::default());
    }
}
