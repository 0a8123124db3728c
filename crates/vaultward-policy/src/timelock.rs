//! Timelock extraction from a deployment's rules text.
//!
//! The rules text is opaque configuration, but two date shapes inside it
//! are machine-enforceable and become declared triggers:
//!
//! - absolute: `after January 15, 2026` (midnight UTC when no timezone is
//!   stated)
//! - deposit-relative: `five minutes after deposit` or `30 seconds after
//!   deposit`
//!
//! Triggers are prioritized in order of appearance.

use crate::trigger::{TriggerCondition, TriggerSpec};
use chrono::{TimeZone, Utc};
use tracing::debug;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const NUMBER_WORDS: [&str; 10] = [
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
];

fn normalize(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_ascii_lowercase()
}

fn parse_month(word: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|month| *month == normalize(word))
        .map(|index| index as u32 + 1)
}

fn parse_quantity(word: &str) -> Option<u64> {
    let normalized = normalize(word);
    if let Ok(value) = normalized.parse::<u64>() {
        return Some(value);
    }
    NUMBER_WORDS
        .iter()
        .position(|number| *number == normalized)
        .map(|index| index as u64 + 1)
}

fn unit_millis(word: &str) -> Option<u64> {
    match normalize(word).trim_end_matches('s') {
        "second" => Some(1_000),
        "minute" => Some(60_000),
        "hour" => Some(3_600_000),
        "day" => Some(86_400_000),
        _ => None,
    }
}

fn parse_absolute(words: &[&str], index: usize) -> Option<TriggerCondition> {
    let month = parse_month(words.get(index + 1)?)?;
    let day: u32 = normalize(words.get(index + 2)?).parse().ok()?;
    let year_word = normalize(words.get(index + 3)?);
    if year_word.len() != 4 {
        return None;
    }
    let year: i32 = year_word.parse().ok()?;
    let at = Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single()?;
    Some(TriggerCondition::Absolute { at })
}

fn parse_relative(words: &[&str], index: usize) -> Option<TriggerCondition> {
    if normalize(words.get(index + 1)?) != "deposit" {
        return None;
    }
    if index < 2 {
        return None;
    }
    let quantity = parse_quantity(words[index - 2])?;
    let unit = unit_millis(words[index - 1])?;
    Some(TriggerCondition::RelativeToDeposit {
        offset_ms: quantity * unit,
    })
}

/// Extract every recognizable timelock from the rules text.
pub fn extract_triggers(rules: &str) -> Vec<TriggerSpec> {
    let words: Vec<&str> = rules.split_whitespace().collect();
    let mut specs = Vec::new();
    for (index, word) in words.iter().enumerate() {
        if normalize(word) != "after" {
            continue;
        }
        let condition = parse_absolute(&words, index).or_else(|| parse_relative(&words, index));
        if let Some(condition) = condition {
            let priority = specs.len() as u32;
            specs.push(TriggerSpec {
                id: format!("timelock-{priority}"),
                priority,
                condition,
            });
        }
    }
    debug!(count = specs.len(), "timelocks extracted from rules text");
    specs
}
