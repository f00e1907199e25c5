//! Maintainability index and its Halstead / line-count inputs.

use lazy_static::lazy_static;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// The fixed operator alphabet used for the Halstead partition.
const OPERATORS: &[char] = &[
    '(', ')', '[', ']', '{', '}', '.', ',', ';', '+', '-', '*', '/', '%', '&', '|', '^', '!', '=',
    '<', '>', '?', ':', '~',
];

lazy_static! {
    static ref DOUBLE_QUOTED: Regex = Regex::new(r#""(?:[^"\\\n]|\\.)*""#).unwrap();
    static ref SINGLE_QUOTED: Regex = Regex::new(r"'(?:[^'\\\n]|\\.)*'").unwrap();
    static ref TEMPLATE: Regex = Regex::new(r"(?s)`(?:[^`\\]|\\.)*`").unwrap();
    static ref BLOCK_COMMENT: Regex = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    static ref LINE_COMMENT: Regex = Regex::new(r"//[^\n]*").unwrap();
    static ref HASH_COMMENT: Regex = Regex::new(r"#[^\n]*").unwrap();
}

/// Halstead token accounting for one file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HalsteadReport {
    pub distinct_operators: usize,
    pub distinct_operands: usize,
    pub total_operators: usize,
    pub total_operands: usize,
    pub volume: f64,
}

impl HalsteadReport {
    pub fn vocabulary(&self) -> usize {
        self.distinct_operators + self.distinct_operands
    }

    pub fn length(&self) -> usize {
        self.total_operators + self.total_operands
    }
}

/// Non-blank, non-pure-comment line count, never below 1.
pub fn logical_lines(source: &str) -> usize {
    let count = source
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !(trimmed.is_empty()
                || trimmed.starts_with("//")
                || trimmed.starts_with("/*")
                || trimmed.starts_with('*')
                || trimmed.starts_with('#'))
        })
        .count();
    count.max(1)
}

/// Compute the Halstead report: strings normalized to the literal token
/// `"string"`, comments stripped, then a single pass splitting the text
/// into operator characters and operand words. Volume is floored at 1.
pub fn halstead(source: &str) -> HalsteadReport {
    let normalized = normalize(source);

    let mut operator_counts: FxHashMap<char, usize> = FxHashMap::default();
    let mut operand_counts: FxHashMap<String, usize> = FxHashMap::default();
    let mut current = String::new();

    let mut flush = |current: &mut String, operands: &mut FxHashMap<String, usize>| {
        if !current.is_empty() {
            *operands.entry(std::mem::take(current)).or_insert(0) += 1;
        }
    };

    for ch in normalized.chars() {
        if OPERATORS.contains(&ch) {
            flush(&mut current, &mut operand_counts);
            *operator_counts.entry(ch).or_insert(0) += 1;
        } else if ch.is_whitespace() {
            flush(&mut current, &mut operand_counts);
        } else {
            current.push(ch);
        }
    }
    flush(&mut current, &mut operand_counts);

    let total_operators: usize = operator_counts.values().sum();
    let total_operands: usize = operand_counts.values().sum();
    let distinct_operators = operator_counts.len();
    let distinct_operands = operand_counts.len();

    let length = (total_operators + total_operands) as f64;
    let vocabulary = (distinct_operators + distinct_operands) as f64;
    let volume = if vocabulary > 0.0 {
        (length * vocabulary.log2()).max(1.0)
    } else {
        1.0
    };

    HalsteadReport {
        distinct_operators,
        distinct_operands,
        total_operators,
        total_operands,
        volume,
    }
}

/// `MI = 171 − 5.2·ln(HV) − 0.23·CC − 16.2·ln(LOC)`, clamped to [0, 100]
/// and rounded to an integer value.
pub fn maintainability_index(halstead_volume: f64, cyclomatic: f64, lines_of_code: usize) -> f64 {
    let volume = halstead_volume.max(1.0);
    let loc = lines_of_code.max(1) as f64;
    let raw = 171.0 - 5.2 * volume.ln() - 0.23 * cyclomatic - 16.2 * loc.ln();
    raw.clamp(0.0, 100.0).round()
}

fn normalize(source: &str) -> String {
    // strings first so comment markers inside literals cannot truncate them
    let text = TEMPLATE.replace_all(source, "\"string\"");
    let text = DOUBLE_QUOTED.replace_all(&text, "\"string\"");
    let text = SINGLE_QUOTED.replace_all(&text, "\"string\"");
    let text = BLOCK_COMMENT.replace_all(&text, " ");
    let text = LINE_COMMENT.replace_all(&text, "");
    let text = HASH_COMMENT.replace_all(&text, "");
    text.into_owned()
}

/// Distinct-operand probe used by tests; exposed for rule details.
#[allow(dead_code)]
pub(crate) fn distinct_operands(source: &str) -> FxHashSet<String> {
    let normalized = normalize(source);
    let mut operands = FxHashSet::default();
    let mut current = String::new();
    for ch in normalized.chars() {
        if OPERATORS.contains(&ch) || ch.is_whitespace() {
            if !current.is_empty() {
                operands.insert(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        operands.insert(current);
    }
    operands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_lines_skip_blanks_and_comments() {
        let source = "\n// header\n/* block */\nconst x = 1;\n\nconst y = 2; // trailing\n";
        assert_eq!(logical_lines(source), 2);
    }

    #[test]
    fn logical_lines_floor_at_one() {
        assert_eq!(logical_lines(""), 1);
        assert_eq!(logical_lines("// only a comment\n"), 1);
    }

    #[test]
    fn strings_collapse_to_one_operand() {
        let operands = distinct_operands("const a = \"first\";\nconst b = 'second';\n");
        assert!(operands.contains("\"string\""));
        assert!(!operands.contains("first"));
        assert!(!operands.contains("second"));
    }

    #[test]
    fn comment_url_does_not_leak_tokens() {
        let operands = distinct_operands("const a = 1; // see https://example.com/docs\n");
        assert!(!operands.iter().any(|o| o.contains("example")));
    }

    #[test]
    fn halstead_volume_grows_with_code() {
        let small = halstead("const a = 1;\n");
        let large = halstead("const a = 1;\nconst b = a + 2;\nconst c = b * a - 4;\n");
        assert!(small.volume >= 1.0);
        assert!(large.volume > small.volume);
        assert!(large.total_operators > small.total_operators);
    }

    #[test]
    fn empty_source_has_floor_volume() {
        assert_eq!(halstead("").volume, 1.0);
    }

    #[test]
    fn maintainability_is_clamped_and_integral() {
        let tiny = maintainability_index(1.0, 1.0, 1);
        assert_eq!(tiny, 100.0);

        let awful = maintainability_index(1e9, 500.0, 100_000);
        assert_eq!(awful, 0.0);

        let mid = maintainability_index(900.0, 12.0, 220);
        assert!(mid >= 0.0 && mid <= 100.0);
        assert_eq!(mid, mid.round());
    }
}
