// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitor stdout parsing.
//!
//! A monitor task reports metrics through its stdout: the last line starting
//! with `OUT=` carries tab-separated tokens, each either `key=number` or a
//! bare `number` (recorded under the key `value`). Everything else on stdout
//! is free-form and ignored.

/// A parsed (key, value) metric sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPair {
    pub key: String,
    pub value: f64,
}

/// Extract the payload tokens of the last `OUT=` line, if any.
pub fn parse_out_line(stdout: &str) -> Vec<String> {
    let payload = match stdout
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix("OUT="))
    {
        Some(p) => p,
        None => return Vec::new(),
    };
    if payload.is_empty() {
        return Vec::new();
    }
    payload.split('\t').map(str::to_string).collect()
}

/// Parse metric tokens into (key, value) pairs, silently dropping the rest.
pub fn parse_metric_tokens(tokens: &[String]) -> Vec<MetricPair> {
    let mut pairs = Vec::new();
    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some((key, value)) = token.split_once('=') {
            if let Ok(value) = value.trim().parse::<f64>() {
                pairs.push(MetricPair {
                    key: key.trim().to_string(),
                    value,
                });
            }
        } else if let Ok(value) = token.parse::<f64>() {
            pairs.push(MetricPair {
                key: "value".to_string(),
                value,
            });
        }
    }
    pairs
}

/// Parse a monitor's stdout end to end.
pub fn parse_monitor_stdout(stdout: &str) -> Vec<MetricPair> {
    parse_metric_tokens(&parse_out_line(stdout))
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
