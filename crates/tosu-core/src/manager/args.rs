//! Client command line flags.
//!
//! Stable and lazer accept `-name value`, `--name value` and `--name=value`.
//! Keys are stored lowercase; a flag without a value maps to an empty string.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientArgs {
    values: BTreeMap<String, String>,
}

impl ClientArgs {
    pub fn parse(command_line: &str) -> Self {
        let mut values = BTreeMap::new();
        let mut tokens = command_line.split_whitespace().peekable();

        while let Some(token) = tokens.next() {
            let Some(flag) = token.strip_prefix("--").or_else(|| token.strip_prefix('-')) else {
                continue;
            };
            if flag.is_empty() {
                continue;
            }

            let (name, value) = match flag.split_once('=') {
                Some((name, value)) => (name, value.to_string()),
                None => {
                    let value = match tokens.peek() {
                        Some(next) if !next.starts_with('-') => tokens.next().unwrap_or_default(),
                        _ => "",
                    };
                    (flag, value.to_string())
                }
            };
            values.insert(name.to_ascii_lowercase(), value.trim_matches('"').to_string());
        }

        Self { values }
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Integer value of a flag, when it parses.
    pub fn number(&self, name: &str) -> Option<i32> {
        self.get(name)?.parse().ok()
    }
}
