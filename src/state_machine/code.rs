//! Participant codes

use regex::{Regex, RegexBuilder};
use std::fmt;

/// A participant code after normalization (trimmed, first letter upper-cased,
/// rest lower-cased). Normalization does not imply the code is well formed;
/// see [`CodeGrammar::accepts`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantCode(String);

impl ParticipantCode {
    pub fn normalized(raw: &str) -> Self {
        let mut chars = raw.trim().chars();
        let code = match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(char::to_lowercase))
                .collect(),
            None => String::new(),
        };
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pattern for `A000` through `F639`
pub const DEFAULT_CODE_PATTERN: &str = r"^[A-F][0-6][0-3][0-9]$";

/// Shape of a valid code, as a case-insensitive regular expression over the
/// normalized code. Anchors are the pattern's own business.
#[derive(Debug, Clone)]
pub struct CodeGrammar(Regex);

impl CodeGrammar {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(CodeGrammar)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn accepts(&self, code: &ParticipantCode) -> bool {
        self.0.is_match(code.as_str())
    }
}

#[cfg(test)]
impl Default for CodeGrammar {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_PATTERN).unwrap()
    }
}
