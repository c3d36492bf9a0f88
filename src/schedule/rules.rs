//! Category rule table
//!
//! Decides which extra sections an activity's answer carries. The table
//! changes between program iterations, so it is plain data: the built-in
//! default can be replaced by a JSON file (`NAMJA_RULES_PATH`).

use super::types::ActivityRecord;
use crate::config::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

/// A compiled regular expression that deserializes from its source string
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct Pattern(Regex);

impl TryFrom<String> for Pattern {
    type Error = regex::Error;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Regex::new(&source).map(Pattern)
    }
}

/// Condition over an activity's title and location
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    TitleIs { value: String },
    TitleContains { value: String },
    TitleMatches { pattern: Pattern },
    LocationIs { value: String },
    All { of: Vec<Predicate> },
    Any { of: Vec<Predicate> },
}

impl Predicate {
    pub fn title_is(value: &str) -> Self {
        Predicate::TitleIs {
            value: value.to_string(),
        }
    }

    pub fn title_contains(value: &str) -> Self {
        Predicate::TitleContains {
            value: value.to_string(),
        }
    }

    pub fn location_is(value: &str) -> Self {
        Predicate::LocationIs {
            value: value.to_string(),
        }
    }

    pub fn matches(&self, activity: &ActivityRecord) -> bool {
        match self {
            Predicate::TitleIs { value } => activity.title == *value,
            Predicate::TitleContains { value } => activity.title.contains(value.as_str()),
            Predicate::TitleMatches { pattern } => pattern.0.is_match(&activity.title),
            Predicate::LocationIs { value } => activity.location == *value,
            Predicate::All { of } => of.iter().all(|p| p.matches(activity)),
            Predicate::Any { of } => of.iter().any(|p| p.matches(activity)),
        }
    }
}

/// Extra section appended to a next-activity answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extra {
    ZoomLink,
    Attire,
    ThingsToBring,
    /// Adds a "Costume" item to the things-to-bring list
    Costume,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    pub when: Predicate,
    pub then: Extra,
}

/// The full table plus the closing-activity marker
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRules {
    /// Title of the last scheduled activity; decides between "winding down"
    /// and "concluded" once nothing is upcoming
    pub closing_title: String,
    pub rules: Vec<Rule>,
}

impl CategoryRules {
    /// Load a table from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::RulesFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::RulesFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Extras for an activity, in rendering order
    pub fn extras_for(&self, activity: &ActivityRecord) -> BTreeSet<Extra> {
        self.rules
            .iter()
            .filter(|rule| rule.when.matches(activity))
            .map(|rule| rule.then)
            .collect()
    }

    /// Find the closing activity in a list
    pub fn closing_activity<'a>(&self, activities: &'a [ActivityRecord]) -> Option<&'a ActivityRecord> {
        activities.iter().find(|a| a.title == self.closing_title)
    }
}

impl Default for CategoryRules {
    fn default() -> Self {
        let training = || {
            Predicate::Any {
                of: vec![
                    Predicate::title_is("NDP Training"),
                    Predicate::title_contains("Rehearsal"),
                ],
            }
        };
        let venue = || {
            Predicate::Any {
                of: vec![
                    Predicate::location_is("Keat Hong Camp"),
                    Predicate::location_is("The Float @ Marina Bay"),
                ],
            }
        };

        Self {
            closing_title: "Post-NDP Celebration".to_string(),
            rules: vec![
                Rule {
                    when: Predicate::location_is("Zoom"),
                    then: Extra::ZoomLink,
                },
                Rule {
                    when: training(),
                    then: Extra::Attire,
                },
                Rule {
                    when: Predicate::All {
                        of: vec![training(), venue()],
                    },
                    then: Extra::ThingsToBring,
                },
                Rule {
                    when: Predicate::All {
                        of: vec![
                            Predicate::Any {
                                of: vec![
                                    Predicate::title_contains("Full Dress Rehearsal"),
                                    Predicate::title_contains("Preview"),
                                ],
                            },
                            venue(),
                        ],
                    },
                    then: Extra::Costume,
                },
            ],
        }
    }
}
