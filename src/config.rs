//! Bot configuration from the environment

use crate::schedule::{CategoryRules, Question, ResponderSettings};
use crate::state_machine::{
    CodeGrammar, FeedbackPolicy, LoginPolicy, SessionContext, DEFAULT_CODE_PATTERN,
};
use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8443;
const DEFAULT_BACKEND_URL: &str = "https://telegrambots-db.herokuapp.com/api/namjaninjabot";
const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Singapore;
const DEFAULT_PROGRAM_NAME: &str = "NDP 2022";
const DEFAULT_FEEDBACK_MIN_LEN: usize = 5;
const FEEDBACK_MAX_LEN: usize = 500;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const ENCOURAGEMENT_BASE: &str = "https://www.sokaglobal.org/resources/daily-encouragement/";

/// Configuration errors surfaced at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("Failed to load category rules from {path}: {message}")]
    RulesFile { path: String, message: String },
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token; also the secret webhook path
    pub token: String,
    pub port: u16,
    /// Public base URL to register the webhook under, if any
    pub webhook_url: Option<String>,
    pub backend_url: String,
    pub timezone: Tz,
    /// Program day, the second countdown target
    pub program_date: NaiveDate,
    pub program_name: String,
    pub login_policy: LoginPolicy,
    /// Accepted code shape under local validation
    pub code_grammar: CodeGrammar,
    pub feedback_min_len: Option<usize>,
    pub rules_path: Option<PathBuf>,
    pub http_timeout: Duration,
    pub menu: Vec<Question>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let token = get("TOKEN").ok_or(ConfigError::Missing("TOKEN"))?;

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|e| invalid("PORT", &raw, e))?,
            None => DEFAULT_PORT,
        };

        let timezone = match get("NAMJA_TIMEZONE") {
            Some(raw) => raw
                .trim()
                .parse::<Tz>()
                .map_err(|e| invalid("NAMJA_TIMEZONE", &raw, e))?,
            None => DEFAULT_TIMEZONE,
        };

        let program_date = match get("NAMJA_PROGRAM_DATE") {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|e| invalid("NAMJA_PROGRAM_DATE", &raw, e))?,
            None => NaiveDate::from_ymd_opt(2022, 9, 9)
                .ok_or_else(|| invalid("NAMJA_PROGRAM_DATE", "2022-09-09", "out of range"))?,
        };

        let login_policy = match get("NAMJA_LOGIN_POLICY").as_deref().map(str::trim) {
            None | Some("server") => LoginPolicy::ServerTracked,
            Some("local") => LoginPolicy::LocalValidation,
            Some(other) => {
                return Err(invalid(
                    "NAMJA_LOGIN_POLICY",
                    other,
                    "expected \"local\" or \"server\"",
                ))
            }
        };

        let code_pattern = get("NAMJA_CODE_PATTERN");
        let code_pattern = code_pattern.as_deref().unwrap_or(DEFAULT_CODE_PATTERN);
        let code_grammar = CodeGrammar::new(code_pattern)
            .map_err(|e| invalid("NAMJA_CODE_PATTERN", code_pattern, e))?;

        let feedback_min_len = match get("NAMJA_FEEDBACK_MIN_LEN") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => None,
                Ok(min) => Some(min),
                Err(e) => return Err(invalid("NAMJA_FEEDBACK_MIN_LEN", &raw, e)),
            },
            None => Some(DEFAULT_FEEDBACK_MIN_LEN),
        };

        let http_timeout = match get("NAMJA_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .map_err(|e| invalid("NAMJA_HTTP_TIMEOUT_SECS", &raw, e))?,
            ),
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let menu = match get("NAMJA_MENU") {
            Some(raw) => parse_menu(&raw)?,
            None => Question::ALL.to_vec(),
        };

        Ok(Self {
            token,
            port,
            webhook_url: get("NAMJA_WEBHOOK_URL"),
            backend_url: get("NAMJA_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            timezone,
            program_date,
            program_name: get("NAMJA_PROGRAM_NAME")
                .unwrap_or_else(|| DEFAULT_PROGRAM_NAME.to_string()),
            login_policy,
            code_grammar,
            feedback_min_len,
            rules_path: get("NAMJA_RULES_PATH").map(PathBuf::from),
            http_timeout,
            menu,
        })
    }

    pub fn session_context(&self) -> SessionContext {
        SessionContext::new(
            self.login_policy,
            FeedbackPolicy {
                min_len: self.feedback_min_len,
                max_len: FEEDBACK_MAX_LEN,
            },
            self.code_grammar.clone(),
        )
        .with_menu(self.menu.clone())
    }

    /// Midnight of the program day in the event timezone
    pub fn program_start(&self) -> Result<DateTime<Tz>, ConfigError> {
        let midnight = self.program_date.and_hms_opt(0, 0, 0).ok_or_else(|| {
            invalid(
                "NAMJA_PROGRAM_DATE",
                &self.program_date.to_string(),
                "no midnight",
            )
        })?;
        self.timezone
            .from_local_datetime(&midnight)
            .earliest()
            .ok_or_else(|| {
                invalid(
                    "NAMJA_PROGRAM_DATE",
                    &self.program_date.to_string(),
                    format!("midnight does not exist in {}", self.timezone),
                )
            })
    }

    pub fn responder_settings(&self) -> Result<ResponderSettings, ConfigError> {
        Ok(ResponderSettings {
            program_name: self.program_name.clone(),
            program_start: self.program_start()?,
            encouragement_base: ENCOURAGEMENT_BASE.to_string(),
        })
    }

    /// The rule file when one is configured, otherwise the built-in table
    pub fn category_rules(&self) -> Result<CategoryRules, ConfigError> {
        match &self.rules_path {
            Some(path) => CategoryRules::from_path(path),
            None => Ok(CategoryRules::default()),
        }
    }
}

fn parse_menu(raw: &str) -> Result<Vec<Question>, ConfigError> {
    let menu = raw
        .split(',')
        .filter(|name| !name.trim().is_empty())
        .map(|name| {
            Question::from_name(name)
                .ok_or_else(|| invalid("NAMJA_MENU", raw, format!("unknown question {:?}", name.trim())))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if menu.is_empty() {
        return Err(invalid("NAMJA_MENU", raw, "no questions listed"));
    }
    Ok(menu)
}
