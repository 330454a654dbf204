//! Runtime switches
//!
//! Resolved once at process start and passed explicitly to every policy
//! decision. Nothing below this module reads the environment.

use std::path::PathBuf;

pub const ENV_AI_ENABLED: &str = "LESSON_AI_ENABLED";
pub const ENV_KILL_SWITCH: &str = "LESSON_AI_KILL_SWITCH";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_TELEMETRY_PATH: &str = "LESSON_TELEMETRY_PATH";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Process-wide switches for the generative path
///
/// The default value is the safe state: AI disabled, no credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSwitches {
    /// Feature flag for the generative path
    pub ai_enabled: bool,

    /// Stops every service call when set, regardless of policy
    pub kill_switch: bool,

    pub api_key: Option<String>,
    pub base_url: String,

    /// JSON-lines telemetry file; standard error when unset
    pub telemetry_path: Option<PathBuf>,
}

impl Default for RuntimeSwitches {
    fn default() -> Self {
        Self {
            ai_enabled: false,
            kill_switch: false,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            telemetry_path: None,
        }
    }
}

impl RuntimeSwitches {
    /// Resolve switches from raw (possibly absent) setting values
    pub fn resolve(
        ai_enabled: Option<&str>,
        kill_switch: Option<&str>,
        api_key: Option<String>,
        base_url: Option<String>,
        telemetry_path: Option<PathBuf>,
    ) -> Self {
        Self {
            ai_enabled: ai_enabled.map(is_truthy).unwrap_or(false),
            kill_switch: kill_switch.map(is_engaged).unwrap_or(false),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url
                .filter(|u| !u.trim().is_empty())
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            telemetry_path,
        }
    }

    /// Resolve switches from the process environment
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self::resolve(
            var(ENV_AI_ENABLED).as_deref(),
            var(ENV_KILL_SWITCH).as_deref(),
            var(ENV_API_KEY),
            var(ENV_BASE_URL),
            var(ENV_TELEMETRY_PATH).map(PathBuf::from),
        )
    }

    /// Copy with the generative path forced off, for dry runs
    pub fn dry_run(&self) -> Self {
        Self {
            ai_enabled: false,
            api_key: None,
            ..self.clone()
        }
    }
}

/// Feature-flag parsing: only an explicit truthy value enables
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Kill-switch parsing: anything but empty or an explicit falsy value engages
pub fn is_engaged(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_safe() {
        let switches = RuntimeSwitches::resolve(None, None, None, None, None);
        assert_eq!(switches, RuntimeSwitches::default());
        assert!(!switches.ai_enabled);
        assert!(!switches.kill_switch);
    }

    #[test]
    fn test_feature_flag_needs_explicit_truthy_value() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(is_truthy(value), "{value}");
        }
        for value in ["", "0", "enabled", "maybe", "off"] {
            assert!(!is_truthy(value), "{value}");
        }
    }

    #[test]
    fn test_kill_switch_engages_on_unrecognised_values() {
        assert!(is_engaged("1"));
        assert!(is_engaged("stop"));
        assert!(!is_engaged(""));
        assert!(!is_engaged("false"));
        assert!(!is_engaged("0"));
    }

    #[test]
    fn test_base_url_and_key_normalisation() {
        let switches = RuntimeSwitches::resolve(
            Some("true"),
            None,
            Some("  ".to_string()),
            Some("http://localhost:9000/v1/".to_string()),
            None,
        );
        assert!(switches.ai_enabled);
        assert_eq!(switches.api_key, None);
        assert_eq!(switches.base_url, "http://localhost:9000/v1");
        assert!(!switches.dry_run().ai_enabled);
    }
}
