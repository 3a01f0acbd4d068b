//! Runtime settings for the application client.
use std::{path::PathBuf, time::Duration};

/// Where the application template is read from, relative to the working directory.
pub const APPLICATION_TEMPLATE_PATH: &str = "./scripts/argo-assets/APPLICATION_TEMPLATE.JSON";
/// Upper bound for a single request against the API server.
pub const TIMEOUT_SLOW: Duration = Duration::from_secs(30);

pub const TEMPLATE_PATH_ENV: &str = "ARGOCD_APP_TEMPLATE_PATH";
pub const REQUEST_TIMEOUT_ENV: &str = "ARGOCD_APP_REQUEST_TIMEOUT_SECS";
pub const DECODE_GET_RESPONSE_ENV: &str = "ARGOCD_APP_DECODE_GET_RESPONSE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Template file, read again on every create.
    pub template_path: PathBuf,
    /// Connect, read and write timeout of each request.
    pub request_timeout: Duration,
    /// Decode the body of successful get responses.
    ///
    /// Off by default: a successful get then returns an empty resource, which is
    /// what existing callers of this client expect.
    pub decode_get_response: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from(APPLICATION_TEMPLATE_PATH),
            request_timeout: TIMEOUT_SLOW,
            decode_get_response: false,
        }
    }
}

impl Settings {
    /// Reads overrides from the environment, keeping defaults for unset or invalid values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(path) = lookup(TEMPLATE_PATH_ENV).filter(|p| !p.is_empty()) {
            settings.template_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(REQUEST_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => settings.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %raw, "ignoring invalid {}", REQUEST_TIMEOUT_ENV),
            }
        }
        if let Some(raw) = lookup(DECODE_GET_RESPONSE_ENV) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => settings.decode_get_response = true,
                "0" | "false" | "no" => settings.decode_get_response = false,
                _ => tracing::warn!(value = %raw, "ignoring invalid {}", DECODE_GET_RESPONSE_ENV),
            }
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let settings = Settings::from_lookup(lookup(&[]));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(
            settings.template_path,
            PathBuf::from("./scripts/argo-assets/APPLICATION_TEMPLATE.JSON")
        );
        assert!(!settings.decode_get_response);
    }

    #[test]
    fn overrides() {
        let settings = Settings::from_lookup(lookup(&[
            (TEMPLATE_PATH_ENV, "/etc/argo/app.json"),
            (REQUEST_TIMEOUT_ENV, "5"),
            (DECODE_GET_RESPONSE_ENV, "true"),
        ]));
        assert_eq!(settings.template_path, PathBuf::from("/etc/argo/app.json"));
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
        assert!(settings.decode_get_response);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let settings = Settings::from_lookup(lookup(&[
            (REQUEST_TIMEOUT_ENV, "soon"),
            (DECODE_GET_RESPONSE_ENV, "maybe"),
        ]));
        assert_eq!(settings, Settings::default());
    }
}
