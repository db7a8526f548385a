//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (e.g. `"FINMIND_TOKEN"`).
//! - Callers invoke [`resolve_secrets`] once at startup and hand the result
//!   to provider constructors; no other code reads credentials from the env.
//! - `Debug` on [`ResolvedSecrets`] **redacts** values.
//!
//! Every credential is optional here. A provider that needs a missing one
//! reports it as a configuration error when it is used.

use serde_json::Value;

pub const DEFAULT_FINMIND_TOKEN_ENV: &str = "FINMIND_TOKEN";
pub const DEFAULT_TWELVEDATA_API_KEY_ENV: &str = "TWELVEDATA_API_KEY";

/// Credentials resolved from the environment.
#[derive(Clone)]
pub struct ResolvedSecrets {
    /// FinMind bearer token. `None` if the named env var was absent or blank.
    pub finmind_token: Option<String>,
    /// TwelveData API key. `None` if the named env var was absent or blank.
    pub twelvedata_api_key: Option<String>,
    /// Env var names the values were read from (safe to print).
    pub finmind_token_env: String,
    pub twelvedata_api_key_env: String,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field(
                "finmind_token",
                &self.finmind_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "twelvedata_api_key",
                &self.twelvedata_api_key.as_ref().map(|_| "<REDACTED>"),
            )
            .field("finmind_token_env", &self.finmind_token_env)
            .field("twelvedata_api_key_env", &self.twelvedata_api_key_env)
            .finish()
    }
}

/// Read a non-blank string at `pointer`.
fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Unset or blank env vars resolve to `None`.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// Resolve provider credentials named by `config_json`, falling back to the
/// well-known env var names. Never fails.
pub fn resolve_secrets(config_json: &Value) -> ResolvedSecrets {
    let finmind_token_env = read_str_at(config_json, "/data/providers/finmind/token_env")
        .unwrap_or_else(|| DEFAULT_FINMIND_TOKEN_ENV.to_string());
    let twelvedata_api_key_env =
        read_str_at(config_json, "/data/providers/twelvedata/api_key_env")
            .unwrap_or_else(|| DEFAULT_TWELVEDATA_API_KEY_ENV.to_string());

    ResolvedSecrets {
        finmind_token: resolve_env(&finmind_token_env),
        twelvedata_api_key: resolve_env(&twelvedata_api_key_env),
        finmind_token_env,
        twelvedata_api_key_env,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_values() {
        let s = ResolvedSecrets {
            finmind_token: Some("eyJsecretsecret".to_string()),
            twelvedata_api_key: None,
            finmind_token_env: "FINMIND_TOKEN".to_string(),
            twelvedata_api_key_env: "TWELVEDATA_API_KEY".to_string(),
        };
        let dbg = format!("{:?}", s);
        assert!(dbg.contains("<REDACTED>"));
        assert!(dbg.contains("FINMIND_TOKEN"));
        assert!(!dbg.contains("eyJsecretsecret"));
    }

    #[test]
    fn names_fall_back_to_defaults() {
        let s = resolve_secrets(&serde_json::json!({}));
        assert_eq!(s.finmind_token_env, DEFAULT_FINMIND_TOKEN_ENV);
        assert_eq!(s.twelvedata_api_key_env, DEFAULT_TWELVEDATA_API_KEY_ENV);
    }

    #[test]
    fn blank_name_falls_back_to_default() {
        let s = resolve_secrets(&serde_json::json!({
            "data": {"providers": {"finmind": {"token_env": "   "}}}
        }));
        assert_eq!(s.finmind_token_env, DEFAULT_FINMIND_TOKEN_ENV);
    }
}
