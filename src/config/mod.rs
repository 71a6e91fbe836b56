pub mod prompt;

use crate::cli::Args;

/// Fallback credential variable, consulted when `API_KEY` is unset. Some
/// deployments provision the key under the provider-specific name instead.
pub const FALLBACK_CREDENTIAL_VAR: &str = "GOOGLE_API_KEY";

/// Resolve the upstream API key from server configuration. `API_KEY` wins,
/// `GOOGLE_API_KEY` is checked second; blank values count as unset. The key
/// stays server-side for the life of the process and must never be logged or
/// written into a response body.
pub fn resolve_api_key(args: &Args) -> Option<String> {
    args.api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .or_else(|| {
            std::env
                ::var(FALLBACK_CREDENTIAL_VAR)
                .ok()
                .filter(|key| !key.trim().is_empty())
        })
}
