use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Host address and port for the relay server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:8787")]
    pub server_addr: String,

    /// API key for the upstream generative API. GOOGLE_API_KEY is accepted as
    /// a fallback variable name.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL for the upstream generative API.
    #[arg(
        long,
        env = "UPSTREAM_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com/v1beta"
    )]
    pub upstream_base_url: String,

    /// Model name for content generation.
    #[arg(long, env = "UPSTREAM_MODEL", default_value = "gemini-1.5-flash")]
    pub upstream_model: String,

    /// Optional path to the TLS certificate file (PEM format) for serving HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for serving HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
