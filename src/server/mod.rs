pub mod api;

use std::error::Error;
use std::sync::Arc;

use crate::cli::Args;
use crate::upstream::GenerativeClient;

pub struct Server {
    args: Args,
    api_key: Option<String>,
    upstream: Arc<dyn GenerativeClient>,
}

impl Server {
    /// `api_key` is `None` when no credential was resolved at startup; the
    /// relay still serves, answering every invocation with a 500 until the
    /// configuration is fixed.
    pub fn new(args: Args, api_key: Option<String>, upstream: Arc<dyn GenerativeClient>) -> Self {
        Self { args, api_key, upstream }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(
            self.args.clone(),
            self.api_key.clone(),
            self.upstream.clone()
        ).await
    }
}
