//! Backend entry-point: resolves configuration, seeds defaults, and serves.

use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use alexandria_backend::server::{self, AppConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;
    server::run(config).await
}
