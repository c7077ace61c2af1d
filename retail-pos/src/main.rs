use anyhow::Result;

use retail_pos::logging::init_logging;
use retail_pos::App;

#[tokio::main]
async fn main() -> Result<()> {
    let log_path = init_logging()?;
    tracing::info!("Logging to {}", log_path.display());

    let auth = retail_auth::connect_from_config()?;

    App::new(auth).run().await
}
