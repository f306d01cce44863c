use std::sync::Arc;

use mtb_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), mtb_core::Error> {
    mtb_core::logging::init("mtb")?;

    let cfg = Arc::new(Config::load()?);

    mtb_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| mtb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
