/// Credential relay server binary
use credential_relay::{
    config::{LogFormat, ServerConfig},
    error::RelayResult,
    server, AppContext,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> RelayResult<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize logging
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("credential_relay=debug,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    print_banner();

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
   ___            _         _   _       _   ___     _
  / __|_ _ ___ __| |___ _ _| |_(_)__ _ | | | _ \___| |__ _ _  _
 | (__| '_/ -_) _` / -_) ' \  _| / _` || | |   / -_) / _` | || |
  \___|_| \___\__,_\___|_||_\__|_\__,_||_| |_|_\___|_\__,_|\_, |
                                                           |__/
        Credential Relay v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
