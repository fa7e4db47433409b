use bootkit::prelude::*;

mod modules;

use modules::AppModule;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("🚀 Booting host server...");

    let kernel = ModuleKernel::builder()
        .config(ConfigService::with_prefix_from_env("APP_"))
        .build::<AppModule>()?;
    let mut host = HostKernel::from_kernel(kernel);

    // Ctrl+C during bootstrap aborts it between modules
    let watcher = cancel_on_shutdown(host.cancellation_token());
    let router = match host.bootstrap().await {
        Ok(router) => router,
        Err(err) => {
            tracing::error!("Bootstrap failed: {:#}", anyhow::Error::from(err));
            std::process::exit(1);
        }
    };
    watcher.abort();

    let config = host.kernel().config();
    let addr = format!(
        "{}:{}",
        config.get_or("HOST", "0.0.0.0"),
        config.get_or("PORT", "3000")
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("✅ Server running on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}
