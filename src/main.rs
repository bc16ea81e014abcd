use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quill::{AppConfig, Server, app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config);

    let addr = config.socket_addr()?;
    let (resources, _writer) = app::Resources::in_memory(&config);

    app::worker::subscribe(&resources);
    let job = app::worker::schedule(&resources, config.schedule_interval(), config.queue_batch).start();
    info!(
        interval_secs = config.schedule_interval_secs,
        batch = config.queue_batch,
        "schedule started"
    );

    let served = Server::bind(addr).serve(app::api(&resources)).await;

    job.abort();
    // The topic keeps subscriber chains alive, and with them the recorder,
    // so the writer never finishes on its own. Flush what is queued instead.
    resources.recorder.flush().await;
    info!(dropped_facts = resources.recorder.dropped(), "audit trail flushed");

    served.context("serving")
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if config.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}
