use pen_ink_status::estimation::linear::LinearInkModel;
use pen_ink_status::estimation::model::EstimationModel;
use pen_ink_status::source::json_file::JsonFileSource;
use pen_ink_status::{api, config, state};
use std::net::SocketAddr;
use std::sync::Arc;

fn init_tracing(level: tracing::Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config::config_path();
    let config = config::load_default()?;
    init_tracing(config.log_level());
    tracing::info!(
        config_path = %config_path.display(),
        app = %config.app.name,
        "pen-ink-status starting"
    );

    let source = JsonFileSource::new(config.data_path());
    if source.path().is_file() {
        tracing::info!(path = %source.path().display(), "Using pen data file");
    } else {
        tracing::warn!(
            path = %source.path().display(),
            "Pen data file not found; status requests will fail until it exists"
        );
    }

    let model = LinearInkModel::new(config.estimation_params()?);
    let params = model.params();
    tracing::info!(
        initial_level = params.initial_level,
        consumption_rate_per_second = params.consumption_rate_per_second,
        replacement_threshold = params.replacement_threshold,
        "Estimation model configured"
    );

    let state = Arc::new(state::AppState::new(Arc::new(source), Arc::new(model)));

    let app = api::router(state);
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
