use droid2api::app::StartupError;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,droid2api=debug")),
        )
        .json()
        .init();

    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let state = droid2api::app::load_state()?;
    let listen = state.runtime.listen.clone();
    let app = droid2api::app::build_app(state);
    let addr: std::net::SocketAddr =
        listen
            .parse()
            .map_err(|err: std::net::AddrParseError| StartupError::Listen {
                addr: listen.clone(),
                reason: err.to_string(),
            })?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| StartupError::Listen {
            addr: listen.clone(),
            reason: err.to_string(),
        })?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app)
        .await
        .map_err(|err| StartupError::Serve(err.to_string()))?;
    Ok(())
}
