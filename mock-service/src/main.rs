use mock_service::{router, tps_measure_task, MockConfig};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("mock_service=debug,tower_http=info")
        .init();

    let (app, counters) = router(MockConfig::default());
    tokio::task::spawn(async move { tps_measure_task(counters).await });

    let addr: SocketAddr = "0.0.0.0:8081".parse()?;
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
