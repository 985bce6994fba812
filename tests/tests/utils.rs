use mock_service::{MockConfig, MockService};
use std::sync::OnceLock;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = FmtSubscriber::builder()
            .with_env_filter("surge_sim=debug,mock_service=info")
            .with_test_writer()
            .try_init();
    });
}

#[allow(unused)]
pub async fn mock(config: MockConfig) -> MockService {
    init();
    mock_service::spawn(config)
        .await
        .expect("mock service should bind an ephemeral port")
}

/// An address nothing listens on.
#[allow(unused)]
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
