use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tender_reconcile_rust::{api, AppConfig, ReconcilerService};
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ログ初期化 - ローカル時刻フォーマット
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 設定読み込み
    let config = AppConfig::from_env();
    info!("Starting server with config: {:?}", config);

    // 照合サービス
    let reconciler = Arc::new(ReconcilerService::new(config.reconcile.clone()));

    // ルーティング
    let app = Router::new()
        .route("/health", get(api::health_check))
        .route("/api/extract", post(api::extract))
        .route("/api/reconcile", post(api::reconcile))
        .route("/api/reconcile/csv", post(api::reconcile_csv))
        .with_state(reconciler)
        .layer(ServiceBuilder::new());

    // サーバー起動
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/extract        - Single-document extraction");
    info!("  POST /api/reconcile      - Tender vs proposal reconciliation");
    info!("  POST /api/reconcile/csv  - Reconciliation report as CSV");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
