use serde::{Deserialize, Serialize};

use crate::service::ReconcileConfig;

/// アプリ設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            reconcile: ReconcileConfig::default(),
        }
    }
}

impl AppConfig {
    /// 環境変数から設定を読む
    pub fn from_env() -> Self {
        let mut reconcile = ReconcileConfig::default();
        if let Some(threshold) = std::env::var("CONFIDENCE_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            reconcile.confidence_threshold = threshold;
        }
        if let Some(epsilon) = std::env::var("QUANTITY_EPSILON")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            reconcile.quantity_epsilon = epsilon;
        }
        reconcile.custom_item_name_column = std::env::var("CUSTOM_ITEM_NAME_COLUMN")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Self {
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            reconcile,
        }
    }
}
