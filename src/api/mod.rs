pub mod handlers;

pub use handlers::{extract, health_check, reconcile, reconcile_csv};
