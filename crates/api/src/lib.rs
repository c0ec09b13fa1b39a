pub mod config;
pub mod corrections;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pool;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ApiConfig;
pub use corrections::CorrectionStore;
pub use error::ApiError;
pub use pool::{ImagePayload, WorkerPool};
pub use routes::router;
pub use state::AppState;
