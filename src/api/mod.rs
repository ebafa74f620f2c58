pub mod error;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, STATS_HINT};
pub use handlers::{AppState, PeerAddr};
pub use routes::create_api_router;
