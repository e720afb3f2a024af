pub mod models;
pub mod routes;
pub mod upstream;

pub use routes::{AppState, router};
pub use upstream::GatewayError;
pub use upstream::ollama_client::OllamaClient;
