pub mod extract;
pub mod model_client;
pub mod pipeline;
pub mod prompt;
