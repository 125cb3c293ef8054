pub mod endpoints;
pub mod env;

pub use endpoints::Endpoints;
pub use env::EnvManager;
