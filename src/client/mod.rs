pub mod api;

pub use api::{AuthorizationStep, CollectionsQuery, DeviantArtClient, RefreshPolicy};
