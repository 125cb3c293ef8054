//! # DeviantArt v1 Rust Crate
//!
//! Cliente OAuth2 para a API v1 do DeviantArt.
//!
//! ## Features
//!
//! - Fluxo authorization code (URL de autorização, troca de código, refresh)
//! - Verificação de token sob demanda no endpoint `placebo`
//! - Chamadas autenticadas com refresh automático (`whoami`, coleções, upload Sta.sh)
//! - Transporte HTTP plugável (`HttpTransport`), com multipart para arquivos
//! - Servidor de callback local e persistência de tokens em `.env` para a CLI
//!
//! ## Exemplo
//!
//! ```no_run
//! use deviantart_v1::{Credentials, DeviantArtClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::new(
//!         "client_id",
//!         "client_secret",
//!         "http://localhost:8888/callback",
//!         "basic",
//!     );
//!     let mut client = DeviantArtClient::new(credentials)?;
//!
//!     println!("Autorize em: {}", client.build_authorization_url()?);
//!
//!     client.exchange_code("codigo_recebido").await?;
//!     let user = client.whoami().await?;
//!     println!("Usuário: {}", user["username"]);
//!     Ok(())
//! }
//! ```

/// Módulo de autenticação OAuth2
pub mod auth;

/// Módulo de cliente API
pub mod client;

/// Módulo de configuração
pub mod config;

/// Módulo de tratamento de erros
pub mod error;

/// Módulo de transporte HTTP
pub mod transport;

// Re-exportações para conveniência
pub use auth::credentials::Credentials;
pub use auth::oauth::OAuthFlow;
pub use auth::token::TokenPair;
pub use client::api::{CollectionsQuery, DeviantArtClient, RefreshPolicy};
pub use config::{Endpoints, EnvManager};
pub use error::{AuthError, AuthResult};
