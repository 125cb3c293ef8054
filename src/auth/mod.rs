pub mod callback;
pub mod credentials;
pub mod oauth;
pub mod redirect;
pub mod token;

pub use callback::CallbackServer;
pub use credentials::Credentials;
pub use oauth::OAuthFlow;
pub use redirect::{BrowserRedirector, Redirector, ResponseRedirect};
pub use token::{EnvTokenStore, MemoryTokenStore, TokenPair, TokenStore};
