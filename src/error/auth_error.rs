use thiserror::Error;

/// Tipos de erro do cliente OAuth2 do DeviantArt
#[derive(Error, Debug)]
pub enum AuthError {
    /// Credencial ou escopo ausente antes de montar a URL de autorização
    #[error("Configuração inválida: {0}")]
    ConfigError(String),

    /// O provedor respondeu com `error` / `error_description`
    #[error("Erro OAuth2: {0}")]
    OAuth(String),

    /// Operação chamada sem o estado local necessário
    #[error("Estado inválido: {0}")]
    StateError(String),

    #[error("Erro de transporte: {0}")]
    TransportError(String),

    #[error("Erro de rede: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Erro de parsing de URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Erro de IO: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Erro de serialização: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Erro de variável de ambiente: {0}")]
    EnvError(String),

    #[error("Erro do servidor de callback: {0}")]
    CallbackServerError(String),

    #[error("Acesso negado pelo usuário")]
    AccessDenied,

    #[error("Estado OAuth2 inválido")]
    InvalidState,

    #[error("Erro do navegador: {0}")]
    BrowserError(String),

    #[error("Timeout durante autenticação")]
    Timeout,
}

impl AuthError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn oauth_error(msg: impl Into<String>) -> Self {
        Self::OAuth(msg.into())
    }

    pub fn state_error(msg: impl Into<String>) -> Self {
        Self::StateError(msg.into())
    }

    pub fn transport_error(msg: impl Into<String>) -> Self {
        Self::TransportError(msg.into())
    }

    pub fn env_error(msg: impl Into<String>) -> Self {
        Self::EnvError(msg.into())
    }

    pub fn callback_error(msg: impl Into<String>) -> Self {
        Self::CallbackServerError(msg.into())
    }

    pub fn browser_error(msg: impl Into<String>) -> Self {
        Self::BrowserError(msg.into())
    }

    /// Indica se o erro veio do provedor (e não de estado local ou transporte)
    pub fn is_oauth(&self) -> bool {
        matches!(self, Self::OAuth(_))
    }
}

/// Tipo de resultado padrão para operações de autenticação
pub type AuthResult<T> = Result<T, AuthError>;
