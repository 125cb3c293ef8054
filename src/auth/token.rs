use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use crate::config::EnvManager;
use crate::error::{AuthError, AuthResult};

/// Par de tokens OAuth2 mantido pelo cliente.
///
/// Ou os dois campos são `None` (não autenticado) ou os dois estão preenchidos.
/// Não há controle de expiração: a validade é verificada sob demanda no endpoint placebo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Token de acesso, ignorando string vazia
    pub fn access(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Refresh token, ignorando string vazia
    pub fn refresh(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn is_complete(&self) -> bool {
        self.access().is_some() && self.refresh().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.access().is_none() && self.refresh().is_none()
    }

    /// Prévia do token de acesso para logs (nunca o valor completo)
    pub fn access_preview(&self) -> String {
        match self.access() {
            Some(token) if token.chars().count() > 10 => {
                let head: String = token.chars().take(4).collect();
                let mut tail: Vec<char> = token.chars().rev().take(4).collect();
                tail.reverse();
                format!("{}...{}", head, tail.into_iter().collect::<String>())
            }
            Some(_) => "***".to_string(),
            None => "<vazio>".to_string(),
        }
    }
}

/// Resposta de sucesso do endpoint `/token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl From<TokenResponse> for TokenPair {
    fn from(response: TokenResponse) -> Self {
        Self::new(response.access_token, response.refresh_token)
    }
}

impl TokenResponse {
    /// Interpreta o corpo JSON do endpoint de token.
    ///
    /// Um campo `error` não vazio vira `AuthError::OAuth` com o `error_description` do provedor.
    pub fn parse(body: &str) -> AuthResult<Self> {
        let value: Value = serde_json::from_str(body)?;
        check_provider_error(&value)?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Falha com `AuthError::OAuth` quando a resposta carrega um campo `error`
pub fn check_provider_error(value: &Value) -> AuthResult<()> {
    let error = match value.get("error") {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::String(s)) if s.is_empty() => return Ok(()),
        Some(Value::Bool(false)) => return Ok(()),
        Some(error) => error,
    };

    let description = value
        .get("error_description")
        .and_then(|d| d.as_str())
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| match error {
            Value::String(code) => code.clone(),
            other => other.to_string(),
        });

    Err(AuthError::oauth_error(description))
}

/// Armazenamento do par de tokens fornecido pelo chamador
pub trait TokenStore: Send + Sync {
    fn load(&self) -> TokenPair;
    fn save(&self, tokens: &TokenPair) -> AuthResult<()>;
    fn remove(&self) -> AuthResult<()>;
}

/// Tokens em variáveis de ambiente / `.env` (usado pela CLI)
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvTokenStore;

impl TokenStore for EnvTokenStore {
    fn load(&self) -> TokenPair {
        EnvManager::get_tokens()
    }

    fn save(&self, tokens: &TokenPair) -> AuthResult<()> {
        EnvManager::save_tokens(tokens)
    }

    fn remove(&self) -> AuthResult<()> {
        EnvManager::remove_tokens()
    }
}

/// Tokens apenas em memória, durante a vida do processo
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<TokenPair>,
}

impl MemoryTokenStore {
    pub fn new(tokens: TokenPair) -> Self {
        Self {
            tokens: Mutex::new(tokens),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> TokenPair {
        self.tokens.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn save(&self, tokens: &TokenPair) -> AuthResult<()> {
        let mut guard = self
            .tokens
            .lock()
            .map_err(|_| AuthError::state_error("token store poisoned"))?;
        *guard = tokens.clone();
        Ok(())
    }

    fn remove(&self) -> AuthResult<()> {
        self.save(&TokenPair::empty())
    }
}
