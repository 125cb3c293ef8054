use serde::{Deserialize, Serialize};
use crate::error::{AuthError, AuthResult};

/// Credenciais da aplicação registrada no DeviantArt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Lista de permissões separada por espaço ou vírgula (ex.: `basic stash`)
    pub scope: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scope: scope.into(),
        }
    }

    /// Garante que os quatro campos estão preenchidos.
    ///
    /// A ordem da verificação é fixa: client_id, client_secret, redirect_uri, scope.
    /// O primeiro campo vazio é o reportado.
    pub fn validate(&self) -> AuthResult<()> {
        if self.client_id.is_empty() {
            return Err(AuthError::config_error("The client_id must not be empty."));
        }

        if self.client_secret.is_empty() {
            return Err(AuthError::config_error("The client_secret must not be empty."));
        }

        if self.redirect_uri.is_empty() {
            return Err(AuthError::config_error("The redirect_uri must not be empty."));
        }

        if self.scope.is_empty() {
            return Err(AuthError::config_error("The scope must not be empty."));
        }

        Ok(())
    }

    /// Escopos individuais, aceitando espaço ou vírgula como separador
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> Credentials {
        Credentials::new("id", "secret", "http://localhost:8888/callback", "basic")
    }

    #[test]
    fn test_validate_complete_credentials() {
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let mut creds = Credentials::default();
        let err = creds.validate().unwrap_err();
        assert!(err.to_string().contains("client_id"));

        creds.client_id = "id".into();
        let err = creds.validate().unwrap_err();
        assert!(err.to_string().contains("client_secret"));

        creds.client_secret = "secret".into();
        let err = creds.validate().unwrap_err();
        assert!(err.to_string().contains("redirect_uri"));

        creds.redirect_uri = "http://localhost".into();
        let err = creds.validate().unwrap_err();
        assert!(matches!(err, AuthError::ConfigError(ref m) if m.contains("scope")));
    }

    #[test]
    fn test_each_missing_field_is_a_config_error() {
        for field in 0..4 {
            let mut creds = complete();
            match field {
                0 => creds.client_id.clear(),
                1 => creds.client_secret.clear(),
                2 => creds.redirect_uri.clear(),
                _ => creds.scope.clear(),
            }
            assert!(matches!(creds.validate(), Err(AuthError::ConfigError(_))));
        }
    }

    #[test]
    fn test_scopes_split_on_space_and_comma() {
        let creds = Credentials::new("id", "secret", "http://x", "basic stash,browse");
        assert_eq!(creds.scopes(), vec!["basic", "stash", "browse"]);
    }
}
