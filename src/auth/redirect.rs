//! Colaboradores de redirecionamento usados pelo fluxo de autorização.
//!
//! O núcleo só pede "redirecione o cliente para esta URL"; quem atende o pedido
//! (resposta HTTP, navegador local) é decisão do host. Depois de um redirecionamento
//! bem-sucedido o host deve encerrar o processamento da requisição atual.

use crate::error::{AuthError, AuthResult};

/// Destino de um pedido de redirecionamento
pub trait Redirector {
    fn redirect(&mut self, url: &str) -> AuthResult<()>;
}

/// Redirecionamento via cabeçalho `Location` de uma resposta HTTP.
///
/// Modela a resposta que o host ainda vai enviar: se os cabeçalhos já saíram,
/// o redirecionamento não é mais possível.
#[derive(Debug, Default, Clone)]
pub struct ResponseRedirect {
    headers_sent: bool,
    location: Option<String>,
}

impl ResponseRedirect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marca que os cabeçalhos da resposta já foram enviados
    pub fn mark_headers_sent(&mut self) {
        self.headers_sent = true;
    }

    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// URL registrada para o cabeçalho `Location`, se houve redirecionamento
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Status e cabeçalho prontos para o host escrever na resposta
    pub fn into_response_parts(self) -> Option<(u16, String)> {
        self.location.map(|location| (302, location))
    }
}

impl Redirector for ResponseRedirect {
    fn redirect(&mut self, url: &str) -> AuthResult<()> {
        if url.is_empty() {
            return Err(AuthError::state_error("Cannot redirect: empty URL."));
        }

        if self.headers_sent {
            return Err(AuthError::state_error("Headers already sent."));
        }

        log::debug!("↪️ Redirecionando para {}", url);
        self.location = Some(url.to_string());
        self.headers_sent = true;
        Ok(())
    }
}

/// Abre a URL no navegador padrão do sistema (fluxo local da CLI)
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserRedirector;

impl Redirector for BrowserRedirector {
    fn redirect(&mut self, url: &str) -> AuthResult<()> {
        if url.is_empty() {
            return Err(AuthError::state_error("Cannot redirect: empty URL."));
        }

        match webbrowser::open(url) {
            Ok(()) => {
                log::info!("🌐 Navegador aberto automaticamente");
                Ok(())
            }
            Err(e) => {
                log::warn!("⚠️ Não foi possível abrir o navegador automaticamente: {}", e);
                log::info!("🔗 Abra manualmente o link: {}", url);
                Err(AuthError::browser_error(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_redirect_records_location() {
        let mut redirect = ResponseRedirect::new();
        redirect.redirect("https://www.deviantart.com/oauth2/authorize").unwrap();

        assert_eq!(redirect.location(), Some("https://www.deviantart.com/oauth2/authorize"));
        assert!(redirect.headers_sent());
        assert_eq!(
            redirect.into_response_parts(),
            Some((302, "https://www.deviantart.com/oauth2/authorize".to_string()))
        );
    }

    #[test]
    fn test_response_redirect_rejects_empty_url() {
        let mut redirect = ResponseRedirect::new();
        let err = redirect.redirect("").unwrap_err();
        assert!(matches!(err, AuthError::StateError(_)));
        assert!(redirect.location().is_none());
    }

    #[test]
    fn test_response_redirect_fails_after_headers_sent() {
        let mut redirect = ResponseRedirect::new();
        redirect.mark_headers_sent();

        let err = redirect.redirect("https://example.com").unwrap_err();
        assert!(matches!(err, AuthError::StateError(ref m) if m.contains("Headers already sent")));
    }

    #[test]
    fn test_second_redirect_is_rejected() {
        let mut redirect = ResponseRedirect::new();
        redirect.redirect("https://example.com/a").unwrap();
        assert!(redirect.redirect("https://example.com/b").is_err());
        assert_eq!(redirect.location(), Some("https://example.com/a"));
    }

    #[test]
    fn test_browser_redirector_rejects_empty_url() {
        let mut browser = BrowserRedirector;
        assert!(matches!(browser.redirect(""), Err(AuthError::StateError(_))));
    }
}
