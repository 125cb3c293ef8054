use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use super::form::{FormData, FormValue};
use crate::error::{AuthError, AuthResult};

/// Capacidade de chamada HTTP consumida pelo cliente.
///
/// `perform` envia os campos para `url` e devolve o corpo bruto da resposta,
/// independente do status HTTP: o DeviantArt reporta erros no próprio JSON.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn perform(&self, url: &str, form: &FormData) -> AuthResult<String>;
}

/// Transporte padrão baseado em `reqwest`.
///
/// Sem anexos, os campos vão form-encoded no corpo do POST; com qualquer
/// `FormValue::File` a requisição vira `multipart/form-data`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Timeouts: total 30s, conexão 5s
    pub fn new() -> AuthResult<Self> {
        Self::with_timeouts(30, 5)
    }

    pub fn with_timeouts(total_timeout_secs: u64, connect_timeout_secs: u64) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(total_timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
            .map_err(|e| AuthError::transport_error(format!("Falha ao criar cliente HTTP: {}", e)))?;

        Ok(Self { client })
    }

    async fn build_multipart(form: &FormData) -> AuthResult<Form> {
        let mut multipart = Form::new();

        for (name, value) in form.iter() {
            multipart = match value {
                FormValue::Text(text) => multipart.text(name.to_string(), text.clone()),
                FormValue::File(file) => {
                    let bytes = tokio::fs::read(&file.path).await?;
                    log::debug!(
                        "📎 Anexando {} ({} bytes) no campo '{}'",
                        file.path.display(),
                        bytes.len(),
                        name
                    );

                    let mut part = Part::bytes(bytes).file_name(file.effective_filename());
                    if let Some(mime) = &file.mime_type {
                        part = part.mime_str(mime).map_err(|e| {
                            AuthError::transport_error(format!("MIME type inválido '{}': {}", mime, e))
                        })?;
                    }
                    multipart.part(name.to_string(), part)
                }
            };
        }

        Ok(multipart)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn perform(&self, url: &str, form: &FormData) -> AuthResult<String> {
        let request = if form.has_file() {
            log::debug!("POST (multipart) {}", url);
            self.client.post(url).multipart(Self::build_multipart(form).await?)
        } else {
            log::debug!("POST {} ({} campos)", url, form.len());
            self.client.post(url).form(&form.text_pairs())
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        log::debug!("Response status: {}, {} bytes", status, body.len());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::form::FileAttachment;
    use mockito::Matcher;
    use std::io::Write;

    #[tokio::test]
    async fn test_form_encoded_post() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("redirect_uri".into(), "http://localhost:8888/callback".into()),
            ]))
            .with_body(r#"{"status":"success"}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let form = FormData::new()
            .text("grant_type", "refresh_token")
            .text("redirect_uri", "http://localhost:8888/callback");

        let body = transport
            .perform(&format!("{}/token", server.url()), &form)
            .await
            .unwrap();

        assert_eq!(body, r#"{"status":"success"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_still_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/placebo")
            .with_status(401)
            .with_body(r#"{"error":"invalid_token","error_description":"Expired oAuth2 user token."}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let body = transport
            .perform(&format!("{}/placebo", server.url()), &FormData::new())
            .await
            .unwrap();

        assert!(body.contains("invalid_token"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_multipart_when_file_present() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"fake-png-bytes").unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/stash/submit")
            .match_header("content-type", Matcher::Regex("^multipart/form-data".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="title""#.into()),
                Matcher::Regex(r#"name="file"; filename="cover.png""#.into()),
                Matcher::Regex("image/png".into()),
                Matcher::Regex("fake-png-bytes".into()),
            ]))
            .with_body(r#"{"status":"success","itemid":1}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let form = FormData::new().text("title", "cover").file(
            "file",
            FileAttachment::new(file.path())
                .with_filename("cover.png")
                .with_inferred_mime(),
        );

        let body = transport
            .perform(&format!("{}/stash/submit", server.url()), &form)
            .await
            .unwrap();

        assert!(body.contains("itemid"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_attachment_is_io_error() {
        let transport = ReqwestTransport::new().unwrap();
        let form = FormData::new().file("file", FileAttachment::new("/nonexistent/file.png"));

        let err = transport
            .perform("http://127.0.0.1:9/stash/submit", &form)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::IoError(_)));
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        let transport = ReqwestTransport::with_timeouts(2, 1).unwrap();
        let err = transport
            .perform("http://127.0.0.1:9/placebo", &FormData::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::NetworkError(_)));
    }
}
