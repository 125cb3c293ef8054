use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use url::Url;
use crate::auth::credentials::Credentials;
use crate::auth::redirect::Redirector;
use crate::auth::token::{check_provider_error, TokenPair, TokenResponse};
use crate::config::Endpoints;
use crate::error::{AuthError, AuthResult};
use crate::transport::form::basename;
use crate::transport::{FileAttachment, FormData, FormValue, HttpTransport, ReqwestTransport};

/// O que fazer quando o refresh automático de `call_authenticated` falha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Segue com o token antigo e deixa o endpoint rejeitá-lo
    #[default]
    BestEffort,
    /// Devolve o erro do refresh sem chamar o endpoint
    FailFast,
}

/// Resultado de `initiate_or_complete`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationStep {
    /// O código foi trocado e o estado de tokens preenchido
    Completed(TokenPair),
    /// O redirecionamento foi emitido; o host deve parar de processar a requisição
    Redirected(String),
}

/// Parâmetros de `collections/all`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionsQuery {
    pub with_session: bool,
    pub mature_content: bool,
    pub limit: u32,
    pub offset: u32,
}

impl Default for CollectionsQuery {
    fn default() -> Self {
        Self {
            with_session: false,
            mature_content: true,
            limit: 24,
            offset: 0,
        }
    }
}

/// Cliente OAuth2 da API do DeviantArt.
///
/// Mantém as credenciais da aplicação e o par de tokens atual. Toda chamada a
/// endpoint de recurso passa por [`DeviantArtClient::call_authenticated`], que
/// renova o token sob demanda antes de enviar a requisição.
#[derive(Debug)]
pub struct DeviantArtClient<T = ReqwestTransport> {
    credentials: Credentials,
    tokens: TokenPair,
    endpoints: Endpoints,
    refresh_policy: RefreshPolicy,
    transport: T,
}

impl DeviantArtClient<ReqwestTransport> {
    /// Cria um cliente com o transporte `reqwest` padrão
    pub fn new(credentials: Credentials) -> AuthResult<Self> {
        Ok(Self::with_transport(credentials, ReqwestTransport::new()?))
    }
}

impl<T: HttpTransport> DeviantArtClient<T> {
    pub fn with_transport(credentials: Credentials, transport: T) -> Self {
        Self {
            credentials,
            tokens: TokenPair::empty(),
            endpoints: Endpoints::default(),
            refresh_policy: RefreshPolicy::default(),
            transport,
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    pub fn with_tokens(mut self, tokens: TokenPair) -> Self {
        self.tokens = tokens;
        self
    }

    // ---------------------------------------------------------------------
    // Fluxo de autorização
    // ---------------------------------------------------------------------

    /// Monta a URL de `/authorize` com `response_type=code`.
    ///
    /// Falha com `ConfigError` se client_id, client_secret, redirect_uri ou scope
    /// estiver vazio, sem nenhuma chamada de rede.
    pub fn build_authorization_url(&self) -> AuthResult<String> {
        self.authorization_url(None)
    }

    /// Igual a [`Self::build_authorization_url`], com `state` para proteção CSRF
    pub fn build_authorization_url_with_state(&self, state: &str) -> AuthResult<String> {
        self.authorization_url(Some(state))
    }

    fn authorization_url(&self, state: Option<&str>) -> AuthResult<String> {
        self.credentials.validate()?;

        let mut url = Url::parse(&self.endpoints.authorize_url()).map_err(|e| {
            AuthError::config_error(format!("URL de autorização inválida: {}", e))
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.credentials.client_id)
                .append_pair("redirect_uri", &self.credentials.redirect_uri)
                .append_pair("scope", &self.credentials.scope);
            if let Some(state) = state {
                query.append_pair("state", state);
            }
        }

        log::info!("🌐 URL de autorização gerada: {}", url);
        Ok(url.into())
    }

    /// Completa a autorização se a query trouxer `code`; senão redireciona para `/authorize`.
    ///
    /// Em `AuthorizationStep::Redirected` o host deve encerrar a requisição atual.
    pub async fn initiate_or_complete<R>(
        &mut self,
        query: &HashMap<String, String>,
        redirector: &mut R,
    ) -> AuthResult<AuthorizationStep>
    where
        R: Redirector + ?Sized,
    {
        if let Some(error) = query.get("error").filter(|e| !e.is_empty()) {
            log::warn!("❌ Autorização recusada pelo provedor: {}", error);
            if error == "access_denied" {
                return Err(AuthError::AccessDenied);
            }
            let description = query
                .get("error_description")
                .filter(|d| !d.is_empty())
                .unwrap_or(error);
            return Err(AuthError::oauth_error(description.clone()));
        }

        match query.get("code").filter(|c| !c.is_empty()) {
            Some(code) => {
                log::info!("✅ Código de autorização recebido");
                let tokens = self.exchange_code(code).await?;
                Ok(AuthorizationStep::Completed(tokens))
            }
            None => {
                let url = self.build_authorization_url()?;
                redirector.redirect(&url)?;
                Ok(AuthorizationStep::Redirected(url))
            }
        }
    }

    /// Troca o código de autorização por um par de tokens
    pub async fn exchange_code(&mut self, code: &str) -> AuthResult<TokenPair> {
        log::info!("🔄 Trocando código de autorização por token...");

        let form = FormData::new()
            .text("grant_type", "authorization_code")
            .text("client_id", &self.credentials.client_id)
            .text("client_secret", &self.credentials.client_secret)
            .text("redirect_uri", &self.credentials.redirect_uri)
            .text("code", code);

        self.request_tokens(form).await
    }

    /// Troca o refresh token atual por um novo par.
    ///
    /// O par é substituído por inteiro: o DeviantArt pode rotacionar o refresh token.
    pub async fn refresh(&mut self) -> AuthResult<TokenPair> {
        let refresh_token = self
            .tokens
            .refresh()
            .ok_or_else(|| AuthError::state_error("refresh_token is empty"))?
            .to_string();

        log::info!("🔄 Renovando token de acesso...");

        let form = FormData::new()
            .text("grant_type", "refresh_token")
            .text("client_id", &self.credentials.client_id)
            .text("client_secret", &self.credentials.client_secret)
            .text("refresh_token", refresh_token);

        self.request_tokens(form).await
    }

    async fn request_tokens(&mut self, form: FormData) -> AuthResult<TokenPair> {
        let body = self
            .transport
            .perform(&self.endpoints.token_url(), &form)
            .await?;

        let tokens: TokenPair = TokenResponse::parse(&body)?.into();
        self.tokens = tokens.clone();

        log::info!("✅ Token de acesso obtido: {}", tokens.access_preview());
        Ok(tokens)
    }

    // ---------------------------------------------------------------------
    // Validade e chamadas autenticadas
    // ---------------------------------------------------------------------

    /// Consulta o endpoint placebo com o token atual.
    ///
    /// Sem access_token ou refresh_token falha com `StateError` antes de qualquer
    /// chamada de rede. Falhas do probe viram `Ok(false)`.
    pub async fn is_authenticated(&self) -> AuthResult<bool> {
        let access_token = self
            .tokens
            .access()
            .ok_or_else(|| AuthError::state_error("access_token is empty"))?;
        self.tokens
            .refresh()
            .ok_or_else(|| AuthError::state_error("refresh_token is empty"))?;

        let form = FormData::new().text("access_token", access_token);

        let body = match self.transport.perform(&self.endpoints.placebo_url(), &form).await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("❌ Falha no probe do token: {}", e);
                return Ok(false);
            }
        };

        match serde_json::from_str::<Value>(&body) {
            Ok(value) => {
                let alive = value.get("status").and_then(Value::as_str) == Some("success");
                log::debug!("🔍 Probe do token: {}", if alive { "válido" } else { "inválido" });
                Ok(alive)
            }
            Err(e) => {
                log::warn!("❌ Resposta inválida do probe: {}", e);
                Ok(false)
            }
        }
    }

    /// Chama um endpoint de recurso com o `access_token`.
    ///
    /// Se o token não for confirmado pelo probe, faz exatamente um `refresh()` antes;
    /// a falha desse refresh segue a [`RefreshPolicy`] configurada.
    pub async fn call_authenticated(&mut self, endpoint: &str, mut params: FormData) -> AuthResult<Value> {
        if !matches!(self.is_authenticated().await, Ok(true)) {
            log::info!("🔑 Token não confirmado, tentando refresh antes de {}", endpoint);

            if let Err(e) = self.refresh().await {
                match self.refresh_policy {
                    RefreshPolicy::BestEffort => {
                        log::warn!("⚠️ Refresh falhou ({}), seguindo com o token atual", e);
                    }
                    RefreshPolicy::FailFast => return Err(e),
                }
            }
        }

        if let Some(access_token) = self.tokens.access() {
            params.insert("access_token", FormValue::Text(access_token.to_string()));
        }

        let body = self
            .transport
            .perform(&self.endpoints.resource_url(endpoint), &params)
            .await?;

        let value: Value = serde_json::from_str(&body)?;
        check_provider_error(&value)?;
        Ok(value)
    }

    /// GET user/whoami - usuário autenticado
    pub async fn whoami(&mut self) -> AuthResult<Value> {
        log::info!("👤 Obtendo informações do usuário autenticado...");
        self.call_authenticated("user/whoami", FormData::new()).await
    }

    /// Lista as coleções (favoritos) de um usuário
    pub async fn get_collections(&mut self, username: &str, query: CollectionsQuery) -> AuthResult<Value> {
        log::info!("📚 Obtendo coleções de {}...", username);

        let params = FormData::new()
            .text("username", username)
            .text("with_session", query.with_session)
            .text("mature_content", query.mature_content)
            .text("limit", query.limit)
            .text("offset", query.offset);

        self.call_authenticated("collections/all", params).await
    }

    /// Envia um arquivo para o Sta.sh usando o nome do arquivo como título
    pub async fn upload_file(&mut self, path: impl AsRef<Path>) -> AuthResult<Value> {
        let path = path.as_ref();
        let attachment = FileAttachment::new(path).with_inferred_mime();
        self.upload_attachment(&basename(path), attachment).await
    }

    /// Envia um anexo para o Sta.sh com título explícito
    pub async fn upload_attachment(&mut self, title: &str, attachment: FileAttachment) -> AuthResult<Value> {
        log::info!("📤 Enviando {} para o Sta.sh...", attachment.path.display());

        let params = FormData::new()
            .text("title", title)
            .file("file", attachment);

        self.call_authenticated("stash/submit", params).await
    }

    // ---------------------------------------------------------------------
    // Acessores
    // ---------------------------------------------------------------------

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Substitui as credenciais por inteiro
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = credentials;
    }

    pub fn redirect(&self) -> &str {
        &self.credentials.redirect_uri
    }

    /// Troca só o redirect_uri (pode variar a cada tentativa de autorização)
    pub fn set_redirect(&mut self, redirect_uri: Option<String>) {
        self.credentials.redirect_uri = redirect_uri.unwrap_or_default();
    }

    pub fn token(&self) -> TokenPair {
        self.tokens.clone()
    }

    pub fn set_token(&mut self, access_token: Option<String>, refresh_token: Option<String>) {
        self.tokens = TokenPair {
            access_token,
            refresh_token,
        };
    }

    pub fn clear_token(&mut self) {
        self.tokens = TokenPair::empty();
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        self.refresh_policy
    }

    pub fn set_refresh_policy(&mut self, policy: RefreshPolicy) {
        self.refresh_policy = policy;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
