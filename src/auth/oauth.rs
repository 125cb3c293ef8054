use std::collections::HashMap;
use std::time::Duration;
use url::Url;
use crate::auth::callback::CallbackServer;
use crate::auth::redirect::{BrowserRedirector, Redirector};
use crate::auth::token::{EnvTokenStore, TokenPair, TokenStore};
use crate::client::api::{AuthorizationStep, DeviantArtClient};
use crate::config::EnvManager;
use crate::error::{AuthError, AuthResult};

/// Orquestra o ciclo de vida dos tokens para a CLI.
///
/// Combina o [`DeviantArtClient`] com um [`TokenStore`]: reaproveita tokens
/// salvos, renova quando possível e só então abre o navegador para uma nova
/// autorização com servidor de callback local.
pub struct OAuthFlow {
    env_manager: EnvManager,
    client: DeviantArtClient,
    store: Box<dyn TokenStore>,
    redirector: Box<dyn Redirector + Send>,
    callback_timeout: Duration,
}

impl OAuthFlow {
    /// Cria o fluxo a partir das variáveis de ambiente, com tokens no `.env`
    pub fn new() -> AuthResult<Self> {
        let env_manager = EnvManager::load()?;
        Self::with_store(env_manager, Box::new(EnvTokenStore))
    }

    pub fn with_store(env_manager: EnvManager, store: Box<dyn TokenStore>) -> AuthResult<Self> {
        env_manager.validate()?;

        let client = DeviantArtClient::new(env_manager.credentials())?
            .with_endpoints(env_manager.endpoints())
            .with_tokens(store.load());

        Ok(Self {
            env_manager,
            client,
            store,
            redirector: Box::new(BrowserRedirector),
            callback_timeout: Duration::from_secs(300),
        })
    }

    /// Troca quem leva o usuário até a URL de autorização (padrão: navegador do sistema)
    pub fn with_redirector(mut self, redirector: Box<dyn Redirector + Send>) -> Self {
        self.redirector = redirector;
        self
    }

    /// Tempo máximo de espera pelo redirect no fluxo local
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    pub fn client(&self) -> &DeviantArtClient {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut DeviantArtClient {
        &mut self.client
    }

    /// Garante um par de tokens válido
    pub async fn authenticate(&mut self) -> AuthResult<TokenPair> {
        log::info!("🔑 Iniciando processo de autenticação OAuth2...");
        log::info!("📍 {}", self.env_manager.environment_info());

        let current = self.client.token();

        if current.is_complete() {
            log::info!("🔍 Token encontrado, validando...");

            if self.is_authenticated().await {
                log::info!("✅ Token válido! Autenticação concluída.");
                return Ok(current);
            }

            match self.refresh().await {
                Ok(tokens) => return Ok(tokens),
                Err(e) => {
                    log::warn!("❌ Refresh falhou ({}), iniciando novo fluxo OAuth2...", e);
                    self.store.remove()?;
                    self.client.clear_token();
                }
            }
        } else {
            log::info!("🆕 Nenhum token encontrado, iniciando fluxo OAuth2...");
        }

        self.execute_local_oauth_flow().await
    }

    /// Autorização interativa: navegador + servidor de callback local
    async fn execute_local_oauth_flow(&mut self) -> AuthResult<TokenPair> {
        if !self.env_manager.is_local_redirect() {
            return Err(AuthError::config_error(format!(
                "O redirect {} não aponta para esta máquina. \
                Use `auth-url` para obter a URL e `exchange --code` com o código recebido.",
                self.env_manager.redirect_uri
            )));
        }

        log::info!("🏠 Executando fluxo OAuth2 local...");

        let state = CallbackServer::generate_state();
        let auth_url = self.client.build_authorization_url_with_state(&state)?;

        let callback_path = Url::parse(&self.env_manager.redirect_uri)?.path().to_string();
        let callback_server = CallbackServer::new(self.env_manager.callback_port, Some(state))
            .with_path(callback_path)
            .with_timeout(self.callback_timeout);

        let server_handle = tokio::spawn(callback_server.start_and_wait());

        if let Err(e) = self.redirector.redirect(&auth_url) {
            log::warn!("⚠️ Não foi possível abrir a URL de autorização ({}): {}", e, auth_url);
        }

        log::info!("⏳ Aguardando autorização do usuário...");

        let params = server_handle
            .await
            .map_err(|e| AuthError::callback_error(format!("Erro na thread do servidor: {}", e)))??;

        self.complete_from_callback(&params).await
    }

    /// Conclui a autorização com a query recebida no redirect
    pub async fn complete_from_callback(&mut self, params: &HashMap<String, String>) -> AuthResult<TokenPair> {
        if !params.contains_key("code") && !params.contains_key("error") {
            return Err(AuthError::callback_error("Código não encontrado no callback"));
        }

        match self.client.initiate_or_complete(params, self.redirector.as_mut()).await? {
            AuthorizationStep::Completed(tokens) => {
                self.store.save(&tokens)?;
                log::info!("✅ Autenticação OAuth2 concluída com sucesso!");
                Ok(tokens)
            }
            AuthorizationStep::Redirected(_) => {
                Err(AuthError::callback_error("Callback sem código de autorização"))
            }
        }
    }

    /// Troca um código obtido manualmente e salva os tokens
    pub async fn exchange_code(&mut self, code: &str) -> AuthResult<TokenPair> {
        let tokens = self.client.exchange_code(code).await?;
        self.store.save(&tokens)?;
        Ok(tokens)
    }

    /// Renova o par de tokens e salva o resultado
    pub async fn refresh(&mut self) -> AuthResult<TokenPair> {
        let tokens = self.client.refresh().await?;
        self.store.save(&tokens)?;
        Ok(tokens)
    }

    /// Força uma nova autorização descartando os tokens atuais
    pub async fn force_reauth(&mut self) -> AuthResult<TokenPair> {
        log::info!("🔄 Forçando nova autenticação...");
        self.revoke_token()?;
        self.execute_local_oauth_flow().await
    }

    /// `true` apenas se o probe confirmar o token atual
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.client.is_authenticated().await, Ok(true))
    }

    /// Salva os tokens do cliente se mudaram (ex.: refresh automático em uma chamada)
    pub fn persist_tokens(&self) -> AuthResult<()> {
        let current = self.client.token();
        if current.is_complete() && current != self.store.load() {
            log::debug!("💾 Salvando tokens renovados");
            self.store.save(&current)?;
        }
        Ok(())
    }

    /// Remove os tokens localmente.
    ///
    /// Não há chamada ao provedor: os tokens apenas deixam de ser usados.
    pub fn revoke_token(&mut self) -> AuthResult<()> {
        if !self.client.token().is_empty() {
            log::info!("🗑️ Removendo tokens locais...");
        }
        self.store.remove()?;
        self.client.clear_token();
        Ok(())
    }

    /// Retorna informações sobre a configuração atual
    pub fn get_config_info(&self) -> HashMap<String, String> {
        let mut info = HashMap::new();
        let tokens = self.client.token();

        info.insert("environment".to_string(), self.env_manager.environment_info());
        info.insert("oauth_base_url".to_string(), self.env_manager.oauth_base_url.clone());
        info.insert("api_base_url".to_string(), self.env_manager.api_base_url.clone());
        info.insert("redirect_uri".to_string(), self.env_manager.redirect_uri.clone());
        info.insert("scope".to_string(), self.env_manager.scope.clone());
        info.insert(
            "scopes".to_string(),
            self.client.credentials().scopes().join(","),
        );
        info.insert("has_token".to_string(), tokens.is_complete().to_string());
        info.insert("access_token".to_string(), tokens.access_preview());
        info.insert(
            "refresh_policy".to_string(),
            format!("{:?}", self.client.refresh_policy()),
        );

        info
    }
}
