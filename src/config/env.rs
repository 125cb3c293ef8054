use dotenv::dotenv;
use std::env;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use url::Url;
use crate::auth::credentials::Credentials;
use crate::auth::token::TokenPair;
use crate::config::endpoints::{Endpoints, DEFAULT_API_URL, DEFAULT_OAUTH_URL};
use crate::error::{AuthError, AuthResult};

pub const ENV_FILE: &str = ".env";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8888/callback";
pub const DEFAULT_SCOPE: &str = "basic";
pub const DEFAULT_CALLBACK_PORT: u16 = 8888;

const ACCESS_TOKEN_VAR: &str = "DEVIANTART_ACCESS_TOKEN";
const REFRESH_TOKEN_VAR: &str = "DEVIANTART_REFRESH_TOKEN";

/// Gerenciador de variáveis de ambiente para o OAuth2 do DeviantArt
#[derive(Debug, Clone)]
pub struct EnvManager {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub oauth_base_url: String,
    pub api_base_url: String,
    pub callback_port: u16,
}

impl EnvManager {
    /// Carrega as configurações do ambiente (e do `.env`, se existir)
    pub fn load() -> AuthResult<Self> {
        // Durante testes, as variáveis são configuradas diretamente
        if cfg!(not(test)) && Path::new(ENV_FILE).exists() {
            dotenv().map_err(|e| AuthError::config_error(format!("Erro ao carregar .env: {}", e)))?;
        }

        let client_id = Self::get_env_var("DEVIANTART_CLIENT_ID")?;
        let client_secret = Self::get_env_var("DEVIANTART_CLIENT_SECRET")?;

        let redirect_uri = env::var("DEVIANTART_REDIRECT_URI")
            .unwrap_or_else(|_| DEFAULT_REDIRECT_URI.to_string());
        let scope = env::var("DEVIANTART_SCOPE").unwrap_or_else(|_| DEFAULT_SCOPE.to_string());

        let oauth_base_url = env::var("DEVIANTART_OAUTH_URL")
            .unwrap_or_else(|_| DEFAULT_OAUTH_URL.to_string());
        let api_base_url = env::var("DEVIANTART_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let callback_port = Self::resolve_callback_port(
            env::var("CALLBACK_PORT").ok().and_then(|p| p.parse().ok()),
            &redirect_uri,
        );

        log::debug!("Configuração carregada (redirect: {}, scope: {})", redirect_uri, scope);

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
            scope,
            oauth_base_url,
            api_base_url,
            callback_port,
        })
    }

    /// Obtém variável de ambiente obrigatória
    fn get_env_var(key: &str) -> AuthResult<String> {
        env::var(key).map_err(|_| AuthError::env_error(format!("{} não encontrado", key)))
    }

    fn port_from_redirect(redirect_uri: &str) -> Option<u16> {
        Url::parse(redirect_uri).ok()?.port()
    }

    /// Porta do servidor de callback: a explícita, senão a do redirect_uri, senão 8888
    pub fn resolve_callback_port(explicit: Option<u16>, redirect_uri: &str) -> u16 {
        explicit
            .or_else(|| Self::port_from_redirect(redirect_uri))
            .unwrap_or(DEFAULT_CALLBACK_PORT)
    }

    /// Valida se todas as configurações obrigatórias estão presentes
    pub fn validate(&self) -> AuthResult<()> {
        if self.client_id.is_empty() {
            return Err(AuthError::config_error("DEVIANTART_CLIENT_ID é obrigatório"));
        }

        if self.client_secret.is_empty() {
            return Err(AuthError::config_error("DEVIANTART_CLIENT_SECRET é obrigatório"));
        }

        if self.redirect_uri.is_empty() {
            return Err(AuthError::config_error("DEVIANTART_REDIRECT_URI é obrigatório"));
        }

        if !self.redirect_uri.starts_with("http://") && !self.redirect_uri.starts_with("https://") {
            return Err(AuthError::config_error("DEVIANTART_REDIRECT_URI deve ser uma URL válida"));
        }

        if self.scope.is_empty() {
            return Err(AuthError::config_error("DEVIANTART_SCOPE é obrigatório"));
        }

        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            self.redirect_uri.clone(),
            self.scope.clone(),
        )
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(self.oauth_base_url.clone(), self.api_base_url.clone())
    }

    /// Indica se o redirect aponta para a máquina local (fluxo com servidor de callback)
    pub fn is_local_redirect(&self) -> bool {
        Url::parse(&self.redirect_uri)
            .ok()
            .and_then(|u| u.host_str().map(|h| h == "localhost" || h == "127.0.0.1"))
            .unwrap_or(false)
    }

    /// Tokens armazenados no ambiente
    pub fn get_tokens() -> TokenPair {
        if cfg!(not(test)) && Path::new(ENV_FILE).exists() {
            dotenv().ok();
        }

        TokenPair {
            access_token: env::var(ACCESS_TOKEN_VAR).ok().filter(|t| !t.is_empty()),
            refresh_token: env::var(REFRESH_TOKEN_VAR).ok().filter(|t| !t.is_empty()),
        }
    }

    /// Salva o par de tokens no processo e no `.env`
    pub fn save_tokens(tokens: &TokenPair) -> AuthResult<()> {
        let access = tokens.access().unwrap_or_default();
        let refresh = tokens.refresh().unwrap_or_default();

        env::set_var(ACCESS_TOKEN_VAR, access);
        env::set_var(REFRESH_TOKEN_VAR, refresh);

        // Durante testes, nunca toca no arquivo
        if cfg!(test) {
            return Ok(());
        }

        Self::update_env_file(Path::new(ENV_FILE), ACCESS_TOKEN_VAR, access)?;
        Self::update_env_file(Path::new(ENV_FILE), REFRESH_TOKEN_VAR, refresh)
    }

    /// Remove os tokens do processo e do `.env`
    pub fn remove_tokens() -> AuthResult<()> {
        env::remove_var(ACCESS_TOKEN_VAR);
        env::remove_var(REFRESH_TOKEN_VAR);

        if cfg!(test) || !Path::new(ENV_FILE).exists() {
            return Ok(());
        }

        Self::update_env_file(Path::new(ENV_FILE), ACCESS_TOKEN_VAR, "")?;
        Self::update_env_file(Path::new(ENV_FILE), REFRESH_TOKEN_VAR, "")
    }

    /// Atualiza (ou remove, com valor vazio) uma variável em um arquivo `.env`
    pub fn update_env_file(env_path: &Path, key: &str, value: &str) -> AuthResult<()> {
        let mut lines = Vec::new();
        let mut key_found = false;
        let prefix = format!("{}=", key);

        if let Ok(file) = std::fs::File::open(env_path) {
            let reader = BufReader::new(file);
            for line in reader.lines() {
                let line = line?;
                if line.starts_with(&prefix) {
                    if !value.is_empty() {
                        lines.push(format!("{}{}", prefix, value));
                    }
                    key_found = true;
                } else {
                    lines.push(line);
                }
            }
        }

        if !key_found && !value.is_empty() {
            lines.push(format!("{}{}", prefix, value));
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(env_path)?;

        for line in lines {
            writeln!(file, "{}", line)?;
        }

        log::info!("Variável {} atualizada em {}", key, env_path.display());
        Ok(())
    }

    /// Cria um `.env` padrão se não existir
    pub fn create_env_file_if_not_exists() -> AuthResult<bool> {
        if Path::new(ENV_FILE).exists() {
            return Ok(false);
        }

        std::fs::write(ENV_FILE, Self::default_env_content())?;
        log::info!("Arquivo .env criado com configurações padrão");
        Ok(true)
    }

    fn default_env_content() -> String {
        format!(
            r#"# DeviantArt OAuth2 Credentials
DEVIANTART_CLIENT_ID=your_client_id_here
DEVIANTART_CLIENT_SECRET=your_client_secret_here
DEVIANTART_REDIRECT_URI={redirect}
DEVIANTART_SCOPE={scope}

# Tokens (preenchidos automaticamente)
DEVIANTART_ACCESS_TOKEN=
DEVIANTART_REFRESH_TOKEN=

# Configurações opcionais
DEVIANTART_OAUTH_URL={oauth}
DEVIANTART_API_URL={api}
CALLBACK_PORT={port}
"#,
            redirect = DEFAULT_REDIRECT_URI,
            scope = DEFAULT_SCOPE,
            oauth = DEFAULT_OAUTH_URL,
            api = DEFAULT_API_URL,
            port = DEFAULT_CALLBACK_PORT,
        )
    }

    /// Retorna informações sobre o ambiente
    pub fn environment_info(&self) -> String {
        format!(
            "DeviantArt (porta: {}, redirect: {}, scope: {})",
            self.callback_port, self.redirect_uri, self.scope
        )
    }
}
