use anyhow::{anyhow, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use deviantart_v1::auth::callback::CallbackServer;
use deviantart_v1::auth::oauth::OAuthFlow;
use deviantart_v1::auth::redirect::{BrowserRedirector, Redirector};
use deviantart_v1::auth::token::EnvTokenStore;
use deviantart_v1::client::api::CollectionsQuery;
use deviantart_v1::config::endpoints::{DEFAULT_API_URL, DEFAULT_OAUTH_URL};
use deviantart_v1::config::env::{DEFAULT_REDIRECT_URI, DEFAULT_SCOPE};
use deviantart_v1::config::EnvManager;
use deviantart_v1::AuthResult;
use deviantart_v1::transport::form::basename;
use deviantart_v1::transport::FileAttachment;
use serde_json::json;
use std::path::PathBuf;

/// DeviantArt CLI - Interface de linha de comando para a API v1 do DeviantArt
#[derive(Parser)]
#[command(name = "deviantart")]
#[command(version)]
#[command(about = "CLI para autenticação OAuth2 e chamadas à API do DeviantArt", long_about = None)]
struct Cli {
    /// Client ID da aplicação (ou use DEVIANTART_CLIENT_ID)
    #[arg(long, env = "DEVIANTART_CLIENT_ID", global = true, hide_env_values = true)]
    client_id: Option<String>,

    /// Client secret da aplicação (ou use DEVIANTART_CLIENT_SECRET)
    #[arg(long, env = "DEVIANTART_CLIENT_SECRET", global = true, hide_env_values = true)]
    client_secret: Option<String>,

    /// URL de redirect registrada no DeviantArt
    #[arg(long, env = "DEVIANTART_REDIRECT_URI", default_value = DEFAULT_REDIRECT_URI, global = true)]
    redirect_uri: String,

    /// Permissões solicitadas (ex.: "basic stash")
    #[arg(long, env = "DEVIANTART_SCOPE", default_value = DEFAULT_SCOPE, global = true)]
    scope: String,

    /// Token de acesso (sobrepõe o salvo no .env)
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Refresh token (sobrepõe o salvo no .env)
    #[arg(long, global = true)]
    refresh_token: Option<String>,

    /// URL base do OAuth2
    #[arg(long, env = "DEVIANTART_OAUTH_URL", default_value = DEFAULT_OAUTH_URL, global = true)]
    oauth_url: String,

    /// URL base da API
    #[arg(long, env = "DEVIANTART_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// Porta do servidor de callback local (padrão: a do redirect_uri, senão 8888)
    #[arg(long, env = "CALLBACK_PORT", global = true)]
    callback_port: Option<u16>,

    /// Formato de saída (json, pretty)
    #[arg(short = 'o', long, default_value = "pretty", global = true)]
    output: OutputFormat,

    /// Modo verbose para debug
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Comando a executar
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, PartialEq)]
enum OutputFormat {
    Json,
    Pretty,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "pretty" => Ok(OutputFormat::Pretty),
            _ => Err(format!("Formato desconhecido: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Autentica via OAuth2 (navegador + callback local) e salva os tokens
    Auth {
        /// Força reautenticação mesmo se já houver token válido
        #[arg(short = 'f', long)]
        force: bool,
    },

    /// Mostra a URL de autorização (para redirects fora desta máquina)
    AuthUrl,

    /// Troca um código de autorização por tokens
    Exchange {
        /// Código recebido no redirect
        #[arg(short = 'c', long)]
        code: String,
    },

    /// Renova o par de tokens
    Refresh,

    /// Verifica se o token atual é aceito pelo DeviantArt
    Status,

    /// Obtém informações do usuário autenticado
    Whoami,

    /// Lista as coleções de um usuário
    Collections {
        /// Nome do usuário
        #[arg(short = 'u', long)]
        username: String,

        /// Incluir dados da sessão
        #[arg(long)]
        with_session: bool,

        /// Excluir conteúdo adulto
        #[arg(long)]
        no_mature: bool,

        /// Quantidade de itens
        #[arg(short = 'l', long, default_value_t = 24)]
        limit: u32,

        /// Deslocamento da paginação
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Envia um arquivo para o Sta.sh
    Upload {
        /// Caminho do arquivo
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Título (padrão: nome do arquivo)
        #[arg(short = 't', long)]
        title: Option<String>,

        /// MIME type (padrão: inferido pela extensão)
        #[arg(long)]
        mime: Option<String>,
    },

    /// Mostra a configuração atual
    Config {
        /// Cria um .env padrão se ainda não existir
        #[arg(long)]
        init: bool,
    },
}

/// Estrutura para resposta padronizada
#[derive(serde::Serialize)]
struct CliResponse {
    success: bool,
    data: Option<serde_json::Value>,
    error: Option<String>,
    timestamp: String,
}

impl CliResponse {
    fn success(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    fn error(msg: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[tokio::main]
async fn main() {
    // Carrega o .env antes do parse para os fallbacks de variáveis de ambiente
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let output_format = cli.output.clone();

    match execute_command(&cli).await {
        Ok(response) => {
            let exit_code = if response.success { 0 } else { 1 };
            output_response(response, &output_format);
            std::process::exit(exit_code);
        }
        Err(e) => {
            output_response(CliResponse::error(format!("{:#}", e)), &output_format);
            std::process::exit(1);
        }
    }
}

async fn execute_command(cli: &Cli) -> anyhow::Result<CliResponse> {
    match &cli.command {
        Commands::Auth { force } => handle_auth(cli, *force).await,

        Commands::AuthUrl => {
            let flow = build_flow(cli)?;
            let state = CallbackServer::generate_state();
            let url = flow.client().build_authorization_url_with_state(&state)?;

            Ok(CliResponse::success(json!({
                "url": url,
                "state": state,
                "message": "Abra a URL, autorize e use `exchange --code` com o código recebido"
            })))
        }

        Commands::Exchange { code } => {
            let mut flow = build_flow(cli)?;

            match flow.exchange_code(code).await {
                Ok(tokens) => Ok(CliResponse::success(json!({
                    "message": "Código trocado com sucesso!",
                    "token_preview": tokens.access_preview(),
                    "note": "Tokens salvos no .env"
                }))),
                Err(e) => Ok(CliResponse::error(e.to_string())),
            }
        }

        Commands::Refresh => {
            let mut flow = build_flow(cli)?;

            match flow.refresh().await {
                Ok(tokens) => Ok(CliResponse::success(json!({
                    "message": "Token renovado com sucesso!",
                    "token_preview": tokens.access_preview()
                }))),
                Err(e) => Ok(CliResponse::error(e.to_string())),
            }
        }

        Commands::Status => {
            let flow = build_flow(cli)?;
            let tokens = flow.client().token();

            match flow.client().is_authenticated().await {
                Ok(authenticated) => Ok(CliResponse::success(json!({
                    "authenticated": authenticated,
                    "token_preview": tokens.access_preview()
                }))),
                Err(e) => Ok(CliResponse::error(e.to_string())),
            }
        }

        Commands::Whoami => {
            let mut flow = build_flow(cli)?;
            let result = flow.client_mut().whoami().await;
            respond_persisting(&flow, result)
        }

        Commands::Collections { username, with_session, no_mature, limit, offset } => {
            let mut flow = build_flow(cli)?;
            let query = CollectionsQuery {
                with_session: *with_session,
                mature_content: !*no_mature,
                limit: *limit,
                offset: *offset,
            };

            let result = flow.client_mut().get_collections(username, query).await;
            respond_persisting(&flow, result)
        }

        Commands::Upload { file, title, mime } => {
            if !file.is_file() {
                return Err(anyhow!("Arquivo não encontrado: {}", file.display()));
            }

            let mut flow = build_flow(cli)?;
            let attachment = match mime {
                Some(mime) => FileAttachment::new(file).with_mime_type(mime.clone()),
                None => FileAttachment::new(file).with_inferred_mime(),
            };
            let title = title.clone().unwrap_or_else(|| basename(file));

            let result = flow.client_mut().upload_attachment(&title, attachment).await;
            respond_persisting(&flow, result)
        }

        Commands::Config { init } => {
            let created = if *init {
                EnvManager::create_env_file_if_not_exists()
                    .context("Falha ao criar o arquivo .env")?
            } else {
                false
            };

            let flow = build_flow(cli)?;
            let mut info = json!(flow.get_config_info());
            if *init {
                info["env_file_created"] = json!(created);
            }

            Ok(CliResponse::success(info))
        }
    }
}

/// Abre o navegador; se não conseguir, mostra a URL no terminal
struct ConsoleRedirector;

impl Redirector for ConsoleRedirector {
    fn redirect(&mut self, url: &str) -> AuthResult<()> {
        if BrowserRedirector.redirect(url).is_err() {
            println!("🔗 Abra no navegador: {}", url);
        }
        Ok(())
    }
}

/// Monta o fluxo a partir das flags (com fallback para as variáveis de ambiente)
fn build_flow(cli: &Cli) -> anyhow::Result<OAuthFlow> {
    let env_manager = EnvManager {
        client_id: cli.client_id.clone().unwrap_or_default(),
        client_secret: cli.client_secret.clone().unwrap_or_default(),
        redirect_uri: cli.redirect_uri.clone(),
        scope: cli.scope.clone(),
        oauth_base_url: cli.oauth_url.clone(),
        api_base_url: cli.api_url.clone(),
        callback_port: EnvManager::resolve_callback_port(cli.callback_port, &cli.redirect_uri),
    };

    let mut flow = OAuthFlow::with_store(env_manager, Box::new(EnvTokenStore))
        .context("Configuração inválida (defina DEVIANTART_CLIENT_ID e DEVIANTART_CLIENT_SECRET)")?
        .with_redirector(Box::new(ConsoleRedirector));

    if cli.access_token.is_some() || cli.refresh_token.is_some() {
        let stored = flow.client().token();
        flow.client_mut().set_token(
            cli.access_token.clone().or(stored.access_token),
            cli.refresh_token.clone().or(stored.refresh_token),
        );
    }

    Ok(flow)
}

/// Salva tokens renovados durante a chamada e monta a resposta
fn respond_persisting(
    flow: &OAuthFlow,
    result: AuthResult<serde_json::Value>,
) -> anyhow::Result<CliResponse> {
    if let Err(e) = flow.persist_tokens() {
        log::warn!("⚠️ Não foi possível salvar os tokens renovados: {}", e);
    }

    match result {
        Ok(data) => Ok(CliResponse::success(data)),
        Err(e) => Ok(CliResponse::error(e.to_string())),
    }
}

async fn handle_auth(cli: &Cli, force: bool) -> anyhow::Result<CliResponse> {
    let mut flow = build_flow(cli)?;

    if !force && flow.client().token().is_complete() && flow.is_authenticated().await {
        return Ok(CliResponse::success(json!({
            "message": "Já autenticado. Use --force para reautenticar"
        })));
    }

    println!("🔐 Iniciando fluxo de autenticação OAuth2...");
    println!("📌 Um navegador será aberto para você autorizar o acesso.");

    let result = if force {
        flow.force_reauth().await
    } else {
        flow.authenticate().await
    };

    match result {
        Ok(tokens) => Ok(CliResponse::success(json!({
            "message": "Autenticação concluída com sucesso!",
            "token_preview": tokens.access_preview(),
            "note": "Tokens salvos no .env"
        }))),
        Err(e) => Ok(CliResponse::error(e.to_string())),
    }
}

fn output_response(response: CliResponse, format: &OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string(&response) {
            Ok(body) => println!("{}", body),
            Err(e) => eprintln!("❌ Erro ao serializar resposta: {}", e),
        },
        OutputFormat::Pretty => {
            if response.success {
                if let Some(data) = response.data {
                    println!("✅ Sucesso!");
                    match serde_json::to_string_pretty(&data) {
                        Ok(body) => println!("{}", body),
                        Err(_) => println!("{}", data),
                    }
                }
            } else if let Some(error) = response.error {
                eprintln!("❌ Erro: {}", error);
            }
        }
    }
}
