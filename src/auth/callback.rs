use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use warp::filters::path::FullPath;
use warp::Filter;
use crate::error::{AuthError, AuthResult};

type CallbackSender = Arc<Mutex<Option<oneshot::Sender<AuthResult<HashMap<String, String>>>>>>;

/// Servidor HTTP local que recebe o redirect do DeviantArt (fluxo da CLI)
pub struct CallbackServer {
    port: u16,
    path: String,
    state: Option<String>,
    timeout: Duration,
}

impl CallbackServer {
    pub fn new(port: u16, state: Option<String>) -> Self {
        Self {
            port,
            path: "/callback".to_string(),
            state,
            timeout: Duration::from_secs(300),
        }
    }

    /// Caminho completo do redirect_uri (ex.: `/oauth/callback`, ou `/` para a raiz)
    pub fn with_path(mut self, path: impl AsRef<str>) -> Self {
        self.path = normalize_path(path.as_ref());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Inicia o servidor e aguarda os parâmetros do redirect.
    ///
    /// Devolve a query recebida como está; quem interpreta `code`/`error` é
    /// `DeviantArtClient::initiate_or_complete`. Apenas o `state` é conferido aqui.
    pub async fn start_and_wait(self) -> AuthResult<HashMap<String, String>> {
        let (tx, rx) = oneshot::channel();
        let routes = self
            .routes(Arc::new(Mutex::new(Some(tx))))
            .with(warp::filters::log::log("callback_server"));

        let (actual_addr, server_future) = warp::serve(routes)
            .try_bind_ephemeral(([127, 0, 0, 1], self.port))
            .map_err(|e| AuthError::callback_error(format!("Falha ao iniciar servidor: {}", e)))?;

        log::info!("Servidor de callback iniciado em: http://{}{}", actual_addr, self.path);

        let server_task = tokio::spawn(server_future);
        let result = tokio::time::timeout(self.timeout, rx).await;
        server_task.abort();

        match result {
            Ok(Ok(callback_result)) => callback_result,
            Ok(Err(_)) => Err(AuthError::callback_error("Canal de comunicação fechado")),
            Err(_) => Err(AuthError::Timeout),
        }
    }

    /// Rota única: o redirect é reconhecido pelo caminho completo e por trazer `code` ou `error`
    fn routes(
        &self,
        tx: CallbackSender,
    ) -> impl Filter<Extract = (warp::reply::Html<&'static str>,), Error = warp::Rejection> + Clone {
        let expected_path = self.path.clone();
        let expected_state = self.state.clone();

        warp::get()
            .and(warp::path::full())
            .and(warp::query::<HashMap<String, String>>())
            .map(move |full: FullPath, params: HashMap<String, String>| {
                let is_callback = normalize_path(full.as_str()) == expected_path
                    && (params.contains_key("code") || params.contains_key("error"));
                if !is_callback {
                    return warp::reply::html(WAITING_PAGE);
                }

                log::info!("Recebido callback OAuth2 ({} parâmetros)", params.len());

                let result = Self::process_callback(params, expected_state.as_deref());
                let page = if matches!(&result, Ok(p) if p.contains_key("code")) {
                    SUCCESS_PAGE
                } else {
                    ERROR_PAGE
                };

                if let Ok(mut sender) = tx.lock() {
                    if let Some(tx) = sender.take() {
                        let _ = tx.send(result);
                    }
                }

                warp::reply::html(page)
            })
    }

    /// Confere o `state` (proteção CSRF) quando um era esperado
    fn process_callback(
        params: HashMap<String, String>,
        expected_state: Option<&str>,
    ) -> AuthResult<HashMap<String, String>> {
        if let Some(expected) = expected_state {
            // erros do provedor podem vir sem state; deixamos passar para o cliente reportar
            if !params.contains_key("error") && params.get("state").map(String::as_str) != Some(expected) {
                return Err(AuthError::InvalidState);
            }
        }

        Ok(params)
    }

    /// Gera um `state` aleatório para proteção CSRF
    pub fn generate_state() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// `/a/b/` e `a/b` viram `/a/b`; vazio vira `/`
fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

// Páginas HTML para o servidor de callback
const WAITING_PAGE: &str = r#"
<!DOCTYPE html>
<html>
<head>
    <title>DeviantArt OAuth2 - Aguardando Autorização</title>
    <meta charset="UTF-8">
    <style>
        body { font-family: Arial, sans-serif; background: #f5f5f5; text-align: center; }
        .container { max-width: 600px; margin: 50px auto; background: white; padding: 30px; border-radius: 8px; }
        h1 { color: #05cc47; }
    </style>
</head>
<body>
    <div class="container">
        <h1>🔐 DeviantArt OAuth2</h1>
        <h2>Aguardando autorização...</h2>
        <p>Por favor, complete o processo de autorização no DeviantArt.</p>
    </div>
</body>
</html>
"#;

const SUCCESS_PAGE: &str = r#"
<!DOCTYPE html>
<html>
<head>
    <title>DeviantArt OAuth2 - Autorização Concluída</title>
    <meta charset="UTF-8">
    <style>
        body { font-family: Arial, sans-serif; background: #f5f5f5; text-align: center; }
        .container { max-width: 600px; margin: 50px auto; background: white; padding: 30px; border-radius: 8px; }
        h1 { color: #28a745; }
    </style>
</head>
<body>
    <div class="container">
        <h1>✅ Autorização Concluída!</h1>
        <p>Você pode fechar esta janela e retornar à aplicação.</p>
    </div>
    <script>setTimeout(() => { window.close(); }, 3000);</script>
</body>
</html>
"#;

const ERROR_PAGE: &str = r#"
<!DOCTYPE html>
<html>
<head>
    <title>DeviantArt OAuth2 - Erro na Autorização</title>
    <meta charset="UTF-8">
    <style>
        body { font-family: Arial, sans-serif; background: #f5f5f5; text-align: center; }
        .container { max-width: 600px; margin: 50px auto; background: white; padding: 30px; border-radius: 8px; }
        h1 { color: #dc3545; }
    </style>
</head>
<body>
    <div class="container">
        <h1>❌ Erro na Autorização</h1>
        <p>Ocorreu um erro durante o processo de autorização do DeviantArt.</p>
        <p>Verifique a configuração e tente novamente.</p>
    </div>
</body>
</html>
"#;
