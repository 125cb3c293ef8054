use deviantart_v1::auth::redirect::ResponseRedirect;
use deviantart_v1::client::api::AuthorizationStep;
use deviantart_v1::{AuthError, CollectionsQuery, Credentials, DeviantArtClient, Endpoints, RefreshPolicy, TokenPair};
use mockito::Matcher;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::io::Write;

fn client_for(server: &mockito::Server) -> DeviantArtClient {
    let credentials = Credentials::new("cid", "secret", "http://localhost:8888/callback", "basic stash");
    DeviantArtClient::new(credentials)
        .unwrap()
        .with_endpoints(Endpoints::new(
            format!("{}/oauth2", server.url()),
            format!("{}/api/v1/oauth2", server.url()),
        ))
}

#[tokio::test]
async fn test_authorization_code_then_resource_call_with_refresh() {
    let mut server = mockito::Server::new_async().await;

    let exchange = server
        .mock("POST", "/oauth2/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("code".into(), "the-code".into()),
            Matcher::UrlEncoded("client_id".into(), "cid".into()),
            Matcher::UrlEncoded("redirect_uri".into(), "http://localhost:8888/callback".into()),
        ]))
        .with_body(r#"{"access_token":"A","refresh_token":"B","token_type":"Bearer","expires_in":3600,"status":"success"}"#)
        .create_async()
        .await;

    let mut client = client_for(&server);
    let mut redirect = ResponseRedirect::new();
    let params = HashMap::from([("code".to_string(), "the-code".to_string())]);

    let step = client.initiate_or_complete(&params, &mut redirect).await.unwrap();
    assert_eq!(step, AuthorizationStep::Completed(TokenPair::new("A", "B")));
    assert!(!redirect.headers_sent());
    exchange.assert_async().await;

    // token expirado: o probe falha e o cliente renova antes da chamada
    server
        .mock("POST", "/api/v1/oauth2/placebo")
        .match_body(Matcher::UrlEncoded("access_token".into(), "A".into()))
        .with_status(401)
        .with_body(r#"{"error":"invalid_token","error_description":"Expired oAuth2 user token.","status":"error"}"#)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/oauth2/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), "B".into()),
        ]))
        .with_body(r#"{"access_token":"A2","refresh_token":"B2","status":"success"}"#)
        .create_async()
        .await;
    let collections = server
        .mock("POST", "/api/v1/oauth2/collections/all")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("access_token".into(), "A2".into()),
            Matcher::UrlEncoded("username".into(), "someone".into()),
            Matcher::UrlEncoded("mature_content".into(), "true".into()),
            Matcher::UrlEncoded("limit".into(), "24".into()),
        ]))
        .with_body(r#"{"has_more":false,"results":[{"folderid":"F1","name":"Featured"}]}"#)
        .create_async()
        .await;

    let value = client
        .get_collections("someone", CollectionsQuery::default())
        .await
        .unwrap();

    assert_eq!(value["results"][0]["name"], "Featured");
    assert_eq!(client.token(), TokenPair::new("A2", "B2"));
    refresh.assert_async().await;
    collections.assert_async().await;
}

#[tokio::test]
async fn test_redirect_when_no_code() {
    let server = mockito::Server::new_async().await;
    let mut client = client_for(&server);
    let mut redirect = ResponseRedirect::new();

    let step = client.initiate_or_complete(&HashMap::new(), &mut redirect).await.unwrap();

    let AuthorizationStep::Redirected(url) = step else {
        panic!("esperava redirecionamento");
    };
    assert!(url.starts_with(&format!("{}/oauth2/authorize?", server.url())));
    assert!(url.contains("scope=basic+stash"));
    assert_eq!(redirect.location(), Some(url.as_str()));
}

#[tokio::test]
async fn test_upload_sends_multipart() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/v1/oauth2/placebo")
        .with_body(r#"{"status":"success"}"#)
        .create_async()
        .await;
    let submit = server
        .mock("POST", "/api/v1/oauth2/stash/submit")
        .match_header("content-type", Matcher::Regex("multipart/form-data".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="title""#.into()),
            Matcher::Regex(r#"filename="art.png""#.into()),
            Matcher::Regex("image/png".into()),
        ]))
        .with_body(r#"{"status":"success","itemid":42,"stack":"Sta.sh Uploads","stackid":7}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("art.png");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(b"\x89PNG fake").unwrap();

    let mut client = client_for(&server).with_tokens(TokenPair::new("A", "B"));
    let value = client.upload_file(&path).await.unwrap();

    assert_eq!(value["itemid"], 42);
    submit.assert_async().await;
}

#[tokio::test]
async fn test_fail_fast_surfaces_refresh_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/v1/oauth2/placebo")
        .with_body(r#"{"status":"error"}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/oauth2/token")
        .with_status(401)
        .with_body(r#"{"error":"invalid_request","error_description":"Invalid refresh token."}"#)
        .create_async()
        .await;
    let whoami = server
        .mock("POST", "/api/v1/oauth2/user/whoami")
        .expect(0)
        .create_async()
        .await;

    let mut client = client_for(&server)
        .with_tokens(TokenPair::new("A", "B"))
        .with_refresh_policy(RefreshPolicy::FailFast);

    let err = tokio_test::assert_err!(client.whoami().await);
    assert!(matches!(err, AuthError::OAuth(ref d) if d == "Invalid refresh token."));
    whoami.assert_async().await;
}
