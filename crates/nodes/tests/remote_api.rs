//! Node behaviour against a stand-in Corbee Gestão API.

use nodes::credentials::{Credentials, UserType};
use nodes::traits::ExecutionContext;
use nodes::{ClientConfig, ExecutableNode, GestaoNode, NodeError, NodeKind};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ctx(server: &MockServer) -> ExecutionContext {
    ExecutionContext {
        execution_id: uuid::Uuid::new_v4(),
        item_index: 0,
        credentials: Credentials::new(server.uri(), "ana", "s3nha", UserType::Interno),
    }
}

fn node(kind: NodeKind) -> GestaoNode {
    GestaoNode::new(kind, &ClientConfig::default()).expect("client builds")
}

async fn mount_login(server: &MockServer, jwt: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v2/login"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "login": "ana", "senha": "s3nha", "type_user": "interno" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "jwt": jwt } })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn get_broker_sends_bearer_get_without_body() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1").await;

    Mock::given(method("GET"))
        .and(path("/api/v2/broker/42"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 42, "nome": "Ana" })))
        .expect(1)
        .mount(&server)
        .await;

    let out = node(NodeKind::Gestao)
        .execute(json!({ "operation": "getBroker", "brokerId": "42" }), &ctx(&server))
        .await?;

    assert_eq!(out, json!({ "corbeeResponse": { "id": 42, "nome": "Ana" }, "operation": "getBroker" }));

    let received = server.received_requests().await.unwrap_or_default();
    let get = received.iter().find(|r| r.url.path() == "/api/v2/broker/42").expect("call sent");
    assert!(get.body.is_empty());
    Ok(())
}

#[tokio::test]
async fn create_user_posts_mapped_body() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_login(&server, "tok-2").await;

    Mock::given(method("POST"))
        .and(path("/api/v2/usuarios"))
        .and(header("authorization", "Bearer tok-2"))
        .and(body_json(json!({
            "login": "ana",
            "nome": "Ana",
            "email": "a@x.com",
            "perfilId": "7",
            "senha": "secret",
            "status": "ativo",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 99 })))
        .expect(1)
        .mount(&server)
        .await;

    let out = node(NodeKind::Usuario)
        .execute(
            json!({
                "operation": "createUser",
                "login": "ana",
                "nome": "Ana",
                "email": "a@x.com",
                "perfilId": "7",
                "senha": "secret",
            }),
            &ctx(&server),
        )
        .await?;

    assert_eq!(out["corbeeResponse"]["id"], 99);
    Ok(())
}

#[tokio::test]
async fn search_proposals_sends_filters_as_query() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_login(&server, "tok-3").await;

    Mock::given(method("GET"))
        .and(path("/api/v2/proposta/buscar"))
        .and(query_param("cpf", "12345678900"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let out = node(NodeKind::Gestao)
        .execute(json!({ "operation": "searchProposals", "searchCpf": "12345678900" }), &ctx(&server))
        .await?;
    assert_eq!(out["corbeeResponse"], json!([]));
    Ok(())
}

#[tokio::test]
async fn missing_required_field_fails_before_any_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = node(NodeKind::Gestao)
        .execute(json!({ "operation": "getBroker" }), &ctx(&server))
        .await
        .unwrap_err();

    assert_eq!(err, NodeError::MissingField { operation: "getBroker", field: "brokerId" });
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn login_without_token_stops_before_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/perfis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = node(NodeKind::Gestao)
        .execute(json!({ "operation": "listProfiles" }), &ctx(&server))
        .await
        .unwrap_err();

    assert_eq!(err, NodeError::Auth("no token in response".into()));
}

#[tokio::test]
async fn rejected_login_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Credenciais inválidas" })))
        .mount(&server)
        .await;

    let err = node(NodeKind::Gestao)
        .execute(json!({ "operation": "listManagers" }), &ctx(&server))
        .await
        .unwrap_err();

    match err {
        NodeError::Auth(message) => assert!(message.contains("Credenciais inválidas"), "{message}"),
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreadable_login_body_is_not_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = node(NodeKind::Gestao)
        .execute(json!({ "operation": "listManagers" }), &ctx(&server))
        .await
        .unwrap_err();

    match err {
        NodeError::Auth(message) => {
            assert!(message.starts_with("login response unreadable"), "{message}");
            assert!(!message.contains("rejected"), "{message}");
        }
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn remote_failure_keeps_status_and_message() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-4").await;
    Mock::given(method("DELETE"))
        .and(path("/api/v2/proposta/p-9/pmt"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Proposta não encontrada" })))
        .mount(&server)
        .await;

    let err = node(NodeKind::Gestao)
        .execute(json!({ "operation": "removeProposalPmt", "proposalId": "p-9" }), &ctx(&server))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        NodeError::Remote { status: Some(404), message: "Proposta não encontrada".into() }
    );
}

#[tokio::test]
async fn empty_success_body_decodes_to_null() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_login(&server, "tok-5").await;
    Mock::given(method("POST"))
        .and(path("/api/v2/proposta/p-1/digitar-banco"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let out = node(NodeKind::Gestao)
        .execute(json!({ "operation": "submitProposalToBank", "proposalId": "p-1" }), &ctx(&server))
        .await?;
    assert_eq!(out["corbeeResponse"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn malformed_success_body_is_a_remote_error() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-6").await;
    Mock::given(method("GET"))
        .and(path("/api/v2/gerentes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = node(NodeKind::Gestao)
        .execute(json!({ "operation": "listManagers" }), &ctx(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, NodeError::Remote { status: Some(200), .. }), "{err:?}");
}

#[tokio::test]
async fn broker_authenticate_returns_the_raw_login_response() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/login"))
        .and(body_json(json!({ "login": "ana", "senha": "s3nha", "type_user": "corretor" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "jwt": "j", "id": 3 } })))
        .expect(1)
        .mount(&server)
        .await;

    let mut context = ctx(&server);
    context.credentials = Credentials::new(server.uri(), "ana", "s3nha", UserType::Corretor);

    let out = node(NodeKind::Corretor)
        .execute(json!({ "operation": "authenticate" }), &context)
        .await?;

    assert_eq!(out["operation"], "authenticate");
    assert_eq!(out["corbeeResponse"]["data"]["id"], 3);
    Ok(())
}

#[tokio::test]
async fn broker_my_data_is_unsupported_and_offline() {
    let server = MockServer::start().await;

    let err = node(NodeKind::Corretor)
        .execute(json!({ "operation": "myData" }), &ctx(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, NodeError::Unsupported { operation: "myData", .. }));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn each_item_logs_in_again() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "jwt": "t" } })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/notificacoes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let gestao = node(NodeKind::Gestao);
    for _ in 0..2 {
        gestao
            .execute(json!({ "operation": "listNotifications" }), &ctx(&server))
            .await?;
    }
    Ok(())
}
