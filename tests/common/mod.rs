use std::net::SocketAddr;

use futures_util::SinkExt;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use clientdesk::auth::jwt::{self, Claims};
use clientdesk::config::Config;
use clientdesk::models::{Role, User};
use clientdesk::state::SharedState;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough";

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub state: SharedState,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Insert a user row directly and return it.
    pub async fn seed_user(&self, email: &str, name: &str, role: Role) -> User {
        clientdesk::db::users::create(&self.pool, email, name, role, None)
            .await
            .expect("seed user failed")
    }

    /// Mint a bearer token for a seeded user.
    pub fn token_for(&self, user: &User) -> String {
        let claims = Claims::new(user.id, user.role);
        jwt::encode_token(&claims, TEST_JWT_SECRET).expect("token encode failed")
    }

    /// Create a project via the API, return the inner project JSON.
    pub async fn create_project(&self, token: &str, name: &str, client_id: Option<Uuid>) -> Value {
        let mut body = json!({ "name": name, "startDate": "2026-01-01T00:00:00Z" });
        if let Some(client_id) = client_id {
            body["clientId"] = json!(client_id);
        }
        let (mut body, status) = self.post_auth("/api/projects", token, &body).await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {body}");
        body["project"].take()
    }

    /// Create a deliverable via the API, return the inner deliverable JSON.
    pub async fn create_deliverable(&self, token: &str, name: &str, project_id: &str) -> Value {
        let (mut body, status) = self
            .post_auth(
                "/api/deliverables",
                token,
                &json!({
                    "name": name,
                    "dueDate": "2026-06-01T00:00:00Z",
                    "projectId": project_id,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create deliverable failed: {body}");
        body["deliverable"].take()
    }

    /// Create a ticket via the API, return the inner ticket JSON.
    pub async fn create_ticket(&self, token: &str, title: &str) -> Value {
        let (mut body, status) = self
            .post_auth(
                "/api/tickets",
                token,
                &json!({
                    "title": title,
                    "description": "something is broken",
                    "priority": "HIGH",
                    "category": "BUG",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create ticket failed: {body}");
        body["ticket"].take()
    }

    /// Open a WebSocket connection to the server.
    pub async fn ws_connect(&self) -> WsClient {
        let (ws, _) = connect_async(format!("ws://{}/ws", self.addr))
            .await
            .expect("websocket connect failed");
        ws
    }

    /// Open a WebSocket connection and join the given user's room, waiting
    /// until the join has been applied in the registry.
    pub async fn ws_join(&self, user_id: Uuid) -> WsClient {
        let before = self.state.realtime.joined_count(user_id).await;

        let mut ws = self.ws_connect().await;
        ws.send(WsMessage::Text(
            json!({ "type": "join", "userId": user_id }).to_string().into(),
        ))
        .await
        .expect("join send failed");

        for _ in 0..50 {
            if self.state.realtime.joined_count(user_id).await > before {
                return ws;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("join was not applied within the deadline");
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!(
        "clientdesk_test_{}",
        Uuid::now_v7().to_string().replace('-', "")
    );

    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to a random port
        frontend_origin: "http://localhost:3000".to_string(),
        max_body_size: 10_485_760,
        rate_limit_max: 10_000,
        rate_limit_window_secs: 900,
        log_level: "warn".to_string(),
    };

    let (app, state) = clientdesk::build_app(pool.clone(), config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        state,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
