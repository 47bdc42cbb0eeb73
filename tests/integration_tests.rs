//! Integration tests for the reputation API
//!
//! These tests seed an in-memory SQLite store and verify the query
//! operations, the HTTP surface (envelope, status codes, CORS, limit
//! clamping) and the widget-side client end to end.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use repowr_api::address::{self, RawAddress};
use repowr_api::config::ApiConfig;
use repowr_api::query::QueryService;
use repowr_api::{DatabasePool, QueryError, RankingMode, build_app};
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tower::ServiceExt;

// ============================================================================
// Test Helpers
// ============================================================================

const ALICE: &str = "0:132a78a0765048b94dc5279ed54a1e00ab17a5f682db438841cc867a6335a46d";
const ALICE_FRIENDLY: &str = "UQATKnigdlBIuU3FJ57VSh4Aqxel9oLbQ4hBzIZ6YzWkbZys";

fn addr(byte: char) -> String {
    format!("0:{}", byte.to_string().repeat(64))
}

/// Single-connection in-memory store with the schema applied
async fn empty_store() -> DatabasePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    let db = DatabasePool::from_pool(pool);
    db.init_schema().await.expect("schema");
    db
}

async fn insert_tx(
    pool: &SqlitePool,
    id: i64,
    sender: &str,
    receiver: &str,
    ts: i64,
    valid: bool,
) {
    sqlx::query(
        "INSERT INTO transactions (id, sender, receiver, timestamp, is_valid) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(sender)
    .bind(receiver)
    .bind(ts)
    .bind(valid as i64)
    .execute(pool)
    .await
    .expect("insert transaction");
}

async fn insert_rating(
    pool: &SqlitePool,
    tx_id: i64,
    rating: i64,
    kind: Option<&str>,
    comment: Option<&str>,
) {
    sqlx::query(
        "INSERT INTO ratings (tx_id, rating, type, comment, link) VALUES (?, ?, ?, ?, NULL)",
    )
    .bind(tx_id)
    .bind(rating)
    .bind(kind)
    .bind(comment)
    .execute(pool)
    .await
    .expect("insert rating");
}

async fn insert_profile(
    pool: &SqlitePool,
    address: &str,
    nickname: &str,
    avatar: Option<&str>,
    skills: Option<&str>,
    links: Option<&str>,
) {
    sqlx::query(
        "INSERT INTO profiles (address, nickname, bio, avatar, skills, location, links) \
         VALUES (?, ?, NULL, ?, ?, NULL, ?)",
    )
    .bind(address)
    .bind(nickname)
    .bind(avatar)
    .bind(skills)
    .bind(links)
    .execute(pool)
    .await
    .expect("insert profile");
}

/// Alice receives [5, 5, 4] on valid transactions, plus one rating on an
/// invalid transaction and one out-of-range rating. Bob receives a 3 from
/// Dave. Dave only gives.
async fn seeded_store() -> DatabasePool {
    let db = empty_store().await;
    let pool = db.pool();
    let (bob, carol, dave) = (addr('b'), addr('c'), addr('d'));

    insert_tx(pool, 1, &bob, ALICE, 1_000, true).await;
    insert_rating(pool, 1, 5, Some("general"), Some("great")).await;
    insert_tx(pool, 2, &carol, ALICE, 2_000, true).await;
    insert_rating(pool, 2, 5, Some("work"), None).await;
    insert_tx(pool, 3, &dave, ALICE, 3_000, true).await;
    insert_rating(pool, 3, 4, Some("work"), Some("ok")).await;
    insert_tx(pool, 4, &bob, ALICE, 4_000, false).await;
    insert_rating(pool, 4, 1, Some("general"), Some("spam")).await;
    insert_tx(pool, 5, &dave, &bob, 5_000, true).await;
    insert_rating(pool, 5, 3, None, None).await;
    insert_tx(pool, 6, &carol, ALICE, 6_000, true).await;
    insert_rating(pool, 6, 9, Some("general"), None).await;

    insert_profile(pool, ALICE, "old-alice", None, None, None).await;
    insert_profile(
        pool,
        ALICE,
        "alice",
        Some("https://example.org/alice.png"),
        Some(r#"["rust","ton"]"#),
        Some(r#"{"github":"https://github.com/alice"}"#),
    )
    .await;
    insert_profile(
        pool,
        &bob,
        "bob",
        Some("https://example.org/bob.png"),
        Some("not json"),
        None,
    )
    .await;

    db
}

/// X has a single 5, Y has fifty 4s
async fn ranking_store() -> DatabasePool {
    let db = empty_store().await;
    let pool = db.pool();
    let (x, y) = (addr('1'), addr('2'));

    insert_tx(pool, 1, &addr('f'), &x, 1_000, true).await;
    insert_rating(pool, 1, 5, None, None).await;
    for i in 0..50 {
        let id = 100 + i;
        let sender = format!("0:{:064x}", i);
        insert_tx(pool, id, &sender, &y, 2_000 + i, true).await;
        insert_rating(pool, id, 4, None, None).await;
    }

    db
}

/// Seeded store plus a valid rating for Alice whose timestamp is text
async fn malformed_store() -> DatabasePool {
    let db = seeded_store().await;
    let pool = db.pool();
    sqlx::query(
        "INSERT INTO transactions (id, sender, receiver, timestamp, is_valid) \
         VALUES (?, ?, ?, 'abc', 1)",
    )
    .bind(7_i64)
    .bind(addr('c'))
    .bind(ALICE)
    .execute(pool)
    .await
    .expect("insert malformed transaction");
    insert_rating(pool, 7, 5, Some("general"), None).await;
    db
}

fn service(db: &DatabasePool) -> QueryService {
    QueryService::new(db.clone(), RankingMode::Approximate)
}

async fn get(db: &DatabasePool, uri: &str) -> Response {
    let app = build_app(service(db), &ApiConfig::default());
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Address Codec Tests
// ============================================================================

mod codec {
    use super::*;

    #[test]
    fn test_friendly_and_raw_are_the_same_entity() {
        let from_friendly = address::normalize(ALICE_FRIENDLY).unwrap();
        let from_raw = address::normalize(ALICE).unwrap();
        assert_eq!(from_friendly, from_raw);
        assert_eq!(from_friendly.to_string(), ALICE);
    }

    #[test]
    fn test_friendly_render_round_trips_through_normalize() {
        let raw: RawAddress = ALICE.parse().unwrap();
        for (bounceable, testnet) in [(true, false), (false, false), (false, true)] {
            let friendly = raw.to_friendly(bounceable, testnet);
            assert_eq!(address::normalize(&friendly).unwrap(), raw);
        }
    }

    #[test]
    fn test_malformed_friendly_is_an_error() {
        assert!(address::normalize("not base64 !!").is_err());
        assert!(address::normalize("UQATKnig").is_err());
    }
}

// ============================================================================
// Query Service Tests
// ============================================================================

mod service_operations {
    use super::*;

    #[tokio::test]
    async fn test_reputation_counts_only_valid_in_range_ratings() {
        let db = seeded_store().await;
        let data = service(&db).reputation(ALICE_FRIENDLY).await.unwrap();

        assert_eq!(data.address, ALICE);
        let rep = &data.reputation;
        assert_eq!(rep.total_ratings, 3);
        assert_eq!(rep.avg_rating, 4.67);
        assert_eq!(rep.final_score, 6.47);
        assert_eq!(rep.min_rating, Some(4));
        assert_eq!(rep.max_rating, Some(5));
        assert_eq!(rep.ratings_given, 0);

        assert_eq!(data.by_type.get("general"), Some(&1));
        assert_eq!(data.by_type.get("work"), Some(&2));
    }

    #[tokio::test]
    async fn test_reputation_uses_latest_profile() {
        let db = seeded_store().await;
        let data = service(&db).reputation(ALICE).await.unwrap();

        let profile = data.profile.expect("profile");
        assert_eq!(profile.nickname.as_deref(), Some("alice"));
        assert_eq!(profile.skills, vec!["rust", "ton"]);
        assert_eq!(
            profile.links.get("github").map(String::as_str),
            Some("https://github.com/alice")
        );
    }

    #[tokio::test]
    async fn test_address_with_only_given_ratings() {
        let db = seeded_store().await;
        let data = service(&db).reputation(&addr('d')).await.unwrap();

        let rep = &data.reputation;
        assert_eq!(rep.total_ratings, 0);
        assert_eq!(rep.avg_rating, 0.0);
        assert_eq!(rep.final_score, 0.0);
        assert_eq!(rep.ratings_given, 2);
        assert_eq!(rep.min_rating, None);
        assert_eq!(rep.max_rating, None);
        assert!(data.profile.is_none());
    }

    #[tokio::test]
    async fn test_invalid_transactions_do_not_count_as_given() {
        let db = seeded_store().await;
        let data = service(&db).reputation(&addr('b')).await.unwrap();
        assert_eq!(data.reputation.ratings_given, 1);
        assert_eq!(data.reputation.total_ratings, 1);
        // Unparsable skills resolve to empty
        assert!(data.profile.expect("profile").skills.is_empty());
    }

    #[tokio::test]
    async fn test_reviews_newest_first_with_counterpart_names() {
        let db = seeded_store().await;
        let data = service(&db).reviews(ALICE, 5).await.unwrap();

        let senders: Vec<&str> = data.received.iter().map(|r| r.sender.as_str()).collect();
        assert_eq!(senders, vec![addr('d'), addr('c'), addr('b')]);
        assert_eq!(data.received[0].rating, 4);
        assert_eq!(data.received[0].sender_name, None);
        assert_eq!(data.received[1].sender_name, None);
        assert_eq!(data.received[2].sender_name.as_deref(), Some("bob"));
        assert_eq!(
            data.received[2].sender_avatar.as_deref(),
            Some("https://example.org/bob.png")
        );
        assert!(data.given.is_empty());
    }

    #[tokio::test]
    async fn test_given_reviews_name_the_receiver() {
        let db = seeded_store().await;
        let data = service(&db).reviews(&addr('d'), 5).await.unwrap();

        assert!(data.received.is_empty());
        assert_eq!(data.given.len(), 2);
        assert_eq!(data.given[0].receiver, addr('b'));
        assert_eq!(data.given[0].receiver_name.as_deref(), Some("bob"));
        assert_eq!(data.given[1].receiver, ALICE);
        assert_eq!(data.given[1].receiver_name.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_reviews_respect_limit() {
        let db = seeded_store().await;
        let data = service(&db).reviews(ALICE, 2).await.unwrap();
        assert_eq!(data.received.len(), 2);

        let data = service(&db).reviews(ALICE, 0).await.unwrap();
        assert_eq!(data.received.len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_limit_returns_every_review() {
        let db = ranking_store().await;
        let data = service(&db).reviews(&addr('2'), usize::MAX).await.unwrap();
        assert_eq!(data.received.len(), 50);
        assert!(data.given.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_row_is_internal_error() {
        let db = malformed_store().await;
        let err = service(&db).reviews(ALICE, 5).await.unwrap_err();

        assert!(matches!(err, QueryError::Store(_)));
        assert!(!err.is_client_error());
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[tokio::test]
    async fn test_stats() {
        let db = seeded_store().await;
        let stats = service(&db).stats().await.unwrap();

        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.total_ratings, 4);
        assert_eq!(stats.total_profiles, 2);
        assert_eq!(stats.avg_rating, 4.25);
    }

    #[tokio::test]
    async fn test_stats_on_empty_store() {
        let db = empty_store().await;
        let stats = service(&db).stats().await.unwrap();

        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.total_ratings, 0);
        assert_eq!(stats.avg_rating, 0.0);
    }
}

// ============================================================================
// Ranking Tests
// ============================================================================

mod ranking {
    use super::*;

    #[tokio::test]
    async fn test_volume_outranks_single_perfect_rating() {
        let db = ranking_store().await;
        let top = service(&db).top(2).await.unwrap();

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].address, addr('2'));
        assert_eq!(top[0].reputation.final_score, 15.73);
        assert_eq!(top[0].reputation.total_ratings, 50);
        assert_eq!(top[1].address, addr('1'));
        assert_eq!(top[1].reputation.final_score, 3.47);
    }

    #[tokio::test]
    async fn test_oversized_limit_is_clamped() {
        let db = ranking_store().await;
        for mode in [RankingMode::Approximate, RankingMode::Exact] {
            let top = QueryService::new(db.clone(), mode).top(usize::MAX).await.unwrap();
            assert_eq!(top.len(), 2);
            assert_eq!(top[0].address, addr('2'));
        }
    }

    #[tokio::test]
    async fn test_approximate_mode_truncates_before_scoring() {
        let db = ranking_store().await;
        let top = QueryService::new(db.clone(), RankingMode::Approximate)
            .top(1)
            .await
            .unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].address, addr('1'));
    }

    #[tokio::test]
    async fn test_exact_mode_scores_every_receiver() {
        let db = ranking_store().await;
        let top = QueryService::new(db.clone(), RankingMode::Exact)
            .top(1)
            .await
            .unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].address, addr('2'));
    }

    #[tokio::test]
    async fn test_top_attaches_profiles() {
        let db = seeded_store().await;
        let top = service(&db).top(5).await.unwrap();

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].address, ALICE);
        assert_eq!(
            top[0].profile.as_ref().and_then(|p| p.nickname.as_deref()),
            Some("alice")
        );
    }
}

// ============================================================================
// HTTP API Tests
// ============================================================================

mod http_api {
    use super::*;

    #[tokio::test]
    async fn test_health_is_the_default_endpoint() {
        let db = empty_store().await;
        let response = get(&db, "/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["protocol"], "repOWR");
    }

    #[tokio::test]
    async fn test_legacy_path_is_served() {
        let db = seeded_store().await;
        let uri = format!("/api/index.php?endpoint=reputation&address={}", ALICE_FRIENDLY);
        let body = body_json(get(&db, &uri).await).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["address"], ALICE);
        assert_eq!(body["data"]["reputation"]["final_score"], 6.47);
    }

    #[tokio::test]
    async fn test_unknown_endpoint_lists_available() {
        let db = empty_store().await;
        let response = get(&db, "/?endpoint=nope").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Unknown endpoint");
        assert_eq!(body["available"].as_array().map(Vec::len), Some(5));
    }

    #[tokio::test]
    async fn test_missing_address_is_rejected() {
        let db = seeded_store().await;
        for uri in ["/?endpoint=reputation", "/?endpoint=reviews&address="] {
            let response = get(&db, uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = body_json(response).await;
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], "Address required");
            assert!(body.get("data").is_none());
        }
    }

    #[tokio::test]
    async fn test_undecodable_address_is_rejected() {
        let db = seeded_store().await;
        let response = get(&db, "/?endpoint=reputation&address=%21%21notbase64").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid address"));
    }

    #[tokio::test]
    async fn test_limit_is_clamped() {
        let db = ranking_store().await;

        let body = body_json(get(&db, "/?endpoint=top&limit=0").await).await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

        let body = body_json(get(&db, "/?endpoint=top&limit=999").await).await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

        let body = body_json(get(&db, "/?endpoint=top&limit=abc").await).await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_malformed_row_returns_500() {
        let db = malformed_store().await;
        let uri = format!("/?endpoint=reviews&address={}", ALICE);
        let response = get(&db, &uri).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Internal server error");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_preflight_is_answered_with_cors_headers() {
        let db = empty_store().await;
        let app = build_app(service(&db), &ApiConfig::default());
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/?endpoint=reputation")
            .header(header::ORIGIN, "https://widget.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_bare_options_succeeds() {
        let db = empty_store().await;
        let app = build_app(service(&db), &ApiConfig::default());
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_responses_carry_security_headers() {
        let db = empty_store().await;
        let app = build_app(service(&db), &ApiConfig::default());
        let request = Request::builder()
            .uri("/?endpoint=health")
            .header(header::ORIGIN, "https://widget.example")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert!(
            headers
                .get(header::CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("application/json")
        );
    }
}

// ============================================================================
// Store Failure Tests
// ============================================================================

mod store_unavailable {
    use super::*;

    fn missing_store() -> DatabasePool {
        let mut config = ApiConfig::default();
        config.database.path = std::env::temp_dir().join("repowr-missing-dir/reputation.db");
        config.database.acquire_timeout_secs = 1;
        DatabasePool::open(&config.database)
    }

    #[tokio::test]
    async fn test_health_works_without_store() {
        let db = missing_store();
        let response = get(&db, "/?endpoint=health").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_lookups_report_unavailable_without_details() {
        let db = missing_store();
        let response = get(&db, &format!("/?endpoint=reputation&address={}", ALICE)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Database unavailable");
        assert!(!body.to_string().contains("repowr-missing-dir"));
    }
}

// ============================================================================
// Widget Client Tests
// ============================================================================

mod widget_client {
    use super::*;
    use axum::Router;
    use axum::routing::get as get_route;
    use repowr_api::client::{ClientConfig, ClientError, ReputationClient, UNKNOWN_NAME};
    use std::net::SocketAddr;
    use std::time::Duration;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn client_for(addr: SocketAddr, path: &str, timeout: Duration) -> ReputationClient {
        ReputationClient::new(ClientConfig {
            api_url: format!("http://{}{}", addr, path),
            timeout,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_card_for_friendly_address() {
        let db = seeded_store().await;
        let addr = serve(build_app(service(&db), &ApiConfig::default())).await;
        let client = client_for(addr, "/api/index.php", Duration::from_secs(5));

        let card = client.fetch_card(ALICE_FRIENDLY).await.unwrap();
        assert_eq!(card.address, ALICE);
        assert_eq!(card.short_address, "0:132a...a46d");
        assert_eq!(card.name, "alice");
        assert_eq!(card.final_score, 6.47);
        assert_eq!(card.stars, "★★★★★");
        assert_eq!(card.skills, vec!["rust", "ton"]);
        assert_eq!(card.reviews.len(), 3);
        assert_eq!(card.reviews[0].stars, "★★★★☆");
    }

    #[tokio::test]
    async fn test_unknown_address_gets_placeholder_card() {
        let db = seeded_store().await;
        let server = serve(build_app(service(&db), &ApiConfig::default())).await;
        let client = client_for(server, "/", Duration::from_secs(5));

        let card = client.fetch_card(&super::addr('e')).await.unwrap();
        assert_eq!(card.name, UNKNOWN_NAME);
        assert!(!card.has_avatar);
        assert_eq!(card.total_ratings, 0);
        assert!(card.reviews.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_address_fails_before_any_request() {
        let client = ReputationClient::new(ClientConfig::default()).unwrap();
        let err = client.fetch_card("%%%").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn test_server_error_message_is_surfaced() {
        let mut config = ApiConfig::default();
        config.database.path = std::env::temp_dir().join("repowr-missing-dir/reputation.db");
        config.database.acquire_timeout_secs = 1;
        let db = DatabasePool::open(&config.database);
        let addr = serve(build_app(service(&db), &config)).await;
        let client = client_for(addr, "/", Duration::from_secs(5));

        let err = client.fetch_card(ALICE).await.unwrap_err();
        match err {
            ClientError::Api(message) => assert_eq!(message, "Database unavailable"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let app = Router::new().route(
            "/",
            get_route(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "{}"
            }),
        );
        let addr = serve(app).await;
        let client = client_for(addr, "/", Duration::from_millis(200));

        let err = client.fetch_card(ALICE).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout));
    }
}
