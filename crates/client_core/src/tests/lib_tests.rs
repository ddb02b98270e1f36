use super::*;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use shared::domain::PostId;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone)]
struct CatalogState {
    posts: Arc<Vec<Value>>,
    queries: Arc<Mutex<Vec<(u32, u64)>>>,
}

#[derive(Deserialize)]
struct LimitSkip {
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    skip: u64,
}

fn default_limit() -> u32 {
    30
}

fn sample_post(id: i64) -> Value {
    json!({
        "id": id,
        "title": format!("Post {id}"),
        "body": "body text",
        "tags": ["history"],
        "reactions": { "likes": 3, "dislikes": 1 },
        "views": 42,
        "userId": 7,
    })
}

fn sample_posts(count: i64) -> Vec<Value> {
    (1..=count).map(sample_post).collect()
}

async fn list_posts(
    State(state): State<CatalogState>,
    Query(query): Query<LimitSkip>,
) -> Json<Value> {
    state.queries.lock().await.push((query.limit, query.skip));
    let total = state.posts.len();
    let start = (query.skip as usize).min(total);
    let end = (start + query.limit as usize).min(total);
    Json(json!({
        "posts": state.posts[start..end].to_vec(),
        "total": total,
        "skip": query.skip,
        "limit": query.limit,
    }))
}

async fn get_post(
    State(state): State<CatalogState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    state
        .posts
        .iter()
        .find(|post| post["id"].as_i64() == Some(id))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn failing_products() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn_catalog_server(posts: Vec<Value>) -> (String, CatalogState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = CatalogState {
        posts: Arc::new(posts),
        queries: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/:id", get(get_post))
        .route("/products", get(failing_products))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

async fn spawn_misbehaving_server() -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().route("/posts", get(|| async { Json(json!({ "total": 3 })) }));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn fetch_page_sends_limit_and_skip_and_decodes_the_payload() {
    let (base_url, state) = spawn_catalog_server(sample_posts(25)).await;
    let source = HttpCatalogSource::posts(Client::new(), base_url);

    let page = source
        .fetch_page(PageRequest::for_page(1, 10))
        .await
        .expect("page");

    assert_eq!(page.total, 25);
    assert_eq!(page.items.len(), 10);
    assert_eq!(page.items[0].id, PostId(11));
    assert_eq!(page.items[0].title, "Post 11");
    assert_eq!(state.queries.lock().await.as_slice(), &[(10, 10)]);
}

#[tokio::test]
async fn trailing_slash_in_the_base_url_is_tolerated() {
    let (base_url, _state) = spawn_catalog_server(sample_posts(3)).await;
    let source = HttpCatalogSource::posts(Client::new(), format!("{base_url}/"));

    let page = source
        .fetch_page(PageRequest::for_page(0, 10))
        .await
        .expect("page");
    assert_eq!(page.items.len(), 3);
}

#[tokio::test]
async fn non_success_status_surfaces_as_a_status_error() {
    let (base_url, _state) = spawn_catalog_server(sample_posts(3)).await;
    let source = HttpCatalogSource::products(Client::new(), base_url);

    let err = source
        .fetch_page(PageRequest::for_page(0, 10))
        .await
        .expect_err("must fail");

    match err {
        FetchError::Status { status, url } => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/products"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn payload_missing_the_collection_key_is_a_decode_error() {
    let base_url = spawn_misbehaving_server().await;
    let source = HttpCatalogSource::posts(Client::new(), base_url);

    let err = source
        .fetch_page(PageRequest::for_page(0, 10))
        .await
        .expect_err("must fail");

    assert!(matches!(err, FetchError::Decode(_)), "got {err}");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Nothing listens on this port; bind-then-drop guarantees it was free.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let source = HttpCatalogSource::posts(Client::new(), format!("http://{addr}"));
    let err = source
        .fetch_page(PageRequest::for_page(0, 10))
        .await
        .expect_err("must fail");

    assert!(matches!(err, FetchError::Transport(_)), "got {err}");
}

#[tokio::test]
async fn fetch_item_returns_a_single_post() {
    let (base_url, _state) = spawn_catalog_server(sample_posts(5)).await;
    let source = HttpCatalogSource::posts(Client::new(), base_url);

    let post = source.fetch_item(3).await.expect("post");
    assert_eq!(post.id, PostId(3));
    assert_eq!(post.title, "Post 3");
}

#[tokio::test]
async fn fetch_item_maps_missing_ids_to_a_404_status_error() {
    let (base_url, _state) = spawn_catalog_server(sample_posts(5)).await;
    let source = HttpCatalogSource::posts(Client::new(), base_url);

    let err = source.fetch_item(99).await.expect_err("missing");
    assert!(matches!(err, FetchError::Status { status: 404, .. }), "got {err}");
}

#[tokio::test]
async fn controller_paginates_over_http_end_to_end() {
    let (base_url, state) = spawn_catalog_server(sample_posts(25)).await;
    let source = Arc::new(HttpCatalogSource::posts(Client::new(), base_url));
    let controller = PaginatedListController::new(source as Arc<dyn ListSource<Post>>, 10);

    controller.load_first_page().await;
    controller.load_next_page().await;
    controller.load_next_page().await;
    controller.load_next_page().await; // exhausted: must not hit the server

    let list = controller.state().await;
    assert_eq!(list.items.len(), 25);
    assert_eq!(list.current_page, 2);
    assert!(list.is_exhausted());
    assert!(!list.has_error);
    assert_eq!(
        state.queries.lock().await.as_slice(),
        &[(10, 0), (10, 10), (10, 20)]
    );
}
