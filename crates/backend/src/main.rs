mod assets;
mod config;
mod graphql;
mod presenter;
mod storage;

use std::path::Path;
use std::sync::Arc;

use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::http::HeaderValue;
use axum::{extract::State, response::Html, routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

use config::Config;
use graphql::Schema;

async fn graphql_handler(State(schema): State<Schema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn graphiql() -> Html<String> {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint("/graphql")
            .finish(),
    )
}

/// Serve `dir` with a fixed `Cache-Control` header.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Build the full application router.
fn build_app(schema: Schema, assets_dir: &Path) -> Router {
    let static_files = Router::new()
        .nest("/static", cached_static_router(assets_dir, CACHE_1DAY))
        .nest(
            "/dist",
            cached_static_router(Path::new("dist"), CACHE_IMMUTABLE),
        )
        .nest(
            "/assets",
            cached_static_router(Path::new("dist/assets"), CACHE_IMMUTABLE),
        );

    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/", get(serve_index))
        .with_state(schema)
        .merge(static_files)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let catalog = Arc::new(assets::load_catalog(&config.assets_dir)?);

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let storage = storage::Storage::open(&config.db_path)?;
    let presenter = Arc::new(presenter::Presenter::from_config(&config));

    let schema = graphql::build_schema(catalog, storage, presenter);
    let app = build_app(schema, &config.assets_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Server running at http://localhost:{}", config.port);
    tracing::info!("GraphiQL playground at http://localhost:{}/graphql", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn serve_index() -> Html<String> {
    // Serve the built frontend, or a pointer to GraphiQL before it is built
    match std::fs::read_to_string("dist/index.html") {
        Ok(html) => Html(html),
        Err(_) => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Mangrove Forest Visualization Dashboard</title></head>
<body>
<h1>Mangrove Forest Visualization Dashboard</h1>
<p>Frontend not built yet. Visit <a href="/graphql">GraphiQL</a> to explore the API.</p>
</body>
</html>"#
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use mangrove_shared::catalog::Catalog;
    use tower::ServiceExt;

    /// The real router over a temp database, serving `/static` from a temp
    /// assets dir holding `catalog.json`. The dirs must outlive the router.
    fn test_app(catalog_json: &str) -> (tempfile::TempDir, tempfile::TempDir, Router) {
        let assets_dir = tempfile::tempdir().unwrap();
        std::fs::write(assets_dir.path().join("catalog.json"), catalog_json).unwrap();
        let db_dir = tempfile::tempdir().unwrap();
        let storage = storage::Storage::open(&db_dir.path().join("sessions.redb")).unwrap();
        let presenter = presenter::Presenter::from_config(&Config::from_lookup(|_| None));
        let schema = graphql::build_schema(Arc::new(Catalog::builtin()), storage, Arc::new(presenter));
        let app = build_app(schema, assets_dir.path());
        (assets_dir, db_dir, app)
    }

    async fn body_text(resp: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_catalog_json_is_served_with_1day_cache() {
        let (_assets, _db, app) = test_app(r#"{"land_cover":{}}"#);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/static/catalog.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("cache-control").unwrap(), CACHE_1DAY);
        assert_eq!(body_text(resp).await, r#"{"land_cover":{}}"#);
    }

    #[tokio::test]
    async fn test_missing_static_file_returns_404() {
        let (_assets, _db, app) = test_app("{}");

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/static/nonexistent.txt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_graphql_get_serves_graphiql() {
        let (_assets, _db, app) = test_app("{}");

        let resp = app
            .oneshot(Request::builder().uri("/graphql").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
        let body = body_text(resp).await;
        assert!(body.to_lowercase().contains("graphiql"));
        assert!(body.contains("/graphql"));
    }

    #[tokio::test]
    async fn test_graphql_post_answers_queries() {
        let (_assets, _db, app) = test_app("{}");

        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/graphql")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query":"{ modes { id } }"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(json["data"]["modes"][0]["id"], "land_cover");
        assert_eq!(json["data"]["modes"][1]["id"], "change_detection");
    }

    #[tokio::test]
    async fn test_index_falls_back_without_frontend() {
        let Html(body) = serve_index().await;
        assert!(body.contains("<html"));
    }
}
