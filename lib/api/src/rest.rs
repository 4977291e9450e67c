use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, ResponseError, Result as ActixResult};
use lshfind_core::{Error, IndexRegistry, IndexStats};
use lshfind_corpus::{flatten_value, resolve_method, Catalog, METHOD_ALIASES};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_RESULTS: i64 = 10;
const DEFAULT_PER_PAGE: usize = 50;
const MAX_PER_PAGE: usize = 500;
const SUMMARY_CHARS: usize = 150;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimilarRequest {
    pub mode: Option<String>,
    pub product_id: Option<String>,
    pub method: Option<String>,
    pub k: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SimilarResponse {
    results: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductsQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// One page of the catalog listing.
#[derive(Debug, PartialEq, Serialize)]
pub struct ProductPage {
    pub products: Vec<Value>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

#[derive(Serialize)]
struct MethodInfo {
    name: String,
    alias: Option<&'static str>,
    field: Option<String>,
    stats: Option<IndexStats>,
}

/// Failures of a request, each with its HTTP status.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ApiError {
    #[error("Invalid method")]
    InvalidMethod,

    #[error("Only mode=by_id is supported")]
    UnsupportedMode,

    #[error("Product not found")]
    NotFound,

    #[error("{0}")]
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::InvalidMethod(_) => ApiError::InvalidMethod,
            Error::ItemNotFound(_) => ApiError::NotFound,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidMethod | ApiError::UnsupportedMode => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}

/// Resolve a similarity request against the registry. Checks run in the
/// order method, mode, product; `k` defaults to 10 and `k <= 0` yields no
/// results. Short method aliases (`pst`, `psd`, `pstd`) are accepted.
pub fn similar_items(
    registry: &IndexRegistry,
    req: &SimilarRequest,
) -> Result<Vec<String>, ApiError> {
    let method = resolve_method(req.method.as_deref().unwrap_or_default());
    let index = registry.get(method)?;

    if req.mode.as_deref() != Some("by_id") {
        return Err(ApiError::UnsupportedMode);
    }

    let product_id = req.product_id.as_deref().ok_or(ApiError::NotFound)?;
    let top_n = usize::try_from(req.k.unwrap_or(DEFAULT_RESULTS)).unwrap_or(0);

    Ok(index
        .find_similar(product_id, top_n)?
        .into_iter()
        .map(|item| item.id)
        .collect())
}

/// Card-sized view of a raw product record.
pub fn product_summary(record: &Value) -> Value {
    let text = |field: &str| record.get(field).and_then(flatten_value);
    let description = text("description")
        .map(|d| d.chars().take(SUMMARY_CHARS).collect::<String>());
    serde_json::json!({
        "asin": record.get("asin").cloned().unwrap_or(Value::Null),
        "title": text("title"),
        "description": description,
        "price": record.get("price").cloned().unwrap_or(Value::Null),
        "imageURL": record.get("imageURL").cloned().unwrap_or(Value::Null),
    })
}

/// Page through the catalog. `page` defaults to 1 and `per_page` to 50,
/// capped at 500.
pub fn product_page(catalog: &Catalog, query: &ProductsQuery) -> ProductPage {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    ProductPage {
        products: catalog.page(page, per_page).iter().map(product_summary).collect(),
        total: catalog.len(),
        page,
        per_page,
    }
}

pub struct RestApi;

impl RestApi {
    pub async fn start(
        registry: Arc<IndexRegistry>,
        catalog: Arc<Catalog>,
        host: String,
        port: u16,
    ) -> std::io::Result<()> {
        info!("HTTP API listening on {}:{}", host, port);
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(registry.clone()))
                .app_data(web::Data::new(catalog.clone()))
                .configure(routes)
        })
        .bind((host.as_str(), port))?
        .run()
        .await
    }
}

/// Route table, shared by the server and tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/api/methods", web::get().to(list_methods))
        .route("/api/similar", web::post().to(find_similar))
        .route("/api/products", web::get().to(list_products))
        .route("/api/product/{asin}", web::get().to(get_product));
}

async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok"
    })))
}

async fn list_methods(
    registry: web::Data<Arc<IndexRegistry>>,
) -> ActixResult<HttpResponse> {
    let methods: Vec<MethodInfo> = registry
        .methods()
        .into_iter()
        .map(|name| {
            let index = registry.get(name).ok();
            MethodInfo {
                name: name.to_string(),
                alias: METHOD_ALIASES
                    .iter()
                    .find(|(_, method)| *method == name)
                    .map(|&(alias, _)| alias),
                field: index.and_then(|i| i.field()).map(str::to_string),
                stats: index.and_then(|i| i.stats().ok()),
            }
        })
        .collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "result": methods
    })))
}

async fn find_similar(
    registry: web::Data<Arc<IndexRegistry>>,
    req: web::Json<SimilarRequest>,
) -> Result<HttpResponse, ApiError> {
    let results = similar_items(&registry, &req)?;
    debug!(
        method = req.method.as_deref().unwrap_or_default(),
        product_id = req.product_id.as_deref().unwrap_or_default(),
        results = results.len(),
        "similar request"
    );
    Ok(HttpResponse::Ok().json(SimilarResponse { results }))
}

async fn list_products(
    catalog: web::Data<Arc<Catalog>>,
    query: web::Query<ProductsQuery>,
) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(product_page(&catalog, &query)))
}

async fn get_product(
    catalog: web::Data<Arc<Catalog>>,
    asin: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let record = catalog.get(&asin).ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(record))
}
