use std::collections::HashMap;

use pdf_table_to_csv::{CSV_MIME_TYPE, CsvDocument, ExtractionReport};
use serde::Serialize;
use url::Url;
use worker::{Context, Env, Request, Response, Result, RouteContext, Router};

use crate::csv_pipeline::{self, parse_flag};
use crate::error::ApiError;
use crate::models::{DEFAULT_MAX_UPLOAD_BYTES, HealthResponse, TablesResponse, TokensRequest};

#[derive(Debug, Clone)]
pub struct AppState {
    pub max_upload_bytes: usize,
}

pub async fn handle(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    let max_upload_bytes = env
        .var("MAX_UPLOAD_BYTES")
        .ok()
        .and_then(|value| value.to_string().trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

    let state = AppState { max_upload_bytes };

    Router::with_data(state)
        .get("/api/v1/health", health_route)
        .get_async("/api/v1/csv", csv_url_route)
        .post_async("/api/v1/csv", csv_upload_route)
        .get_async("/api/v1/tables", tables_url_route)
        .post_async("/api/v1/tables", tables_upload_route)
        .post_async("/api/v1/tokens/csv", tokens_csv_route)
        .run(req, env)
        .await
}

fn health_route(_req: Request, _ctx: RouteContext<AppState>) -> Result<Response> {
    json_response(&HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn csv_url_route(req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    respond(csv_url_response(&req, ctx.data.max_upload_bytes).await)
}

async fn csv_upload_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    respond(csv_upload_response(&mut req, ctx.data.max_upload_bytes).await)
}

async fn tables_url_route(req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    match tables_url_response(&req, ctx.data.max_upload_bytes).await {
        Ok(response) => json_response(&response),
        Err(error) => error.into_response(),
    }
}

async fn tables_upload_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    match tables_upload_response(&mut req, ctx.data.max_upload_bytes).await {
        Ok(response) => json_response(&response),
        Err(error) => error.into_response(),
    }
}

async fn tokens_csv_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    respond(tokens_csv_response(&mut req, ctx.data.max_upload_bytes).await)
}

fn respond(result: std::result::Result<Response, ApiError>) -> Result<Response> {
    match result {
        Ok(response) => Ok(response),
        Err(error) => {
            if error.status_code() >= 500 {
                worker::console_error!("request failed: {error}");
            }
            error.into_response()
        }
    }
}

async fn csv_url_response(
    req: &Request,
    max_upload_bytes: usize,
) -> std::result::Result<Response, ApiError> {
    let query = parse_query(req)?;
    let pdf_url = parse_source_url(&query)?;
    let options = csv_pipeline::options_from_query(&query)?;
    let force = parse_flag(&query, "force");

    let (bytes, cache_status) =
        csv_pipeline::get_or_build_csv_for_url(&pdf_url, &query, &options, force, max_upload_bytes)
            .await?;

    let file_name = match query.get("filename") {
        Some(name) => csv_pipeline::download_file_name(Some(name)),
        None => csv_pipeline::file_name_from_url(&pdf_url),
    };
    let mut response = csv_download(bytes, &file_name)?;
    response
        .headers_mut()
        .set("X-Cache-Status", cache_status.as_header_value())?;
    Ok(response)
}

async fn csv_upload_response(
    req: &mut Request,
    max_upload_bytes: usize,
) -> std::result::Result<Response, ApiError> {
    let query = parse_query(req)?;
    let options = csv_pipeline::options_from_query(&query)?;
    let body = read_body(req, max_upload_bytes).await?;

    let (csv, report) = csv_pipeline::convert_pdf_bytes(&body, &options)?;
    let file_name = csv_pipeline::download_file_name(query.get("filename").map(String::as_str));
    csv_response(&csv, &report, &file_name)
}

async fn tables_url_response(
    req: &Request,
    max_upload_bytes: usize,
) -> std::result::Result<TablesResponse, ApiError> {
    let query = parse_query(req)?;
    let pdf_url = parse_source_url(&query)?;
    let options = csv_pipeline::options_from_query(&query)?;
    let force = parse_flag(&query, "force");

    csv_pipeline::get_or_build_tables_for_url(&pdf_url, &query, &options, force, max_upload_bytes)
        .await
}

async fn tables_upload_response(
    req: &mut Request,
    max_upload_bytes: usize,
) -> std::result::Result<TablesResponse, ApiError> {
    let query = parse_query(req)?;
    let options = csv_pipeline::options_from_query(&query)?;
    let body = read_body(req, max_upload_bytes).await?;

    csv_pipeline::summarize_pdf_bytes(&body, &options)
}

async fn tokens_csv_response(
    req: &mut Request,
    max_upload_bytes: usize,
) -> std::result::Result<Response, ApiError> {
    let query = parse_query(req)?;
    let options = csv_pipeline::options_from_query(&query)?;
    let body = read_body(req, max_upload_bytes).await?;

    let request = serde_json::from_slice::<TokensRequest>(&body)
        .map_err(|error| ApiError::BadRequest(format!("invalid token payload: {error}")))?;
    let (csv, report) = csv_pipeline::convert_token_request(request, &options)?;
    let file_name = csv_pipeline::download_file_name(query.get("filename").map(String::as_str));
    csv_response(&csv, &report, &file_name)
}

async fn read_body(
    req: &mut Request,
    max_upload_bytes: usize,
) -> std::result::Result<Vec<u8>, ApiError> {
    let declared = req.headers().get("Content-Length")?;
    csv_pipeline::check_declared_size(declared.as_deref(), max_upload_bytes)?;

    let body = req.bytes().await?;
    csv_pipeline::check_upload_size(body.len(), max_upload_bytes)?;
    Ok(body)
}

fn csv_response(
    csv: &CsvDocument,
    report: &ExtractionReport,
    file_name: &str,
) -> std::result::Result<Response, ApiError> {
    let mut response = csv_download(csv.to_bytes(), file_name)?;
    let headers = response.headers_mut();
    headers.set("X-Table-Count", &report.table_count.to_string())?;
    headers.set("X-Row-Count", &report.row_count.to_string())?;
    Ok(response)
}

fn csv_download(bytes: Vec<u8>, file_name: &str) -> std::result::Result<Response, ApiError> {
    let mut response = Response::from_bytes(bytes)?;
    let headers = response.headers_mut();
    headers.set("Content-Type", CSV_MIME_TYPE)?;
    headers.set(
        "Content-Disposition",
        &format!("attachment; filename=\"{file_name}\""),
    )?;
    headers.set("Cache-Control", "no-store")?;
    Ok(response)
}

fn json_response<T>(payload: &T) -> Result<Response>
where
    T: Serialize,
{
    let mut response = Response::from_json(payload)?;
    response.headers_mut().set("Cache-Control", "no-store")?;
    Ok(response)
}

fn parse_query(req: &Request) -> std::result::Result<HashMap<String, String>, ApiError> {
    let url = req.url()?;
    let query = url
        .query_pairs()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect::<HashMap<_, _>>();
    Ok(query)
}

/// Only absolute `http`/`https` URLs are fetched.
pub fn parse_source_url(query: &HashMap<String, String>) -> std::result::Result<Url, ApiError> {
    let raw = query
        .get("url")
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing url query parameter".to_string()))?;

    let parsed = Url::parse(raw)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::BadRequest(format!(
            "unsupported url scheme: {}",
            parsed.scheme()
        )));
    }
    Ok(parsed)
}
