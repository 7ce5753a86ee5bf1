mod http_error;
mod run_payload;

use self::http_error::HttpError;
use self::run_payload::{InvalidRun, RunPayload};
use crate::database::{Location, RunRepository, RunStore};
use actix_web::dev::Server;
use actix_web::error::JsonPayloadError;
use actix_web::http::{header, StatusCode};
use actix_web::middleware::{Compress, Logger};
use actix_web::web::{self, Data, Json, JsonConfig, Path, ServiceConfig};
use actix_web::{
    delete, get, post, put, App, HttpRequest, HttpResponse, HttpServer, Responder, Result,
};
use log::{debug, info};
use serde_json::Value;
use std::sync::MutexGuard;

/// Acquire exclusive access to the run store for the rest of the request
fn lock_store(store: &RunStore) -> Result<MutexGuard<'_, Box<dyn RunRepository + Send>>, HttpError> {
    store
        .lock()
        .map_err(|_| HttpError::from_status_code(StatusCode::INTERNAL_SERVER_ERROR))
}

// Bodies that are not JSON at all are rejected before any field is read
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    HttpError::from(InvalidRun::new(format!("request body is not valid JSON: {err}"))).into()
}

#[get("")]
async fn find_all(store: Data<RunStore>) -> Result<impl Responder> {
    let runs = lock_store(&store)?.find_all().map_err(HttpError::from)?;
    Ok(Json(runs))
}

#[get("/{id}")]
async fn find_by_id(id: Path<i64>, store: Data<RunStore>) -> Result<impl Responder> {
    let run = lock_store(&store)?
        .find_by_id(id.into_inner())
        .map_err(HttpError::from)?
        .ok_or_else(|| HttpError::from_status_code(StatusCode::NOT_FOUND))?;
    Ok(Json(run))
}

#[get("/location/{location}")]
async fn find_by_location(location: Path<String>, store: Data<RunStore>) -> Result<impl Responder> {
    // No run can be stored with an unknown location
    let runs = match location.parse::<Location>() {
        Ok(location) => lock_store(&store)?
            .find_all_by_location(location)
            .map_err(HttpError::from)?,
        Err(_) => Vec::new(),
    };
    Ok(Json(runs))
}

#[post("")]
async fn create_run(body: Json<Value>, store: Data<RunStore>) -> Result<impl Responder> {
    let new_run = RunPayload::from_json(body.into_inner())
        .and_then(RunPayload::into_new_run)
        .map_err(HttpError::from)?;
    let run = lock_store(&store)?
        .create(new_run)
        .map_err(HttpError::from)?;
    info!("Created run {}", run.id);
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/api/runs/{}", run.id)))
        .finish())
}

#[put("/{id}")]
async fn update_run(
    id: Path<i64>,
    body: Json<Value>,
    store: Data<RunStore>,
) -> Result<impl Responder> {
    let id = id.into_inner();
    let payload = RunPayload::from_json(body.into_inner()).map_err(HttpError::from)?;
    let mut store = lock_store(&store)?;
    let existing = store
        .find_by_id(id)
        .map_err(HttpError::from)?
        .ok_or_else(|| HttpError::from_status_code(StatusCode::NOT_FOUND))?;
    let merged = payload.merge_into(existing).map_err(HttpError::from)?;

    // The run may have been deleted by another process since it was loaded
    if !store.update(&merged, id).map_err(HttpError::from)? {
        return Err(HttpError::from_status_code(StatusCode::NOT_FOUND).into());
    }
    debug!("Updated run {id}");
    Ok(HttpResponse::NoContent().finish())
}

#[delete("/{id}")]
async fn delete_run(id: Path<i64>, store: Data<RunStore>) -> Result<impl Responder> {
    let id = id.into_inner();
    let mut store = lock_store(&store)?;
    if store.find_by_id(id).map_err(HttpError::from)?.is_none()
        || !store.delete(id).map_err(HttpError::from)?
    {
        return Err(HttpError::from_status_code(StatusCode::NOT_FOUND).into());
    }
    info!("Deleted run {id}");
    Ok(HttpResponse::NoContent().finish())
}

/// Register the run endpoints
pub fn configure(config: &mut ServiceConfig) {
    config.service(
        web::scope("/api/runs")
            .app_data(JsonConfig::default().error_handler(json_error))
            .service(find_all)
            .service(find_by_location)
            .service(find_by_id)
            .service(create_run)
            .service(update_run)
            .service(delete_run),
    );
}

/// Create the HTTP server, which will start serving requests when awaited
pub fn create_server(store: Data<RunStore>, host: &str, port: u16) -> std::io::Result<Server> {
    info!("Starting HTTP server on {host}:{port}");
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(Logger::default())
            .app_data(store.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run();
    Ok(server)
}
