use std::time::Instant;

use axum::async_trait;
use axum::body::HttpBody;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{FromRequest, Multipart, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{BoxError, Form, Json};
use serde_json::json;
use tracing::info;

use crate::error::{TaskError, TaskResult};
use crate::helpers::attachment_filename;
use crate::task::{LinkedFile, NewTask, TaskService, TaskSummary, UpdateRequest};

#[derive(Clone)]
pub struct AppState {
    pub service: TaskService,
}

/// `PUT` body: JSON or urlencoded form, both decoded into the same request.
#[derive(Debug)]
pub struct UpdateBody(pub UpdateRequest);

#[async_trait]
impl<S, B> FromRequest<S, B> for UpdateBody
where
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
    S: Send + Sync,
{
    type Rejection = TaskError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(body) = Json::<UpdateRequest>::from_request(req, state)
                .await
                .map_err(|rejection| TaskError::Validation(rejection.body_text()))?;
            Ok(Self(body))
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(body) = Form::<UpdateRequest>::from_request(req, state)
                .await
                .map_err(|rejection| TaskError::Validation(rejection.body_text()))?;
            Ok(Self(body))
        } else {
            Err(TaskError::Validation(
                "expected an application/json or application/x-www-form-urlencoded body".to_string(),
            ))
        }
    }
}

pub async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

pub async fn handle_list(State(state): State<AppState>) -> TaskResult<Json<Vec<TaskSummary>>> {
    let service = state.service.clone();
    let tasks = blocking(move || service.list()).await?;
    Ok(Json(tasks))
}

pub async fn handle_create(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> TaskResult<(StatusCode, Json<TaskSummary>)> {
    let multipart = multipart.map_err(|rejection| TaskError::Validation(rejection.body_text()))?;
    let input = read_new_task(multipart).await?;
    let service = state.service.clone();
    let task = blocking(move || service.create(input)).await?;
    Ok((StatusCode::CREATED, Json(task.summary())))
}

pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<UpdateBody, TaskError>,
) -> TaskResult<Json<TaskSummary>> {
    let service = state.service.clone();
    // Unknown ids answer 404 before the body is looked at.
    let task = blocking(move || {
        service.store().find_by_id(&id)?;
        let UpdateBody(req) = body?;
        service.update(&id, req)
    })
    .await?;
    Ok(Json(task.summary()))
}

pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TaskResult<Json<serde_json::Value>> {
    let service = state.service.clone();
    blocking(move || service.delete(&id)).await?;
    Ok(Json(json!({"message": "Task deleted"})))
}

pub async fn handle_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> TaskResult<Response> {
    let service = state.service.clone();
    let file = blocking(move || service.fetch_file(&id)).await?;

    let content_type = HeaderValue::from_str(&file.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment_filename(&file.original_name)
    );
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|err| TaskError::Store(err.to_string()))?;

    Ok((
        [(CONTENT_TYPE, content_type), (CONTENT_DISPOSITION, disposition)],
        file.data,
    )
        .into_response())
}

pub async fn handle_not_found() -> TaskError {
    TaskError::NotFound("Not found".to_string())
}

pub async fn log_request<B>(req: Request<B>, next: Next<B>) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(req).await;
    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}

/// Collects `title`, `description`, `deadline` and the single optional
/// `linkedFile` part. Unknown text fields are ignored.
async fn read_new_task(mut multipart: Multipart) -> TaskResult<NewTask> {
    let mut input = NewTask::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            if name != "linkedFile" {
                return Err(TaskError::Validation(format!(
                    "unexpected file field `{}`",
                    name
                )));
            }
            if input.linked_file.is_some() {
                return Err(TaskError::Validation(
                    "only one linkedFile may be uploaded".to_string(),
                ));
            }
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await.map_err(bad_multipart)?;
            input.linked_file = Some(LinkedFile {
                data: data.to_vec(),
                content_type,
                original_name: file_name,
            });
            continue;
        }

        let value = field.text().await.map_err(bad_multipart)?;
        match name.as_str() {
            "title" => input.title = Some(value),
            "description" => input.description = Some(value),
            "deadline" => input.deadline = Some(value),
            _ => {}
        }
    }
    Ok(input)
}

fn bad_multipart(err: MultipartError) -> TaskError {
    TaskError::Validation(format!("malformed multipart body: {}", err))
}

async fn blocking<T, F>(f: F) -> TaskResult<T>
where
    F: FnOnce() -> TaskResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| TaskError::Store(err.to_string()))?
}
