//! Handlers for file resources attached to projects, applications and users.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use propel_core::error::{CoreError, FieldViolation};
use propel_core::resource::{ModelTarget, Resource};
use propel_core::resources::{ReplaceRequest, UploadRequest};
use propel_core::types::EntityId;
use propel_core::validation::rules::RULE_INVALID_VALUE;
use propel_core::validation::RawInput;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_MIMETYPE: &str = "application/octet-stream";

/// The `file` part of a multipart form.
struct UploadedFile {
    file_name: String,
    mimetype: String,
    bytes: Vec<u8>,
}

/// A multipart form split into its file part and its text fields.
struct UploadForm {
    file: Option<UploadedFile>,
    fields: RawInput,
}

/// GET /api/v1/resources/{model_target}/{target_id}
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((model_target, target_id)): Path<(String, EntityId)>,
) -> AppResult<Json<DataResponse<Vec<Resource>>>> {
    let target = ModelTarget::from_name(&model_target).ok_or_else(|| {
        CoreError::validation(vec![FieldViolation::new("model_target", RULE_INVALID_VALUE)])
    })?;
    let resources = state.resources.list(target, target_id).await?;
    Ok(Json(DataResponse { data: resources }))
}

/// POST /api/v1/resources/{model_target}/{target_id}
///
/// Multipart form with a required `file` part and text fields `purpose`,
/// optional `name` (defaults to the uploaded file name) and `is_default`.
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    Path((model_target, target_id)): Path<(String, EntityId)>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Resource>>)> {
    let form = read_form(&mut multipart).await?;
    let file = form
        .file
        .ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;

    let mut descriptor = form.fields;
    descriptor.insert("model_target".into(), Value::String(model_target));
    descriptor
        .entry("name")
        .or_insert_with(|| Value::String(file.file_name.clone()));

    let resource = state
        .resources
        .upload(UploadRequest {
            requester_id: user.user_id,
            target_id,
            mimetype: file.mimetype,
            descriptor,
            bytes: file.bytes,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: resource })))
}

/// PUT /api/v1/resource-links/{link_id}
///
/// Multipart form with a required `file` part. The link keeps its file id.
pub async fn replace(
    State(state): State<AppState>,
    user: AuthUser,
    Path(link_id): Path<EntityId>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<Resource>>> {
    let form = read_form(&mut multipart).await?;
    let file = form
        .file
        .ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;

    let resource = state
        .resources
        .replace(ReplaceRequest {
            requester_id: user.user_id,
            link_id,
            original_name: file.file_name,
            mimetype: file.mimetype,
            bytes: file.bytes,
        })
        .await?;
    Ok(Json(DataResponse { data: resource }))
}

/// DELETE /api/v1/resource-links/{link_id}
pub async fn soft_delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(link_id): Path<EntityId>,
) -> AppResult<StatusCode> {
    state.resources.soft_delete(link_id, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn read_form(multipart: &mut Multipart) -> AppResult<UploadForm> {
    let mut file = None;
    let mut fields = RawInput::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let mimetype = field.content_type().unwrap_or(DEFAULT_MIMETYPE).to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            file = Some(UploadedFile {
                file_name,
                mimetype,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        fields.insert(name, form_value(text));
    }

    Ok(UploadForm { file, fields })
}

/// Form fields are text; booleans are recovered so the descriptor validator
/// sees typed values.
fn form_value(text: String) -> Value {
    match text.as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_form_fields_become_json_booleans() {
        assert_eq!(form_value("true".into()), Value::Bool(true));
        assert_eq!(form_value("false".into()), Value::Bool(false));
        assert_eq!(form_value("cover".into()), Value::String("cover".into()));
    }
}
