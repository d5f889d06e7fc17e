use actix_multipart::{Multipart, MultipartError};
use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use log::info;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::db::{FileStore, StoreError};
use crate::errors::AppError;
use crate::intake::{self, IntakePolicy, RejectionReason};
use crate::utils::validation::validate_payload;

const LISTING_PATH: &str = "/AddFiles";

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditFile {
    id: Uuid,
    #[validate(length(min = 1, max = 255))]
    display_name: String,
    version: i32,
}

fn redirect_to_listing() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, LISTING_PATH))
        .finish()
}

/// Malformed ids can't name a stored file, so they read as "not found".
fn parse_file_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("File not found".to_string()))
}

/// True when the request is `multipart/form-data` and names a non-empty boundary.
fn has_multipart_boundary(req: &HttpRequest) -> bool {
    match req.mime_type() {
        Ok(Some(media_type)) => {
            media_type.type_() == mime::MULTIPART
                && media_type.subtype() == mime::FORM_DATA
                && media_type
                    .get_param(mime::BOUNDARY)
                    .map_or(false, |boundary| !boundary.as_str().is_empty())
        }
        _ => false,
    }
}

/// Framing errors that mean the request was never multipart to begin with.
fn multipart_error(err: MultipartError) -> AppError {
    match err {
        MultipartError::NoContentType | MultipartError::ParseContentType | MultipartError::Boundary => {
            AppError::UnsupportedMediaType("Expected multipart/form-data with a boundary".to_string())
        }
        other => AppError::BadRequest(format!("Malformed multipart body: {}", other)),
    }
}

pub async fn list_files(store: web::Data<dyn FileStore>) -> Result<HttpResponse, AppError> {
    let files = store.list().await?;
    Ok(HttpResponse::Ok().json(files))
}

/// Stores the first file part of the request.
///
/// Parts that are not form-data or carry no filename are skipped. The first
/// real file part decides the outcome, later parts are never read.
pub async fn upload_file(
    req: HttpRequest,
    store: web::Data<dyn FileStore>,
    policy: web::Data<IntakePolicy>,
    payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    if !has_multipart_boundary(&req) {
        return Err(AppError::UnsupportedMediaType(
            "Expected multipart/form-data with a boundary".to_string(),
        ));
    }

    let mut multipart = Multipart::new(req.headers(), payload);

    while let Some(field) = multipart.next().await {
        let field = field.map_err(multipart_error)?;

        let disposition = field.content_disposition().clone();
        let disposition_type = disposition.disposition.to_string();
        let file_name = disposition.get_filename();

        match intake::validate(field, file_name, &disposition_type, &policy).await {
            Ok(accepted) => {
                let stored = store.insert(accepted).await?;
                info!(
                    "stored file {} ({}, {} bytes)",
                    stored.id, stored.display_name, stored.size_bytes
                );
                return Ok(redirect_to_listing());
            }
            Err(RejectionReason::MalformedRequest(_)) | Err(RejectionReason::NoFileNameProvided) => {
                continue
            }
            Err(reason) => return Err(reason.into()),
        }
    }

    Err(AppError::BadRequest("No files data in the request.".to_string()))
}

pub async fn download_file(
    store: web::Data<dyn FileStore>,
    file_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let file_id = parse_file_id(&file_id)?;
    let file = store.fetch(file_id).await?;

    let header_name: String = file.display_name.chars().filter(|c| !c.is_control()).collect();

    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(header_name)],
        })
        .body(file.content))
}

pub async fn file_details(
    store: web::Data<dyn FileStore>,
    file_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let file_id = parse_file_id(&file_id)?;
    let summary = store.summary(file_id).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Renames a file. Only the display name is bindable; size, timestamp and
/// content never come from the client.
pub async fn edit_file(
    store: web::Data<dyn FileStore>,
    policy: web::Data<IntakePolicy>,
    file_id: web::Path<String>,
    edit: web::Json<EditFile>,
) -> Result<HttpResponse, AppError> {
    let file_id = parse_file_id(&file_id)?;
    if file_id != edit.id {
        return Err(AppError::NotFound("File not found".to_string()));
    }
    validate_payload(&*edit)?;

    if !policy.permits_file_name(&edit.display_name) {
        return Err(RejectionReason::UnsupportedExtension {
            permitted: policy.permitted_extensions().to_vec(),
        }
        .into());
    }
    let display_name = intake::escape_html(&edit.display_name);

    match store
        .update_display_name(file_id, edit.version, &display_name)
        .await
    {
        Ok(summary) => {
            info!("renamed file {} to {} (version {})", summary.id, summary.display_name, summary.version);
            Ok(redirect_to_listing())
        }
        Err(StoreError::ConcurrentUpdateConflict) => {
            if !store.exists(file_id).await? {
                return Err(StoreError::NotFound.into());
            }
            Err(StoreError::ConcurrentUpdateConflict.into())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn delete_file(
    store: web::Data<dyn FileStore>,
    file_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let file_id = parse_file_id(&file_id)?;
    store.delete(file_id).await?;
    info!("deleted file {}", file_id);
    Ok(redirect_to_listing())
}
