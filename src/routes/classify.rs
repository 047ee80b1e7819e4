use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classifier::Classifier;
use crate::extraction::{file_extension, Extractor};
use crate::models::{AppState, ClassificationResult, DocumentClassification, UploadedFile};
use crate::queue::DeliveryJob;
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/classify", post(classify_documents))
        .with_state(state)
}

#[derive(Debug, Default)]
struct ClassifyForm {
    files: Vec<UploadedFile>,
    platform: Option<String>,
    callback_url: Option<String>,
}

async fn read_form(multipart: &mut Multipart) -> AppResult<ClassifyForm> {
    let mut form = ClassifyForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidRequest(format!("Failed to read {}: {}", filename, e)))?;
                form.files.push(UploadedFile::new(filename, content_type, bytes));
            }
            "platform" | "callback_url" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidRequest(format!("Failed to read {}: {}", name, e)))?;
                let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                if name == "platform" {
                    form.platform = value;
                } else {
                    form.callback_url = value;
                }
            }
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// Extract and classify every uploaded file, in order. Delivery is queued
/// only once all files have been classified, so a failure part-way leaves
/// nothing scheduled.
async fn classify_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<Vec<DocumentClassification>>> {
    let form = read_form(&mut multipart).await?;
    if form.files.is_empty() {
        return Err(AppError::InvalidRequest("No files provided".to_string()));
    }

    info!(
        files = form.files.len(),
        platform = form.platform.as_deref().unwrap_or_default(),
        "Classification request received"
    );

    let mut response = Vec::with_capacity(form.files.len());
    let mut classified: Vec<(String, UploadedFile, ClassificationResult)> = Vec::with_capacity(form.files.len());

    for file in form.files {
        let extension = file_extension(&file.filename);
        if !state.config.upload.is_supported(&extension) {
            warn!(filename = %file.filename, extension = %extension, "File type not in SUPPORTED_FILE_TYPES");
        }

        let classification = classify_file(&state.extractor, &state.classifier, &file).await?;
        let document_id = Uuid::new_v4().to_string();

        response.push(DocumentClassification {
            document_id: document_id.clone(),
            document_name: file.filename.clone(),
            document_type: classification.document_type.clone(),
            confidence_score: classification.confidence_score,
            metadata: classification.metadata.clone(),
        });
        classified.push((document_id, file, classification));
    }

    if let (Some(platform), Some(callback_url)) = (form.platform, form.callback_url) {
        for (document_id, file, classification) in classified {
            state.delivery_queue.submit(DeliveryJob {
                platform: platform.clone(),
                document_id,
                file,
                classification,
                callback_url: Some(callback_url.clone()),
            });
        }
    }

    Ok(Json(response))
}

/// Extract on the blocking pool, then classify.
pub async fn classify_file(
    extractor: &Arc<Extractor>,
    classifier: &Classifier,
    file: &UploadedFile,
) -> AppResult<ClassificationResult> {
    let extractor = extractor.clone();
    let bytes = file.bytes.clone();
    let filename = file.filename.clone();
    let content_type = file.content_type.clone();

    let document = tokio::task::spawn_blocking(move || extractor.extract(&bytes, &filename, &content_type))
        .await
        .map_err(|e| AppError::Internal(format!("Extraction task failed: {}", e)))?
        .map_err(|source| AppError::Extraction {
            filename: file.filename.clone(),
            source,
        })?;

    classifier.classify(&document).await
}
