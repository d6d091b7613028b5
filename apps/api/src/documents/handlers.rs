//! Axum route handler for document generation.

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::info;

use crate::documents::renderer::{DocumentInput, DocumentKind, PackageType};
use crate::errors::AppError;
use crate::security::gate::EndpointPolicy;
use crate::security::rate_limit::RateScope;
use crate::security::validate::{FieldFormat, FieldRule};
use crate::state::AppState;

// Narrative fields get a higher ceiling than the skills list; exceeding a
// ceiling is a validation failure, never a silent truncation.
const GENERATE_DOCUMENT: EndpointPolicy = EndpointPolicy {
    scope: RateScope::DOCUMENT,
    // CSRF-exempt by contract (guarded by validation + rate limiting).
    csrf_exempt: true,
    fields: &[
        FieldRule {
            name: "packageType",
            format: FieldFormat::PackageType,
            max_len: 10,
        },
        FieldRule {
            name: "work_experience",
            format: FieldFormat::Text,
            max_len: 5_000,
        },
        FieldRule {
            name: "education",
            format: FieldFormat::Text,
            max_len: 5_000,
        },
        FieldRule {
            name: "skills",
            format: FieldFormat::Text,
            max_len: 3_000,
        },
    ],
};

#[derive(Debug, Deserialize)]
pub struct GenerateDocumentRequest {
    #[serde(rename = "packageType")]
    pub package_type: PackageType,
    pub work_experience: String,
    pub education: String,
    pub skills: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentSummary {
    pub filename: String,
    pub content_type: String,
    pub size_bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct GenerateDocumentResponse {
    pub success: bool,
    pub message: String,
    pub documents: Vec<DocumentSummary>,
}

/// POST /api/generate-document
///
/// Renders the documents selected by `packageType` from the sanitized,
/// validated text fields.
pub async fn handle_generate_document(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GenerateDocumentResponse>, AppError> {
    let input = state.gate.input(&addr, &headers, &body);
    let payload = state.gate.admit(&GENERATE_DOCUMENT, &input)?;
    let request: GenerateDocumentRequest =
        serde_json::from_value(payload).map_err(|_| AppError::Parse)?;

    let doc_input = DocumentInput {
        work_experience: request.work_experience,
        education: request.education,
        skills: request.skills,
    };

    let kinds: &[DocumentKind] = match request.package_type {
        PackageType::Cv => &[DocumentKind::Cv],
        PackageType::Cover => &[DocumentKind::CoverLetter],
        PackageType::Both => &[DocumentKind::Cv, DocumentKind::CoverLetter],
    };

    let mut documents = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let rendered = state.renderer.render(*kind, &doc_input)?;
        documents.push(DocumentSummary {
            filename: rendered.filename,
            content_type: rendered.content_type.to_string(),
            size_bytes: rendered.bytes.len(),
        });
    }

    info!(count = documents.len(), "Documents generated");
    Ok(Json(GenerateDocumentResponse {
        success: true,
        message: "Documents generated".to_string(),
        documents,
    }))
}
