//! Invoice document handlers: admin-only serving, upload, and deletion.
//!
//! Stored invoice columns are comma-joined paths in the historical
//! `/static/documents/<name>` form; every filesystem operation goes through
//! the document-store port, which confines names to the upload root.

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::catalog::{join_invoices, split_invoices};
use crate::domain::documents::{allowed_file, basename, sanitize_filename};
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::{csrf_from_body, require_admin, require_csrf};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

fn content_type_for(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()) {
        Some(ext) => match ext.as_str() {
            "pdf" => "application/pdf",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "svg" => "image/svg+xml",
            "webp" => "image/webp",
            _ => "application/octet-stream",
        },
        None => "application/octet-stream",
    }
}

/// Serve an uploaded invoice to an admin. Tolerates stored full paths by
/// reducing to the basename before lookup.
#[get("/admin/invoices/{filename:.*}")]
pub async fn serve_invoice(
    state: web::Data<HttpState>,
    session: SessionContext,
    filename: web::Path<String>,
) -> ApiResult<HttpResponse> {
    require_admin(&session, &state.admin)?;
    let name = sanitize_filename(basename(&filename))
        .ok_or_else(|| Error::forbidden("Invalid filename"))?;
    let bytes = state.documents.read(&name)?;
    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&name))
        .body(bytes))
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    csrf_token: Option<String>,
}

/// Attach an uploaded invoice to an app.
///
/// The request body is the raw file; the target filename and CSRF token
/// travel as query parameters.
#[post("/admin/apps/{app_id}/upload-invoice")]
pub async fn upload_invoice(
    state: web::Data<HttpState>,
    session: SessionContext,
    app_id: web::Path<i64>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    require_admin(&session, &state.admin)?;
    require_csrf(&session, query.csrf_token.as_deref())?;

    if body.is_empty() {
        return Err(Error::invalid_request("No files provided"));
    }
    let Some(name) = sanitize_filename(&query.filename).filter(|n| allowed_file(n)) else {
        return Err(Error::invalid_request("No valid files uploaded"));
    };

    let app = state
        .apps
        .find(*app_id)?
        .ok_or_else(|| Error::not_found("App not found"))?;

    let unique_name = format!(
        "invoice_{}_{name}",
        &Uuid::new_v4().simple().to_string()[..8]
    );
    state.documents.save(&unique_name, &body)?;

    let stored_path = format!("/static/documents/{unique_name}");
    let mut invoices = split_invoices(app.invoices.as_deref());
    invoices.push(stored_path.clone());
    state.apps.set_invoices(*app_id, &join_invoices(&invoices))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "uploaded": [stored_path],
        "all_invoices": invoices,
    })))
}

/// Detach and delete an invoice. A path whose basename is not in the app's
/// invoice list is refused and nothing is touched on disk.
#[post("/admin/apps/{app_id}/delete-invoice")]
pub async fn delete_invoice(
    state: web::Data<HttpState>,
    session: SessionContext,
    app_id: web::Path<i64>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    require_admin(&session, &state.admin)?;
    require_csrf(&session, csrf_from_body(&body))?;

    let invoice_path = body
        .get("invoice_path")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if invoice_path.is_empty() {
        return Err(Error::invalid_request("No invoice path provided"));
    }
    let filename = basename(invoice_path);
    if filename.is_empty() {
        return Err(Error::invalid_request("Invalid invoice filename"));
    }

    let app = state
        .apps
        .find(*app_id)?
        .ok_or_else(|| Error::not_found("App not found"))?;

    let invoices = split_invoices(app.invoices.as_deref());
    if !invoices.iter().any(|inv| basename(inv) == filename) {
        return Err(Error::forbidden("Invoice not associated with this app"));
    }
    let remaining: Vec<String> = invoices
        .into_iter()
        .filter(|inv| basename(inv) != filename)
        .collect();
    state.apps.set_invoices(*app_id, &join_invoices(&remaining))?;

    // Best effort; the row is already updated and a missing file is the
    // desired end state.
    if let Some(safe_name) = sanitize_filename(filename)
        && let Err(err) = state.documents.delete(&safe_name)
    {
        warn!(invoice = %safe_name, error = %err, "invoice file removal failed");
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
