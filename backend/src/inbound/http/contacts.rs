//! Vendor contact handlers, admin-only and audited as app updates.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde_json::{Value, json};

use crate::domain::Error;
use crate::domain::activity::{ActivityAction, ActivityEntry, record_activity};
use crate::domain::catalog::AppRecord;
use crate::domain::contacts::ContactFields;
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::{csrf_from_body, require_admin, require_csrf};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

fn field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}

fn validated_fields(body: &Value, require_email: bool) -> Result<ContactFields, Error> {
    ContactFields::validate(
        field(body, "name"),
        field(body, "email"),
        field(body, "phone"),
        field(body, "role"),
        field(body, "notes"),
        field(body, "tags"),
        body.get("is_primary").and_then(Value::as_bool).unwrap_or(false),
        require_email,
    )
    .map_err(|errors| Error::invalid_request(errors.join("; ")).with_details(json!(errors)))
}

fn app_or_404(state: &HttpState, app_id: i64) -> Result<AppRecord, Error> {
    state
        .apps
        .find(app_id)?
        .ok_or_else(|| Error::not_found("App not found"))
}

fn audit_contact_change(state: &HttpState, app: &AppRecord, user_email: String, details: Value) {
    record_activity(
        state.activity.as_ref(),
        ActivityEntry {
            action: ActivityAction::Update,
            app_id: Some(app.id),
            app_name: app.name.clone(),
            user_email,
            details: Some(details),
        },
    );
}

#[get("/api/admin/apps/{app_id}/contacts")]
pub async fn list_contacts(
    state: web::Data<HttpState>,
    session: SessionContext,
    app_id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    require_admin(&session, &state.admin)?;
    app_or_404(&state, *app_id)?;
    let contacts = state.contacts.list_for_app(*app_id)?;
    Ok(HttpResponse::Ok().json(json!({ "contacts": contacts })))
}

#[post("/api/admin/apps/{app_id}/contacts")]
pub async fn create_contact(
    state: web::Data<HttpState>,
    session: SessionContext,
    app_id: web::Path<i64>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let user = require_admin(&session, &state.admin)?;
    require_csrf(&session, csrf_from_body(&body))?;
    let app = app_or_404(&state, *app_id)?;

    let fields = validated_fields(&body, true)?;
    let contact = state.contacts.insert(*app_id, &fields)?;
    audit_contact_change(
        &state,
        &app,
        user.email,
        json!({ "vendor_contact_created": contact.email }),
    );
    Ok(HttpResponse::Created().json(json!({ "contact": contact })))
}

/// Update a contact; a blank email keeps the stored one.
#[put("/api/admin/contacts/{contact_id}")]
pub async fn update_contact(
    state: web::Data<HttpState>,
    session: SessionContext,
    contact_id: web::Path<i64>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let user = require_admin(&session, &state.admin)?;
    require_csrf(&session, csrf_from_body(&body))?;

    let existing = state
        .contacts
        .find(*contact_id)?
        .ok_or_else(|| Error::not_found("Contact not found"))?;
    let app = app_or_404(&state, existing.app_id)?;

    let fields = validated_fields(&body, false)?;
    let contact = state.contacts.update(*contact_id, &fields)?;
    audit_contact_change(
        &state,
        &app,
        user.email,
        json!({ "vendor_contact_updated": contact.email }),
    );
    Ok(HttpResponse::Ok().json(json!({ "contact": contact })))
}

#[delete("/api/admin/contacts/{contact_id}")]
pub async fn delete_contact(
    state: web::Data<HttpState>,
    session: SessionContext,
    contact_id: web::Path<i64>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let user = require_admin(&session, &state.admin)?;
    require_csrf(&session, csrf_from_body(&body))?;

    let existing = state
        .contacts
        .find(*contact_id)?
        .ok_or_else(|| Error::not_found("Contact not found"))?;
    let app = app_or_404(&state, existing.app_id)?;

    state.contacts.delete(*contact_id)?;
    audit_contact_change(
        &state,
        &app,
        user.email,
        json!({ "vendor_contact_deleted": existing.email }),
    );
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    use crate::inbound::http::test_utils::{
        TestContext, csrf_token, register_and_login, test_app,
    };

    async fn seed_app<S, B>(app: &S, cookie: &Cookie<'static>, token: &str) -> i64
    where
        S: actix_web::dev::Service<
                actix_http::Request,
                Response = actix_web::dev::ServiceResponse<B>,
                Error = actix_web::Error,
            >,
        B: actix_web::body::MessageBody,
    {
        let res = test::call_service(
            app,
            test::TestRequest::post()
                .uri("/api/districts/x/apps")
                .cookie(cookie.clone())
                .set_json(json!({"name": "Tool", "csrf_token": token}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(res).await;
        body["app"]["id"].as_i64().expect("app id")
    }

    #[actix_web::test]
    async fn create_then_list_orders_primary_first() {
        let ctx = TestContext::new();
        let app = test::init_service(test_app(&ctx)).await;
        let cookie = register_and_login(&app, "admin@x.org", "secret123").await;
        let token = csrf_token(&app, &cookie).await;
        let app_id = seed_app(&app, &cookie, &token).await;

        for (name, email, primary) in [
            ("Alice", "alice@vendor.com", false),
            ("Zed", "zed@vendor.com", true),
        ] {
            let res = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri(&format!("/api/admin/apps/{app_id}/contacts"))
                    .cookie(cookie.clone())
                    .set_json(json!({
                        "name": name,
                        "email": email,
                        "is_primary": primary,
                        "csrf_token": token,
                    }))
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), StatusCode::CREATED);
        }

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/admin/apps/{app_id}/contacts"))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(res).await;
        let contacts = body["contacts"].as_array().expect("contacts");
        assert_eq!(contacts[0]["name"], "Zed");
        assert_eq!(contacts[1]["name"], "Alice");
    }

    #[actix_web::test]
    async fn duplicate_email_for_same_app_conflicts() {
        let ctx = TestContext::new();
        let app = test::init_service(test_app(&ctx)).await;
        let cookie = register_and_login(&app, "admin@x.org", "secret123").await;
        let token = csrf_token(&app, &cookie).await;
        let app_id = seed_app(&app, &cookie, &token).await;

        let payload = json!({
            "name": "Alice",
            "email": "alice@vendor.com",
            "csrf_token": token,
        });
        let first = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/admin/apps/{app_id}/contacts"))
                .cookie(cookie.clone())
                .set_json(payload.clone())
                .to_request(),
        )
        .await;
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/admin/apps/{app_id}/contacts"))
                .cookie(cookie)
                .set_json(payload)
                .to_request(),
        )
        .await;
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(second).await;
        assert_eq!(body["message"], "Contact already exists for this app");
    }

    #[actix_web::test]
    async fn create_validation_reports_every_error() {
        let ctx = TestContext::new();
        let app = test::init_service(test_app(&ctx)).await;
        let cookie = register_and_login(&app, "admin@x.org", "secret123").await;
        let token = csrf_token(&app, &cookie).await;
        let app_id = seed_app(&app, &cookie, &token).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/admin/apps/{app_id}/contacts"))
                .cookie(cookie)
                .set_json(json!({"csrf_token": token}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["details"], json!(["Name is required", "Email is required"]));
    }

    #[actix_web::test]
    async fn update_keeps_stored_email_when_blank() {
        let ctx = TestContext::new();
        let app = test::init_service(test_app(&ctx)).await;
        let cookie = register_and_login(&app, "admin@x.org", "secret123").await;
        let token = csrf_token(&app, &cookie).await;
        let app_id = seed_app(&app, &cookie, &token).await;

        let created = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/admin/apps/{app_id}/contacts"))
                .cookie(cookie.clone())
                .set_json(json!({
                    "name": "Alice",
                    "email": "alice@vendor.com",
                    "csrf_token": token,
                }))
                .to_request(),
        )
        .await;
        let created: Value = test::read_body_json(created).await;
        let contact_id = created["contact"]["id"].as_i64().expect("contact id");

        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&format!("/api/admin/contacts/{contact_id}"))
                .cookie(cookie)
                .set_json(json!({
                    "name": "Alice Cooper",
                    "phone": "555-0100",
                    "csrf_token": token,
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["contact"]["name"], "Alice Cooper");
        assert_eq!(body["contact"]["email"], "alice@vendor.com");
        assert_eq!(body["contact"]["phone"], "555-0100");
    }

    #[actix_web::test]
    async fn delete_removes_only_that_contact() {
        let ctx = TestContext::new();
        let app = test::init_service(test_app(&ctx)).await;
        let cookie = register_and_login(&app, "admin@x.org", "secret123").await;
        let token = csrf_token(&app, &cookie).await;
        let app_id = seed_app(&app, &cookie, &token).await;

        let mut ids = Vec::new();
        for email in ["a@vendor.com", "b@vendor.com"] {
            let res = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri(&format!("/api/admin/apps/{app_id}/contacts"))
                    .cookie(cookie.clone())
                    .set_json(json!({"name": "C", "email": email, "csrf_token": token}))
                    .to_request(),
            )
            .await;
            let body: Value = test::read_body_json(res).await;
            ids.push(body["contact"]["id"].as_i64().expect("id"));
        }

        let res = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/api/admin/contacts/{}", ids[0]))
                .cookie(cookie.clone())
                .set_json(json!({"csrf_token": token}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/admin/apps/{app_id}/contacts"))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(res).await;
        let contacts = body["contacts"].as_array().expect("contacts");
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0]["email"], "b@vendor.com");
    }

    #[actix_web::test]
    async fn unknown_app_and_contact_are_not_found() {
        let ctx = TestContext::new();
        let app = test::init_service(test_app(&ctx)).await;
        let cookie = register_and_login(&app, "admin@x.org", "secret123").await;
        let token = csrf_token(&app, &cookie).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/admin/apps/99/contacts")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri("/api/admin/contacts/99")
                .cookie(cookie)
                .set_json(json!({"csrf_token": token}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "Contact not found");
    }
}
