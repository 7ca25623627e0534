//! Router tests over the in-memory ports
//!
//! Requests go through the full middleware stack, including JWT checks.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use core_kernel::StudentId;
use interface_api::auth::{create_token, Role};
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};
use test_utils::{student_profile, InMemoryPorts};

fn router(ports: &InMemoryPorts) -> Router {
    let state = AppState::new(
        Arc::new(ports.fees.clone()),
        Arc::new(ports.directory.clone()),
        Arc::new(ports.rules.clone()),
        Arc::new(ports.notifications.clone()),
        ApiConfig::default(),
    )
    .unwrap();
    create_router(state)
}

fn token(ports: &InMemoryPorts, role: Role, student_id: Option<StudentId>) -> String {
    let secret = ApiConfig::default().jwt_secret;
    create_token("user-1", role, ports.institute_id, student_id, &secret, 3600).unwrap()
}

fn admin(ports: &InMemoryPorts) -> String {
    token(ports, Role::Admin, None)
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn fee_body(ports: &InMemoryPorts) -> Value {
    json!({
        "student_id": ports.student.id,
        "batch_id": ports.batch.id,
        "total_fee": "9000",
        "discount": "500",
        "due_schedule": [
            { "due_date": "2024-01-01", "amount": "3000" },
            { "due_date": "2024-02-01", "amount": "3000" },
            { "due_date": "2024-03-01", "amount": "2500" }
        ]
    })
}

mod access {
    use super::*;

    #[tokio::test]
    async fn test_health_is_public() {
        let ports = InMemoryPorts::new().await;
        let app = router(&ports);

        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, _) = send(&app, Method::GET, "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let ports = InMemoryPorts::new().await;
        let app = router(&ports);

        let (status, _) = send(&app, Method::GET, "/api/v1/fees/student-fees", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, Method::GET, "/api/v1/fees/dues", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_teacher_cannot_create_rules() {
        let ports = InMemoryPorts::new().await;
        let app = router(&ports);
        let teacher = token(&ports, Role::Teacher, None);

        let body = json!({ "name": "Default reminders" });
        let (status, _) = send(&app, Method::POST, "/api/v1/notifications/reminder-rules", Some(&teacher), Some(body.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, rule) = send(&app, Method::POST, "/api/v1/notifications/reminder-rules", Some(&admin(&ports)), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(rule["days_before"], 3);
        assert_eq!(rule["every_n_days_after_due"], 3);
    }

    #[tokio::test]
    async fn test_student_cannot_record_payments() {
        let ports = InMemoryPorts::new().await;
        let fee = ports.add_fee(ports.fee()).await;
        let app = router(&ports);
        let student = token(&ports, Role::Student, Some(ports.student.id));

        let body = json!({
            "student_fee_id": fee.id,
            "amount": "100",
            "paid_on": "2024-01-05",
            "mode": "CASH"
        });
        let (status, _) = send(&app, Method::POST, "/api/v1/fees/payments", Some(&student), Some(body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

mod fee_mapping {
    use super::*;

    #[tokio::test]
    async fn test_create_then_duplicate_conflicts() {
        let ports = InMemoryPorts::new().await;
        let app = router(&ports);
        let token = admin(&ports);

        let (status, fee) = send(&app, Method::POST, "/api/v1/fees/student-fees", Some(&token), Some(fee_body(&ports))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(fee["due_amount"], "8500.00");
        assert_eq!(fee["paid_amount"], "0.00");

        let (status, _) = send(&app, Method::POST, "/api/v1/fees/student-fees", Some(&token), Some(fee_body(&ports))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_discount_above_total_is_rejected() {
        let ports = InMemoryPorts::new().await;
        let app = router(&ports);

        let mut body = fee_body(&ports);
        body["discount"] = json!("9500");
        let (status, _) = send(&app, Method::POST, "/api/v1/fees/student-fees", Some(&admin(&ports)), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_schedule_fails_validation() {
        let ports = InMemoryPorts::new().await;
        let app = router(&ports);

        let mut body = fee_body(&ports);
        body["due_schedule"] = json!([]);
        let (status, error) = send(&app, Method::POST, "/api/v1/fees/student-fees", Some(&admin(&ports)), Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error["error"], "validation_error");
    }
}

mod payments {
    use super::*;

    #[tokio::test]
    async fn test_payment_updates_dues() {
        let ports = InMemoryPorts::new().await;
        let fee = ports.add_fee(ports.fee()).await;
        let app = router(&ports);
        let token = admin(&ports);

        let body = json!({
            "student_fee_id": fee.id,
            "amount": "2500",
            "paid_on": "2024-01-05",
            "mode": "UPI"
        });
        let (status, payment) = send(&app, Method::POST, "/api/v1/fees/payments", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(payment["receipt_no"].as_str().unwrap().starts_with("RCPT-"));

        let (status, dues) = send(&app, Method::GET, "/api/v1/fees/dues", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dues[0]["due_amount"], "6000.00");
        assert_eq!(dues[0]["next_due_date"], "2024-01-01");
        assert_eq!(dues[0]["upcoming_due_amount"], "500.00");
    }

    #[tokio::test]
    async fn test_overpayment_is_rejected() {
        let ports = InMemoryPorts::new().await;
        let fee = ports.add_fee(ports.fee()).await;
        let app = router(&ports);

        let body = json!({
            "student_fee_id": fee.id,
            "amount": "9000",
            "paid_on": "2024-01-05",
            "mode": "BANK"
        });
        let (status, error) = send(&app, Method::POST, "/api/v1/fees/payments", Some(&admin(&ports)), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["message"], "Payment exceeds due amount");
    }
}

mod student_scope {
    use super::*;

    #[tokio::test]
    async fn test_student_sees_only_own_fees() {
        let ports = InMemoryPorts::new().await;
        let other = student_profile(ports.institute_id, "Rohan Iyer");
        ports.directory.add_student(other.clone()).await;
        ports.directory.enroll(other.id, ports.batch.id).await;

        ports.add_fee(ports.fee()).await;
        let others_fee = ports.add_fee(ports.fee().student(other.id)).await;

        let app = router(&ports);
        let student = token(&ports, Role::Student, Some(ports.student.id));

        let (status, page) = send(&app, Method::GET, "/api/v1/fees/student-fees", Some(&student), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 1);
        assert_eq!(page["items"][0]["student_id"], json!(ports.student.id));

        let uri = format!("/api/v1/fees/student-fees/{}", uuid::Uuid::from(others_fee.id));
        let (status, _) = send(&app, Method::GET, &uri, Some(&student), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, Method::GET, "/api/v1/dashboard/fees", Some(&student), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

mod reminders {
    use super::*;

    #[tokio::test]
    async fn test_rerun_creates_no_duplicates() {
        let ports = InMemoryPorts::new().await;
        ports.add_fee(ports.fee()).await;
        let app = router(&ports);
        let token = admin(&ports);
        let uri = "/api/v1/notifications/run-reminders?run_date=2024-01-29";

        let (status, first) = send(&app, Method::POST, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["created_notifications"], 1);
        assert_eq!(first["run_date"], "2024-01-29");

        let (_, second) = send(&app, Method::POST, uri, Some(&token), None).await;
        assert_eq!(second["created_notifications"], 0);
        assert_eq!(second["duplicates_skipped"], 1);
    }

    #[tokio::test]
    async fn test_invalid_run_date_is_bad_request() {
        let ports = InMemoryPorts::new().await;
        let app = router(&ports);

        let uri = "/api/v1/notifications/run-reminders?run_date=29-01-2024";
        let (status, _) = send(&app, Method::POST, uri, Some(&admin(&ports)), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_student_reads_reminder_and_template() {
        let ports = InMemoryPorts::new().await;
        ports.add_fee(ports.fee()).await;
        let app = router(&ports);
        let student = token(&ports, Role::Student, Some(ports.student.id));

        send(
            &app,
            Method::POST,
            "/api/v1/notifications/run-reminders?run_date=2024-01-29",
            Some(&admin(&ports)),
            None,
        )
        .await;

        let (status, page) = send(&app, Method::GET, "/api/v1/notifications?type=FEE_REMINDER", Some(&student), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 1);
        let id = page["items"][0]["id"].as_str().unwrap().to_string();

        let (status, template) = send(
            &app,
            Method::GET,
            &format!("/api/v1/notifications/{}/whatsapp-template", id),
            Some(&student),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(template["template"].as_str().unwrap().starts_with("Hello Asha Verma"));

        let (status, read) = send(&app, Method::PATCH, &format!("/api/v1/notifications/{}/read", id), Some(&student), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(read["read_at"].is_string());
    }
}
