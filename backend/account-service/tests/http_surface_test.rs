//! HTTP surface behavior that does not need a live database. The pool is
//! created lazily and never connected; every request below settles before
//! touching storage.

use account_service::config::{
    AuthSettings, DatabaseSettings, EmailSettings, JobSettings, ServerSettings, SessionSettings,
    Settings,
};
use account_service::handlers;
use account_service::services::mailer::Mailer;
use actix_web::{test, web, App};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

fn test_settings() -> Settings {
    Settings {
        database: DatabaseSettings {
            url: "postgres://postgres@localhost/never_connected".to_string(),
            max_connections: 1,
            min_connections: 0,
            acquire_timeout: 1,
        },
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        auth: AuthSettings {
            token_ttl_seconds: None,
            relying_party_secret: "partner-shared-secret".to_string(),
            denied_hosts: vec!["compte.herime.com".to_string()],
            prune_revoked_after_days: 7,
        },
        session: SessionSettings {
            cookie_name: "hub_token".to_string(),
            cookie_secure: false,
            idle_timeout_minutes: 120,
        },
        email: EmailSettings {
            smtp_host: String::new(),
            smtp_port: 1025,
            smtp_username: None,
            smtp_password: None,
            smtp_from: "noreply@herime.com".to_string(),
            use_starttls: false,
            password_reset_base_url: None,
        },
        jobs: JobSettings {
            notification_sweep_interval_secs: 60,
            session_reaper_interval_secs: 3600,
            token_reaper_interval_secs: 86400,
        },
    }
}

fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://postgres@localhost/never_connected")
        .expect("lazy pool")
}

macro_rules! test_app {
    () => {{
        let settings = test_settings();
        let mailer = Mailer::new(&settings.email).expect("mailer");
        test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(settings))
                .app_data(web::Data::new(mailer))
                .route("/login", web::get().to(handlers::auth::login_page_handler))
                .route("/sso/redirect", web::get().to(handlers::sso::sso_redirect))
                .service(
                    web::scope("/api/v1")
                        .service(
                            web::scope("/auth")
                                .route("/login", web::post().to(handlers::auth::login))
                                .route("/logout", web::post().to(handlers::auth::logout))
                                .route("/me", web::get().to(handlers::auth::me)),
                        )
                        .service(web::scope("/sso").route(
                            "/generate-token",
                            web::post().to(handlers::sso::generate_token),
                        ))
                        .route(
                            "/validate-token",
                            web::post().to(handlers::sso::validate_token_external),
                        ),
                )
        )
        .await
    }};
}

#[actix_web::test]
async fn anonymous_login_page_renders_the_form() {
    let app = test_app!();

    let req = test::TestRequest::get()
        .uri("/login?redirect=https%3A%2F%2Fpartner.example%2Fcb")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("<form"));
    assert!(body.contains("https://partner.example/cb"));
}

#[actix_web::test]
async fn anonymous_sso_redirect_bounces_to_login_preserving_target() {
    let app = test_app!();

    let req = test::TestRequest::get()
        .uri("/sso/redirect?redirect=https%3A%2F%2Fpartner.example%2Fcb")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
    let location = resp
        .headers()
        .get(actix_web::http::header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.starts_with("/login?redirect="));
    assert!(location.contains("partner.example"));
}

#[actix_web::test]
async fn generate_token_requires_a_bearer_token() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/sso/generate-token")
        .set_json(serde_json::json!({"redirect": "https://partner.example/cb"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn external_validation_requires_the_shared_secret() {
    let app = test_app!();

    // No Authorization header at all.
    let req = test::TestRequest::post()
        .uri("/api/v1/validate-token")
        .set_json(serde_json::json!({"token": "whatever"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);

    // Wrong secret.
    let req = test::TestRequest::post()
        .uri("/api/v1/validate-token")
        .insert_header(("Authorization", "Bearer wrong-secret"))
        .set_json(serde_json::json!({"token": "whatever"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn login_rejects_malformed_email_before_touching_storage() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(serde_json::json!({"email": "not-an-email", "password": "x"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(
        resp.status(),
        actix_web::http::StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[actix_web::test]
async fn error_body_uses_the_failure_envelope() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(serde_json::json!({"email": "bad", "password": "x"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;

    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}
