use account_service::config::Settings;
use account_service::services::mailer::Mailer;
use account_service::{handlers, jobs};
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .min_connections(settings.database.min_connections)
        .acquire_timeout(Duration::from_secs(settings.database.acquire_timeout))
        .connect(&settings.database.url)
        .await?;
    tracing::info!("Database connection pool created");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let mailer = Mailer::new(&settings.email)?;

    // Background maintenance loops live for the whole process.
    tokio::spawn(jobs::notification_sweep::run(
        pool.clone(),
        mailer.clone(),
        settings.jobs.notification_sweep_interval_secs,
    ));
    tokio::spawn(jobs::session_reaper::run(
        pool.clone(),
        settings.jobs.session_reaper_interval_secs,
        settings.session.idle_timeout_minutes,
    ));
    tokio::spawn(jobs::token_reaper::run(
        pool.clone(),
        settings.jobs.token_reaper_interval_secs,
        settings.auth.prune_revoked_after_days,
    ));

    let bind_addr = (settings.server.host.clone(), settings.server.port);
    tracing::info!(host = %settings.server.host, port = settings.server.port, "Starting HTTP server");

    let app_settings = settings.clone();
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(app_settings.clone()))
            .app_data(web::Data::new(mailer.clone()))
            // Page-load flows
            .route("/login", web::get().to(handlers::auth::login_page_handler))
            .route("/sso/redirect", web::get().to(handlers::sso::sso_redirect))
            // JSON API
            .service(
                web::scope("/api/v1")
                    .route("/health", web::get().to(handlers::health::health))
                    .service(
                        web::scope("/auth")
                            .route("/login", web::post().to(handlers::auth::login))
                            .route("/register", web::post().to(handlers::auth::register))
                            .route("/logout", web::post().to(handlers::auth::logout))
                            .route("/me", web::get().to(handlers::auth::me))
                            .route("/deactivate", web::post().to(handlers::auth::deactivate))
                            .route("/sessions", web::get().to(handlers::sessions::list_sessions))
                            .route(
                                "/forgot-password",
                                web::post().to(handlers::password::forgot_password),
                            )
                            .route(
                                "/reset-password",
                                web::post().to(handlers::password::reset_password),
                            ),
                    )
                    .service(
                        web::scope("/sso")
                            .route(
                                "/generate-token",
                                web::post().to(handlers::sso::generate_token),
                            )
                            .route(
                                "/validate-token",
                                web::post().to(handlers::sso::validate_token),
                            ),
                    )
                    .route(
                        "/validate-token",
                        web::post().to(handlers::sso::validate_token_external),
                    ),
            )
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
