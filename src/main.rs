//! # Interview Backend - Main Application Entry Point
//!
//! Actix-web server hosting the automated interview WebSocket.
//!
//! ## Key Rust Concepts Used:
//! - **async/await**: the server, every connection and every interview task are async
//! - **actors**: each WebSocket connection is an actix actor that owns its session
//! - **trait objects**: external collaborators sit behind `Arc<dyn Trait>`
//! - **Result<T, E>**: startup errors propagate to `main` with `?`
//!
//! ## Application Architecture:
//! - **config**: layered configuration (defaults, `config.toml`, environment)
//! - **state**: shared configuration, metrics and collaborators
//! - **websocket** / **dispatch**: the `/ws` connection actor and its message handler
//! - **interview**: session coordinator, signals and the interview task
//! - **transcription** / **audio**: chunked speech-to-text of recorded answers
//! - **services**: language model, document, evaluation and analysis collaborators
//! - **health** / **handlers** / **middleware**: operational HTTP surface

mod audio;
mod config;
mod dispatch;
mod error;
mod handlers;
mod health;
mod interview;
mod middleware;
mod protocol;
mod services;
mod state;
mod transcription;
mod websocket;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Result;
use config::AppConfig;
use interview::interviewer::LlmInterviewer;
use services::analysis::ScoreAnalyzer;
use services::evaluator::LlmCodeEvaluator;
use services::extractor::PlainTextExtractor;
use services::gemini::GeminiClient;
use services::{LanguageModel, Services};
use state::AppState;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transcription::GoogleSpeechRecognizer;

/// The main application entry point.
///
/// ## What this function does:
/// 1. **Sets up logging** and loads `.env`
/// 2. **Loads and validates configuration**
/// 3. **Builds the collaborators** shared by every connection
/// 4. **Configures the HTTP server** with middleware and routes
/// 5. **Handles graceful shutdown** on SIGINT / SIGTERM
#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting interview-backend v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {}:{}", config.server.host, config.server.port);
    if config.services.google_api_key.trim().is_empty() {
        warn!("GOOGLE_API_KEY is not set; transcription and question generation will fail");
    }

    let app_state = AppState::new(config.clone(), build_services(&config));
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    info!("Starting HTTP server on {}", bind_addr);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::RequestMetrics)
            .wrap(TracingLogger::default())
            .route("/", web::get().to(index))
            .route("/ws", web::get().to(websocket::interview_websocket))
            .service(
                web::scope("/api/v1")
                    .route("/health", web::get().to(health::health_check))
                    .route("/metrics", web::get().to(health::detailed_metrics))
                    .route("/config", web::get().to(handlers::get_config))
                    .route("/config", web::put().to(handlers::update_config)),
            )
            .route("/health", web::get().to(health::health_check))
    })
    .disable_signals()
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Err(e)) => error!("Server error: {}", e),
                Err(e) => error!("Server task error: {}", e),
                Ok(Ok(())) => {}
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// One language model client serves question generation, scoring and code
/// evaluation.
fn build_services(config: &AppConfig) -> Services {
    let llm: Arc<dyn LanguageModel> = Arc::new(GeminiClient::from_config(config));
    info!(model = llm.model_name(), "Language model configured");

    Services {
        speech: Arc::new(GoogleSpeechRecognizer::from_config(config)),
        extractor: Arc::new(PlainTextExtractor),
        evaluator: Arc::new(LlmCodeEvaluator::new(Arc::clone(&llm))),
        analyzer: Arc::new(ScoreAnalyzer),
        interviewer: Arc::new(LlmInterviewer::new(llm)),
    }
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "data": "HELLO WORLD" }))
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interview_backend=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received SIGINT");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {}
        _ = terminate => {}
    }
}
