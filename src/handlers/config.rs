use crate::config::AppConfig;
use crate::{error::AppError, state::AppState};
use actix_web::{web, HttpResponse};
use serde_json::json;

/// The configuration as JSON with the API key masked.
fn redacted(config: &AppConfig) -> Result<serde_json::Value, AppError> {
    let mut value = serde_json::to_value(config)?;
    if let Some(key) = value.pointer_mut("/services/google_api_key") {
        let configured = key.as_str().is_some_and(|k| !k.trim().is_empty());
        *key = json!(if configured { "********" } else { "" });
    }
    Ok(value)
}

/// `GET /api/v1/config`.
pub async fn get_config(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let config = state.get_config();

    Ok(HttpResponse::Ok().json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "config": redacted(&config)?
    })))
}

/// `PUT /api/v1/config`.
///
/// Applies the tunable subset of fields (see `AppConfig::update_from_json`);
/// the result must still validate. New connections pick up the change.
pub async fn update_config(
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> Result<HttpResponse, AppError> {
    let json_str = serde_json::to_string(&body.into_inner())?;

    let mut current_config = state.get_config();
    current_config
        .update_from_json(&json_str)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .update_config(current_config.clone())
        .map_err(AppError::ValidationError)?;

    tracing::info!("Configuration updated");

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Configuration updated successfully",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "updated_config": redacted(&current_config)?
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{services, FixedRecognizer};
    use actix_web::{http::StatusCode, test as actix_test, App};

    fn state_with_key(key: &str) -> AppState {
        let mut config = AppConfig::default();
        config.services.google_api_key = key.to_string();
        AppState::new(config, services(FixedRecognizer::hearing("hi")))
    }

    #[test]
    fn test_api_key_is_masked() {
        let state = state_with_key("secret-key");
        let value = redacted(&state.get_config()).unwrap();
        assert_eq!(value["services"]["google_api_key"], "********");
        assert_eq!(value["audio"]["window_duration_ms"], 5000);

        let unset = redacted(&AppConfig::default()).unwrap();
        assert_eq!(unset["services"]["google_api_key"], "");
    }

    #[actix_web::test]
    async fn test_update_applies_and_validates() {
        let state = state_with_key("");
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .route("/config", web::put().to(update_config)),
        )
        .await;

        let ok = actix_test::TestRequest::put()
            .uri("/config")
            .set_json(json!({"interview": {"stop_grace_ms": 250}}))
            .to_request();
        assert_eq!(actix_test::call_service(&app, ok).await.status(), StatusCode::OK);
        assert_eq!(state.get_config().interview.stop_grace_ms, 250);

        let invalid = actix_test::TestRequest::put()
            .uri("/config")
            .set_json(json!({"audio": {"overlap_duration_ms": 6000}}))
            .to_request();
        assert_eq!(actix_test::call_service(&app, invalid).await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.get_config().audio.overlap_duration_ms, 500);
    }
}
