use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use utoipa::OpenApi;

use crate::errors::ErrorBody;
use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Income Insight API",
        description = "Client records, segmentation analytics and placeholder income prediction."
    ),
    paths(
        handlers::health,
        handlers::list_clients,
        handlers::search_clients,
        handlers::get_client,
        handlers::create_client,
        handlers::predict_income,
        handlers::analytics,
    ),
    components(schemas(
        Client,
        NewClient,
        ClientView,
        Segment,
        PredictionRequest,
        PredictionResult,
        ConfidenceInterval,
        Recommendation,
        AnalyticsSummary,
        ModelPerformance,
        SegmentShare,
        BusinessMetrics,
        ErrorBody,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "clients", description = "Client records"),
        (name = "prediction", description = "Income prediction"),
        (name = "analytics", description = "Portfolio analytics"),
    )
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document.
///
/// # Returns
///
/// * `impl IntoResponse` - The OpenAPI document as JSON.
pub async fn serve_openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Serves the Swagger UI HTML page.
///
/// The page loads its assets from a CDN and reads the document served by
/// `serve_openapi_spec`.
pub async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Income Insight API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}
