pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::documents::{self, validation::MAX_UPLOAD_BYTES};
use crate::state::AppState;
use crate::{functions, graph, interview, profile, realtime};

/// Multipart framing overhead allowed on top of the file size limit, so an
/// oversized file is rejected by validation with a clear message.
const UPLOAD_BODY_SLACK: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profile
        .route("/api/v1/profile", get(profile::handlers::handle_get_profile))
        .route(
            "/api/v1/profile/completeness",
            get(profile::handlers::handle_profile_completeness),
        )
        .route(
            "/api/v1/profile/summary",
            get(profile::handlers::handle_profile_summary),
        )
        .route(
            "/api/v1/profile/import",
            post(profile::handlers::handle_import),
        )
        .route(
            "/api/v1/profile/:section",
            post(profile::handlers::handle_create_record),
        )
        .route(
            "/api/v1/profile/:section/:id",
            axum::routing::put(profile::handlers::handle_update_record)
                .delete(profile::handlers::handle_delete_record),
        )
        // Documents
        .route(
            "/api/v1/documents",
            post(documents::handlers::handle_upload)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + UPLOAD_BODY_SLACK))
                .get(documents::handlers::handle_list_documents),
        )
        .route(
            "/api/v1/documents/:id",
            axum::routing::delete(documents::handlers::handle_delete_document),
        )
        .route(
            "/api/v1/documents/:id/download",
            get(documents::handlers::handle_download),
        )
        .route(
            "/api/v1/documents/:id/process",
            post(documents::handlers::handle_process_document),
        )
        .route("/api/v1/resumes", get(documents::handlers::handle_list_resumes))
        // Proxy functions
        .route(
            "/api/v1/functions/enhance-content",
            post(functions::handlers::handle_enhance_content),
        )
        .route(
            "/api/v1/functions/text-to-speech",
            post(functions::handlers::handle_text_to_speech),
        )
        .route(
            "/api/v1/functions/realtime-interview",
            get(realtime::handlers::handle_realtime_interview),
        )
        // Interviews
        .route(
            "/api/v1/interviews",
            post(interview::handlers::handle_create_session),
        )
        .route(
            "/api/v1/interviews/contexts",
            get(interview::handlers::handle_list_contexts),
        )
        .route(
            "/api/v1/interviews/:id",
            get(interview::handlers::handle_get_session),
        )
        .route(
            "/api/v1/interviews/:id/answers",
            post(interview::handlers::handle_submit_answer),
        )
        .route(
            "/api/v1/interviews/:id/question-audio",
            get(interview::handlers::handle_question_audio),
        )
        .route(
            "/api/v1/interviews/:id/extract",
            post(interview::handlers::handle_extract),
        )
        // Graph
        .route("/api/v1/graph", get(graph::handlers::handle_get_graph))
        .route("/api/v1/graph/sync", post(graph::handlers::handle_sync))
        .route(
            "/api/v1/graph/nodes",
            post(graph::handlers::handle_create_node).get(graph::handlers::handle_list_nodes),
        )
        .route(
            "/api/v1/graph/nodes/:id",
            get(graph::handlers::handle_get_node)
                .patch(graph::handlers::handle_update_node)
                .delete(graph::handlers::handle_delete_node),
        )
        .route(
            "/api/v1/graph/nodes/:id/neighbors",
            get(graph::handlers::handle_neighbors),
        )
        .route(
            "/api/v1/graph/relationships",
            post(graph::handlers::handle_create_relationship),
        )
        .route(
            "/api/v1/graph/relationships/:id",
            axum::routing::delete(graph::handlers::handle_delete_relationship),
        )
        .with_state(state)
}
