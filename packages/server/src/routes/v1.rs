use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/semesters", semester_routes())
        .nest("/courses", course_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me, handlers::auth::update_me))
}

fn semester_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        handlers::semester::list_semesters,
        handlers::semester::create_semester
    ))
}

fn course_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::course::list_courses,
            handlers::course::create_course
        ))
        .routes(routes!(handlers::course::list_joinable_courses))
        .routes(routes!(
            handlers::course::get_course,
            handlers::course::update_course
        ))
        .routes(routes!(handlers::course::join_course))
        .nest("/{id}/members", member_routes())
        .nest("/{id}/invites", invite_routes())
        .nest("/{id}/queues", queue_routes())
        .nest("/{id}/vector-dbs", vector_db_routes())
        .nest("/{id}/feedback-questions", feedback_routes())
}

fn member_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::member::list_members,
            handlers::member::add_member
        ))
        .routes(routes!(
            handlers::member::update_member,
            handlers::member::remove_member
        ))
}

fn invite_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::member::list_invites,
            handlers::member::create_invite
        ))
        .routes(routes!(handlers::member::delete_invite))
}

fn queue_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::queue::list_queues,
            handlers::queue::create_queue
        ))
        .routes(routes!(
            handlers::queue::get_queue,
            handlers::queue::update_queue
        ))
        .routes(routes!(handlers::queue::clear_queue))
        .nest("/{queue_id}/questions", question_routes())
        .nest("/{queue_id}/statistics", statistics_routes())
}

fn question_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::question::list_questions,
            handlers::question::create_question
        ))
        .routes(routes!(handlers::question::last_questions))
        .routes(routes!(handlers::question::get_question))
        .routes(routes!(handlers::question::withdraw_question))
        .routes(routes!(handlers::question::reject_question))
        .routes(routes!(handlers::question::start_question))
        .routes(routes!(handlers::question::undo_start_question))
        .routes(routes!(handlers::question::finish_question))
        .routes(routes!(handlers::question::question_position))
}

fn statistics_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::statistics::list_statistics))
        .routes(routes!(handlers::statistics::refresh_statistics))
}

fn vector_db_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::vector_db::list_vector_dbs,
            handlers::vector_db::create_vector_db
        ))
        .routes(routes!(handlers::vector_db::delete_vector_db))
        .nest("/{vdb_id}/documents", document_routes())
}

fn document_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::vector_db::list_documents,
            handlers::vector_db::create_document
        ))
        .routes(routes!(handlers::vector_db::delete_document))
}

fn feedback_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::feedback::list_feedback_questions,
            handlers::feedback::create_feedback_question
        ))
        .routes(routes!(handlers::feedback::submit_feedback_answers))
}
