use serde_json::json;

use crate::common::{TestApp, routes};

mod semesters {
    use super::*;

    #[tokio::test]
    async fn only_semester_managers_can_create_semesters() {
        let app = TestApp::spawn().await;
        let user = app.create_authenticated_user("alice", "password123").await;

        let res = app
            .post_with_token(routes::SEMESTERS, &json!({"year": 2025, "term": "FALL"}), &user)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn duplicate_semester_is_a_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "password123", "admin").await;
        app.create_semester(&admin).await;

        let res = app
            .post_with_token(routes::SEMESTERS, &json!({"year": 2025, "term": "FALL"}), &admin)
            .await;

        assert_eq!(res.status, 409);
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn creator_becomes_professor_of_the_new_course() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "password123", "admin").await;
        let semester_id = app.create_semester(&admin).await;
        let prof = app.create_authenticated_user("prof", "password123").await;

        let course_id = app.create_course(&prof, semester_id, false).await;

        let res = app.get_with_token(&routes::course(course_id), &prof).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["kind"], "PROFESSOR");
        assert_eq!(res.body["tags"], json!(["recursion", "lists", "setup"]));

        let mine = app.get_with_token(routes::COURSES, &prof).await;
        assert_eq!(mine.body.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn course_with_unknown_semester_is_rejected() {
        let app = TestApp::spawn().await;
        let prof = app.create_authenticated_user("prof", "password123").await;

        let res = app
            .post_with_token(
                routes::COURSES,
                &json!({
                    "course_code": "120",
                    "department": "CIS",
                    "course_title": "Intro",
                    "semester_id": 9999,
                }),
                &prof,
            )
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
    }

    #[tokio::test]
    async fn non_member_gets_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "password123", "admin").await;
        let semester_id = app.create_semester(&admin).await;
        let prof = app.create_authenticated_user("prof", "password123").await;
        let course_id = app.create_course(&prof, semester_id, false).await;
        let outsider = app.create_authenticated_user("outsider", "password123").await;

        let res = app.get_with_token(&routes::course(course_id), &outsider).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn student_cannot_update_course() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let res = app
            .patch_with_token(
                &routes::course(fx.course_id),
                &json!({"course_title": "Hijacked"}),
                &fx.student,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn tag_used_by_a_queue_cannot_be_removed() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let res = app
            .patch_with_token(
                &routes::course(fx.course_id),
                &json!({"tags": ["lists"]}),
                &fx.professor,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let ok = app
            .patch_with_token(
                &routes::course(fx.course_id),
                &json!({"tags": ["recursion", "graphs"]}),
                &fx.professor,
            )
            .await;
        assert_eq!(ok.status, 200, "{}", ok.text);
        assert_eq!(ok.body["tags"], json!(["recursion", "graphs"]));
    }

    #[tokio::test]
    async fn tag_carried_by_a_question_cannot_be_removed() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let asked = app
            .post_with_token(
                &routes::questions(fx.course_id, fx.queue_id),
                &json!({"text": "Linked list cycle", "tags": ["lists"]}),
                &fx.student,
            )
            .await;
        assert_eq!(asked.status, 201, "{}", asked.text);

        let res = app
            .patch_with_token(
                &routes::course(fx.course_id),
                &json!({"tags": ["recursion", "setup"]}),
                &fx.professor,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        // Closed questions keep their tags too.
        let withdrawn = app
            .act(fx.course_id, fx.queue_id, asked.id(), "withdraw", &fx.student)
            .await;
        assert_eq!(withdrawn.status, 200, "{}", withdrawn.text);

        let still = app
            .patch_with_token(
                &routes::course(fx.course_id),
                &json!({"tags": ["recursion", "setup"]}),
                &fx.professor,
            )
            .await;
        assert_eq!(still.status, 400);

        let course = app
            .get_with_token(&routes::course(fx.course_id), &fx.professor)
            .await;
        assert_eq!(course.body["tags"], json!(["recursion", "lists", "setup"]));
    }
}

mod enrollment {
    use super::*;

    #[tokio::test]
    async fn public_course_is_joinable_until_joined() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "password123", "admin").await;
        let semester_id = app.create_semester(&admin).await;
        let prof = app.create_authenticated_user("prof", "password123").await;
        let course_id = app.create_course(&prof, semester_id, false).await;
        let student = app.create_authenticated_user("student", "password123").await;

        let before = app.get_with_token(routes::JOINABLE_COURSES, &student).await;
        assert_eq!(before.body.as_array().map(Vec::len), Some(1));

        let join = app
            .post_with_token(&routes::course_join(course_id), &json!({}), &student)
            .await;
        assert_eq!(join.status, 201, "{}", join.text);
        assert_eq!(join.body["kind"], "STUDENT");

        let after = app.get_with_token(routes::JOINABLE_COURSES, &student).await;
        assert_eq!(after.body, json!([]));

        let again = app
            .post_with_token(&routes::course_join(course_id), &json!({}), &student)
            .await;
        assert_eq!(again.status, 409);
    }

    #[tokio::test]
    async fn invite_only_course_cannot_be_joined() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", "password123", "admin").await;
        let semester_id = app.create_semester(&admin).await;
        let prof = app.create_authenticated_user("prof", "password123").await;
        let course_id = app.create_course(&prof, semester_id, true).await;
        let student = app.create_authenticated_user("student", "password123").await;

        let joinable = app.get_with_token(routes::JOINABLE_COURSES, &student).await;
        assert_eq!(joinable.body, json!([]));

        let res = app
            .post_with_token(&routes::course_join(course_id), &json!({}), &student)
            .await;
        assert_eq!(res.status, 404);
    }
}

mod vector_dbs {
    use super::*;

    #[tokio::test]
    async fn leadership_manages_vector_dbs_and_documents() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let vdb = app
            .post_with_token(
                &routes::vector_dbs(fx.course_id),
                &json!({"name": "lecture-notes", "top_k": 5}),
                &fx.professor,
            )
            .await;
        assert_eq!(vdb.status, 201, "{}", vdb.text);
        let vdb_id = vdb.id();

        let dup = app
            .post_with_token(
                &routes::vector_dbs(fx.course_id),
                &json!({"name": "lecture-notes"}),
                &fx.professor,
            )
            .await;
        assert_eq!(dup.status, 409);

        let doc = app
            .post_with_token(
                &routes::documents(fx.course_id, vdb_id),
                &json!({"name": "week-03.pdf"}),
                &fx.professor,
            )
            .await;
        assert_eq!(doc.status, 201, "{}", doc.text);

        let listed = app
            .get_with_token(&routes::documents(fx.course_id, vdb_id), &fx.ta)
            .await;
        assert_eq!(listed.status, 200);
        assert_eq!(listed.body[0]["name"], "week-03.pdf");

        let deleted = app
            .delete_with_token(&routes::vector_db(fx.course_id, vdb_id), &fx.professor)
            .await;
        assert_eq!(deleted.status, 204);

        let gone = app
            .get_with_token(&routes::vector_dbs(fx.course_id), &fx.professor)
            .await;
        assert_eq!(gone.body, json!([]));
    }

    #[tokio::test]
    async fn students_cannot_see_vector_dbs() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let res = app
            .get_with_token(&routes::vector_dbs(fx.course_id), &fx.student)
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn ta_cannot_create_vector_db() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let res = app
            .post_with_token(
                &routes::vector_dbs(fx.course_id),
                &json!({"name": "notes"}),
                &fx.ta,
            )
            .await;

        assert_eq!(res.status, 403);
    }
}
