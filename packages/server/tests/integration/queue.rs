use serde_json::json;

use crate::common::{TestApp, routes};

mod listing {
    use super::*;

    #[tokio::test]
    async fn queue_lists_live_counts() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;
        app.ask(fx.course_id, fx.queue_id, &fx.student, "Stack overflow in my recursion")
            .await;

        let res = app.get_with_token(&routes::queues(fx.course_id), &fx.student).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body[0]["name"], "Main Queue");
        assert_eq!(res.body[0]["questions_asked"], 1);
        assert_eq!(res.body[0]["questions_active"], 0);
        assert_eq!(res.body[0]["start_end_times"][0]["start"], "14:00");
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn queue_tags_must_come_from_the_course() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let res = app
            .post_with_token(
                &routes::queues(fx.course_id),
                &json!({"name": "Other", "tags": ["astrology"]}),
                &fx.professor,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn malformed_time_window_is_rejected() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let res = app
            .post_with_token(
                &routes::queues(fx.course_id),
                &json!({
                    "name": "Evening",
                    "start_end_times": [{"weekday": 8, "start": "18:00", "end": "20:00"}],
                }),
                &fx.professor,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn only_leadership_can_create_queues() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let res = app
            .post_with_token(&routes::queues(fx.course_id), &json!({"name": "Mine"}), &fx.ta)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn archiving_a_queue_closes_it() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let res = app
            .patch_with_token(
                &routes::queue(fx.course_id, fx.queue_id),
                &json!({"archived": true}),
                &fx.professor,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["archived"], true);
        assert_eq!(res.body["active"], false);

        let ask = app
            .post_with_token(
                &routes::questions(fx.course_id, fx.queue_id),
                &json!({"text": "Anyone there?"}),
                &fx.student,
            )
            .await;
        assert_eq!(ask.status, 400);
    }

    #[tokio::test]
    async fn clearing_rejects_only_waiting_questions() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let other = app.create_authenticated_user("other", "password123").await;
        app.post_with_token(&routes::course_join(fx.course_id), &json!({}), &other)
            .await;

        let waiting = app.ask(fx.course_id, fx.queue_id, &fx.student, "Waiting").await;
        let helped = app.ask(fx.course_id, fx.queue_id, &other, "Being helped").await;
        let start = app.act(fx.course_id, fx.queue_id, helped, "start", &fx.ta).await;
        assert_eq!(start.status, 200, "{}", start.text);

        let student_try = app
            .post_with_token(&routes::queue_clear(fx.course_id, fx.queue_id), &json!({}), &fx.student)
            .await;
        assert_eq!(student_try.status, 403);

        let res = app
            .post_with_token(&routes::queue_clear(fx.course_id, fx.queue_id), &json!({}), &fx.ta)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["rejected"], 1);

        let cleared = app
            .get_with_token(&routes::question(fx.course_id, fx.queue_id, waiting), &fx.student)
            .await;
        assert_eq!(cleared.body["status"], "REJECTED");
        assert_eq!(cleared.body["rejected_reason"], "OH_ENDED");
        assert_eq!(cleared.body["rejected_by_id"], fx.ta_id);

        let active = app
            .get_with_token(&routes::question(fx.course_id, fx.queue_id, helped), &fx.ta)
            .await;
        assert_eq!(active.body["status"], "ACTIVE");
    }
}
