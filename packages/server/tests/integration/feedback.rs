use serde_json::json;

use crate::common::{CourseFixture, TestApp, routes};

async fn create_prompt(app: &TestApp, fx: &CourseFixture, body: serde_json::Value) -> i32 {
    let res = app
        .post_with_token(&routes::feedback_questions(fx.course_id), &body, &fx.professor)
        .await;
    assert_eq!(res.status, 201, "create feedback question failed: {}", res.text);
    res.id()
}

async fn answered_question(app: &TestApp, fx: &CourseFixture) -> i32 {
    let q = app.ask(fx.course_id, fx.queue_id, &fx.student, "Help").await;
    app.act(fx.course_id, fx.queue_id, q, "start", &fx.ta).await;
    let finish = app.act(fx.course_id, fx.queue_id, q, "finish", &fx.ta).await;
    assert_eq!(finish.status, 200, "{}", finish.text);
    q
}

mod prompts {
    use super::*;

    #[tokio::test]
    async fn radio_button_prompt_needs_two_choices() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let res = app
            .post_with_token(
                &routes::feedback_questions(fx.course_id),
                &json!({
                    "question_text": "Was this helpful?",
                    "kind": "RADIO_BUTTON",
                    "answer_choices": ["Yes"],
                }),
                &fx.professor,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn feedback_prompts_are_listed_to_members() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;
        create_prompt(
            &app,
            &fx,
            json!({"question_text": "Comments?", "kind": "SHORT_ANSWER"}),
        )
        .await;

        let res = app
            .get_with_token(&routes::feedback_questions(fx.course_id), &fx.student)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body[0]["kind"], "SHORT_ANSWER");
        assert_eq!(res.body[0]["active"], true);
    }
}

mod answers {
    use super::*;

    #[tokio::test]
    async fn asker_can_leave_feedback_once() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;
        let rating = create_prompt(
            &app,
            &fx,
            json!({
                "question_text": "How helpful was this session?",
                "kind": "SLIDER",
                "slider_min": 1,
                "slider_max": 5,
                "required": true,
            }),
        )
        .await;
        let q = answered_question(&app, &fx).await;

        let body = json!({
            "question_id": q,
            "answers": [{"feedback_question_id": rating, "answer_text": "4"}],
        });
        let res = app
            .post_with_token(&routes::feedback_answers(fx.course_id), &body, &fx.student)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body[0]["answer_text"], "4");

        let again = app
            .post_with_token(&routes::feedback_answers(fx.course_id), &body, &fx.student)
            .await;
        assert_eq!(again.status, 409);
    }

    #[tokio::test]
    async fn slider_answer_must_be_in_range() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;
        let rating = create_prompt(
            &app,
            &fx,
            json!({
                "question_text": "Rate it",
                "kind": "SLIDER",
                "slider_min": 1,
                "slider_max": 5,
            }),
        )
        .await;
        let q = answered_question(&app, &fx).await;

        let res = app
            .post_with_token(
                &routes::feedback_answers(fx.course_id),
                &json!({
                    "question_id": q,
                    "answers": [{"feedback_question_id": rating, "answer_text": "9"}],
                }),
                &fx.student,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn required_prompts_must_be_answered() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;
        create_prompt(
            &app,
            &fx,
            json!({
                "question_text": "Anything else?",
                "kind": "SHORT_ANSWER",
                "required": true,
            }),
        )
        .await;
        let optional = create_prompt(
            &app,
            &fx,
            json!({
                "question_text": "Pick one",
                "kind": "RADIO_BUTTON",
                "answer_choices": ["Yes", "No"],
            }),
        )
        .await;
        let q = answered_question(&app, &fx).await;

        let res = app
            .post_with_token(
                &routes::feedback_answers(fx.course_id),
                &json!({
                    "question_id": q,
                    "answers": [{"feedback_question_id": optional, "answer_text": "Yes"}],
                }),
                &fx.student,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn only_the_asker_of_an_answered_question_can_give_feedback() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;
        let prompt = create_prompt(
            &app,
            &fx,
            json!({"question_text": "Comments?", "kind": "SHORT_ANSWER"}),
        )
        .await;

        let open = app.ask(fx.course_id, fx.queue_id, &fx.student, "Help").await;
        let body = json!({
            "question_id": open,
            "answers": [{"feedback_question_id": prompt, "answer_text": "Great"}],
        });

        let not_answered = app
            .post_with_token(&routes::feedback_answers(fx.course_id), &body, &fx.student)
            .await;
        assert_eq!(not_answered.status, 400);

        app.act(fx.course_id, fx.queue_id, open, "start", &fx.ta).await;
        app.act(fx.course_id, fx.queue_id, open, "finish", &fx.ta).await;

        let stranger = app
            .post_with_token(&routes::feedback_answers(fx.course_id), &body, &fx.ta)
            .await;
        assert_eq!(stranger.status, 403);
    }
}
