use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use server::entity::queue_statistic;

use crate::common::{TestApp, routes};

async fn stored_rows(app: &TestApp, queue_id: i32) -> u64 {
    queue_statistic::Entity::find()
        .filter(queue_statistic::Column::QueueId.eq(queue_id))
        .count(&app.db)
        .await
        .unwrap()
}

mod refresh {
    use super::*;

    #[tokio::test]
    async fn refresh_is_idempotent() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;
        let q = app.ask(fx.course_id, fx.queue_id, &fx.student, "Help").await;
        app.act(fx.course_id, fx.queue_id, q, "start", &fx.ta).await;
        app.act(fx.course_id, fx.queue_id, q, "finish", &fx.ta).await;

        let path = routes::statistics_refresh(fx.course_id, fx.queue_id);
        let first = app.post_with_token(&path, &json!({}), &fx.professor).await;
        assert_eq!(first.status, 200, "{}", first.text);
        // Four weekly metrics plus two 7x24 heatmaps.
        assert_eq!(first.body["written"], 340);
        let rows_after_first = stored_rows(&app, fx.queue_id).await;

        let second = app.post_with_token(&path, &json!({}), &fx.professor).await;
        assert_eq!(second.status, 200, "{}", second.text);

        assert_eq!(rows_after_first, 340);
        assert_eq!(stored_rows(&app, fx.queue_id).await, rows_after_first);
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_one_row_per_bucket() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;
        let path = routes::statistics_refresh(fx.course_id, fx.queue_id);

        let empty = json!({});
        let questions_path = routes::questions(fx.course_id, fx.queue_id);
        let question = json!({"text": "Help", "tags": ["recursion"]});
        let (a, b, asked) = tokio::join!(
            app.post_with_token(&path, &empty, &fx.professor),
            app.post_with_token(&path, &empty, &fx.professor),
            app.post_with_token(&questions_path, &question, &fx.student),
        );

        assert_eq!(a.status, 200, "{}", a.text);
        assert_eq!(b.status, 200, "{}", b.text);
        assert_eq!(asked.status, 201, "{}", asked.text);
        assert_eq!(stored_rows(&app, fx.queue_id).await, 340);
    }

    #[tokio::test]
    async fn rerun_overwrites_the_weekly_value() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;
        let path = routes::statistics_refresh(fx.course_id, fx.queue_id);
        let answered_path = format!(
            "{}?metric=NUM_ANSWERED",
            routes::statistics(fx.course_id, fx.queue_id)
        );

        app.post_with_token(&path, &json!({}), &fx.professor).await;
        let before = app.get_with_token(&answered_path, &fx.ta).await;
        assert_eq!(before.body[0]["value"], 0.0);

        let q = app.ask(fx.course_id, fx.queue_id, &fx.student, "Help").await;
        app.act(fx.course_id, fx.queue_id, q, "start", &fx.ta).await;
        app.act(fx.course_id, fx.queue_id, q, "finish", &fx.ta).await;
        app.post_with_token(&path, &json!({}), &fx.professor).await;

        let after = app.get_with_token(&answered_path, &fx.ta).await;
        let rows = after.body.as_array().expect("statistics should be an array");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["value"], 1.0);
    }
}

mod metrics {
    use super::*;

    #[tokio::test]
    async fn weekly_counts_reflect_answered_questions() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;
        let q = app.ask(fx.course_id, fx.queue_id, &fx.student, "Help").await;
        app.act(fx.course_id, fx.queue_id, q, "start", &fx.ta).await;
        app.act(fx.course_id, fx.queue_id, q, "finish", &fx.ta).await;

        app.post_with_token(
            &routes::statistics_refresh(fx.course_id, fx.queue_id),
            &json!({}),
            &fx.professor,
        )
        .await;

        let res = app
            .get_with_token(
                &format!(
                    "{}?metric=NUM_ANSWERED",
                    routes::statistics(fx.course_id, fx.queue_id)
                ),
                &fx.ta,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let rows = res.body.as_array().expect("statistics should be an array");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["value"], 1.0);
        assert!(rows[0]["date"].is_string());
        assert!(rows[0]["hour"].is_null());
    }

    #[tokio::test]
    async fn heatmap_has_a_cell_for_every_hour_of_the_week() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        app.post_with_token(
            &routes::statistics_refresh(fx.course_id, fx.queue_id),
            &json!({}),
            &fx.professor,
        )
        .await;

        let res = app
            .get_with_token(
                &format!(
                    "{}?metric=HEATMAP_WAIT",
                    routes::statistics(fx.course_id, fx.queue_id)
                ),
                &fx.professor,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body.as_array().map(Vec::len), Some(168));
    }
}

mod access {
    use super::*;

    #[tokio::test]
    async fn statistics_are_staff_only() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let list = app
            .get_with_token(&routes::statistics(fx.course_id, fx.queue_id), &fx.student)
            .await;
        assert_eq!(list.status, 403);

        let refresh = app
            .post_with_token(
                &routes::statistics_refresh(fx.course_id, fx.queue_id),
                &json!({}),
                &fx.ta,
            )
            .await;
        assert_eq!(refresh.status, 403);
    }

    #[tokio::test]
    async fn inverted_date_range_is_rejected() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let res = app
            .get_with_token(
                &format!(
                    "{}?start=2025-03-09&end=2025-03-02",
                    routes::statistics(fx.course_id, fx.queue_id)
                ),
                &fx.ta,
            )
            .await;

        assert_eq!(res.status, 400);
    }
}
