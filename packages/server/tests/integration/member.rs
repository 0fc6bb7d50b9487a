use serde_json::json;

use crate::common::{TestApp, routes};

mod membership {
    use super::*;

    #[tokio::test]
    async fn members_are_visible_to_every_member() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let res = app.get_with_token(&routes::members(fx.course_id), &fx.student).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn adding_an_existing_member_is_a_conflict() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let res = app
            .post_with_token(
                &routes::members(fx.course_id),
                &json!({"user_id": fx.student_id, "kind": "TA"}),
                &fx.professor,
            )
            .await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn head_ta_cannot_grant_professor() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;
        let head = app.create_authenticated_user("head", "password123").await;
        let head_id = app.user_id(&head).await;
        app.add_member(fx.course_id, head_id, "HEAD_TA", &fx.professor).await;

        let res = app
            .patch_with_token(
                &routes::member(fx.course_id, fx.ta_id),
                &json!({"kind": "PROFESSOR"}),
                &head,
            )
            .await;
        assert_eq!(res.status, 403);

        let promote = app
            .patch_with_token(
                &routes::member(fx.course_id, fx.ta_id),
                &json!({"kind": "HEAD_TA"}),
                &head,
            )
            .await;
        assert_eq!(promote.status, 200, "{}", promote.text);
        assert_eq!(promote.body["kind"], "HEAD_TA");
    }

    #[tokio::test]
    async fn last_professor_cannot_leave_or_be_demoted() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;
        let prof_id = app.user_id(&fx.professor).await;

        let leave = app
            .delete_with_token(&routes::member(fx.course_id, prof_id), &fx.professor)
            .await;
        assert_eq!(leave.status, 409);

        let demote = app
            .patch_with_token(
                &routes::member(fx.course_id, prof_id),
                &json!({"kind": "TA"}),
                &fx.professor,
            )
            .await;
        assert_eq!(demote.status, 409);
    }

    #[tokio::test]
    async fn student_can_leave_but_not_remove_others() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let kick = app
            .delete_with_token(&routes::member(fx.course_id, fx.ta_id), &fx.student)
            .await;
        assert_eq!(kick.status, 403);

        let leave = app
            .delete_with_token(&routes::member(fx.course_id, fx.student_id), &fx.student)
            .await;
        assert_eq!(leave.status, 204);

        let after = app.get_with_token(&routes::course(fx.course_id), &fx.student).await;
        assert_eq!(after.status, 404);
    }

    #[tokio::test]
    async fn deactivated_member_loses_access() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let res = app
            .patch_with_token(
                &routes::member(fx.course_id, fx.ta_id),
                &json!({"is_deactivated": true}),
                &fx.professor,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let course = app.get_with_token(&routes::course(fx.course_id), &fx.ta).await;
        assert_eq!(course.status, 404);
    }
}

mod invites {
    use super::*;

    #[tokio::test]
    async fn inviting_a_registered_email_adds_the_member() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;
        app.register_and_login(json!({
            "username": "carol",
            "password": "password123",
            "email": "carol@example.edu",
        }))
        .await;

        let res = app
            .post_with_token(
                &routes::invites(fx.course_id),
                &json!({"email": "Carol@Example.edu", "kind": "TA"}),
                &fx.professor,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["outcome"], "added");
        assert_eq!(res.body["username"], "carol");
        assert_eq!(res.body["kind"], "TA");
    }

    #[tokio::test]
    async fn pending_invites_can_be_listed_and_revoked() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let invite = app
            .post_with_token(
                &routes::invites(fx.course_id),
                &json!({"email": "later@example.edu", "kind": "STUDENT"}),
                &fx.professor,
            )
            .await;
        assert_eq!(invite.status, 201, "{}", invite.text);
        let invite_id = invite.id();

        let dup = app
            .post_with_token(
                &routes::invites(fx.course_id),
                &json!({"email": "LATER@example.edu", "kind": "TA"}),
                &fx.professor,
            )
            .await;
        assert_eq!(dup.status, 409);

        let listed = app.get_with_token(&routes::invites(fx.course_id), &fx.professor).await;
        assert_eq!(listed.body[0]["email"], "later@example.edu");

        let revoke = app
            .delete_with_token(&routes::invite(fx.course_id, invite_id), &fx.professor)
            .await;
        assert_eq!(revoke.status, 204);

        let again = app
            .delete_with_token(&routes::invite(fx.course_id, invite_id), &fx.professor)
            .await;
        assert_eq!(again.status, 404);
    }

    #[tokio::test]
    async fn ta_cannot_invite() {
        let app = TestApp::spawn().await;
        let fx = app.course_fixture().await;

        let res = app
            .post_with_token(
                &routes::invites(fx.course_id),
                &json!({"email": "x@example.edu", "kind": "STUDENT"}),
                &fx.ta,
            )
            .await;

        assert_eq!(res.status, 403);
    }
}
