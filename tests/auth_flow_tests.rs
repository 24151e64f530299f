mod common;

use axum::http::{StatusCode, header};
use clinicdesk::domain::{AccessAction, Role, UserId};

use common::{
    ADMIN_EMAIL, ADMIN_PASSWORD, body_bytes, body_json, get, location, login, login_cookie,
    post_form, session_cookie, spawn_app,
};

#[tokio::test]
async fn test_login_redirects_to_role_landing_page() {
    let (app, _) = spawn_app().await;

    let response = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let cookie = session_cookie(&response).expect("session cookie");
    assert!(cookie.starts_with("id="));

    let response = get(&app, "/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["page"], "dashboard");
    assert_eq!(json["data"]["user"]["email"], ADMIN_EMAIL);
    assert_eq!(json["data"]["notices"][0]["level"], "success");
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let (app, _) = spawn_app().await;

    let response = login(&app, "  ADMIN@Clinic.Test ", ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_failed_logins_are_indistinguishable() {
    let (app, state) = spawn_app().await;

    let wrong_password = login(&app, ADMIN_EMAIL, "not-the-password").await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert!(wrong_password.headers().get(header::SET_COOKIE).is_none());

    let unknown_email = login(&app, "nobody@clinic.test", "whatever").await;
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert!(unknown_email.headers().get(header::SET_COOKIE).is_none());

    assert_eq!(
        body_bytes(wrong_password).await,
        body_bytes(unknown_email).await
    );

    let entries = state.store.recent_access_logs(10).await.unwrap();
    let failures: Vec<_> = entries
        .iter()
        .filter(|e| e.action == AccessAction::Login && !e.success)
        .collect();
    assert_eq!(failures.len(), 2);

    let reasons: Vec<_> = failures
        .iter()
        .map(|e| e.detail.as_ref().unwrap()["reason"].as_str().unwrap())
        .collect();
    assert!(reasons.contains(&"wrong_password"));
    assert!(reasons.contains(&"user_not_found"));
    assert!(failures.iter().any(|e| e.user_id.is_none()));
}

#[tokio::test]
async fn test_login_with_missing_fields() {
    let (app, _) = spawn_app().await;

    let response = login(&app, "", "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let (app, state) = spawn_app().await;
    let cookie = login_cookie(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let admin = state
        .store
        .get_user_by_email(ADMIN_EMAIL)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(state.store.count_sessions_for_user(admin.id).await.unwrap(), 1);

    let response = post_form(&app, "/auth/logout", Some(&cookie), &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
    assert_eq!(state.store.count_sessions_for_user(admin.id).await.unwrap(), 0);

    let response = get(&app, "/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");

    assert_eq!(
        state.store.count_access_logs(AccessAction::Logout).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_logout_of_deactivated_account_is_not_audited() {
    let (app, state) = spawn_app().await;
    let cookie = login_cookie(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let admin = state
        .store
        .get_user_by_email(ADMIN_EMAIL)
        .await
        .unwrap()
        .unwrap();
    assert!(state.store.set_user_active(admin.id, false).await.unwrap());

    let response = get(&app, "/auth/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");

    assert_eq!(state.store.count_sessions_for_user(admin.id).await.unwrap(), 0);
    assert_eq!(
        state.store.count_access_logs(AccessAction::Logout).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_logout_without_session_still_redirects() {
    let (app, _) = spawn_app().await;

    let response = get(&app, "/auth/logout", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_login_page_redirects_when_signed_in() {
    let (app, _) = spawn_app().await;

    let response = get(&app, "/auth/login", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = login_cookie(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let response = get(&app, "/auth/login", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_protected_page_requires_login() {
    let (app, _) = spawn_app().await;

    let response = get(&app, "/admin/users", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");

    // The notice queued by the gate shows up on the login form.
    let cookie = session_cookie(&response).expect("notice cookie");
    let json = body_json(get(&app, "/auth/login", Some(&cookie)).await).await;
    assert_eq!(
        json["data"]["notices"][0]["message"],
        "You need to log in to access this page."
    );
}

#[tokio::test]
async fn test_role_without_permission_is_sent_to_dashboard() {
    let (app, state) = spawn_app().await;
    let admin_cookie = login_cookie(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = post_form(
        &app,
        "/admin/users",
        Some(&admin_cookie),
        &[
            ("name", "Front Desk"),
            ("email", "desk@clinic.test"),
            ("password", "desk-pass"),
            ("role", Role::FrontDesk.code()),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = login(&app, "desk@clinic.test", "desk-pass").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/scheduling/appointments");
    let desk_cookie = session_cookie(&response).unwrap();

    let response = get(&app, "/scheduling/appointments", Some(&desk_cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/physician/dashboard", Some(&desk_cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = get(&app, "/admin/users", Some(&desk_cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    assert_eq!(
        state
            .store
            .count_access_logs(AccessAction::AccessDenied)
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn test_change_password() {
    let (app, state) = spawn_app().await;
    let cookie = login_cookie(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = post_form(
        &app,
        "/auth/change-password",
        Some(&cookie),
        &[
            ("current_password", ADMIN_PASSWORD),
            ("new_password", "brand-new-pass"),
            ("confirm_password", "brand-new-pass"),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/profile");

    let response = get(&app, "/auth/profile", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let messages: Vec<_> = json["data"]["notices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["message"].as_str().unwrap())
        .collect();
    assert!(messages.contains(&"Password changed successfully!"));

    let response = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(&app, ADMIN_EMAIL, "brand-new-pass").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(
        state
            .store
            .count_access_logs(AccessAction::PasswordChanged)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_change_password_rejections() {
    let (app, _) = spawn_app().await;
    let cookie = login_cookie(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let mismatch = post_form(
        &app,
        "/auth/change-password",
        Some(&cookie),
        &[
            ("current_password", ADMIN_PASSWORD),
            ("new_password", "brand-new-pass"),
            ("confirm_password", "something-else"),
        ],
    )
    .await;
    assert_eq!(mismatch.status(), StatusCode::BAD_REQUEST);

    let wrong_current = post_form(
        &app,
        "/auth/change-password",
        Some(&cookie),
        &[
            ("current_password", "not-it"),
            ("new_password", "brand-new-pass"),
            ("confirm_password", "brand-new-pass"),
        ],
    )
    .await;
    assert_eq!(wrong_current.status(), StatusCode::BAD_REQUEST);

    let too_short = post_form(
        &app,
        "/auth/change-password",
        Some(&cookie),
        &[
            ("current_password", ADMIN_PASSWORD),
            ("new_password", "abc"),
            ("confirm_password", "abc"),
        ],
    )
    .await;
    assert_eq!(too_short.status(), StatusCode::BAD_REQUEST);

    // Still the original password.
    let response = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_deactivated_user_loses_access() {
    let (app, state) = spawn_app().await;
    let admin_cookie = login_cookie(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = post_form(
        &app,
        "/admin/users",
        Some(&admin_cookie),
        &[
            ("name", "Dr. House"),
            ("email", "house@clinic.test"),
            ("password", "vicodin"),
            ("role", "physician"),
            ("staff_profile_id", "7"),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["staff_profile_id"], 7);
    let id = json["data"]["id"].as_i64().unwrap();

    let doctor_cookie = login_cookie(&app, "house@clinic.test", "vicodin").await;
    let response = get(&app, "/physician/dashboard", Some(&doctor_cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_form(
        &app,
        &format!("/admin/users/{id}/deactivate"),
        Some(&admin_cookie),
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/physician/dashboard", Some(&doctor_cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");

    let response = login(&app, "house@clinic.test", "vicodin").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let user = state
        .store
        .get_user(UserId::new(i32::try_from(id).unwrap()))
        .await
        .unwrap()
        .unwrap();
    assert!(!user.active);
}

#[tokio::test]
async fn test_health_endpoints_are_public() {
    let (app, _) = spawn_app().await;

    let response = get(&app, "/health/live", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-frame-options").unwrap(),
        "DENY"
    );

    let response = get(&app, "/health/ready", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["ready"], true);
}
