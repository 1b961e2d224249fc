//! HTTP integration tests against the fully layered router

mod common;

use common::{PASSWORD, TestApp};
use http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "ok");
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/api/menus", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], 1001);
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(Method::GET, "/api/menus/user", Some("not-a-jwt"), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1004);
}

#[tokio::test]
async fn test_admin_routes_reject_employees() {
    let app = TestApp::new().await;
    let token = app.employee_token().await;

    for uri in ["/api/menus", "/api/roles", "/api/permissions", "/api/users"] {
        let (status, body) = app.send(Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["code"], 2003, "{uri}");
    }
}

#[tokio::test]
async fn test_login_flow() {
    let app = TestApp::new().await;
    app.user_with_role("it-login", "employee").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"username": "it-login", "password": "wrong-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"username": "it-login", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["roles"], json!(["employee"]));

    let token = body["data"]["token"].as_str().unwrap().to_string();
    let (status, body) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "it-login");
    assert_eq!(body["data"]["roles"][0]["role_name"], "employee");
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"username": "someone"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "password");
}

#[tokio::test]
async fn test_menu_crud_round() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/menus",
            Some(&token),
            Some(json!({"menu_name": "it-reports", "menu_label": "Reports", "menu_order": 3})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Menu created");
    assert_eq!(body["data"]["menu_name"], "it-reports");
    assert_eq!(body["data"]["is_active"], true);
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/menus",
            Some(&token),
            Some(json!({"menu_name": "it-reports", "menu_label": "Again"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4002);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/menus/{id}"),
            Some(&token),
            Some(json!({"menu_label": "Monthly Reports", "menu_icon": "chart"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["menu_label"], "Monthly Reports");
    assert_eq!(body["data"]["menu_icon"], "chart");

    let (status, body) = app
        .send(Method::GET, &format!("/api/menus/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["menu_name"], "it-reports");

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/menus/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(Method::GET, &format!("/api/menus/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);
}

#[tokio::test]
async fn test_malformed_json_uses_envelope() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .send_raw(Method::POST, "/api/menus", &token, r#"{"menu_name": "#)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], 5);
}

#[tokio::test]
async fn test_non_numeric_path_uses_envelope() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .send(Method::GET, "/api/menus/abc", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 5);
}

#[tokio::test]
async fn test_delete_parent_reports_child_count() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let (_, parent) = app
        .send(
            Method::POST,
            "/api/menus",
            Some(&token),
            Some(json!({"menu_name": "it-hr", "menu_label": "HR"})),
        )
        .await;
    let parent_id = parent["data"]["id"].as_i64().unwrap();

    for name in ["it-hr-leave", "it-hr-payroll"] {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/menus",
                Some(&token),
                Some(json!({"menu_name": name, "menu_label": name, "parent_id": parent_id})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/menus/{parent_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4003);
    assert_eq!(body["details"]["child_count"], 2);
}

#[tokio::test]
async fn test_user_menu_tree_follows_permissions() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let employee = app.employee_token().await;
    let view_employees = app.permission_id("View Employees").await;
    let view_payroll = app.permission_id("View Payroll").await;

    let (_, root) = app
        .send(
            Method::POST,
            "/api/menus",
            Some(&admin),
            Some(json!({
                "menu_name": "it-people",
                "menu_label": "People",
                "permission_ids": [view_employees]
            })),
        )
        .await;
    let root_id = root["data"]["id"].as_i64().unwrap();

    for (name, order, permission) in [
        ("it-directory", 2, view_employees),
        ("it-org-chart", 1, view_employees),
        ("it-payroll", 0, view_payroll),
    ] {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/menus",
                Some(&admin),
                Some(json!({
                    "menu_name": name,
                    "menu_label": name,
                    "parent_id": root_id,
                    "menu_order": order,
                    "permission_ids": [permission]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .send(Method::GET, "/api/menus/user", Some(&employee), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let tree = body["data"].as_array().unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0]["menu_name"], "it-people");
    let children: Vec<&str> = tree[0]["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["menu_name"].as_str().unwrap())
        .collect();
    assert_eq!(children, vec!["it-org-chart", "it-directory"]);

    let (_, body) = app.send(Method::GET, "/api/menus/user", Some(&admin), None).await;
    assert_eq!(body["data"][0]["children"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_role_menu_access_upsert() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let employee = app.employee_token().await;

    let (_, menu) = app
        .send(
            Method::POST,
            "/api/menus",
            Some(&admin),
            Some(json!({"menu_name": "it-notices", "menu_label": "Notices"})),
        )
        .await;
    let menu_id = menu["data"]["id"].as_i64().unwrap();
    let (_, roles) = app.send(Method::GET, "/api/roles", Some(&admin), None).await;
    let employee_role = roles["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["role_name"] == "employee")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let uri = format!("/api/menus/roles/{employee_role}/menus/{menu_id}/access");
    let (status, body) = app
        .send(Method::PUT, &uri, Some(&admin), Some(json!({"can_access": true})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["created"], true);

    let (_, body) = app.send(Method::GET, "/api/menus/user", Some(&employee), None).await;
    assert_eq!(body["data"][0]["menu_name"], "it-notices");

    let (_, body) = app
        .send(Method::PUT, &uri, Some(&admin), Some(json!({"can_access": false})))
        .await;
    assert_eq!(body["data"]["created"], false);

    let (_, body) = app.send(Method::GET, "/api/menus/user", Some(&employee), None).await;
    assert_eq!(body["data"], json!([]));

    let (status, body) = app.send(Method::PUT, &uri, Some(&admin), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "can_access");
}

#[tokio::test]
async fn test_user_admin_defaults_to_default_roles() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/users",
            Some(&admin),
            Some(json!({"username": "it-new-hire", "password": "long-enough-pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["display_name"], "it-new-hire");
    assert_eq!(body["data"]["roles"][0]["role_name"], "employee");
    let user_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/users/{user_id}/roles"),
            Some(&admin),
            Some(json!({"role_ids": [424242]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["missing_ids"], json!([424242]));

    let (status, body) = app
        .send(
            Method::POST,
            "/api/users",
            Some(&admin),
            Some(json!({"username": "it-new-hire", "password": "long-enough-pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 8002);

    let (status, _) = app
        .send(Method::GET, "/api/users/999999/roles", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_admin_round() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let approve_leave = app.permission_id("Approve Leave").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/roles",
            Some(&admin),
            Some(json!({"role_name": "it-manager", "permission_ids": [approve_leave]})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["permissions"][0]["name"], "Approve Leave");
    let role_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/roles/{role_id}/permissions"),
            Some(&admin),
            Some(json!({"permission_ids": []})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["permissions"], json!([]));

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/roles/{role_id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_deleting_referenced_rows_is_refused() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let (_, roles) = app.send(Method::GET, "/api/roles", Some(&admin), None).await;
    let admin_role = roles["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["role_name"] == "admin")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/roles/{admin_role}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 3003);

    let manage_menus = app.permission_id("Manage Menus").await;
    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/api/permissions/{manage_menus}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2103);

    let (status, _) = app
        .send(Method::GET, &format!("/api/roles/{admin_role}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}
