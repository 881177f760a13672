//! 外部输入（目标列表 / Cookie 文件 / 配置）解析测试

use tempfile::tempdir;
use tiktok_streak_bot::models::load_cookies;
use tiktok_streak_bot::{AppError, AuthError, Config, Target, TargetList};

// ========== 目标列表 ==========

#[test]
fn target_parse_trims_and_strips_leading_at() {
    let target = Target::parse("  @alice \n").expect("应当解析成功");
    assert_eq!(target.name(), "alice");
    assert_eq!(target.profile_url(), "https://www.tiktok.com/@alice");
}

#[test]
fn target_parse_rejects_blank_comment_and_bare_at() {
    assert!(Target::parse("").is_none());
    assert!(Target::parse("   ").is_none());
    assert!(Target::parse("# 注释").is_none());
    assert!(Target::parse("@").is_none());
}

#[test]
fn target_list_preserves_order_and_collapses_duplicates() {
    let list = TargetList::from_lines("alice\nbob\n@alice\ncarol\nbob\n");
    let names: Vec<&str> = list.iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["alice", "bob", "carol"]);
}

#[tokio::test]
async fn target_list_load_fails_on_missing_file() {
    let result = TargetList::load("/nonexistent/list.txt").await;
    assert!(matches!(result, Err(AppError::File(_))));
}

// ========== Cookie 文件 ==========

#[tokio::test]
async fn missing_cookie_file_is_auth_error() {
    let result = load_cookies("/nonexistent/cookies.json").await;
    assert!(matches!(
        result,
        Err(AppError::Auth(AuthError::CookieFileMissing { .. }))
    ));
}

#[tokio::test]
async fn malformed_cookie_file_is_auth_error() {
    let dir = tempdir().expect("创建临时目录失败");
    let path = dir.path().join("cookies.json");
    std::fs::write(&path, "这不是 JSON").expect("写入失败");

    let result = load_cookies(path.to_str().expect("路径应为 UTF-8")).await;

    assert!(matches!(
        result,
        Err(AppError::Auth(AuthError::CookieFileInvalid { .. }))
    ));
}

#[tokio::test]
async fn empty_cookie_array_is_auth_error() {
    let dir = tempdir().expect("创建临时目录失败");
    let path = dir.path().join("cookies.json");
    std::fs::write(&path, "[]").expect("写入失败");

    let result = load_cookies(path.to_str().expect("路径应为 UTF-8")).await;

    assert!(matches!(
        result,
        Err(AppError::Auth(AuthError::NoUsableCookies { .. }))
    ));
}

#[tokio::test]
async fn cookies_with_empty_name_or_value_are_filtered_out() {
    let dir = tempdir().expect("创建临时目录失败");
    let path = dir.path().join("cookies.json");
    std::fs::write(
        &path,
        r#"[
            {"name": "sessionid", "value": "abc123", "domain": ".tiktok.com"},
            {"name": "", "value": "ignored"},
            {"name": "ignored", "value": ""}
        ]"#,
    )
    .expect("写入失败");

    let cookies = load_cookies(path.to_str().expect("路径应为 UTF-8"))
        .await
        .expect("应当加载成功");

    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].name, "sessionid");
    assert_eq!(cookies[0].domain.as_deref(), Some(".tiktok.com"));
}

#[tokio::test]
async fn cookie_optional_fields_are_parsed() {
    let dir = tempdir().expect("创建临时目录失败");
    let path = dir.path().join("cookies.json");
    std::fs::write(
        &path,
        r#"[{
            "name": "sessionid",
            "value": "abc123",
            "domain": ".tiktok.com",
            "path": "/",
            "expirationDate": 1893456000.5,
            "secure": true,
            "httpOnly": true
        }]"#,
    )
    .expect("写入失败");

    let cookies = load_cookies(path.to_str().expect("路径应为 UTF-8"))
        .await
        .expect("应当加载成功");

    assert_eq!(cookies[0].path.as_deref(), Some("/"));
    assert_eq!(cookies[0].expiration_date, Some(1893456000.5));
    assert_eq!(cookies[0].secure, Some(true));
    assert_eq!(cookies[0].http_only, Some(true));
}

// ========== 配置 ==========

#[test]
fn valid_send_time_parses() {
    let mut config = Config::default();
    config.send_time = "07:30".to_string();
    let time = config.send_time_of_day().expect("应当解析成功");
    assert_eq!(time, chrono::NaiveTime::from_hms_opt(7, 30, 0).expect("合法时间"));
}

#[test]
fn invalid_send_time_is_config_error() {
    let mut config = Config::default();
    config.send_time = "25:99".to_string();
    assert!(matches!(
        config.send_time_of_day(),
        Err(AppError::Config(_))
    ));
}
