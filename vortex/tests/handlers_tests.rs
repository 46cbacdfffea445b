use vortex::handlers::*;

#[test]
fn test_resolve_data_dir_expands_tilde() {
    let dir = resolve_data_dir("~/.config/vortex/");
    assert!(!dir.to_string_lossy().contains('~'));
    assert!(dir.to_string_lossy().ends_with(".config/vortex/"));
}

#[test]
fn test_resolve_data_dir_leaves_absolute_paths_alone() {
    let dir = resolve_data_dir("/var/lib/vortex");
    assert_eq!(dir.to_string_lossy(), "/var/lib/vortex");
}

#[test]
fn test_strip_tags_plain_text() {
    assert_eq!(strip_tags("just text"), "just text");
}

#[test]
fn test_strip_tags_drops_markup_keeps_content() {
    assert_eq!(
        strip_tags("<p>第一段</p><p>第二段 <a href=\"/t/1\">链接</a></p>"),
        "第一段第二段 链接"
    );
}

#[test]
fn test_strip_tags_trims_whitespace() {
    assert_eq!(strip_tags("  <div>\ncontent\n</div>  "), "content");
}

#[test]
fn test_describe_error_joins_action_messages() {
    let error = vortex_client::ClientError::Action {
        messages: vec!["内容不能为空".to_string(), "验证码错误".to_string()],
    };
    let described = describe_error(&error);
    assert!(described.contains("内容不能为空"));
    assert!(described.contains("验证码错误"));
}

#[test]
fn test_describe_error_points_restricted_at_login() {
    let error = vortex_client::ClientError::Restricted {
        notice: "你要查看的页面需要先登录".to_string(),
    };
    assert!(describe_error(&error).contains("vortex login"));
}
