use pretty_assertions::assert_eq;
use rstest::rstest;

use campus_core::models::emis::{
    CreateEmisDownloadRequest, EmisCategory, backward_pairs, forward_pairs, remap_backward,
    remap_forward,
};

#[rstest]
#[case("report_form", "reports")]
#[case("resource", "downloads")]
#[case("forms", "forms")]
fn test_forward_remap(#[case] stored: &str, #[case] expected: &str) {
    assert_eq!(remap_forward(stored), expected);
}

#[test]
fn test_forward_then_backward_is_lossy_only_for_forms() {
    let dataset = ["report_form", "resource", "forms"];

    let forward: Vec<&str> = dataset.iter().map(|value| remap_forward(value)).collect();
    assert_eq!(forward, vec!["reports", "downloads", "forms"]);
    assert!(forward.iter().all(|value| value.parse::<EmisCategory>().is_ok()));

    let backward: Vec<&str> = forward.iter().map(|value| remap_backward(value)).collect();
    assert_eq!(backward, vec!["report_form", "resource", "forms"]);
}

#[test]
fn test_remap_pairs() {
    assert_eq!(
        forward_pairs(),
        vec![("report_form", "reports"), ("resource", "downloads")]
    );
    assert_eq!(
        backward_pairs(),
        vec![("reports", "report_form"), ("downloads", "resource")]
    );
    assert_eq!(EmisCategory::Forms.legacy(), None);
}

#[test]
fn test_category_defaults_to_downloads() {
    let request: CreateEmisDownloadRequest = serde_json::from_str(
        r#"{"title": "Annual report", "file_url": "/media/emis/annual.pdf"}"#,
    )
    .unwrap();

    assert_eq!(request.category, EmisCategory::Downloads);
    assert_eq!(EmisCategory::default(), EmisCategory::Downloads);
}

#[test]
fn test_category_serializes_as_snake_case() {
    serde_test::assert_tokens(
        &EmisCategory::Reports,
        &[serde_test::Token::UnitVariant {
            name: "EmisCategory",
            variant: "reports",
        }],
    );
    assert!("report_form".parse::<EmisCategory>().is_err());
}
