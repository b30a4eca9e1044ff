use chrono::Utc;
use pretty_assertions::assert_eq;
use rstest::rstest;
use uuid::Uuid;

use campus_core::approval::{
    ApprovalFlags, ApprovalGate, ApprovalState, Publishable, PublishableKind,
};
use campus_core::models::publishable::{ApprovalResponse, GlobalEvent, Notice};

fn draft_notice() -> Notice {
    Notice {
        id: Uuid::new_v4(),
        title: "Exam schedule".to_string(),
        body: "Final exams start next week.".to_string(),
        department_id: None,
        approval: ApprovalFlags::default(),
        created_at: Utc::now(),
    }
}

#[rstest]
#[case(false, false, ApprovalState::Draft, false)]
#[case(true, false, ApprovalState::DepartmentApproved, false)]
#[case(false, true, ApprovalState::CampusApproved, false)]
#[case(true, true, ApprovalState::Published, true)]
fn test_visibility_requires_both_flags(
    #[case] department: bool,
    #[case] campus: bool,
    #[case] state: ApprovalState,
    #[case] visible: bool,
) {
    let flags = ApprovalFlags::new(department, campus);

    assert_eq!(flags.state(), state);
    assert_eq!(flags.is_visible(), visible);
}

#[test]
fn test_notice_becomes_visible_only_after_second_approval() {
    let mut notice = draft_notice();
    assert!(!notice.is_publicly_visible());

    notice.set_approval(ApprovalGate::Department, true);
    assert_eq!(notice.approval_state(), ApprovalState::DepartmentApproved);
    assert!(!notice.is_publicly_visible());

    notice.set_approval(ApprovalGate::Campus, true);
    assert_eq!(notice.approval_state(), ApprovalState::Published);
    assert!(notice.is_publicly_visible());

    notice.set_approval(ApprovalGate::Department, false);
    assert!(!notice.is_publicly_visible());
    assert!(notice.approval.is_approved_by_campus);

    notice.set_approval(ApprovalGate::Department, true);
    assert!(notice.is_publicly_visible());

    notice.set_approval(ApprovalGate::Campus, false);
    assert_eq!(notice.approval_state(), ApprovalState::DepartmentApproved);
    assert!(!notice.is_publicly_visible());
}

#[test]
fn test_flags_are_independent() {
    let flags = ApprovalFlags::default().with(ApprovalGate::Campus, true);

    assert!(flags.get(ApprovalGate::Campus));
    assert!(!flags.get(ApprovalGate::Department));

    let flags = flags.with(ApprovalGate::Campus, true);
    assert_eq!(flags, ApprovalFlags::new(false, true));
}

#[test]
fn test_global_event_shares_the_gate() {
    let mut event = GlobalEvent {
        id: Uuid::new_v4(),
        title: "Convocation".to_string(),
        description: String::new(),
        event_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        approval: ApprovalFlags::new(true, false),
        created_at: Utc::now(),
    };

    event.approval_mut().set(ApprovalGate::Campus, true);
    assert!(event.is_publicly_visible());
}

#[test]
fn test_approval_flags_default_to_false_when_absent() {
    let json = r#"{
        "id": "6f1d8c1e-4f62-4d2a-9e3a-2d7b9b1b4a10",
        "title": "Library hours",
        "body": "Extended during exams",
        "department_id": null,
        "created_at": "2025-03-10T08:45:00Z"
    }"#;

    let notice: Notice = serde_json::from_str(json).unwrap();
    assert_eq!(notice.approval, ApprovalFlags::default());
}

#[test]
fn test_approval_response_reports_state() {
    let response = ApprovalResponse::new(
        Uuid::nil(),
        PublishableKind::DepartmentEvent,
        ApprovalFlags::new(true, true),
    );
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["kind"], "department_event");
    assert_eq!(value["state"], "published");
    assert_eq!(value["is_visible"], true);
    assert_eq!(value["is_approved_by_department"], true);
}

#[test]
fn test_kind_slugs_round_trip() {
    for kind in PublishableKind::ALL {
        assert_eq!(PublishableKind::from_slug(kind.slug()), Some(kind));
    }
    assert_eq!(PublishableKind::from_slug("journals"), None);
    assert_eq!("campus".parse::<ApprovalGate>().unwrap(), ApprovalGate::Campus);
    assert!("dean".parse::<ApprovalGate>().is_err());
}
