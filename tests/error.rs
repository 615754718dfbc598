//! Tests for error module

use xplore::XploreError;

#[test]
fn test_error_display() {
    let err = XploreError::InsufficientPoints {
        point_count: 1,
        minimum_required: 30,
    };
    assert!(err.to_string().contains("1 points"));
    assert!(err.to_string().contains("30"));
}

#[test]
fn test_budget_error_display() {
    let err = XploreError::BudgetExceeded {
        required: 12,
        budget: 10,
    };
    assert_eq!(err.to_string(), "12 API requests required, budget is 10");
}

#[test]
fn test_area_too_large_display() {
    let err = XploreError::AreaTooLarge {
        axis: "longitude",
        max_steps: 999,
    };
    assert!(err.to_string().contains("too large"));
    assert!(err.to_string().contains("longitude"));
}

#[test]
fn test_io_error_converts() {
    fn read_missing() -> xplore::Result<String> {
        Ok(std::fs::read_to_string("/definitely/not/here.json")?)
    }
    assert!(matches!(read_missing(), Err(XploreError::Io(_))));
}
