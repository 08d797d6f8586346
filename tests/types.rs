// ABOUTME: Integration tests for validated stack names and remote statuses.
// ABOUTME: Tests parsing, validation, and serde behavior.

use cfnbot::types::*;

mod stack_name_tests {
    use super::*;

    #[test]
    fn valid_name() {
        let name = StackName::new("SomeAppBucketRole").unwrap();
        assert_eq!(name.to_string(), "SomeAppBucketRole");
    }

    #[test]
    fn empty_returns_error() {
        assert_eq!(StackName::new(""), Err(StackNameError::Empty));
    }

    #[test]
    fn starts_with_hyphen_returns_error() {
        assert_eq!(
            StackName::new("-bucket"),
            Err(StackNameError::StartsWithNonLetter)
        );
    }

    #[test]
    fn dots_are_invalid() {
        assert_eq!(
            StackName::new("app.bucket"),
            Err(StackNameError::InvalidChar('.'))
        );
    }

    #[test]
    fn namespacing_can_overflow_the_limit() {
        let name = StackName::new(&"b".repeat(MAX_STACK_NAME_LEN - 2)).unwrap();
        assert_eq!(name.namespaced("Dev"), Err(StackNameError::TooLong));
    }

    #[test]
    fn deserializes_with_validation() {
        let name: StackName = serde_yaml::from_str("Bucket").unwrap();
        assert_eq!(name.as_str(), "Bucket");
        assert!(serde_yaml::from_str::<StackName>("bad_name").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let name = StackName::new("Bucket").unwrap();
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"Bucket\"");
    }
}

mod stack_status_tests {
    use super::*;

    #[test]
    fn serializes_as_provider_string() {
        let json = serde_json::to_string(&StackStatus::UpdateRollbackComplete).unwrap();
        assert_eq!(json, "\"UPDATE_ROLLBACK_COMPLETE\"");
    }

    #[test]
    fn review_is_in_progress() {
        assert!(StackStatus::parse("REVIEW_IN_PROGRESS").is_in_progress());
    }
}
