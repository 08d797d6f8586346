// ABOUTME: Property tests for output-reference parsing.
// ABOUTME: Well-formed references round-trip their parts; literals are never references.

use cfnbot::types::{OutputReference, REFERENCE_NAMESPACE, ReferenceError};
use proptest::prelude::*;

proptest! {
    #[test]
    fn well_formed_references_parse(
        stack in "[A-Za-z][A-Za-z0-9-]{0,40}",
        key in "[A-Za-z][A-Za-z0-9]{0,40}",
    ) {
        let value = format!("{REFERENCE_NAMESPACE}.{stack}.{key}");
        let reference = OutputReference::parse(&value).unwrap().unwrap();
        prop_assert_eq!(reference.stack(), stack.as_str());
        prop_assert_eq!(reference.output_key(), key.as_str());
        prop_assert_eq!(reference.to_string(), value);
    }

    #[test]
    fn values_without_the_marker_are_literals(value in "[a-zA-Z0-9./:_-]{0,60}") {
        prop_assume!(!value.starts_with(REFERENCE_NAMESPACE));
        prop_assert_eq!(OutputReference::parse(&value), Ok(None));
    }

    #[test]
    fn extra_parts_are_rejected(
        parts in proptest::collection::vec("[A-Za-z0-9]{1,10}", 3..6),
    ) {
        let value = format!("{REFERENCE_NAMESPACE}.{}", parts.join("."));
        let is_wrong_count = matches!(
            OutputReference::parse(&value),
            Err(ReferenceError::WrongPartCount { .. })
        );
        prop_assert!(is_wrong_count);
    }
}

#[test]
fn two_part_reference_is_malformed() {
    assert_eq!(
        OutputReference::parse("cfnbotOutputs.Bucket"),
        Err(ReferenceError::WrongPartCount {
            value: "cfnbotOutputs.Bucket".to_string(),
            found: 2,
        })
    );
}

#[test]
fn marker_followed_by_other_text_is_malformed() {
    assert!(matches!(
        OutputReference::parse("cfnbotOutputsX.A.B"),
        Err(ReferenceError::WrongNamespace { .. })
    ));
}

#[test]
fn empty_components_are_malformed() {
    assert!(matches!(
        OutputReference::parse("cfnbotOutputs..Bucket"),
        Err(ReferenceError::EmptyComponent { .. })
    ));
}
