use super::*;
use crate::types::{CompositePrincipal, PrincipalType};
use serde_json::json;
use yare::parameterized;


fn statement_json(statement: &PolicyStatement) -> Value {
    serde_json::to_value(statement.to_statement_json()).unwrap()
}

fn with_actions(actions: &[&str]) -> PolicyStatement {
    PolicyStatement::from_props(PolicyStatementProps::new().actions(actions.iter().copied()))
        .unwrap()
}

#[test]
fn test_new_statement_is_an_empty_allow() {
    let statement = PolicyStatement::new();
    assert_eq!(statement.effect(), Effect::Allow);
    assert!(statement.sid().is_none());
    assert!(!statement.has_principal());
    assert!(!statement.has_resource());
    assert!(!statement.is_frozen());
    assert_eq!(statement_json(&statement), json!({ "Effect": "Allow" }));
}

#[test]
fn test_send_message_except_forbidden_queue() {
    let statement = PolicyStatement::from_props(
        PolicyStatementProps::new()
            .actions(["sqs:SendMessage"])
            .not_resources(["arn:aws:sqs:us-east-1:123456789012:forbidden_queue"]),
    )
    .unwrap();

    assert_eq!(
        statement_json(&statement),
        json!({
            "Effect": "Allow",
            "Action": "sqs:SendMessage",
            "NotResource": "arn:aws:sqs:us-east-1:123456789012:forbidden_queue"
        })
    );
}

#[test]
fn test_fields_serialize_in_fixed_order() {
    let statement = PolicyStatement::from_props(
        PolicyStatementProps::new()
            .sid("ReadBucket")
            .effect(Effect::Deny)
            .resources(["arn:aws:s3:::bucket/*"])
            .actions(["s3:GetObject", "s3:ListBucket"])
            .principals([Principal::account("123456789012")])
            .conditions([Condition::new("Bool", "aws:SecureTransport", ["false"])]),
    )
    .unwrap();

    let rendered = serde_json::to_string(&statement.to_statement_json()).unwrap();
    assert_eq!(
        rendered,
        r#"{"Action":["s3:GetObject","s3:ListBucket"],"Condition":{"Bool":{"aws:SecureTransport":"false"}},"Effect":"Deny","Principal":{"AWS":"arn:aws:iam::123456789012:root"},"Resource":"arn:aws:s3:::bucket/*","Sid":"ReadBucket"}"#
    );
}

#[parameterized(
    single = { &["x"], json!("x") },
    repeated = { &["asdf", "asdf", "asdf"], json!("asdf") },
    two = { &["x", "y"], json!(["x", "y"]) },
    keeps_order = { &["y", "x", "y"], json!(["y", "x"]) },
)]
fn test_resource_rendering(resources: &[&str], expected: Value) {
    let mut statement = with_actions(&["s3:GetObject"]);
    for resource in resources {
        statement.add_resources([*resource]).unwrap();
    }
    assert_eq!(statement_json(&statement)["Resource"], expected);
}

#[test]
fn test_resource_conflicts() {
    let mut statement = PolicyStatement::new();
    statement.add_resources(["arn:aws:s3:::a"]).unwrap();
    let err = statement.add_not_resources(["arn:aws:s3:::b"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot add 'NotResources' to policy statement if 'Resources' have been added"
    );

    let mut statement = PolicyStatement::new();
    statement.add_not_resources(["arn:aws:s3:::b"]).unwrap();
    assert_eq!(
        statement.add_all_resources().unwrap_err(),
        PolicyError::conflict("Resources", "NotResources")
    );
    assert!(!statement.has_resource());
}

#[test]
fn test_empty_additions_never_conflict() {
    let mut statement = with_actions(&["s3:GetObject"]);
    statement.add_resources(["*"]).unwrap();
    statement.add_principals([Principal::Any]).unwrap();
    statement.add_not_actions(Vec::<String>::new()).unwrap();
    statement.add_not_resources(Vec::<String>::new()).unwrap();
    statement.add_not_principals([]).unwrap();
    assert_eq!(statement.actions(), vec!["s3:GetObject"]);
}

#[test]
fn test_conditions_replace_values_per_pair() {
    let mut statement = with_actions(&["s3:GetObject"]);
    statement
        .add_condition(Condition::new("StringEquals", "aws:PrincipalTag/team", ["1"]))
        .unwrap();
    statement
        .add_condition(Condition::new("StringEquals", "aws:PrincipalTag/team", ["2"]))
        .unwrap();
    assert_eq!(
        statement.conditions(),
        vec![Condition::new("StringEquals", "aws:PrincipalTag/team", ["2"])]
    );
}

#[test]
fn test_condition_helpers() {
    let mut statement = with_actions(&["sns:Publish"]);
    statement.add_source_account_condition(["111111111111"]).unwrap();
    statement
        .add_source_arn_condition(["arn:aws:s3:::bucket"])
        .unwrap();
    statement.add_account_condition(["222222222222", "333333333333"]).unwrap();

    assert_eq!(
        statement_json(&statement)["Condition"],
        json!({
            "StringEquals": {
                "aws:SourceAccount": "111111111111",
                "sts:ExternalId": ["222222222222", "333333333333"]
            },
            "ArnEquals": { "aws:SourceArn": "arn:aws:s3:::bucket" }
        })
    );
}

#[test]
fn test_condition_objects() {
    let mut statement = with_actions(&["s3:GetObject"]);
    statement
        .add_condition_object("StringLike", &json!({ "s3:prefix": ["home/", "docs/"] }))
        .unwrap();
    let objects = json!({
        "IpAddress": { "aws:SourceIp": "203.0.113.0/24" },
        "Bool": { "aws:SecureTransport": "true" }
    });
    statement
        .add_condition_objects(objects.as_object().unwrap())
        .unwrap();
    assert_eq!(statement.conditions().len(), 3);
    assert_eq!(
        statement.conditions()[0],
        Condition::new("StringLike", "s3:prefix", ["home/", "docs/"])
    );
}

#[test]
fn test_bad_condition_object_leaves_statement_untouched() {
    let mut statement = with_actions(&["s3:GetObject"]);
    let objects = json!({
        "Bool": { "aws:SecureTransport": "true" },
        "NumericLessThan": { "s3:max-keys": 10 }
    });
    let err = statement
        .add_condition_objects(objects.as_object().unwrap())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Fields must be either a string or an array of strings. Got 10 for key s3:max-keys"
    );
    assert!(statement.conditions().is_empty());

    let err = statement
        .add_condition_object("Bool", &json!("true"))
        .unwrap_err();
    assert_eq!(
        err,
        PolicyError::InvalidCondition(
            "A Condition should be represented as a map of operator to value".to_string()
        )
    );
}

#[test]
fn test_block_form_uses_typed_principals() {
    let statement = PolicyStatement::from_props(
        PolicyStatementProps::new()
            .actions(["sts:AssumeRole"])
            .principals([
                Principal::service("lambda.amazonaws.com"),
                Principal::arn("arn:aws:iam::123456789012:role/a"),
                Principal::service("edgelambda.amazonaws.com"),
            ])
            .conditions([Condition::new("StringEquals", "sts:ExternalId", ["x"])]),
    )
    .unwrap();

    let block = statement.to_json();
    assert_eq!(
        block.principals,
        vec![
            PrincipalProps::new(
                PrincipalType::Service,
                ["lambda.amazonaws.com", "edgelambda.amazonaws.com"]
            ),
            PrincipalProps::new(PrincipalType::Aws, ["arn:aws:iam::123456789012:role/a"]),
        ]
    );
    assert_eq!(
        serde_json::to_value(&block).unwrap(),
        json!({
            "actions": ["sts:AssumeRole"],
            "principals": [
                { "type": "Service", "identifiers": ["lambda.amazonaws.com", "edgelambda.amazonaws.com"] },
                { "type": "AWS", "identifiers": ["arn:aws:iam::123456789012:role/a"] }
            ],
            "condition": [
                { "test": "StringEquals", "variable": "sts:ExternalId", "values": ["x"] }
            ],
            "effect": "Allow"
        })
    );
}

#[test]
fn test_estimate_size() {
    let options = EstimateSizeOptions::default();
    // the condition block is counted as `{}` even when empty
    let empty = PolicyStatement::new();
    assert_eq!(
        empty.estimate_size(options),
        r#""Effect": "Allow","#.len() + "{}".len()
    );

    let plain = with_actions(&["s3:GetObject"]);
    let deferred = with_actions(&["${var.action}"]);
    assert_eq!(plain.estimate_size(options), 18 + 2 + 6 + 5 + 12 + 3);
    assert_eq!(
        deferred.estimate_size(options),
        18 + 2 + 6 + 5 + DEFAULT_ACTION_SIZE_ESTIMATE + 3
    );

    let mut conditioned = plain.clone();
    conditioned
        .add_condition(Condition::new("Bool", "aws:SecureTransport", ["true"]))
        .unwrap();
    assert_eq!(
        conditioned.estimate_size(options) - plain.estimate_size(options),
        r#"{"Bool":{"aws:SecureTransport":"true"}}"#.len() - "{}".len()
    );

    let mut with_principal = plain.clone();
    with_principal
        .add_aws_account_principal("123456789012")
        .unwrap();
    assert_eq!(
        with_principal.estimate_size(options) - plain.estimate_size(options),
        DEFAULT_ARN_SIZE_ESTIMATE
    );

    let small = EstimateSizeOptions {
        arn_estimate: 10,
        action_estimate: 1,
    };
    assert!(with_principal.estimate_size(small) < with_principal.estimate_size(options));
}

#[test]
fn test_composite_of_service_and_arn() {
    let composite = Principal::Composite(
        CompositePrincipal::new([Principal::service("a"), Principal::arn("arn:b")]).unwrap(),
    );
    let mut statement = with_actions(&["sts:AssumeRole"]);
    statement.add_principals([composite]).unwrap();
    assert_eq!(
        statement_json(&statement)["Principal"],
        json!({ "Service": "a", "AWS": "arn:b" })
    );

    statement.add_principals([Principal::service("c")]).unwrap();
    assert_eq!(
        statement_json(&statement)["Principal"],
        json!({ "Service": ["a", "c"], "AWS": "arn:b" })
    );
}
