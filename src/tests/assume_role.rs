use super::*;
use crate::{ASSUME_ROLE_WITH_WEB_IDENTITY, PolicyError, TAG_SESSION};

fn cognito() -> Principal {
    Principal::web_identity(
        "cognito-identity.amazonaws.com",
        [Condition::new(
            "StringEquals",
            "cognito-identity.amazonaws.com:aud",
            ["us-east-2:12345678-abcd-abcd-abcd-123456"],
        )],
    )
}

#[test]
fn test_plain_principal_adds_one_statement() {
    let doc = assume_role_document(&Principal::service("lambda.amazonaws.com"));
    assert_eq!(
        document_json(&doc),
        json!({
            "Statement": [{
                "Action": "sts:AssumeRole",
                "Effect": "Allow",
                "Principal": { "Service": "lambda.amazonaws.com" }
            }],
            "Version": "2012-10-17"
        })
    );
    assert!(doc.validate_for_resource_policy().is_empty());
}

#[test]
fn test_session_tags_add_tag_session() {
    let doc = assume_role_document(&cognito().with_session_tags());
    assert_eq!(doc.statement_count(), 1);
    assert_eq!(
        doc.statements()[0].actions(),
        vec![ASSUME_ROLE_WITH_WEB_IDENTITY, TAG_SESSION]
    );
    insta::assert_json_snapshot!(doc.to_document_json(), @r#"
    {
      "Statement": [
        {
          "Action": [
            "sts:AssumeRoleWithWebIdentity",
            "sts:TagSession"
          ],
          "Condition": {
            "StringEquals": {
              "cognito-identity.amazonaws.com:aud": "us-east-2:12345678-abcd-abcd-abcd-123456"
            }
          },
          "Effect": "Allow",
          "Principal": {
            "Federated": "cognito-identity.amazonaws.com"
          }
        }
      ],
      "Version": "2012-10-17"
    }
    "#);
}

#[test]
fn test_wrapper_order_does_not_matter() {
    let amr = Condition::new(
        "ForAnyValue:StringLike",
        "cognito-identity.amazonaws.com:amr",
        ["authenticated"],
    );
    let conditions_first = cognito().with_conditions([amr.clone()]).with_session_tags();
    let tags_first = cognito().with_session_tags().with_conditions([amr.clone()]);

    let first = assume_role_document(&conditions_first);
    let second = assume_role_document(&tags_first);
    assert_eq!(document_json(&first), document_json(&second));
    assert_eq!(
        document_json(&first)["Statement"][0]["Condition"],
        json!({
            "StringEquals": {
                "cognito-identity.amazonaws.com:aud": "us-east-2:12345678-abcd-abcd-abcd-123456"
            },
            "ForAnyValue:StringLike": { "cognito-identity.amazonaws.com:amr": "authenticated" }
        })
    );
}

#[test]
fn test_composite_adds_a_statement_per_member() {
    let composite = Principal::composite([
        Principal::service("ec2.amazonaws.com"),
        cognito(),
        Principal::account("123456789012"),
    ])
    .unwrap();
    assert_eq!(composite.assume_role_action(), "sts:AssumeRole");

    let doc = assume_role_document(&composite);
    let actions: Vec<Vec<String>> = doc.statements().iter().map(|s| s.actions()).collect();
    assert_eq!(
        actions,
        vec![
            vec!["sts:AssumeRole"],
            vec!["sts:AssumeRoleWithWebIdentity"],
            vec!["sts:AssumeRole"],
        ]
    );
    assert_eq!(
        document_json(&doc)["Statement"][2]["Principal"],
        json!({ "AWS": "arn:aws:iam::123456789012:root" })
    );
}

#[test]
fn test_conditions_reach_every_composite_member() {
    let composite = Principal::composite([
        Principal::account("111111111111"),
        Principal::account("222222222222"),
    ])
    .unwrap()
    .with_conditions([Condition::new("StringEquals", "sts:ExternalId", ["secret"])]);

    let doc = assume_role_document(&composite);
    assert_eq!(doc.statement_count(), 2);
    for statement in doc.statements() {
        assert_eq!(
            statement.conditions(),
            vec![Condition::new("StringEquals", "sts:ExternalId", ["secret"])]
        );
    }
}

#[test]
fn test_organization_member_accounts() {
    let principal = crate::AccountPrincipal::new("123456789012").in_organization("o-1234567");
    let doc = assume_role_document(&principal);
    assert_eq!(
        document_json(&doc)["Statement"][0],
        json!({
            "Action": "sts:AssumeRole",
            "Condition": { "StringEquals": { "aws:PrincipalOrgID": "o-1234567" } },
            "Effect": "Allow",
            "Principal": { "AWS": "arn:aws:iam::123456789012:root" }
        })
    );
    assert_eq!(principal.principal_account(), Some("123456789012"));
}

struct RejectingSink;

impl StatementSink for RejectingSink {
    fn add_statements(&mut self, _statements: Vec<PolicyStatement>) -> Result<(), PolicyError> {
        Err(PolicyError::IncorrectStatement("read-only".to_string()))
    }

    fn statement_count(&self) -> usize {
        0
    }
}

#[test]
fn test_sink_errors_propagate() {
    let err = cognito()
        .with_session_tags()
        .add_to_assume_role_policy(&mut RejectingSink)
        .unwrap_err();
    assert_eq!(err.to_string(), "Incorrect Policy Statement: read-only");
    assert!(RejectingSink.is_empty());
}
