use serde_json::{Value, json};

use crate::{
    Condition, Effect, PolicyDocument, PolicyStatement, PolicyStatementProps, Principal,
    StatementSink,
};

mod assume_role;

fn document_json(doc: &PolicyDocument) -> Value {
    serde_json::to_value(doc.to_document_json()).unwrap()
}

fn assume_role_document(principal: &Principal) -> PolicyDocument {
    let mut doc = PolicyDocument::new();
    principal.add_to_assume_role_policy(&mut doc).unwrap();
    doc
}
