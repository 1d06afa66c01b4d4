mod support;

use std::sync::Arc;

use assert_matches::assert_matches;

use cid_metadata::dispatch::Dispatcher;
use cid_metadata::domain::Credentials;
use cid_metadata::error::CidError;
use cid_metadata::formats::FormatTable;
use cid_metadata::session::{CidServiceBuilder, Session};
use cid_metadata::transport::Verb;
use cid_metadata::workspace::Workspace;

use support::{HOST, ScriptedTransport};

fn credentials() -> Credentials {
    Credentials::new(HOST, "alice", "s3cret")
}

fn builder(transport: ScriptedTransport) -> CidServiceBuilder<ScriptedTransport> {
    CidServiceBuilder::new(
        transport,
        Workspace::new_with_root("/data/ws"),
        Arc::new(FormatTable::with_builtins()),
    )
}

#[test]
fn token_is_taken_verbatim() {
    for token in ["abc", "Token 42", "", "ünïcødé=="] {
        let transport = ScriptedTransport::logged_in(token);
        let dispatcher = Dispatcher::new(HOST, transport);
        let session = Session::open(&dispatcher, &credentials()).unwrap();
        assert_eq!(session.token(), token);
    }
}

#[test]
fn login_is_an_anonymous_form_post() {
    let transport = ScriptedTransport::logged_in("tok");
    let dispatcher = Dispatcher::new(HOST, transport.clone());
    Session::open(&dispatcher, &credentials()).unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let login = &requests[0];
    assert_eq!(login.verb, Verb::Post);
    assert_eq!(login.url, format!("{HOST}/authenticate.php"));
    assert_eq!(login.header("Authorization"), None);
    assert_eq!(login.param("username"), Some("alice"));
    assert_eq!(login.param("password"), Some("s3cret"));
}

#[test]
fn missing_token_field_fails_to_connect() {
    let transport = ScriptedTransport::new();
    transport.respond("authenticate.php", 200, r#"{"status": "denied"}"#);
    let dispatcher = Dispatcher::new(HOST, transport);

    let err = Session::open(&dispatcher, &credentials()).err().unwrap();
    assert_matches!(err, CidError::Connect(_));
    assert!(err.to_string().starts_with("unable to connect to the CID database"));
}

#[test]
fn non_string_token_fails_to_connect() {
    let transport = ScriptedTransport::new();
    transport.respond("authenticate.php", 200, r#"{"httpHeaderValue": null}"#);
    let dispatcher = Dispatcher::new(HOST, transport);

    let err = Session::open(&dispatcher, &credentials()).err().unwrap();
    assert_matches!(err, CidError::Connect(_));
}

#[test]
fn rejected_login_fails_to_connect() {
    for status in [401u16, 403, 500] {
        let transport = ScriptedTransport::new();
        transport.respond(
            "authenticate.php",
            status,
            r#"{"httpHeaderValue": "ignored"}"#,
        );
        let dispatcher = Dispatcher::new(HOST, transport);

        let err = Session::open(&dispatcher, &credentials()).err().unwrap();
        assert_matches!(err, CidError::Connect(message) if message.contains(&status.to_string()));
    }
}

#[test]
fn no_content_login_fails_to_connect() {
    let transport = ScriptedTransport::new();
    transport.respond("authenticate.php", 204, "");
    let dispatcher = Dispatcher::new(HOST, transport);

    let err = Session::open(&dispatcher, &credentials()).err().unwrap();
    assert_matches!(err, CidError::Connect(_));
}

#[test]
fn builder_reuses_service_for_same_credentials() {
    let transport = ScriptedTransport::logged_in("tok");
    let builder = builder(transport.clone());

    let first = builder.build(HOST, "alice", "s3cret").unwrap();
    let second = builder.build(HOST, "alice", "s3cret").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(transport.count("authenticate.php"), 1);
    assert_eq!(builder.session_count(), 1);
}

#[test]
fn builder_treats_trailing_slash_as_same_host() {
    let transport = ScriptedTransport::logged_in("tok");
    let builder = builder(transport.clone());

    let first = builder.build(HOST, "alice", "s3cret").unwrap();
    let second = builder.build(&format!("{HOST}/"), "alice", "s3cret").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(transport.count("authenticate.php"), 1);
    assert_eq!(builder.session_count(), 1);
}

#[test]
fn builder_keeps_sessions_per_credentials() {
    let transport = ScriptedTransport::logged_in("tok");
    let builder = builder(transport.clone());

    let alice = builder.build(HOST, "alice", "s3cret").unwrap();
    let bob = builder.build(HOST, "bob", "hunter2").unwrap();
    let other_host = builder.build("https://cid.other.org", "alice", "s3cret").unwrap();

    assert!(!Arc::ptr_eq(&alice, &bob));
    assert!(!Arc::ptr_eq(&alice, &other_host));
    assert_eq!(transport.count("authenticate.php"), 3);
    assert_eq!(builder.session_count(), 3);
}

#[test]
fn builder_does_not_cache_failed_logins() {
    let transport = ScriptedTransport::new();
    transport.respond("authenticate.php", 401, "");
    let builder = builder(transport.clone());

    assert!(builder.build(HOST, "alice", "s3cret").is_err());
    assert_eq!(builder.session_count(), 0);

    transport.respond("authenticate.php", 200, r#"{"httpHeaderValue": "tok"}"#);
    let service = builder.build(HOST, "alice", "s3cret").unwrap();
    assert_eq!(service.session().token(), "tok");
    assert_eq!(transport.count("authenticate.php"), 2);
}
