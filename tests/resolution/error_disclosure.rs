//! Error reporting tests.
//!
//! `Error::into_response` must keep caller-facing errors descriptive while
//! hiding the payload of server-side ones (SQL fragments, file paths).

use folio::{AccessLevel, Error};

fn body_of(err: Error) -> (u16, String) {
    let resp = err.into_response();
    let status = resp.status().as_u16();
    let bytes = tokio_test::block_on(http_body_util::BodyExt::collect(resp.into_body()))
        .unwrap()
        .to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

/// Internal errors never echo their message to the caller.
#[test]
fn internal_error_hides_sql() {
    let (status, body) = body_of(Error::Internal(
        "Failed to query SELECT * FROM folder_grants WHERE tenant_id = 'acme'".into(),
    ));
    assert_eq!(status, 500);
    assert!(!body.contains("SELECT"), "SQL fragment leaked to client: {body}");
    assert!(body.contains("Internal server error"));
}

/// `Error::Io` messages often contain filesystem paths.
#[test]
fn io_error_hides_paths() {
    let io_err = std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "No such file: /etc/folio/acl.toml",
    );
    let (status, body) = body_of(Error::Io(io_err));
    assert_eq!(status, 500);
    assert!(!body.contains("/etc/folio"), "Filesystem path leaked to client: {body}");
}

/// Not-found and forbidden are client errors and keep their message.
#[test]
fn client_errors_keep_their_message() {
    let (status, body) = body_of(Error::DocumentNotFound("D".into()));
    assert_eq!(status, 404);
    assert!(body.contains("Document not found: D"));

    let (status, body) = body_of(Error::Forbidden {
        resource: "folder F2".into(),
        required: AccessLevel::Admin,
    });
    assert_eq!(status, 403);
    assert!(body.contains("requires ADMIN access"));
}

#[test]
fn responses_are_json() {
    let resp = Error::InvalidArgument("user_id must not be empty".into()).into_response();
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/json"
    );
}
