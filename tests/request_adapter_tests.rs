//! Integration tests for the request adapter
//!
//! # Test Coverage
//!
//! - Raw HTTP messages parsed by the engine and converted to `ServerRequest`
//! - Method, path, protocol version, query parameters, headers, cookies, body
//! - Cookie header synthesis and the separate cookie parameter bag
//! - Uploaded file descriptors backed by real temporary files
//! - `multipart/form-data` bodies spooled by the engine into uploaded files

use brrtrouter_bridge::engine::{EngineRequest, FileDescriptor};
use brrtrouter_bridge::server::{EngineRequestFactory, ServerRequestFactory};
use brrtrouter_bridge::ServerRequest;

mod common;
use common::uploads::spool;

fn convert(raw: &str) -> ServerRequest {
    let native = EngineRequest::parse(raw.as_bytes()).unwrap();
    EngineRequestFactory::new("bridge-tests").create(&native)
}

#[test]
fn test_get_with_browser_headers() {
    let raw = "GET / HTTP/1.1\r\n\
        Host: localhost\r\n\
        Connection: keep-alive\r\n\
        Pragma: no-cache\r\n\
        Cache-Control: no-cache\r\n\
        Accept: text/html\r\n\
        Accept-Encoding: gzip, deflate, br\r\n\
        Cookie: phpsessid=fcccs2af8673a2f343a61a96551c8523d79ea; username=razonyang\r\n\
        \r\n";
    let req = convert(raw);

    assert_eq!(req.method().as_str(), "GET");
    assert_eq!(req.uri().path(), "/");
    assert_eq!(req.uri().host(), "localhost");
    assert_eq!(req.protocol_version(), "1.1");
    assert!(req.query_params().is_empty());

    assert_eq!(req.headers().len(), 7);
    assert_eq!(req.header_line("connection"), "keep-alive");
    assert_eq!(req.header_line("Accept-Encoding"), "gzip, deflate, br");
    assert_eq!(
        req.header("cookie"),
        vec!["phpsessid=fcccs2af8673a2f343a61a96551c8523d79ea; username=razonyang"]
    );

    let cookies: Vec<_> = req.cookie_params().iter().collect();
    assert_eq!(
        cookies,
        vec![
            ("phpsessid", "fcccs2af8673a2f343a61a96551c8523d79ea"),
            ("username", "razonyang"),
        ]
    );
}

#[test]
fn test_query_params_round_trip() {
    let req = convert("GET /search?foo=bar&fizz=buzz HTTP/1.1\r\nHost: localhost\r\n\r\n");
    assert_eq!(req.uri().path(), "/search");
    assert_eq!(req.uri().query(), "foo=bar&fizz=buzz");
    let params: Vec<_> = req.query_params().iter().collect();
    assert_eq!(params, vec![("foo", "bar"), ("fizz", "buzz")]);
}

#[test]
fn test_query_with_path() {
    let req = convert("GET /users?name=foo&age=18 HTTP/1.1\r\nHost: localhost\r\n\r\n");
    assert_eq!(req.uri().path(), "/users");
    assert_eq!(req.query_params().get("name"), Some("foo"));
    assert_eq!(req.query_params().get("age"), Some("18"));
}

#[test]
fn test_post_json_body() {
    let body = r#"{"name":"bar","age":18}"#;
    let raw = format!(
        "POST /users HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let mut req = convert(&raw);
    assert_eq!(req.method().as_str(), "POST");
    assert_eq!(req.header_line("content-type"), "application/json");
    assert_eq!(&req.body_mut().contents().unwrap()[..], body.as_bytes());
}

#[test]
fn test_protocol_version_from_request_line() {
    let req = convert("GET / HTTP/1.0\r\nHost: localhost\r\n\r\n");
    assert_eq!(req.protocol_version(), "1.0");
}

#[test]
fn test_server_params_carry_script_name_and_cgi_vars() {
    let req = convert("GET /a?b=c HTTP/1.1\r\nHost: example.com:9502\r\n\r\n");
    let server = req.server_params();
    assert_eq!(server.get("SCRIPT_NAME"), Some("bridge-tests"));
    assert_eq!(server.get("REQUEST_METHOD"), Some("GET"));
    assert_eq!(server.get("QUERY_STRING"), Some("b=c"));
    assert_eq!(req.uri().host(), "example.com");
    assert_eq!(req.uri().port(), Some(9502));
}

#[test]
fn test_https_indicator_and_server_port() {
    let mut native = EngineRequest::parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();
    native.server.insert("HTTPS", "on");
    native.server.insert("SERVER_NAME", "secure.local");
    native.server.insert("SERVER_PORT", "8443");
    let req = EngineRequestFactory::default().create(&native);
    assert_eq!(req.uri().scheme(), "https");
    assert_eq!(req.uri().host(), "secure.local");
    assert_eq!(req.uri().port(), Some(8443));
}

#[test]
fn test_cookie_bag_overrides_bag_cookie_header_only() {
    let native = EngineRequest {
        method: "GET".to_string(),
        headers: vec![
            ("cookie".to_string(), "stale=1".to_string()),
            ("x-request-id".to_string(), "r-1".to_string()),
        ],
        cookies: vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ],
        ..EngineRequest::default()
    };
    let req = EngineRequestFactory::default().create(&native);
    assert_eq!(req.header("cookie"), vec!["b=2; a=1"]);
    assert_eq!(req.header_line("x-request-id"), "r-1");
    let cookies: Vec<_> = req.cookie_params().iter().collect();
    assert_eq!(cookies, vec![("b", "2"), ("a", "1")]);
}

#[test]
fn test_no_cookies_no_cookie_header() {
    let req = convert("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");
    assert!(!req.has_header("cookie"));
    assert!(req.cookie_params().is_empty());
}

#[test]
fn test_native_request_is_not_modified() {
    let native = EngineRequest::parse(b"GET /x?y=1 HTTP/1.1\r\nCookie: a=b\r\n\r\n").unwrap();
    let before = format!("{native:?}");
    let factory = EngineRequestFactory::new("app");
    factory.create(&native);
    factory.create(&native);
    assert_eq!(format!("{native:?}"), before);
    assert!(!native.server.contains("SCRIPT_NAME"));
}

#[test]
fn test_uploaded_files() {
    let dir = tempfile::tempdir().unwrap();
    let cases: [&[(&str, &str, &str)]; 3] = [
        &[],
        &[("foo.jpg", "image/jpeg", "foo.jpg")],
        &[
            ("bar.png", "image/png", "bar.png"),
            ("fizz.jpg", "image/jpeg", "fizz.jpg"),
        ],
    ];

    for files in cases {
        let mut native = EngineRequest::parse(b"POST /upload HTTP/1.1\r\n\r\n").unwrap();
        for (name, media_type, content) in files {
            native = native.with_file(FileDescriptor {
                tmp_name: spool(dir.path(), name, content.as_bytes()),
                name: name.to_string(),
                media_type: media_type.to_string(),
                size: content.len() as u64,
                error: 0,
            });
        }

        let req = EngineRequestFactory::default().create(&native);
        assert_eq!(req.uploaded_files().len(), files.len());
        for (upload, (name, media_type, content)) in req.uploaded_files().iter().zip(files.iter()) {
            assert_eq!(upload.client_filename(), Some(*name));
            assert_eq!(upload.client_media_type(), Some(*media_type));
            assert_eq!(upload.size(), content.len() as u64);
            assert_eq!(upload.error(), 0);
            let mut stream = upload.stream().unwrap();
            assert_eq!(stream.size(), Some(content.len() as u64));
            assert_eq!(&stream.contents().unwrap()[..], content.as_bytes());
        }
    }
}

#[test]
fn test_uploaded_file_error_code_preserved() {
    let native = EngineRequest::default().with_file(FileDescriptor {
        tmp_name: "/nonexistent/upload".into(),
        name: "partial.bin".to_string(),
        media_type: "application/octet-stream".to_string(),
        size: 0,
        error: 3,
    });
    let req = EngineRequestFactory::default().create(&native);
    let upload = &req.uploaded_files()[0];
    assert_eq!(upload.error(), 3);
    assert!(!upload.is_ok());
    assert!(upload.stream().is_err());
}

/// Build a `multipart/form-data` upload of `(filename, content)` pairs.
fn multipart_upload(files: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, content) in files {
        body.push_str(&format!(
            "--AaB03x\r\ncontent-disposition: form-data; name=\"{name}\"; filename=\"{name}\"\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str("--AaB03x--");
    format!(
        "POST /upload HTTP/1.1\r\n\
         Host: localhost\r\n\
         Content-Type: multipart/form-data; boundary=AaB03x\r\n\
         Content-Length: {}\r\n\r\n{body}",
        body.len()
    )
}

#[test]
fn test_multipart_body_becomes_uploaded_files() {
    let files = [("foo.txt", "foo.txt"), ("bar.txt", "bar.txt")];
    let raw = multipart_upload(&files);
    let req = convert(&raw);

    assert_eq!(req.method().as_str(), "POST");
    assert_eq!(req.uri().path(), "/upload");
    assert_eq!(req.headers().len(), 3);
    assert_eq!(req.uploaded_files().len(), 2);
    for (upload, (name, content)) in req.uploaded_files().iter().zip(files.iter()) {
        assert_eq!(upload.client_filename(), Some(*name));
        assert_eq!(upload.size(), content.len() as u64);
        assert!(upload.is_ok());
        let mut stream = upload.stream().unwrap();
        assert_eq!(&stream.contents().unwrap()[..], content.as_bytes());
    }
}

#[test]
fn test_multipart_temp_files_live_with_native_request() {
    let native = EngineRequest::parse(multipart_upload(&[("a.txt", "alpha")]).as_bytes()).unwrap();
    let req = EngineRequestFactory::default().create(&native);
    let path = req.uploaded_files()[0].path().to_path_buf();
    assert!(path.exists());
    drop(native);
    assert!(!path.exists());
}

#[test]
fn test_multipart_upload_can_be_moved() {
    let dir = tempfile::tempdir().unwrap();
    let native = EngineRequest::parse(multipart_upload(&[("keep.txt", "kept")]).as_bytes()).unwrap();
    let mut req = EngineRequestFactory::default().create(&native);
    let target = dir.path().join("keep.txt");
    req.uploaded_files_mut()[0].move_to(&target).unwrap();
    drop(native);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "kept");
}
