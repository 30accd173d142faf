//! Integration test: curl transport and segment fetching against a local HTTP server.

mod common;

use common::http_server::{self, Route};
use std::time::Duration;
use tempfile::tempdir;
use vodgrab_core::assembler;
use vodgrab_core::control::AbortToken;
use vodgrab_core::fetcher::{self, FetchOptions};
use vodgrab_core::retry::{classify, ErrorKind, FetchError, RetryPolicy};
use vodgrab_core::transport::{CurlTransport, Transport};
use vodgrab_core::PipelineError;

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    }
}

#[test]
fn get_text_returns_body() {
    let server = http_server::start(vec![(
        "/all/abc123.m3u8",
        Route::ok("https://cdn.example.com/lo.m3u8\nhttps://cdn.example.com/hi.m3u8\n"),
    )]);
    let transport = CurlTransport::default();
    let text = transport
        .get_text(&server.url("/all/abc123.m3u8"), &AbortToken::new())
        .unwrap();
    assert!(text.ends_with("hi.m3u8\n"));
}

#[test]
fn missing_resource_is_http_404_and_not_retryable() {
    let server = http_server::start(vec![]);
    let transport = CurlTransport::default();
    let err = transport
        .get_text(&server.url("/nope.m3u8"), &AbortToken::new())
        .unwrap_err();
    assert!(matches!(err, FetchError::Http(404)));
    assert_eq!(classify(&err), ErrorKind::Permanent);
}

#[test]
fn service_unavailable_is_throttled() {
    let server = http_server::start(vec![(
        "/busy",
        Route {
            fail_status: 503,
            fail_times: u32::MAX,
            ..Route::default()
        },
    )]);
    let err = CurlTransport::default()
        .get_text(&server.url("/busy"), &AbortToken::new())
        .unwrap_err();
    assert!(matches!(err, FetchError::Http(503)));
    assert_eq!(classify(&err), ErrorKind::Throttled);
}

#[test]
fn download_to_writes_exact_bytes() {
    let body: Vec<u8> = (0u8..=255).cycle().take(96 * 1024).collect();
    let server = http_server::start(vec![("/seg0.ts", Route::ok(body.clone()))]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("seg0.ts");

    let n = CurlTransport::default()
        .download_to(&server.url("/seg0.ts"), &dest, &AbortToken::new())
        .unwrap();
    assert_eq!(n, body.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[test]
fn aborted_token_stops_transfer() {
    let server = http_server::start(vec![("/seg0.ts", Route::ok(vec![1u8; 1024]))]);
    let abort = AbortToken::new();
    abort.abort();
    let dir = tempdir().unwrap();
    let err = CurlTransport::default()
        .download_to(&server.url("/seg0.ts"), &dir.path().join("seg0.ts"), &abort)
        .unwrap_err();
    assert!(matches!(err, FetchError::Aborted));
}

#[test]
fn fetch_and_assemble_over_http() {
    let bodies: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i; 4096 + i as usize]).collect();
    let paths: Vec<String> = (0..5).map(|i| format!("/hls/abc123/seg{}.ts", i)).collect();
    let mut routes: Vec<(&str, Route)> = paths
        .iter()
        .zip(&bodies)
        .map(|(p, b)| (p.as_str(), Route::ok(b.clone())))
        .collect();
    // One flaky segment recovers on retry.
    routes[3].1.fail_status = 503;
    routes[3].1.fail_times = 1;
    let server = http_server::start(routes);
    let urls: Vec<String> = paths.iter().map(|p| server.url(p)).collect();

    let dir = tempdir().unwrap();
    let staging = dir.path().join("abc123");
    let opts = FetchOptions {
        max_concurrent: 3,
        retry_policy: fast_policy(3),
    };
    let transport = CurlTransport::default();
    let files = fetcher::fetch_all(&transport, &urls, &staging, &opts, &AbortToken::new(), None)
        .expect("fetch_all");
    assert_eq!(server.hits("/hls/abc123/seg3.ts"), 2);

    let output = dir.path().join("abc123.ts");
    let written = assembler::assemble(&files, &output).unwrap();
    let expected: Vec<u8> = bodies.concat();
    assert_eq!(written, expected.len() as u64);
    assert_eq!(std::fs::read(&output).unwrap(), expected);
}

#[test]
fn unrecoverable_segment_names_its_index() {
    let server = http_server::start(vec![
        ("/seg0.ts", Route::ok(b"zero".to_vec())),
        (
            "/seg1.ts",
            Route {
                fail_status: 500,
                fail_times: u32::MAX,
                ..Route::default()
            },
        ),
    ]);
    let urls = vec![server.url("/seg0.ts"), server.url("/seg1.ts")];
    let dir = tempdir().unwrap();
    let opts = FetchOptions {
        max_concurrent: 1,
        retry_policy: fast_policy(2),
    };
    let err = fetcher::fetch_all(
        &CurlTransport::default(),
        &urls,
        dir.path(),
        &opts,
        &AbortToken::new(),
        None,
    )
    .unwrap_err();
    assert_eq!(err.segment_index(), Some(1));
    assert!(matches!(err, PipelineError::Segment { .. }));
    assert_eq!(server.hits("/seg1.ts"), 2);
    assert!(dir.path().join("seg0.ts").exists());
}
