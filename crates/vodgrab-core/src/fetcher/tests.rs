use super::*;
use crate::retry::FetchError;
use crate::transport::memory::{MemoryTransport, Route};
use std::time::Duration;

fn seg_url(i: usize) -> String {
    format!("https://cdn.example.com/hls/abc123/seg{}.ts", i)
}

fn body(i: usize) -> Vec<u8> {
    vec![i as u8; 10 + i]
}

fn fast_opts(max_concurrent: usize, max_attempts: u32) -> FetchOptions {
    FetchOptions {
        max_concurrent,
        retry_policy: RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        },
    }
}

#[test]
fn paths_follow_input_order_despite_completion_order() {
    // Earlier segments are slower, so they complete last.
    let n = 6;
    let mut transport = MemoryTransport::new();
    for i in 0..n {
        transport = transport.with_route(
            &seg_url(i),
            Route {
                body: body(i),
                delay: Duration::from_millis(((n - i) * 15) as u64),
                ..Route::default()
            },
        );
    }
    let urls: Vec<String> = (0..n).map(seg_url).collect();
    let dir = tempfile::tempdir().unwrap();
    let staging = dir.path().join("abc123");
    let (tx, mut rx) = tokio::sync::mpsc::channel(64);

    let paths = fetch_all(
        &transport,
        &urls,
        &staging,
        &fast_opts(n, 1),
        &AbortToken::new(),
        Some(&tx),
    )
    .unwrap();

    assert_eq!(paths.len(), n);
    for (i, p) in paths.iter().enumerate() {
        assert_eq!(p, &staging.join(format!("seg{}.ts", i)));
        assert_eq!(std::fs::read(p).unwrap(), body(i));
    }

    let mut fetched = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        if let PipelineEvent::SegmentFetched { index, completed, total, .. } = ev {
            assert_eq!(total, n);
            fetched.push((index, completed));
        }
    }
    assert_eq!(fetched.len(), n);
    assert_eq!(fetched.last().map(|(_, c)| *c), Some(n));
    // Completion order differs from playlist order.
    assert_ne!(fetched.iter().map(|(i, _)| *i).collect::<Vec<_>>(), (0..n).collect::<Vec<_>>());
}

#[test]
fn failing_segment_is_reported_by_index() {
    // Segment #2 of 5 times out on every attempt.
    let mut transport = MemoryTransport::new();
    for i in 0..5 {
        let route = if i == 2 {
            Route {
                fail_status: 504,
                always_fail: true,
                ..Route::default()
            }
        } else {
            Route {
                body: body(i),
                ..Route::default()
            }
        };
        transport = transport.with_route(&seg_url(i), route);
    }
    let urls: Vec<String> = (0..5).map(seg_url).collect();
    let dir = tempfile::tempdir().unwrap();
    let staging = dir.path().join("abc123");

    let err = fetch_all(&transport, &urls, &staging, &fast_opts(1, 3), &AbortToken::new(), None)
        .unwrap_err();

    match &err {
        PipelineError::Segment { index, url, source } => {
            assert_eq!(*index, 2);
            assert_eq!(url, &seg_url(2));
            assert!(matches!(
                source.as_ref(),
                PipelineError::Network { source: FetchError::Http(504), .. }
            ));
        }
        other => panic!("expected Segment error, got {:?}", other),
    }
    assert_eq!(err.segment_index(), Some(2));
    assert_eq!(transport.hits(&seg_url(2)), 3);

    assert_eq!(std::fs::read(staging.join("seg0.ts")).unwrap(), body(0));
    assert_eq!(std::fs::read(staging.join("seg1.ts")).unwrap(), body(1));
    assert!(!staging.join("seg2.ts").exists());
    assert!(!staging.join("seg2.ts.part").exists());
    // Fail-fast: nothing after the failure was started.
    assert!(!staging.join("seg3.ts").exists());
    assert_eq!(transport.hits(&seg_url(4)), 0);
}

#[test]
fn lowest_failed_index_wins_under_concurrency() {
    // Segment #2 fails slowly, #4 fails fast, so #4 is usually reported first.
    let mut transport = MemoryTransport::new();
    for i in 0..6 {
        let route = match i {
            2 => Route {
                fail_status: 500,
                always_fail: true,
                delay: Duration::from_millis(60),
                ..Route::default()
            },
            4 => Route {
                fail_status: 502,
                always_fail: true,
                ..Route::default()
            },
            _ => Route {
                body: body(i),
                ..Route::default()
            },
        };
        transport = transport.with_route(&seg_url(i), route);
    }
    let urls: Vec<String> = (0..6).map(seg_url).collect();
    let dir = tempfile::tempdir().unwrap();
    let staging = dir.path().join("abc123");

    let err = fetch_all(&transport, &urls, &staging, &fast_opts(3, 2), &AbortToken::new(), None)
        .unwrap_err();

    match &err {
        PipelineError::Segment { index, url, source } => {
            assert_eq!(*index, 2);
            assert_eq!(url, &seg_url(2));
            assert!(matches!(
                source.as_ref(),
                PipelineError::Network { source: FetchError::Http(500), .. }
            ));
        }
        other => panic!("expected Segment error, got {:?}", other),
    }
    // Segments started before the failures finish and stay staged.
    assert_eq!(std::fs::read(staging.join("seg0.ts")).unwrap(), body(0));
    assert_eq!(std::fs::read(staging.join("seg1.ts")).unwrap(), body(1));
    for i in [3, 5] {
        let staged = staging.join(format!("seg{}.ts", i));
        assert_eq!(staged.exists(), transport.hits(&seg_url(i)) > 0);
    }
    assert!(!staging.join("seg2.ts").exists());
    assert!(!staging.join("seg4.ts").exists());
    let leftovers: Vec<_> = std::fs::read_dir(&staging)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn transient_failures_are_retried() {
    let url = seg_url(0);
    let transport = MemoryTransport::new().with_route(
        &url,
        Route {
            body: body(0),
            fail_status: 503,
            fail_times: 2,
            ..Route::default()
        },
    );
    let dir = tempfile::tempdir().unwrap();
    let paths = fetch_all(
        &transport,
        &[url.clone()],
        dir.path(),
        &fast_opts(4, 5),
        &AbortToken::new(),
        None,
    )
    .unwrap();
    assert_eq!(transport.hits(&url), 3);
    assert_eq!(std::fs::read(&paths[0]).unwrap(), body(0));
}

#[test]
fn rerun_overwrites_stale_segments() {
    let url = seg_url(0);
    let transport = MemoryTransport::new().with_body(&url, b"fresh".to_vec());
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("seg0.ts"), b"stale bytes that are longer").unwrap();

    let paths = fetch_all(
        &transport,
        &[url],
        dir.path(),
        &fast_opts(1, 1),
        &AbortToken::new(),
        None,
    )
    .unwrap();
    assert_eq!(std::fs::read(&paths[0]).unwrap(), b"fresh");
}

#[test]
fn duplicate_names_do_not_share_a_file() {
    let a = "https://a.example.com/seg.ts".to_string();
    let b = "https://b.example.com/seg.ts".to_string();
    let transport = MemoryTransport::new()
        .with_body(&a, b"first".to_vec())
        .with_body(&b, b"second".to_vec());
    let dir = tempfile::tempdir().unwrap();
    let paths = fetch_all(
        &transport,
        &[a, b],
        dir.path(),
        &fast_opts(2, 1),
        &AbortToken::new(),
        None,
    )
    .unwrap();
    assert_ne!(paths[0], paths[1]);
    assert_eq!(std::fs::read(&paths[0]).unwrap(), b"first");
    assert_eq!(std::fs::read(&paths[1]).unwrap(), b"second");
}

#[test]
fn cancellation_mid_flight() {
    let mut transport = MemoryTransport::new();
    for i in 0..4 {
        let route = Route {
            body: body(i),
            abort_on_request: i == 1,
            ..Route::default()
        };
        transport = transport.with_route(&seg_url(i), route);
    }
    let urls: Vec<String> = (0..4).map(seg_url).collect();
    let dir = tempfile::tempdir().unwrap();
    let abort = AbortToken::new();

    let err = fetch_all(&transport, &urls, dir.path(), &fast_opts(1, 3), &abort, None).unwrap_err();
    assert!(err.is_cancelled());
    assert!(abort.is_aborted());
    assert!(dir.path().join("seg0.ts").exists());
    assert!(!dir.path().join("seg1.ts.part").exists());
    assert_eq!(transport.hits(&seg_url(1)), 1);
    assert_eq!(transport.hits(&seg_url(2)), 0);
}

#[test]
fn empty_list_only_creates_staging_dir() {
    let transport = MemoryTransport::new();
    let dir = tempfile::tempdir().unwrap();
    let staging = dir.path().join("abc123");
    let paths = fetch_all(
        &transport,
        &[],
        &staging,
        &FetchOptions::default(),
        &AbortToken::new(),
        None,
    )
    .unwrap();
    assert!(paths.is_empty());
    assert!(staging.is_dir());
}
