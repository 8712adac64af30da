//! Downloader integration tests against a mock HTTP server.
//!
//! The blocking client must be built, used and dropped off the async
//! runtime, so every download runs inside `spawn_blocking`.

use assert_matches::assert_matches;
use stickerforge::config::DownloadConfig;
use stickerforge::download::{DownloadJob, DownloadOutcome, Downloader, FetchStatus};
use stickerforge::queue::Counter;
use std::sync::Arc;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config() -> DownloadConfig {
    DownloadConfig {
        max_attempts: 3,
        backoff_base_ms: 1,
        backoff_max_ms: 5,
        timeout_secs: 5,
        ..Default::default()
    }
}

async fn run(
    config: DownloadConfig,
    jobs: Vec<DownloadJob>,
) -> (Vec<DownloadOutcome>, u64) {
    tokio::task::spawn_blocking(move || {
        let counter = Arc::new(Counter::new());
        let downloader = Downloader::new(&config, counter.clone()).unwrap();
        let outcomes = downloader.download_all(jobs, 2).unwrap();
        (outcomes, counter.get())
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn downloads_into_destination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sticker/1.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let temp = tempdir().unwrap();
    let dest = temp.path().join("static").join("1.png");
    let job = DownloadJob::new("1|image", format!("{}/sticker/1.png", server.uri()), &dest);

    let (outcomes, done) = run(fast_config(), vec![job]).await;

    assert_eq!(done, 1);
    assert_matches!(
        &outcomes[..],
        [DownloadOutcome::Done { status: FetchStatus::Downloaded(9), .. }]
    );
    assert_eq!(std::fs::read(&dest).unwrap(), b"png-bytes");
    assert!(!temp.path().join("static").join("1.png.part").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn existing_file_is_not_requested() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp = tempdir().unwrap();
    let dest = temp.path().join("2.png");
    std::fs::write(&dest, b"old").unwrap();
    let job = DownloadJob::new("2|image", format!("{}/2.png", server.uri()), &dest);

    let (outcomes, done) = run(fast_config(), vec![job]).await;

    assert_eq!(done, 1);
    assert_matches!(
        &outcomes[..],
        [DownloadOutcome::Done { status: FetchStatus::Skipped, .. }]
    );
    assert_eq!(std::fs::read(&dest).unwrap(), b"old");
}

#[tokio::test(flavor = "multi_thread")]
async fn overwrite_refetches_existing_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let temp = tempdir().unwrap();
    let dest = temp.path().join("3.png");
    std::fs::write(&dest, b"old").unwrap();
    let job = DownloadJob::new("3|image", format!("{}/3.png", server.uri()), &dest);

    let config = DownloadConfig {
        overwrite: true,
        ..fast_config()
    };
    run(config, vec![job]).await;

    assert_eq!(std::fs::read(&dest).unwrap(), b"new");
}

#[tokio::test(flavor = "multi_thread")]
async fn server_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let temp = tempdir().unwrap();
    let dest = temp.path().join("sound").join("4.m4a");
    let job = DownloadJob::new("4|sound", format!("{}/4.m4a", server.uri()), &dest);

    let (outcomes, done) = run(fast_config(), vec![job]).await;

    assert_eq!(done, 1);
    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].is_failed());
    assert_eq!(std::fs::read(&dest).unwrap(), b"ok");
}

#[tokio::test(flavor = "multi_thread")]
async fn exhausted_retries_end_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let temp = tempdir().unwrap();
    let dest = temp.path().join("5.png");
    let job = DownloadJob::new("5|image", format!("{}/5.png", server.uri()), &dest);

    let (outcomes, done) = run(fast_config(), vec![job]).await;

    assert_eq!(done, 0);
    assert_matches!(
        &outcomes[..],
        [DownloadOutcome::Failed { attempts: 3, .. }]
    );
    assert!(!dest.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/present.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let temp = tempdir().unwrap();
    let jobs = vec![
        DownloadJob::new("6|image", format!("{}/missing.png", server.uri()), temp.path().join("6.png")),
        DownloadJob::new("7|image", format!("{}/present.png", server.uri()), temp.path().join("7.png")),
    ];

    let (outcomes, done) = run(fast_config(), jobs).await;

    assert_eq!(done, 1);
    assert_eq!(outcomes.len(), 2);
    let failed: Vec<&DownloadOutcome> = outcomes.iter().filter(|o| o.is_failed()).collect();
    assert_matches!(
        failed[..],
        [DownloadOutcome::Failed { attempts: 1, error, .. }] if error.contains("404")
    );
    assert!(!temp.path().join("6.png").exists());
    assert!(temp.path().join("7.png").exists());
}
