use super::*;

#[test]
fn fetch_returns_body_on_success() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/photo.png")
        .with_status(200)
        .with_body(b"pixels")
        .create();

    let fetcher = HttpPhotoFetcher::new(Duration::from_secs(5)).unwrap();
    let body = fetcher.fetch(&format!("{}/photo.png", server.url())).unwrap();
    assert_eq!(body, b"pixels");
    mock.assert();
}

#[test]
fn non_success_status_is_upstream_error() {
    let mut server = mockito::Server::new();
    let _mock = server.mock("GET", "/gone.png").with_status(404).create();

    let fetcher = HttpPhotoFetcher::new(Duration::from_secs(5)).unwrap();
    let err = fetcher
        .fetch(&format!("{}/gone.png", server.url()))
        .unwrap_err();
    assert!(matches!(err, OgError::Upstream(ref m) if m.contains("404")));
}

#[test]
fn unreachable_host_is_upstream_error() {
    let fetcher = HttpPhotoFetcher::new(Duration::from_millis(500)).unwrap();
    let err = fetcher.fetch("http://127.0.0.1:1/photo.png").unwrap_err();
    assert!(matches!(err, OgError::Upstream(_)));
}
