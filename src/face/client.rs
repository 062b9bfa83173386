//! HTTP client for the face recognition service.

use core::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use super::error::{FaceApiError, RETRY_STATUSES};
use crate::config::FaceApiConfig;

/// Anything that can put a name to a captured face.
#[allow(async_fn_in_trait)]
pub trait FaceRecognizer {
    async fn identify(&self, image: &[u8]) -> Result<Value, FaceApiError>;
}

/// Client for the recognition service, built from an explicit config.
#[derive(Clone)]
pub struct FaceClient {
    http: Client,
    config: FaceApiConfig,
}

fn jpeg_part(name: &'static str, bytes: &[u8]) -> Result<Part, FaceApiError> {
    Part::bytes(bytes.to_vec())
        .file_name(name)
        .mime_str("image/jpeg")
        .map_err(FaceApiError::Transport)
}

impl FaceClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: FaceApiConfig) -> Result<Self, FaceApiError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()
            .map_err(FaceApiError::Transport)?;

        Ok(Self { http, config })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.config.retry_backoff)
            .with_max_times(self.config.max_retries)
    }

    /// POSTs to `path`, retrying transport failures and gateway statuses.
    ///
    /// `form` is called once per attempt since a multipart body is consumed
    /// by sending it.
    async fn post<F>(&self, path: &str, form: F) -> Result<Value, FaceApiError>
    where
        F: Fn() -> Result<Option<Form>, FaceApiError>,
    {
        if !self.config.enabled {
            return Err(FaceApiError::Disabled);
        }

        let url = format!("{}{}", self.config.base_url, path);
        debug!(url = %url, "Calling face API");

        let http = &self.http;
        let url = url.as_str();
        let form = &form;

        let response = (|| async move {
            let mut request = http.post(url);
            if let Some(body) = form()? {
                request = request.multipart(body);
            }

            let response = request.send().await.map_err(FaceApiError::Transport)?;
            if RETRY_STATUSES.contains(&response.status().as_u16()) {
                return Err(FaceApiError::from_response(path, response).await);
            }

            Ok(response)
        })
        .retry(self.backoff())
        .when(FaceApiError::is_transient)
        .notify(|err: &FaceApiError, delay: Duration| {
            warn!(path, error = %err, ?delay, "Face API call failed, retrying");
        })
        .await
        .inspect_err(|e| error!(path, error = %e, "Face API request failed"))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let err = FaceApiError::from_response(path, response).await;
            error!(path, error = %err, "Face API returned an error status");
            return Err(err);
        }

        let text = response.text().await.map_err(FaceApiError::Transport)?;
        Ok(serde_json::from_str(&text).unwrap_or_else(|_| json!({ "raw": text })))
    }

    /// Enrolls `identity` with one or more face images.
    pub async fn enroll(&self, identity: &str, images: &[Vec<u8>]) -> Result<Value, FaceApiError> {
        if images.is_empty() {
            return Err(FaceApiError::NoImages);
        }

        self.post("/add_person", || {
            let mut form = Form::new().text("person_name", identity.to_string());
            for image in images {
                form = form.part("files", jpeg_part("face.jpg", image)?);
            }
            Ok(Some(form))
        })
        .await
    }

    /// Submits a single captured frame and returns the raw response.
    pub async fn identify(&self, image: &[u8]) -> Result<Value, FaceApiError> {
        self.post("/identify", || {
            Ok(Some(Form::new().part("file", jpeg_part("capture.jpg", image)?)))
        })
        .await
    }

    /// Asks the service to rebuild its embedding index.
    pub async fn rebuild_index(&self) -> Result<Value, FaceApiError> {
        self.post("/rebuild_db", || Ok(None)).await
    }

    /// Asks the service to migrate its index to the current format.
    pub async fn reindex(&self) -> Result<Value, FaceApiError> {
        self.post("/migrate", || Ok(None)).await
    }
}

impl FaceRecognizer for FaceClient {
    async fn identify(&self, image: &[u8]) -> Result<Value, FaceApiError> {
        FaceClient::identify(self, image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, HttpServer, web};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Hits = web::Data<AtomicUsize>;

    /// Starts a stand-in recognition service on an ephemeral port.
    fn spawn_service(routes: fn(&mut web::ServiceConfig)) -> (String, Hits) {
        let hits = web::Data::new(AtomicUsize::new(0));
        let data = hits.clone();

        let server = HttpServer::new(move || App::new().app_data(data.clone()).configure(routes))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        (format!("http://{addr}"), hits)
    }

    fn client_for(base_url: String) -> FaceClient {
        FaceClient::new(FaceApiConfig {
            base_url,
            retry_backoff: Duration::from_millis(5),
            ..FaceApiConfig::default()
        })
        .unwrap()
    }

    async fn identify_ok(hits: Hits, body: web::Bytes) -> HttpResponse {
        hits.fetch_add(1, Ordering::SeqCst);
        let body = String::from_utf8_lossy(&body);
        HttpResponse::Ok().json(json!({
            "person_name": "EMP-007",
            "confidence": 0.93,
            "saw_file": body.contains("name=\"file\""),
        }))
    }

    async fn enroll_echo(hits: Hits, body: web::Bytes) -> HttpResponse {
        hits.fetch_add(1, Ordering::SeqCst);
        let body = String::from_utf8_lossy(&body);
        HttpResponse::Ok().json(json!({
            "has_person_name": body.contains("name=\"person_name\""),
            "enrolled": body.contains("EMP-001"),
            "files": body.matches("name=\"files\"").count(),
        }))
    }

    async fn flaky(hits: Hits) -> HttpResponse {
        if hits.fetch_add(1, Ordering::SeqCst) == 0 {
            HttpResponse::ServiceUnavailable().finish()
        } else {
            HttpResponse::Ok().json(json!({"results": ["EMP-003"]}))
        }
    }

    async fn unavailable(hits: Hits) -> HttpResponse {
        hits.fetch_add(1, Ordering::SeqCst);
        HttpResponse::ServiceUnavailable().body("warming up")
    }

    async fn broken(hits: Hits) -> HttpResponse {
        hits.fetch_add(1, Ordering::SeqCst);
        HttpResponse::InternalServerError().json(json!({"detail": "no face detected"}))
    }

    async fn stalled(hits: Hits) -> HttpResponse {
        hits.fetch_add(1, Ordering::SeqCst);
        actix_web::rt::time::sleep(Duration::from_millis(500)).await;
        HttpResponse::Ok().json(json!({"person_name": "EMP-007"}))
    }

    async fn plain_text() -> HttpResponse {
        HttpResponse::Ok().body("rebuild started")
    }

    #[actix_web::test]
    async fn identify_returns_parsed_json() {
        let (base, hits) = spawn_service(|cfg| {
            cfg.route("/identify", web::post().to(identify_ok));
        });

        let body = client_for(base).identify(b"\xff\xd8jpeg").await.unwrap();

        assert_eq!(body["person_name"], "EMP-007");
        assert_eq!(body["saw_file"], true);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn enroll_sends_name_and_every_image() {
        let (base, hits) = spawn_service(|cfg| {
            cfg.route("/add_person", web::post().to(enroll_echo));
        });

        let images = vec![b"one".to_vec(), b"two".to_vec()];
        let body = client_for(base).enroll("EMP-001", &images).await.unwrap();

        assert_eq!(body["has_person_name"], true);
        assert_eq!(body["enrolled"], true);
        assert_eq!(body["files"], 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn enroll_without_images_fails_before_sending() {
        let client = client_for("http://127.0.0.1:9".to_string());
        let err = client.enroll("EMP-001", &[]).await.unwrap_err();
        assert!(matches!(err, FaceApiError::NoImages));
    }

    #[actix_web::test]
    async fn disabled_client_never_connects() {
        let (base, hits) = spawn_service(|cfg| {
            cfg.route("/identify", web::post().to(identify_ok));
        });
        let client = FaceClient::new(FaceApiConfig {
            base_url: base,
            enabled: false,
            ..FaceApiConfig::default()
        })
        .unwrap();

        let err = client.identify(b"frame").await.unwrap_err();

        assert!(matches!(err, FaceApiError::Disabled));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn gateway_errors_are_retried() {
        let (base, hits) = spawn_service(|cfg| {
            cfg.route("/identify", web::post().to(flaky));
        });

        let body = client_for(base).identify(b"frame").await.unwrap();

        assert_eq!(body["results"][0], "EMP-003");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[actix_web::test]
    async fn retries_are_bounded() {
        let (base, hits) = spawn_service(|cfg| {
            cfg.route("/rebuild_db", web::post().to(unavailable));
        });

        let err = client_for(base).rebuild_index().await.unwrap_err();

        match err {
            FaceApiError::Service { status, detail, .. } => {
                assert_eq!(status, 503);
                assert_eq!(detail, json!("warming up"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // first attempt plus two retries
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[actix_web::test]
    async fn server_errors_carry_body_and_are_not_retried() {
        let (base, hits) = spawn_service(|cfg| {
            cfg.route("/identify", web::post().to(broken));
        });

        let err = client_for(base).identify(b"frame").await.unwrap_err();

        match err {
            FaceApiError::Service {
                path,
                status,
                detail,
            } => {
                assert_eq!(path, "/identify");
                assert_eq!(status, 500);
                assert_eq!(detail["detail"], "no face detected");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn non_json_body_is_wrapped() {
        let (base, _) = spawn_service(|cfg| {
            cfg.route("/migrate", web::post().to(plain_text));
        });

        let body = client_for(base).reindex().await.unwrap();

        assert_eq!(body, json!({"raw": "rebuild started"}));
    }

    #[actix_web::test]
    async fn timed_out_call_is_a_transport_error_after_retries() {
        let (base, hits) = spawn_service(|cfg| {
            cfg.route("/identify", web::post().to(stalled));
        });
        let client = FaceClient::new(FaceApiConfig {
            base_url: base,
            read_timeout: Duration::from_millis(100),
            retry_backoff: Duration::from_millis(5),
            ..FaceApiConfig::default()
        })
        .unwrap();

        let err = client.identify(b"frame").await.unwrap_err();

        match err {
            FaceApiError::Transport(source) => assert!(source.is_timeout()),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[actix_web::test]
    async fn unreachable_service_is_a_transport_error() {
        // grab a free port and release it so nothing is listening there
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let err = client_for(format!("http://127.0.0.1:{port}"))
            .identify(b"frame")
            .await
            .unwrap_err();

        assert!(matches!(err, FaceApiError::Transport(_)));
    }
}
