use crate::service::model::{ErrorBody, UploadedImage, NO_IMAGE_PROVIDED, NO_IMAGE_SELECTED};
use crate::workflow::runner::Runner;
use bytes::Buf;
use futures::TryStreamExt;
use hsadcore::prelude::IMAGE_FIELD;
use log::{debug, error, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

const MAX_UPLOAD_BYTES: u64 = 64 * 1024 * 1024;

/// `POST /api/detect-anomalies` plus permissive CORS for browser clients.
pub fn routes(
    runner: Arc<Runner>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let runner_filter = warp::any().map(move || runner.clone());
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["POST", "OPTIONS"])
        .allow_headers(vec!["content-type"]);

    warp::path!("api" / "detect-anomalies")
        .and(warp::post())
        .and(warp::multipart::form().max_length(MAX_UPLOAD_BYTES))
        .and(runner_filter)
        .and_then(detect_anomalies)
        .with(cors)
}

/// Binds `addr` and serves until `shutdown` resolves.
pub async fn serve(
    runner: Arc<Runner>,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let runner_handle = runner.clone();
    let (bound, server) =
        warp::serve(routes(runner)).try_bind_with_graceful_shutdown(addr, shutdown)?;
    info!("detection stand-in listening on http://{}/api/detect-anomalies", bound);
    server.await;
    match runner_handle.last_upload() {
        Some(upload) => info!(
            "detection stand-in stopped; last upload {} ({} bytes)",
            upload.file_name,
            upload.bytes.len()
        ),
        None => info!("detection stand-in stopped"),
    }
    Ok(())
}

async fn detect_anomalies(form: FormData, runner: Arc<Runner>) -> Result<Response, Rejection> {
    let upload = match read_image_part(form).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return Ok(error_reply(StatusCode::BAD_REQUEST, NO_IMAGE_PROVIDED)),
        Err(err) => {
            warn!("unreadable upload: {}", err);
            return Ok(error_reply(
                StatusCode::BAD_REQUEST,
                &format!("Invalid upload: {}", err),
            ));
        }
    };
    if upload.file_name.is_empty() {
        return Ok(error_reply(StatusCode::BAD_REQUEST, NO_IMAGE_SELECTED));
    }
    debug!(
        "upload {} declared as {}",
        upload.file_name,
        upload.content_type.as_deref().unwrap_or("unknown")
    );

    match runner.execute(&upload) {
        Ok(body) => Ok(warp::reply::with_status(warp::reply::json(&body), StatusCode::OK)
            .into_response()),
        Err(err) => {
            error!("analysis of {} failed: {:#}", upload.file_name, err);
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                &err.to_string(),
            ))
        }
    }
}

async fn read_image_part(form: FormData) -> Result<Option<UploadedImage>, warp::Error> {
    let parts: Vec<Part> = form.try_collect().await?;
    let Some(part) = parts.into_iter().find(|part| part.name() == IMAGE_FIELD) else {
        return Ok(None);
    };

    let file_name = part.filename().unwrap_or_default().to_string();
    let content_type = part.content_type().map(str::to_string);
    let bytes = part
        .stream()
        .try_fold(Vec::new(), |mut acc, mut chunk| async move {
            while chunk.has_remaining() {
                let slice = chunk.chunk();
                let len = slice.len();
                acc.extend_from_slice(slice);
                chunk.advance(len);
            }
            Ok::<_, warp::Error>(acc)
        })
        .await?;

    Ok(Some(UploadedImage {
        file_name,
        content_type,
        bytes,
    }))
}

fn error_reply(status: StatusCode, message: &str) -> Response {
    warp::reply::with_status(warp::reply::json(&ErrorBody::new(message)), status).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::ServiceConfig;
    use hsadcore::config::SessionConfig;
    use hsadcore::input::SelectedFile;
    use hsadcore::prelude::GENERIC_FAILURE_MESSAGE;
    use hsadcore::session::{SessionController, SessionPhase};
    use hsadcore::transport::HttpTransport;

    fn spawn_service(config: ServiceConfig) -> String {
        spawn_runner(Arc::new(Runner::new(config)))
    }

    fn spawn_runner(runner: Arc<Runner>) -> String {
        let (addr, server) = warp::serve(routes(runner)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{}/api/detect-anomalies", addr)
    }

    fn session_for(endpoint: String) -> SessionController {
        let config = SessionConfig::default().with_endpoint(endpoint);
        let transport = HttpTransport::new(&config).unwrap();
        SessionController::new(&config, Arc::new(transport))
    }

    fn scene() -> SelectedFile {
        SelectedFile::new("scene.png", vec![0x89u8, b'P', b'N', b'G'])
    }

    #[tokio::test]
    async fn upload_round_trips_through_session() {
        let runner = Arc::new(Runner::new(ServiceConfig {
            rows: 10,
            cols: 10,
            anomalies: 5,
            seed: 3,
            ..Default::default()
        }));
        let endpoint = spawn_runner(runner.clone());
        let mut session = session_for(endpoint);
        session.select_file(scene());

        let result = session.analyze().await.unwrap();
        assert_eq!(result.total_pixels, 100);
        assert!(result.anomaly_count >= 1 && result.anomaly_count <= 5);
        let png = result.visualization.as_ref().unwrap().decode().unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
        assert_eq!(session.phase(), SessionPhase::Succeeded);

        let received = runner.last_upload().unwrap();
        assert_eq!(received.bytes, scene().bytes());
        assert_eq!(received.file_name, "scene.png");
        assert_eq!(received.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn latest_selection_is_the_uploaded_one() {
        let runner = Arc::new(Runner::new(ServiceConfig {
            visualization: false,
            ..Default::default()
        }));
        let mut session = session_for(spawn_runner(runner.clone()));
        session.select_file(scene());
        session.select_file(SelectedFile::new("cube.tif", vec![7u8; 300]));

        session.analyze().await.unwrap();
        let received = runner.last_upload().unwrap();
        assert_eq!(received.file_name, "cube.tif");
        assert_eq!(received.bytes, vec![7u8; 300]);
        assert_eq!(received.content_type.as_deref(), Some("image/tiff"));
    }

    #[tokio::test]
    async fn scripted_failure_message_reaches_session() {
        let endpoint = spawn_service(ServiceConfig {
            fail_with: Some("unsupported format".into()),
            ..Default::default()
        });
        let mut session = session_for(endpoint);
        session.select_file(scene());

        assert!(session.analyze().await.is_err());
        assert_eq!(session.phase(), SessionPhase::Failed);
        assert_eq!(session.error(), Some("unsupported format"));
    }

    #[tokio::test]
    async fn missing_totals_fail_with_generic_message() {
        let endpoint = spawn_service(ServiceConfig {
            omit_totals: true,
            ..Default::default()
        });
        let mut session = session_for(endpoint);
        session.select_file(scene());

        assert!(session.analyze().await.is_err());
        assert_eq!(session.error(), Some(GENERIC_FAILURE_MESSAGE));
    }

    #[tokio::test]
    async fn empty_file_name_is_rejected() {
        let endpoint = spawn_service(ServiceConfig::default());
        let mut session = session_for(endpoint);
        session.select_file(SelectedFile::new("", vec![1u8]));

        assert!(session.analyze().await.is_err());
        assert_eq!(session.error(), Some(NO_IMAGE_SELECTED));
    }

    #[tokio::test]
    async fn upload_without_image_part_is_rejected() {
        let endpoint = spawn_service(ServiceConfig::default());
        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(vec![1u8, 2]).file_name("scene.png"),
        );
        let response = reqwest::Client::new()
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let body: ErrorBody = response.json().await.unwrap();
        assert_eq!(body, ErrorBody::new(NO_IMAGE_PROVIDED));
    }

    #[tokio::test]
    async fn consecutive_uploads_draw_new_scenes() {
        let endpoint = spawn_service(ServiceConfig {
            visualization: false,
            ..Default::default()
        });
        let mut session = session_for(endpoint);
        session.select_file(scene());

        session.analyze().await.unwrap();
        session.analyze().await.unwrap();
        assert_eq!(session.metrics().succeeded, 2);
        assert!(session.result().unwrap().visualization.is_none());
    }
}
