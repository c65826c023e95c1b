use crate::api_client::{ApiClient, DownloadError, RemoveBgError};
use crate::compositor::{self, CompositeError};
use crate::frame::Frame;
use crate::messages;
use crate::transport::{ChatTransport, PhotoVariant};
use std::sync::Arc;
use teloxide::types::ChatId;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to resolve download link for file {file_id}: {error:#}")]
    LinkResolution {
        file_id: String,
        error: anyhow::Error,
    },
    #[error("failed to download photo: {0}")]
    Download(#[from] DownloadError),
    #[error("failed to decode photo ({len} bytes): {source}")]
    Decode {
        len: usize,
        source: image::ImageError,
    },
    #[error("failed to place photo on frame: {0}")]
    Composition(#[from] CompositeError),
    #[error("failed to encode framed photo as PNG: {0}")]
    Encode(#[source] image::ImageError),
    #[error("background removal failed: {0}")]
    BackgroundRemoval(#[from] RemoveBgError),
    #[error("image processing task failed: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::LinkResolution { .. } => messages::LINK_FAILED,
            Self::Download(_) => messages::DOWNLOAD_FAILED,
            Self::Decode { .. } => messages::DECODE_FAILED,
            Self::Composition(_) => messages::COMPOSITION_FAILED,
            Self::Encode(_) => messages::ENCODE_FAILED,
            Self::BackgroundRemoval(_) => messages::REMOVAL_FAILED,
            Self::Internal(_) => messages::GENERIC_FAILURE,
        }
    }
}

/// Everything a photo run needs besides the chat transport. Built once in
/// `main` and shared read-only between updates.
pub struct Pipeline {
    frame: Arc<Frame>,
    padding: u32,
    api_client: ApiClient,
}

impl Pipeline {
    pub fn new(frame: Frame, padding: u32, api_client: ApiClient) -> Self {
        Self {
            frame: Arc::new(frame),
            padding,
            api_client,
        }
    }

    /// Runs the full photo flow for one chat. Failures are logged and
    /// reported to the user; nothing is returned to the dispatcher.
    pub async fn process_photo<T>(&self, transport: &T, chat_id: ChatId, photo: &PhotoVariant)
    where
        T: ChatTransport + ?Sized,
    {
        if let Err(err) = self.run(transport, chat_id, photo).await {
            error!(
                chat_id = %chat_id,
                file_id = %photo.file_id,
                "Photo processing failed: {}",
                err
            );
            if let Err(send_err) = transport.send_text(chat_id, err.user_message()).await {
                error!(chat_id = %chat_id, "Failed to send error message: {:#}", send_err);
            }
        }
    }

    async fn run<T>(
        &self,
        transport: &T,
        chat_id: ChatId,
        photo: &PhotoVariant,
    ) -> Result<(), PipelineError>
    where
        T: ChatTransport + ?Sized,
    {
        let url = transport
            .resolve_file_url(&photo.file_id)
            .await
            .map_err(|error| PipelineError::LinkResolution {
                file_id: photo.file_id.clone(),
                error,
            })?;

        let bytes = self.api_client.download(&url).await?;
        info!(
            chat_id = %chat_id,
            "Downloaded photo {}x{} ({} bytes)",
            photo.width,
            photo.height,
            bytes.len()
        );

        // Декодирование и наложение рамки выполняются вне async-рантайма
        let frame = Arc::clone(&self.frame);
        let padding = self.padding;
        let framed_png =
            tokio::task::spawn_blocking(move || render_framed_png(&bytes, &frame, padding))
                .await
                .map_err(|e| PipelineError::Internal(e.to_string()))??;

        if let Err(err) = transport.send_text(chat_id, messages::PROCESSING).await {
            warn!(chat_id = %chat_id, "Failed to send processing notice: {:#}", err);
        }

        info!(chat_id = %chat_id, "Sending {} bytes to remove.bg", framed_png.len());
        let result = self.api_client.remove_background(framed_png).await?;
        info!(chat_id = %chat_id, "Background removed ({} bytes)", result.len());

        match transport
            .send_document(
                chat_id,
                messages::RESULT_FILE_NAME,
                result,
                messages::RESULT_CAPTION,
            )
            .await
        {
            Ok(()) => info!(chat_id = %chat_id, "Result sent as document"),
            Err(err) => error!(chat_id = %chat_id, "Failed to send result document: {:#}", err),
        }

        Ok(())
    }
}

/// Decode, place on the frame, draw the frame over, encode as PNG.
pub fn render_framed_png(
    bytes: &[u8],
    frame: &Frame,
    padding: u32,
) -> Result<Vec<u8>, PipelineError> {
    let user_image = image::load_from_memory(bytes).map_err(|source| PipelineError::Decode {
        len: bytes.len(),
        source,
    })?;
    info!(
        "Decoded user image {}x{}",
        user_image.width(),
        user_image.height()
    );

    let placed = compositor::place_on_frame(&user_image, frame, padding)?;
    let merged = compositor::merge_with_frame(&placed, frame);

    compositor::encode_png(&merged).map_err(PipelineError::Encode)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Clone, PartialEq)]
    pub enum Sent {
        Text(String),
        Document {
            file_name: String,
            bytes: Vec<u8>,
            caption: String,
        },
    }

    /// In-memory transport that records outbound calls.
    pub struct FakeTransport {
        pub file_url: Option<String>,
        pub sent: Mutex<Vec<Sent>>,
        pub resolved: Mutex<Vec<String>>,
    }

    impl FakeTransport {
        pub fn new(file_url: Option<String>) -> Self {
            Self {
                file_url,
                sent: Mutex::new(Vec::new()),
                resolved: Mutex::new(Vec::new()),
            }
        }

        pub fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        pub fn resolved(&self) -> Vec<String> {
            self.resolved.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatTransport for FakeTransport {
        async fn send_text(&self, _chat_id: ChatId, text: &str) -> Result<()> {
            self.sent.lock().unwrap().push(Sent::Text(text.to_string()));
            Ok(())
        }

        async fn send_document(
            &self,
            _chat_id: ChatId,
            file_name: &str,
            bytes: Vec<u8>,
            caption: &str,
        ) -> Result<()> {
            self.sent.lock().unwrap().push(Sent::Document {
                file_name: file_name.to_string(),
                bytes,
                caption: caption.to_string(),
            });
            Ok(())
        }

        async fn resolve_file_url(&self, file_id: &str) -> Result<String> {
            self.resolved.lock().unwrap().push(file_id.to_string());
            self.file_url
                .clone()
                .ok_or_else(|| anyhow!("file {file_id} not found"))
        }
    }

    pub fn test_pipeline(server: &MockServer) -> Pipeline {
        let frame_source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            60,
            60,
            Rgba([0, 0, 0, 0]),
        ));
        let api_client = ApiClient::new(
            format!("{}/v1.0/removebg", server.uri()),
            "test-key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        Pipeline::new(Frame::from_image(&frame_source, 60), 10, api_client)
    }

    fn photo() -> PhotoVariant {
        PhotoVariant {
            file_id: "photo-large".to_string(),
            width: 40,
            height: 20,
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        RgbaImage::from_pixel(width, height, Rgba([10, 200, 30, 255]))
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[tokio::test]
    async fn malformed_photo_reports_decode_error_and_skips_removal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file/photo.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"definitely not an image".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1.0/removebg"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let transport = FakeTransport::new(Some(format!("{}/file/photo.jpg", server.uri())));
        let pipeline = test_pipeline(&server);

        pipeline.process_photo(&transport, ChatId(42), &photo()).await;

        assert_eq!(
            transport.sent(),
            vec![Sent::Text(messages::DECODE_FAILED.to_string())]
        );
    }

    #[tokio::test]
    async fn successful_run_sends_notice_then_document() {
        let server = MockServer::start().await;
        let processed = b"processed-png".to_vec();

        Mock::given(method("GET"))
            .and(path("/file/photo.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(40, 20)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1.0/removebg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(processed.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let transport = FakeTransport::new(Some(format!("{}/file/photo.png", server.uri())));
        let pipeline = test_pipeline(&server);

        pipeline.process_photo(&transport, ChatId(7), &photo()).await;

        assert_eq!(transport.resolved(), vec!["photo-large".to_string()]);
        assert_eq!(
            transport.sent(),
            vec![
                Sent::Text(messages::PROCESSING.to_string()),
                Sent::Document {
                    file_name: messages::RESULT_FILE_NAME.to_string(),
                    bytes: processed,
                    caption: messages::RESULT_CAPTION.to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn link_resolution_failure_stops_before_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let transport = FakeTransport::new(None);
        let pipeline = test_pipeline(&server);

        pipeline.process_photo(&transport, ChatId(1), &photo()).await;

        assert_eq!(
            transport.sent(),
            vec![Sent::Text(messages::LINK_FAILED.to_string())]
        );
    }

    #[tokio::test]
    async fn failed_download_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let transport = FakeTransport::new(Some(format!("{}/file/gone.jpg", server.uri())));
        let pipeline = test_pipeline(&server);

        pipeline.process_photo(&transport, ChatId(1), &photo()).await;

        assert_eq!(
            transport.sent(),
            vec![Sent::Text(messages::DOWNLOAD_FAILED.to_string())]
        );
    }

    #[tokio::test]
    async fn removal_failure_sends_no_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(8, 8)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_string(
                r#"{"errors":[{"title":"Insufficient credits","code":"insufficient_credits"}]}"#,
            ))
            .mount(&server)
            .await;

        let transport = FakeTransport::new(Some(format!("{}/file/photo.png", server.uri())));
        let pipeline = test_pipeline(&server);

        pipeline.process_photo(&transport, ChatId(1), &photo()).await;

        assert_eq!(
            transport.sent(),
            vec![
                Sent::Text(messages::PROCESSING.to_string()),
                Sent::Text(messages::REMOVAL_FAILED.to_string()),
            ]
        );
    }

    #[test]
    fn rendered_png_has_frame_dimensions() {
        let frame = Frame::from_image(
            &DynamicImage::ImageRgba8(RgbaImage::from_pixel(30, 30, Rgba([0, 0, 0, 0]))),
            50,
        );

        let png = render_framed_png(&png_bytes(64, 16), &frame, 5).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();

        assert_eq!((decoded.width(), decoded.height()), (50, 50));
    }

    #[test]
    fn insufficient_frame_maps_to_composition_message() {
        let frame = Frame::from_image(
            &DynamicImage::ImageRgba8(RgbaImage::new(10, 10)),
            10,
        );

        let err = render_framed_png(&png_bytes(4, 4), &frame, 5).unwrap_err();

        assert!(matches!(err, PipelineError::Composition(_)));
        assert_eq!(err.user_message(), messages::COMPOSITION_FAILED);
    }
}
