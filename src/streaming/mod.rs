//! Transcoder output as HTTP responses.
//!
//! Each request spawns its own transcoder. Its stdout becomes the response
//! body chunk by chunk; the body stream owns the process, so when the client
//! goes away axum drops the body and the transcoder is terminated.
//!
//! The first chunk is read before the response is built. A transcoder that
//! fails before producing any output therefore turns into a 500 instead of an
//! empty 200.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use dashreel_av::{ChunkedStreamer, ProcessSupervisor, TranscodePipeline};
use futures::stream::{self, StreamExt};

use crate::server::{AppContext, FootageError};

pub const MP4_CONTENT_TYPE: &str = "video/mp4";

/// Spawn `pipeline` and stream its output as `video/mp4`.
///
/// `chunk_size` is the client's requested chunk size, clamped to the
/// configured bounds. `download_name` sets an inline `Content-Disposition`
/// filename.
pub async fn stream_pipeline(
    ctx: &AppContext,
    pipeline: TranscodePipeline,
    chunk_size: Option<usize>,
    download_name: Option<String>,
) -> Result<Response, FootageError> {
    let streaming = &ctx.config.streaming;
    let pipeline = pipeline.with_chunk_size(streaming.chunk_size(chunk_size));
    let chunk_size = pipeline.chunk_size();

    let process = ProcessSupervisor::new(streaming.supervisor())
        .with_cancel_token(ctx.shutdown.child_token())
        .start(pipeline)?;

    let mut streamer = ChunkedStreamer::new(process, chunk_size);
    let first = streamer.next_chunk().await?;
    let body = stream::iter(first.map(Ok)).chain(streamer.into_stream());

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, MP4_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-store");
    if let Some(name) = download_name {
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", name),
        );
    }

    builder
        .body(Body::from_stream(body))
        .map_err(|e| FootageError::internal(format!("Failed to build response: {e}")))
}
