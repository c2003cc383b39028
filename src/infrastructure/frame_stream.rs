// Chunked frame streaming utilities
use crate::domain::draw::Frame;
use async_compression::tokio::bufread::BrotliEncoder;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::watch;

/// Create a chunked frame streaming response
pub fn chunked_frame_stream<S>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = Arc<Frame>> + Send + 'static,
{
    let byte_stream = stream.then(move |frame| async move { serialize_chunk(&frame, compress).await });

    // Chunks are compressed one by one, so no Content-Encoding header: the
    // client has to undo the length framing before decompressing.
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-overlay-frames")
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// One chunk: 4 byte big-endian length, then the JSON frame, Brotli
/// compressed when requested.
pub async fn serialize_chunk(frame: &Frame, compress: bool) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(frame).map_err(std::io::Error::other)?;

    let payload = if compress {
        let mut encoder = BrotliEncoder::new(std::io::Cursor::new(json));
        let mut compressed = Vec::new();
        encoder.read_to_end(&mut compressed).await?;
        compressed
    } else {
        json
    };

    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(payload.len() as u32);
    chunk.put_slice(&payload);
    Ok(chunk.freeze())
}

/// Streams the current frame, then every newer one until the publisher is
/// dropped. Frames published faster than the client reads are skipped.
pub fn stream_from_watch(mut rx: watch::Receiver<Arc<Frame>>, compress: bool) -> impl IntoResponse {
    let stream = async_stream::stream! {
        loop {
            let frame = rx.borrow_and_update().clone();
            yield frame;
            if rx.changed().await.is_err() {
                break;
            }
        }
    };

    match chunked_frame_stream(stream, compress) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
