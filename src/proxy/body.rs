//! Streaming relay of upstream bodies.
//!
//! The upstream body is never buffered as a whole: chunks flow from the
//! upstream connection straight into the response body. Dropping the stream
//! (for example when the caller disconnects) drops the upstream connection.

use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use thiserror::Error;
use tracing::warn;

/// Boxed byte stream handed to the response body
pub type ByteStream = BoxStream<'static, Result<Bytes, BodyError>>;

/// Errors that end a relayed body early
#[derive(Error, Debug)]
pub enum BodyError {
    #[error("upstream body read failed: {0}")]
    Upstream(Box<dyn std::error::Error + Send + Sync>),

    #[error("upstream body exceeded {0} bytes")]
    TooLarge(u64),
}

/// Wraps `stream` so that at most `max_bytes` are relayed.
///
/// A `max_bytes` of 0 disables the cap. The first error ends the stream.
pub fn limit_body<S, E>(stream: S, max_bytes: u64) -> ByteStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    stream
        .scan((0u64, false), move |(relayed, failed), chunk| {
            if *failed {
                return futures::future::ready(None);
            }

            let item = match chunk {
                Ok(bytes) => {
                    *relayed += bytes.len() as u64;
                    if max_bytes > 0 && *relayed > max_bytes {
                        warn!("Upstream body cut off after exceeding {} bytes", max_bytes);
                        *failed = true;
                        Err(BodyError::TooLarge(max_bytes))
                    } else {
                        Ok(bytes)
                    }
                }
                Err(e) => {
                    warn!("Upstream body read failed: {}", e);
                    *failed = true;
                    Err(BodyError::Upstream(Box::new(e)))
                }
            };

            futures::future::ready(Some(item))
        })
        .boxed()
}
