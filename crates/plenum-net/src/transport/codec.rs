//! Wire framing and typed encode/decode over a TCP stream.
//!
//! # Wire Protocol
//!
//! A request is written as a kind tag followed by a length-prefixed JSON
//! payload; the response to it is a bare length-prefixed payload, its
//! kind implied by the request:
//!
//! ```text
//! request:  [1-byte kind tag] [4-byte length as u32 big-endian] [JSON data]
//! response: [4-byte length as u32 big-endian] [JSON data]
//! ```
//!
//! Every read and write is bounded by the transport's configured I/O
//! timeout. Any failure leaves the stream position untrustworthy, so
//! callers must discard the connection afterwards.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::protocol::{MessageKind, Request, Response, Result, TransportError};

/// Maximum frame payload size (100 MB). Checked before allocating the
/// receive buffer.
const MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

/// Encode and write one request: kind tag, then the framed payload.
pub(crate) async fn write_request(
    stream: &mut TcpStream,
    request: &Request,
    timeout: Duration,
) -> Result<()> {
    let payload = match request {
        Request::Sync(req) => serde_json::to_vec(req)?,
        Request::EagerSync(req) => serde_json::to_vec(req)?,
        Request::FastForward(req) => serde_json::to_vec(req)?,
    };

    bounded(
        timeout,
        stream.write_all(&[request.kind().as_u8()]),
        "writing kind tag",
    )
    .await?;
    write_frame(stream, &payload, timeout).await
}

/// Read the kind tag, then decode the matching request value.
pub(crate) async fn read_request(stream: &mut TcpStream, timeout: Duration) -> Result<Request> {
    let mut tag = [0u8; 1];
    bounded(timeout, stream.read_exact(&mut tag), "reading kind tag").await?;
    let kind = MessageKind::try_from(tag[0])?;

    let payload = read_frame(stream, timeout).await?;
    let request = match kind {
        MessageKind::Sync => Request::Sync(serde_json::from_slice(&payload)?),
        MessageKind::EagerSync => Request::EagerSync(serde_json::from_slice(&payload)?),
        MessageKind::FastForward => Request::FastForward(serde_json::from_slice(&payload)?),
    };

    Ok(request)
}

/// Encode and write one response frame. The kind is not written; the
/// remote decodes by the kind of the request it just sent.
pub(crate) async fn write_response(
    stream: &mut TcpStream,
    response: &Response,
    timeout: Duration,
) -> Result<()> {
    let payload = match response {
        Response::Sync(resp) => serde_json::to_vec(resp)?,
        Response::EagerSync(resp) => serde_json::to_vec(resp)?,
        Response::FastForward(resp) => serde_json::to_vec(resp)?,
    };

    write_frame(stream, &payload, timeout).await
}

/// Read one response frame and decode it as the expected kind.
pub(crate) async fn read_response(
    stream: &mut TcpStream,
    expected: MessageKind,
    timeout: Duration,
) -> Result<Response> {
    let payload = read_frame(stream, timeout).await?;
    let response = match expected {
        MessageKind::Sync => Response::Sync(serde_json::from_slice(&payload)?),
        MessageKind::EagerSync => Response::EagerSync(serde_json::from_slice(&payload)?),
        MessageKind::FastForward => Response::FastForward(serde_json::from_slice(&payload)?),
    };

    Ok(response)
}

/// Write a length-prefixed frame and flush it.
async fn write_frame(stream: &mut TcpStream, data: &[u8], timeout: Duration) -> Result<()> {
    let len = data.len() as u32;

    bounded(
        timeout,
        stream.write_all(&len.to_be_bytes()),
        "writing length prefix",
    )
    .await?;
    bounded(timeout, stream.write_all(data), "writing frame data").await?;
    bounded(timeout, stream.flush(), "flushing stream").await?;

    Ok(())
}

/// Read a length-prefixed frame, validating the length before allocating.
async fn read_frame(stream: &mut TcpStream, timeout: Duration) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    bounded(
        timeout,
        stream.read_exact(&mut len_buf),
        "reading length prefix",
    )
    .await?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(TransportError::Protocol(format!(
            "frame too large: {} bytes (max {} bytes)",
            len, MAX_MESSAGE_SIZE
        )));
    }

    let mut buf = vec![0u8; len];
    bounded(timeout, stream.read_exact(&mut buf), "reading frame data").await?;

    Ok(buf)
}

/// Run one I/O operation under the configured timeout.
async fn bounded<F, T>(timeout: Duration, op: F, context: &str) -> Result<T>
where
    F: Future<Output = std::io::Result<T>>,
{
    match tokio::time::timeout(timeout, op).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(map_io_error(err, context, timeout)),
        Err(_) => Err(TransportError::Timeout(timeout.as_millis() as u64)),
    }
}

/// Map IO errors to transport error variants: timeouts and would-blocks
/// become `Timeout`, lost connections become `Connection`, the rest stay
/// `Io`.
fn map_io_error(err: std::io::Error, context: &str, timeout: Duration) -> TransportError {
    match err.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
            TransportError::Timeout(timeout.as_millis() as u64)
        }
        std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::ConnectionAborted
        | std::io::ErrorKind::NotConnected => {
            TransportError::Connection(format!("{}: connection lost", context))
        }
        _ => TransportError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{
        EagerSyncRequest, EagerSyncResponse, FastForwardRequest, SyncRequest, SyncResponse,
    };
    use plenum_hashgraph::{WireBody, WireEvent};
    use std::collections::BTreeMap;
    use tokio::net::TcpListener;

    const TIMEOUT: Duration = Duration::from_secs(1);

    /// A connected (client, server) socket pair on the loopback.
    async fn stream_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (client, server)
    }

    fn sample_wire_event() -> WireEvent {
        WireEvent {
            body: WireBody {
                transactions: None,
                self_parent_index: 1,
                other_parent_creator_id: 10,
                other_parent_index: 0,
                creator_id: 9,
            },
        }
    }

    #[tokio::test]
    async fn sync_request_round_trip() {
        let (mut client, mut server) = stream_pair().await;

        let request = Request::Sync(SyncRequest {
            from: "A".to_string(),
            known: BTreeMap::from([(0, 1), (1, 2), (2, 3)]),
        });

        write_request(&mut client, &request, TIMEOUT).await.unwrap();
        let decoded = read_request(&mut server, TIMEOUT).await.unwrap();

        assert_eq!(request, decoded);
    }

    #[tokio::test]
    async fn eager_sync_request_keeps_nil_transactions() {
        let (mut client, mut server) = stream_pair().await;

        let request = Request::EagerSync(EagerSyncRequest {
            from: "A".to_string(),
            events: vec![sample_wire_event()],
        });

        write_request(&mut client, &request, TIMEOUT).await.unwrap();
        let decoded = read_request(&mut server, TIMEOUT).await.unwrap();

        assert_eq!(request, decoded);
        match decoded {
            Request::EagerSync(req) => assert_eq!(req.events[0].body.transactions, None),
            other => panic!("wrong kind decoded: {:?}", other.kind()),
        }
    }

    #[tokio::test]
    async fn response_round_trip_by_expected_kind() {
        let (mut client, mut server) = stream_pair().await;

        let response = Response::Sync(SyncResponse {
            from: "B".to_string(),
            events: vec![sample_wire_event()],
            known: BTreeMap::from([(0, 5), (1, 5), (2, 6)]),
        });

        write_response(&mut server, &response, TIMEOUT)
            .await
            .unwrap();
        let decoded = read_response(&mut client, MessageKind::Sync, TIMEOUT)
            .await
            .unwrap();

        assert_eq!(response, decoded);
    }

    #[tokio::test]
    async fn eager_sync_response_round_trip() {
        let (mut client, mut server) = stream_pair().await;

        let response = Response::EagerSync(EagerSyncResponse { success: true });

        write_response(&mut server, &response, TIMEOUT)
            .await
            .unwrap();
        let decoded = read_response(&mut client, MessageKind::EagerSync, TIMEOUT)
            .await
            .unwrap();

        assert_eq!(response, decoded);
    }

    #[tokio::test]
    async fn unknown_tag_fails_decode() {
        let (mut client, mut server) = stream_pair().await;

        client.write_all(&[0x7f]).await.unwrap();
        client.write_all(&4u32.to_be_bytes()).await.unwrap();
        client.write_all(b"null").await.unwrap();

        let err = read_request(&mut server, TIMEOUT).await.unwrap_err();
        assert!(matches!(err, TransportError::Protocol(_)));
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected_before_allocation() {
        let (mut client, mut server) = stream_pair().await;

        let request = Request::FastForward(FastForwardRequest {
            from: "A".to_string(),
        });
        client
            .write_all(&[request.kind().as_u8()])
            .await
            .unwrap();
        client
            .write_all(&(u32::MAX).to_be_bytes())
            .await
            .unwrap();

        let err = read_request(&mut server, TIMEOUT).await.unwrap_err();
        assert!(matches!(err, TransportError::Protocol(_)));
    }

    #[tokio::test]
    async fn truncated_frame_times_out() {
        let (mut client, mut server) = stream_pair().await;

        // Announce more bytes than will ever arrive.
        client.write_all(&[MessageKind::Sync.as_u8()]).await.unwrap();
        client.write_all(&64u32.to_be_bytes()).await.unwrap();
        client.write_all(b"{").await.unwrap();

        let err = read_request(&mut server, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }
}
