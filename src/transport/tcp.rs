use std::io::ErrorKind;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::common::SessionError;
use crate::protocol::{Message, MessageKind};
use crate::transport::Transport;

/// Default timeout for a single send or receive (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum frame size (10 MB) to prevent excessive memory allocation.
const MAX_MESSAGE_SIZE: u32 = 10_000_000;

/// Length-prefixed bincode frames over a TCP stream. A single stream
/// carries every kind, so each received frame is checked against the kind
/// the caller is waiting for.
pub struct TcpTransport {
    stream: TcpStream,
    timeout_duration: Duration,
    max_message_size: u32,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_timeout(stream, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(stream: TcpStream, timeout_duration: Duration) -> Self {
        Self {
            stream,
            timeout_duration,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }

    async fn read_frame(&mut self) -> anyhow::Result<Message> {
        let mut len_buf = [0u8; 4];
        self.stream.read_exact(&mut len_buf).await.map_err(read_error)?;

        let len = u32::from_be_bytes(len_buf);
        if len > self.max_message_size {
            return Err(anyhow::anyhow!(
                "Message too large: {} bytes (max: {})",
                len,
                self.max_message_size
            ));
        }
        if len == 0 {
            return Err(anyhow::anyhow!("Invalid message length: 0"));
        }

        let mut buf = vec![0u8; len as usize];
        self.stream.read_exact(&mut buf).await.map_err(read_error)?;
        bincode::deserialize(&buf).map_err(|e| anyhow::anyhow!("Deserialization error: {}", e))
    }
}

fn read_error(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        ErrorKind::UnexpectedEof => anyhow::anyhow!("Connection closed by peer"),
        ErrorKind::ConnectionReset => anyhow::anyhow!("Connection reset by peer"),
        _ => anyhow::anyhow!("Read error: {}", e),
    }
}

fn write_error(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset => {
            anyhow::anyhow!("Connection closed by peer")
        }
        _ => anyhow::anyhow!("Write error: {}", e),
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        let data =
            bincode::serialize(&msg).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?;
        if data.len() as u64 > u64::from(self.max_message_size) {
            return Err(anyhow::anyhow!(
                "Message too large: {} bytes (max: {})",
                data.len(),
                self.max_message_size
            ));
        }

        let limit = self.timeout_duration;
        let send_op = async {
            let len = (data.len() as u32).to_be_bytes();
            self.stream.write_all(&len).await.map_err(write_error)?;
            self.stream.write_all(&data).await.map_err(write_error)?;
            anyhow::Ok(())
        };
        timeout(limit, send_op)
            .await
            .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", limit))?
    }

    async fn recv_any(&mut self, kinds: &[MessageKind]) -> anyhow::Result<Message> {
        let limit = self.timeout_duration;
        let msg = timeout(limit, self.read_frame())
            .await
            .map_err(|_| anyhow::anyhow!("Receive timeout after {:?}", limit))??;
        if !kinds.contains(&msg.kind()) {
            let expected = kinds
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(SessionError::desync(expected, msg.kind()).into());
        }
        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn connected_pair() -> (TcpTransport, TcpTransport) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (client, accepted) = tokio::join!(TcpTransport::connect(addr), listener.accept());
        let (stream, _) = accepted.unwrap();
        (client.unwrap(), TcpTransport::new(stream))
    }

    #[tokio::test]
    async fn frames_round_trip() {
        let (mut a, mut b) = connected_pair().await;
        a.send(Message::TurnSync { turn: 12 }).await.unwrap();
        assert_eq!(
            b.recv(MessageKind::TurnSync).await.unwrap(),
            Message::TurnSync { turn: 12 }
        );
    }

    #[tokio::test]
    async fn unexpected_kind_is_a_desync() {
        let (mut a, mut b) = connected_pair().await;
        a.send(Message::Stop).await.unwrap();
        let err = b.recv(MessageKind::ShotOutcome).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::ProtocolDesynchronization { .. })
        ));
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (raw, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
        let mut raw = raw.unwrap();
        let mut t = TcpTransport::new(accepted.unwrap().0);
        raw.write_all(&(MAX_MESSAGE_SIZE + 1).to_be_bytes()).await.unwrap();
        let err = t.recv(MessageKind::Stop).await.unwrap_err();
        assert!(err.to_string().contains("too large"));
    }
}
