use crate::protocol::{Message, MessageKind};

/// One end of a reliable, ordered link between two roles.
///
/// Receives name the kind they expect. A transport either keeps a
/// separate lane per kind, or checks the kind of each arriving message
/// and reports a mismatch as a protocol desynchronization.
#[async_trait::async_trait]
pub trait Transport: Send {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()>;

    /// Wait for the next message whose kind is one of `kinds`.
    async fn recv_any(&mut self, kinds: &[MessageKind]) -> anyhow::Result<Message>;

    async fn recv(&mut self, kind: MessageKind) -> anyhow::Result<Message> {
        self.recv_any(&[kind]).await
    }
}

pub mod in_memory;
pub mod tcp;

pub use in_memory::InMemoryTransport;
pub use tcp::TcpTransport;
