use std::future::poll_fn;
use std::task::Poll;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::common::SessionError;
use crate::protocol::{Message, MessageKind};
use crate::transport::Transport;

/// In-process link with one FIFO lane per message kind in each direction.
/// Lanes are indexed by [`MessageKind::index`].
pub struct InMemoryTransport {
    tx: Vec<UnboundedSender<Message>>,
    rx: Vec<UnboundedReceiver<Message>>,
}

impl InMemoryTransport {
    pub fn pair() -> (Self, Self) {
        let (tx1, rx2) = lanes();
        let (tx2, rx1) = lanes();
        (Self { tx: tx1, rx: rx1 }, Self { tx: tx2, rx: rx2 })
    }
}

fn lanes() -> (Vec<UnboundedSender<Message>>, Vec<UnboundedReceiver<Message>>) {
    MessageKind::ALL.iter().map(|_| unbounded_channel()).unzip()
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        let kind = msg.kind();
        self.tx[kind.index()]
            .send(msg)
            .map_err(|_| SessionError::ChannelClosed(kind.as_str()))?;
        Ok(())
    }

    async fn recv_any(&mut self, kinds: &[MessageKind]) -> anyhow::Result<Message> {
        let lanes = &mut self.rx;
        let msg = poll_fn(|cx| {
            let mut open = false;
            for &kind in kinds {
                match lanes[kind.index()].poll_recv(cx) {
                    Poll::Ready(Some(msg)) => return Poll::Ready(Some(msg)),
                    Poll::Ready(None) => {}
                    Poll::Pending => open = true,
                }
            }
            if open {
                Poll::Pending
            } else {
                Poll::Ready(None)
            }
        })
        .await;
        let kind = kinds.first().copied().unwrap_or(MessageKind::Stop);
        msg.ok_or_else(|| SessionError::ChannelClosed(kind.as_str()).into())
    }
}
