//! Keep-alive loop: heartbeats, control frames and event dispatch.

use std::time::Instant;

use super::{Engine, Readiness};
use crate::codec::{Packet, ProtocolVersion, SocketPacket, TransportPacket};
use crate::error::Result;
use crate::protocol::{Frame, OpCode};

impl Engine {
    /// Run until the connection ends.
    ///
    /// Each iteration sends a heartbeat if one is due, then waits up to
    /// `options.poll_timeout` for a frame. Server pings are answered and
    /// events are dispatched to the registered handlers. The loop returns
    /// `Ok` when the server closes the connection or [`Engine::close`] has
    /// dropped the socket; it has no other exit.
    pub async fn keep_alive(&mut self) -> Result<()> {
        tracing::debug!(engine = self.name(), "keep-alive started");

        while self.is_connected() {
            self.heartbeat_if_due().await?;

            match self.wait_readable().await? {
                Readiness::Idle => continue,
                Readiness::Eof => {
                    self.drop_socket("peer closed the connection");
                    break;
                }
                Readiness::Ready => {}
            }

            let frame = self.next_frame().await?;
            self.handle_frame(frame).await?;
        }

        tracing::debug!(engine = self.name(), "keep-alive finished");
        Ok(())
    }

    async fn heartbeat_if_due(&mut self) -> Result<()> {
        let due = match self.session.as_mut() {
            Some(session) => session.needs_heartbeat(Instant::now()),
            None => false,
        };

        if due {
            tracing::debug!(engine = self.name(), "heartbeat");
            self.write_packet(TransportPacket::Ping, "").await?;
        }
        Ok(())
    }

    async fn handle_frame(&mut self, frame: Frame) -> Result<()> {
        match frame.opcode() {
            OpCode::Text => self.handle_packet(&frame.text()).await,
            OpCode::Ping => self.write_frame(OpCode::Pong, frame.payload()).await,
            OpCode::Close => {
                self.drop_socket("close frame received");
                Ok(())
            }
            other => {
                tracing::trace!(opcode = ?other, len = frame.payload_len(), "ignored frame");
                Ok(())
            }
        }
    }

    async fn handle_packet(&mut self, raw: &str) -> Result<()> {
        let packet = match self.decode(raw) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::warn!(engine = self.name(), error = %e, packet = raw, "undecodable packet");
                return Ok(());
            }
        };

        match (self.version, packet.kind) {
            // 0.x servers send heartbeats and expect them echoed.
            (ProtocolVersion::V0, TransportPacket::Ping) => {
                self.write_packet(TransportPacket::Ping, "").await
            }
            (_, TransportPacket::Ping) => {
                self.write_packet(TransportPacket::Pong, &packet.data).await
            }
            (_, TransportPacket::Close) if packet.namespace.is_empty() => {
                self.drop_socket("close packet received");
                Ok(())
            }
            (ProtocolVersion::V0, TransportPacket::Close) => {
                self.namespaces.remove(&packet.namespace);
                Ok(())
            }
            (_, TransportPacket::Message) if packet.inner == Some(SocketPacket::Disconnect) => {
                self.namespaces.remove(&packet.namespace);
                Ok(())
            }
            _ if packet.is_event() => {
                self.dispatch(&packet).await;
                Ok(())
            }
            _ => {
                tracing::trace!(packet = raw, "ignored packet");
                Ok(())
            }
        }
    }

    async fn dispatch(&self, packet: &Packet) {
        let event = match packet.event() {
            Ok(Some(event)) => event,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, data = %packet.data, "malformed event");
                return;
            }
        };

        let ran = self.handlers.dispatch(&event).await;
        tracing::debug!(event = %event.name, namespace = %event.namespace, handlers = ran, "event");
    }
}
