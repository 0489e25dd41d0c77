//! Codec module - Engine.IO / Socket.IO packet grammars.
//!
//! Each protocol generation has its own string grammar carried inside
//! WebSocket text frames:
//!
//! - [`V0Codec`] - Socket.IO 0.x, colon delimited `type:id:endpoint:data`
//! - [`V1Codec`] - Socket.IO 1.x/2.x, Engine.IO type digit wrapping a
//!   Socket.IO packet with an optional `/namespace,` prefix
//!
//! # Design
//!
//! Codecs are implemented as marker structs with static methods. The
//! engine picks one from its [`ProtocolVersion`] and never mixes them.
//!
//! # Example
//!
//! ```
//! use socketio_ws_client::codec::{TransportPacket, V0Codec, V1Codec};
//!
//! assert_eq!(V0Codec::encode(TransportPacket::Ping, "", "").unwrap(), "2:::");
//! assert_eq!(V1Codec::encode(TransportPacket::Ping, "").unwrap(), "2");
//! ```

mod packet;
mod types;
mod v0;
mod v1;

pub use packet::{Event, Packet};
pub use types::{ProtocolVersion, SocketPacket, TransportPacket};
pub use v0::V0Codec;
pub use v1::{is_default_namespace, normalize_namespace, V1Codec};
