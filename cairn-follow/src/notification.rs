use crate::error::{FollowError, TransportError};
use async_trait::async_trait;
use num_enum::TryFromPrimitive;
use serde::Deserialize;
use std::fmt;

/// Topics published by the chain source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// serialized transaction, on mempool entry and on confirmation
    RawTx,
    /// transaction id, published alongside `rawtx`
    HashTx,
    /// serialized block
    RawBlock,
    /// mempool and chain changes
    Sequence,
}

impl Topic {
    /// Every topic the follower subscribes to
    pub const ALL: [Topic; 4] = [Topic::RawTx, Topic::HashTx, Topic::RawBlock, Topic::Sequence];

    /// Topic name on the wire
    pub const fn as_str(&self) -> &'static str {
        match self {
            Topic::RawTx => "rawtx",
            Topic::HashTx => "hashtx",
            Topic::RawBlock => "rawblock",
            Topic::Sequence => "sequence",
        }
    }

    /// Topic of a wire name
    pub fn from_wire(name: &[u8]) -> Option<Topic> {
        Topic::ALL
            .into_iter()
            .find(|topic| topic.as_str().as_bytes() == name)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A received notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// topic
    pub topic: Topic,
    /// topic dependent body
    pub payload: Vec<u8>,
    /// per-topic publication counter
    pub sequence: u32,
}

impl Notification {
    /// Decodes a `[topic, body, sequence]` multipart message, the sequence
    /// being a little-endian `u32`
    pub fn from_multipart(parts: &[Vec<u8>]) -> Result<Self, TransportError> {
        let [topic, payload, sequence] = parts else {
            return Err(TransportError::Malformed(format!(
                "expected 3 message parts, got {}",
                parts.len()
            )));
        };
        let topic = Topic::from_wire(topic).ok_or_else(|| {
            TransportError::Malformed(format!("unknown topic {}", String::from_utf8_lossy(topic)))
        })?;
        let sequence: [u8; 4] = sequence.as_slice().try_into().map_err(|_| {
            TransportError::Malformed(format!("invalid sequence length {}", sequence.len()))
        })?;
        Ok(Notification {
            topic,
            payload: payload.clone(),
            sequence: u32::from_le_bytes(sequence),
        })
    }
}

/// Label of a `sequence` notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum SequenceLabel {
    /// transaction added to the mempool
    MempoolAdd = b'A',
    /// transaction removed from the mempool
    MempoolRemove = b'R',
    /// block connected
    BlockConnect = b'C',
    /// block disconnected
    BlockDisconnect = b'D',
}

/// Decoded body of a `sequence` notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceEvent {
    /// transaction or block id, hex encoded
    pub hash: String,
    /// what happened
    pub label: SequenceLabel,
    /// mempool sequence, present for `A` and `R`
    pub mempool_sequence: Option<u64>,
}

impl SequenceEvent {
    /// Decodes `<32-byte hash><label>[<8-byte LE mempool sequence>]`
    pub fn parse(body: &[u8]) -> Result<Self, TransportError> {
        if body.len() < 33 {
            return Err(TransportError::Malformed(format!(
                "sequence body too short ({} bytes)",
                body.len()
            )));
        }
        let label = SequenceLabel::try_from(body[32]).map_err(|_| {
            TransportError::Malformed(format!("unknown sequence label {:#04x}", body[32]))
        })?;
        let mempool_sequence = match &body[33..] {
            [] => None,
            rest => {
                let bytes: [u8; 8] = rest.try_into().map_err(|_| {
                    TransportError::Malformed(format!(
                        "invalid mempool sequence length {}",
                        rest.len()
                    ))
                })?;
                Some(u64::from_le_bytes(bytes))
            }
        };
        Ok(SequenceEvent {
            hash: hex::encode(&body[..32]),
            label,
            mempool_sequence,
        })
    }
}

/// Address a topic is published on
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotificationEndpoint {
    /// topic
    pub topic: Topic,
    /// publisher address
    pub address: String,
}

/// Checks that every topic is published and that the mempool topics share one address
pub fn validate_endpoints(endpoints: &[NotificationEndpoint]) -> Result<(), FollowError> {
    if endpoints.is_empty() {
        return Err(FollowError::Endpoints(
            "notifications are not enabled on the chain source".to_string(),
        ));
    }
    let address_of = |topic: Topic| {
        endpoints
            .iter()
            .find(|endpoint| endpoint.topic == topic)
            .map(|endpoint| endpoint.address.as_str())
    };
    let missing: Vec<&str> = Topic::ALL
        .into_iter()
        .filter(|topic| address_of(*topic).is_none())
        .map(|topic| topic.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(FollowError::Endpoints(format!(
            "notifications are incorrectly configured, missing topics: {}",
            missing.join(", ")
        )));
    }
    let mempool_addresses = [Topic::RawTx, Topic::HashTx, Topic::Sequence].map(address_of);
    if mempool_addresses
        .iter()
        .any(|address| *address != mempool_addresses[0])
    {
        return Err(FollowError::Endpoints(
            "rawtx, hashtx and sequence notifications must use the same address".to_string(),
        ));
    }
    Ok(())
}

/// Subscription to the notifications of the chain source
#[cfg_attr(any(test, feature = "test-exports"), mockall::automock)]
#[async_trait]
pub trait NotificationSubscriber: Send {
    /// Published topics and their addresses
    fn endpoints(&self) -> Vec<NotificationEndpoint>;

    /// Opens the subscription to every topic
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Next notification. `TransportError::NoMessage` when none is available yet.
    async fn recv(&mut self) -> Result<Notification, TransportError>;

    /// Closes the subscription
    async fn disconnect(&mut self);
}
