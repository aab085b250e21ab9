//! Message types and enums

use crate::ProtocolError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire tag identifying a message variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    /// Data addressed to every subscriber of a feed/topic
    MulticastData = 0,
    /// Data addressed to a single client
    UnicastData = 1,
    /// A subscription change relayed to a notification listener
    ForwardedSubscriptionRequest = 2,
    /// Register or drop interest in subscription changes on a feed
    NotificationRequest = 3,
    /// Subscribe to or unsubscribe from a feed/topic
    SubscriptionRequest = 4,
    /// Register or drop a monitor on a feed
    MonitorRequest = 5,
}

impl MessageType {
    /// All message types in tag order
    pub const ALL: [MessageType; 6] = [
        Self::MulticastData,
        Self::UnicastData,
        Self::ForwardedSubscriptionRequest,
        Self::NotificationRequest,
        Self::SubscriptionRequest,
        Self::MonitorRequest,
    ];

    /// The tag byte written on the wire
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Whether frames of this type carry a serialized payload
    pub fn carries_data(self) -> bool {
        matches!(self, Self::MulticastData | Self::UnicastData)
    }
}

impl TryFrom<u8> for MessageType {
    type Error = ProtocolError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::MulticastData),
            1 => Ok(Self::UnicastData),
            2 => Ok(Self::ForwardedSubscriptionRequest),
            3 => Ok(Self::NotificationRequest),
            4 => Ok(Self::SubscriptionRequest),
            5 => Ok(Self::MonitorRequest),
            other => Err(ProtocolError::UnrecognizedMessageType(other)),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MulticastData => "multicast_data",
            Self::UnicastData => "unicast_data",
            Self::ForwardedSubscriptionRequest => "forwarded_subscription_request",
            Self::NotificationRequest => "notification_request",
            Self::SubscriptionRequest => "subscription_request",
            Self::MonitorRequest => "monitor_request",
        };
        f.write_str(name)
    }
}

/// A single feed bus message.
///
/// `D` is the payload type of the data variants. The wire codec works on raw
/// [`Bytes`]; a client hands out messages whose payload has been decoded into
/// an application value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message<D = Bytes> {
    /// Data published to every subscriber of a feed/topic
    MulticastData {
        /// Feed name
        feed: String,
        /// Topic within the feed
        topic: String,
        /// Whether the payload is a full snapshot rather than a delta
        is_image: bool,
        /// Payload
        payload: D,
    },

    /// Data sent to a single client
    UnicastData {
        /// Target (or originating) client identifier
        client_id: String,
        /// Feed name
        feed: String,
        /// Topic within the feed
        topic: String,
        /// Whether the payload is a full snapshot rather than a delta
        is_image: bool,
        /// Payload
        payload: D,
    },

    /// Subscription change made by another client, relayed by the broker
    ForwardedSubscriptionRequest {
        /// Client that changed its subscription
        client_id: String,
        /// Feed name
        feed: String,
        /// Topic within the feed
        topic: String,
        /// `true` for a subscribe, `false` for an unsubscribe
        is_add: bool,
    },

    /// Register or drop interest in subscription changes on a feed
    NotificationRequest {
        /// Feed name
        feed: String,
        /// `true` to register, `false` to drop
        is_add: bool,
    },

    /// Subscribe to or unsubscribe from a feed/topic
    SubscriptionRequest {
        /// Feed name
        feed: String,
        /// Topic within the feed
        topic: String,
        /// `true` to subscribe, `false` to unsubscribe
        is_add: bool,
    },

    /// Register or drop a monitor on a feed
    MonitorRequest {
        /// Feed name
        feed: String,
        /// `true` to register, `false` to drop
        is_add: bool,
    },
}

impl<D> Message<D> {
    /// Create a multicast data message
    pub fn multicast_data(
        feed: impl Into<String>,
        topic: impl Into<String>,
        is_image: bool,
        payload: D,
    ) -> Self {
        Self::MulticastData {
            feed: feed.into(),
            topic: topic.into(),
            is_image,
            payload,
        }
    }

    /// Create a unicast data message
    pub fn unicast_data(
        client_id: impl Into<String>,
        feed: impl Into<String>,
        topic: impl Into<String>,
        is_image: bool,
        payload: D,
    ) -> Self {
        Self::UnicastData {
            client_id: client_id.into(),
            feed: feed.into(),
            topic: topic.into(),
            is_image,
            payload,
        }
    }

    /// Create a forwarded subscription request
    pub fn forwarded_subscription_request(
        client_id: impl Into<String>,
        feed: impl Into<String>,
        topic: impl Into<String>,
        is_add: bool,
    ) -> Self {
        Self::ForwardedSubscriptionRequest {
            client_id: client_id.into(),
            feed: feed.into(),
            topic: topic.into(),
            is_add,
        }
    }

    /// Create a notification request
    pub fn notification_request(feed: impl Into<String>, is_add: bool) -> Self {
        Self::NotificationRequest {
            feed: feed.into(),
            is_add,
        }
    }

    /// Create a subscription request
    pub fn subscription_request(
        feed: impl Into<String>,
        topic: impl Into<String>,
        is_add: bool,
    ) -> Self {
        Self::SubscriptionRequest {
            feed: feed.into(),
            topic: topic.into(),
            is_add,
        }
    }

    /// Create a monitor request
    pub fn monitor_request(feed: impl Into<String>, is_add: bool) -> Self {
        Self::MonitorRequest {
            feed: feed.into(),
            is_add,
        }
    }

    /// Get the message type
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::MulticastData { .. } => MessageType::MulticastData,
            Self::UnicastData { .. } => MessageType::UnicastData,
            Self::ForwardedSubscriptionRequest { .. } => MessageType::ForwardedSubscriptionRequest,
            Self::NotificationRequest { .. } => MessageType::NotificationRequest,
            Self::SubscriptionRequest { .. } => MessageType::SubscriptionRequest,
            Self::MonitorRequest { .. } => MessageType::MonitorRequest,
        }
    }

    /// Get the feed every message is addressed by
    pub fn feed(&self) -> &str {
        match self {
            Self::MulticastData { feed, .. }
            | Self::UnicastData { feed, .. }
            | Self::ForwardedSubscriptionRequest { feed, .. }
            | Self::NotificationRequest { feed, .. }
            | Self::SubscriptionRequest { feed, .. }
            | Self::MonitorRequest { feed, .. } => feed,
        }
    }

    /// Get the topic, for the variants that carry one
    pub fn topic(&self) -> Option<&str> {
        match self {
            Self::MulticastData { topic, .. }
            | Self::UnicastData { topic, .. }
            | Self::ForwardedSubscriptionRequest { topic, .. }
            | Self::SubscriptionRequest { topic, .. } => Some(topic),
            Self::NotificationRequest { .. } | Self::MonitorRequest { .. } => None,
        }
    }

    /// Get the payload of a data message
    pub fn payload(&self) -> Option<&D> {
        match self {
            Self::MulticastData { payload, .. } | Self::UnicastData { payload, .. } => {
                Some(payload)
            }
            _ => None,
        }
    }

    /// Replace the payload of a data message with the result of `f`.
    ///
    /// Control messages are carried across unchanged and `f` is not called.
    pub fn try_map_payload<U, E, F>(self, f: F) -> Result<Message<U>, E>
    where
        F: FnOnce(D) -> Result<U, E>,
    {
        Ok(match self {
            Self::MulticastData { feed, topic, is_image, payload } => Message::MulticastData {
                feed,
                topic,
                is_image,
                payload: f(payload)?,
            },
            Self::UnicastData { client_id, feed, topic, is_image, payload } => {
                Message::UnicastData {
                    client_id,
                    feed,
                    topic,
                    is_image,
                    payload: f(payload)?,
                }
            }
            Self::ForwardedSubscriptionRequest { client_id, feed, topic, is_add } => {
                Message::ForwardedSubscriptionRequest { client_id, feed, topic, is_add }
            }
            Self::NotificationRequest { feed, is_add } => {
                Message::NotificationRequest { feed, is_add }
            }
            Self::SubscriptionRequest { feed, topic, is_add } => {
                Message::SubscriptionRequest { feed, topic, is_add }
            }
            Self::MonitorRequest { feed, is_add } => Message::MonitorRequest { feed, is_add },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_bijection() {
        for (index, message_type) in MessageType::ALL.iter().enumerate() {
            assert_eq!(message_type.tag() as usize, index);
            assert_eq!(MessageType::try_from(message_type.tag()).unwrap(), *message_type);
        }

        for tag in 6..=u8::MAX {
            assert!(matches!(
                MessageType::try_from(tag),
                Err(ProtocolError::UnrecognizedMessageType(t)) if t == tag
            ));
        }
    }

    #[test]
    fn test_constructors_set_type() {
        let messages: Vec<Message> = vec![
            Message::multicast_data("LSE", "VOD", true, Bytes::from_static(b"x")),
            Message::unicast_data("client", "LSE", "VOD", false, Bytes::new()),
            Message::forwarded_subscription_request("client", "LSE", "VOD", true),
            Message::notification_request("LSE", true),
            Message::subscription_request("LSE", "VOD", false),
            Message::monitor_request("LSE", true),
        ];

        let types: Vec<MessageType> = messages.iter().map(Message::message_type).collect();
        assert_eq!(types, MessageType::ALL.to_vec());
        assert!(messages.iter().all(|m| m.feed() == "LSE"));
    }

    #[test]
    fn test_accessors() {
        let data: Message = Message::unicast_data("c1", "LSE", "VOD", true, Bytes::from("abc"));
        assert_eq!(data.topic(), Some("VOD"));
        assert_eq!(data.payload().map(|p| p.len()), Some(3));
        assert!(data.message_type().carries_data());

        let monitor: Message = Message::monitor_request("LSE", false);
        assert_eq!(monitor.topic(), None);
        assert!(monitor.payload().is_none());
        assert!(!monitor.message_type().carries_data());
    }

    #[test]
    fn test_try_map_payload() {
        let data: Message = Message::multicast_data("LSE", "SBRY", true, Bytes::from("42"));
        let mapped: Message<u32> = data
            .try_map_payload(|bytes| std::str::from_utf8(&bytes).unwrap().parse())
            .unwrap();
        assert_eq!(mapped, Message::multicast_data("LSE", "SBRY", true, 42u32));

        let bad: Message = Message::multicast_data("LSE", "SBRY", true, Bytes::from("nope"));
        let result: Result<Message<u32>, _> =
            bad.try_map_payload(|bytes| std::str::from_utf8(&bytes).unwrap().parse::<u32>());
        assert!(result.is_err());

        let control: Message = Message::subscription_request("LSE", "SBRY", true);
        let mapped: Result<Message<u32>, ()> =
            control.try_map_payload(|_| panic!("control frames carry no payload"));
        assert_eq!(mapped.unwrap(), Message::subscription_request("LSE", "SBRY", true));
    }

    #[test]
    fn test_type_display() {
        assert_eq!(MessageType::MulticastData.to_string(), "multicast_data");
        assert_eq!(
            MessageType::ForwardedSubscriptionRequest.to_string(),
            "forwarded_subscription_request"
        );
    }
}
