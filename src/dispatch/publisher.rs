// Remote publish port
// The dispatcher talks to the messaging client only through this trait

use thiserror::Error;

/// Errors that can occur while handing a message to the messaging client
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Not connected to broker")]
    NotConnected,

    #[error("Publish rejected: {0}")]
    Rejected(String),
}

/// Publish/subscribe connection owned by an external messaging client
/// `publish` must not wait for delivery.
pub trait Publisher: Send {
    fn is_connected(&self) -> bool;

    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}

/// Publisher with no broker behind it; always offline
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflinePublisher;

impl Publisher for OfflinePublisher {
    fn is_connected(&self) -> bool {
        false
    }

    fn publish(&self, _topic: &str, _payload: Vec<u8>) -> Result<(), PublishError> {
        Err(PublishError::NotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_publisher() {
        let publisher = OfflinePublisher;
        assert!(!publisher.is_connected());
        assert!(matches!(
            publisher.publish("topic", b"{}".to_vec()),
            Err(PublishError::NotConnected)
        ));
    }
}
