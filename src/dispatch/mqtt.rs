//! MQTT publisher backed by `rumqttc`
//! The link hands messages to the client queue; the driver owns the network loop

use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing,
    Packet, QoS,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::dispatch::publisher::{PublishError, Publisher};

/// Pending requests the client queue can hold before `publish` fails
const REQUEST_QUEUE_CAPACITY: usize = 10;

/// Pause between reconnect attempts
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Publishing half: cheap to clone, never blocks
#[derive(Clone)]
pub struct MqttLink {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
}

/// Network half: must be polled on an async runtime via [`MqttDriver::run`]
pub struct MqttDriver {
    client: AsyncClient,
    eventloop: EventLoop,
    connected: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
}

/// Create a link/driver pair for the configured broker
/// Nothing touches the network until the driver runs.
pub fn connect(config: &AppConfig) -> (MqttLink, MqttDriver) {
    let client_id = config.client_id();
    let mut options = MqttOptions::new(
        client_id.clone(),
        config.broker_host.clone(),
        config.broker_port,
    );
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(1)));
    options.set_clean_session(true);

    log::info!(
        "MQTT client {} targeting {}:{}",
        client_id,
        config.broker_host,
        config.broker_port
    );

    let (client, eventloop) = AsyncClient::new(options, REQUEST_QUEUE_CAPACITY);
    let connected = Arc::new(AtomicBool::new(false));
    let shutdown = Arc::new(AtomicBool::new(false));

    (
        MqttLink {
            client: client.clone(),
            connected: Arc::clone(&connected),
            shutdown: Arc::clone(&shutdown),
        },
        MqttDriver {
            client,
            eventloop,
            connected,
            shutdown,
        },
    )
}

impl MqttLink {
    /// Ask the driver to disconnect cleanly and stop
    pub fn disconnect(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if self.connected.load(Ordering::SeqCst) {
            if let Err(e) = self.client.try_disconnect() {
                log::warn!("MQTT disconnect request failed: {}", e);
            }
        }
    }
}

impl Publisher for MqttLink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        if !self.is_connected() {
            return Err(PublishError::NotConnected);
        }
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload)
            .map_err(|e| PublishError::Rejected(e.to_string()))
    }
}

impl MqttDriver {
    /// Poll the event loop until shutdown, reconnecting after failures
    pub async fn run(mut self) {
        loop {
            match self.eventloop.poll().await {
                Ok(event) => {
                    self.handle_event(&event);
                    if self.is_shutting_down()
                        && matches!(event, Event::Outgoing(Outgoing::Disconnect))
                    {
                        break;
                    }
                }
                Err(e) => {
                    if self.shutdown.load(Ordering::SeqCst) {
                        self.connected.store(false, Ordering::SeqCst);
                        break;
                    }
                    self.handle_error(&e);
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
        log::info!("MQTT driver stopped");
    }

    /// Track connection state from a polled event
    pub fn handle_event(&self, event: &Event) {
        match event {
            Event::Incoming(Packet::ConnAck(ack)) => {
                if ack.code != ConnectReturnCode::Success {
                    log::warn!("MQTT connection refused: {:?}", ack.code);
                    self.connected.store(false, Ordering::SeqCst);
                } else if self.disconnect_if_shutting_down() {
                    self.connected.store(false, Ordering::SeqCst);
                } else {
                    log::info!("MQTT connected");
                    self.connected.store(true, Ordering::SeqCst);
                }
            }
            Event::Incoming(Packet::Disconnect) | Event::Outgoing(Outgoing::Disconnect) => {
                log::info!("MQTT disconnected");
                self.connected.store(false, Ordering::SeqCst);
            }
            _ => {}
        }
    }

    /// Queue a DISCONNECT when shutdown was requested before the session came up
    fn disconnect_if_shutting_down(&self) -> bool {
        if !self.is_shutting_down() {
            return false;
        }
        log::info!("MQTT connected after shutdown request, disconnecting");
        if let Err(e) = self.client.try_disconnect() {
            log::warn!("MQTT disconnect request failed: {}", e);
        }
        true
    }

    fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn handle_error(&self, error: &ConnectionError) {
        if self.connected.swap(false, Ordering::SeqCst) {
            log::warn!("MQTT connection lost: {}", error);
        } else {
            log::warn!("MQTT connection failed: {}", error);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumqttc::ConnAck;

    fn conn_ack(code: ConnectReturnCode) -> Event {
        Event::Incoming(Packet::ConnAck(ConnAck {
            session_present: false,
            code,
        }))
    }

    #[test]
    fn test_starts_disconnected() {
        let (link, driver) = connect(&AppConfig::default());
        assert!(!link.is_connected());
        assert!(!driver.is_connected());
        assert!(matches!(
            link.publish("neurosense/demo/cmd", b"{}".to_vec()),
            Err(PublishError::NotConnected)
        ));
    }

    #[test]
    fn test_conn_ack_sets_connected() {
        let (link, driver) = connect(&AppConfig::default());
        driver.handle_event(&conn_ack(ConnectReturnCode::Success));
        assert!(link.is_connected());

        driver.handle_event(&Event::Incoming(Packet::Disconnect));
        assert!(!link.is_connected());
    }

    #[test]
    fn test_refused_conn_ack_stays_disconnected() {
        let (link, driver) = connect(&AppConfig::default());
        driver.handle_event(&conn_ack(ConnectReturnCode::NotAuthorized));
        assert!(!link.is_connected());
    }

    #[test]
    fn test_disconnect_before_conn_ack() {
        let (link, driver) = connect(&AppConfig::default());
        assert!(!driver.disconnect_if_shutting_down());

        link.disconnect();
        driver.handle_event(&conn_ack(ConnectReturnCode::Success));
        assert!(!link.is_connected());
        assert!(driver.is_shutting_down());
        assert!(driver.disconnect_if_shutting_down());
    }

    #[test]
    fn test_publish_queues_when_connected() {
        let (link, driver) = connect(&AppConfig::default());
        driver.handle_event(&conn_ack(ConnectReturnCode::Success));
        // Goes to the client's request queue; delivery happens when the driver polls
        assert!(link.publish("neurosense/demo/cmd", b"{}".to_vec()).is_ok());
    }
}
