// Alert dispatch module
// Payload construction, remote publishing, and history recording

pub mod dispatcher;
pub mod mqtt;
pub mod payload;
pub mod publisher;

pub use dispatcher::{DispatchResult, Dispatcher};
pub use mqtt::{MqttDriver, MqttLink};
pub use payload::DispatchPayload;
pub use publisher::{OfflinePublisher, PublishError, Publisher};
