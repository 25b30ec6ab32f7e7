//! Push notification collaborator.
//!
//! Every `newMessage` relayed into a room is also handed to a [`PushNotifier`]
//! so that members who are not connected can be notified out of band.

use async_trait::async_trait;

use super::{DeliveryError, RoomId};

/// Payload handed to the push notifier for a relayed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushNotification {
    pub room_id: RoomId,
    pub message: Option<String>,
    pub image: Option<String>,
    /// Subscription key of the sender's browser (`p256dh`)
    pub p256dh: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn notify(&self, notification: PushNotification) -> Result<(), DeliveryError>;
}
