//! PushNotifier that only records notifications in the log.
//!
//! Web push delivery itself is not part of this server; this implementation
//! stands in for the dispatcher so that relayed messages have a sink.

use async_trait::async_trait;

use crate::domain::{DeliveryError, PushNotification, PushNotifier};

#[derive(Debug, Default, Clone, Copy)]
pub struct LogPushNotifier;

#[async_trait]
impl PushNotifier for LogPushNotifier {
    async fn notify(&self, notification: PushNotification) -> Result<(), DeliveryError> {
        tracing::debug!(
            room_id = %notification.room_id,
            has_image = notification.image.is_some(),
            has_subscription = notification.p256dh.is_some(),
            "Push notification for message of {} chars",
            notification.message.as_deref().map_or(0, |m| m.chars().count()),
        );
        Ok(())
    }
}
