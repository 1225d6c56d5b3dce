//! Routes platform events to the users they concern.

use tokio::sync::broadcast;
use unicorr_core::channels::{CHANNEL_IN_APP, CHANNEL_WHATSAPP};
use unicorr_core::types::DbId;
use unicorr_db::models::notification::NewNotification;
use unicorr_db::models::user::User;
use unicorr_db::repositories::{NotificationRepo, RequestRepo, UserRepo};
use unicorr_db::DbPool;
use unicorr_events::messages::{render, RenderedMessage};
use unicorr_events::{event_types, EventSubject, PlatformEvent, WhatsAppQueue};

use crate::approvals;
use crate::error::AppResult;

/// Background consumer of the event bus.
///
/// Failures are logged per event and never reach the handler that
/// published it.
pub struct NotificationRouter {
    pool: DbPool,
    whatsapp: WhatsAppQueue,
}

impl NotificationRouter {
    pub fn new(pool: DbPool) -> Self {
        let whatsapp = WhatsAppQueue::new(pool.clone());
        Self { pool, whatsapp }
    }

    /// Process events until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    async fn route_event(&self, event: &PlatformEvent) -> AppResult<()> {
        let message = render(event)?;
        let targets = self.determine_targets(event).await?;
        if targets.is_empty() {
            tracing::debug!(event_type = %event.event_type, "Event has no recipients");
            return Ok(());
        }

        let users = UserRepo::find_many(&self.pool, &targets).await?;
        for user in users.iter().filter(|u| u.is_active) {
            // One recipient failing must not starve the others.
            if let Err(e) = self.deliver(user, event, &message).await {
                tracing::error!(
                    error = %e,
                    user_id = user.id,
                    event_type = %event.event_type,
                    "Failed to deliver notification"
                );
            }
        }
        Ok(())
    }

    async fn determine_targets(&self, event: &PlatformEvent) -> AppResult<Vec<DbId>> {
        match &event.subject {
            EventSubject::Request(snapshot) => match event.event_type.as_str() {
                event_types::REQUEST_SUBMITTED
                | event_types::REQUEST_ADVANCED
                | event_types::REQUEST_RESUBMITTED => {
                    // Re-read: the request may have moved on since publication.
                    let Some(request) =
                        RequestRepo::find_by_id(&self.pool, snapshot.request_id).await?
                    else {
                        return Ok(Vec::new());
                    };
                    if request.current_step != snapshot.current_step
                        || !request.status()?.is_actionable()
                    {
                        return Ok(Vec::new());
                    }
                    let requester = approvals::load_user(&self.pool, request.requester_id).await?;
                    let (step, _) = approvals::current_step(&self.pool, &request).await?;
                    let deciders = approvals::step_deciders(
                        &self.pool,
                        &step,
                        &requester,
                        chrono::Utc::now(),
                    )
                    .await?;
                    Ok(deciders)
                }
                _ => Ok(vec![snapshot.requester_id]),
            },
            EventSubject::Delegation(snapshot) => Ok(vec![snapshot.grantee_id]),
        }
    }

    async fn deliver(
        &self,
        user: &User,
        event: &PlatformEvent,
        message: &RenderedMessage,
    ) -> AppResult<()> {
        let notification = NotificationRepo::create(
            &self.pool,
            &NewNotification {
                user_id: user.id,
                event_type: event.event_type.clone(),
                title: message.title.clone(),
                body: message.body.clone(),
                request_id: event.request_id(),
            },
        )
        .await?;
        tracing::debug!(
            user_id = user.id,
            notification_id = notification.id,
            channel = CHANNEL_IN_APP,
            "Notification stored"
        );

        if self
            .whatsapp
            .enqueue(user, &event.event_type, message)
            .await?
            .is_none()
        {
            tracing::debug!(
                user_id = user.id,
                channel = CHANNEL_WHATSAPP,
                "User not reachable on channel, skipped"
            );
        }
        Ok(())
    }
}
