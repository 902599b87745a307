use crate::entities::{NotificationChannel, NotificationType};
use crate::models::SortOrder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotificationInput {
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
    pub channel: Vec<NotificationChannel>,
    /// defaults to now
    pub sent_at: Option<DateTime<Utc>>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNotificationInput {
    pub title: Option<String>,
    pub message: Option<String>,
    pub is_read: Option<bool>,
    pub metadata: Option<Option<serde_json::Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationFilter {
    pub user_id: Option<String>,
    pub is_read: Option<bool>,
    pub kind: Option<NotificationType>,
    #[serde(default)]
    pub order: SortOrder,
}
