//! Notification DTOs

use serde::{Deserialize, Serialize};

use domain_reminders::NotificationType;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationListQuery {
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct WhatsappTemplateResponse {
    pub template: String,
}
