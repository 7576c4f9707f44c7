//! Local notification reminders for upcoming services.
//!
//! Delivery belongs to the platform; the application only asks for a reminder
//! to be scheduled and keeps the returned opaque handle on the record.
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, info};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{Result, ServiceRecord};

/// A notification to fire at a local date and time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reminder {
    pub fire_at: NaiveDateTime,
    pub title: String,
    pub body: String,
}

impl Reminder {
    /// Reminder for `record` on `date` at `hour` o'clock.
    pub fn for_service(record: &ServiceRecord, date: NaiveDate, hour: u32) -> Self {
        let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default();
        Reminder {
            fire_at: date.and_time(time),
            title: format!("Service due: {}", record.item_name),
            body: format!("{} is scheduled for today", record.repair_type),
        }
    }
}

/// The platform notification service.
#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    /// Schedules `reminder`, returning its handle. `None` means the platform
    /// refused (no permission, scheduling failed).
    async fn schedule(&self, reminder: &Reminder) -> Option<String>;

    /// Cancels a previously scheduled reminder.
    async fn cancel(&self, handle: &str) -> Result<()>;
}

/// Scheduler used when reminders are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReminders;

#[async_trait]
impl ReminderScheduler for NoopReminders {
    async fn schedule(&self, reminder: &Reminder) -> Option<String> {
        debug!("Reminders disabled, not scheduling '{}'", reminder.title);
        None
    }

    async fn cancel(&self, _handle: &str) -> Result<()> {
        Ok(())
    }
}

/// Logs reminders instead of delivering them and keeps track of the
/// pending ones for the lifetime of the process.
#[derive(Debug, Default)]
pub struct LogReminders {
    pending: Mutex<HashMap<String, Reminder>>,
}

impl LogReminders {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn pending(&self) -> Vec<Reminder> {
        let mut pending: Vec<Reminder> = self.pending.lock().await.values().cloned().collect();
        pending.sort_by_key(|r| r.fire_at);
        pending
    }
}

#[async_trait]
impl ReminderScheduler for LogReminders {
    async fn schedule(&self, reminder: &Reminder) -> Option<String> {
        let handle = Uuid::new_v4().to_string();
        info!(
            "Reminder {} scheduled for {}: {}",
            handle, reminder.fire_at, reminder.title
        );
        self.pending
            .lock()
            .await
            .insert(handle.clone(), reminder.clone());
        Some(handle)
    }

    async fn cancel(&self, handle: &str) -> Result<()> {
        match self.pending.lock().await.remove(handle) {
            Some(reminder) => info!("Reminder {} cancelled: {}", handle, reminder.title),
            None => debug!("Reminder {} was not pending", handle),
        }
        Ok(())
    }
}
