//! The service book ties the record store to the reminder scheduler.
//!
//! Screens talk to this type: it validates input, keeps `reminderId` in step
//! with the scheduled notification and hands back derived views.
use std::sync::Arc;

use chrono::NaiveDate;
use log::{info, warn};
use tokio::sync::Mutex;

use crate::{
    expense_report, group_contacts, monthly_total, partition, Contact, ContactDraft,
    ContactFilter, ContactGroup, ContactPatch, Entity, ExpenseReport, Partition, Reminder,
    ReminderScheduler, Result, ServiceDate, ServiceDraft, ServiceFilter, ServiceLogError,
    ServicePatch, ServiceRecord, ServiceStatus, Storage,
};

/// Everything the home screen shows, computed from one read.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub partition: Partition,
    pub monthly_total: f64,
    /// Set when the stored services could not be decoded.
    pub corruption: Option<String>,
}

pub struct ServiceBook {
    storage: Storage,
    reminders: Arc<dyn ReminderScheduler>,
    reminder_hour: u32,
    /// Held across the read, the reminder calls and the write of every
    /// service mutation, so `reminderId` always names the live reminder.
    service_ops: Mutex<()>,
}

fn require_text(field: &str, value: &Option<String>) -> Result<()> {
    match value {
        Some(text) if text.trim().is_empty() => Err(ServiceLogError::InvalidInput {
            message: format!("{} cannot be empty", field),
        }),
        _ => Ok(()),
    }
}

impl ServiceBook {
    pub fn new(storage: Storage, reminders: Arc<dyn ReminderScheduler>, reminder_hour: u32) -> Self {
        Self {
            storage,
            reminders,
            reminder_hour,
            service_ops: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Looks up a service record, failing with `NotFound`.
    pub async fn service(&self, id: &str) -> Result<ServiceRecord> {
        self.storage
            .services
            .get(id)
            .await?
            .ok_or_else(|| ServiceLogError::NotFound {
                kind: ServiceRecord::KIND,
                id: id.to_string(),
            })
    }

    /// Adds a record; with `remind` set, an upcoming record also gets a
    /// reminder on its service day.
    pub async fn add_service(
        &self,
        draft: ServiceDraft,
        remind: bool,
        today: NaiveDate,
    ) -> Result<ServiceRecord> {
        draft.validate()?;
        let _op = self.service_ops.lock().await;
        let date = draft.date;
        let record = self.storage.services.create(draft).await?;

        if !remind || ServiceStatus::of(date, today) != ServiceStatus::Upcoming {
            return Ok(record);
        }

        match self.schedule_for(&record, date).await {
            Some(handle) => {
                self.storage
                    .services
                    .update(
                        &record.id,
                        ServicePatch {
                            reminder_id: Some(Some(handle)),
                            ..Default::default()
                        },
                    )
                    .await
            }
            None => Ok(record),
        }
    }

    /// Applies `patch`. Moving the date of a record that has a reminder
    /// re-schedules the reminder.
    pub async fn edit_service(
        &self,
        id: &str,
        mut patch: ServicePatch,
        today: NaiveDate,
    ) -> Result<ServiceRecord> {
        require_text("item name", &patch.item_name)?;
        require_text("repair type", &patch.repair_type)?;
        if let Some(cost) = patch.cost.as_deref().filter(|c| !c.trim().is_empty()) {
            crate::parse_cost(cost)?;
        }

        let _op = self.service_ops.lock().await;
        let current = self.service(id).await?;
        if let (Some(new_date), Some(handle)) = (patch.date, current.reminder_id.as_deref()) {
            if new_date.to_string() != current.date {
                self.cancel_quietly(handle).await;
                let rescheduled = if ServiceStatus::of(new_date, today) == ServiceStatus::Upcoming {
                    let mut preview = current.clone();
                    preview.apply_patch(patch.clone());
                    self.schedule_for(&preview, new_date).await
                } else {
                    None
                };
                patch.reminder_id = Some(rescheduled);
            }
        }

        self.storage.services.update(id, patch).await
    }

    /// Moves an upcoming record to history by dating it today.
    pub async fn mark_complete(&self, id: &str, today: NaiveDate) -> Result<ServiceRecord> {
        let _op = self.service_ops.lock().await;
        let current = self.service(id).await?;
        if current.status(today)? == ServiceStatus::Completed {
            return Err(ServiceLogError::InvalidTransition {
                action: "complete",
                id: id.to_string(),
                message: format!("already completed on {}", current.date),
            });
        }

        if let Some(handle) = current.reminder_id.as_deref() {
            self.cancel_quietly(handle).await;
        }

        let updated = self
            .storage
            .services
            .update(
                id,
                ServicePatch {
                    date: Some(ServiceDate::new(today)),
                    reminder_id: Some(None),
                    ..Default::default()
                },
            )
            .await?;
        info!("Marked {} as completed on {}", id, updated.date);
        Ok(updated)
    }

    /// Deletes a record and its pending reminder. Missing ids are ignored.
    pub async fn delete_service(&self, id: &str) -> Result<()> {
        let _op = self.service_ops.lock().await;
        if let Some(record) = self.storage.services.get(id).await? {
            if let Some(handle) = record.reminder_id.as_deref() {
                self.cancel_quietly(handle).await;
            }
        }
        self.storage.services.delete(id).await
    }

    /// Service records passing `filter`, in stored order.
    pub async fn services(&self, filter: &ServiceFilter, today: NaiveDate) -> Result<Vec<ServiceRecord>> {
        let records = self.storage.services.list().await?;
        Ok(filter.apply(&records, today))
    }

    pub async fn dashboard(&self, today: NaiveDate) -> Result<Dashboard> {
        let snapshot = self.storage.services.snapshot().await?;
        Ok(Dashboard {
            partition: partition(&snapshot.records, today),
            monthly_total: monthly_total(&snapshot.records, today),
            corruption: snapshot.corruption,
        })
    }

    pub async fn report(&self, today: NaiveDate) -> Result<ExpenseReport> {
        let records = self.storage.services.list().await?;
        Ok(expense_report(&records, today))
    }

    pub async fn add_contact(&self, draft: ContactDraft) -> Result<Contact> {
        draft.validate()?;
        self.storage.contacts.create(draft).await
    }

    pub async fn edit_contact(&self, id: &str, patch: ContactPatch) -> Result<Contact> {
        require_text("contact name", &patch.name)?;
        require_text("contact phone", &patch.phone)?;
        self.storage.contacts.update(id, patch).await
    }

    pub async fn delete_contact(&self, id: &str) -> Result<()> {
        self.storage.contacts.delete(id).await
    }

    /// Contacts passing `filter`, grouped by initial.
    pub async fn contacts(&self, filter: &ContactFilter) -> Result<Vec<ContactGroup>> {
        let contacts = self.storage.contacts.list().await?;
        Ok(group_contacts(&filter.apply(&contacts)))
    }

    /// Cancels every known reminder and wipes both collections.
    pub async fn reset_all(&self) -> Result<()> {
        let _op = self.service_ops.lock().await;
        let snapshot = self.storage.services.snapshot().await?;
        for handle in snapshot.records.iter().filter_map(|r| r.reminder_id.as_deref()) {
            self.cancel_quietly(handle).await;
        }
        self.storage.reset_all().await
    }

    async fn schedule_for(&self, record: &ServiceRecord, date: ServiceDate) -> Option<String> {
        let reminder = Reminder::for_service(record, date.naive(), self.reminder_hour);
        let handle = self.reminders.schedule(&reminder).await;
        if handle.is_none() {
            warn!("No reminder scheduled for {}", record.id);
        }
        handle
    }

    async fn cancel_quietly(&self, handle: &str) {
        if let Err(e) = self.reminders.cancel(handle).await {
            warn!("Failed to cancel reminder {}: {}", handle, e);
        }
    }
}
