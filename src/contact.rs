//! Service provider contacts.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Entity, Result, ServiceLogError};

/// A service provider the user can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    /// Free text, not validated as a phone number.
    pub phone: String,
    #[serde(
        default,
        alias = "category",
        skip_serializing_if = "Option::is_none"
    )]
    pub specialty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Fields supplied when creating a contact.
#[derive(Debug, Clone)]
pub struct ContactDraft {
    pub name: String,
    pub phone: String,
    pub specialty: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl ContactDraft {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ServiceLogError::InvalidInput {
                message: "contact name is required".to_string(),
            });
        }
        if self.phone.trim().is_empty() {
            return Err(ServiceLogError::InvalidInput {
                message: "contact phone is required".to_string(),
            });
        }
        Ok(())
    }
}

/// Partial update of a contact; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub specialty: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub address: Option<Option<String>>,
}

impl Entity for Contact {
    type Draft = ContactDraft;
    type Patch = ContactPatch;

    const KEY: &'static str = "contacts";
    const KIND: &'static str = "Contact";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, _now: DateTime<Utc>, draft: ContactDraft) -> Self {
        Contact {
            id,
            name: draft.name,
            phone: draft.phone,
            specialty: draft.specialty,
            email: draft.email,
            address: draft.address,
        }
    }

    fn apply_patch(&mut self, patch: ContactPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(specialty) = patch.specialty {
            self.specialty = specialty;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_legacy_category_field() {
        let json = r#"{"id":"1","name":"Joe's Garage","phone":"555-0101","category":"Mechanic"}"#;
        let contact: Contact = serde_json::from_str(json).unwrap();
        assert_eq!(contact.specialty.as_deref(), Some("Mechanic"));

        let value = serde_json::to_value(&contact).unwrap();
        assert_eq!(value["specialty"], "Mechanic");
        assert!(value.get("email").is_none());
    }

    #[test]
    fn patch_clears_and_keeps() {
        let mut contact = Contact::from_draft(
            "c1".to_string(),
            Utc::now(),
            ContactDraft {
                name: "Ana".to_string(),
                phone: "555-0102".to_string(),
                specialty: Some("Plumber".to_string()),
                email: Some("ana@example.com".to_string()),
                address: None,
            },
        );
        contact.apply_patch(ContactPatch {
            email: Some(None),
            phone: Some("555-0199".to_string()),
            ..Default::default()
        });
        assert_eq!(contact.email, None);
        assert_eq!(contact.phone, "555-0199");
        assert_eq!(contact.specialty.as_deref(), Some("Plumber"));
        assert_eq!(contact.name, "Ana");
    }

    #[test]
    fn draft_requires_name_and_phone() {
        let draft = ContactDraft {
            name: String::new(),
            phone: "1".to_string(),
            specialty: None,
            email: None,
            address: None,
        };
        assert!(draft.validate().is_err());
    }
}
