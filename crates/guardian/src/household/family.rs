//! Family members and emergency contacts.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::documents;
use crate::storage::{DocumentKey, DocumentStore};

/// Role given to members added without one.
pub const DEFAULT_ROLE: &str = "Family member";

/// A household member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    /// Unique id.
    pub id: String,
    /// Name.
    pub name: String,
    /// Role in the household, e.g. "Parent" or "Key holder".
    pub role: String,
    /// Phone number.
    #[serde(default)]
    pub phone: String,
    /// Blood type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
    /// Allergies, medication and similar notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_notes: Option<String>,
}

/// Details for a new member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMember {
    /// Name. Required.
    pub name: String,
    /// Role; [`DEFAULT_ROLE`] when blank.
    pub role: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Blood type.
    pub blood_type: Option<String>,
    /// Medical notes.
    pub medical_notes: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The stored family list. Empty on first run.
#[derive(Debug)]
pub struct Family<S: DocumentStore> {
    store: S,
    members: Vec<FamilyMember>,
}

impl<S: DocumentStore> Family<S> {
    /// Load the family list.
    pub fn open(store: S) -> Self {
        let members = documents::load_or(&store, DocumentKey::Family, Vec::new);
        Self { store, members }
    }

    /// Every member, in the order added.
    #[must_use]
    pub fn members(&self) -> &[FamilyMember] {
        &self.members
    }

    /// Add a member.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank.
    pub fn add(&mut self, new: NewMember) -> Result<&FamilyMember> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("a family member needs a name"));
        }
        let member = FamilyMember {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            role: non_blank(new.role).unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            phone: non_blank(new.phone).unwrap_or_default(),
            blood_type: non_blank(new.blood_type),
            medical_notes: non_blank(new.medical_notes),
        };
        debug!(id = %member.id, "Added family member");
        self.members.push(member);
        self.persist();
        self.members
            .last()
            .ok_or_else(|| Error::internal("member vanished after insert"))
    }

    /// Remove member `id`. Returns `false` if there was none.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id != id);
        if self.members.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Give back the store.
    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&self) {
        documents::save(&self.store, DocumentKey::Family, &self.members);
    }
}
