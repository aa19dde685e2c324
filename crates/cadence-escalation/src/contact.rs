//! Contacts and relationship tiers.
//!
//! The tier of the contact receiving a step adds extra minutes to the next
//! step's delay: close relationships get more slack before the chain tightens.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Unique contact identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactId(pub Uuid);

impl ContactId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContactId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relationship tier of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipTier {
    /// Family, close friends
    Inner,
    /// Trusted collaborators
    Trusted,
    /// Working relationships
    Professional,
    /// Everyone else
    Distant,
}

impl RelationshipTier {
    /// Extra delay granted before escalating to a contact of this tier.
    pub fn extra_delay_minutes(&self) -> u32 {
        match self {
            Self::Inner => 60,
            Self::Trusted => 30,
            Self::Professional => 15,
            Self::Distant => 0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Inner => "inner",
            Self::Trusted => "trusted",
            Self::Professional => "professional",
            Self::Distant => "distant",
        }
    }
}

impl std::fmt::Display for RelationshipTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A contact in a user's directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub tier: RelationshipTier,
}

impl Contact {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        tier: RelationshipTier,
    ) -> Self {
        Self {
            id: ContactId::new(),
            user_id: user_id.into(),
            name: name.into(),
            email: email.into(),
            tier,
        }
    }
}

/// Contact lookups the engine needs: recipient resolution and tier delay.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// Email address of a contact, `None` if unknown.
    async fn contact_email(&self, id: &ContactId) -> Option<String>;

    /// Extra delay minutes for the contact matching this email; 0 if none.
    async fn tier_delay_minutes(&self, email: &str) -> u32;

    /// The user's own address, used when a step names no recipient.
    async fn owner_email(&self, user_id: &str) -> Option<String>;
}

/// In-memory contact directory.
pub struct MemoryContactDirectory {
    contacts: RwLock<HashMap<ContactId, Contact>>,
    owners: RwLock<HashMap<String, String>>,
}

impl MemoryContactDirectory {
    pub fn new() -> Self {
        Self {
            contacts: RwLock::new(HashMap::new()),
            owners: RwLock::new(HashMap::new()),
        }
    }

    pub async fn add_contact(&self, contact: Contact) -> ContactId {
        let id = contact.id.clone();
        self.contacts.write().await.insert(id.clone(), contact);
        id
    }

    /// Register a user's own email address.
    pub async fn set_owner_email(&self, user_id: impl Into<String>, email: impl Into<String>) {
        self.owners.write().await.insert(user_id.into(), email.into());
    }
}

impl Default for MemoryContactDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContactDirectory for MemoryContactDirectory {
    async fn contact_email(&self, id: &ContactId) -> Option<String> {
        self.contacts.read().await.get(id).map(|c| c.email.clone())
    }

    async fn tier_delay_minutes(&self, email: &str) -> u32 {
        self.contacts
            .read()
            .await
            .values()
            .find(|c| c.email.eq_ignore_ascii_case(email))
            .map(|c| c.tier.extra_delay_minutes())
            .unwrap_or(0)
    }

    async fn owner_email(&self, user_id: &str) -> Option<String> {
        self.owners.read().await.get(user_id).cloned()
    }
}
