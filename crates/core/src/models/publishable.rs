use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::approval::{ApprovalFlags, ApprovalGate, ApprovalState, Publishable, PublishableKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub department_id: Option<Uuid>,
    #[serde(flatten)]
    pub approval: ApprovalFlags,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentEvent {
    pub id: Uuid,
    pub department_id: Uuid,
    pub title: String,
    pub description: String,
    pub event_date: NaiveDate,
    #[serde(flatten)]
    pub approval: ApprovalFlags,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalEvent {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub event_date: NaiveDate,
    #[serde(flatten)]
    pub approval: ApprovalFlags,
    pub created_at: DateTime<Utc>,
}

macro_rules! impl_publishable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Publishable for $ty {
                fn approval(&self) -> ApprovalFlags {
                    self.approval
                }

                fn approval_mut(&mut self) -> &mut ApprovalFlags {
                    &mut self.approval
                }
            }
        )+
    };
}

impl_publishable!(Notice, DepartmentEvent, GlobalEvent);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetApprovalRequest {
    pub gate: ApprovalGate,
    pub approved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalResponse {
    pub id: Uuid,
    pub kind: PublishableKind,
    #[serde(flatten)]
    pub approval: ApprovalFlags,
    pub state: ApprovalState,
    pub is_visible: bool,
}

impl ApprovalResponse {
    pub fn new(id: Uuid, kind: PublishableKind, approval: ApprovalFlags) -> Self {
        Self {
            id,
            kind,
            approval,
            state: approval.state(),
            is_visible: approval.is_visible(),
        }
    }
}

/// Title and summary shared by the three publishable kinds in public listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedItem {
    pub id: Uuid,
    pub kind: PublishableKind,
    pub title: String,
    pub summary: String,
    pub event_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}
