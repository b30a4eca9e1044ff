//! # Approval gate
//!
//! Notices, department events and global events each carry two independent
//! approval flags, one set by the owning department and one by the campus. An item
//! is publicly visible only while both are set. Either flag can be withdrawn at any
//! time; nothing else changes when a flag flips.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CampusError;

/// Which of the two approvals is being granted or withdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalGate {
    Department,
    Campus,
}

impl ApprovalGate {
    /// Column holding this flag on every publishable table.
    pub fn column(self) -> &'static str {
        match self {
            ApprovalGate::Department => "is_approved_by_department",
            ApprovalGate::Campus => "is_approved_by_campus",
        }
    }
}

impl fmt::Display for ApprovalGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalGate::Department => write!(f, "department"),
            ApprovalGate::Campus => write!(f, "campus"),
        }
    }
}

impl FromStr for ApprovalGate {
    type Err = CampusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "department" => Ok(ApprovalGate::Department),
            "campus" => Ok(ApprovalGate::Campus),
            other => Err(CampusError::Validation(format!(
                "Unknown approval gate: {}",
                other
            ))),
        }
    }
}

/// Derived view of the flag pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    Draft,
    DepartmentApproved,
    CampusApproved,
    Published,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalFlags {
    #[serde(default)]
    pub is_approved_by_department: bool,
    #[serde(default)]
    pub is_approved_by_campus: bool,
}

impl ApprovalFlags {
    pub fn new(is_approved_by_department: bool, is_approved_by_campus: bool) -> Self {
        Self {
            is_approved_by_department,
            is_approved_by_campus,
        }
    }

    pub fn get(&self, gate: ApprovalGate) -> bool {
        match gate {
            ApprovalGate::Department => self.is_approved_by_department,
            ApprovalGate::Campus => self.is_approved_by_campus,
        }
    }

    /// Sets one flag, leaving the other as it was.
    pub fn set(&mut self, gate: ApprovalGate, approved: bool) {
        match gate {
            ApprovalGate::Department => self.is_approved_by_department = approved,
            ApprovalGate::Campus => self.is_approved_by_campus = approved,
        }
    }

    pub fn with(mut self, gate: ApprovalGate, approved: bool) -> Self {
        self.set(gate, approved);
        self
    }

    pub fn state(&self) -> ApprovalState {
        match (self.is_approved_by_department, self.is_approved_by_campus) {
            (false, false) => ApprovalState::Draft,
            (true, false) => ApprovalState::DepartmentApproved,
            (false, true) => ApprovalState::CampusApproved,
            (true, true) => ApprovalState::Published,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.is_approved_by_department && self.is_approved_by_campus
    }
}

/// Content that goes through the approval gate before it is shown publicly.
pub trait Publishable {
    fn approval(&self) -> ApprovalFlags;

    fn approval_mut(&mut self) -> &mut ApprovalFlags;

    fn set_approval(&mut self, gate: ApprovalGate, approved: bool) {
        self.approval_mut().set(gate, approved);
    }

    fn approval_state(&self) -> ApprovalState {
        self.approval().state()
    }

    fn is_publicly_visible(&self) -> bool {
        self.approval().is_visible()
    }
}

/// The tables that carry approval flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishableKind {
    Notice,
    DepartmentEvent,
    GlobalEvent,
}

impl PublishableKind {
    pub const ALL: [PublishableKind; 3] = [
        PublishableKind::Notice,
        PublishableKind::DepartmentEvent,
        PublishableKind::GlobalEvent,
    ];

    pub fn table(self) -> &'static str {
        match self {
            PublishableKind::Notice => "notices",
            PublishableKind::DepartmentEvent => "department_events",
            PublishableKind::GlobalEvent => "global_events",
        }
    }

    /// Path segment used by the HTTP routes.
    pub fn slug(self) -> &'static str {
        match self {
            PublishableKind::Notice => "notices",
            PublishableKind::DepartmentEvent => "department-events",
            PublishableKind::GlobalEvent => "global-events",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }
}

impl fmt::Display for PublishableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishableKind::Notice => write!(f, "notice"),
            PublishableKind::DepartmentEvent => write!(f, "department event"),
            PublishableKind::GlobalEvent => write!(f, "global event"),
        }
    }
}
