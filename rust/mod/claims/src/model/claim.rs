use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ClaimStatus
// ---------------------------------------------------------------------------

/// Claim lifecycle status.
///
/// ```text
/// Bilty Pending ──bilty──▶ Approval Pending ──approve──▶ Approved
///       │                        │ ▲
///       │                        └─┘ bilty (correction)
///       └──────────reject────────┴──▶ Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    #[serde(rename = "Bilty Pending")]
    BiltyPending,
    #[serde(rename = "Approval Pending")]
    ApprovalPending,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BiltyPending => "Bilty Pending",
            Self::ApprovalPending => "Approval Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    pub const ALL: [ClaimStatus; 4] = [
        Self::BiltyPending,
        Self::ApprovalPending,
        Self::Approved,
        Self::Rejected,
    ];

    /// Statuses a claim can still be edited in.
    pub fn open() -> Vec<ClaimStatus> {
        Self::ALL.into_iter().filter(|s| !s.is_terminal()).collect()
    }

    /// Whether the claim is closed to edits and further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Claim
// ---------------------------------------------------------------------------

/// One line of a claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimItem {
    pub item_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub notes: String,
    /// Acknowledges that the item is older than 15 months.
    #[serde(default)]
    pub force_add: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,

    /// Human-readable claim number, `CLM-YYYYMMDD-NNNN`.
    pub claim_id: String,

    pub rep_id: String,
    pub merchant_id: String,

    /// RFC 3339 claim date.
    pub date: String,

    pub items: Vec<ClaimItem>,
    pub status: ClaimStatus,

    #[serde(default)]
    pub bilty_number: Option<String>,

    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub verified_by: Option<String>,
    #[serde(default)]
    pub verified_at: Option<String>,

    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub approved_at: Option<String>,

    #[serde(default)]
    pub rejection_reason: Option<String>,

    #[serde(default)]
    pub notes: String,

    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateClaim {
    pub rep_id: String,
    pub merchant_id: String,
    pub items: Vec<ClaimItem>,
    #[serde(default)]
    pub notes: String,
}

/// Editable fields of an open claim.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClaim {
    #[serde(default)]
    pub items: Option<Vec<ClaimItem>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BiltyUpdate {
    pub bilty_number: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApproveClaim {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectClaim {
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyClaim {
    /// Defaults to the calling user.
    #[serde(default)]
    pub verified_by: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query filters for listing claims.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimFilter {
    #[serde(default)]
    pub rep_id: Option<String>,
    #[serde(default)]
    pub merchant_id: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub status: Option<ClaimStatus>,
}
