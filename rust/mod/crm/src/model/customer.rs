use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

clinic_core::code_enum! {
    /// Where a lead came from.
    pub enum Source {
        Facebook => "FACEBOOK",
        Zalo => "ZALO",
        TikTok => "TIKTOK",
        Google => "GOOGLE",
        Website => "WEBSITE",
        Referral => "REFERRAL",
        WalkIn => "WALK_IN",
        Other => "OTHER",
    }
}

clinic_core::code_enum! {
    /// Sales pipeline stage.
    ///
    /// ```text
    /// NEW → CONTACTED → POTENTIAL → BOOKED → CONVERTED
    ///     ↘ LOST
    /// ```
    pub enum CustomerStatus {
        New => "NEW",
        Contacted => "CONTACTED",
        Potential => "POTENTIAL",
        Booked => "BOOKED",
        Converted => "CONVERTED",
        Lost => "LOST",
    }
}

clinic_core::code_enum! {
    /// Loyalty tier derived from paid spend.
    pub enum Rank {
        Member => "MEMBER",
        Silver => "SILVER",
        Gold => "GOLD",
        Diamond => "DIAMOND",
    }
}

clinic_core::code_enum! {
    pub enum Gender {
        Male => "MALE",
        Female => "FEMALE",
    }
}

pub const SILVER_THRESHOLD: i64 = 10_000_000;
pub const GOLD_THRESHOLD: i64 = 50_000_000;
pub const DIAMOND_THRESHOLD: i64 = 100_000_000;

impl Rank {
    /// Tier for a cumulative paid spend in VND.
    pub fn for_spent(total_spent: i64) -> Self {
        if total_spent >= DIAMOND_THRESHOLD {
            Self::Diamond
        } else if total_spent >= GOLD_THRESHOLD {
            Self::Gold
        } else if total_spent >= SILVER_THRESHOLD {
            Self::Silver
        } else {
            Self::Member
        }
    }
}

impl Default for Source {
    fn default() -> Self {
        Self::Other
    }
}

/// A lead or client of the clinic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,

    /// Normalised national format, e.g. `0901234567`. Unique.
    pub phone: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default)]
    pub source: Source,
    pub status: CustomerStatus,
    pub rank: Rank,

    /// Sum of total amounts over paid orders, VND.
    #[serde(default)]
    pub total_spent: i64,

    /// Telesale responsible for this lead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub created_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a customer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomer {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Filters for listing customers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerQuery {
    #[serde(default)]
    pub status: Option<CustomerStatus>,
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub rank: Option<Rank>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Free text matched against name and phone.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

/// Body of a reassignment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reassign {
    pub staff_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_thresholds() {
        assert_eq!(Rank::for_spent(0), Rank::Member);
        assert_eq!(Rank::for_spent(9_999_999), Rank::Member);
        assert_eq!(Rank::for_spent(10_000_000), Rank::Silver);
        assert_eq!(Rank::for_spent(49_999_999), Rank::Silver);
        assert_eq!(Rank::for_spent(50_000_000), Rank::Gold);
        assert_eq!(Rank::for_spent(100_000_000), Rank::Diamond);
    }

    #[test]
    fn walk_in_code() {
        assert_eq!(serde_json::to_string(&Source::WalkIn).unwrap(), "\"WALK_IN\"");
    }
}
