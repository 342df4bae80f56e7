use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

clinic_core::code_enum! {
    pub enum Platform {
        Facebook => "FACEBOOK",
        Google => "GOOGLE",
        TikTok => "TIKTOK",
        Zalo => "ZALO",
        Other => "OTHER",
    }
}

/// A paid advertising campaign on one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub platform: Platform,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Planned spend for the whole campaign.
    pub budget: i64,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaign {
    pub name: String,
    pub platform: Platform,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub budget: i64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignQuery {
    #[serde(default)]
    pub platform: Option<Platform>,
    #[serde(default)]
    pub active: Option<bool>,
}
