use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of results for a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub id: String,
    pub campaign_id: String,
    pub report_date: NaiveDate,
    pub spend: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub leads: i64,
    pub messages: i64,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReport {
    pub campaign_id: String,
    pub report_date: NaiveDate,
    #[serde(default)]
    pub spend: i64,
    #[serde(default)]
    pub impressions: i64,
    #[serde(default)]
    pub clicks: i64,
    #[serde(default)]
    pub leads: i64,
    #[serde(default)]
    pub messages: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

/// Summed counters with derived ratios.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub spend: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub leads: i64,
    pub messages: i64,
    /// Clicks per impression, in percent.
    pub ctr: Option<f64>,
    pub cost_per_lead: Option<f64>,
    pub cost_per_message: Option<f64>,
}

fn ratio(num: i64, den: i64) -> Option<f64> {
    (den != 0).then(|| num as f64 / den as f64)
}

impl Metrics {
    pub fn add(&mut self, other: &Metrics) {
        self.spend += other.spend;
        self.impressions += other.impressions;
        self.clicks += other.clicks;
        self.leads += other.leads;
        self.messages += other.messages;
    }

    /// Fill in the ratio fields from the counters.
    pub fn derive(mut self) -> Self {
        self.ctr = ratio(self.clicks * 100, self.impressions);
        self.cost_per_lead = ratio(self.spend, self.leads);
        self.cost_per_message = ratio(self.spend, self.messages);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSummary {
    pub campaign_id: String,
    pub name: String,
    pub platform: super::Platform,
    pub budget: i64,
    #[serde(flatten)]
    pub metrics: Metrics,
    /// Spend over budget, in percent.
    pub budget_usage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub campaigns: Vec<CampaignSummary>,
    pub total: Metrics,
    pub total_budget: i64,
    pub budget_usage: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub platform: Option<super::Platform>,
}

pub fn budget_usage(spend: i64, budget: i64) -> Option<f64> {
    ratio(spend * 100, budget)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratios_are_none_on_zero() {
        let m = Metrics { spend: 1_000, impressions: 0, clicks: 0, leads: 4, messages: 0, ..Default::default() }.derive();
        assert_eq!(m.ctr, None);
        assert_eq!(m.cost_per_lead, Some(250.0));
        assert_eq!(m.cost_per_message, None);
        assert_eq!(budget_usage(500, 0), None);
        assert_eq!(budget_usage(500, 2_000), Some(25.0));
    }
}
