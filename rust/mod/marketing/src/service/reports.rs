use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use clinic_core::{merge_patch, new_id, now_rfc3339, Filter, ListResult, Principal, ServiceError};
use clinic_sql::Value;

use crate::model::{
    budget_usage, Campaign, CampaignQuery, CampaignSummary, CreateReport, DailyReport, MarketingSummary, Metrics,
    ReportQuery, SummaryQuery,
};
use crate::service::{page, require_reader, require_writer, MarketingService, CAMPAIGNS, REPORTS};

const PROTECTED: [&str; 6] = ["id", "campaignId", "reportDate", "createdBy", "createdAt", "updatedAt"];

fn indexes(r: &DailyReport) -> Vec<(&'static str, Value)> {
    vec![
        ("campaign_id", Value::from(r.campaign_id.as_str())),
        ("report_date", Value::from(r.report_date.to_string())),
        ("spend", Value::from(r.spend)),
        ("impressions", Value::from(r.impressions)),
        ("clicks", Value::from(r.clicks)),
        ("leads", Value::from(r.leads)),
        ("messages", Value::from(r.messages)),
        ("updated_at", Value::from(r.updated_at.as_str())),
    ]
}

fn validate(r: &DailyReport) -> Result<(), ServiceError> {
    if [r.spend, r.impressions, r.clicks, r.leads, r.messages].iter().any(|n| *n < 0) {
        return Err(ServiceError::Validation("report figures cannot be negative".into()));
    }
    if r.clicks > r.impressions && r.impressions > 0 {
        return Err(ServiceError::Validation("clicks exceed impressions".into()));
    }
    Ok(())
}

impl MarketingService {
    /// Record one day of results. One report per campaign and date.
    pub fn create_report(&self, caller: &Principal, input: CreateReport) -> Result<DailyReport, ServiceError> {
        require_writer(caller)?;
        let campaign: Campaign = CAMPAIGNS.get(self.sql.as_ref(), &input.campaign_id)?;
        if input.report_date < campaign.start_date {
            return Err(ServiceError::Validation(format!(
                "campaign starts on {}",
                campaign.start_date
            )));
        }
        let now = now_rfc3339();
        let report = DailyReport {
            id: new_id(),
            campaign_id: campaign.id,
            report_date: input.report_date,
            spend: input.spend,
            impressions: input.impressions,
            clicks: input.clicks,
            leads: input.leads,
            messages: input.messages,
            created_by: caller.staff_id.clone(),
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        validate(&report)?;
        let mut idx = indexes(&report);
        idx.push(("created_at", Value::from(now)));
        REPORTS
            .insert(self.sql.as_ref(), &report.id, &report, &idx)
            .map_err(|e| match e {
                ServiceError::Conflict(_) => ServiceError::Conflict(format!(
                    "a report for {} already exists for this campaign",
                    report.report_date
                )),
                other => other,
            })?;
        info!(campaign = %report.campaign_id, date = %report.report_date, spend = report.spend, "recorded daily report");
        Ok(report)
    }

    pub fn list_reports(&self, caller: &Principal, query: &ReportQuery) -> Result<ListResult<DailyReport>, ServiceError> {
        require_reader(caller)?;
        let mut filter = Filter::new().eq_opt("campaign_id", query.campaign_id.clone());
        if let Some(from) = query.from {
            filter = filter.gte("report_date", from.to_string());
        }
        if let Some(to) = query.to {
            filter = filter.lte("report_date", to.to_string());
        }
        let (limit, offset) = page(query.limit, query.offset);
        REPORTS.list(self.sql.as_ref(), &filter, "report_date DESC, campaign_id", limit, offset)
    }

    /// Correct the figures of a report. Campaign and date are fixed.
    pub fn update_report(
        &self,
        caller: &Principal,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<DailyReport, ServiceError> {
        require_writer(caller)?;
        let current: DailyReport = REPORTS.get(self.sql.as_ref(), id)?;
        let original = serde_json::to_value(&current)?;
        let mut base = original.clone();
        merge_patch(&mut base, &patch);
        for key in PROTECTED {
            base[key] = original[key].clone();
        }
        base["updatedAt"] = serde_json::json!(now_rfc3339());
        let updated: DailyReport = serde_json::from_value(base)
            .map_err(|e| ServiceError::Validation(format!("invalid report: {e}")))?;
        validate(&updated)?;
        REPORTS.update(self.sql.as_ref(), id, &updated, &indexes(&updated))?;
        Ok(updated)
    }

    pub fn delete_report(&self, caller: &Principal, id: &str) -> Result<(), ServiceError> {
        require_writer(caller)?;
        REPORTS.delete(self.sql.as_ref(), id)
    }

    /// Totals and ratios per campaign and overall for `[from, to]`.
    ///
    /// Inactive campaigns without results in the range are left out.
    pub fn summary(&self, caller: &Principal, query: &SummaryQuery) -> Result<MarketingSummary, ServiceError> {
        require_reader(caller)?;
        if query.to < query.from {
            return Err(ServiceError::Validation("range ends before it starts".into()));
        }
        let sums = self.sum_by_campaign(query.from, query.to)?;
        let campaigns = self.list_campaigns(caller, &CampaignQuery { platform: query.platform, active: None })?;

        let mut total = Metrics::default();
        let mut total_budget = 0;
        let mut lines = Vec::new();
        for campaign in campaigns {
            let metrics = match sums.get(&campaign.id) {
                Some(m) => m.clone(),
                None if !campaign.active => continue,
                None => Metrics::default(),
            };
            total.add(&metrics);
            total_budget += campaign.budget;
            lines.push(CampaignSummary {
                budget_usage: budget_usage(metrics.spend, campaign.budget),
                campaign_id: campaign.id,
                name: campaign.name,
                platform: campaign.platform,
                budget: campaign.budget,
                metrics: metrics.derive(),
            });
        }
        lines.sort_by(|a, b| b.metrics.spend.cmp(&a.metrics.spend).then_with(|| a.name.cmp(&b.name)));

        Ok(MarketingSummary {
            from: query.from,
            to: query.to,
            campaigns: lines,
            budget_usage: budget_usage(total.spend, total_budget),
            total: total.derive(),
            total_budget,
        })
    }

    fn sum_by_campaign(&self, from: NaiveDate, to: NaiveDate) -> Result<HashMap<String, Metrics>, ServiceError> {
        let rows = self.sql.query(
            "SELECT campaign_id,
                    SUM(spend) AS spend, SUM(impressions) AS impressions, SUM(clicks) AS clicks,
                    SUM(leads) AS leads, SUM(messages) AS messages
             FROM mkt_reports
             WHERE report_date >= ?1 AND report_date <= ?2
             GROUP BY campaign_id",
            &[Value::from(from.to_string()), Value::from(to.to_string())],
        )?;
        debug!(campaigns = rows.len(), %from, %to, "summed marketing reports");
        let mut sums = HashMap::new();
        for row in &rows {
            let Some(id) = row.get_str("campaign_id") else { continue };
            let n = |col: &str| row.get_i64(col).unwrap_or(0);
            sums.insert(
                id.to_string(),
                Metrics {
                    spend: n("spend"),
                    impressions: n("impressions"),
                    clicks: n("clicks"),
                    leads: n("leads"),
                    messages: n("messages"),
                    ..Default::default()
                },
            );
        }
        Ok(sums)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreateCampaign, Platform};
    use crate::service::testing::{day, marketer, service, who};
    use clinic_core::Role;

    fn campaign(svc: &MarketingService, name: &str, platform: Platform, budget: i64) -> Campaign {
        svc.create_campaign(
            &marketer(),
            CreateCampaign { name: name.into(), platform, start_date: day(3, 1), end_date: None, budget, note: None },
        )
        .unwrap()
    }

    fn report(campaign_id: &str, d: u32, spend: i64, leads: i64) -> CreateReport {
        CreateReport {
            campaign_id: campaign_id.into(),
            report_date: day(3, d),
            spend,
            impressions: 1_000,
            clicks: 50,
            leads,
            messages: 0,
        }
    }

    #[test]
    fn one_report_per_day() {
        let svc = service();
        let c = campaign(&svc, "Peel", Platform::Facebook, 1_000_000);
        svc.create_report(&marketer(), report(&c.id, 2, 100_000, 5)).unwrap();
        assert!(matches!(
            svc.create_report(&marketer(), report(&c.id, 2, 1, 1)),
            Err(ServiceError::Conflict(_))
        ));
        let mut early = report(&c.id, 1, 0, 0);
        early.report_date = day(2, 27);
        assert!(matches!(svc.create_report(&marketer(), early), Err(ServiceError::Validation(_))));
        assert!(matches!(
            svc.create_report(&who(Role::Accountant), report(&c.id, 3, 1, 1)),
            Err(ServiceError::PermissionDenied(_))
        ));
    }

    #[test]
    fn summary_with_ratios() {
        let svc = service();
        let fb = campaign(&svc, "Peel", Platform::Facebook, 1_000_000);
        let gg = campaign(&svc, "Laser", Platform::Google, 0);
        svc.create_report(&marketer(), report(&fb.id, 2, 100_000, 4)).unwrap();
        svc.create_report(&marketer(), report(&fb.id, 3, 150_000, 1)).unwrap();
        svc.create_report(&marketer(), report(&gg.id, 2, 30_000, 0)).unwrap();
        svc.create_report(&marketer(), report(&gg.id, 20, 99_000, 3)).unwrap();

        let s = svc
            .summary(&who(Role::Accountant), &SummaryQuery { from: day(3, 1), to: day(3, 10), platform: None })
            .unwrap();
        assert_eq!(s.campaigns.len(), 2);
        let peel = &s.campaigns[0];
        assert_eq!(peel.metrics.spend, 250_000);
        assert_eq!(peel.metrics.cost_per_lead, Some(50_000.0));
        assert_eq!(peel.metrics.ctr, Some(5.0));
        assert_eq!(peel.metrics.cost_per_message, None);
        assert_eq!(peel.budget_usage, Some(25.0));

        let laser = &s.campaigns[1];
        assert_eq!(laser.metrics.cost_per_lead, None);
        assert_eq!(laser.budget_usage, None);

        assert_eq!(s.total.spend, 280_000);
        assert_eq!(s.total.leads, 5);
        assert_eq!(s.total_budget, 1_000_000);
        assert_eq!(s.budget_usage, Some(28.0));

        let google = svc
            .summary(&marketer(), &SummaryQuery { from: day(3, 1), to: day(3, 31), platform: Some(Platform::Google) })
            .unwrap();
        assert_eq!(google.campaigns.len(), 1);
        assert_eq!(google.total.spend, 129_000);
    }
}
