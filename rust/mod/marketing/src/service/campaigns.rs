use tracing::info;

use clinic_core::{merge_patch, new_id, now_rfc3339, Filter, Principal, ServiceError};
use clinic_sql::Value;

use crate::model::{Campaign, CampaignQuery, CreateCampaign};
use crate::service::{require_reader, require_writer, MarketingService, CAMPAIGNS};

const PROTECTED: [&str; 4] = ["id", "createdBy", "createdAt", "updatedAt"];

fn indexes(c: &Campaign) -> Vec<(&'static str, Value)> {
    vec![
        ("name", Value::from(c.name.as_str())),
        ("platform", Value::from(c.platform.as_str())),
        ("active", Value::from(c.active)),
        ("start_date", Value::from(c.start_date.to_string())),
        ("updated_at", Value::from(c.updated_at.as_str())),
    ]
}

fn validate(c: &Campaign) -> Result<(), ServiceError> {
    if c.name.trim().is_empty() {
        return Err(ServiceError::Validation("campaign name is required".into()));
    }
    if c.budget < 0 {
        return Err(ServiceError::Validation("budget cannot be negative".into()));
    }
    if c.end_date.is_some_and(|end| end < c.start_date) {
        return Err(ServiceError::Validation("campaign ends before it starts".into()));
    }
    Ok(())
}

impl MarketingService {
    pub fn create_campaign(&self, caller: &Principal, input: CreateCampaign) -> Result<Campaign, ServiceError> {
        require_writer(caller)?;
        let now = now_rfc3339();
        let campaign = Campaign {
            id: new_id(),
            name: input.name.trim().to_string(),
            platform: input.platform,
            start_date: input.start_date,
            end_date: input.end_date,
            budget: input.budget,
            active: true,
            note: input.note,
            created_by: caller.staff_id.clone(),
            created_at: now.clone(),
            updated_at: now.clone(),
        };
        validate(&campaign)?;
        let mut idx = indexes(&campaign);
        idx.push(("created_at", Value::from(now)));
        CAMPAIGNS.insert(self.sql.as_ref(), &campaign.id, &campaign, &idx)?;
        info!(campaign = %campaign.id, platform = %campaign.platform, "created campaign");
        Ok(campaign)
    }

    pub fn get_campaign(&self, caller: &Principal, id: &str) -> Result<Campaign, ServiceError> {
        require_reader(caller)?;
        CAMPAIGNS.get(self.sql.as_ref(), id)
    }

    pub fn list_campaigns(&self, caller: &Principal, query: &CampaignQuery) -> Result<Vec<Campaign>, ServiceError> {
        require_reader(caller)?;
        let filter = Filter::new()
            .eq_opt("platform", query.platform.map(|p| p.as_str()))
            .eq_opt("active", query.active);
        CAMPAIGNS.select(self.sql.as_ref(), &filter, "start_date DESC, name")
    }

    pub fn update_campaign(
        &self,
        caller: &Principal,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Campaign, ServiceError> {
        require_writer(caller)?;
        let current: Campaign = CAMPAIGNS.get(self.sql.as_ref(), id)?;
        let original = serde_json::to_value(&current)?;
        let mut base = original.clone();
        merge_patch(&mut base, &patch);
        for key in PROTECTED {
            base[key] = original[key].clone();
        }
        base["updatedAt"] = serde_json::json!(now_rfc3339());
        let updated: Campaign = serde_json::from_value(base)
            .map_err(|e| ServiceError::Validation(format!("invalid campaign: {e}")))?;
        validate(&updated)?;
        CAMPAIGNS.update(self.sql.as_ref(), id, &updated, &indexes(&updated))?;
        Ok(updated)
    }

    /// Remove a campaign together with its daily reports.
    pub fn delete_campaign(&self, caller: &Principal, id: &str) -> Result<(), ServiceError> {
        require_writer(caller)?;
        CAMPAIGNS.delete(self.sql.as_ref(), id)?;
        info!(campaign = %id, by = %caller.staff_id, "deleted campaign");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Platform;
    use crate::service::testing::{day, marketer, service, who};
    use clinic_core::Role;

    #[test]
    fn campaign_lifecycle() {
        let svc = service();
        let c = svc
            .create_campaign(
                &marketer(),
                CreateCampaign {
                    name: " Spring peel ".into(),
                    platform: Platform::Facebook,
                    start_date: day(3, 1),
                    end_date: Some(day(3, 31)),
                    budget: 10_000_000,
                    note: None,
                },
            )
            .unwrap();
        assert_eq!(c.name, "Spring peel");

        let bad = svc.update_campaign(&marketer(), &c.id, serde_json::json!({"endDate": "2026-02-01"}));
        assert!(matches!(bad, Err(ServiceError::Validation(_))));
        let off = svc
            .update_campaign(&marketer(), &c.id, serde_json::json!({"active": false, "createdBy": "z"}))
            .unwrap();
        assert!(!off.active);
        assert_eq!(off.created_by, "mk1");

        let q = CampaignQuery { platform: Some(Platform::Facebook), active: Some(true) };
        assert!(svc.list_campaigns(&marketer(), &q).unwrap().is_empty());
        assert!(matches!(
            svc.list_campaigns(&who(Role::Telesale), &CampaignQuery::default()),
            Err(ServiceError::PermissionDenied(_))
        ));

        svc.delete_campaign(&marketer(), &c.id).unwrap();
        assert!(matches!(svc.get_campaign(&marketer(), &c.id), Err(ServiceError::NotFound(_))));
    }
}
