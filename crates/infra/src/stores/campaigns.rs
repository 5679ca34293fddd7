use adhelm_budget::{CampaignDirectory, CampaignState, CampaignStatus};
use adhelm_core::{CampaignId, OrganizationId, StoreError};
use adhelm_scoring::CampaignPerformanceSnapshot;

use super::org_store::InMemoryOrgStore;

/// In-memory campaign directory.
///
/// `update_budget` is a single serialized read-modify-write per row; a PAUSE
/// also deactivates the campaign so the next cycle no longer loads it.
#[derive(Debug, Default)]
pub struct InMemoryCampaignDirectory {
    inner: InMemoryOrgStore<CampaignId, CampaignState>,
}

impl InMemoryCampaignDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a campaign (test/dev composition).
    pub fn insert(&self, organization_id: OrganizationId, campaign: CampaignState) {
        self.inner
            .upsert(organization_id, campaign.campaign_id, campaign);
    }

    pub fn get(
        &self,
        organization_id: OrganizationId,
        campaign_id: CampaignId,
    ) -> Option<CampaignState> {
        self.inner.get(organization_id, &campaign_id)
    }

    /// Overwrite a campaign's derived snapshot (the per-cycle metrics sync).
    ///
    /// Snapshots carry no history; the audit trail does.
    pub fn refresh_snapshot(
        &self,
        organization_id: OrganizationId,
        snapshot: CampaignPerformanceSnapshot,
    ) -> Result<(), StoreError> {
        let campaign_id = snapshot.campaign_id;
        let updated = self.inner.update(organization_id, &campaign_id, |campaign| {
            campaign.snapshot = snapshot;
        });

        if updated {
            Ok(())
        } else {
            Err(StoreError::corrupt(format!(
                "campaign {campaign_id} not found for snapshot refresh"
            )))
        }
    }
}

impl CampaignDirectory for InMemoryCampaignDirectory {
    fn active_campaigns(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<CampaignState>, StoreError> {
        let mut campaigns: Vec<CampaignState> = self
            .inner
            .list(organization_id)
            .into_iter()
            .filter(|c| c.status == CampaignStatus::Active)
            .collect();
        campaigns.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(campaigns)
    }

    fn update_budget(
        &self,
        organization_id: OrganizationId,
        campaign_id: CampaignId,
        new_budget: f64,
        pause: bool,
    ) -> Result<(), StoreError> {
        let updated = self.inner.update(organization_id, &campaign_id, |campaign| {
            campaign.budget = new_budget;
            if pause {
                campaign.status = CampaignStatus::Paused;
            }
        });

        if updated {
            Ok(())
        } else {
            Err(StoreError::corrupt(format!(
                "campaign {campaign_id} not found for budget update"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn campaign(name: &str, budget: f64) -> CampaignState {
        let id = CampaignId::new();
        CampaignState {
            campaign_id: id,
            name: name.to_string(),
            budget,
            status: CampaignStatus::Active,
            snapshot: CampaignPerformanceSnapshot::from_raw(
                id, name, budget, 1_000, 50, 5, budget * 2.0, Utc::now(),
            ),
        }
    }

    #[test]
    fn pause_deactivates_the_campaign() {
        let directory = InMemoryCampaignDirectory::new();
        let org = OrganizationId::new();
        let c = campaign("retargeting", 100.0);
        let id = c.campaign_id;
        directory.insert(org, c);

        directory.update_budget(org, id, 0.0, true).unwrap();

        assert!(directory.active_campaigns(org).unwrap().is_empty());
        let paused = directory.get(org, id).unwrap();
        assert_eq!(paused.budget, 0.0);
        assert_eq!(paused.status, CampaignStatus::Paused);
    }

    #[test]
    fn refresh_overwrites_the_snapshot_in_place() {
        let directory = InMemoryCampaignDirectory::new();
        let org = OrganizationId::new();
        let c = campaign("search", 100.0);
        let id = c.campaign_id;
        directory.insert(org, c);

        let fresh = CampaignPerformanceSnapshot::from_raw(
            id, "search", 120.0, 2_000, 80, 9, 480.0, Utc::now(),
        );
        directory.refresh_snapshot(org, fresh.clone()).unwrap();

        let state = directory.get(org, id).unwrap();
        assert_eq!(state.snapshot, fresh);
        // Allocation is untouched by a metrics refresh.
        assert_eq!(state.budget, 100.0);
    }

    #[test]
    fn updating_a_missing_campaign_is_a_store_error() {
        let directory = InMemoryCampaignDirectory::new();
        let err = directory
            .update_budget(OrganizationId::new(), CampaignId::new(), 10.0, false)
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
