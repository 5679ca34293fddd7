//! Prompt construction for the budget-decision request.

use core::fmt::Write as _;

use crate::adapter::BudgetSnapshot;

/// Build the structured decision prompt for one organization's cycle.
///
/// The response contract mirrors the deterministic ruleset's vocabulary so
/// oracle and fallback decisions stay interchangeable downstream.
pub fn build_decision_prompt(snapshot: &BudgetSnapshot) -> String {
    let mut prompt = String::with_capacity(1024);

    let _ = writeln!(
        prompt,
        "You are a marketing budget analyst. Total allocated budget: {:.2}.",
        snapshot.total_budget
    );
    let _ = writeln!(
        prompt,
        "Campaigns, ranked by ROI (percent, best first):"
    );

    for (rank, line) in snapshot.campaigns.iter().enumerate() {
        let _ = writeln!(
            prompt,
            "{}. {} (id {}): budget {:.2}, spend {:.2}, revenue {:.2}, roi {:.1}%, conversions {}",
            rank + 1,
            line.name,
            line.campaign_id,
            line.budget,
            line.spend,
            line.revenue,
            line.roi,
            line.conversions,
        );
    }

    prompt.push_str(concat!(
        "\nRespond with a single JSON object and no other text:\n",
        "{\"decisions\": [{\"campaign_id\": \"<id>\", \"action\": ",
        "\"SCALE|MAINTAIN|OPTIMIZE|REDUCE|PAUSE\", \"new_budget\": <number >= 0>, ",
        "\"rationale\": \"<one sentence>\"}], ",
        "\"reallocation\": \"<optional cross-channel suggestion>\"}\n",
        "Include one entry per campaign listed above.\n",
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::CampaignBudgetLine;
    use adhelm_core::{CampaignId, OrganizationId};

    #[test]
    fn prompt_ranks_and_names_campaigns() {
        let loser = CampaignId::new();
        let winner = CampaignId::new();
        let snapshot = BudgetSnapshot::new(
            OrganizationId::new(),
            vec![
                CampaignBudgetLine {
                    campaign_id: loser,
                    name: "retargeting".to_string(),
                    budget: 50.0,
                    spend: 50.0,
                    revenue: 40.0,
                    roi: -20.0,
                    conversions: 1,
                },
                CampaignBudgetLine {
                    campaign_id: winner,
                    name: "spring_sale".to_string(),
                    budget: 100.0,
                    spend: 100.0,
                    revenue: 500.0,
                    roi: 400.0,
                    conversions: 12,
                },
            ],
        );

        let prompt = build_decision_prompt(&snapshot);

        let winner_pos = prompt.find("spring_sale").unwrap();
        let loser_pos = prompt.find("retargeting").unwrap();
        assert!(winner_pos < loser_pos);
        assert!(prompt.contains(&winner.to_string()));
        assert!(prompt.contains("SCALE|MAINTAIN|OPTIMIZE|REDUCE|PAUSE"));
    }
}
