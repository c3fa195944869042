use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{DeadlineType, ProjectType, TriggerEvent};

/// Statutory offset for one (rule type, project type) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LienRule {
    pub rule_type: DeadlineType,
    pub project_type: ProjectType,
    pub deadline_days: u32,
    pub description: String,
    pub trigger_event: TriggerEvent,
    pub statutory_reference: String,
}

impl LienRule {
    fn seed(
        rule_type: DeadlineType,
        project_type: ProjectType,
        deadline_days: u32,
        trigger_event: TriggerEvent,
        description: &str,
        statutory_reference: &str,
    ) -> Self {
        Self {
            rule_type,
            project_type,
            deadline_days,
            description: description.to_string(),
            trigger_event,
            statutory_reference: statutory_reference.to_string(),
        }
    }
}

/// Read-only lookup table of lien rules keyed by (rule type, project type).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LienRuleTable {
    rules: BTreeMap<(DeadlineType, ProjectType), LienRule>,
}

impl LienRuleTable {
    /// Rule set seeded into a fresh database.
    ///
    /// `mechanics_lien` has no public row: public property cannot be liened, so the
    /// bond claim takes its place. `custom` deadlines never have a statutory rule.
    pub fn standard() -> Self {
        use DeadlineType::*;
        use ProjectType::*;
        use TriggerEvent::*;

        Self::from_rules([
            LienRule::seed(
                PreliminaryNotice,
                Private,
                10,
                FirstFurnishing,
                "Serve preliminary notice on the owner and lender after first furnishing labor or materials",
                "Private works mechanics lien statute, preliminary notice provision",
            ),
            LienRule::seed(
                PreliminaryNotice,
                Public,
                20,
                FirstFurnishing,
                "Serve preliminary notice on the public entity and prime contractor",
                "Public works payment statute, preliminary notice provision",
            ),
            LienRule::seed(
                MechanicsLien,
                Private,
                120,
                Completion,
                "Record the mechanics lien after completion of the work of improvement",
                "Private works mechanics lien statute, recording period",
            ),
            LienRule::seed(
                PaymentBondClaim,
                Public,
                120,
                Completion,
                "Give notice of claim against the public payment bond",
                "Public works payment bond statute, claim period",
            ),
            LienRule::seed(
                PaymentBondClaim,
                Private,
                90,
                Completion,
                "Give notice of claim against a private payment bond",
                "Private payment bond statute, claim period",
            ),
            LienRule::seed(
                RetainageRelease,
                Private,
                45,
                Completion,
                "Request release of retained funds after completion",
                "Private prompt payment statute, retention release",
            ),
            LienRule::seed(
                RetainageRelease,
                Public,
                60,
                Completion,
                "Request release of retained funds from the public entity",
                "Public prompt payment statute, retention release",
            ),
        ])
    }

    /// Builds a table from stored rows. A later row for the same key replaces an earlier one.
    pub fn from_rules(rules: impl IntoIterator<Item = LienRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| ((rule.rule_type, rule.project_type), rule))
            .collect();
        Self { rules }
    }

    pub fn lookup(&self, rule_type: DeadlineType, project_type: ProjectType) -> Option<&LienRule> {
        self.rules.get(&(rule_type, project_type))
    }

    pub fn rules(&self) -> impl Iterator<Item = &LienRule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
