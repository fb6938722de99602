//! Vote counting and the consensus decision table
//!
//! Budgeting and investment vote; the guardrail capability does not vote
//! but can veto.

use super::analysis::{
    AgentConsensus, ConsensusLevel, Contradiction, ContradictionSeverity, OverallConfidence,
    OverallRecommendation, Recommendation,
};
use super::AgentCapability;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Approve,
    Caution,
    Oppose,
}

impl Recommendation {
    /// `blocked` is a guardrail verdict, not a vote, and abstains
    pub fn vote(&self) -> Option<Vote> {
        match self {
            Recommendation::StronglyApprove | Recommendation::Approve => Some(Vote::Approve),
            Recommendation::ApproveWithCaution => Some(Vote::Caution),
            Recommendation::NotRecommended | Recommendation::StronglyOppose => Some(Vote::Oppose),
            Recommendation::Blocked => None,
        }
    }
}

impl AgentConsensus {
    pub fn tally(recommendations: &[Recommendation]) -> Self {
        let count = |vote: Vote| {
            recommendations
                .iter()
                .filter(|r| r.vote() == Some(vote))
                .count() as u32
        };

        let agents_approving = count(Vote::Approve);
        let agents_cautioning = count(Vote::Caution);
        let agents_opposing = count(Vote::Oppose);

        Self {
            agents_approving,
            agents_cautioning,
            agents_opposing,
            consensus_level: consensus_level(agents_approving, agents_cautioning, agents_opposing),
        }
    }
}

/// Fixed decision table, evaluated top to bottom
pub fn consensus_level(approving: u32, cautioning: u32, opposing: u32) -> ConsensusLevel {
    if approving == 2 && cautioning == 0 && opposing == 0 {
        ConsensusLevel::Unanimous
    } else if approving >= 1 && opposing == 0 {
        ConsensusLevel::Strong
    } else if approving + cautioning >= opposing {
        ConsensusLevel::Moderate
    } else if opposing > 0 {
        ConsensusLevel::Weak
    } else {
        // Unreachable with non-negative counts; kept for larger voter sets
        ConsensusLevel::Divided
    }
}

/// Map consensus to a recommendation; a guardrail block always wins
pub fn decide(
    consensus: &AgentConsensus,
    guardrail_can_proceed: bool,
) -> (OverallRecommendation, OverallConfidence) {
    if !guardrail_can_proceed {
        return (OverallRecommendation::DoNotProceed, OverallConfidence::High);
    }

    match consensus.consensus_level {
        ConsensusLevel::Unanimous | ConsensusLevel::Strong => {
            let recommendation = if consensus.agents_cautioning > 0 {
                OverallRecommendation::ProceedWithCaution
            } else {
                OverallRecommendation::ProceedConfidently
            };
            (recommendation, OverallConfidence::High)
        }
        ConsensusLevel::Moderate => (
            OverallRecommendation::ProceedWithCaution,
            OverallConfidence::Medium,
        ),
        ConsensusLevel::Weak | ConsensusLevel::Divided => {
            (OverallRecommendation::Reconsider, OverallConfidence::Low)
        }
    }
}

/// An approving voter against an opposing one
pub fn contradictions(budgeting: Recommendation, investment: Recommendation) -> Vec<Contradiction> {
    let votes = (budgeting.vote(), investment.vote());
    if !matches!(
        votes,
        (Some(Vote::Approve), Some(Vote::Oppose)) | (Some(Vote::Oppose), Some(Vote::Approve))
    ) {
        return Vec::new();
    }

    let strong = |r: Recommendation| {
        matches!(
            r,
            Recommendation::StronglyApprove | Recommendation::StronglyOppose
        )
    };

    vec![Contradiction {
        agent_a: AgentCapability::Budgeting,
        agent_b: AgentCapability::Investment,
        description: format!("budgeting {:?} vs investment {:?}", budgeting, investment),
        severity: if strong(budgeting) || strong(investment) {
            ContradictionSeverity::Major
        } else {
            ContradictionSeverity::Minor
        },
    }]
}

impl OverallRecommendation {
    pub fn is_proceed(&self) -> bool {
        matches!(
            self,
            OverallRecommendation::ProceedConfidently
                | OverallRecommendation::Proceed
                | OverallRecommendation::ProceedWithCaution
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use ConsensusLevel::*;
    use OverallConfidence as C;
    use OverallRecommendation as R;

    const APPROVE: Recommendation = Recommendation::Approve;
    const CAUTION: Recommendation = Recommendation::ApproveWithCaution;
    const OPPOSE: Recommendation = Recommendation::NotRecommended;

    #[test]
    fn test_vote_buckets() {
        assert_eq!(Recommendation::StronglyApprove.vote(), Some(Vote::Approve));
        assert_eq!(Recommendation::StronglyOppose.vote(), Some(Vote::Oppose));
        assert_eq!(Recommendation::Blocked.vote(), None);
    }

    #[test]
    fn test_blocked_abstains_from_tally() {
        let consensus = AgentConsensus::tally(&[APPROVE, Recommendation::Blocked]);

        assert_eq!(consensus.agents_approving, 1);
        assert_eq!(consensus.agents_opposing, 0);
        assert_eq!(consensus.consensus_level, Strong);
        assert_eq!(decide(&consensus, true), (R::ProceedConfidently, C::High));
        assert!(contradictions(APPROVE, Recommendation::Blocked).is_empty());
    }

    #[test]
    fn test_decision_table_all_vote_pairs() {
        let cases = [
            (APPROVE, APPROVE, Unanimous, R::ProceedConfidently, C::High),
            (APPROVE, CAUTION, Strong, R::ProceedWithCaution, C::High),
            (APPROVE, OPPOSE, Moderate, R::ProceedWithCaution, C::Medium),
            (CAUTION, APPROVE, Strong, R::ProceedWithCaution, C::High),
            (CAUTION, CAUTION, Moderate, R::ProceedWithCaution, C::Medium),
            (CAUTION, OPPOSE, Moderate, R::ProceedWithCaution, C::Medium),
            (OPPOSE, APPROVE, Moderate, R::ProceedWithCaution, C::Medium),
            (OPPOSE, CAUTION, Moderate, R::ProceedWithCaution, C::Medium),
            (OPPOSE, OPPOSE, Weak, R::Reconsider, C::Low),
        ];

        for (budgeting, investment, level, recommendation, confidence) in cases {
            let consensus = AgentConsensus::tally(&[budgeting, investment]);
            assert_eq!(
                consensus.consensus_level, level,
                "{:?}/{:?}",
                budgeting, investment
            );
            assert_eq!(decide(&consensus, true), (recommendation, confidence));
        }
    }

    #[test]
    fn test_guardrail_veto_wins() {
        let consensus = AgentConsensus::tally(&[APPROVE, APPROVE]);
        assert_eq!(
            decide(&consensus, false),
            (R::DoNotProceed, C::High)
        );
        assert!(!R::DoNotProceed.is_proceed());
        assert!(R::Proceed.is_proceed());
    }

    #[test]
    fn test_contradiction_only_for_approve_against_oppose() {
        assert!(contradictions(APPROVE, CAUTION).is_empty());
        assert!(contradictions(CAUTION, OPPOSE).is_empty());

        let found = contradictions(Recommendation::StronglyApprove, OPPOSE);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, ContradictionSeverity::Major);
        assert_eq!(contradictions(OPPOSE, APPROVE)[0].severity, ContradictionSeverity::Minor);
    }

    #[test]
    fn test_divided_unreachable_for_two_voters() {
        for approving in 0..=2u32 {
            for cautioning in 0..=(2 - approving) {
                let opposing = 2 - approving - cautioning;
                assert_ne!(consensus_level(approving, cautioning, opposing), Divided);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_divided_unreachable(a in 0u32..1000, c in 0u32..1000, o in 0u32..1000) {
            prop_assert_ne!(consensus_level(a, c, o), Divided);
        }
    }
}
