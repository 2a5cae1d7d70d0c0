//! Pool redistribution
//!
//! Deficit members (request order) are raised to zero with surplus drawn
//! from donors in the configured `DonorOrder`. Surplus left after every
//! deficit is cured stays on its holder. A donor never gives below zero.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use fueleu_core::{ComplianceBalance, ShipId, Year};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::{DonorOrder, PoolingConfig};
use crate::error::{PoolError, PoolResult};
use crate::pool::{Pool, PoolAllocation};

/// A validated pool and its allocation rows, ready for one atomic write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolFormation {
    pub pool: Pool,
    pub allocations: Vec<PoolAllocation>,
}

impl PoolFormation {
    pub fn allocation_for(&self, ship_id: &ShipId) -> Option<&PoolAllocation> {
        self.allocations.iter().find(|a| &a.ship_id == ship_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PoolAllocator {
    config: PoolingConfig,
}

impl PoolAllocator {
    pub fn new(config: PoolingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PoolingConfig {
        &self.config
    }

    /// Validate and allocate a pool for `year`.
    ///
    /// `memberships` maps ships already pooled in `year` to their pool id.
    /// Duplicate ids in `member_ids` are collapsed, first position wins.
    pub fn form_pool(
        &self,
        year: Year,
        member_ids: &[ShipId],
        balances: &HashMap<ShipId, ComplianceBalance>,
        memberships: &HashMap<ShipId, String>,
    ) -> PoolResult<PoolFormation> {
        let members = distinct(member_ids);
        let required = self.config.min_members.max(2);
        if members.len() < required {
            return Err(PoolError::TooFewMembers {
                required,
                actual: members.len(),
            });
        }

        let mut pre = Vec::with_capacity(members.len());
        for ship_id in &members {
            let balance = balances
                .get(ship_id)
                .copied()
                .ok_or_else(|| PoolError::MissingBalance(ship_id.clone()))?;
            pre.push(balance);
        }

        for ship_id in &members {
            if let Some(pool_id) = memberships.get(ship_id) {
                return Err(PoolError::MembershipConflict {
                    ship_id: ship_id.clone(),
                    year,
                    pool_id: pool_id.clone(),
                });
            }
        }

        let aggregate: ComplianceBalance = pre.iter().copied().sum();
        if aggregate.is_deficit() {
            return Err(PoolError::NonCompliant { aggregate });
        }

        let post = self.allocate(&pre);
        verify(&members, &pre, &post)?;

        let pool_id = uuid::Uuid::new_v4().to_string();
        let allocations = members
            .iter()
            .zip(pre.iter().zip(post.iter()))
            .map(|(ship_id, (&pre_cb, &post_cb))| {
                PoolAllocation::new(pool_id.clone(), ship_id.clone(), pre_cb, post_cb)
            })
            .collect();

        info!(
            pool_id = %pool_id,
            year,
            members = members.len(),
            aggregate = %aggregate,
            "Pool allocated"
        );

        Ok(PoolFormation {
            pool: Pool {
                pool_id,
                year,
                members,
                aggregate_adjusted_cb: aggregate,
                created_at: Utc::now(),
            },
            allocations,
        })
    }

    /// Redistribute pre-pool balances. Index-aligned with the input.
    pub fn allocate(&self, pre: &[ComplianceBalance]) -> Vec<ComplianceBalance> {
        let mut post: Vec<Decimal> = pre.iter().map(|b| b.value()).collect();

        let mut donors: Vec<usize> = (0..pre.len()).filter(|&i| pre[i].is_surplus()).collect();
        // Stable sorts keep request order among equal surpluses
        match self.config.donor_order {
            DonorOrder::LargestSurplusFirst => donors.sort_by(|&a, &b| pre[b].cmp(&pre[a])),
            DonorOrder::SmallestSurplusFirst => donors.sort_by(|&a, &b| pre[a].cmp(&pre[b])),
            DonorOrder::MemberOrder => {}
        }

        for receiver in (0..pre.len()).filter(|&i| pre[i].is_deficit()) {
            for &donor in &donors {
                let need = -post[receiver];
                if need <= Decimal::ZERO {
                    break;
                }
                let give = need.min(post[donor]);
                if give <= Decimal::ZERO {
                    continue;
                }
                post[donor] -= give;
                post[receiver] += give;
                debug!(donor, receiver, amount = %give, "Pool transfer");
            }
        }

        post.into_iter().map(ComplianceBalance::new).collect()
    }
}

/// Post-conditions of an allocation: conservation, and no member's deficit
/// exposure grows.
pub fn verify(
    members: &[ShipId],
    pre: &[ComplianceBalance],
    post: &[ComplianceBalance],
) -> PoolResult<()> {
    let pre_total: ComplianceBalance = pre.iter().copied().sum();
    let post_total: ComplianceBalance = post.iter().copied().sum();
    if pre_total != post_total || pre.len() != post.len() {
        return Err(PoolError::ConservationViolation {
            pre_total,
            post_total,
        });
    }

    for ((ship_id, &pre_cb), &post_cb) in members.iter().zip(pre).zip(post) {
        if post_cb.deficit() > pre_cb.deficit() {
            return Err(PoolError::FairnessViolation {
                ship_id: ship_id.clone(),
                pre_cb,
                post_cb,
            });
        }
    }
    Ok(())
}

fn distinct(ids: &[ShipId]) -> Vec<ShipId> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn id(s: &str) -> ShipId {
        s.parse().unwrap()
    }

    fn cb(v: Decimal) -> ComplianceBalance {
        ComplianceBalance::new(v)
    }

    fn balances(pairs: &[(&str, Decimal)]) -> (Vec<ShipId>, HashMap<ShipId, ComplianceBalance>) {
        let ids = pairs.iter().map(|(s, _)| id(s)).collect();
        let map = pairs.iter().map(|(s, v)| (id(s), cb(*v))).collect();
        (ids, map)
    }

    fn post_of(formation: &PoolFormation, ship: &str) -> Decimal {
        formation
            .allocations
            .iter()
            .find(|a| a.ship_id == id(ship))
            .map(|a| a.post_cb.value())
            .unwrap()
    }

    #[test]
    fn test_largest_surplus_donates_first() {
        let allocator = PoolAllocator::default();
        let (ids, map) = balances(&[("A", dec!(-20)), ("B", dec!(50)), ("C", dec!(10))]);

        let formation = allocator.form_pool(2025, &ids, &map, &HashMap::new()).unwrap();

        assert_eq!(post_of(&formation, "A"), dec!(0));
        assert_eq!(post_of(&formation, "B"), dec!(30));
        assert_eq!(post_of(&formation, "C"), dec!(10));
        assert_eq!(formation.pool.aggregate_adjusted_cb, cb(dec!(40)));

        let post_total: ComplianceBalance = formation.allocations.iter().map(|a| a.post_cb).sum();
        assert_eq!(post_total, cb(dec!(40)));

        let a = formation.allocations.iter().find(|a| a.ship_id == id("A")).unwrap();
        assert_eq!(a.delta, cb(dec!(20)));
        assert!(formation.allocations.iter().all(|a| a.pool_id == formation.pool.pool_id));
    }

    #[test]
    fn test_negative_aggregate_is_rejected() {
        let allocator = PoolAllocator::default();
        let (ids, map) = balances(&[("A", dec!(-60)), ("B", dec!(10))]);

        let result = allocator.form_pool(2025, &ids, &map, &HashMap::new());

        assert_eq!(
            result,
            Err(PoolError::NonCompliant {
                aggregate: cb(dec!(-50))
            })
        );
    }

    #[test]
    fn test_zero_aggregate_cures_everything() {
        let allocator = PoolAllocator::default();
        let (ids, map) = balances(&[("A", dec!(-30)), ("B", dec!(-10)), ("C", dec!(25)), ("D", dec!(15))]);

        let formation = allocator.form_pool(2025, &ids, &map, &HashMap::new()).unwrap();

        for ship in ["A", "B", "C", "D"] {
            assert_eq!(post_of(&formation, ship), dec!(0));
        }
    }

    #[test]
    fn test_smallest_surplus_first_policy() {
        let allocator = PoolAllocator::new(PoolingConfig {
            donor_order: DonorOrder::SmallestSurplusFirst,
            ..PoolingConfig::default()
        });
        let (ids, map) = balances(&[("A", dec!(-20)), ("B", dec!(50)), ("C", dec!(10))]);

        let formation = allocator.form_pool(2025, &ids, &map, &HashMap::new()).unwrap();

        assert_eq!(post_of(&formation, "C"), dec!(0));
        assert_eq!(post_of(&formation, "B"), dec!(40));
        assert_eq!(post_of(&formation, "A"), dec!(0));
    }

    #[test]
    fn test_member_order_policy_ties() {
        let allocator = PoolAllocator::new(PoolingConfig {
            donor_order: DonorOrder::MemberOrder,
            ..PoolingConfig::default()
        });
        let post = allocator.allocate(&[cb(dec!(5)), cb(dec!(-8)), cb(dec!(50))]);
        assert_eq!(post, vec![cb(dec!(0)), cb(dec!(0)), cb(dec!(47))]);
    }

    #[test]
    fn test_equal_surplus_ties_keep_request_order() {
        let allocator = PoolAllocator::default();
        let post = allocator.allocate(&[cb(dec!(-5)), cb(dec!(10)), cb(dec!(10))]);
        assert_eq!(post, vec![cb(dec!(0)), cb(dec!(5)), cb(dec!(10))]);
    }

    #[test]
    fn test_all_surplus_pool_is_unchanged() {
        let allocator = PoolAllocator::default();
        let pre = vec![cb(dec!(1)), cb(dec!(0)), cb(dec!(7))];
        assert_eq!(allocator.allocate(&pre), pre);
    }

    #[test]
    fn test_membership_conflict() {
        let allocator = PoolAllocator::default();
        let (ids, map) = balances(&[("A", dec!(-1)), ("B", dec!(10))]);
        let memberships = HashMap::from([(id("B"), "POOL-1".to_string())]);

        let result = allocator.form_pool(2025, &ids, &map, &memberships);

        assert!(matches!(
            result,
            Err(PoolError::MembershipConflict { ref ship_id, ref pool_id, year: 2025 })
                if *ship_id == id("B") && pool_id == "POOL-1"
        ));
    }

    #[test]
    fn test_too_few_distinct_members() {
        let allocator = PoolAllocator::default();
        let (_, map) = balances(&[("A", dec!(10))]);

        let result = allocator.form_pool(2025, &[id("A"), id("a")], &map, &HashMap::new());

        assert_eq!(
            result,
            Err(PoolError::TooFewMembers {
                required: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_duplicates_collapse_in_order() {
        let allocator = PoolAllocator::default();
        let (_, map) = balances(&[("A", dec!(-1)), ("B", dec!(10))]);

        let formation = allocator
            .form_pool(2025, &[id("B"), id("A"), id("B")], &map, &HashMap::new())
            .unwrap();

        assert_eq!(formation.pool.members, vec![id("B"), id("A")]);
        assert_eq!(formation.allocations.len(), 2);
    }

    #[test]
    fn test_missing_balance() {
        let allocator = PoolAllocator::default();
        let (_, map) = balances(&[("A", dec!(10))]);

        let result = allocator.form_pool(2025, &[id("A"), id("Z")], &map, &HashMap::new());
        assert_eq!(result, Err(PoolError::MissingBalance(id("Z"))));
    }

    #[test]
    fn test_verify_rejects_worse_off_member() {
        let members = vec![id("A"), id("B")];

        // Deficit member pushed deeper
        let result = verify(
            &members,
            &[cb(dec!(-10)), cb(dec!(20))],
            &[cb(dec!(-15)), cb(dec!(25))],
        );
        assert!(matches!(result, Err(PoolError::FairnessViolation { ref ship_id, .. }) if *ship_id == id("A")));

        // Surplus member pushed below zero
        let result = verify(
            &members,
            &[cb(dec!(-10)), cb(dec!(5))],
            &[cb(dec!(0)), cb(dec!(-5))],
        );
        assert!(matches!(result, Err(PoolError::FairnessViolation { ref ship_id, .. }) if *ship_id == id("B")));
    }

    #[test]
    fn test_verify_rejects_created_balance() {
        let result = verify(
            &[id("A"), id("B")],
            &[cb(dec!(-10)), cb(dec!(20))],
            &[cb(dec!(0)), cb(dec!(20))],
        );
        assert!(matches!(result, Err(PoolError::ConservationViolation { .. })));
    }

    #[test]
    fn test_allocations_always_verify() {
        let allocator = PoolAllocator::default();
        let cases: Vec<Vec<Decimal>> = vec![
            vec![dec!(-1.5), dec!(0.75), dec!(0.75)],
            vec![dec!(-100), dec!(-0.01), dec!(33.33), dec!(67.68)],
            vec![dec!(0), dec!(-3), dec!(3)],
            vec![dec!(12.345678), dec!(-12.345678)],
        ];

        for case in cases {
            let pre: Vec<ComplianceBalance> = case.into_iter().map(cb).collect();
            let members: Vec<ShipId> = (0..pre.len()).map(|i| id(&format!("S{i}"))).collect();
            let post = allocator.allocate(&pre);

            assert!(verify(&members, &pre, &post).is_ok());
            for (p, q) in pre.iter().zip(&post) {
                if p.is_deficit() {
                    assert_eq!(*q, ComplianceBalance::ZERO);
                }
            }
        }
    }
}
