//! The economy ledger: a single non-negative currency balance.
//!
//! Placement spends, removal refunds the full placement cost, and sellers
//! credit the value of every item they take in.

use crate::building::BuildingKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Currency amount. Unsigned, so a balance can never go below zero.
pub type Credits = u64;

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Currency balance plus running totals for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    balance: Credits,
    total_spent: Credits,
    total_credited: Credits,
}

impl Ledger {
    /// Start with the given grant.
    pub fn new(starting_balance: Credits) -> Self {
        Self {
            balance: starting_balance,
            total_spent: 0,
            total_credited: 0,
        }
    }

    pub fn balance(&self) -> Credits {
        self.balance
    }

    pub fn can_afford(&self, amount: Credits) -> bool {
        self.balance >= amount
    }

    /// Debit `amount` if the balance covers it. Returns whether it did;
    /// the balance is untouched on `false`.
    #[must_use = "a failed spend means the purchase must not happen"]
    pub fn try_spend(&mut self, amount: Credits) -> bool {
        if !self.can_afford(amount) {
            return false;
        }
        self.balance -= amount;
        self.total_spent += amount;
        true
    }

    pub fn credit(&mut self, amount: Credits) {
        self.balance = self.balance.saturating_add(amount);
        self.total_credited = self.total_credited.saturating_add(amount);
    }

    pub fn total_spent(&self) -> Credits {
        self.total_spent
    }

    pub fn total_credited(&self) -> Credits {
        self.total_credited
    }
}

// ---------------------------------------------------------------------------
// Costs
// ---------------------------------------------------------------------------

/// Placement cost per building kind. Removal refunds exactly this amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostTable {
    costs: BTreeMap<BuildingKind, Credits>,
}

impl CostTable {
    /// Look up a kind's cost. Kinds missing from the table are free.
    pub fn cost(&self, kind: BuildingKind) -> Credits {
        self.costs.get(&kind).copied().unwrap_or(0)
    }

    pub fn set(&mut self, kind: BuildingKind, cost: Credits) {
        self.costs.insert(kind, cost);
    }

    pub fn iter(&self) -> impl Iterator<Item = (BuildingKind, Credits)> + '_ {
        self.costs.iter().map(|(k, c)| (*k, *c))
    }
}

impl Default for CostTable {
    fn default() -> Self {
        use BuildingKind::*;
        let costs = [
            (Conveyor, 1),
            (Furnace, 10),
            (AlloyFurnace, 25),
            (Forge, 15),
            (Miner, 10),
            (Splitter, 5),
            (Seller, 5),
            (CraftingTable, 20),
            (WaterPump, 10),
            (StraightPipe, 1),
            (CornerPipe, 1),
            (CrossPipe, 2),
            (OreWasher, 15),
        ];
        Self {
            costs: costs.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spend_within_balance() {
        let mut ledger = Ledger::new(10);
        assert!(ledger.try_spend(4));
        assert_eq!(ledger.balance(), 6);
        assert_eq!(ledger.total_spent(), 4);
    }

    #[test]
    fn overspend_is_a_no_op() {
        let mut ledger = Ledger::new(3);
        assert!(!ledger.try_spend(4));
        assert_eq!(ledger.balance(), 3);
        assert_eq!(ledger.total_spent(), 0);
    }

    #[test]
    fn exact_spend_reaches_zero() {
        let mut ledger = Ledger::new(5);
        assert!(ledger.try_spend(5));
        assert_eq!(ledger.balance(), 0);
        assert!(!ledger.try_spend(1));
    }

    #[test]
    fn credit_accumulates() {
        let mut ledger = Ledger::new(0);
        ledger.credit(7);
        ledger.credit(3);
        assert_eq!(ledger.balance(), 10);
        assert_eq!(ledger.total_credited(), 10);
    }

    #[test]
    fn every_kind_has_a_default_cost() {
        let table = CostTable::default();
        for kind in BuildingKind::all() {
            assert!(table.cost(kind) > 0, "{kind} should cost something");
        }
    }

    #[test]
    fn costs_can_be_overridden() {
        let mut table = CostTable::default();
        table.set(BuildingKind::Conveyor, 0);
        assert_eq!(table.cost(BuildingKind::Conveyor), 0);
    }
}
