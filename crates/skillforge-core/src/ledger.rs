use crate::catalog::ResourceAmount;
use crate::id::ResourceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resource balances. Absent and zero are the same thing; zero entries are
/// never stored, so two ledgers with equal balances compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryLedger {
    balances: BTreeMap<ResourceId, u64>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance of `resource`, 0 if absent.
    pub fn count(&self, resource: &str) -> u64 {
        self.balances.get(resource).copied().unwrap_or(0)
    }

    /// Credit `quantity` units. A zero quantity is a no-op.
    pub fn add(&mut self, resource: &ResourceId, quantity: u64) {
        if quantity == 0 {
            return;
        }
        let balance = self.balances.entry(resource.clone()).or_insert(0);
        *balance = balance.saturating_add(quantity);
    }

    /// Debit `quantity` units. Returns false and leaves the ledger untouched
    /// if the balance is short.
    pub fn remove(&mut self, resource: &str, quantity: u64) -> bool {
        if quantity == 0 {
            return true;
        }
        let Some(balance) = self.balances.get_mut(resource) else {
            return false;
        };
        if *balance < quantity {
            return false;
        }
        *balance -= quantity;
        if *balance == 0 {
            self.balances.remove(resource);
        }
        true
    }

    /// True iff every line is covered. Repeated lines for the same resource
    /// are summed before comparing.
    pub fn has_all(&self, requirements: &[ResourceAmount]) -> bool {
        self.first_shortfall(requirements).is_none()
    }

    /// Debit every line or none of them.
    pub fn remove_all(&mut self, requirements: &[ResourceAmount]) -> Result<(), LedgerError> {
        if let Some(err) = self.first_shortfall(requirements) {
            return Err(err);
        }
        for line in requirements {
            let removed = self.remove(line.resource.as_str(), line.quantity);
            debug_assert!(removed, "pre-validated removal failed for {}", line.resource);
        }
        Ok(())
    }

    /// Credit every line.
    pub fn add_all(&mut self, lines: &[ResourceAmount]) {
        for line in lines {
            self.add(&line.resource, line.quantity);
        }
    }

    fn first_shortfall(&self, requirements: &[ResourceAmount]) -> Option<LedgerError> {
        let mut needed: BTreeMap<&str, u64> = BTreeMap::new();
        for line in requirements {
            let total = needed.entry(line.resource.as_str()).or_insert(0);
            *total = total.saturating_add(line.quantity);
        }
        needed.into_iter().find_map(|(resource, required)| {
            let available = self.count(resource);
            (available < required).then(|| LedgerError::Insufficient {
                resource: ResourceId::new(resource),
                required,
                available,
            })
        })
    }

    /// Non-zero balances in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceId, u64)> {
        self.balances.iter().map(|(id, &qty)| (id, qty))
    }

    /// Number of distinct resources held.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Sum of all balances.
    pub fn total_quantity(&self) -> u64 {
        self.balances.values().fold(0u64, |acc, &q| acc.saturating_add(q))
    }

    /// Drop zero balances, e.g. after deserializing a hand-edited save.
    pub fn normalize(&mut self) {
        self.balances.retain(|_, qty| *qty > 0);
    }
}

impl FromIterator<(ResourceId, u64)> for InventoryLedger {
    fn from_iter<I: IntoIterator<Item = (ResourceId, u64)>>(iter: I) -> Self {
        let mut ledger = Self::new();
        for (resource, quantity) in iter {
            ledger.add(&resource, quantity);
        }
        ledger
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient {resource}: need {required}, have {available}")]
    Insufficient {
        resource: ResourceId,
        required: u64,
        available: u64,
    },
}
