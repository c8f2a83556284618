//! Email -> contract id lookup built fresh on every sync run.

use std::collections::HashMap;

use deelbridge_domain::Contract;

/// Lookup from normalized worker emails to contract identifiers.
///
/// Registers the primary email and every alternate email of each
/// contract's worker. Later contracts overwrite earlier ones on
/// collision (last-write-wins), but any collision that changes the
/// mapped contract id is recorded so the sync report can surface it.
#[derive(Debug, Default)]
pub struct EmailIndex {
    map: HashMap<String, String>,
    collisions: Vec<String>,
}

impl EmailIndex {
    /// Build the index from a fetched contract set.
    #[must_use]
    pub fn build(contracts: &[Contract]) -> Self {
        let mut index = Self::default();

        for contract in contracts {
            let Some(worker) = &contract.worker else { continue };

            if let Some(email) = worker.email.as_deref() {
                index.register(email, &contract.id);
            }

            if let Some(alternates) = &worker.alternate_email {
                for alternate in alternates {
                    if let Some(email) = alternate.email.as_deref() {
                        index.register(email, &contract.id);
                    }
                }
            }
        }

        index
    }

    fn register(&mut self, raw_email: &str, contract_id: &str) {
        let email = normalize_email(raw_email);
        if email.is_empty() {
            return;
        }

        if let Some(previous) = self.map.insert(email.clone(), contract_id.to_string()) {
            if previous != contract_id {
                self.collisions.push(format!(
                    "email {email} maps to contracts {previous} and {contract_id}; keeping {contract_id}"
                ));
            }
        }
    }

    /// Look up the contract id for an email, normalizing the input the
    /// same way registered emails were normalized.
    #[must_use]
    pub fn resolve(&self, raw_email: &str) -> Option<&str> {
        self.map.get(&normalize_email(raw_email)).map(String::as_str)
    }

    /// Number of distinct emails registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no emails were registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Collision warnings observed while building the index.
    #[must_use]
    pub fn collisions(&self) -> &[String] {
        &self.collisions
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
