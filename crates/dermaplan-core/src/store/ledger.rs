use crate::error::StoreError;
use crate::plan::{PlanId, PlanStatus};
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One recorded plan status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub sequence: u64,
    pub plan_id: PlanId,
    /// `None` for the plan's first write
    pub from: Option<PlanStatus>,
    pub to: PlanStatus,
    pub recorded_at: DateTime<Utc>,
    #[serde(with = "hex_bytes")]
    pub prev_hash: [u8; 32],
    #[serde(with = "hex_bytes")]
    pub hash: [u8; 32],
}

/// Append-only, hash-chained transition log for one user
#[derive(Debug, Clone, Default)]
pub struct TransitionLedger {
    entries: Vec<LedgerEntry>,
}

impl TransitionLedger {
    pub fn append(&mut self, plan_id: PlanId, from: Option<PlanStatus>, to: PlanStatus) -> u64 {
        let prev_hash = self.entries.last().map(|e| e.hash).unwrap_or([0u8; 32]);
        let mut entry = LedgerEntry {
            sequence: self.entries.len() as u64,
            plan_id,
            from,
            to,
            recorded_at: Utc::now(),
            prev_hash,
            hash: [0u8; 32],
        };
        entry.hash = compute_hash(&entry);
        let sequence = entry.sequence;
        self.entries.push(entry);
        sequence
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn verify(&self, user_id: UserId) -> Result<(), StoreError> {
        let mut prev = [0u8; 32];
        for (i, e) in self.entries.iter().enumerate() {
            if e.sequence != i as u64 || e.prev_hash != prev || e.hash != compute_hash(e) {
                return Err(StoreError::LedgerIntegrity(user_id));
            }
            prev = e.hash;
        }
        Ok(())
    }

    /// Test hook: mutable access for tamper checks
    #[cfg(test)]
    pub(crate) fn entries_mut(&mut self) -> &mut Vec<LedgerEntry> {
        &mut self.entries
    }
}

fn status_byte(status: PlanStatus) -> u8 {
    match status {
        PlanStatus::Pending => 1,
        PlanStatus::Active => 2,
        PlanStatus::Adjustable => 3,
        PlanStatus::Superseded => 4,
        PlanStatus::Completed => 5,
    }
}

fn compute_hash(entry: &LedgerEntry) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(entry.sequence.to_le_bytes());
    hasher.update(entry.plan_id.0.as_bytes());
    hasher.update([entry.from.map_or(0, status_byte)]);
    hasher.update([status_byte(entry.to)]);
    hasher.update(entry.recorded_at.timestamp_micros().to_le_bytes());
    hasher.update(entry.prev_hash);
    hasher.finalize().into()
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(deserializer)?;
        let raw = hex::decode(&text).map_err(serde::de::Error::custom)?;
        raw.try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_verifies_and_detects_tampering() {
        let user = UserId::new();
        let plan = PlanId::new();
        let mut ledger = TransitionLedger::default();
        ledger.append(plan, None, PlanStatus::Active);
        ledger.append(plan, Some(PlanStatus::Active), PlanStatus::Adjustable);
        assert!(ledger.verify(user).is_ok());

        ledger.entries_mut()[0].to = PlanStatus::Completed;
        assert_eq!(ledger.verify(user), Err(StoreError::LedgerIntegrity(user)));
    }

    #[test]
    fn entry_hashes_serialize_as_hex() {
        let mut ledger = TransitionLedger::default();
        ledger.append(PlanId::new(), None, PlanStatus::Active);
        let json = serde_json::to_value(&ledger.entries()[0]).unwrap();
        assert_eq!(json["prev_hash"].as_str().unwrap(), "0".repeat(64));
        let back: LedgerEntry = serde_json::from_value(json).unwrap();
        assert_eq!(&back, &ledger.entries()[0]);
    }
}
