// Local generator collection and reconciliation with backend snapshots
use super::generator::{ConfirmedGenerator, GeneratorSnapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub updated: usize,
    pub added: usize,
}

/// Every generator drawn on the overlay. Entries are only ever added; the
/// backend exposes no removal.
#[derive(Debug, Clone, Default)]
pub struct Generators {
    items: Vec<ConfirmedGenerator>,
}

impl Generators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, generator: ConfirmedGenerator) {
        self.items.push(generator);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfirmedGenerator> {
        self.items.iter()
    }

    /// Apply backend snapshots: matching entries take the server progress
    /// count, unseen ones are rebuilt from the snapshot and appended.
    pub fn reconcile(&mut self, snapshots: &[GeneratorSnapshot]) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        for snapshot in snapshots {
            match self.items.iter_mut().find(|g| g.matches(snapshot)) {
                Some(found) => {
                    found.count_current = snapshot.geo_order_count_current;
                    summary.updated += 1;
                }
                None => {
                    self.items.push(ConfirmedGenerator::from_snapshot(snapshot));
                    summary.added += 1;
                }
            }
        }
        summary
    }

    /// Orders generated so far across all generators.
    pub fn generated_total(&self) -> u64 {
        self.items.iter().map(|g| g.count_current as u64).sum()
    }

    /// Orders all generators are configured to produce.
    pub fn generate_total(&self) -> u64 {
        self.items.iter().map(|g| g.count.value as u64).sum()
    }
}
