//! The authoritative in-memory record table and its durable mirror

use crate::error::{Result, SegmentError};
use crate::record::{validate, CustomerRecord};
use crate::storage::CustomerLog;

/// Ordered table of customer records, projected from a durable [`CustomerLog`].
///
/// Cluster labels are either set on every record or on none.
pub struct RecordStore<L: CustomerLog> {
    records: Vec<CustomerRecord>,
    log: L,
}

impl<L: CustomerLog> RecordStore<L> {
    /// Open a store over `log`, loading whatever it already holds.
    pub fn open(log: L) -> Result<Self> {
        let mut store = Self {
            records: Vec::new(),
            log,
        };
        store.reload_from_durable()?;
        Ok(store)
    }

    /// Validate and append a record to both the durable log and the table.
    ///
    /// The durable write happens first, so a failure leaves the table untouched.
    /// A successful insert clears existing labels since they no longer cover
    /// the whole table.
    pub fn insert(&mut self, record: CustomerRecord) -> Result<()> {
        validate(&record)?;
        let record = record.without_cluster();
        self.log.append(&record)?;
        self.clear_clusters();
        tracing::info!(
            customer_id = %record.customer_id,
            total = self.records.len() + 1,
            "customer added"
        );
        self.records.push(record);
        Ok(())
    }

    /// Append a batch to the durable log (all-or-nothing) and re-project the table.
    pub(crate) fn append_batch(&mut self, records: &[CustomerRecord]) -> Result<usize> {
        let appended = self.log.append_all(records)?;
        self.reload_from_durable()?;
        Ok(appended)
    }

    pub fn all(&self) -> &[CustomerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the current table carries cluster labels.
    pub fn is_clustered(&self) -> bool {
        self.records.first().is_some_and(|r| r.cluster.is_some())
    }

    /// Positionally overwrite every record's cluster label.
    pub fn set_clusters(&mut self, labels: &[usize]) -> Result<()> {
        if labels.len() != self.records.len() {
            return Err(SegmentError::ShapeMismatch {
                records: self.records.len(),
                labels: labels.len(),
            });
        }
        for (record, &label) in self.records.iter_mut().zip(labels) {
            record.cluster = Some(label);
        }
        Ok(())
    }

    /// Current labels in table order, or `None` when the table is unlabelled.
    pub fn labels(&self) -> Option<Vec<usize>> {
        self.records.iter().map(|r| r.cluster).collect()
    }

    pub fn clear_clusters(&mut self) {
        for record in &mut self.records {
            record.cluster = None;
        }
    }

    /// Replace the table with the full durable contents, in storage order.
    pub fn reload_from_durable(&mut self) -> Result<()> {
        self.records = self.log.load_all()?;
        tracing::debug!(records = self.records.len(), "reloaded customers from storage");
        Ok(())
    }

    pub fn log(&self) -> &L {
        &self.log
    }
}
