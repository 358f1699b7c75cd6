use geogrid_core::{DistributionModel, FeederMetadata, ImportDiagnostics};
use serde::Serialize;

use crate::error::ReaderError;

/// Outcome of a successful read
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseReport {
    /// Entity counts of the parsed input plus warnings
    pub diagnostics: ImportDiagnostics,
    /// Entities added to the target model
    pub inserted: usize,
    /// Entities already present in the target model and left untouched
    pub duplicates: usize,
    pub feeder: Option<FeederMetadata>,
}

/// A source format that can populate a [`DistributionModel`].
///
/// A failed `parse` leaves `model` unchanged, or marks it invalid when the
/// failure happened while merging.
pub trait ModelReader {
    fn parse(&mut self, model: &mut DistributionModel) -> Result<ParseReport, ReaderError>;
}
