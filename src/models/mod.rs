pub mod grid;
pub mod item;
pub mod result;

pub use grid::{DocumentGrid, PageGrid, Source, TableGrid};
pub use item::{FieldSet, LineItem, Provenance, KEY_DELIMITER};
pub use result::{
    MatchResult, MatchStatus, ReconcileReport, ReconcileSummary, RowDiagnostic, SkipReason,
};
