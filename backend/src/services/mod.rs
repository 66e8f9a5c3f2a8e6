//! Business logic services for Farm GAP Records

pub mod cancel;
pub mod csv_transfer;
pub mod fetcher;
pub mod records;
pub mod reporting;
pub mod traceability;

pub use cancel::{cancel_pair, CancelToken};
pub use csv_transfer::{CsvSchema, ImportSummary};
pub use fetcher::RecordFetcher;
pub use records::RecordService;
pub use reporting::ReportingService;
pub use traceability::{ChainFilter, TraceabilityService};
