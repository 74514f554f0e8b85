// Record workflow over the store
pub mod records;

// Money and tax arithmetic
pub mod totals;

pub use records::RecordService;
pub use totals::{compute_totals, line_total, net_amount, tax_amount, Totals};
