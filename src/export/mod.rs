// =============================================================================
// Export Module
// =============================================================================
//
// Output adapters for a finished scan: a dated CSV file and, optionally, an
// email carrying that CSV.

pub mod csv_export;
pub mod email;

pub use csv_export::{csv_file_name, export_watchlist, render_watchlist};
pub use email::{SmtpCredentials, SmtpSettings};
