pub mod attendance;
pub mod derivation;
pub mod reporting;

pub use attendance::AttendanceService;
pub use derivation::{derive_shift_status, ShiftDerivation};
pub use reporting::ReportService;
