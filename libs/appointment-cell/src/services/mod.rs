pub mod booking;
pub mod consultation;
pub mod lookup;
pub mod payment;
pub mod stats;
mod status;

pub use booking::AppointmentService;
pub use consultation::ConsultationService;
pub use lookup::LookupService;
pub use payment::PaymentService;
pub use stats::StatsService;
