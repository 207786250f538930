pub mod amortization;
pub mod preview;

pub use amortization::{calculate_emi, AmortizationSchedule, ScheduledPayment};
pub use preview::EmiPreview;
