pub mod booking;
pub mod user;
pub mod worker;

pub use booking::{Booking, BookingStatus};
pub use user::{Role, User};
pub use worker::{ServiceCategory, Worker};
