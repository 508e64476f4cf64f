//! Data models for the library service

pub mod book;
pub mod borrowing;
pub mod enums;
pub mod payment;
pub mod user;

// Re-export commonly used types
pub use book::Book;
pub use borrowing::{Borrowing, BorrowingDetails};
pub use enums::{Cover, PaymentStatus};
pub use payment::Payment;
pub use user::{User, UserClaims};
