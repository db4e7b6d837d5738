//! Request handlers.
//!
//! Handlers stay thin: they translate HTTP input into job store and queue
//! calls and map failures via [`AppError`](crate::error::AppError).

pub mod jobs;
pub mod pages;
