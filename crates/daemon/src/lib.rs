#![forbid(unsafe_code)]

//! Process side of pagewatch: container-backed collaborators, the SMTP
//! transport and the interval scheduler.

pub mod container;
pub mod imagemagick;
pub mod mailer;
pub mod rasterize;
pub mod scheduler;

pub use scheduler::spawn_scheduler;
