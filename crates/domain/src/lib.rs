#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod category;
mod draft;
mod error;
mod exercise;
mod group;
mod lenient;
mod migration;
mod name;
mod overload;
pub mod schedule;
mod service;
mod session;
mod settings;
mod state;
pub mod statistics;
mod timeout;
mod tracker;
mod transfer;

pub use category::*;
pub use draft::*;
pub use error::*;
pub use exercise::*;
pub use group::*;
pub use migration::*;
pub use name::*;
pub use overload::*;
pub use schedule::Schedule;
pub use service::*;
pub use session::*;
pub use settings::*;
pub use state::*;
pub use timeout::*;
pub use tracker::*;
pub use transfer::*;
