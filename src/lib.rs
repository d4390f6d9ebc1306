//! Expose a running program's variables as an HTML form.
//!
//! The application registers named values in a [`Registry`], starts a
//! [`Server`], and reads values back with [`Registry::get`]. An operator
//! edits them from any browser; submissions are merged on the next `get`.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod marshal;
pub mod messages;
pub mod registry;
pub mod time_utils;
pub mod value;
pub mod web;

pub use config::ServerConfig;
pub use discovery::{AdvertisementHandle, Discovery, ServiceRecord};
pub use error::{ControlError, Result};
pub use registry::Registry;
pub use value::{Kind, Value};
pub use web::server::Server;
