// Common traits and types
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bucket_attributes;
mod bucket_name;
mod bucket_settings;
mod bucket_status;
mod client_config;
mod driver;
mod error;
mod platform;
mod region;
mod status_writer;
mod storage_client;

pub use bucket_attributes::*;
pub use bucket_name::*;
pub use bucket_settings::*;
pub use bucket_status::*;
pub use client_config::*;
pub use driver::*;
pub use error::*;
pub use platform::*;
pub use region::*;
pub use status_writer::*;
pub use storage_client::*;
