//! descriptor-kit - признаки для ML из таблиц и кристаллических структур

pub mod api;
pub mod config;
pub mod describers;
pub mod error;
pub mod frame;
pub mod preprocessing;
pub mod structure;
pub mod types;

pub use describers::*;
pub use error::{DescriptorError, Result};
pub use frame::{DataFrame, Record, VALUE_COLUMN};
pub use preprocessing::*;
pub use structure::{Lattice, Site, Structure};
pub use types::*;
