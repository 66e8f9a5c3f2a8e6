//! Domain models for farm record keeping

mod application;
mod compliance;
mod field;
mod harvest;
mod shipment;
mod supplies;
mod work_log;
mod worker;

pub use application::*;
pub use compliance::*;
pub use field::*;
pub use harvest::*;
pub use shipment::*;
pub use supplies::*;
pub use work_log::*;
pub use worker::*;
