mod error;
mod nwis;
mod rdb;
mod request;
mod types;
mod waterml;

pub use error::NwisError;
pub use nwis::Nwis;

pub use types::column::ColumnKey;
pub use types::service::{Format, RatingType, Service};
pub use types::water_table::WaterTable;

pub use rdb::RdbError;
pub use waterml::WaterMlError;

pub use chrono_tz::Tz;
