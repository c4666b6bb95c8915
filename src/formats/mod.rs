pub mod berkeleydb;
pub mod header;
pub mod layout;

pub use berkeleydb::{calculated_size, identify, identify_into};
pub use header::DbHeader;
pub use layout::{DB_HEADER_SIZE, Endian, HeaderLayout, PageCountRule};
