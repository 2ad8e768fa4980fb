mod apply;
mod data;
mod generate;
mod info;
mod init;

pub use apply::*;
pub use data::*;
pub use generate::*;
pub use info::*;
pub use init::*;
