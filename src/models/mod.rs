pub mod catalog;
pub mod users;
pub mod xtream;

pub use catalog::{Catalog, Category, Channel};
pub use users::{UserAccount, UserRegistry};
