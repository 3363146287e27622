pub mod entities;
pub mod export;
pub mod insert;
pub mod list;

pub use entities::run as entities;
pub use export::run as export;
pub use insert::run as insert;
pub use list::run as list;
