pub mod cache;
pub mod object;
pub mod reference;
pub mod scheme;
pub mod value;
