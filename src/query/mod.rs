mod bound;
pub use bound::*;
mod criteria;
pub use criteria::*;
mod definition;
pub use definition::*;
mod sorter;
pub use sorter::*;

pub(crate) mod value;
