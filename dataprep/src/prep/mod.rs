pub mod augment;
pub mod crop;
pub mod error;
pub mod io;
pub mod iter;
pub mod merge;
pub mod noise;
pub mod patch;
pub mod pos;
pub mod shuffle;
pub mod split;

pub use error::{Error, Result};
pub use iter::PosIter;
pub use pos::Pos;
