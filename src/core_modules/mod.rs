pub mod band;
pub mod pixel;
pub mod policy;
pub mod tally;
pub mod utils;
