pub mod barrier;
pub mod rayon;
pub mod single;
