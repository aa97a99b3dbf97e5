pub mod batch;
pub mod harminv;
pub mod lines;
pub mod matching;
pub mod purcell;
pub mod simulate;
