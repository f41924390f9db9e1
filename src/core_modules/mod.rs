pub mod alert;
pub mod consolidator;
pub mod escalation;
pub mod frame;
pub mod region;
pub mod segmenter;
pub mod tracker;
