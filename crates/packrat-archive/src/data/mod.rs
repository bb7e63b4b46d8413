//! Request and report types shared by every codec.

pub mod options;
pub mod report;
