/// UI module exports
pub mod components;
pub mod dashboard;
pub mod format;
pub mod popup;
