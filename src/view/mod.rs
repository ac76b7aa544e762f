//! Presentation layer: the collection view state machine and its rendering.

pub mod file_list;
