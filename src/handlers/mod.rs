// src/handlers/mod.rs

pub mod exam_paper;
pub mod exam_type;
pub mod generation;
pub mod section;
