// src/models/mod.rs

pub mod exam_paper;
pub mod generation;
pub mod question;
pub mod reference;
pub mod section;
