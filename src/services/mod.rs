// src/services/mod.rs

pub mod allocator;
pub mod exam_papers;
pub mod exam_types;
pub mod generator;
pub mod question_filter;
pub mod references;
pub mod sections;
pub mod selector;

pub use exam_papers::ExamPaperService;
pub use exam_types::ExamTypeService;
pub use generator::ExamPaperGenerator;
pub use sections::SectionService;
