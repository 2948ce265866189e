pub mod generation;
pub mod openai;
