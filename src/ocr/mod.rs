pub mod engine;
pub mod preprocess;
pub mod setup;
pub mod text;

pub use engine::{OcrLayout, TesseractEngine};
pub use preprocess::PreprocessOptions;
pub use setup::resolve_tesseract;
pub use text::{OcrEngine, OcrWord, RecognizedText};
