//! Extraction adapter implementations, one per format family.

mod command;
pub mod hwp;
pub mod office_convert;
pub mod pdf_text;
pub mod text_native;

pub use hwp::HwpAdapter;
pub use office_convert::OfficeConvertAdapter;
pub use pdf_text::PdfTextAdapter;
pub use text_native::TextNativeAdapter;
