pub mod paper;
pub mod quality;
pub mod section;
pub mod transcript;

pub use paper::Paper;
pub use quality::QualityReport;
pub use section::{Section, SectionInfo, SectionMap};
pub use transcript::{ChatMessage, ChatRole, Transcript};
