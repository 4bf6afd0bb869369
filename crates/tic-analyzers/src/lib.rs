//! Signal Analyzers: one per input kind, each producing an
//! unweighted `AnalyzerOutput` of reasons, a base score, and the pattern
//! ids that contributed. The risk aggregator, in `tic-risk`, is the
//! only place pattern weighting and severity banding happen — analyzers
//! never compute a final score themselves.

pub mod deps;
pub mod file;
pub mod output;
pub mod phone;
pub mod text;
pub mod url;
pub mod video;

pub use deps::AnalyzerDeps;
pub use file::analyze_file_signal;
pub use output::AnalyzerOutput;
pub use phone::analyze_phone_signal;
pub use text::analyze_text_signal;
pub use url::analyze_url_signal;
pub use video::analyze_video_signal;
