//! Output generation modules for the pipeline's CSV artifacts.
//!
//! # Submodules
//!
//! - [`csv`]: typed Article/Comment sinks and the dynamic [`csv::CsvTable`]
//! - [`combine`]: merging cleaned per-source artifacts into one master file
//!
//! # Artifact layout
//!
//! ```text
//! news_portal/
//! ├── news_detik.csv            # raw crawl output, one file per site
//! └── news_detik_cleaned.csv    # after the cleaning stage
//! social_media/
//! ├── youtube.csv
//! └── youtube_cleaned.csv
//! combined_data/
//! ├── combined_all_sources_cleaned.csv
//! └── final_sentiment_results.csv
//! ```

pub mod combine;
pub mod csv;
