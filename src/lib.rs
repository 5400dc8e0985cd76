// Crate root: declare modules and control visibility
mod accumulator;
mod classifier;
pub mod error;
pub mod logging;
pub mod parser;
mod range;
pub mod region;
pub mod registry;
pub mod report;
pub mod run;
pub mod stats;
pub mod utils;

// Re-export commonly used API from the library for binaries/tests
pub use classifier::parse_number;
pub use error::{ErrorKind, ParseError};
pub use parser::{analyze_map_file, analyze_map_text, parse_map_file};
pub use region::Region;
pub use registry::{MatchKind, NameRule, RegionRegistry, RuleTable, SymbolPair};
pub use stats::{Analysis, KilobyteStats, MemoryStats, RegionUsage};
pub use utils::resolve_map_path;
