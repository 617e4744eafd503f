//! StructureMap execution boundary and the tutorial step harness
//!
//! A [`TransformationEngine`] turns a typed source tree into a typed target
//! tree. The [`Harness`] feeds it every (map, source) pair of a step
//! directory, writes the results in XML and JSON and, when a
//! [`CrossValidator`](ferrum_matchbox::CrossValidator) is attached, runs the
//! same pair on a remote engine so the outputs can be compared.
//!
//! ```rust,no_run
//! use ferrum_mapping::{Harness, HarnessConfig, SimpleCopyEngine};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn run() -> ferrum_mapping::Result<()> {
//! let harness = Harness::new(HarnessConfig::default(), Arc::new(SimpleCopyEngine::new()))?;
//! for report in harness.run(Path::new("tutorial"), &[1, 2]).await? {
//!     for diagnostic in &report.diagnostics {
//!         println!("{diagnostic}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod harness;
pub mod worker;

pub use engine::{SimpleCopyEngine, TransformError, TransformationEngine};
pub use error::{Error, Result};
pub use harness::{discover_steps, short_name, Harness, HarnessConfig, StepReport};
pub use worker::WorkerContext;
