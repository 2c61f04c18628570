//! Deterministic semantic versions from a commit graph and a branching model
//!
//! ```rust
//! use branchver::{calculate, CalculationRequest, Config, Workflow};
//! use branchver::git::RepositoryFixture;
//!
//! let mut fixture = RepositoryFixture::new();
//! fixture.commit("initial");
//! fixture.tag("1.0.0");
//! fixture.branch("release/2.0.0");
//! fixture.commit("stabilise");
//! let graph = fixture.snapshot();
//!
//! let vars = calculate(&graph, &Config::for_workflow(Workflow::GitFlow), &CalculationRequest::head()).unwrap();
//! assert_eq!(vars.full_sem_ver, "2.0.0-beta.1+1");
//! ```

pub mod calculator;
pub mod config;
pub mod domain;
pub mod environment;
pub mod error;
pub mod format;
pub mod git;
pub mod strategies;
pub mod ui;

pub use calculator::{calculate, CalculationRequest, VersionCalculator};
pub use config::{Config, Workflow};
pub use error::{Error, Result};
pub use format::VersionVariables;
