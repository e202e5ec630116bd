//! Constrained evolutionary search for material mix designs.
//!
//! Given a trained regression surrogate for a target property (compressive
//! strength), this crate searches for a mix design whose predicted outcome
//! lands as close as possible to a requested value while satisfying
//! engineering constraints on the composition.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: serde-derived configuration and reporting types (parameter
//!   space, constraint rules, GA settings, convergence history)
//! - `search`: the constraint evaluator, the surrogate-coupled fitness
//!   function, and the genetic search engine
//!
//! # Example
//!
//! ```
//! use mixopt::schema::{Direction, GaConfig, ParameterSpace, ParameterSpec, SearchConfig};
//! use mixopt::search::{LinearSurrogate, SearchEngine};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SearchConfig {
//!     space: ParameterSpace::new(vec![
//!         ParameterSpec::evolved("Cement", 100.0, 550.0),
//!         ParameterSpec::evolved("Water", 120.0, 250.0),
//!         ParameterSpec::fixed("Age", 28.0),
//!     ]),
//!     rules: Vec::new(),
//!     ga: GaConfig {
//!         population_size: 30,
//!         generations: 10,
//!         ..GaConfig::default()
//!     },
//!     target: 40.0,
//!     direction: Direction::Minimize,
//!     random_seed: Some(42),
//! };
//!
//! // A pre-fitted surrogate: z-score normalization plus a linear head.
//! let surrogate = LinearSurrogate::new(
//!     vec![280.0, 180.0, 28.0], // feature means
//!     vec![100.0, 20.0, 1.0],   // feature standard deviations
//!     vec![12.0, -4.0, 6.0],    // regression weights
//!     36.0,                     // intercept
//! )?;
//!
//! let mut engine = SearchEngine::new(config, surrogate)?;
//! let outcome = engine.run()?;
//! println!("best predicted strength: {:?}", outcome.best.predicted);
//! # Ok(())
//! # }
//! ```

pub mod schema;
pub mod search;

// Re-export commonly used types
pub use schema::{Direction, GaConfig, ParameterSpace, ParameterSpec, SearchConfig, SearchOutcome};
pub use search::{SearchEngine, SearchError, Surrogate};
