//! Constrained evolutionary search over mix designs.
//!
//! The pipeline has three parts, composed linearly:
//!
//! - **Constraint evaluation** (`constraints`): feasibility of a mix
//!   against a declarative engineering rule set
//! - **Fitness** (`fitness`): gates on feasibility, then scores feasible
//!   mixes by surrogate-predicted distance from the target outcome
//! - **Search engine** (`engine`): generational genetic algorithm driving
//!   the fitness function and recording convergence statistics
//!
//! The surrogate model itself is an external collaborator; see
//! [`surrogate::Surrogate`] for the contract it must honor.

mod constraints;
mod engine;
mod fitness;
mod surrogate;

pub use constraints::{CONSTRAINT_PENALTY, ConstraintChecker};
pub use engine::{Candidate, SearchEngine, SearchError};
pub use fitness::{FitnessEvaluator, INFEASIBLE_SCORE, Score};
pub use surrogate::{LinearSurrogate, Surrogate, SurrogateError};
