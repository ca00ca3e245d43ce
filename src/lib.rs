// lib.rs
//! # STATSIM
//!
//! A Monte Carlo sampling-distribution simulation library for experiment analysis. It
//! repeatedly draws independent samples of fixed size from a configured distribution,
//! reduces each to a summary statistic, and collects the results so their emergent
//! distribution can be compared against statistical theory - the machinery behind Law of
//! Large Numbers demonstrations, Central Limit Theorem verification, confidence-interval
//! coverage checks, and randomized experiment assignment with balance testing.
//!
//! The library is a pure, non-interactive batch computation: no service, no protocol, no
//! global state. Every sampling entry point takes an explicit, seedable randomness source,
//! so any run set can be reproduced byte-for-byte and runs can execute in parallel without
//! sharing a stream.
//!
//! ## `dist_utils`
//!
//! - **Purpose**: Distribution Specifications - how to produce one random draw.
//! - **Features**:
//!   - **DistSpec**: uniform, Bernoulli, categorical (die-toss style), and normal families
//!     with parameter validation, closed-form moments, and support membership.
//!   - **String options**: parse compact tokens such as `UNIFORM(0,1)` and `NORMAL(10,2)`.
//!
//! ## `sample_utils`
//!
//! - **Purpose**: The Sample Generator and Summary Reducer.
//! - **Features**:
//!   - Generate one Sample of `n` i.i.d. draws from a specification.
//!   - Reduce a Sample to its arithmetic mean, unbiased variance, standard deviation, and
//!     standard error.
//!   - Law of Large Numbers traces: running means per draw, as a plot-ready table.
//!
//! ## `experiment_utils`
//!
//! - **Purpose**: The Experiment Runner - orchestrate `R` draw-and-reduce repetitions.
//! - **Features**:
//!   - **ExperimentBuilder**: Chainable configuration of distribution, sample size,
//!     repetitions, seed, and variance tracking.
//!   - Sequential execution on one randomness stream, or parallel execution with one
//!     derived stream per run.
//!   - **ResultCollection**: The collected sample means (and paired variances), empirical
//!     vs theoretical summaries, printed reports, and CSV/JSON export.
//!
//! ## `interval_utils`
//!
//! - **Purpose**: Interval estimation and coverage.
//! - **Features**:
//!   - Symmetric interval estimates `mean ± z * sqrt(variance/n)` per Experiment Run.
//!   - Coverage rates against a known true mean, and plot-ready interval tables.
//!
//! ## `assignment_utils`
//!
//! - **Purpose**: Randomized treatment assignment and balance testing over tables.
//! - **Features**:
//!   - Probabilistic (`COIN_FLIP`) and exact (`EXACT_SPLIT`) assignment strategies.
//!   - Group counts, per-group balance tables, and Welch t statistics.
//!
//! ## `table_utils`
//!
//! - **Purpose**: A minimal tabular carrier for traces, interval tables, and assignments.
//! - **Features**:
//!   - **TableBuilder**: Headers and rows with chainable construction, CSV read/write,
//!     column statistics, and fixed-width table printing.
//!
//! ## `error_utils`
//!
//! - **Purpose**: The error taxonomy shared by all modules.
//! - **Features**:
//!   - **SimError**: invalid parameters, insufficient sample sizes, missing columns - all
//!     reported synchronously, never retried.
//!
//! ## License
//!
//! This project is licensed under the MIT License.

pub mod assignment_utils;
pub mod dist_utils;
pub mod error_utils;
pub mod experiment_utils;
pub mod interval_utils;
pub mod sample_utils;
pub mod table_utils;
