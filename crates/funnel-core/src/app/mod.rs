//! App - wiring the queue, the runner and the failure policy into a build.

pub mod driver;

pub use self::driver::{BuildDriver, BuildError, BuildReport, UnitFailure};
