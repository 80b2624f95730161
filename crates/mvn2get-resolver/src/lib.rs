//! Resolution engine for mvn2get: Maven version ordering, effective-POM
//! computation, license policy, and the worklist-driven resolver that ties
//! the repository protocol together.

pub mod effective;
pub mod license;
pub mod resolver;
pub mod version;

use mvn2get_core::events::EventSink;
use mvn2get_core::problem::{Problem, ProblemLedger};

/// Record a problem in the ledger and surface it through the sink.
pub(crate) fn note_problem(ledger: &ProblemLedger, sink: &dyn EventSink, problem: Problem) {
    sink.problem(&problem);
    ledger.record(problem);
}
