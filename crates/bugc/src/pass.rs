//! Typed compilation passes and their composition.
//!
//! A [`Pass`] declares the view of the artifacts it reads ([`Pass::Needs`]) and what it contributes
//! ([`Pass::Adds`]). [`Bind`] ties a pass to a concrete artifact record, and [`Stage`] runs a chain
//! of bound passes where the output record of each one is the input record of the next:
//!
//! ```ignore
//! let stage = Step::new(Parse).then(TypeCheck).then(IrGen);
//! let artifacts = stage.execute(input)?;
//! ```
//!
//! A chain whose records do not line up does not compile.

use bugc_interface::Diagnostics;

/// A unit of work in the pipeline.
pub trait Pass {
    /// The borrowed view of the artifacts this pass reads.
    type Needs<'a>;
    /// What this pass contributes.
    type Adds;
    /// The error this pass may fail with.
    type Error: Into<Diagnostics>;

    /// The name of the pass, used in logs.
    const NAME: &'static str;

    /// Runs the pass.
    fn run(&self, needs: Self::Needs<'_>) -> Result<Self::Adds, Self::Error>;
}

/// Binds a [`Pass`] to the artifact record `In`.
pub trait Bind<In>: Pass {
    /// The record extended with the pass's contribution.
    type Out;

    /// Projects the fields the pass needs.
    fn needs(input: &In) -> Self::Needs<'_>;

    /// Merges the pass's contribution into the record.
    fn merge(input: In, adds: Self::Adds) -> Self::Out;
}

/// A runnable chain of passes from `In` to [`Stage::Out`].
pub trait Stage<In> {
    type Out;

    /// Runs every pass in order, stopping at the first failure.
    fn execute(&self, input: In) -> Result<Self::Out, Diagnostics>;
}

/// A single bound pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct Step<P>(P);

impl<P> Step<P> {
    /// Wraps a pass.
    pub const fn new(pass: P) -> Self {
        Self(pass)
    }

    /// Appends a pass.
    pub fn then<Q>(self, pass: Q) -> Then<Self, Step<Q>> {
        Then { first: self, second: Step::new(pass) }
    }
}

impl<In, P: Bind<In>> Stage<In> for Step<P> {
    type Out = P::Out;

    fn execute(&self, input: In) -> Result<Self::Out, Diagnostics> {
        let _guard = debug_span!("pass", name = P::NAME).entered();
        debug!("starting");
        match self.0.run(P::needs(&input)) {
            Ok(adds) => {
                debug!("finished");
                Ok(P::merge(input, adds))
            }
            Err(err) => {
                let diagnostics: Diagnostics = err.into();
                debug!(errors = diagnostics.len(), "failed");
                Err(diagnostics)
            }
        }
    }
}

/// Two chained stages; `B` runs on the output of `A`.
#[derive(Clone, Copy, Debug)]
pub struct Then<A, B> {
    first: A,
    second: B,
}

impl<A, B> Then<A, B> {
    /// Appends a pass.
    pub fn then<Q>(self, pass: Q) -> Then<Self, Step<Q>> {
        Then { first: self, second: Step::new(pass) }
    }
}

impl<In, A, B> Stage<In> for Then<A, B>
where
    A: Stage<In>,
    B: Stage<A::Out>,
{
    type Out = B::Out;

    fn execute(&self, input: In) -> Result<Self::Out, Diagnostics> {
        let mid = self.first.execute(input)?;
        self.second.execute(mid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bugc_interface::{Diagnostic, error_code};
    use std::cell::Cell;

    /// Record of the toy pipeline: a number and the log of passes that ran.
    #[derive(Debug, PartialEq)]
    struct Record {
        value: u64,
        ran: Vec<&'static str>,
    }

    struct Double<'a>(&'a Cell<usize>);

    impl Pass for Double<'_> {
        type Needs<'a> = u64;
        type Adds = u64;
        type Error = Diagnostics;
        const NAME: &'static str = "double";

        fn run(&self, value: u64) -> Result<u64, Diagnostics> {
            self.0.set(self.0.get() + 1);
            Ok(value * 2)
        }
    }

    impl Bind<Record> for Double<'_> {
        type Out = Record;

        fn needs(input: &Record) -> u64 {
            input.value
        }

        fn merge(mut input: Record, adds: u64) -> Record {
            input.value = adds;
            input.ran.push(Self::NAME);
            input
        }
    }

    struct FailAbove(u64);

    impl Pass for FailAbove {
        type Needs<'a> = u64;
        type Adds = ();
        type Error = Diagnostic;
        const NAME: &'static str = "fail-above";

        fn run(&self, value: u64) -> Result<(), Diagnostic> {
            if value > self.0 {
                return Err(Diagnostic::error(error_code!(E1234), format!("{value} is too large")));
            }
            Ok(())
        }
    }

    impl Bind<Record> for FailAbove {
        type Out = Record;

        fn needs(input: &Record) -> u64 {
            input.value
        }

        fn merge(mut input: Record, (): ()) -> Record {
            input.ran.push(Self::NAME);
            input
        }
    }

    /// Turns the record into its final value.
    struct Finish;

    impl Pass for Finish {
        type Needs<'a> = ();
        type Adds = ();
        type Error = std::convert::Infallible;
        const NAME: &'static str = "finish";

        fn run(&self, (): ()) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl Bind<Record> for Finish {
        type Out = u64;

        fn needs(_: &Record) {}

        fn merge(input: Record, (): ()) -> u64 {
            input.value
        }
    }

    fn record(value: u64) -> Record {
        Record { value, ran: Vec::new() }
    }

    #[test]
    fn test_runs_in_order() {
        let calls = Cell::new(0);
        let stage = Step::new(Double(&calls)).then(FailAbove(100)).then(Double(&calls));
        let out = stage.execute(record(3)).unwrap();
        assert_eq!(out, Record { value: 12, ran: vec!["double", "fail-above", "double"] });
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_stops_at_first_failure() {
        let calls = Cell::new(0);
        let stage = Step::new(Double(&calls)).then(FailAbove(5)).then(Double(&calls));
        let err = stage.execute(record(3)).unwrap_err();
        assert_eq!(calls.get(), 1);
        assert_eq!(err.len(), 1);
        assert_eq!(err.first_error().unwrap().message, "6 is too large");
    }

    #[test]
    fn test_output_type_changes() {
        let calls = Cell::new(0);
        let stage = Step::new(Double(&calls)).then(Finish);
        let value: u64 = stage.execute(record(21)).unwrap();
        assert_eq!(value, 42);
    }
}
