/*!
Texparser unit testing library

This is a crate for writing unit tests for commands built on texparser.
It is used extensively in the texparser standard library,
    so the unit tests there are good examples of what this crate can do.

## Basic setup

Each unit test built with this library works with a specific session state type
    provided by the test writer.
In addition to implementing the [`SessionState`] trait, this state must:

1. Include the [`TestingComponent`] type as a component.
    I.e., the state must implement the [`HasComponent<TestingComponent>`](texparser::traits::HasComponent) trait.

1. Configure the `character_handler` and `undefined_command_handler` methods of the
    [`SessionState`] trait to invoke [`TestingComponent::character_handler`]
    and [`TestingComponent::undefined_command_handler`].

1. Implement [`Default`].

If the unit test doesn't require anything else from the state,
    the [`State`] type defined in this library can simply be used.

## Test types

### Expansion equality tests

Run using [`run_expansion_equality_test`].

These tests verify that two different snippets produce the same objects.
For example, an expansion equality test can verify that
```tex
\def\HelloWorld{Hola Mundo}\HelloWorld - \HelloWorld
```
and
```tex
Hola Mundo - Hola Mundo
```
produce the same objects.
The state of the session is not compared.

The [`TestOption::ListMode`] option runs the snippets as lists of objects instead of as input sources.
This is the mode that applies to the contents of macro arguments and expansions.

### Output tests

Run using [`run_output_test`].
These tests verify the text emitted by a snippet, including text emitted directly by commands.

### Terminal tests

Run using [`run_terminal_test`].
These tests verify what a snippet writes to the terminal, like messages and warnings.

### Failure tests

Run using [`run_failure_test`].
These tests verify that a snippet fails to run.

## The test suite macro

The preferred way to write a suite of unit tests is the [`test_suite`] macro,
    which removes the boilerplate of calling the runners.
*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use texparser::command::BuiltIn;
use texparser::context::Context;
use texparser::error::Error;
use texparser::prelude::Result;
use texparser::session::{implement_has_component, FileSystem, Session};
use texparser::token::{write_objects, CommandRef, Object};
use texparser::traits::*;

/// Component that every unit testing state needs to have.
#[derive(Default)]
pub struct TestingComponent {
    allow_undefined_command: bool,
    objects: Vec<Object>,
}

impl TestingComponent {
    /// Character handler for the testing component.
    ///
    /// The object is recorded so that it can be compared, and its text is emitted as usual.
    pub fn character_handler<S: HasComponent<Self>>(
        object: Object,
        ctx: &mut dyn Context<S>,
    ) -> Result<()> {
        ctx.emit(&object.to_string());
        ctx.session_mut()
            .state
            .component_mut()
            .objects
            .push(object);
        Ok(())
    }

    /// Undefined command handler for the testing component.
    ///
    /// Undefined commands are an error unless the test allows them,
    ///     in which case they are recorded like characters.
    pub fn undefined_command_handler<S: HasComponent<Self>>(
        command_ref: &CommandRef,
        ctx: &mut dyn Context<S>,
    ) -> Result<()> {
        if !ctx.session().state.component().allow_undefined_command {
            return Err(ctx.session().undefined_command_error(command_ref));
        }
        ctx.emit(&command_ref.to_string());
        ctx.session_mut()
            .state
            .component_mut()
            .objects
            .push(Object::CommandRef(command_ref.clone()));
        Ok(())
    }

    fn take_objects(&mut self) -> Vec<Object> {
        std::mem::take(&mut self.objects)
    }
}

/// Simple state type for simple unit tests.
#[derive(Default)]
pub struct State {
    testing: TestingComponent,
}

impl SessionState for State {
    fn character_handler(object: Object, ctx: &mut dyn Context<Self>) -> Result<()> {
        TestingComponent::character_handler(object, ctx)
    }

    fn undefined_command_handler(command_ref: &CommandRef, ctx: &mut dyn Context<Self>) -> Result<()> {
        TestingComponent::undefined_command_handler(command_ref, ctx)
    }
}

implement_has_component![State, TestingComponent, testing];

/// A file system that serves files from memory.
#[derive(Default)]
pub struct InMemoryFileSystem {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl InMemoryFileSystem {
    pub fn add_file<P: Into<PathBuf>>(&mut self, path: P, contents: &str) {
        self.files.insert(path.into(), contents.as_bytes().to_vec());
    }

    pub fn add_bytes<P: Into<PathBuf>>(&mut self, path: P, contents: Vec<u8>) {
        self.files.insert(path.into(), contents);
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read_bytes(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        match self.files.get(path) {
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not in the in-memory file system", path.display()),
            )),
            Some(contents) => Ok(contents.clone()),
        }
    }
}

/// Option passed to a test runner.
pub enum TestOption<'a, S> {
    /// The built-in commands are the result of invoking the provided static function.
    ///
    /// Overrides previous `BuiltInCommands` or `BuiltInCommandsDyn` options.
    BuiltInCommands(fn() -> HashMap<&'static str, BuiltIn<S>>),

    /// The built-in commands are the result of invoking the provided closure.
    ///
    /// Overrides previous `BuiltInCommands` or `BuiltInCommandsDyn` options.
    BuiltInCommandsDyn(Box<dyn Fn() -> HashMap<&'static str, BuiltIn<S>> + 'a>),

    /// The provided static function is invoked after the session is created and before it runs.
    ///
    /// Overrides previous `CustomSessionInitialization` or `CustomSessionInitializationDyn` options.
    CustomSessionInitialization(fn(&mut Session<S>)),

    /// The provided closure is invoked after the session is created and before it runs.
    ///
    /// Overrides previous `CustomSessionInitialization` or `CustomSessionInitializationDyn` options.
    #[allow(clippy::type_complexity)]
    CustomSessionInitializationDyn(Box<dyn Fn(&mut Session<S>) + 'a>),

    /// Whether undefined commands raise an error.
    ///
    /// Overrides previous `AllowUndefinedCommands` options.
    AllowUndefinedCommands(bool),

    /// Whether to recover from errors.
    ///
    /// Overrides previous `RecoverFromErrors` options.
    RecoverFromErrors(bool),

    /// A file in the in-memory file system, given by its path and contents.
    ///
    /// Relative paths are not resolved against any working directory.
    File(&'a str, &'a str),

    /// Whether the input is tokenized up front and processed as a list.
    ///
    /// Category code changes made by the input do not affect how it was tokenized.
    ///
    /// Overrides previous `ListMode` options.
    ListMode(bool),
}

/// Run an expansion equality test.
///
/// The test passes if the two provided input strings produce the same objects and the same text.
pub fn run_expansion_equality_test<S>(
    lhs: &str,
    rhs: &str,
    expect_recoverable_errors: bool,
    options: &[TestOption<S>],
) where
    S: Default + HasComponent<TestingComponent>,
{
    let options = ResolvedOptions::new(options);
    let outcome_1 = run_or_panic(lhs, &options);
    let outcome_2 = run_or_panic(rhs, &options);
    compare_output(outcome_1.objects, outcome_2.objects);
    assert_eq!(
        outcome_1.output.trim_end(),
        outcome_2.output.trim_end(),
        "emitted text is different"
    );

    match (expect_recoverable_errors, outcome_1.num_recovered_errors) {
        (true, 0) => {
            panic!("expected recoverable errors but didn't have any");
        }
        (true, _) | (false, 0) => (),
        (false, i) => {
            panic!("did not expect recoverable errors but had {i} recoverable errors");
        }
    }
}

/// Run an output test.
///
/// The test passes if the text emitted by the input is the expected text.
pub fn run_output_test<S>(input: &str, expected: &str, options: &[TestOption<S>])
where
    S: Default + HasComponent<TestingComponent>,
{
    let options = ResolvedOptions::new(options);
    let outcome = run_or_panic(input, &options);
    assert_eq!(outcome.output, expected);
}

/// Run a terminal test.
///
/// The test passes if the text written to the terminal by the input is the expected text.
pub fn run_terminal_test<S>(input: &str, expected: &str, options: &[TestOption<S>])
where
    S: Default + HasComponent<TestingComponent>,
{
    let options = ResolvedOptions::new(options);
    let outcome = run_or_panic(input, &options);
    assert_eq!(outcome.terminal, expected);
}

/// Run a failure test.
///
/// The test passes if running the provided input fails.
/// The error is returned so that callers can make further assertions about it.
pub fn run_failure_test<S>(input: &str, options: &[TestOption<S>]) -> Box<Error>
where
    S: Default + HasComponent<TestingComponent>,
{
    let options = ResolvedOptions::new(options);
    match execute_source_code(input, &options) {
        Ok(outcome) => {
            println!("Run succeeded:");
            println!("{}", write_objects(&outcome.objects));
            panic!("Failure test did not pass: run successful");
        }
        Err(err) => {
            println!("{err}");
            err
        }
    }
}

fn compare_output(mut output_1: Vec<Object>, mut output_2: Vec<Object>) {
    let trim_space = |v: &mut Vec<Object>| {
        while matches!(v.last(), Some(Object::Space | Object::EndOfLine)) {
            v.pop();
        }
    };
    trim_space(&mut output_1);
    trim_space(&mut output_2);

    if output_1 != output_2 {
        println!("Expansion output is different:");
        println!("------[lhs]------");
        println!("'{}'", write_objects(&output_1));
        println!("{output_1:?}");
        println!("------[rhs]------");
        println!("'{}'", write_objects(&output_2));
        println!("{output_2:?}");
        println!("-----------------");
        panic!("Expansion test failed");
    }
}

struct Outcome {
    objects: Vec<Object>,
    output: String,
    terminal: String,
    num_recovered_errors: usize,
}

struct ResolvedOptions<'a, S> {
    built_in_commands: &'a dyn Fn() -> HashMap<&'static str, BuiltIn<S>>,
    custom_session_initialization: &'a dyn Fn(&mut Session<S>),
    allow_undefined_commands: bool,
    recover_from_errors: bool,
    files: Vec<(&'a str, &'a str)>,
    list_mode: bool,
}

impl<'a, S> ResolvedOptions<'a, S> {
    pub fn new(options: &'a [TestOption<S>]) -> Self {
        let mut resolved = Self {
            built_in_commands: &HashMap::new,
            custom_session_initialization: &|_| {},
            allow_undefined_commands: false,
            recover_from_errors: false,
            files: vec![],
            list_mode: false,
        };
        for option in options {
            match option {
                TestOption::BuiltInCommands(f) => resolved.built_in_commands = f,
                TestOption::BuiltInCommandsDyn(f) => resolved.built_in_commands = f,
                TestOption::CustomSessionInitialization(f) => {
                    resolved.custom_session_initialization = f
                }
                TestOption::CustomSessionInitializationDyn(f) => {
                    resolved.custom_session_initialization = f
                }
                TestOption::AllowUndefinedCommands(b) => resolved.allow_undefined_commands = *b,
                TestOption::RecoverFromErrors(b) => resolved.recover_from_errors = *b,
                TestOption::File(path, contents) => resolved.files.push((path, contents)),
                TestOption::ListMode(b) => resolved.list_mode = *b,
            }
        }
        resolved
    }
}

fn run_or_panic<S>(source: &str, options: &ResolvedOptions<S>) -> Outcome
where
    S: Default + HasComponent<TestingComponent>,
{
    execute_source_code(source, options)
        .map_err(|err| {
            println!("{err}");
            err
        })
        .unwrap()
}

/// Execute source code in a new session with the provided options.
fn execute_source_code<S>(source: &str, options: &ResolvedOptions<S>) -> Result<Outcome>
where
    S: Default + HasComponent<TestingComponent>,
{
    let mut session = Session::<S>::new((options.built_in_commands)());
    let terminal = Rc::new(RefCell::new(Vec::<u8>::new()));
    session.terminal_out = terminal.clone();
    let mut file_system: InMemoryFileSystem = Default::default();
    for (path, contents) in &options.files {
        file_system.add_file(*path, contents);
    }
    session.file_system = Box::new(file_system);
    session.working_directory = None;
    session.config.recover_from_errors = options.recover_from_errors;
    session.state.component_mut().allow_undefined_command = options.allow_undefined_commands;
    (options.custom_session_initialization)(&mut session);

    if options.list_mode {
        let list = session.tokenize(source)?;
        session.run_list(list)?;
    } else {
        session.push_source("testing.tex", source)?;
        session.run()?;
    }
    let objects = session.state.component_mut().take_objects();
    let terminal = String::from_utf8_lossy(&terminal.borrow()).into_owned();
    Ok(Outcome {
        objects,
        output: session.take_output(),
        terminal,
        num_recovered_errors: session.recovered_errors().len(),
    })
}

/// Macro to generate a suite of unit tests
///
/// The general use of this macros looks like this:
/// ```
/// # use std::collections::HashMap;
/// # use texparser::command::BuiltIn;
/// # use texparser::error::Tag;
/// # use texparser_testing::*;
/// # fn built_in_commands() -> HashMap<&'static str, BuiltIn<State>> { HashMap::new() }
/// test_suite![
///     state(State),
///     options(TestOption::BuiltInCommands(built_in_commands)),
///     expansion_equality_tests(
///         (case_1, "a{b}c", "abc"),
///         (case_2, "a  b", "a b"),
///     ),
///     output_tests(
///         (case_3, "a {b}", "a b"),
///     ),
///     failure_tests(
///         (case_4, r"\undefined"),
///         (case_5, "{", Tag::UnbalancedGroups),
///     ),
/// ];
/// ```
///
/// The arguments to the macro are:
///
/// - `state(State)`: defines which Rust type to use as the session state in the tests.
///     This can be omitted, in which case it defaults to the type name `State` in the current scope.
///
/// - `options(option_1, option_2, ..., option_n)`: options to pass to the test runner.
///     This is a list of values of type [TestOption].
///     The options can be omitted, in which case they default to
///     `options(TestOption::BuiltInCommands(built_in_commands))`,
///     where `built_in_commands` is a static function in the current scope.
///
/// - `expansion_equality_tests(cases...)`: cases of the form (case name, left hand side, right hand side),
///     fed into the [run_expansion_equality_test] test runner.
///
/// - `live_and_list_tests(cases...)`: cases of the form (case name, left hand side, right hand side).
///     Each case generates two expansion equality tests: one reading the input from a source
///     and one processing the tokenized input as a list (see [TestOption::ListMode]).
///
/// - `output_tests(cases...)`: cases of the form (case name, input, expected text),
///     fed into the [run_output_test] test runner.
///
/// - `terminal_tests(cases...)`: cases of the form (case name, input, expected terminal text),
///     fed into the [run_terminal_test] test runner.
///
/// - `failure_tests(cases...)`: cases of the form (case name, input) or (case name, input, tag),
///     fed into the [run_failure_test] test runner.
///
/// - `recoverable_failure_tests(cases...)`: cases of the form (case name, input, output after recovery).
///     Each case generates two tests: one with error recovery enabled that checks the output,
///     and one with error recovery disabled that checks the input fails.
///
/// Only one `state()` argument may be provided, and if provided it must be in the first position.
/// Only one `options()` argument may be provided, and if provided it must be in the first position
///     or after the `state()` argument.
/// Zero or more of the other arguments may be provided, and in any order.
#[macro_export]
macro_rules! test_suite {
    ( state($state: ty), options $options: tt, expansion_equality_tests ( $( ($name: ident, $lhs: expr, $rhs: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let lhs = $lhs;
                let rhs = $rhs;
                let options = vec! $options;
                $crate::run_expansion_equality_test::<$state>(&lhs, &rhs, false, &options);
            }
        )*
    );
    ( state($state: ty), options $options: tt, expansion_equality_tests $test_body: tt $(,)? ) => (
        compile_error!("Invalid test cases for expansion_equality_tests: must be a list of tuples (name, lhs, rhs)");
    );
    ( state($state: ty), options $options: tt, output_tests ( $( ($name: ident, $input: expr, $expected: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input = $input;
                let expected = $expected;
                let options = vec! $options;
                $crate::run_output_test::<$state>(&input, &expected, &options);
            }
        )*
    );
    ( state($state: ty), options $options: tt, terminal_tests ( $( ($name: ident, $input: expr, $expected: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input = $input;
                let expected = $expected;
                let options = vec! $options;
                $crate::run_terminal_test::<$state>(&input, &expected, &options);
            }
        )*
    );
    ( state($state: ty), options $options: tt, failure_tests ( $( ($name: ident, $input: expr $(, $tag: expr)? $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            #[test]
            fn $name() {
                let input = $input;
                let options = vec! $options;
                let _err = $crate::run_failure_test::<$state>(&input, &options);
                $( assert_eq!(_err.tag, $tag); )?
            }
        )*
    );
    ( state($state: ty), options $options: tt, recoverable_failure_tests ( $( ($name: ident, $lhs: expr, $rhs: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            mod $name {
                use super::*;
                #[test]
                fn error_recovery_enabled() {
                    let lhs = $lhs;
                    let rhs = $rhs;
                    let mut options = vec! $options;
                    options.push($crate::TestOption::RecoverFromErrors(true));
                    $crate::run_expansion_equality_test::<$state>(&lhs, &rhs, true, &options);
                }
                #[test]
                fn error_recovery_disabled() {
                    let input = $lhs;
                    let mut options = vec! $options;
                    options.push($crate::TestOption::RecoverFromErrors(false));
                    $crate::run_failure_test::<$state>(&input, &options);
                }
            }
        )*
    );
    ( state($state: ty), options $options: tt, live_and_list_tests ( $( ($name: ident, $lhs: expr, $rhs: expr $(,)? ) ),* $(,)? ) $(,)? ) => (
        $(
            mod $name {
                use super::*;
                #[test]
                fn live() {
                    let lhs = $lhs;
                    let rhs = $rhs;
                    let options = vec! $options;
                    $crate::run_expansion_equality_test::<$state>(&lhs, &rhs, false, &options);
                }
                #[test]
                fn list() {
                    let lhs = $lhs;
                    let rhs = $rhs;
                    let mut options = vec! $options;
                    options.push($crate::TestOption::ListMode(true));
                    $crate::run_expansion_equality_test::<$state>(&lhs, &rhs, false, &options);
                }
            }
        )*
    );
    ( state($state: ty), options $options: tt, $test_kind: ident $test_cases: tt $(,)? ) => (
        compile_error!("Invalid keyword: test_suite! only accepts the following keywords: `state`, `options`, `expansion_equality_tests`, `live_and_list_tests`, `output_tests`, `terminal_tests`, `failure_tests`, `recoverable_failure_tests`");
    );
    ( state($state: ty), options $options: tt, $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        $(
            $crate::test_suite![state($state), options $options, $test_kind $test_cases,];
        )+
    );
    ( options $options: tt, $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        $crate::test_suite![state(State), options $options, $( $test_kind $test_cases, )+ ];
    );
    ( $( $test_kind: ident $test_cases: tt ),+ $(,)? ) => (
        $crate::test_suite![options ($crate::TestOption::BuiltInCommands(built_in_commands)), $( $test_kind $test_cases, )+ ];
    );
}
