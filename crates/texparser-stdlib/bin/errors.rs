use texparser::error::Error;
use texparser_stdlib::*;

fn main() {
    println!("# All texparser errors\n");
    for case in ErrorCase::all_error_cases() {
        let result = run(case);
        println!(
            "## {}\n\nInput:\n```\n{}\n```\nOutput:\n```\n{}\n```\n\n",
            result.case.description, result.case.source_code, result.err,
        )
    }
}

struct RunResult {
    case: ErrorCase,
    err: Box<Error>,
}

fn run(case: ErrorCase) -> RunResult {
    let mut session = StdLibState::new_session();
    session.terminal_out = std::rc::Rc::new(std::cell::RefCell::new(std::io::sink()));
    let err = match session
        .push_source("input.tex", case.source_code)
        .and_then(|()| session.run())
    {
        Ok(()) => panic!(
            "successfully ran {} (`{}`) but expected an error",
            case.description, case.source_code
        ),
        Err(err) => err,
    };
    RunResult { case, err }
}
