use rand::prelude::Distribution;
use rand::Rng;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use texparser::session::Session;
use texparser_stdlib::StdLibState;

/// Runs the input in a fresh standard library session and returns the output.
pub fn run(input: &str) -> String {
    let mut session = StdLibState::new_session();
    session.terminal_out = Rc::new(RefCell::new(std::io::sink()));
    session.push_source("bench.tex", input).unwrap();
    session.run().unwrap();
    session.take_output()
}

/// Tokenizes the input with the default category codes, without expanding anything.
///
/// Returns the number of objects produced.
pub fn tokenize(input: &str) -> usize {
    let session = Session::<()>::new(HashMap::new());
    session.tokenize(input).unwrap().len()
}

/// Reads a numeric benchmark parameter from the environment.
pub fn env_var_or(name: &str, default: usize) -> usize {
    match std::env::var(name) {
        Ok(val) => match val.parse::<usize>() {
            Ok(val) => val,
            Err(_) => panic!["Failed to parse env var {}={} as an integer", name, val],
        },
        Err(_) => default,
    }
}

static RANDOM_CS_NAMES: [&str; 16] = [
    "def", "gdef", "edef", "xdef", "let", "relax", "expandafter", "csname", "endcsname",
    "string", "number", "newcommand", "par", "message", "verb", "catcode",
];

pub struct Weights {
    pub begin_group: u32,
    pub end_group: u32,
    pub parameter: u32,
    pub space: u32,
    pub comment: u32,
    pub letter: u32,
    pub other: u32,
    pub control_sequence: u32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            begin_group: 10,
            end_group: 10,
            parameter: 20,
            space: 20,
            comment: 5,
            letter: 200,
            other: 100,
            control_sequence: 100,
        }
    }
}

/// Generates a document that defines `\macro` many times with random replacement texts.
///
/// Running the document produces no output; all of the work is lexing and defining.
pub fn generate_random_tex_document(
    rng: &mut rand::prelude::StdRng,
    num_lines: usize,
    macro_length_bounds: (usize, usize),
    line_length_bounds: (usize, usize),
    weights: &Weights,
) -> String {
    let mut result = String::new();
    result.push_str("% Randomly generated document.\n");
    result.push_str("% Running it is a no-op except that \\macro is defined at the end.\n");

    let mut num_lines_generated: usize = 2;
    let (min_length, max_length) = if macro_length_bounds.1 < macro_length_bounds.0 {
        (macro_length_bounds.1, macro_length_bounds.1)
    } else {
        macro_length_bounds
    };
    while num_lines_generated + min_length + 2 <= num_lines {
        let max_length = max_length.min(num_lines - num_lines_generated - 2);
        let macro_length = rng.gen_range(min_length..=max_length);
        result.push_str(&generate_random_tex_macro(
            rng,
            line_length_bounds,
            macro_length,
            weights,
        ));
        num_lines_generated += macro_length + 2;
    }
    result
}

pub fn generate_random_tex_macro(
    rng: &mut rand::prelude::StdRng,
    line_length_bounds: (usize, usize),
    num_lines: usize,
    weights: &Weights,
) -> String {
    let dist = rand::distributions::WeightedIndex::new([
        weights.begin_group,
        weights.end_group,
        weights.parameter,
        weights.space,
        weights.comment,
        weights.letter,
        weights.other,
        weights.control_sequence,
    ])
    .unwrap();

    let mut result = String::with_capacity(num_lines * line_length_bounds.1 + 100);
    result.push_str("\\def\\macro#1#2#3{%\n");
    for _ in 0..num_lines {
        result.push_str("  ");
        let mut commenting = false;
        let mut group_depth: u32 = 0;
        let line_length = if line_length_bounds.1 <= line_length_bounds.0 {
            line_length_bounds.1
        } else {
            rng.gen_range(line_length_bounds.0..=line_length_bounds.1)
        };
        let mut i = 0;
        while i < line_length {
            let temp;
            let s = match dist.sample(rng) {
                0 => {
                    if !commenting {
                        group_depth += 1;
                    }
                    "{"
                }
                1 => {
                    if !commenting && group_depth == 0 {
                        continue;
                    }
                    if !commenting {
                        group_depth -= 1;
                    }
                    "}"
                }
                2 => match rng.gen_range(0..4) {
                    0 => "#1",
                    1 => "#2",
                    2 => "#3",
                    _ => "##",
                },
                3 => " ",
                4 => {
                    for _ in 0..group_depth {
                        result.push('}');
                    }
                    group_depth = 0;
                    commenting = true;
                    "%"
                }
                5 => {
                    let offset = if rng.gen_range(0..4) == 0 { b'A' } else { b'a' };
                    temp = char::from(offset + rng.gen_range(0..26)).to_string();
                    &temp
                }
                6 => [".", ",", ";", ":", "0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]
                    [rng.gen_range(0..14)],
                _ => {
                    temp = format![
                        "\\{} ",
                        RANDOM_CS_NAMES[rng.gen_range(0..RANDOM_CS_NAMES.len())]
                    ];
                    &temp
                }
            };
            i += s.len();
            result.push_str(s);
        }
        for _ in 0..group_depth {
            result.push('}');
        }
        result.push('\n');
    }
    result.push_str("}\n");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn random_document_runs_without_output() {
        let mut rng = rand::prelude::StdRng::seed_from_u64(43);
        let document = generate_random_tex_document(&mut rng, 200, (5, 10), (40, 60), &Default::default());
        assert_eq!(run(&document), "");
    }

    #[test]
    fn tokenize_counts_objects() {
        assert_eq!(tokenize(r"\def\a{b} c"), 7);
    }
}
