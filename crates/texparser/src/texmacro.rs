//! Implementation of user defined macros.
//!
//! A macro's replacement text is compiled once, when the macro is defined, into an immutable
//!     template: a tree of literal objects, parameter slots and groups.
//! Every invocation builds a brand new [ObjectList] from the template and the arguments,
//!     so two expansions of the same macro never share any objects.

use crate::catcode::CatCode;
use crate::context::argument::ArgumentStyle;
use crate::context::Context;
use crate::error::{Error, Tag};
use crate::prelude::Result;
use crate::session::SessionState;
use crate::token::{self, CommandRef, GroupKind, Object, ObjectList};
use texparser_stdext::color::Colorize;

/// A user defined macro.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Macro {
    prefix: ObjectList,
    parameters: Vec<ArgumentStyle>,
    template: Vec<Node>,
    long: bool,
    protected: bool,
}

/// A node in a macro template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// An object copied into every expansion.
    Literal(Object),
    /// The argument with this (zero based) index.
    Slot(usize),
    /// A group whose contents are themselves a template.
    Group(Vec<Node>, GroupKind),
}

impl Macro {
    /// Creates a new macro.
    ///
    /// The prefix must appear in the input right after the macro, as in `\def\a.#1{}`.
    /// Parameter markers in the body refer to the parameters by number, starting at 1.
    pub fn new(
        prefix: ObjectList,
        parameters: Vec<ArgumentStyle>,
        body: &ObjectList,
    ) -> std::result::Result<Macro, Box<Error>> {
        let template = compile(body, parameters.len())?;
        Ok(Macro {
            prefix,
            parameters,
            template,
            long: false,
            protected: false,
        })
    }

    /// Creates a macro from TeX parameter text, as read by `\def`.
    ///
    /// Parameters must be numbered consecutively from 1.
    /// A parameter followed by other objects is delimited by those objects;
    ///     a parameter followed by another parameter or by the end of the text is undelimited.
    pub fn from_def_parameters(
        parameter_text: &ObjectList,
        body: &ObjectList,
        long: bool,
    ) -> std::result::Result<Macro, Box<Error>> {
        let mut prefix = ObjectList::new();
        let mut delimiters: Vec<ObjectList> = vec![];
        let mut iter = parameter_text.iter().peekable();
        while let Some(object) = iter.next() {
            let number = match object {
                Object::Param(n) => Some(*n as usize),
                Object::Char(_, CatCode::Parameter) => match iter.peek() {
                    Some(Object::Char(d, _)) if d.is_ascii_digit() => {
                        let n = *d as usize - '0' as usize;
                        iter.next();
                        Some(n)
                    }
                    _ => None,
                },
                _ => None,
            };
            match number {
                Some(n) => {
                    let expected = delimiters.len() + 1;
                    if n != expected {
                        return Err(Error::new(Tag::BadParameterText, [n, expected]).into());
                    }
                    delimiters.push(ObjectList::new());
                }
                None => match delimiters.last_mut() {
                    None => prefix.push_back(object.clone()),
                    Some(delimiter) => delimiter.push_back(object.clone()),
                },
            }
        }
        let parameters = delimiters
            .into_iter()
            .map(|delimiter| match (delimiter.is_empty(), long) {
                (true, false) => ArgumentStyle::MandatoryBrace,
                (true, true) => ArgumentStyle::MandatoryBraceLong,
                (false, _) => ArgumentStyle::UntilTokens { delimiter, long },
            })
            .collect();
        Ok(Macro::new(prefix, parameters, body)?.with_long(long))
    }

    pub fn with_long(mut self, long: bool) -> Macro {
        self.long = long;
        self
    }

    pub fn with_protected(mut self, protected: bool) -> Macro {
        self.protected = protected;
        self
    }

    pub fn parameters(&self) -> &[ArgumentStyle] {
        &self.parameters
    }

    pub fn template(&self) -> &[Node] {
        &self.template
    }

    pub fn is_long(&self) -> bool {
        self.long
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }

    /// Reads the macro's arguments from the context and returns the expansion.
    pub fn call<S: SessionState>(
        &self,
        invoker: &CommandRef,
        ctx: &mut dyn Context<S>,
    ) -> Result<ObjectList> {
        for expected in self.prefix.iter() {
            match ctx.next_raw()? {
                Some(object) if &object == expected => {}
                _ => return Err(ctx.report_error(Tag::MacroMismatch, vec![invoker.to_string()])),
            }
        }
        let mut arguments = Vec::with_capacity(self.parameters.len());
        for style in &self.parameters {
            arguments.push(ctx.pop_argument(style)?);
        }
        let expansion = self.instantiate(&arguments);
        tracing::trace!(command = %invoker, expansion = %expansion, "expanded macro");
        S::post_macro_expansion_hook(ctx.session_mut(), invoker, self, &arguments, &expansion);
        Ok(expansion)
    }

    /// Builds a new list from the template, substituting the arguments into the slots.
    ///
    /// Each slot receives its own copy of the argument.
    pub fn instantiate(&self, arguments: &[Object]) -> ObjectList {
        let mut result = ObjectList::new();
        instantiate_nodes(&self.template, arguments, &mut result);
        result
    }

    pub fn doc(&self) -> String {
        let mut d = String::default();
        d.push_str("User defined macro\n\n");
        d.push_str(&format![
            "{}\n{}",
            "Parameters definition".italic(),
            pretty_print_prefix_and_parameters(&self.prefix, &self.parameters),
        ]);
        d.push_str(&format![
            "\n\n{} `{}`\n",
            "Replacement definition:".italic(),
            pretty_print_template(&self.template),
        ]);
        d
    }
}

fn compile(body: &ObjectList, num_parameters: usize) -> std::result::Result<Vec<Node>, Box<Error>> {
    let slot = |n: usize| {
        if n == 0 || n > num_parameters {
            Err(Box::new(Error::new(Tag::IllegalParameter, [n])))
        } else {
            Ok(Node::Slot(n - 1))
        }
    };
    let mut nodes = Vec::with_capacity(body.len());
    let mut iter = body.iter().peekable();
    while let Some(object) = iter.next() {
        let node = match object {
            Object::Param(n) => slot(*n as usize)?,
            // Inside a definition that is itself inside a definition, `##` is a parameter character.
            Object::DoubleParam => Node::Literal(Object::Char('#', CatCode::Parameter)),
            Object::Char(_, CatCode::Parameter) => match iter.peek() {
                Some(Object::Char(d, _)) if d.is_ascii_digit() => {
                    let n = *d as usize - '0' as usize;
                    iter.next();
                    slot(n)?
                }
                Some(Object::Char(_, CatCode::Parameter)) => {
                    iter.next();
                    Node::Literal(object.clone())
                }
                _ => Node::Literal(object.clone()),
            },
            Object::Group(list, kind) => Node::Group(compile(list, num_parameters)?, *kind),
            other => Node::Literal(other.clone()),
        };
        nodes.push(node);
    }
    Ok(nodes)
}

fn instantiate_nodes(nodes: &[Node], arguments: &[Object], result: &mut ObjectList) {
    for node in nodes {
        match node {
            Node::Literal(object) => result.push_back(object.clone()),
            Node::Slot(i) => {
                if let Some(argument) = arguments.get(*i) {
                    result.extend(argument.clone().into_list());
                }
            }
            Node::Group(inner, kind) => {
                let mut list = ObjectList::new();
                instantiate_nodes(inner, arguments, &mut list);
                result.push_back(Object::Group(list, *kind));
            }
        }
    }
}

fn colored_parameter_number(n: usize) -> String {
    let color = match n {
        1 => |s: &str| s.bright_yellow(),
        _ => |s: &str| s.bright_blue(),
    };
    format!["{}{}", color("#").bold(), color(&n.to_string()).bold()]
}

pub fn pretty_print_prefix_and_parameters(
    prefix: &ObjectList,
    parameters: &[ArgumentStyle],
) -> String {
    let mut d = String::default();
    if prefix.is_empty() {
        d.push_str(" . No prefix\n");
    } else {
        d.push_str(&format![" . Prefix: `{}`\n", token::write_objects(prefix)]);
    }
    d.push_str(&format![" . Parameters ({}):\n", parameters.len()]);
    for (i, parameter) in parameters.iter().enumerate() {
        d.push_str(&format![
            "    {}: {}\n",
            colored_parameter_number(i + 1),
            parameter
        ]);
    }
    d
}

pub fn pretty_print_template(nodes: &[Node]) -> String {
    let mut b = String::default();
    for node in nodes {
        match node {
            Node::Literal(object) => b.push_str(&object.to_string()),
            Node::Slot(i) => b.push_str(&colored_parameter_number(*i + 1)),
            Node::Group(inner, kind) => {
                let (open, close) = match kind {
                    GroupKind::Brace => ('{', '}'),
                    GroupKind::Delimited(open, close) => (*open, *close),
                };
                b.push(open);
                b.push_str(&pretty_print_template(inner));
                b.push(close);
            }
        }
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::lexer::{EndOfLinePolicy, Lexer};
    use std::collections::HashMap;

    fn lex(source: &str) -> ObjectList {
        let mut lexer = Lexer::new(source);
        let cat_codes: HashMap<char, CatCode> = HashMap::new();
        let mut stack = vec![ObjectList::new()];
        while let Some(object) = lexer
            .next(&cat_codes, EndOfLinePolicy::Space, false)
            .unwrap()
        {
            match object {
                Object::Char(_, CatCode::BeginGroup) => stack.push(ObjectList::new()),
                Object::Char(_, CatCode::EndGroup) => {
                    let group = stack.pop().unwrap();
                    stack.last_mut().unwrap().push_back(Object::group(group));
                }
                other => stack.last_mut().unwrap().push_back(other),
            }
        }
        stack.pop().unwrap()
    }

    #[test]
    fn instantiate_doubles_argument() {
        let m = Macro::new(
            ObjectList::new(),
            vec![ArgumentStyle::MandatoryBrace],
            &lex("#1#1"),
        )
        .unwrap();
        let expansion = m.instantiate(&[Object::letter('X')]);
        assert_eq!(token::write_objects(&expansion), "XX");
    }

    #[test]
    fn instantiations_are_independent() {
        let m = Macro::new(
            ObjectList::new(),
            vec![ArgumentStyle::MandatoryBrace],
            &lex("{a#1}"),
        )
        .unwrap();
        let argument = Object::group(lex("b"));
        let mut first = m.instantiate(std::slice::from_ref(&argument));
        let second = m.instantiate(std::slice::from_ref(&argument));
        if let Some(Object::Group(inner, _)) = first.pop_front() {
            let mut inner = inner;
            inner.push_back(Object::letter('z'));
            first.push_front(Object::group(inner));
        }
        assert_eq!(token::write_objects(&first), "{abz}");
        assert_eq!(token::write_objects(&second), "{ab}");
        assert_eq!(token::write_objects(&m.instantiate(&[argument])), "{ab}");
    }

    #[test]
    fn double_param_becomes_parameter_character() {
        let m = Macro::new(
            ObjectList::new(),
            vec![ArgumentStyle::MandatoryBrace],
            &lex("\\def\\b##1{#1##1}"),
        )
        .unwrap();
        let expansion = m.instantiate(&[Object::letter('x')]);
        assert_eq!(token::write_objects(&expansion), "\\def\\b#1{x#1}");
        // The instantiated body can itself be compiled as a definition.
        let inner_body = match expansion.back() {
            Some(Object::Group(list, _)) => list.clone(),
            _ => panic!("expected a group"),
        };
        let inner = Macro::new(
            ObjectList::new(),
            vec![ArgumentStyle::MandatoryBrace],
            &inner_body,
        )
        .unwrap();
        assert_eq!(
            token::write_objects(&inner.instantiate(&[Object::letter('y')])),
            "xy"
        );
    }

    #[test]
    fn illegal_parameter() {
        let err = Macro::new(
            ObjectList::new(),
            vec![ArgumentStyle::MandatoryBrace],
            &lex("#2"),
        )
        .unwrap_err();
        assert_eq!(err.tag, Tag::IllegalParameter);
        assert_eq!(err.params, vec!["2".to_string()]);
    }

    #[test]
    fn leaf_arguments() {
        let m = Macro::new(
            ObjectList::new(),
            vec![
                ArgumentStyle::StarModifier,
                ArgumentStyle::Numeric,
                ArgumentStyle::Label,
            ],
            &lex("#1|#2|#3"),
        )
        .unwrap();
        let expansion = m.instantiate(&[
            Object::Boolean(true),
            Object::Number(-7),
            Object::Text("a b".into()),
        ]);
        assert_eq!(token::write_objects(&expansion), "\\BooleanTrue|-7|a b");
    }

    #[test]
    fn from_def_parameters_undelimited_and_delimited() {
        let m = Macro::from_def_parameters(&lex("#1#2.#3"), &lex("#3#2#1"), false).unwrap();
        assert_eq!(
            m.parameters(),
            &[
                ArgumentStyle::MandatoryBrace,
                ArgumentStyle::UntilTokens {
                    delimiter: vec![Object::other('.')].into(),
                    long: false,
                },
                ArgumentStyle::MandatoryBrace,
            ]
        );
    }

    #[test]
    fn from_def_parameters_prefix_and_long() {
        let m = Macro::from_def_parameters(&lex("(#1)"), &lex("#1"), true).unwrap();
        assert_eq!(m.prefix, vec![Object::other('(')].into());
        assert!(m.is_long());
        assert_eq!(
            m.parameters(),
            &[ArgumentStyle::UntilTokens {
                delimiter: vec![Object::other(')')].into(),
                long: true,
            }]
        );
    }

    #[test]
    fn from_def_parameters_must_be_consecutive() {
        let err = Macro::from_def_parameters(&lex("#1#3"), &lex(""), false).unwrap_err();
        assert_eq!(err.tag, Tag::BadParameterText);
        assert_eq!(err.params, vec!["3".to_string(), "2".to_string()]);
    }
}
