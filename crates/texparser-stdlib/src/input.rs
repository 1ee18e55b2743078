//! Commands that read other files: `\input`, `\@input` and `\InputIfFileExists`

use texparser::catcode::CatCode;
use texparser::command::BuiltIn;
use texparser::context::{ArgumentStyle, Context};
use texparser::error::Tag;
use texparser::prelude::Result;
use texparser::session::Charset;
use texparser::token::{CommandRef, GroupKind, Object};
use texparser::traits::*;

pub const INPUT_DOC: &str = "Insert the contents of a file: \\input{<file>} or \\input <file>";
pub const AT_INPUT_DOC: &str =
    "Process a file with `@` as a letter, warning instead of failing if the file does not exist";
pub const INPUT_IF_FILE_EXISTS_DOC: &str =
    "Insert a file if it exists: \\InputIfFileExists{<file>}{<then>}{<else>}";

/// Component for the input commands.
#[derive(Default)]
pub struct Component {
    charset: Charset,
    files_read: Vec<String>,
}

impl Component {
    /// The charset used to decode input files.
    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn set_charset(&mut self, charset: Charset) {
        self.charset = charset;
    }

    /// Names of the files that have been read, in order.
    pub fn files_read(&self) -> &[String] {
        &self.files_read
    }
}

/// Get the `\input` command.
pub fn get_input<S: HasComponent<Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(input_primitive_fn).with_doc(INPUT_DOC)
}

/// Get the `\@input` command.
pub fn get_at_input<S: HasComponent<Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(at_input_primitive_fn).with_doc(AT_INPUT_DOC)
}

/// Get the `\InputIfFileExists` command.
pub fn get_input_if_file_exists<S: HasComponent<Component>>() -> BuiltIn<S> {
    BuiltIn::new_execution(input_if_file_exists_primitive_fn).with_doc(INPUT_IF_FILE_EXISTS_DOC)
}

fn input_primitive_fn<S: HasComponent<Component>>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let file_name = pop_file_name(invoker, ctx)?;
    if !insert_file(ctx, &file_name)? {
        ctx.report_warning(Tag::FileNotFound, vec![file_name]);
    }
    Ok(())
}

fn at_input_primitive_fn<S: HasComponent<Component>>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let file_name = pop_file_name(invoker, ctx)?;
    let charset = ctx.session().state.component().charset;
    let outcome = match ctx
        .session_mut()
        .open_source(&file_name, charset, &[('@', CatCode::Letter)])?
    {
        None => None,
        Some(mut stream) => Some(stream.process()),
    };
    match outcome {
        None => {
            ctx.report_warning(Tag::FileNotFound, vec![file_name]);
            Ok(())
        }
        Some(result) => {
            record_file(ctx, file_name);
            result
        }
    }
}

fn input_if_file_exists_primitive_fn<S: HasComponent<Component>>(
    invoker: &CommandRef,
    ctx: &mut dyn Context<S>,
) -> Result<()> {
    let file_name = pop_file_name(invoker, ctx)?;
    let then_branch = ctx.pop_argument(&ArgumentStyle::MandatoryBraceLong)?;
    let else_branch = ctx.pop_argument(&ArgumentStyle::MandatoryBraceLong)?;
    if insert_file(ctx, &file_name)? {
        ctx.push_list_front(then_branch.into_list())
    } else {
        ctx.push_list_front(else_branch.into_list())
    }
}

/// Puts the contents of the file at the front of the input.
///
/// In live mode the file is pushed as a new source, so that it is tokenized with the
///     category codes in effect as it is read.
/// In list mode it is tokenized immediately.
/// Returns false if the file does not exist.
fn insert_file<S: HasComponent<Component>>(
    ctx: &mut dyn Context<S>,
    file_name: &str,
) -> Result<bool> {
    let charset = ctx.session().state.component().charset;
    let found = if ctx.is_live() {
        ctx.session_mut().push_file_source(file_name, charset)?
    } else {
        match ctx.session().read_source_file(file_name, charset)? {
            None => false,
            Some(source_code) => {
                let objects = ctx.session().tokenize(&source_code)?;
                ctx.push_list_front(objects)?;
                true
            }
        }
    };
    if found {
        record_file(ctx, file_name.to_string());
    }
    Ok(found)
}

fn record_file<S: HasComponent<Component>>(ctx: &mut dyn Context<S>, file_name: String) {
    tracing::debug!(file = %file_name, "input file");
    ctx.session_mut()
        .state
        .component_mut()
        .files_read
        .push(file_name);
}

/// Pops a file name, either as a braced argument or as characters up to the next space.
fn pop_file_name<S: SessionState>(invoker: &CommandRef, ctx: &mut dyn Context<S>) -> Result<String> {
    loop {
        let is_whitespace = match ctx.peek_raw()? {
            None => break,
            Some(object) => object.is_whitespace(),
        };
        if !is_whitespace {
            break;
        }
        ctx.next_raw()?;
    }
    let braced = matches!(
        ctx.peek_raw()?,
        Some(Object::Char(_, CatCode::BeginGroup) | Object::Group(_, GroupKind::Brace))
    );
    let file_name = if braced {
        match ctx.pop_argument(&ArgumentStyle::Label)? {
            Object::Text(file_name) => file_name,
            other => other.to_string(),
        }
    } else {
        let mut file_name = String::new();
        while let Some(object) = ctx.next_expanded()? {
            match object {
                Object::Char(c, CatCode::Letter | CatCode::Other) => file_name.push(c),
                object if object.is_whitespace() => break,
                object => {
                    ctx.push_front(object);
                    break;
                }
            }
        }
        file_name
    };
    let file_name = file_name.trim().to_string();
    if file_name.is_empty() {
        return Err(ctx.report_error(
            Tag::UnexpectedEndOfInput,
            vec![format!("reading the file name for {invoker}")],
        ));
    }
    Ok(file_name)
}
