//! Rendering of errors and warnings for the terminal.
//!
//! The format is modelled on compiler diagnostics:
//! ```text
//! Error[tex.error.undefined_cs]: undefined control sequence \fo
//!  --> main.tex:3
//!   = note: did you mean \foo?
//! ```
use super::{Error, Location, Warning};
use std::fmt;
use texparser_stdext::color::Colorize;

pub(crate) fn format_error(f: &mut fmt::Formatter<'_>, error: &Error) -> fmt::Result {
    let heading = "Error".bright_red().bold();
    write!(f, "{heading}{}", format!("[{}]", error.tag.id()).as_str().dimmed())?;
    write!(f, ": {}", error.message().as_str().bold())?;
    format_location(f, error.location.as_ref())?;
    for note in &error.notes {
        write!(f, "\n  {} {note}", "= note:".bright_cyan())?;
    }
    Ok(())
}

pub(crate) fn format_warning(f: &mut fmt::Formatter<'_>, warning: &Warning) -> fmt::Result {
    let heading = "Warning".bright_yellow().bold();
    write!(f, "{heading}: {}", warning.message().as_str().bold())?;
    format_location(f, warning.location.as_ref())
}

fn format_location(f: &mut fmt::Formatter<'_>, location: Option<&Location>) -> fmt::Result {
    if let Some(location) = location {
        write!(f, "\n {} {location}", "-->".bright_cyan())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::*;

    fn disable_color() {
        #[cfg(feature = "color")]
        colored::control::set_override(false);
    }

    #[test]
    fn error_with_location_and_note() {
        disable_color();
        let error = Error::new(Tag::UndefinedControlSequence, ["\\fo"])
            .with_location(Some(Location {
                file: "main.tex".into(),
                line: 3,
            }))
            .with_note("did you mean \\foo?");
        assert_eq!(
            error.to_string(),
            "Error[tex.error.undefined_cs]: undefined control sequence \\fo\n --> main.tex:3\n  = note: did you mean \\foo?"
        );
    }

    #[test]
    fn warning_without_location() {
        disable_color();
        let warning = Warning {
            tag: Tag::FileNotFound,
            params: vec!["a.tex".into()],
            location: None,
        };
        assert_eq!(warning.to_string(), "Warning: file a.tex not found");
    }
}
