//! Reading input files.
use super::{Session, SessionState};
use crate::catcode::{CatCode, SavedCatCodes};
use crate::context::Context;
use crate::error::Tag;
use crate::expansion;
use crate::prelude::Result;
use crate::token::{Object, ObjectList};
use std::path::{Path, PathBuf};

/// File system operations that a session may need to perform.
///
/// These operations are extracted to a trait so that they can be mocked out in unit testing.
pub trait FileSystem {
    /// Read the entire contents of a file.
    ///
    /// This is implemented by [std::fs::read].
    fn read_bytes(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

pub(super) struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_bytes(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// How the bytes of an input file are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Charset {
    #[default]
    Utf8,
    /// ISO 8859-1: every byte is the character with the same code point.
    Latin1,
    Ascii,
}

impl Charset {
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Latin1 => "ISO-8859-1",
            Charset::Ascii => "ASCII",
        }
    }

    /// Decodes the bytes, returning [None] if they are not valid in this charset.
    pub fn decode(&self, bytes: Vec<u8>) -> Option<String> {
        match self {
            Charset::Utf8 => {
                let mut s = String::from_utf8(bytes).ok()?;
                if s.starts_with('\u{FEFF}') {
                    s.remove(0);
                }
                Some(s)
            }
            Charset::Latin1 => Some(bytes.into_iter().map(char::from).collect()),
            Charset::Ascii => {
                if !bytes.is_ascii() {
                    return None;
                }
                String::from_utf8(bytes).ok()
            }
        }
    }
}

impl<S> Session<S> {
    /// Reads and decodes a source file.
    ///
    /// Relative paths are resolved against the working directory.
    /// If the path has no extension and does not exist, the `.tex` extension is tried.
    /// Returns [None] if the file does not exist.
    pub fn read_source_file(&self, path: &str, charset: Charset) -> Result<Option<String>> {
        let mut candidates = vec![self.resolve_path(path)];
        if Path::new(path).extension().is_none() {
            candidates.push(self.resolve_path(&format!("{path}.tex")));
        }
        for candidate in candidates {
            let bytes = match self.file_system.read_bytes(&candidate) {
                Ok(bytes) => bytes,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => {
                    return Err(self.error(Tag::Io, vec![path.to_string(), err.to_string()]))
                }
            };
            tracing::debug!(path = %candidate.display(), charset = charset.name(), "read file");
            return match charset.decode(bytes) {
                None => Err(self.error(
                    Tag::Decode,
                    vec![path.to_string(), charset.name().to_string()],
                )),
                Some(source_code) => Ok(Some(source_code)),
            };
        }
        Ok(None)
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.working_directory {
            Some(working_directory) if path.is_relative() => working_directory.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// A bounded input stream over a single file.
///
/// Reading from the stream returns the end of input when the file is exhausted,
///     rather than continuing with the input that was being read before the file was opened.
/// Files input from inside the file are read as part of the stream.
///
/// Groups that were open when the file was opened cannot be ended by the file.
///
/// When the stream is dropped, on success or on error:
/// - groups opened by the file and not closed are ended,
/// - the file is removed from the input stack,
/// - the category code overrides given when opening the file are reverted.
pub struct FileStream<'a, S> {
    session: &'a mut Session<S>,
    saved_cat_codes: Option<SavedCatCodes>,
    group_depth: usize,
    saved_group_floor: usize,
    num_sources: usize,
}

impl<'a, S> FileStream<'a, S> {
    pub(super) fn new(
        session: &'a mut Session<S>,
        name: &str,
        source_code: &str,
        overrides: &[(char, CatCode)],
    ) -> Result<FileStream<'a, S>> {
        let group_depth = session.group_depth();
        let num_sources = session.num_sources();
        session.push_boundary_source(name, source_code)?;
        let saved_cat_codes = Some(session.cat_codes_mut().apply_overrides(overrides));
        let saved_group_floor = session.replace_group_floor(group_depth);
        Ok(FileStream {
            session,
            saved_cat_codes,
            group_depth,
            saved_group_floor,
            num_sources,
        })
    }
}

impl<'a, S: SessionState> FileStream<'a, S> {
    /// Processes the whole file as regular input.
    pub fn process(&mut self) -> Result<()> {
        expansion::process(self)?;
        let depth = self.session.group_depth();
        if depth < self.group_depth {
            return Err(self.session.error(
                Tag::GroupOpenedOutsideFile,
                vec![self.group_depth.to_string()],
            ));
        }
        if depth > self.group_depth {
            return Err(self.session.error(
                Tag::UnbalancedGroups,
                vec![(depth - self.group_depth).to_string()],
            ));
        }
        Ok(())
    }

    /// Reads the whole file without expanding anything.
    ///
    /// Groups are not assembled, so braces appear as character objects.
    pub fn collect_objects(&mut self) -> Result<ObjectList> {
        let mut list = ObjectList::new();
        while let Some(object) = self.next_raw()? {
            list.push_back(object);
        }
        Ok(list)
    }
}

impl<'a, S: SessionState> Context<S> for FileStream<'a, S> {
    fn session(&self) -> &Session<S> {
        &*self.session
    }

    fn session_mut(&mut self) -> &mut Session<S> {
        self.session
    }

    fn as_dyn(&mut self) -> &mut dyn Context<S> {
        self
    }

    fn next_raw(&mut self) -> Result<Option<Object>> {
        self.session.next_live_raw()
    }

    fn peek_raw(&mut self) -> Result<Option<&Object>> {
        self.session.peek_live_raw()
    }

    fn push_front(&mut self, object: Object) {
        self.session.push_live_front(object);
    }

    fn push_list_front(&mut self, list: ObjectList) -> Result<()> {
        self.session.push_live_list_front(list)
    }

    fn read_verbatim(&mut self, end: Option<&str>) -> Result<String> {
        self.session.read_live_verbatim(end)
    }

    fn is_live(&self) -> bool {
        true
    }
}

impl<'a, S> Drop for FileStream<'a, S> {
    fn drop(&mut self) {
        self.session.replace_group_floor(self.saved_group_floor);
        while self.session.group_depth() > self.group_depth {
            if self.session.end_group().is_err() {
                break;
            }
        }
        self.session.truncate_sources(self.num_sources);
        if let Some(saved) = self.saved_cat_codes.take() {
            self.session.cat_codes_mut().restore(saved);
        }
        tracing::debug!("closed bounded source");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct InMemoryFileSystem {
        files: HashMap<PathBuf, Vec<u8>>,
    }

    impl FileSystem for InMemoryFileSystem {
        fn read_bytes(&self, path: &Path) -> std::io::Result<Vec<u8>> {
            match self.files.get(path) {
                None => Err(std::io::Error::new(std::io::ErrorKind::NotFound, "not found")),
                Some(bytes) => Ok(bytes.clone()),
            }
        }
    }

    fn new_session(files: Vec<(&str, &[u8])>) -> Box<Session<()>> {
        let mut session = Session::<()>::new(HashMap::new());
        session.working_directory = Some("/work".into());
        let mut file_system: InMemoryFileSystem = Default::default();
        for (name, contents) in files {
            file_system
                .files
                .insert(Path::new("/work").join(name), contents.to_vec());
        }
        session.file_system = Box::new(file_system);
        session
    }

    #[test]
    fn read_with_implicit_extension() {
        let session = new_session(vec![("a.tex", b"x")]);
        assert_eq!(
            session.read_source_file("a", Charset::Utf8).unwrap(),
            Some("x".to_string())
        );
        assert_eq!(session.read_source_file("b", Charset::Utf8).unwrap(), None);
    }

    #[test]
    fn charsets() {
        let session = new_session(vec![("a.tex", b"caf\xe9")]);
        assert_eq!(
            session.read_source_file("a.tex", Charset::Latin1).unwrap(),
            Some("café".to_string())
        );
        let err = session
            .read_source_file("a.tex", Charset::Utf8)
            .unwrap_err();
        assert_eq!(err.tag, Tag::Decode);
        let err = session
            .read_source_file("a.tex", Charset::Ascii)
            .unwrap_err();
        assert_eq!(err.tag, Tag::Decode);
    }

    #[test]
    fn utf8_byte_order_mark_is_dropped() {
        assert_eq!(
            Charset::Utf8.decode(b"\xef\xbb\xbfa".to_vec()),
            Some("a".to_string())
        );
    }

    #[test]
    fn file_stream_is_bounded() {
        let mut session = new_session(vec![("aux.tex", b"a\\b@c")]);
        session.push_source("main.tex", "after").unwrap();
        {
            let mut stream = session
                .open_and_tokenize("aux.tex", Charset::Utf8, &[('@', CatCode::Letter)])
                .unwrap();
            let objects = stream.collect_objects().unwrap();
            assert_eq!(
                objects,
                vec![Object::letter('a'), Object::control_sequence("b@c")].into()
            );
        }
        assert_eq!(session.cat_codes().classify('@'), CatCode::Other);
        let mut ctx = crate::context::LiveContext::new(&mut session);
        assert_eq!(ctx.next_raw().unwrap(), Some(Object::letter('a')));
    }

    #[test]
    fn file_stream_cleans_up_after_errors() {
        let mut session = new_session(vec![("aux.tex", b"{a\\undefined b")]);
        {
            let mut stream = session
                .open_and_tokenize("aux.tex", Charset::Utf8, &[('@', CatCode::Letter)])
                .unwrap();
            let err = stream.process().unwrap_err();
            assert_eq!(err.tag, Tag::UndefinedControlSequence);
        }
        assert_eq!(session.group_depth(), 0);
        assert_eq!(session.cat_codes().classify('@'), CatCode::Other);
        assert_eq!(session.output(), "a");
        session.run().unwrap();
        assert_eq!(session.output(), "a");
    }

    #[test]
    fn file_cannot_end_group_opened_before_it() {
        let mut session = new_session(vec![("aux.tex", b"a}b")]);
        session.start_group();
        {
            let mut stream = session
                .open_and_tokenize("aux.tex", Charset::Utf8, &[])
                .unwrap();
            let err = stream.process().unwrap_err();
            assert_eq!(err.tag, Tag::GroupOpenedOutsideFile);
        }
        assert_eq!(session.group_depth(), 1);
        assert_eq!(session.output(), "a");
        session.end_group().unwrap();
    }

    #[test]
    fn file_can_open_and_end_its_own_groups() {
        let mut session = new_session(vec![("aux.tex", b"{a}b")]);
        session.start_group();
        {
            let mut stream = session
                .open_and_tokenize("aux.tex", Charset::Utf8, &[])
                .unwrap();
            stream.process().unwrap();
        }
        assert_eq!(session.group_depth(), 1);
        assert_eq!(session.output(), "ab");
        session.end_group().unwrap();
        assert_eq!(session.group_depth(), 0);
    }

    #[test]
    fn missing_file() {
        let mut session = new_session(vec![]);
        let err = session
            .open_and_tokenize("aux.tex", Charset::Utf8, &[])
            .err()
            .unwrap();
        assert_eq!(err.tag, Tag::Io);
        assert!(!session.push_file_source("aux.tex", Charset::Utf8).unwrap());
    }
}
