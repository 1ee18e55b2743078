//! Map type
use super::*;
use crate::error::{Error, Tag};
use crate::token::CsName;
use std::collections::HashMap;
use texparser_stdext::collections::groupingmap::{GroupingMap, NoGroupToEndError, Scope};

/// Map is a scoped map where the keys are command references and the values are bindings.
///
/// Control sequences and active characters share the map.
/// Local assignments are rolled back at the end of the group they are made in;
///     global assignments survive all groups.
pub struct Map<S> {
    bindings: GroupingMap<CommandRef, Rc<Binding<S>>>,
    built_in_commands: HashMap<CsName, BuiltIn<S>>,
}

impl<S> Map<S> {
    pub(crate) fn new(built_in_commands: HashMap<CsName, BuiltIn<S>>) -> Map<S> {
        Self {
            bindings: built_in_commands
                .iter()
                .map(|(name, built_in)| {
                    let command_ref = CommandRef::ControlSequence(name.clone());
                    let binding = Binding {
                        name: command_ref.clone(),
                        command: built_in.cmd.clone(),
                        doc: built_in.doc,
                        tag: built_in.tag,
                    };
                    (command_ref, Rc::new(binding))
                })
                .collect(),
            built_in_commands,
        }
    }

    /// Returns the binding currently visible for the command reference.
    #[inline]
    pub fn lookup(&self, command_ref: &CommandRef) -> Option<&Rc<Binding<S>>> {
        self.bindings.get(command_ref)
    }

    /// Binds the command to the name in the provided scope.
    pub fn assign(&mut self, name: CommandRef, command: Command<S>, scope: Scope) {
        let binding = Binding {
            name: name.clone(),
            command,
            doc: None,
            tag: None,
        };
        self.assign_binding(name, Rc::new(binding), scope);
    }

    /// Binds an existing binding to a name, as `\let` does.
    pub fn assign_binding(&mut self, name: CommandRef, binding: Rc<Binding<S>>, scope: Scope) {
        tracing::trace!(name = %name, ?scope, "assigning command");
        self.bindings.insert(name, binding, scope);
    }

    /// Makes the name undefined in the provided scope.
    pub fn unassign(&mut self, name: &CommandRef, scope: Scope) {
        self.bindings.remove(name, scope);
    }

    /// Decides whether a definition of the name should go ahead under the provided policy.
    ///
    /// Returns an [AlreadyDefined](Tag::AlreadyDefined) error for [Overwrite::Forbid]
    ///     and `false` for [Overwrite::Skip] if the name is bound.
    pub fn check_overwrite(
        &self,
        name: &CommandRef,
        policy: Overwrite,
    ) -> std::result::Result<bool, Box<Error>> {
        if !self.bindings.contains_key(name) {
            return Ok(true);
        }
        match policy {
            Overwrite::Forbid => Err(Error::new(Tag::AlreadyDefined, [name]).into()),
            Overwrite::Force => Ok(true),
            Overwrite::Skip => Ok(false),
        }
    }

    pub fn built_in_commands(&self) -> &HashMap<CsName, BuiltIn<S>> {
        &self.built_in_commands
    }

    /// Names of all currently defined control sequences, in no particular order.
    pub fn control_sequence_names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().filter_map(|command_ref| match command_ref {
            CommandRef::ControlSequence(name) => Some(name.as_str()),
            CommandRef::ActiveCharacter(_) => None,
        })
    }

    pub(crate) fn start_group(&mut self) {
        self.bindings.begin_group();
    }

    pub(crate) fn end_group(&mut self) -> std::result::Result<(), NoGroupToEndError> {
        self.bindings.end_group()
    }

    /// Number of open groups.
    pub fn depth(&self) -> usize {
        self.bindings.depth()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alias(c: char) -> Command<()> {
        Command::Alias(Object::letter(c))
    }

    fn aliased_char(map: &Map<()>, name: &CommandRef) -> Option<char> {
        match &map.lookup(name)?.command {
            Command::Alias(object) => object.char(),
            _ => None,
        }
    }

    #[test]
    fn local_binding_is_restored() {
        let mut map: Map<()> = Map::new(HashMap::new());
        let foo = CommandRef::control_sequence("foo");
        map.assign(foo.clone(), alias('a'), Scope::Local);
        map.start_group();
        map.assign(foo.clone(), alias('b'), Scope::Local);
        assert_eq!(aliased_char(&map, &foo), Some('b'));
        map.end_group().unwrap();
        assert_eq!(aliased_char(&map, &foo), Some('a'));
    }

    #[test]
    fn global_binding_survives_nested_groups() {
        let mut map: Map<()> = Map::new(HashMap::new());
        let foo = CommandRef::control_sequence("foo");
        map.assign(foo.clone(), alias('a'), Scope::Local);
        map.start_group();
        map.start_group();
        map.assign(foo.clone(), alias('b'), Scope::Global);
        map.end_group().unwrap();
        map.end_group().unwrap();
        assert_eq!(aliased_char(&map, &foo), Some('b'));
    }

    #[test]
    fn active_characters_share_the_map() {
        let mut map: Map<()> = Map::new(HashMap::new());
        let tilde = CommandRef::ActiveCharacter('~');
        map.assign(tilde.clone(), alias('x'), Scope::Local);
        assert_eq!(aliased_char(&map, &tilde), Some('x'));
        assert_eq!(map.control_sequence_names().count(), 0);
    }

    #[test]
    fn captured_binding_survives_redefinition() {
        let mut map: Map<()> = Map::new(HashMap::new());
        let foo = CommandRef::control_sequence("foo");
        map.assign(foo.clone(), alias('a'), Scope::Local);
        let captured = map.lookup(&foo).cloned().unwrap();
        map.assign(foo.clone(), alias('b'), Scope::Local);
        assert!(matches!(&captured.command, Command::Alias(o) if o.char() == Some('a')));
    }

    #[test]
    fn overwrite_policies() {
        let mut map: Map<()> = Map::new(HashMap::new());
        let foo = CommandRef::control_sequence("foo");
        assert_eq!(map.check_overwrite(&foo, Overwrite::Forbid), Ok(true));
        map.assign(foo.clone(), alias('a'), Scope::Local);
        let err = map.check_overwrite(&foo, Overwrite::Forbid).unwrap_err();
        assert_eq!(err.tag, Tag::AlreadyDefined);
        assert_eq!(err.params, vec!["\\foo".to_string()]);
        assert_eq!(map.check_overwrite(&foo, Overwrite::Force), Ok(true));
        assert_eq!(map.check_overwrite(&foo, Overwrite::Skip), Ok(false));
    }

    #[test]
    fn unassign_locally() {
        let mut map: Map<()> = Map::new(HashMap::new());
        let foo = CommandRef::control_sequence("foo");
        map.assign(foo.clone(), alias('a'), Scope::Local);
        map.start_group();
        map.unassign(&foo, Scope::Local);
        assert!(map.lookup(&foo).is_none());
        map.end_group().unwrap();
        assert!(map.lookup(&foo).is_some());
    }
}
