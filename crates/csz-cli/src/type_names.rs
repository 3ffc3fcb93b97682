//! Type names as fixture files spell them: `int`, `List<int>`, `int[,]`,
//! `string?`, `App.Bag<T>`, `Lock.Scope`.
//!
//! Keywords and type parameters in scope win, then declared types, then the
//! core library's well-known types by short or namespace-qualified name.

use csz_solver::class_hierarchy::is_value_type;
use csz_solver::types::IntrinsicKind;
use csz_solver::{DefId, TypeDatabase, TypeId, WellKnownType};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeNameError {
    #[error("unexpected {found} at offset {offset} in type name '{text}'")]
    Unexpected {
        text: String,
        offset: usize,
        found: String,
    },
    #[error("unknown type '{name}' with {arity} type argument(s)")]
    Unknown { name: String, arity: usize },
    #[error("type '{0}' is declared twice")]
    Duplicate(String),
}

/// Declared types by dotted name and generic arity.
#[derive(Debug, Default)]
pub struct TypeNames {
    defs: FxHashMap<(String, usize), DefId>,
}

impl TypeNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, arity: usize, def: DefId) -> Result<(), TypeNameError> {
        match self.defs.entry((name.to_string(), arity)) {
            Entry::Occupied(_) => Err(TypeNameError::Duplicate(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(def);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str, arity: usize) -> Option<DefId> {
        self.defs.get(&(name.to_string(), arity)).copied()
    }
}

pub struct TypeResolver<'a> {
    db: &'a dyn TypeDatabase,
    names: &'a TypeNames,
    params: FxHashMap<String, TypeId>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(db: &'a dyn TypeDatabase, names: &'a TypeNames) -> Self {
        Self {
            db,
            names,
            params: FxHashMap::default(),
        }
    }

    /// Bring type parameters into scope.
    pub fn with_params(mut self, params: impl IntoIterator<Item = (String, TypeId)>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn resolve(&self, text: &str) -> Result<TypeId, TypeNameError> {
        let mut cursor = Cursor { text, pos: 0 };
        let ty = self.parse_type(&mut cursor)?;
        cursor.skip_ws();
        if cursor.pos < text.len() {
            return Err(cursor.unexpected());
        }
        Ok(ty)
    }

    fn parse_type(&self, cursor: &mut Cursor<'_>) -> Result<TypeId, TypeNameError> {
        let name = cursor.dotted_name()?;
        let mut args = Vec::new();
        if cursor.eat('<') {
            loop {
                args.push(self.parse_type(cursor)?);
                if !cursor.eat(',') {
                    break;
                }
            }
            cursor.expect('>')?;
        }

        let mut ty = self.named(&name, &args)?;
        loop {
            if cursor.eat('[') {
                let mut rank = 1u8;
                while cursor.eat(',') {
                    rank += 1;
                }
                cursor.expect(']')?;
                ty = self.db.array(ty, rank);
            } else if cursor.eat('?') {
                ty = if is_value_type(self.db, ty) {
                    self.db.nullable(ty)
                } else {
                    self.db.nullable_ref(ty)
                };
            } else {
                return Ok(ty);
            }
        }
    }

    fn named(&self, name: &str, args: &[TypeId]) -> Result<TypeId, TypeNameError> {
        if args.is_empty() {
            if let Some(kind) = IntrinsicKind::from_keyword(name) {
                return Ok(kind.type_id());
            }
            if let Some(&ty) = self.params.get(name) {
                return Ok(ty);
            }
        }
        if let Some(def) = self.names.get(name, args.len()) {
            return Ok(self.db.named(def, args));
        }
        WellKnownType::ALL
            .into_iter()
            .find(|&tag| matches_well_known(tag, name, args.len()))
            .and_then(|tag| self.db.well_known_type(tag, args))
            .ok_or_else(|| TypeNameError::Unknown {
                name: name.to_string(),
                arity: args.len(),
            })
    }
}

/// `List`, `System.Collections.Generic.List` and `Lock.Scope` all name
/// their well-known type.
fn matches_well_known(tag: WellKnownType, name: &str, arity: usize) -> bool {
    let (namespace, metadata_name, expected_arity) = tag.metadata_name();
    if arity != expected_arity {
        return false;
    }
    let short = metadata_name.replace('+', ".");
    name == short
        || name
            .strip_prefix(namespace)
            .and_then(|rest| rest.strip_prefix('.'))
            == Some(short.as_str())
}

struct Cursor<'t> {
    text: &'t str,
    pos: usize,
}

impl<'t> Cursor<'t> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), TypeNameError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn ident(&mut self) -> Result<&'t str, TypeNameError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            self.pos += c.len_utf8();
        }
        if start == self.pos {
            return Err(self.unexpected());
        }
        Ok(&self.text[start..self.pos])
    }

    fn dotted_name(&mut self) -> Result<String, TypeNameError> {
        let mut name = self.ident()?.to_string();
        while self.eat('.') {
            name.push('.');
            name.push_str(self.ident()?);
        }
        Ok(name)
    }

    fn unexpected(&self) -> TypeNameError {
        let found = match self.peek() {
            Some(c) => format!("'{c}'"),
            None => "end of input".to_string(),
        };
        TypeNameError::Unexpected {
            text: self.text.to_string(),
            offset: self.pos,
            found,
        }
    }
}

#[cfg(test)]
#[path = "../tests/type_names_tests.rs"]
mod tests;
