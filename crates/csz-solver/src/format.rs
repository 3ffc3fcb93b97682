//! Type and member display.
//!
//! Only tooling calls this: diagnostics carry `TypeId`s and `MethodId`s and
//! are turned into text when rendered.

use crate::class_hierarchy::ResolvedMethod;
use crate::db::TypeDatabase;
use crate::def::DefId;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::types::{MethodId, MethodKind, TypeData, TypeId};
use std::fmt::Write;

pub struct TypeFormatter<'a> {
    db: &'a dyn TypeDatabase,
    /// Prefix definitions with their namespace.
    qualified: bool,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        Self {
            db,
            qualified: false,
        }
    }

    pub fn qualified(mut self) -> Self {
        self.qualified = true;
        self
    }

    pub fn format(&self, ty: TypeId) -> String {
        let mut out = String::new();
        let mut depth = DepthCounter::with_profile(RecursionProfile::Instantiation);
        self.write_type(&mut out, ty, &mut depth);
        out
    }

    /// `Outer.Inner`, optionally namespace-qualified.
    pub fn format_def(&self, def: DefId) -> String {
        let defs = self.db.defs();
        let mut names = Vec::new();
        let mut current = Some(def);
        while let Some(d) = current {
            let Some(info) = defs.get(d) else {
                break;
            };
            names.push(self.db.resolve_atom(info.name));
            current = info.containing;
            if names.len() as u32 > RecursionProfile::BaseChain.max_depth() {
                break;
            }
        }
        names.reverse();
        let mut out = String::new();
        if self.qualified {
            if let Some(info) = defs.get(def) {
                let namespace = self.db.resolve_atom(info.namespace);
                if !namespace.is_empty() {
                    out.push_str(&namespace);
                    out.push('.');
                }
            }
        }
        for (index, name) in names.iter().enumerate() {
            if index > 0 {
                out.push('.');
            }
            out.push_str(name);
        }
        out
    }

    /// `List<int>.Add(int)`
    pub fn format_method(&self, method: &ResolvedMethod) -> String {
        let mut out = self.format(method.declaring_type);
        out.push('.');
        let name = self.db.resolve_atom(method.name);
        match self.db.defs().method(method.id).map(|info| info.kind) {
            Some(MethodKind::Constructor) => {
                let short = self
                    .db
                    .def_of(method.declaring_type)
                    .and_then(|d| self.db.defs().get_name(d))
                    .map(|a| self.db.resolve_atom(a));
                out.push_str(short.as_deref().unwrap_or(&*name));
            }
            _ => out.push_str(&name),
        }
        if !method.type_args.is_empty() {
            out.push('<');
            self.write_list(&mut out, &method.type_args);
            out.push('>');
        }
        out.push('(');
        for (index, param) in method.params.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            if index == 0 && method.is_extension {
                out.push_str("this ");
            }
            if param.by_ref {
                out.push_str("ref ");
            }
            out.push_str(&self.format(param.ty));
        }
        out.push(')');
        out
    }

    /// Format a method by id, seen through its declaring definition.
    pub fn format_method_id(&self, id: MethodId) -> String {
        let Some(info) = self.db.defs().method(id) else {
            return format!("<method {}>", id.0);
        };
        let declaring_args: Vec<TypeId> = self
            .db
            .defs()
            .get_type_params(info.declaring)
            .into_iter()
            .map(|tp| self.db.type_param_type(tp))
            .collect();
        let declaring = self.db.named(info.declaring, &declaring_args);
        match ResolvedMethod::new(self.db, id, declaring, 0) {
            Some(method) => self.format_method(&method),
            None => format!("<method {}>", id.0),
        }
    }

    fn write_list(&self, out: &mut String, types: &[TypeId]) {
        let mut depth = DepthCounter::with_profile(RecursionProfile::Instantiation);
        for (index, &ty) in types.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            self.write_type(out, ty, &mut depth);
        }
    }

    fn write_type(&self, out: &mut String, ty: TypeId, depth: &mut DepthCounter) {
        let Some(data) = self.db.lookup(ty) else {
            let _ = write!(out, "<type {}>", ty.0);
            return;
        };
        if !depth.enter() {
            out.push_str("...");
            return;
        }
        match data {
            TypeData::Intrinsic(kind) => out.push_str(kind.keyword()),
            TypeData::Named { def, args } => {
                out.push_str(&self.format_def(def));
                if !args.is_empty() {
                    out.push('<');
                    for (index, &arg) in args.iter().enumerate() {
                        if index > 0 {
                            out.push_str(", ");
                        }
                        self.write_type(out, arg, depth);
                    }
                    out.push('>');
                }
            }
            TypeData::Array { element, rank } => {
                self.write_type(out, element, depth);
                out.push('[');
                for _ in 1..rank {
                    out.push(',');
                }
                out.push(']');
            }
            TypeData::Pointer(inner) => {
                self.write_type(out, inner, depth);
                out.push('*');
            }
            TypeData::Nullable(inner) | TypeData::NullableRef(inner) => {
                self.write_type(out, inner, depth);
                out.push('?');
            }
            TypeData::FunctionPointer { params, ret } => {
                out.push_str("delegate*<");
                for &param in params.iter() {
                    self.write_type(out, param, depth);
                    out.push_str(", ");
                }
                self.write_type(out, ret, depth);
                out.push('>');
            }
            TypeData::TypeParameter(param) => match self.db.defs().type_param(param) {
                Some(info) => out.push_str(&self.db.resolve_atom(info.name)),
                None => {
                    let _ = write!(out, "T{}", param.0);
                }
            },
        }
        depth.leave();
    }
}

#[cfg(test)]
#[path = "../tests/format_tests.rs"]
mod tests;
