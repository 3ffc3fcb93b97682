//! Compiler-required library members.
//!
//! The planner and the lock binder call a handful of library members by
//! identity (`Span<T>..ctor(T[])`, `List<T>.Add(T)`, `Monitor.Enter`, ...).
//! They are located by name and signature shape on the well-known
//! definition; a library that lacks one produces CS0656 at the use site.

use crate::db::TypeDatabase;
use crate::def::WellKnownType;
use crate::types::{MethodId, MethodInfo, MethodKind, TypeData, TypeId};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum WellKnownMember {
    /// `Span<T>..ctor(T[])`
    SpanCtorArray,
    /// `ReadOnlySpan<T>..ctor(T[])`
    ReadOnlySpanCtorArray,
    /// `List<T>..ctor()`
    ListCtor,
    /// `List<T>.Add(T)`
    ListAdd,
    /// `List<T>.AddRange(IEnumerable<T>)`
    ListAddRange,
    /// `Lock.EnterScope()`
    LockEnterScope,
    /// `Lock.Scope.Dispose()`
    LockScopeDispose,
    /// `Monitor.Enter(object, ref bool)`
    MonitorEnter,
    /// `Monitor.Exit(object)`
    MonitorExit,
}

impl WellKnownMember {
    pub const ALL: [WellKnownMember; 9] = [
        WellKnownMember::SpanCtorArray,
        WellKnownMember::ReadOnlySpanCtorArray,
        WellKnownMember::ListCtor,
        WellKnownMember::ListAdd,
        WellKnownMember::ListAddRange,
        WellKnownMember::LockEnterScope,
        WellKnownMember::LockScopeDispose,
        WellKnownMember::MonitorEnter,
        WellKnownMember::MonitorExit,
    ];

    pub const fn container(self) -> WellKnownType {
        match self {
            WellKnownMember::SpanCtorArray => WellKnownType::SpanT,
            WellKnownMember::ReadOnlySpanCtorArray => WellKnownType::ReadOnlySpanT,
            WellKnownMember::ListCtor | WellKnownMember::ListAdd | WellKnownMember::ListAddRange => {
                WellKnownType::ListT
            }
            WellKnownMember::LockEnterScope => WellKnownType::Lock,
            WellKnownMember::LockScopeDispose => WellKnownType::LockScope,
            WellKnownMember::MonitorEnter | WellKnownMember::MonitorExit => WellKnownType::Monitor,
        }
    }

    pub const fn member_name(self) -> &'static str {
        match self {
            WellKnownMember::SpanCtorArray
            | WellKnownMember::ReadOnlySpanCtorArray
            | WellKnownMember::ListCtor => ".ctor",
            WellKnownMember::ListAdd => "Add",
            WellKnownMember::ListAddRange => "AddRange",
            WellKnownMember::LockEnterScope => "EnterScope",
            WellKnownMember::LockScopeDispose => "Dispose",
            WellKnownMember::MonitorEnter => "Enter",
            WellKnownMember::MonitorExit => "Exit",
        }
    }

    /// Container name as it appears in CS0656 (`System.Span`1`, `System.Threading.Lock+Scope`).
    pub fn container_display(self) -> String {
        let (ns, name, arity) = self.container().metadata_name();
        if arity == 0 {
            format!("{ns}.{name}")
        } else {
            format!("{ns}.{name}`{arity}")
        }
    }

    pub fn display(self) -> String {
        format!("{}.{}", self.container_display(), self.member_name())
    }
}

/// Locate a compiler-required member on its well-known definition.
pub fn lookup_member(db: &dyn TypeDatabase, member: WellKnownMember) -> Option<MethodId> {
    let def = db.defs().well_known(member.container())?;
    let type_params = db.defs().get_type_params(def);
    let own_param = type_params.first().map(|&tp| db.type_param_type(tp));
    let name = db.atoms().get(member.member_name())?;

    db.defs().get_methods(def).into_iter().find(|&id| {
        let Some(method) = db.defs().method(id) else {
            return false;
        };
        method.name == name && matches_shape(db, member, &method, own_param)
    })
}

fn matches_shape(
    db: &dyn TypeDatabase,
    member: WellKnownMember,
    method: &MethodInfo,
    own_param: Option<TypeId>,
) -> bool {
    let param_types: Vec<TypeId> = method.params.iter().map(|p| p.ty).collect();
    match member {
        WellKnownMember::SpanCtorArray | WellKnownMember::ReadOnlySpanCtorArray => {
            let Some(t) = own_param else {
                return false;
            };
            method.kind == MethodKind::Constructor
                && param_types.len() == 1
                && db.lookup(param_types[0]) == Some(TypeData::Array { element: t, rank: 1 })
        }
        WellKnownMember::ListCtor => {
            method.kind == MethodKind::Constructor && method.required_param_count() == 0
        }
        WellKnownMember::ListAdd => match own_param {
            Some(t) => !method.is_static() && param_types == [t],
            None => false,
        },
        WellKnownMember::ListAddRange => {
            let Some(t) = own_param else {
                return false;
            };
            let expected = db.well_known_type(WellKnownType::IEnumerableT, &[t]);
            !method.is_static() && param_types.len() == 1 && Some(param_types[0]) == expected
        }
        WellKnownMember::LockEnterScope => {
            !method.is_static() && method.params.is_empty() && method.type_params.is_empty()
        }
        WellKnownMember::LockScopeDispose => {
            !method.is_static() && method.params.is_empty() && method.return_type == TypeId::VOID
        }
        WellKnownMember::MonitorEnter => {
            method.is_static()
                && method.params.len() == 2
                && method.params[0].ty == TypeId::OBJECT
                && method.params[1].ty == TypeId::BOOL
                && method.params[1].by_ref
        }
        WellKnownMember::MonitorExit => {
            method.is_static() && param_types == [TypeId::OBJECT]
        }
    }
}

#[cfg(test)]
#[path = "../tests/well_known_tests.rs"]
mod tests;
