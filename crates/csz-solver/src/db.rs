//! The type database seam.
//!
//! Analysis code talks to `&dyn TypeDatabase`; `TypeStore` is the in-memory
//! implementation that library loaders (the core library builder, fixture
//! files, tests) populate through the declaration builders below.

use crate::def::{
    CollectionBuilderAttr, DefFlags, DefId, DefKind, DefinitionInfo, DefinitionStore, WellKnownType,
};
use crate::intern::TypeInterner;
use crate::types::{
    Accessibility, MethodFlags, MethodId, MethodInfo, MethodKind, ParamInfo, ParamKind,
    PropertyId, PropertyInfo, TypeArgs, TypeData, TypeId, TypeParamConstraints, TypeParamId,
    TypeParamInfo, TypeParamOwner,
};
use csz_common::interner::{Atom, ShardedInterner};
use csz_common::language::Feature;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

/// Read access to types and definitions, plus interning of new types.
pub trait TypeDatabase: Send + Sync {
    fn atoms(&self) -> &ShardedInterner;
    fn interner(&self) -> &TypeInterner;
    fn defs(&self) -> &DefinitionStore;

    fn intern(&self, data: TypeData) -> TypeId {
        self.interner().intern(data)
    }

    fn lookup(&self, id: TypeId) -> Option<TypeData> {
        self.interner().lookup(id)
    }

    fn atom(&self, text: &str) -> Atom {
        self.atoms().intern(text)
    }

    fn resolve_atom(&self, atom: Atom) -> Arc<str> {
        self.atoms().resolve(atom)
    }

    fn named(&self, def: DefId, args: &[TypeId]) -> TypeId {
        self.intern(TypeData::Named {
            def,
            args: SmallVec::from_slice(args),
        })
    }

    fn array(&self, element: TypeId, rank: u8) -> TypeId {
        self.intern(TypeData::Array { element, rank })
    }

    fn pointer(&self, pointee: TypeId) -> TypeId {
        self.intern(TypeData::Pointer(pointee))
    }

    fn nullable(&self, underlying: TypeId) -> TypeId {
        self.intern(TypeData::Nullable(underlying))
    }

    fn nullable_ref(&self, underlying: TypeId) -> TypeId {
        self.intern(TypeData::NullableRef(underlying))
    }

    fn type_param_type(&self, param: TypeParamId) -> TypeId {
        self.intern(TypeData::TypeParameter(param))
    }

    fn function_pointer(&self, params: &[TypeId], ret: TypeId) -> TypeId {
        self.intern(TypeData::FunctionPointer {
            params: TypeArgs::from_slice(params),
            ret,
        })
    }

    /// `Named` type for a well-known definition, when the library defines it.
    fn well_known_type(&self, tag: WellKnownType, args: &[TypeId]) -> Option<TypeId> {
        let def = self.defs().well_known(tag)?;
        Some(self.named(def, args))
    }

    /// The definition behind a `Named` type.
    fn def_of(&self, ty: TypeId) -> Option<DefId> {
        match self.lookup(ty)? {
            TypeData::Named { def, .. } => Some(def),
            _ => None,
        }
    }

    /// Well-known tag and type arguments of a `Named` type.
    fn well_known_of(&self, ty: TypeId) -> Option<(WellKnownType, TypeArgs)> {
        match self.lookup(ty)? {
            TypeData::Named { def, args } => {
                let tag = self.defs().get_well_known_tag(def)?;
                Some((tag, args))
            }
            _ => None,
        }
    }
}

// =============================================================================
// TypeStore
// =============================================================================

/// In-memory type database shared by every body of one compilation.
pub struct TypeStore {
    atoms: ShardedInterner,
    interner: TypeInterner,
    defs: DefinitionStore,
}

impl TypeDatabase for TypeStore {
    fn atoms(&self) -> &ShardedInterner {
        &self.atoms
    }

    fn interner(&self) -> &TypeInterner {
        &self.interner
    }

    fn defs(&self) -> &DefinitionStore {
        &self.defs
    }
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeStore {
    pub fn new() -> Self {
        let atoms = ShardedInterner::new();
        atoms.intern_common();
        Self {
            atoms,
            interner: TypeInterner::new(),
            defs: DefinitionStore::new(),
        }
    }

    /// Register a type declaration.
    ///
    /// Type parameters are allocated here so member signatures can refer to
    /// them through `type_params_of`. Declarations whose metadata name matches
    /// a well-known type are tagged automatically, so a library that defines
    /// `System.Collections.Generic.List<T>` itself is recognized.
    pub fn declare(&self, decl: TypeDecl) -> DefId {
        let containing_name = decl
            .containing
            .and_then(|c| self.defs.get_name(c))
            .map(|a| self.atoms.resolve(a));
        let metadata_name = match &containing_name {
            Some(outer) => format!("{outer}+{}", decl.name),
            None => decl.name.clone(),
        };
        let namespace = match decl.containing {
            Some(outer) => self
                .defs
                .get(outer)
                .map(|info| info.namespace)
                .unwrap_or(Atom::NONE),
            None => self.atoms.intern(&decl.namespace),
        };
        let namespace_text = self.atoms.resolve(namespace);
        let well_known = WellKnownType::from_metadata_name(
            &namespace_text,
            &metadata_name,
            decl.type_params.len(),
        );

        let mut info = DefinitionInfo::new(
            decl.kind,
            namespace,
            self.atoms.intern(&decl.name),
            self.atoms.intern(&decl.assembly),
        );
        info.accessibility = decl.accessibility;
        info.flags = decl.flags;
        info.containing = decl.containing;
        info.well_known = well_known;
        let def = self.defs.register(info);

        let params: Vec<TypeParamId> = decl
            .type_params
            .iter()
            .enumerate()
            .map(|(index, name)| {
                self.defs.add_type_param(TypeParamInfo {
                    name: self.atoms.intern(name),
                    owner: TypeParamOwner::Type(def),
                    index: index as u32,
                    constraints: TypeParamConstraints::default(),
                })
            })
            .collect();
        self.defs.set_type_params(def, params);
        debug!(
            def = def.0,
            name = %metadata_name,
            well_known = ?well_known,
            "declared type"
        );
        def
    }

    /// Type parameters of a declaration, as types usable in signatures.
    pub fn type_params_of(&self, def: DefId) -> Vec<TypeId> {
        self.defs
            .get_type_params(def)
            .into_iter()
            .map(|tp| self.type_param_type(tp))
            .collect()
    }

    /// The declaration applied to its own type parameters (`List<T>` inside `List<T>`).
    pub fn self_type(&self, def: DefId) -> TypeId {
        let args = self.type_params_of(def);
        self.named(def, &args)
    }

    /// Allocate a method type parameter before its method exists.
    pub fn method_type_param(&self, name: &str, index: u32) -> (TypeParamId, TypeId) {
        let id = self.defs.add_type_param(TypeParamInfo {
            name: self.atoms.intern(name),
            owner: TypeParamOwner::Pending,
            index,
            constraints: TypeParamConstraints::default(),
        });
        (id, self.type_param_type(id))
    }

    pub fn set_constraints(&self, param: TypeId, constraints: TypeParamConstraints) {
        if let Some(TypeData::TypeParameter(id)) = self.lookup(param) {
            self.defs.set_constraints(id, constraints);
        }
    }

    pub fn set_base(&self, def: DefId, base: TypeId) {
        self.defs.set_base(def, base);
    }

    pub fn add_interface(&self, def: DefId, interface: TypeId) {
        self.defs.add_interface(def, interface);
    }

    /// Attach `[CollectionBuilder(typeof(builder), method)]` to `def`.
    pub fn set_collection_builder(&self, def: DefId, builder: DefId, method: &str) {
        let method = self.atoms.intern(method);
        self.defs
            .set_collection_builder(def, CollectionBuilderAttr { builder, method });
    }

    pub fn add_method(&self, def: DefId, decl: MethodDecl) -> MethodId {
        let params = decl
            .params
            .into_iter()
            .map(|(name, ty, kind, by_ref)| ParamInfo {
                name: self.atoms.intern(&name),
                ty,
                kind,
                by_ref,
            })
            .collect();
        self.defs.add_method(MethodInfo {
            name: self.atoms.intern(&decl.name),
            declaring: def,
            kind: decl.kind,
            accessibility: decl.accessibility,
            flags: decl.flags,
            type_params: decl.type_params,
            params,
            return_type: decl.return_type,
            explicit_interface: decl.explicit_interface,
            conditional: decl.conditional.as_deref().map(|s| self.atoms.intern(s)),
            required_feature: decl.required_feature,
        })
    }

    pub fn add_property(&self, def: DefId, decl: PropertyDecl) -> PropertyId {
        self.defs.add_property(PropertyInfo {
            name: self.atoms.intern(&decl.name),
            declaring: def,
            ty: decl.ty,
            accessibility: decl.accessibility,
            is_static: decl.is_static,
            has_getter: decl.has_getter,
            is_new: decl.is_new,
        })
    }
}

// =============================================================================
// Declaration builders
// =============================================================================

/// Builder for a type declaration registered through `TypeStore::declare`.
#[derive(Clone, Debug)]
pub struct TypeDecl {
    pub kind: DefKind,
    pub namespace: String,
    pub name: String,
    pub type_params: Vec<String>,
    pub accessibility: Accessibility,
    pub flags: DefFlags,
    pub containing: Option<DefId>,
    pub assembly: String,
}

impl TypeDecl {
    pub fn new(kind: DefKind, namespace: &str, name: &str) -> Self {
        Self {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
            type_params: Vec::new(),
            accessibility: Accessibility::Public,
            flags: DefFlags::empty(),
            containing: None,
            assembly: "System.Runtime".to_string(),
        }
    }

    pub fn class(namespace: &str, name: &str) -> Self {
        Self::new(DefKind::Class, namespace, name)
    }

    pub fn structure(namespace: &str, name: &str) -> Self {
        Self::new(DefKind::Struct, namespace, name)
    }

    pub fn ref_struct(namespace: &str, name: &str) -> Self {
        Self::new(DefKind::RefStruct, namespace, name)
    }

    pub fn interface(namespace: &str, name: &str) -> Self {
        Self::new(DefKind::Interface, namespace, name).flags(DefFlags::ABSTRACT)
    }

    pub fn type_params(mut self, names: &[&str]) -> Self {
        self.type_params = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn flags(mut self, flags: DefFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn nested_in(mut self, outer: DefId) -> Self {
        self.containing = Some(outer);
        self
    }

    pub fn assembly(mut self, assembly: &str) -> Self {
        self.assembly = assembly.to_string();
        self
    }
}

/// Builder for a method, constructor or conversion operator.
#[derive(Clone, Debug)]
pub struct MethodDecl {
    pub name: String,
    pub kind: MethodKind,
    pub accessibility: Accessibility,
    pub flags: MethodFlags,
    pub type_params: Vec<TypeParamId>,
    pub params: Vec<(String, TypeId, ParamKind, bool)>,
    pub return_type: TypeId,
    pub explicit_interface: Option<TypeId>,
    pub conditional: Option<String>,
    pub required_feature: Option<Feature>,
}

impl MethodDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: MethodKind::Ordinary,
            accessibility: Accessibility::Public,
            flags: MethodFlags::empty(),
            type_params: Vec::new(),
            params: Vec::new(),
            return_type: TypeId::VOID,
            explicit_interface: None,
            conditional: None,
            required_feature: None,
        }
    }

    pub fn constructor() -> Self {
        let mut decl = Self::new(".ctor");
        decl.kind = MethodKind::Constructor;
        decl
    }

    /// `public static implicit operator Target(Source value)` and friends.
    pub fn conversion(implicit: bool, source: TypeId, target: TypeId) -> Self {
        let mut decl = Self::new(if implicit { "op_Implicit" } else { "op_Explicit" });
        decl.kind = MethodKind::Conversion { implicit };
        decl.flags = MethodFlags::STATIC;
        decl.params.push(("value".to_string(), source, ParamKind::Normal, false));
        decl.return_type = target;
        decl
    }

    pub fn param(mut self, name: &str, ty: TypeId) -> Self {
        self.params.push((name.to_string(), ty, ParamKind::Normal, false));
        self
    }

    pub fn optional_param(mut self, name: &str, ty: TypeId) -> Self {
        self.params.push((name.to_string(), ty, ParamKind::Optional, false));
        self
    }

    pub fn params_param(mut self, name: &str, ty: TypeId) -> Self {
        self.params.push((name.to_string(), ty, ParamKind::Params, false));
        self
    }

    pub fn ref_param(mut self, name: &str, ty: TypeId) -> Self {
        self.params.push((name.to_string(), ty, ParamKind::Normal, true));
        self
    }

    pub fn returns(mut self, ty: TypeId) -> Self {
        self.return_type = ty;
        self
    }

    pub fn flags(mut self, flags: MethodFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn generic(mut self, params: &[TypeParamId]) -> Self {
        self.type_params = params.to_vec();
        self
    }

    /// Static extension method; the first parameter is the receiver.
    pub fn extension(mut self, receiver: TypeId) -> Self {
        self.flags |= MethodFlags::STATIC | MethodFlags::EXTENSION;
        self.params
            .insert(0, ("this".to_string(), receiver, ParamKind::Normal, false));
        self
    }

    pub fn explicit_impl(mut self, interface: TypeId) -> Self {
        self.flags |= MethodFlags::EXPLICIT_INTERFACE_IMPL;
        self.accessibility = Accessibility::Private;
        self.explicit_interface = Some(interface);
        self
    }

    pub fn conditional(mut self, symbol: &str) -> Self {
        self.conditional = Some(symbol.to_string());
        self
    }

    pub fn requires(mut self, feature: Feature) -> Self {
        self.required_feature = Some(feature);
        self
    }
}

#[derive(Clone, Debug)]
pub struct PropertyDecl {
    pub name: String,
    pub ty: TypeId,
    pub accessibility: Accessibility,
    pub is_static: bool,
    pub has_getter: bool,
    pub is_new: bool,
}

impl PropertyDecl {
    pub fn new(name: &str, ty: TypeId) -> Self {
        Self {
            name: name.to_string(),
            ty,
            accessibility: Accessibility::Public,
            is_static: false,
            has_getter: true,
            is_new: false,
        }
    }

    pub fn accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.has_getter = false;
        self
    }

    pub fn static_property(mut self) -> Self {
        self.is_static = true;
        self
    }
}
