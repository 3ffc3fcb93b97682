//! JSON fixtures: type declarations plus method bodies.
//!
//! A fixture stands in for a parsed and name-resolved compilation unit. Types
//! are declared first so members and bodies may refer to any of them, in
//! any order; bodies are then lowered into checker `Body` arenas.
//!
//! ```json
//! {
//!   "options": { "languageVersion": "13" },
//!   "types": [{ "kind": "class", "name": "IntBag", "interfaces": ["IEnumerable<int>"],
//!               "methods": [{ "name": "Add", "params": [{ "type": "int" }] }] }],
//!   "bodies": [{ "name": "M", "statements": [
//!     { "local": { "name": "b", "type": "IntBag", "init": { "list": [{ "int": 1 }] } } }
//!   ] }]
//! }
//! ```

use crate::type_names::{TypeNameError, TypeNames, TypeResolver};
use csz_checker::{Body, BodyBuilder, BodyId, CollectionElement, ExprId, StmtId, StmtKind};
use csz_common::language::Feature;
use csz_common::options::AnalysisOptions;
use csz_common::span::Span;
use csz_solver::db::{MethodDecl, PropertyDecl, TypeDecl};
use csz_solver::types::{Accessibility, ConstantValue, MethodFlags, TypeParamConstraints};
use csz_solver::{
    CoreLibraryBuilder, DefFlags, DefId, DefKind, TypeDatabase, TypeId, TypeStore,
    WellKnownMember, WellKnownType,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

// =============================================================================
// File model
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Fixture {
    pub options: AnalysisOptions,
    pub core_library: CoreLibraryFixture,
    pub types: Vec<TypeFixture>,
    /// `params` parameter declarations to validate.
    pub params: Vec<ParamsFixture>,
    pub bodies: Vec<BodyFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CoreLibraryFixture {
    pub install: bool,
    /// Full names of well-known types to leave out (`System.Threading.Lock`).
    pub without: Vec<String>,
    /// Well-known members to leave out (`System.Threading.Lock.EnterScope`).
    pub without_members: Vec<String>,
}

impl Default for CoreLibraryFixture {
    fn default() -> Self {
        Self {
            install: true,
            without: Vec::new(),
            without_members: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypeFixture {
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub type_params: Vec<TypeParamFixture>,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub accessibility: Option<String>,
    /// Defaults to the analysed assembly.
    #[serde(default)]
    pub assembly: Option<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    /// Simple name of an enclosing type declared earlier in the file.
    #[serde(default)]
    pub nested_in: Option<String>,
    #[serde(default)]
    pub methods: Vec<MethodFixture>,
    #[serde(default)]
    pub properties: Vec<PropertyFixture>,
    /// `[CollectionBuilder(typeof(Builder), "Create")]`.
    #[serde(default)]
    pub collection_builder: Option<CollectionBuilderFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CollectionBuilderFixture {
    #[serde(rename = "type")]
    pub ty: String,
    pub method: String,
}

fn default_kind() -> String {
    "class".to_string()
}

fn default_namespace() -> String {
    "App".to_string()
}

/// `"T"` or `{ "name": "T", "new": true, "constraints": ["IEnumerable<int>"] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TypeParamFixture {
    Name(String),
    Constrained {
        name: String,
        #[serde(default, rename = "new")]
        constructor: bool,
        #[serde(default, rename = "class")]
        reference_type: bool,
        #[serde(default, rename = "struct")]
        value_type: bool,
        #[serde(default)]
        constraints: Vec<String>,
    },
}

impl TypeParamFixture {
    pub fn name(&self) -> &str {
        match self {
            TypeParamFixture::Name(name) | TypeParamFixture::Constrained { name, .. } => name,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    #[default]
    Method,
    Constructor,
    /// `implicit operator`: source is the single parameter, target the return type.
    Implicit,
    Explicit,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MethodFixture {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: MemberKind,
    #[serde(default)]
    pub type_params: Vec<TypeParamFixture>,
    #[serde(default)]
    pub params: Vec<ParamFixture>,
    #[serde(default)]
    pub returns: Option<String>,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub accessibility: Option<String>,
    /// Static extension method whose first parameter is the receiver.
    #[serde(default)]
    pub extension: bool,
    #[serde(default)]
    pub conditional: Option<String>,
    #[serde(default)]
    pub requires: Option<Feature>,
    /// Explicit implementation of a member of this interface.
    #[serde(default)]
    pub explicit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ParamFixture {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, rename = "ref")]
    pub by_ref: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub params: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PropertyFixture {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub accessibility: Option<String>,
    #[serde(default)]
    pub write_only: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ParamsFixture {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub within: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BodyFixture {
    #[serde(default)]
    pub name: Option<String>,
    /// Type whose member the body is.
    #[serde(default)]
    pub within: Option<String>,
    #[serde(default)]
    pub returns: Option<String>,
    #[serde(default, rename = "async")]
    pub is_async: bool,
    #[serde(default)]
    pub type_params: Vec<TypeParamFixture>,
    #[serde(default)]
    pub statements: Vec<StmtFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StmtFixture {
    /// A missing type or `"var"` declares an implicitly typed local.
    Local {
        name: String,
        #[serde(default, rename = "type")]
        ty: Option<String>,
        #[serde(default)]
        init: Option<ExprFixture>,
    },
    Expr(ExprFixture),
    Return(Option<ExprFixture>),
    #[serde(rename = "yield")]
    YieldReturn(ExprFixture),
    Lock {
        resource: ExprFixture,
        #[serde(default)]
        body: Vec<StmtFixture>,
    },
    Block(Vec<StmtFixture>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExprFixture {
    Int(i32),
    Long(i64),
    Bool(bool),
    Char(char),
    Double(f64),
    String(String),
    Null,
    Local {
        name: String,
        #[serde(rename = "type")]
        ty: String,
    },
    Call {
        callee: String,
        #[serde(default)]
        args: Vec<ExprFixture>,
        result: String,
    },
    /// `[e1, e2]` without collection arguments.
    List(Vec<ExprFixture>),
    Literal {
        #[serde(default)]
        elements: Vec<ExprFixture>,
        /// `with(args)`; present even when empty.
        #[serde(default, rename = "with")]
        with_args: Option<Vec<ExprFixture>>,
    },
    /// `..source`; only valid as a literal element.
    Spread(Box<ExprFixture>),
    New {
        #[serde(rename = "type")]
        ty: String,
        #[serde(default)]
        args: Vec<ExprFixture>,
        #[serde(default)]
        init: Option<Vec<ExprFixture>>,
    },
    Cast {
        #[serde(rename = "type")]
        ty: String,
        operand: Box<ExprFixture>,
    },
    Await(Box<ExprFixture>),
    Lambda {
        body: Box<ExprFixture>,
        #[serde(default)]
        returns: Option<String>,
        #[serde(default, rename = "expressionTree")]
        expression_tree: bool,
    },
}

// =============================================================================
// Loading
// =============================================================================

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("{context}: {source}")]
    Type {
        context: String,
        #[source]
        source: TypeNameError,
    },
    #[error(transparent)]
    Names(#[from] TypeNameError),
    #[error("unknown declaration kind '{0}'")]
    UnknownKind(String),
    #[error("unknown accessibility '{0}'")]
    UnknownAccessibility(String),
    #[error("unknown core library type '{0}'")]
    UnknownCoreType(String),
    #[error("unknown core library member '{0}'")]
    UnknownCoreMember(String),
    #[error("enclosing type '{0}' is not declared before its nested types")]
    UnknownEnclosingType(String),
    #[error("'{0}' does not name a declared type")]
    NotADeclaration(String),
    #[error("{0}: ordinary methods need a name")]
    MissingMethodName(String),
    #[error("{0}: a conversion operator takes exactly one parameter")]
    ConversionArity(String),
    #[error("{0}: an extension method needs a receiver parameter")]
    MissingReceiver(String),
    #[error("body '{0}': spread outside a collection literal")]
    StraySpread(String),
}

#[derive(Debug)]
pub struct ParamsCheck {
    pub name: String,
    pub ty: TypeId,
    pub within: Option<DefId>,
    pub span: Span,
}

pub struct LoadedFixture {
    pub store: TypeStore,
    pub options: AnalysisOptions,
    /// Parallel to `bodies`.
    pub body_names: Vec<String>,
    pub bodies: Vec<Body>,
    pub params: Vec<ParamsCheck>,
}

/// Declare every type, then lower every body.
pub fn load(fixture: &Fixture) -> Result<LoadedFixture, FixtureError> {
    let store = TypeStore::new();
    install_core_library(&store, &fixture.core_library)?;

    let mut names = TypeNames::new();
    let defs = fixture
        .types
        .iter()
        .map(|decl| declare_type(&store, &mut names, decl, &fixture.options))
        .collect::<Result<Vec<_>, _>>()?;
    for (decl, &def) in fixture.types.iter().zip(&defs) {
        define_members(&store, &names, decl, def)?;
    }

    let (body_names, bodies): (Vec<String>, Vec<Body>) = fixture
        .bodies
        .iter()
        .enumerate()
        .map(|(index, body)| lower_body(&store, &names, index as u32, body))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .unzip();

    let params = fixture
        .params
        .iter()
        .enumerate()
        .map(|(index, check)| {
            let resolver = TypeResolver::new(&store, &names);
            let within = check
                .within
                .as_deref()
                .map(|name| declared_def(&store, &resolver, name))
                .transpose()?;
            let ty = resolve(&resolver, &check.ty, "params parameter")?;
            Ok(ParamsCheck {
                name: check.name.clone().unwrap_or_else(|| format!("params{index}")),
                ty,
                within,
                span: Span::dummy(),
            })
        })
        .collect::<Result<Vec<_>, FixtureError>>()?;

    debug!(
        types = defs.len(),
        bodies = bodies.len(),
        params = params.len(),
        "loaded fixture"
    );
    Ok(LoadedFixture {
        store,
        options: fixture.options.clone(),
        body_names,
        bodies,
        params,
    })
}

fn install_core_library(store: &TypeStore, core: &CoreLibraryFixture) -> Result<(), FixtureError> {
    if !core.install {
        return Ok(());
    }
    let mut builder = CoreLibraryBuilder::new();
    for name in &core.without {
        let tag = WellKnownType::ALL
            .into_iter()
            .find(|tag| tag.full_name() == *name)
            .ok_or_else(|| FixtureError::UnknownCoreType(name.clone()))?;
        builder = builder.without(tag);
    }
    for name in &core.without_members {
        let member = WellKnownMember::ALL
            .into_iter()
            .find(|member| member.display() == *name)
            .ok_or_else(|| FixtureError::UnknownCoreMember(name.clone()))?;
        builder = builder.without_member(member);
    }
    builder.install(store);
    Ok(())
}

fn resolve(resolver: &TypeResolver<'_>, text: &str, context: &str) -> Result<TypeId, FixtureError> {
    resolver.resolve(text).map_err(|source| FixtureError::Type {
        context: context.to_string(),
        source,
    })
}

fn declared_def(
    store: &TypeStore,
    resolver: &TypeResolver<'_>,
    name: &str,
) -> Result<DefId, FixtureError> {
    let ty = resolve(resolver, name, "enclosing type")?;
    store
        .def_of(ty)
        .ok_or_else(|| FixtureError::NotADeclaration(name.to_string()))
}

fn parse_accessibility(text: Option<&str>) -> Result<Accessibility, FixtureError> {
    match text {
        None => Ok(Accessibility::Public),
        Some(text) => {
            Accessibility::parse(text).ok_or_else(|| FixtureError::UnknownAccessibility(text.to_string()))
        }
    }
}

fn declare_type(
    store: &TypeStore,
    names: &mut TypeNames,
    decl: &TypeFixture,
    options: &AnalysisOptions,
) -> Result<DefId, FixtureError> {
    let kind = DefKind::parse(&decl.kind).ok_or_else(|| FixtureError::UnknownKind(decl.kind.clone()))?;
    let param_names: Vec<&str> = decl.type_params.iter().map(TypeParamFixture::name).collect();
    let mut type_decl = TypeDecl::new(kind, &decl.namespace, &decl.name)
        .type_params(&param_names)
        .accessibility(parse_accessibility(decl.accessibility.as_deref())?)
        .assembly(decl.assembly.as_deref().unwrap_or(&options.assembly_name));
    if decl.is_abstract || kind == DefKind::Interface {
        type_decl = type_decl.flags(DefFlags::ABSTRACT);
    }
    if decl.is_static {
        type_decl = type_decl.flags(DefFlags::STATIC | DefFlags::ABSTRACT | DefFlags::SEALED);
    }
    let outer = match &decl.nested_in {
        Some(outer) => Some(
            names
                .get(outer, 0)
                .ok_or_else(|| FixtureError::UnknownEnclosingType(outer.clone()))?,
        ),
        None => None,
    };
    if let Some(outer) = outer {
        type_decl = type_decl.nested_in(outer);
    }

    let def = store.declare(type_decl);
    let arity = param_names.len();
    names.register(&decl.name, arity, def)?;
    names.register(&format!("{}.{}", decl.namespace, decl.name), arity, def)?;
    if let Some(outer) = &decl.nested_in {
        names.register(&format!("{outer}.{}", decl.name), arity, def)?;
    }
    Ok(def)
}

fn apply_constraints(
    store: &TypeStore,
    resolver: &TypeResolver<'_>,
    decls: &[TypeParamFixture],
    params: &[TypeId],
) -> Result<(), FixtureError> {
    for (decl, &param) in decls.iter().zip(params) {
        let TypeParamFixture::Constrained {
            name,
            constructor,
            reference_type,
            value_type,
            constraints,
        } = decl
        else {
            continue;
        };
        let types = constraints
            .iter()
            .map(|text| resolve(resolver, text, &format!("constraint on {name}")))
            .collect::<Result<Vec<_>, _>>()?;
        store.set_constraints(
            param,
            TypeParamConstraints {
                constructor: *constructor,
                reference_type: *reference_type,
                value_type: *value_type,
                types,
            },
        );
    }
    Ok(())
}

fn scope_of(decls: &[TypeParamFixture], params: &[TypeId]) -> Vec<(String, TypeId)> {
    decls
        .iter()
        .zip(params)
        .map(|(decl, &ty)| (decl.name().to_string(), ty))
        .collect()
}

fn define_members(
    store: &TypeStore,
    names: &TypeNames,
    decl: &TypeFixture,
    def: DefId,
) -> Result<(), FixtureError> {
    let own_params = store.type_params_of(def);
    let scope = scope_of(&decl.type_params, &own_params);
    let resolver = TypeResolver::new(store, names).with_params(scope.clone());
    apply_constraints(store, &resolver, &decl.type_params, &own_params)?;

    if let Some(base) = &decl.base {
        store.set_base(def, resolve(&resolver, base, &format!("base of {}", decl.name))?);
    }
    for interface in &decl.interfaces {
        let ty = resolve(&resolver, interface, &format!("interface of {}", decl.name))?;
        store.add_interface(def, ty);
    }
    for property in &decl.properties {
        let ty = resolve(&resolver, &property.ty, &format!("{}.{}", decl.name, property.name))?;
        let mut prop = PropertyDecl::new(&property.name, ty)
            .accessibility(parse_accessibility(property.accessibility.as_deref())?);
        if property.is_static {
            prop = prop.static_property();
        }
        if property.write_only {
            prop = prop.write_only();
        }
        store.add_property(def, prop);
    }
    for method in &decl.methods {
        let method_decl = method_decl(store, names, &scope, decl, def, method)?;
        store.add_method(def, method_decl);
    }
    if let Some(attr) = &decl.collection_builder {
        let builder = resolve(&resolver, &attr.ty, &format!("collection builder of {}", decl.name))?;
        let builder = store
            .def_of(builder)
            .ok_or_else(|| FixtureError::NotADeclaration(attr.ty.clone()))?;
        store.set_collection_builder(def, builder, &attr.method);
    }
    Ok(())
}

fn method_decl(
    store: &TypeStore,
    names: &TypeNames,
    scope: &[(String, TypeId)],
    owner: &TypeFixture,
    def: DefId,
    method: &MethodFixture,
) -> Result<MethodDecl, FixtureError> {
    let member = match (method.kind, method.name.as_deref()) {
        (_, Some(name)) => name,
        (MemberKind::Constructor, None) => ".ctor",
        (MemberKind::Implicit, None) => "op_Implicit",
        (MemberKind::Explicit, None) => "op_Explicit",
        (MemberKind::Method, None) => "<unnamed>",
    };
    let label = format!("{}.{member}", owner.name);
    let allocated: Vec<_> = method
        .type_params
        .iter()
        .enumerate()
        .map(|(index, decl)| store.method_type_param(decl.name(), index as u32))
        .collect();
    let param_types: Vec<TypeId> = allocated.iter().map(|&(_, ty)| ty).collect();
    let resolver = TypeResolver::new(store, names)
        .with_params(scope.iter().cloned())
        .with_params(scope_of(&method.type_params, &param_types));
    apply_constraints(store, &resolver, &method.type_params, &param_types)?;

    let mut params = method
        .params
        .iter()
        .map(|param| Ok((param, resolve(&resolver, &param.ty, &label)?)))
        .collect::<Result<Vec<_>, FixtureError>>()?;
    let returns = method
        .returns
        .as_deref()
        .map(|text| resolve(&resolver, text, &label))
        .transpose()?;

    let mut decl = match method.kind {
        MemberKind::Constructor => MethodDecl::constructor(),
        MemberKind::Implicit | MemberKind::Explicit => {
            let [(_, source)] = params.as_slice() else {
                return Err(FixtureError::ConversionArity(label));
            };
            let target = returns.unwrap_or_else(|| store.self_type(def));
            let decl = MethodDecl::conversion(method.kind == MemberKind::Implicit, *source, target);
            params.clear();
            decl
        }
        MemberKind::Method => {
            let name = method
                .name
                .as_deref()
                .ok_or_else(|| FixtureError::MissingMethodName(label.clone()))?;
            let mut decl = MethodDecl::new(name);
            if let Some(ret) = returns {
                decl = decl.returns(ret);
            }
            decl
        }
    };

    if method.extension {
        if params.is_empty() {
            return Err(FixtureError::MissingReceiver(label));
        }
        let (_, receiver) = params.remove(0);
        decl = decl.extension(receiver);
    }
    for (param, ty) in params {
        let name = param.name.as_deref().unwrap_or("value");
        decl = if param.by_ref {
            decl.ref_param(name, ty)
        } else if param.params {
            decl.params_param(name, ty)
        } else if param.optional {
            decl.optional_param(name, ty)
        } else {
            decl.param(name, ty)
        };
    }
    if !allocated.is_empty() {
        let ids: Vec<_> = allocated.iter().map(|&(id, _)| id).collect();
        decl = decl.generic(&ids);
    }
    if method.is_static {
        decl = decl.flags(MethodFlags::STATIC);
    }
    if let Some(symbol) = &method.conditional {
        decl = decl.conditional(symbol);
    }
    if let Some(feature) = method.requires {
        decl = decl.requires(feature);
    }
    decl = decl.accessibility(parse_accessibility(method.accessibility.as_deref())?);
    if let Some(interface) = &method.explicit {
        decl = decl.explicit_impl(resolve(&resolver, interface, &label)?);
    }
    Ok(decl)
}

// =============================================================================
// Bodies
// =============================================================================

fn lower_body(
    store: &TypeStore,
    names: &TypeNames,
    index: u32,
    fixture: &BodyFixture,
) -> Result<(String, Body), FixtureError> {
    let name = fixture.name.clone().unwrap_or_else(|| format!("body{index}"));
    let mut scope = Vec::new();
    let mut builder = BodyBuilder::new(BodyId(index));

    if let Some(within) = &fixture.within {
        let def = declared_def(store, &TypeResolver::new(store, names), within)?;
        let param_names = store
            .defs()
            .get_type_params(def)
            .into_iter()
            .filter_map(|tp| store.defs().type_param(tp))
            .map(|info| store.resolve_atom(info.name).to_string());
        scope.extend(param_names.zip(store.type_params_of(def)));
        builder = builder.within(def);
    }

    let allocated: Vec<TypeId> = fixture
        .type_params
        .iter()
        .enumerate()
        .map(|(i, decl)| store.method_type_param(decl.name(), i as u32).1)
        .collect();
    scope.extend(scope_of(&fixture.type_params, &allocated));
    let resolver = TypeResolver::new(store, names).with_params(scope);
    apply_constraints(store, &resolver, &fixture.type_params, &allocated)?;

    if let Some(returns) = &fixture.returns {
        builder = builder.returns(resolve(&resolver, returns, &name)?);
    }
    if fixture.is_async {
        builder = builder.async_body();
    }

    let mut lowerer = BodyLowerer {
        store,
        resolver,
        builder,
        name: name.clone(),
    };
    for stmt in &fixture.statements {
        lowerer.lower_stmt(stmt, true)?;
    }
    Ok((name, lowerer.builder.finish()))
}

struct BodyLowerer<'a> {
    store: &'a TypeStore,
    resolver: TypeResolver<'a>,
    builder: BodyBuilder,
    name: String,
}

impl BodyLowerer<'_> {
    fn ty(&self, text: &str) -> Result<TypeId, FixtureError> {
        resolve(&self.resolver, text, &format!("body '{}'", self.name))
    }

    fn lower_stmt(&mut self, stmt: &StmtFixture, top_level: bool) -> Result<StmtId, FixtureError> {
        let kind = match stmt {
            StmtFixture::Local { name, ty, init } => {
                let declared = match ty.as_deref() {
                    None | Some("var") => None,
                    Some(text) => Some(self.ty(text)?),
                };
                let init = init.as_ref().map(|e| self.lower_expr(e)).transpose()?;
                StmtKind::Local {
                    name: self.store.atom(name),
                    declared,
                    init,
                }
            }
            StmtFixture::Expr(expr) => StmtKind::Expr(self.lower_expr(expr)?),
            StmtFixture::Return(expr) => {
                StmtKind::Return(expr.as_ref().map(|e| self.lower_expr(e)).transpose()?)
            }
            StmtFixture::YieldReturn(expr) => StmtKind::YieldReturn(self.lower_expr(expr)?),
            StmtFixture::Lock { resource, body } => {
                let resource = self.lower_expr(resource)?;
                let body = self.lower_nested(body)?;
                StmtKind::Lock { resource, body }
            }
            StmtFixture::Block(stmts) => StmtKind::Block(self.lower_nested(stmts)?),
        };
        Ok(if top_level {
            self.builder.stmt(kind)
        } else {
            self.builder.nested(kind)
        })
    }

    fn lower_nested(&mut self, stmts: &[StmtFixture]) -> Result<Vec<StmtId>, FixtureError> {
        stmts.iter().map(|s| self.lower_stmt(s, false)).collect()
    }

    fn lower_exprs(&mut self, exprs: &[ExprFixture]) -> Result<Vec<ExprId>, FixtureError> {
        exprs.iter().map(|e| self.lower_expr(e)).collect()
    }

    fn lower_element(&mut self, expr: &ExprFixture) -> Result<CollectionElement, FixtureError> {
        Ok(match expr {
            ExprFixture::Spread(source) => CollectionElement::Spread(self.lower_expr(source)?),
            other => CollectionElement::Expr(self.lower_expr(other)?),
        })
    }

    fn lower_expr(&mut self, expr: &ExprFixture) -> Result<ExprId, FixtureError> {
        Ok(match expr {
            ExprFixture::Int(v) => self.builder.int(*v),
            ExprFixture::Long(v) => self.builder.constant(ConstantValue::Long(*v)),
            ExprFixture::Bool(v) => self.builder.constant(ConstantValue::Bool(*v)),
            ExprFixture::Char(v) => self.builder.constant(ConstantValue::Char(*v)),
            ExprFixture::Double(v) => self.builder.constant(ConstantValue::Double(*v)),
            ExprFixture::String(v) => self.builder.string(v),
            ExprFixture::Null => self.builder.null(),
            ExprFixture::Local { name, ty } => {
                let ty = self.ty(ty)?;
                self.builder.local(self.store.atom(name), ty)
            }
            ExprFixture::Call {
                callee,
                args,
                result,
            } => {
                let result = self.ty(result)?;
                let args = self.lower_exprs(args)?;
                self.builder.call(self.store.atom(callee), args, result)
            }
            ExprFixture::List(items) => {
                let elements = items
                    .iter()
                    .map(|e| self.lower_element(e))
                    .collect::<Result<Vec<_>, _>>()?;
                self.builder.literal(elements)
            }
            ExprFixture::Literal {
                elements,
                with_args,
            } => {
                let args = with_args.as_deref().map(|a| self.lower_exprs(a)).transpose()?;
                let elements = elements
                    .iter()
                    .map(|e| self.lower_element(e))
                    .collect::<Result<Vec<_>, _>>()?;
                match args {
                    Some(args) => self.builder.literal_with(args, elements),
                    None => self.builder.literal(elements),
                }
            }
            ExprFixture::Spread(_) => return Err(FixtureError::StraySpread(self.name.clone())),
            ExprFixture::New { ty, args, init } => {
                let ty = self.ty(ty)?;
                let args = self.lower_exprs(args)?;
                let init = init.as_deref().map(|i| self.lower_exprs(i)).transpose()?;
                self.builder.new_object(ty, args, init)
            }
            ExprFixture::Cast { ty, operand } => {
                let target = self.ty(ty)?;
                let operand = self.lower_expr(operand)?;
                self.builder.cast(target, operand)
            }
            ExprFixture::Await(operand) => {
                let operand = self.lower_expr(operand)?;
                self.builder.await_expr(operand)
            }
            ExprFixture::Lambda {
                body,
                returns,
                expression_tree,
            } => {
                let returns = returns.as_deref().map(|t| self.ty(t)).transpose()?;
                let body = self.lower_expr(body)?;
                self.builder.lambda(body, returns, *expression_tree)
            }
        })
    }
}

#[cfg(test)]
#[path = "../tests/fixture_tests.rs"]
mod tests;
