//! Collection arguments: `[with(capacity), ..elements]`.
//!
//! The arguments select the constructor the literal is built with. Arrays and
//! spans take none. Read-only interfaces accept only an empty argument list;
//! mutable interfaces pick among the `List<T>` constructors; user-defined
//! collections pick among their own accessible constructors. Builder-created
//! collections pick the `Create` overload whose leading parameters take the
//! arguments.

use crate::ast::ExprId;
use crate::context::CheckerState;
use crate::conversion_classifier::ExprArguments;
use csz_common::diagnostics::diagnostic_codes;
use csz_common::language::Feature;
use csz_common::span::Span;
use csz_solver::class_hierarchy::{is_accessible, is_value_type};
use csz_solver::constructibility::ConstructibilityVerdict;
use csz_solver::types::{MethodKind, TypeData};
use csz_solver::{DefKind, OverloadResult, ResolvedMethod, TypeId};
use tracing::trace;

impl<'a> CheckerState<'a> {
    /// Bind `with(...)` arguments. `Some(constructor)` replaces the verdict's
    /// constructor (`None` inside meaning the implicit one); `None` means the
    /// arguments were rejected and reported.
    pub(crate) fn bind_collection_arguments(
        &mut self,
        target: TypeId,
        verdict: &ConstructibilityVerdict,
        args: &[ExprId],
        span: Span,
    ) -> Option<Option<ResolvedMethod>> {
        self.require_feature(Feature::CollectionArguments, span);
        match verdict {
            ConstructibilityVerdict::Array { .. } | ConstructibilityVerdict::Span { .. } => {
                self.ctx.error(
                    diagnostic_codes::COLLECTION_ARGUMENTS_NOT_SUPPORTED_FOR_TYPE,
                    span,
                    vec![target.into()],
                );
                self.check_standalone(args);
                None
            }
            ConstructibilityVerdict::InterfaceBackedByDefault {
                interface,
                concrete,
                constructor,
                ..
            } => {
                let read_only = self
                    .ctx
                    .db
                    .well_known_of(*interface)
                    .is_some_and(|(tag, _)| tag.is_read_only_interface());
                if !read_only {
                    return self.resolve_constructor(*concrete, args, span);
                }
                if args.is_empty() {
                    return Some(Some(constructor.clone()));
                }
                self.ctx.error(
                    diagnostic_codes::COLLECTION_ARGUMENTS_MUST_BE_EMPTY,
                    span,
                    vec![(*interface).into()],
                );
                self.check_standalone(args);
                None
            }
            ConstructibilityVerdict::UserDefinedCollection { concrete, .. } => {
                self.resolve_constructor(*concrete, args, span)
            }
            ConstructibilityVerdict::CollectionBuilder { overloads, .. } => {
                self.resolve_builder_overload(overloads, args, span)
            }
            ConstructibilityVerdict::NotConstructible(_) => None,
        }
    }

    /// Overload resolution over the accessible instance constructors of `ty`.
    ///
    /// `Some(None)` is the implicit parameterless constructor. Arguments are
    /// converted to the chosen parameters.
    pub(crate) fn resolve_constructor(
        &mut self,
        ty: TypeId,
        args: &[ExprId],
        span: Span,
    ) -> Option<Option<ResolvedMethod>> {
        let candidates = self.accessible_constructors(ty);
        if candidates.is_empty() {
            if args.is_empty() && self.has_implicit_constructor(ty) {
                return Some(None);
            }
            self.ctx.error(
                diagnostic_codes::NO_CONSTRUCTOR_TAKES_ARGUMENTS,
                span,
                vec![ty.into(), args.len().into()],
            );
            self.check_standalone(args);
            return None;
        }

        let result = {
            let ctx = &self.ctx;
            let body = self.body;
            ctx.with_classifier(|classifier| {
                ctx.resolver
                    .resolve(classifier, &candidates, &ExprArguments::new(ctx, body, args))
            })
        };
        match result {
            OverloadResult::Success(applicable) => {
                self.check_member_feature(&applicable.method, span);
                for (&arg, &param) in args.iter().zip(applicable.param_types.iter()) {
                    self.convert_expr(arg, param);
                }
                trace!(ty = ty.0, constructor = applicable.method.id.0, "resolved constructor");
                Some(Some(applicable.method))
            }
            OverloadResult::Ambiguous(first, second) => {
                self.ctx.error(
                    diagnostic_codes::AMBIGUOUS_CALL,
                    span,
                    vec![first.id.into(), second.id.into()],
                );
                self.check_standalone(args);
                None
            }
            OverloadResult::NoApplicable { .. } | OverloadResult::Empty => {
                if args.is_empty() && is_value_type(self.ctx.db, ty) {
                    return Some(None);
                }
                self.ctx.error(
                    diagnostic_codes::NO_CONSTRUCTOR_TAKES_ARGUMENTS,
                    span,
                    vec![ty.into(), args.len().into()],
                );
                self.check_standalone(args);
                None
            }
        }
    }

    /// Overload resolution over the `Create` overloads with their trailing
    /// span parameter removed; the elements fill it.
    fn resolve_builder_overload(
        &mut self,
        overloads: &[ResolvedMethod],
        args: &[ExprId],
        span: Span,
    ) -> Option<Option<ResolvedMethod>> {
        let leading: Vec<ResolvedMethod> = overloads
            .iter()
            .map(|method| {
                let mut method = method.clone();
                method.params.pop();
                method
            })
            .collect();
        let count = args.len();
        let takes_count = leading
            .iter()
            .any(|method| method.required_param_count() <= count && count <= method.params.len());
        let Some(name) = overloads.first().map(|method| method.name) else {
            self.check_standalone(args);
            return None;
        };
        if !takes_count {
            self.ctx.error(
                diagnostic_codes::BAD_COLLECTION_ARGUMENTS_ARG_COUNT,
                span,
                vec![name.into(), count.into()],
            );
            self.check_standalone(args);
            return None;
        }

        let result = {
            let ctx = &self.ctx;
            let body = self.body;
            ctx.with_classifier(|classifier| {
                ctx.resolver
                    .resolve(classifier, &leading, &ExprArguments::new(ctx, body, args))
            })
        };
        match result {
            OverloadResult::Success(applicable) => {
                self.check_member_feature(&applicable.method, span);
                for (&arg, &param) in args.iter().zip(applicable.param_types.iter()) {
                    self.convert_expr(arg, param);
                }
                let chosen = overloads
                    .iter()
                    .find(|method| method.id == applicable.method.id)
                    .cloned();
                trace!(create = applicable.method.id.0, "resolved builder overload");
                Some(chosen)
            }
            OverloadResult::Ambiguous(first, second) => {
                self.ctx.error(
                    diagnostic_codes::AMBIGUOUS_CALL,
                    span,
                    vec![first.id.into(), second.id.into()],
                );
                self.check_standalone(args);
                None
            }
            OverloadResult::NoApplicable {
                best: Some(best),
                failed_arg: Some(index),
            } if index < count => {
                let arg = args[index];
                let source = self.argument_display(arg);
                let arg_span = self.expr_span(arg);
                if let Some(param) = best.call_params().get(index) {
                    self.ctx.error(
                        diagnostic_codes::ARGUMENT_CANNOT_CONVERT,
                        arg_span,
                        vec![(index + 1).into(), source, param.ty.into()],
                    );
                }
                self.check_standalone(args);
                None
            }
            OverloadResult::NoApplicable { .. } | OverloadResult::Empty => {
                self.ctx.error(
                    diagnostic_codes::BAD_COLLECTION_ARGUMENTS_ARG_COUNT,
                    span,
                    vec![name.into(), count.into()],
                );
                self.check_standalone(args);
                None
            }
        }
    }

    fn accessible_constructors(&self, ty: TypeId) -> Vec<ResolvedMethod> {
        let db = self.ctx.db;
        let Some(def) = db.def_of(ty) else {
            return Vec::new();
        };
        db.defs()
            .get_methods(def)
            .into_iter()
            .filter(|&id| {
                db.defs().method(id).is_some_and(|info| {
                    info.kind == MethodKind::Constructor
                        && !info.is_static()
                        && is_accessible(db, info.accessibility, def, &self.ctx.access)
                })
            })
            .filter_map(|id| ResolvedMethod::new(db, id, ty, 0))
            .collect()
    }

    /// Structs, classes without declared instance constructors, and type
    /// parameters with a `new()` or `struct` constraint.
    fn has_implicit_constructor(&self, ty: TypeId) -> bool {
        let db = self.ctx.db;
        match db.lookup(ty) {
            Some(TypeData::Named { def, .. }) => {
                let defs = db.defs();
                match defs.get_kind(def) {
                    Some(DefKind::Struct | DefKind::RefStruct) => true,
                    Some(DefKind::Class) => {
                        let info = defs.get(def);
                        let instantiable = info
                            .as_ref()
                            .is_some_and(|info| !info.is_abstract() && !info.is_static());
                        instantiable
                            && !defs.get_methods(def).into_iter().any(|id| {
                                defs.method(id).is_some_and(|m| {
                                    m.kind == MethodKind::Constructor && !m.is_static()
                                })
                            })
                    }
                    _ => false,
                }
            }
            Some(TypeData::TypeParameter(param)) => db.defs().type_param(param).is_some_and(|info| {
                info.constraints.constructor || info.constraints.value_type
            }),
            _ => is_value_type(db, ty),
        }
    }

    fn check_standalone(&mut self, args: &[ExprId]) {
        for &arg in args {
            self.check_expr(arg, None);
        }
    }
}
