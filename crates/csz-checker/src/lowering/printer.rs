//! Canonical text form of lowering plans.
//!
//! One node per line, children indented two spaces. Spans and arena ids of
//! nested plans never appear, so structurally equal plans print identically
//! whatever syntax produced them. Expressions print as `expr#N`, or by name
//! when a body is supplied.

use super::{
    ArrayInitializer, ArrayLength, LoweredValue, LoweringPlan, LoweringStep, SpanBacking,
};
use crate::ast::{Body, ExprId, ExprKind};
use csz_solver::types::ConstantValue;
use csz_solver::{Conversion, MethodId, ResolvedMethod, TypeDatabase, TypeFormatter, TypeId};

pub struct PlanPrinter<'a> {
    db: &'a dyn TypeDatabase,
    body: Option<&'a Body>,
    out: String,
    indent: usize,
}

impl<'a> PlanPrinter<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        Self {
            db,
            body: None,
            out: String::new(),
            indent: 0,
        }
    }

    /// Render expressions through `body` instead of by id.
    pub fn with_body(mut self, body: &'a Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn print(mut self, plan: &LoweringPlan) -> String {
        self.write_plan(plan);
        self.out
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.indent += 1;
        f(self);
        self.indent -= 1;
    }

    fn write_plan(&mut self, plan: &LoweringPlan) {
        match plan {
            LoweringPlan::ArrayInit {
                array_type,
                length,
                initializer,
                ..
            } => {
                let header = format!("array_init {} length={}", self.ty(*array_type), self.length(length));
                self.line(&header);
                self.nested(|p| match initializer {
                    ArrayInitializer::Empty => p.line("empty"),
                    ArrayInitializer::MetadataBlob { bytes } => p.line(&format!("blob {}", hex(bytes))),
                    ArrayInitializer::ElementStores(steps) => {
                        for step in steps {
                            p.write_step(step);
                        }
                    }
                });
            }
            LoweringPlan::ConstructThenAdd {
                collection_type,
                constructor,
                constructor_args,
                steps,
            } => {
                let header = format!("construct_then_add {}", self.ty(*collection_type));
                self.line(&header);
                self.nested(|p| {
                    let ctor = match constructor {
                        Some(constructor) => p.method(constructor),
                        None => "implicit".to_string(),
                    };
                    if constructor_args.is_empty() {
                        p.line(&format!("constructor {ctor}"));
                    } else {
                        let args: Vec<String> = constructor_args.iter().map(|&a| p.expr(a)).collect();
                        p.line(&format!("constructor {ctor} with ({})", args.join(", ")));
                    }
                    for step in steps {
                        p.write_step(step);
                    }
                });
            }
            LoweringPlan::SpanWrap {
                span_type,
                readonly,
                constructor,
                backing,
            } => {
                let mut header = format!("span_wrap {}", self.ty(*span_type));
                if *readonly {
                    header.push_str(" readonly");
                }
                self.line(&header);
                self.nested(|p| {
                    if let Some(constructor) = constructor {
                        let text = format!("constructor {}", p.method(constructor));
                        p.line(&text);
                    }
                    match backing {
                        SpanBacking::Array(plan) => p.write_plan(plan),
                        SpanBacking::MetadataBlob {
                            element_type,
                            bytes,
                        } => {
                            let text = format!("blob {} {}", p.ty(*element_type), hex(bytes));
                            p.line(&text);
                        }
                    }
                });
            }
            LoweringPlan::BuilderCall {
                collection_type,
                create,
                builder_args,
                span,
            } => {
                let header = format!("builder_call {}", self.ty(*collection_type));
                self.line(&header);
                self.nested(|p| {
                    let create = match create {
                        Some(create) => p.method(create),
                        None => "unresolved".to_string(),
                    };
                    if builder_args.is_empty() {
                        p.line(&format!("create {create}"));
                    } else {
                        let args: Vec<String> = builder_args.iter().map(|&a| p.expr(a)).collect();
                        p.line(&format!("create {create} with ({})", args.join(", ")));
                    }
                    p.write_plan(span);
                });
            }
            LoweringPlan::MonitorFallback {
                resource_type,
                enter,
                exit,
                ..
            } => {
                let header = format!("monitor_fallback {}", self.ty(*resource_type));
                self.line(&header);
                self.nested(|p| {
                    let enter = format!("enter {}", p.method_id(*enter));
                    p.line(&enter);
                    let exit = format!("finally {}", p.method_id(*exit));
                    p.line(&exit);
                });
            }
            LoweringPlan::ScopeEnterDispose {
                producer,
                disposer,
                scope_local,
                ..
            } => {
                self.line("scope_enter_dispose");
                self.nested(|p| {
                    let local = format!(
                        "scope_local {}{}",
                        p.ty(scope_local.ty),
                        if scope_local.crosses_suspension {
                            " crosses_suspension"
                        } else {
                            ""
                        }
                    );
                    p.line(&local);
                    let enter = format!("enter {}", p.method(producer));
                    p.line(&enter);
                    let exit = format!("finally {}", p.method(disposer));
                    p.line(&exit);
                });
            }
        }
    }

    fn write_step(&mut self, step: &LoweringStep) {
        match step {
            LoweringStep::Store {
                index,
                value,
                conversion,
            } => {
                let slot = index.map_or_else(|| "next".to_string(), |i| i.to_string());
                self.write_valued(&format!("store [{slot}]"), value, *conversion);
            }
            LoweringStep::Add {
                adder,
                value,
                conversion,
            } => {
                let head = format!("add {}", self.method(adder));
                self.write_valued(&head, value, *conversion);
            }
            LoweringStep::SpreadCountable { source, adder } => {
                let text = format!("spread_countable {}{}", self.expr(*source), self.via(adder.as_ref()));
                self.line(&text);
            }
            LoweringStep::SpreadEnumerate {
                source,
                adder,
                dispose,
            } => {
                let text = format!(
                    "spread_enumerate {}{}{}",
                    self.expr(*source),
                    self.via(adder.as_ref()),
                    if *dispose { " dispose" } else { "" }
                );
                self.line(&text);
            }
            LoweringStep::AddRange { method, source } => {
                let text = format!("add_range {} {}", self.method(method), self.expr(*source));
                self.line(&text);
            }
        }
    }

    fn write_valued(&mut self, head: &str, value: &LoweredValue, conversion: Conversion) {
        match value {
            LoweredValue::Nested(plan) => {
                self.line(&format!("{head} ({})", conversion.as_str()));
                self.nested(|p| p.write_plan(plan));
            }
            LoweredValue::Constant(constant) => {
                self.line(&format!("{head} {} ({})", constant_text(constant), conversion.as_str()));
            }
            LoweredValue::Expr(e) => {
                let text = format!("{head} {} ({})", self.expr(*e), conversion.as_str());
                self.line(&text);
            }
        }
    }

    fn via(&self, adder: Option<&ResolvedMethod>) -> String {
        adder.map_or_else(String::new, |adder| format!(" via {}", self.method(adder)))
    }

    fn length(&self, length: &ArrayLength) -> String {
        match length {
            ArrayLength::Fixed(n) => n.to_string(),
            ArrayLength::Computed { fixed, spreads } => {
                let mut text = fixed.to_string();
                for &spread in spreads {
                    text.push_str(" + ");
                    text.push_str(&self.expr(spread));
                    text.push_str(".Length");
                }
                text
            }
            ArrayLength::Gathered => "gathered".to_string(),
        }
    }

    fn ty(&self, ty: TypeId) -> String {
        TypeFormatter::new(self.db).format(ty)
    }

    fn method(&self, method: &ResolvedMethod) -> String {
        TypeFormatter::new(self.db).format_method(method)
    }

    fn method_id(&self, id: MethodId) -> String {
        TypeFormatter::new(self.db).format_method_id(id)
    }

    fn expr(&self, e: ExprId) -> String {
        let Some(body) = self.body else {
            return format!("expr#{}", e.0);
        };
        let Some(node) = body.get_expr(e) else {
            return format!("expr#{}", e.0);
        };
        match &node.kind {
            ExprKind::Local { name, .. } => self.db.resolve_atom(*name).to_string(),
            ExprKind::Call { callee, args, .. } => {
                let args: Vec<String> = args.iter().map(|&a| self.expr(a)).collect();
                format!("{}({})", self.db.resolve_atom(*callee), args.join(", "))
            }
            ExprKind::Constant(constant) => constant_text(constant),
            _ => format!("expr#{}", e.0),
        }
    }
}

fn constant_text(constant: &ConstantValue) -> String {
    match constant {
        ConstantValue::Null => "null".to_string(),
        ConstantValue::Bool(b) => b.to_string(),
        ConstantValue::Char(c) => format!("'{c}'"),
        ConstantValue::Int(v) => v.to_string(),
        ConstantValue::UInt(v) => format!("{v}U"),
        ConstantValue::Long(v) => format!("{v}L"),
        ConstantValue::ULong(v) => format!("{v}UL"),
        ConstantValue::Float(v) => format!("{v}F"),
        ConstantValue::Double(v) => format!("{v}D"),
        ConstantValue::String(s) => format!("{s:?}"),
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
