// Copyright 2017 The Postfx Developers.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HLSL 4.0 text generation from the effect syntax tree.
//!
//! The emitter only prints. Declarations that allocate device objects (textures, samplers,
//! uniforms) are handled by the compiler, which uses the emitter for everything else.

use postfx_core::tree::{AssignOp, BaseClass, BinaryOp, Case, Expression, ExpressionKind,
                        Function, Intrinsic, Jump, Qualifiers, Statement, StatementKind,
                        Struct, Type, UnaryOp, Value, Variable};

/// Helpers every compiled shader is prefixed with.
///
/// Effect samplers are a texture and a sampler state bundled together, the `tex2D*`
/// intrinsics of the effect language map onto these functions.
pub const PREAMBLE: &str = "\
struct __sampler2D { Texture2D t; SamplerState s; };
inline float4 __tex2D(__sampler2D s, float2 c) { return s.t.Sample(s.s, c); }
inline float4 __tex2Doffset(__sampler2D s, float2 c, int2 offset) { return s.t.Sample(s.s, c, offset); }
inline float4 __tex2Dlod(__sampler2D s, float4 c) { return s.t.SampleLevel(s.s, c.xy, c.w); }
inline float4 __tex2Dlodoffset(__sampler2D s, float4 c, int2 offset) { return s.t.SampleLevel(s.s, c.xy, c.w, offset); }
inline float4 __tex2Dgather(__sampler2D s, float2 c) { return s.t.Gather(s.s, c); }
inline float4 __tex2Dgatheroffset(__sampler2D s, float2 c, int2 offset) { return s.t.Gather(s.s, c, offset); }
inline float4 __tex2Dfetch(__sampler2D s, int4 c) { return s.t.Load(c.xyw); }
inline int2 __tex2Dsize(__sampler2D s, int lod) { uint w, h, l; s.t.GetDimensions(lod, w, h, l); return int2(w, h); }
";

/// Map Direct3D 9 style semantics onto their system-value equivalents.
pub fn convert_semantic(semantic: &str) -> String {
    let upper = semantic.to_ascii_uppercase();
    if upper == "VERTEXID" {
        "SV_VERTEXID".to_string()
    } else if upper == "POSITION" || upper == "VPOS" {
        "SV_POSITION".to_string()
    } else if upper.starts_with("COLOR") {
        format!("SV_TARGET{}", &upper["COLOR".len() ..])
    } else if upper == "DEPTH" {
        "SV_DEPTH".to_string()
    } else {
        semantic.to_string()
    }
}

/// HLSL name of a type, without qualifiers or array dimensions.
pub fn type_name(ty: &Type) -> String {
    let base = match ty.class {
        BaseClass::Void => "void",
        BaseClass::Bool => "bool",
        BaseClass::Int => "int",
        BaseClass::Uint => "uint",
        BaseClass::Float => "float",
        BaseClass::String => "string",
        BaseClass::Texture2D => "Texture2D",
        BaseClass::Sampler2D => "__sampler2D",
        BaseClass::Struct => {
            return ty.definition.as_ref().map_or_else(String::new, |d| d.name.clone())
        }
    };
    if ty.is_matrix() {
        format!("{}{}x{}", base, ty.rows, ty.cols)
    } else if ty.is_vector() {
        format!("{}{}", base, ty.rows)
    } else {
        base.to_string()
    }
}

fn qualifier_prefix(ty: &Type, strip_uniform: bool) -> String {
    const ORDER: [(Qualifiers, &str); 9] = [
        (Qualifiers::EXTERN, "extern "),
        (Qualifiers::STATIC, "static "),
        (Qualifiers::CONST, "const "),
        (Qualifiers::VOLATILE, "volatile "),
        (Qualifiers::PRECISE, "precise "),
        (Qualifiers::LINEAR, "linear "),
        (Qualifiers::NOPERSPECTIVE, "noperspective "),
        (Qualifiers::CENTROID, "centroid "),
        (Qualifiers::NOINTERPOLATION, "nointerpolation "),
    ];
    let mut out = String::new();
    for &(q, text) in ORDER.iter() {
        if ty.has(q) {
            out.push_str(text);
        }
    }
    if ty.has(Qualifiers::INOUT) {
        out.push_str("inout ");
    } else if ty.has(Qualifiers::IN) {
        out.push_str("in ");
    } else if ty.has(Qualifiers::OUT) {
        out.push_str("out ");
    } else if ty.has(Qualifiers::UNIFORM) && !strip_uniform {
        out.push_str("uniform ");
    }
    out
}

fn intrinsic_name(op: Intrinsic) -> &'static str {
    use self::Intrinsic::*;
    match op {
        Abs => "abs",
        Acos => "acos",
        All => "all",
        Any => "any",
        BitCastInt2Float | BitCastUint2Float => "asfloat",
        Asin => "asin",
        BitCastFloat2Int => "asint",
        BitCastFloat2Uint => "asuint",
        Atan => "atan",
        Atan2 => "atan2",
        Ceil => "ceil",
        Clamp => "clamp",
        Cos => "cos",
        Cosh => "cosh",
        Cross => "cross",
        PartialDerivativeX => "ddx",
        PartialDerivativeY => "ddy",
        Degrees => "degrees",
        Determinant => "determinant",
        Distance => "distance",
        Dot => "dot",
        Exp => "exp",
        Exp2 => "exp2",
        FaceForward => "faceforward",
        Floor => "floor",
        Frac => "frac",
        Frexp => "frexp",
        Fwidth => "fwidth",
        Ldexp => "ldexp",
        Length => "length",
        Lerp => "lerp",
        Log => "log",
        Log10 => "log10",
        Log2 => "log2",
        Mad => "mad",
        Max => "max",
        Min => "min",
        Modf => "modf",
        Mul => "mul",
        Normalize => "normalize",
        Pow => "pow",
        Radians => "radians",
        Rcp => "rcp",
        Reflect => "reflect",
        Refract => "refract",
        Round => "round",
        Rsqrt => "rsqrt",
        Saturate => "saturate",
        Sign => "sign",
        Sin => "sin",
        SinCos => "sincos",
        Sinh => "sinh",
        SmoothStep => "smoothstep",
        Sqrt => "sqrt",
        Step => "step",
        Tan => "tan",
        Tanh => "tanh",
        Tex2D => "__tex2D",
        Tex2DFetch => "__tex2Dfetch",
        Tex2DGather => "__tex2Dgather",
        Tex2DGatherOffset => "__tex2Dgatheroffset",
        Tex2DLevel => "__tex2Dlod",
        Tex2DLevelOffset => "__tex2Dlodoffset",
        Tex2DOffset => "__tex2Doffset",
        Tex2DSize => "__tex2Dsize",
        Transpose => "transpose",
        Trunc => "trunc",
    }
}

fn binary_operator(op: BinaryOp) -> &'static str {
    use self::BinaryOp::*;
    match op {
        Add => "+",
        Subtract => "-",
        Multiply => "*",
        Divide => "/",
        Modulo => "%",
        Less => "<",
        Greater => ">",
        LessOrEqual => "<=",
        GreaterOrEqual => ">=",
        Equal => "==",
        NotEqual => "!=",
        LeftShift => "<<",
        RightShift => ">>",
        BitwiseAnd => "&",
        BitwiseOr => "|",
        BitwiseXor => "^",
        LogicalAnd => "&&",
        LogicalOr => "||",
        ElementExtract => "[]",
    }
}

fn assignment_operator(op: AssignOp) -> &'static str {
    use self::AssignOp::*;
    match op {
        None => "=",
        Add => "+=",
        Subtract => "-=",
        Multiply => "*=",
        Divide => "/=",
        Modulo => "%=",
        BitwiseAnd => "&=",
        BitwiseOr => "|=",
        BitwiseXor => "^=",
        LeftShift => "<<=",
        RightShift => ">>=",
    }
}

fn component_int(value: &Value, i: usize) -> i64 {
    match *value {
        Value::Int(ref v) => v.get(i).map_or(0, |&x| x as i64),
        Value::Uint(ref v) => v.get(i).map_or(0, |&x| x as i64),
        Value::Float(ref v) => v.get(i).map_or(0, |&x| x as i64),
        Value::String(_) => 0,
    }
}

/// HLSL has no literal for NaN or infinity, so those are spelled as divisions.
fn float_literal(value: f32) -> String {
    if value.is_nan() {
        "(0.0f / 0.0f)".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "(1.0f / 0.0f)" } else { "(-1.0f / 0.0f)" }.to_string()
    } else {
        format!("{:?}f", value)
    }
}

fn component_float(value: &Value, i: usize) -> f32 {
    match *value {
        Value::Int(ref v) => v.get(i).map_or(0.0, |&x| x as f32),
        Value::Uint(ref v) => v.get(i).map_or(0.0, |&x| x as f32),
        Value::Float(ref v) => v.get(i).map_or(0.0, |&x| x),
        Value::String(_) => 0.0,
    }
}

/// Prints declarations, statements and expressions.
///
/// Output goes to whatever buffer the caller passes, so the same emitter can fill both the
/// shader body and the global constant buffer.
#[derive(Debug, Default)]
pub struct Emitter {
    /// 0 outside a `for` initializer, otherwise 1 + declarators printed so far.
    for_initializer: u32,
    parameter_block: bool,
    function_block: bool,
    /// Members of structs and constant buffers lose their `uniform` qualifier.
    strip_uniform: bool,
}

impl Emitter {
    pub fn new() -> Emitter {
        Emitter::default()
    }

    /// Qualifiers followed by the type name.
    pub fn type_with_qualifiers(&self, out: &mut String, ty: &Type) {
        out.push_str(&qualifier_prefix(ty, self.strip_uniform));
        out.push_str(&type_name(ty));
    }

    fn array_suffix(&self, out: &mut String, ty: &Type) {
        if ty.is_array() {
            out.push('[');
            if ty.array_length >= 1 {
                out.push_str(&ty.array_length.to_string());
            }
            out.push(']');
        }
    }

    /// Print a variable declaration.
    ///
    /// Outside of parameter lists and function bodies the declaration is terminated.
    pub fn variable(&mut self, out: &mut String, node: &Variable) {
        if self.for_initializer <= 1 {
            self.type_with_qualifiers(out, &node.ty);
        }
        out.push(' ');
        out.push_str(&node.name);
        self.array_suffix(out, &node.ty);
        if !node.semantic.is_empty() {
            out.push_str(" : ");
            out.push_str(&convert_semantic(&node.semantic));
        }
        if let Some(ref initializer) = node.initializer {
            out.push_str(" = ");
            self.expression(out, initializer);
        }
        if !(self.parameter_block || self.function_block) {
            out.push_str(";\n");
        }
    }

    /// Print a constant buffer member, optionally prefixed with the name of its block.
    ///
    /// Initial values are not printed, they live in the buffer contents.
    pub fn constant(&mut self, out: &mut String, node: &Variable, block: Option<&str>) {
        self.strip_uniform = true;
        self.type_with_qualifiers(out, &node.ty);
        self.strip_uniform = false;
        out.push(' ');
        if let Some(block) = block {
            out.push_str(block);
            out.push('_');
        }
        out.push_str(&node.name);
        self.array_suffix(out, &node.ty);
        out.push_str(";\n");
    }

    /// Print a struct definition.
    pub fn structure(&mut self, out: &mut String, node: &Struct) {
        out.push_str("struct ");
        out.push_str(&node.name);
        out.push_str("\n{\n");
        if node.fields.is_empty() {
            out.push_str("float _dummy;\n");
        } else {
            self.strip_uniform = true;
            for field in &node.fields {
                self.variable(out, field);
            }
            self.strip_uniform = false;
        }
        out.push_str("};\n");
    }

    /// Print a function definition.
    pub fn function(&mut self, out: &mut String, node: &Function) {
        self.type_with_qualifiers(out, &node.return_type);
        out.push(' ');
        out.push_str(&node.name);
        out.push('(');
        self.parameter_block = true;
        for (i, parameter) in node.parameters.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.variable(out, parameter);
        }
        self.parameter_block = false;
        out.push(')');
        if !node.return_semantic.is_empty() {
            out.push_str(" : ");
            out.push_str(&convert_semantic(&node.return_semantic));
        }
        out.push('\n');
        match node.definition {
            Some(ref body) => {
                self.function_block = true;
                self.statement(out, body);
                self.function_block = false;
            }
            None => out.push_str(";\n"),
        }
    }

    fn body(&mut self, out: &mut String, body: &Option<Box<Statement>>) {
        match *body {
            Some(ref statement) => self.statement(out, statement),
            None => out.push_str("\t;\n"),
        }
    }

    fn case(&mut self, out: &mut String, node: &Case) {
        for label in &node.labels {
            match *label {
                Some(ref value) => {
                    out.push_str("case ");
                    self.expression(out, value);
                    out.push_str(":\n");
                }
                None => out.push_str("default:\n"),
            }
        }
        self.statement(out, &node.body);
    }

    /// Print a statement.
    pub fn statement(&mut self, out: &mut String, node: &Statement) {
        for attribute in &node.attributes {
            out.push('[');
            out.push_str(attribute);
            out.push(']');
        }
        match node.kind {
            StatementKind::Compound(ref statements) => {
                out.push_str("{\n");
                for statement in statements {
                    self.statement(out, statement);
                }
                out.push_str("}\n");
            }
            StatementKind::DeclaratorList(ref declarators) => {
                for declarator in declarators {
                    self.variable(out, declarator);
                    if self.for_initializer > 0 {
                        out.push_str(", ");
                        self.for_initializer += 1;
                    } else {
                        out.push_str(";\n");
                    }
                }
            }
            StatementKind::Expression(ref expression) => {
                self.expression(out, expression);
                out.push_str(";\n");
            }
            StatementKind::If { ref condition, ref on_true, ref on_false } => {
                out.push_str("if (");
                self.expression(out, condition);
                out.push_str(")\n");
                self.body(out, on_true);
                if let Some(ref statement) = *on_false {
                    out.push_str("else\n");
                    self.statement(out, statement);
                }
            }
            StatementKind::Switch { ref test, ref cases } => {
                out.push_str("switch (");
                self.expression(out, test);
                out.push_str(")\n{\n");
                for case in cases {
                    self.case(out, case);
                }
                out.push_str("}\n");
            }
            StatementKind::For { ref initialization, ref condition, ref increment, ref body } => {
                out.push_str("for (");
                if let Some(ref init) = *initialization {
                    self.for_initializer = 1;
                    self.statement(out, init);
                    self.for_initializer = 0;
                    // drop the separator the initializer ended with
                    out.pop();
                    out.pop();
                }
                out.push_str("; ");
                if let Some(ref condition) = *condition {
                    self.expression(out, condition);
                }
                out.push_str("; ");
                if let Some(ref increment) = *increment {
                    self.expression(out, increment);
                }
                out.push_str(")\n");
                self.body(out, body);
            }
            StatementKind::While { ref condition, ref body, do_while } => {
                if do_while {
                    out.push_str("do\n");
                    self.body(out, body);
                    out.push_str("while (");
                    self.expression(out, condition);
                    out.push_str(");\n");
                } else {
                    out.push_str("while (");
                    self.expression(out, condition);
                    out.push_str(")\n");
                    self.body(out, body);
                }
            }
            StatementKind::Return { ref value, discard } => {
                if discard {
                    out.push_str("discard;\n");
                } else {
                    out.push_str("return");
                    if let Some(ref value) = *value {
                        out.push(' ');
                        self.expression(out, value);
                    }
                    out.push_str(";\n");
                }
            }
            StatementKind::Jump(Jump::Break) => out.push_str("break;\n"),
            StatementKind::Jump(Jump::Continue) => out.push_str("continue;\n"),
        }
    }

    fn list(&mut self, out: &mut String, items: &[Expression]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.expression(out, item);
        }
    }

    fn literal(&mut self, out: &mut String, ty: &Type, value: &Value) {
        if let Value::String(ref s) = *value {
            out.push('"');
            out.push_str(s);
            out.push('"');
            return;
        }
        let constructor = !ty.is_scalar();
        if constructor {
            out.push_str(&type_name(ty));
            out.push('(');
        }
        for i in 0 .. ty.components().max(1) as usize {
            if i > 0 {
                out.push_str(", ");
            }
            match ty.class {
                BaseClass::Bool => {
                    out.push_str(if component_int(value, i) != 0 { "true" } else { "false" })
                }
                BaseClass::Int | BaseClass::Uint => {
                    out.push_str(&component_int(value, i).to_string())
                }
                _ => out.push_str(&float_literal(component_float(value, i))),
            }
        }
        if constructor {
            out.push(')');
        }
    }

    /// Print an expression.
    pub fn expression(&mut self, out: &mut String, node: &Expression) {
        match node.kind {
            ExpressionKind::LValue(ref variable) => out.push_str(&variable.name),
            ExpressionKind::Literal(ref value) => self.literal(out, &node.ty, value),
            ExpressionKind::Sequence(ref expressions) => self.list(out, expressions),
            ExpressionKind::Unary(op, ref operand) => {
                match op {
                    UnaryOp::Negate => out.push('-'),
                    UnaryOp::BitwiseNot => out.push('~'),
                    UnaryOp::LogicalNot => out.push('!'),
                    UnaryOp::Increase => out.push_str("++"),
                    UnaryOp::Decrease => out.push_str("--"),
                    UnaryOp::Cast => {
                        out.push_str(&type_name(&node.ty));
                        out.push('(');
                    }
                    UnaryOp::PostIncrease | UnaryOp::PostDecrease => (),
                }
                self.expression(out, operand);
                match op {
                    UnaryOp::PostIncrease => out.push_str("++"),
                    UnaryOp::PostDecrease => out.push_str("--"),
                    UnaryOp::Cast => out.push(')'),
                    _ => (),
                }
            }
            ExpressionKind::Binary(BinaryOp::ElementExtract, ref left, ref right) => {
                self.expression(out, left);
                out.push('[');
                self.expression(out, right);
                out.push(']');
            }
            ExpressionKind::Binary(op, ref left, ref right) => {
                out.push('(');
                self.expression(out, left);
                out.push(' ');
                out.push_str(binary_operator(op));
                out.push(' ');
                self.expression(out, right);
                out.push(')');
            }
            ExpressionKind::Intrinsic(Intrinsic::Rcp, ref arguments) => {
                out.push_str("(1.0f / ");
                self.list(out, arguments);
                out.push(')');
            }
            ExpressionKind::Intrinsic(Intrinsic::Mad, ref arguments) if arguments.len() == 3 => {
                out.push_str("((");
                self.expression(out, &arguments[0]);
                out.push_str(") * (");
                self.expression(out, &arguments[1]);
                out.push_str(") + (");
                self.expression(out, &arguments[2]);
                out.push_str("))");
            }
            ExpressionKind::Intrinsic(op, ref arguments) => {
                out.push_str(intrinsic_name(op));
                out.push('(');
                self.list(out, arguments);
                out.push(')');
            }
            ExpressionKind::Conditional(ref condition, ref on_true, ref on_false) => {
                out.push('(');
                self.expression(out, condition);
                out.push_str(" ? ");
                self.expression(out, on_true);
                out.push_str(" : ");
                self.expression(out, on_false);
                out.push(')');
            }
            ExpressionKind::Swizzle(ref operand, mask) => {
                self.expression(out, operand);
                out.push('.');
                let matrix = operand.ty.is_matrix();
                for &m in mask.iter().take_while(|&&m| m >= 0) {
                    if matrix {
                        out.push_str(&format!("_m{}{}", m / 4, m % 4));
                    } else {
                        out.push(b"xyzw"[m as usize & 3] as char);
                    }
                }
            }
            ExpressionKind::FieldSelection(ref operand, ref field) => {
                out.push('(');
                self.expression(out, operand);
                out.push(if field.ty.has(Qualifiers::UNIFORM) { '_' } else { '.' });
                out.push_str(&field.name);
                out.push(')');
            }
            ExpressionKind::Assignment(op, ref left, ref right) => {
                out.push('(');
                self.expression(out, left);
                out.push(' ');
                out.push_str(assignment_operator(op));
                out.push(' ');
                self.expression(out, right);
                out.push(')');
            }
            ExpressionKind::Call(ref callee, ref arguments) => {
                out.push_str(&callee.name);
                out.push('(');
                self.list(out, arguments);
                out.push(')');
            }
            ExpressionKind::Constructor(ref arguments) => {
                out.push_str(&type_name(&node.ty));
                out.push('(');
                self.list(out, arguments);
                out.push(')');
            }
            ExpressionKind::InitializerList(ref values) => {
                out.push_str("{ ");
                for value in values {
                    self.expression(out, value);
                    out.push_str(", ");
                }
                out.push_str(" }");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::rc::Rc;

    fn float(name: &str) -> Rc<Variable> {
        Rc::new(Variable::new(name, Type::scalar(BaseClass::Float)))
    }

    fn print(e: &Expression) -> String {
        let mut out = String::new();
        Emitter::new().expression(&mut out, e);
        out
    }

    #[test]
    fn semantics() {
        assert_eq!(convert_semantic("COLOR"), "SV_TARGET");
        assert_eq!(convert_semantic("COLOR1"), "SV_TARGET1");
        assert_eq!(convert_semantic("VPOS"), "SV_POSITION");
        assert_eq!(convert_semantic("POSITION"), "SV_POSITION");
        assert_eq!(convert_semantic("VERTEXID"), "SV_VERTEXID");
        assert_eq!(convert_semantic("DEPTH"), "SV_DEPTH");
        assert_eq!(convert_semantic("TEXCOORD0"), "TEXCOORD0");
    }

    #[test]
    fn type_names() {
        assert_eq!(type_name(&Type::matrix(BaseClass::Float, 4, 3)), "float4x3");
        assert_eq!(type_name(&Type::vector(BaseClass::Int, 2)), "int2");
        assert_eq!(type_name(&Type::sampler()), "__sampler2D");
        assert_eq!(type_name(&Type::texture()), "Texture2D");
    }

    #[test]
    fn literals() {
        assert_eq!(print(&Expression::float(0.5)), "0.5f");
        assert_eq!(print(&Expression::int(-3)), "-3");
        let v = Expression::literal(Type::vector(BaseClass::Float, 2), Value::Float(vec![1.0, 2.0]));
        assert_eq!(print(&v), "float2(1.0f, 2.0f)");
        let b = Expression::literal(Type::scalar(BaseClass::Bool), Value::bools(&[true]));
        assert_eq!(print(&b), "true");
    }

    #[test]
    fn non_finite_floats() {
        assert_eq!(print(&Expression::float(std::f32::NAN)), "(0.0f / 0.0f)");
        assert_eq!(print(&Expression::float(std::f32::INFINITY)), "(1.0f / 0.0f)");
        let v = Expression::literal(Type::vector(BaseClass::Float, 2),
                                    Value::Float(vec![std::f32::NEG_INFINITY, 3.0]));
        assert_eq!(print(&v), "float2((-1.0f / 0.0f), 3.0f)");
    }

    #[test]
    fn operators() {
        let a = Expression::lvalue(&float("a"));
        let b = Expression::lvalue(&float("b"));
        let sum = Expression::binary(BinaryOp::Add, a.clone(), b.clone(), a.ty.clone());
        assert_eq!(print(&sum), "(a + b)");
        let rcp = Expression::intrinsic(Intrinsic::Rcp, vec![a.clone()], a.ty.clone());
        assert_eq!(print(&rcp), "(1.0f / a)");
        let mad = Expression::intrinsic(Intrinsic::Mad, vec![a.clone(), b.clone(), a.clone()], a.ty.clone());
        assert_eq!(print(&mad), "((a) * (b) + (a))");
        let assign = Expression::assign(AssignOp::Multiply, a.clone(), b);
        assert_eq!(print(&assign), "(a *= b)");
        let post = Expression::unary(UnaryOp::PostIncrease, a.clone(), a.ty.clone());
        assert_eq!(print(&post), "a++");
    }

    #[test]
    fn swizzles() {
        let v = Rc::new(Variable::new("v", Type::vector(BaseClass::Float, 4)));
        let m = Rc::new(Variable::new("m", Type::matrix(BaseClass::Float, 4, 4)));
        let zy = Expression::swizzle(Expression::lvalue(&v), [2, 1, -1, -1], Type::vector(BaseClass::Float, 2));
        assert_eq!(print(&zy), "v.zy");
        let m12 = Expression::swizzle(Expression::lvalue(&m), [6, -1, -1, -1], Type::scalar(BaseClass::Float));
        assert_eq!(print(&m12), "m._m12");
    }

    #[test]
    fn texture_intrinsics() {
        let s = Rc::new(Variable::new("s", Type::sampler()));
        let uv = Expression::literal(Type::vector(BaseClass::Float, 2), Value::Float(vec![0.5, 0.5]));
        let sample = Expression::intrinsic(Intrinsic::Tex2D, vec![Expression::lvalue(&s), uv],
                                           Type::vector(BaseClass::Float, 4));
        assert_eq!(print(&sample), "__tex2D(s, float2(0.5f, 0.5f))");
        let lod = Expression::intrinsic(Intrinsic::Tex2DLevel, vec![Expression::lvalue(&s)],
                                        Type::vector(BaseClass::Float, 4));
        assert!(print(&lod).starts_with("__tex2Dlod("));
    }

    #[test]
    fn block_field_selection() {
        let block = float("block");
        let member = Rc::new(Variable::new("x", Type::scalar(BaseClass::Float).qualified(Qualifiers::UNIFORM)));
        let plain = float("y");
        assert_eq!(print(&Expression::field(Expression::lvalue(&block), &member)), "(block_x)");
        assert_eq!(print(&Expression::field(Expression::lvalue(&block), &plain)), "(block.y)");
    }

    #[test]
    fn for_initializer_declares_once() {
        let i = Rc::new(Variable::new("i", Type::scalar(BaseClass::Int)).initializer(Expression::int(0)));
        let j = Rc::new(Variable::new("j", Type::scalar(BaseClass::Int)).initializer(Expression::int(1)));
        let condition = Expression::binary(BinaryOp::Less, Expression::lvalue(&i), Expression::int(4),
                                           Type::scalar(BaseClass::Bool));
        let increment = Expression::unary(UnaryOp::PostIncrease, Expression::lvalue(&i), i.ty.clone());
        let node = Statement::new(StatementKind::For {
            initialization: Some(Box::new(Statement::declare(vec![i, j]))),
            condition: Some(condition),
            increment: Some(increment),
            body: None,
        });
        let mut out = String::new();
        let mut emitter = Emitter::new();
        emitter.function_block = true;
        emitter.statement(&mut out, &node);
        assert_eq!(out, "for (int i = 0,  j = 1; (i < 4); i++)\n\t;\n");
    }

    #[test]
    fn block_members_are_prefixed() {
        let member = Variable::new("weights", Type::vector(BaseClass::Float, 3)
            .qualified(Qualifiers::UNIFORM).array(2))
            .initializer(Expression::float(1.0));
        let mut out = String::new();
        Emitter::new().constant(&mut out, &member, Some("Blur"));
        assert_eq!(out, "float3 Blur_weights[2];\n");
    }

    #[test]
    fn empty_struct_gets_a_member() {
        let mut out = String::new();
        Emitter::new().structure(&mut out, &Struct::new("Empty", Vec::new()));
        assert_eq!(out, "struct Empty\n{\nfloat _dummy;\n};\n");
    }

    #[test]
    fn functions() {
        let position = Rc::new(Variable::new("id", Type::scalar(BaseClass::Uint).qualified(Qualifiers::IN))
            .semantic("VERTEXID"));
        let body = Statement::compound(vec![Statement::ret(Some(Expression::literal(
            Type::vector(BaseClass::Float, 4), Value::Float(vec![0.0, 0.0, 0.0, 1.0]))))]);
        let f = Function::new(Type::vector(BaseClass::Float, 4), "VS", vec![position], "POSITION", body);
        let mut out = String::new();
        Emitter::new().function(&mut out, &f);
        assert_eq!(out, "float4 VS(in uint id : SV_VERTEXID) : SV_POSITION\n\
                         {\nreturn float4(0.0f, 0.0f, 0.0f, 1.0f);\n}\n");
    }
}
