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

//! Effect syntax tree.
//!
//! The parser hands the compiler a fully typed tree: every expression knows its type and every
//! name has been resolved to the declaration it refers to. Declarations are shared through
//! `Rc`, so a reference and its declaration are the same object.

#![allow(missing_docs)]

use std::fmt;
use std::rc::Rc;

use crate::ds::{BlendValue, Comparison, Equation, Factor, StencilOp};
use crate::MAX_RENDER_TARGETS;

/// Position of a node in the effect source.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Location {
    pub source: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new<S: Into<String>>(source: S, line: u32, column: u32) -> Location {
        Location { source: source.into(), line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({}, {})", self.source, self.line, self.column)
    }
}

bitflags!(
    /// Storage, interpolation and parameter qualifiers of a type.
    pub struct Qualifiers: u32 {
        const EXTERN          = 1 << 0;
        const STATIC          = 1 << 1;
        const UNIFORM         = 1 << 2;
        const VOLATILE        = 1 << 3;
        const PRECISE         = 1 << 4;
        const IN              = 1 << 5;
        const OUT             = 1 << 6;
        const INOUT           = Self::IN.bits | Self::OUT.bits;
        const CONST           = 1 << 8;
        const LINEAR          = 1 << 10;
        const NOPERSPECTIVE   = 1 << 11;
        const CENTROID        = 1 << 12;
        const NOINTERPOLATION = 1 << 13;
    }
);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BaseClass {
    Void,
    Bool,
    Int,
    Uint,
    Float,
    String,
    Texture2D,
    Sampler2D,
    Struct,
}

/// A fully resolved type.
///
/// Scalars are 1x1, vectors are Nx1 and matrices are RxC with C > 1. An array length of zero
/// means "not an array", a negative one means "unsized".
#[derive(Clone, Debug)]
pub struct Type {
    pub class: BaseClass,
    pub qualifiers: Qualifiers,
    pub rows: u32,
    pub cols: u32,
    pub array_length: i32,
    pub definition: Option<Rc<Struct>>,
}

impl Type {
    fn with_class(class: BaseClass, rows: u32, cols: u32) -> Type {
        Type {
            class,
            qualifiers: Qualifiers::empty(),
            rows,
            cols,
            array_length: 0,
            definition: None,
        }
    }

    pub fn void() -> Type {
        Type::with_class(BaseClass::Void, 0, 0)
    }

    pub fn scalar(class: BaseClass) -> Type {
        Type::with_class(class, 1, 1)
    }

    pub fn vector(class: BaseClass, size: u32) -> Type {
        Type::with_class(class, size, 1)
    }

    pub fn matrix(class: BaseClass, rows: u32, cols: u32) -> Type {
        Type::with_class(class, rows, cols)
    }

    pub fn texture() -> Type {
        Type::with_class(BaseClass::Texture2D, 0, 0)
    }

    pub fn sampler() -> Type {
        Type::with_class(BaseClass::Sampler2D, 0, 0)
    }

    pub fn string() -> Type {
        Type::with_class(BaseClass::String, 0, 0)
    }

    pub fn structure(definition: Rc<Struct>) -> Type {
        Type {
            definition: Some(definition),
            .. Type::with_class(BaseClass::Struct, 0, 0)
        }
    }

    /// Add qualifiers.
    pub fn qualified(mut self, qualifiers: Qualifiers) -> Type {
        self.qualifiers |= qualifiers;
        self
    }

    /// Turn into an array of the given length.
    pub fn array(mut self, length: i32) -> Type {
        self.array_length = length;
        self
    }

    pub fn has(&self, qualifiers: Qualifiers) -> bool {
        self.qualifiers.contains(qualifiers)
    }

    pub fn is_array(&self) -> bool {
        self.array_length != 0
    }

    pub fn is_matrix(&self) -> bool {
        self.rows >= 1 && self.cols > 1
    }

    pub fn is_vector(&self) -> bool {
        self.rows > 1 && !self.is_matrix()
    }

    pub fn is_scalar(&self) -> bool {
        !self.is_array() && !self.is_matrix() && !self.is_vector() && self.is_numeric()
    }

    pub fn is_numeric(&self) -> bool {
        match self.class {
            BaseClass::Bool | BaseClass::Int | BaseClass::Uint | BaseClass::Float => true,
            _ => false,
        }
    }

    pub fn is_struct(&self) -> bool {
        self.class == BaseClass::Struct
    }

    pub fn is_texture(&self) -> bool {
        self.class == BaseClass::Texture2D
    }

    pub fn is_sampler(&self) -> bool {
        self.class == BaseClass::Sampler2D
    }

    /// Number of scalar components, ignoring the array length.
    pub fn components(&self) -> u32 {
        self.rows * self.cols.max(1)
    }
}

/// Value of a literal or an annotation. Booleans are stored as integers.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(Vec<i32>),
    Uint(Vec<u32>),
    Float(Vec<f32>),
    String(String),
}

impl Value {
    pub fn bools(values: &[bool]) -> Value {
        Value::Int(values.iter().map(|&b| b as i32).collect())
    }

    /// Native-endian bytes of the first `size` bytes of the components, zero padded.
    pub fn to_bytes(&self, size: usize) -> Vec<u8> {
        let mut out: Vec<u8> = match *self {
            Value::Int(ref v) => v.iter().flat_map(|x| x.to_ne_bytes().to_vec()).collect(),
            Value::Uint(ref v) => v.iter().flat_map(|x| x.to_ne_bytes().to_vec()).collect(),
            Value::Float(ref v) => v.iter().flat_map(|x| x.to_ne_bytes().to_vec()).collect(),
            Value::String(ref s) => s.as_bytes().to_vec(),
        };
        out.resize(size, 0);
        out
    }
}

#[derive(Clone, Debug)]
pub struct Annotation {
    pub location: Location,
    pub name: String,
    pub value: Value,
}

impl Annotation {
    pub fn new<S: Into<String>>(name: S, value: Value) -> Annotation {
        Annotation { location: Location::default(), name: name.into(), value }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UnaryOp {
    Negate,
    BitwiseNot,
    LogicalNot,
    Increase,
    Decrease,
    PostIncrease,
    PostDecrease,
    /// Conversion to the type of the expression.
    Cast,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    Equal,
    NotEqual,
    LeftShift,
    RightShift,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    LogicalAnd,
    LogicalOr,
    /// `a[b]`
    ElementExtract,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AssignOp {
    None,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    LeftShift,
    RightShift,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Intrinsic {
    Abs,
    Acos,
    All,
    Any,
    BitCastInt2Float,
    BitCastUint2Float,
    Asin,
    BitCastFloat2Int,
    BitCastFloat2Uint,
    Atan,
    Atan2,
    Ceil,
    Clamp,
    Cos,
    Cosh,
    Cross,
    PartialDerivativeX,
    PartialDerivativeY,
    Degrees,
    Determinant,
    Distance,
    Dot,
    Exp,
    Exp2,
    FaceForward,
    Floor,
    Frac,
    Frexp,
    Fwidth,
    Ldexp,
    Length,
    Lerp,
    Log,
    Log10,
    Log2,
    Mad,
    Max,
    Min,
    Modf,
    Mul,
    Normalize,
    Pow,
    Radians,
    Rcp,
    Reflect,
    Refract,
    Round,
    Rsqrt,
    Saturate,
    Sign,
    Sin,
    SinCos,
    Sinh,
    SmoothStep,
    Sqrt,
    Step,
    Tan,
    Tanh,
    Tex2D,
    Tex2DFetch,
    Tex2DGather,
    Tex2DGatherOffset,
    Tex2DLevel,
    Tex2DLevelOffset,
    Tex2DOffset,
    Tex2DSize,
    Transpose,
    Trunc,
}

#[derive(Clone, Debug)]
pub struct Expression {
    pub location: Location,
    pub ty: Type,
    pub kind: ExpressionKind,
}

#[derive(Clone, Debug)]
pub enum ExpressionKind {
    LValue(Rc<Variable>),
    Literal(Value),
    Sequence(Vec<Expression>),
    Unary(UnaryOp, Box<Expression>),
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    Intrinsic(Intrinsic, Vec<Expression>),
    Conditional(Box<Expression>, Box<Expression>, Box<Expression>),
    /// Component indices, `-1` terminated when fewer than four. Matrix indices are
    /// `row * 4 + column`.
    Swizzle(Box<Expression>, [i8; 4]),
    FieldSelection(Box<Expression>, Rc<Variable>),
    Assignment(AssignOp, Box<Expression>, Box<Expression>),
    Call(Rc<Function>, Vec<Expression>),
    Constructor(Vec<Expression>),
    InitializerList(Vec<Expression>),
}

impl Expression {
    pub fn new(ty: Type, kind: ExpressionKind) -> Expression {
        Expression { location: Location::default(), ty, kind }
    }

    pub fn at(mut self, location: Location) -> Expression {
        self.location = location;
        self
    }

    pub fn lvalue(variable: &Rc<Variable>) -> Expression {
        Expression::new(variable.ty.clone(), ExpressionKind::LValue(variable.clone()))
    }

    pub fn literal(ty: Type, value: Value) -> Expression {
        Expression::new(ty, ExpressionKind::Literal(value))
    }

    pub fn float(value: f32) -> Expression {
        Expression::literal(Type::scalar(BaseClass::Float), Value::Float(vec![value]))
    }

    pub fn int(value: i32) -> Expression {
        Expression::literal(Type::scalar(BaseClass::Int), Value::Int(vec![value]))
    }

    pub fn unary(op: UnaryOp, operand: Expression, ty: Type) -> Expression {
        Expression::new(ty, ExpressionKind::Unary(op, Box::new(operand)))
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression, ty: Type) -> Expression {
        Expression::new(ty, ExpressionKind::Binary(op, Box::new(left), Box::new(right)))
    }

    pub fn intrinsic(op: Intrinsic, arguments: Vec<Expression>, ty: Type) -> Expression {
        Expression::new(ty, ExpressionKind::Intrinsic(op, arguments))
    }

    pub fn swizzle(operand: Expression, mask: [i8; 4], ty: Type) -> Expression {
        Expression::new(ty, ExpressionKind::Swizzle(Box::new(operand), mask))
    }

    pub fn field(operand: Expression, field: &Rc<Variable>) -> Expression {
        Expression::new(field.ty.clone(), ExpressionKind::FieldSelection(Box::new(operand), field.clone()))
    }

    pub fn assign(op: AssignOp, left: Expression, right: Expression) -> Expression {
        let ty = left.ty.clone();
        Expression::new(ty, ExpressionKind::Assignment(op, Box::new(left), Box::new(right)))
    }

    pub fn call(callee: &Rc<Function>, arguments: Vec<Expression>) -> Expression {
        Expression::new(callee.return_type.clone(), ExpressionKind::Call(callee.clone(), arguments))
    }

    pub fn constructor(ty: Type, arguments: Vec<Expression>) -> Expression {
        Expression::new(ty, ExpressionKind::Constructor(arguments))
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Jump {
    Break,
    Continue,
}

#[derive(Clone, Debug)]
pub struct Case {
    pub location: Location,
    /// `None` stands for `default`.
    pub labels: Vec<Option<Expression>>,
    pub body: Statement,
}

#[derive(Clone, Debug)]
pub struct Statement {
    pub location: Location,
    pub attributes: Vec<String>,
    pub kind: StatementKind,
}

#[derive(Clone, Debug)]
pub enum StatementKind {
    Compound(Vec<Statement>),
    DeclaratorList(Vec<Rc<Variable>>),
    Expression(Expression),
    If {
        condition: Expression,
        on_true: Option<Box<Statement>>,
        on_false: Option<Box<Statement>>,
    },
    Switch {
        test: Expression,
        cases: Vec<Case>,
    },
    For {
        initialization: Option<Box<Statement>>,
        condition: Option<Expression>,
        increment: Option<Expression>,
        body: Option<Box<Statement>>,
    },
    While {
        condition: Expression,
        body: Option<Box<Statement>>,
        do_while: bool,
    },
    Return {
        value: Option<Expression>,
        discard: bool,
    },
    Jump(Jump),
}

impl Statement {
    pub fn new(kind: StatementKind) -> Statement {
        Statement { location: Location::default(), attributes: Vec::new(), kind }
    }

    pub fn compound(statements: Vec<Statement>) -> Statement {
        Statement::new(StatementKind::Compound(statements))
    }

    pub fn declare(variables: Vec<Rc<Variable>>) -> Statement {
        Statement::new(StatementKind::DeclaratorList(variables))
    }

    pub fn expression(expression: Expression) -> Statement {
        Statement::new(StatementKind::Expression(expression))
    }

    pub fn ret(value: Option<Expression>) -> Statement {
        Statement::new(StatementKind::Return { value, discard: false })
    }

    pub fn discard() -> Statement {
        Statement::new(StatementKind::Return { value: None, discard: true })
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureFormat {
    Unknown,
    R8,
    R32F,
    RG8,
    RGBA8,
    RGBA16,
    RGBA16F,
    RGBA32F,
    DXT1,
    DXT3,
    DXT5,
    LATC1,
    LATC2,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureFilter {
    Point,
    Linear,
    Anisotropic,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TextureAddressMode {
    Wrap,
    Mirror,
    Clamp,
    Border,
}

/// Texture and sampler properties attached to a declaration.
#[derive(Clone, Debug)]
pub struct Properties {
    pub texture: Option<Rc<Variable>>,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub mip_levels: u32,
    pub format: TextureFormat,
    pub srgb_texture: bool,
    pub address_u: TextureAddressMode,
    pub address_v: TextureAddressMode,
    pub address_w: TextureAddressMode,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub mip_filter: TextureFilter,
    pub mip_lod_bias: f32,
    pub min_lod: f32,
    pub max_lod: f32,
    pub max_anisotropy: u32,
}

impl Default for Properties {
    fn default() -> Properties {
        Properties {
            texture: None,
            width: 1,
            height: 1,
            depth: 1,
            mip_levels: 1,
            format: TextureFormat::RGBA8,
            srgb_texture: false,
            address_u: TextureAddressMode::Clamp,
            address_v: TextureAddressMode::Clamp,
            address_w: TextureAddressMode::Clamp,
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            mip_filter: TextureFilter::Linear,
            mip_lod_bias: 0.0,
            min_lod: 0.0,
            max_lod: std::f32::MAX,
            max_anisotropy: 1,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Variable {
    pub location: Location,
    pub ty: Type,
    pub name: String,
    pub semantic: String,
    pub annotations: Vec<Annotation>,
    pub initializer: Option<Expression>,
    pub properties: Properties,
}

impl Variable {
    pub fn new<S: Into<String>>(name: S, ty: Type) -> Variable {
        Variable {
            location: Location::default(),
            ty,
            name: name.into(),
            semantic: String::new(),
            annotations: Vec::new(),
            initializer: None,
            properties: Properties::default(),
        }
    }

    pub fn at(mut self, location: Location) -> Variable {
        self.location = location;
        self
    }

    pub fn semantic<S: Into<String>>(mut self, semantic: S) -> Variable {
        self.semantic = semantic.into();
        self
    }

    pub fn initializer(mut self, value: Expression) -> Variable {
        self.initializer = Some(value);
        self
    }

    pub fn properties(mut self, properties: Properties) -> Variable {
        self.properties = properties;
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Variable {
        self.annotations.push(annotation);
        self
    }
}

#[derive(Clone, Debug)]
pub struct Struct {
    pub location: Location,
    pub name: String,
    pub fields: Vec<Rc<Variable>>,
}

impl Struct {
    pub fn new<S: Into<String>>(name: S, fields: Vec<Rc<Variable>>) -> Struct {
        Struct { location: Location::default(), name: name.into(), fields }
    }
}

#[derive(Clone, Debug)]
pub struct Function {
    pub location: Location,
    pub return_type: Type,
    pub name: String,
    pub parameters: Vec<Rc<Variable>>,
    pub return_semantic: String,
    /// Body, a compound statement. `None` for prototypes.
    pub definition: Option<Statement>,
}

impl Function {
    pub fn new<S: Into<String>>(return_type: Type, name: S, parameters: Vec<Rc<Variable>>,
                                return_semantic: &str, definition: Statement) -> Function {
        Function {
            location: Location::default(),
            return_type,
            name: name.into(),
            parameters,
            return_semantic: return_semantic.to_string(),
            definition: Some(definition),
        }
    }
}

/// Fixed-function state of a pass.
#[derive(Clone, Debug)]
pub struct PassStates {
    pub vertex_shader: Option<Rc<Function>>,
    pub pixel_shader: Option<Rc<Function>>,
    pub render_targets: [Option<Rc<Variable>>; MAX_RENDER_TARGETS],
    pub srgb_write_enable: bool,
    pub blend_enable: bool,
    pub blend_op: Equation,
    pub blend_op_alpha: Equation,
    pub src_blend: Factor,
    pub dest_blend: Factor,
    pub render_target_write_mask: u8,
    pub depth_enable: bool,
    pub depth_write_mask: bool,
    pub depth_func: Comparison,
    pub stencil_enable: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
    pub stencil_func: Comparison,
    pub stencil_op_pass: StencilOp,
    pub stencil_op_fail: StencilOp,
    pub stencil_op_depth_fail: StencilOp,
    pub stencil_ref: u32,
}

impl Default for PassStates {
    fn default() -> PassStates {
        PassStates {
            vertex_shader: None,
            pixel_shader: None,
            render_targets: Default::default(),
            srgb_write_enable: false,
            blend_enable: false,
            blend_op: Equation::Add,
            blend_op_alpha: Equation::Add,
            src_blend: Factor::One,
            dest_blend: Factor::Zero,
            render_target_write_mask: 0xF,
            depth_enable: false,
            depth_write_mask: true,
            depth_func: Comparison::Less,
            stencil_enable: false,
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
            stencil_func: Comparison::Always,
            stencil_op_pass: StencilOp::Keep,
            stencil_op_fail: StencilOp::Keep,
            stencil_op_depth_fail: StencilOp::Keep,
            stencil_ref: 0,
        }
    }
}

impl PassStates {
    /// Standard "source over" alpha blending.
    pub fn alpha_blended(mut self) -> PassStates {
        self.blend_enable = true;
        self.src_blend = Factor::ZeroPlus(BlendValue::SourceAlpha);
        self.dest_blend = Factor::OneMinus(BlendValue::SourceAlpha);
        self
    }
}

#[derive(Clone, Debug)]
pub struct Pass {
    pub location: Location,
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub states: PassStates,
}

impl Pass {
    pub fn new<S: Into<String>>(name: S, states: PassStates) -> Pass {
        Pass { location: Location::default(), name: name.into(), annotations: Vec::new(), states }
    }
}

#[derive(Clone, Debug)]
pub struct Technique {
    pub location: Location,
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub passes: Vec<Pass>,
}

impl Technique {
    pub fn new<S: Into<String>>(name: S, passes: Vec<Pass>) -> Technique {
        Technique { location: Location::default(), name: name.into(), annotations: Vec::new(), passes }
    }
}

/// A whole effect, in declaration order within each kind.
#[derive(Clone, Debug, Default)]
pub struct Tree {
    pub structs: Vec<Rc<Struct>>,
    pub variables: Vec<Rc<Variable>>,
    pub functions: Vec<Rc<Function>>,
    pub techniques: Vec<Technique>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_shapes() {
        assert!(Type::scalar(BaseClass::Float).is_scalar());
        assert!(Type::vector(BaseClass::Float, 4).is_vector());
        assert!(Type::matrix(BaseClass::Float, 4, 4).is_matrix());
        assert!(!Type::matrix(BaseClass::Float, 4, 4).is_vector());
        assert!(!Type::scalar(BaseClass::Float).array(3).is_scalar());
        assert!(!Type::texture().is_numeric());
    }

    #[test]
    fn value_bytes_are_padded() {
        let bytes = Value::Float(vec![0.5]).to_bytes(8);
        assert_eq!(&bytes[..4], &0.5f32.to_ne_bytes());
        assert_eq!(&bytes[4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn location_display() {
        assert_eq!(Location::new("fx.fx", 3, 7).to_string(), "fx.fx(3, 7)");
    }
}
