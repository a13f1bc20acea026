// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value types that flow through operator slots.
//!
//! A slot declares a [`ValueType`], which may carry semantic meaning
//! (a [`ValueType::Position`] is not the same thing as a plain
//! [`ValueType::Vector3`]). Every declared type maps onto a base
//! [`ValueLayout`], and literal [`Value`]s are always stored in that layout.

use serde::{Deserialize, Serialize};

/// Base numeric layout of a value, independent of its semantic meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueLayout {
    /// Signed 32-bit integer
    Int32,
    /// Unsigned 32-bit integer
    Uint32,
    /// Single float
    Float,
    /// Two float channels
    Float2,
    /// Three float channels
    Float3,
    /// Four float channels
    Float4,
    /// Column-major 4x4 float matrix
    Matrix4x4,
    /// Boolean
    Bool,
}

impl ValueLayout {
    /// Number of scalar channels stored by this layout
    pub fn channel_count(self) -> usize {
        match self {
            Self::Int32 | Self::Uint32 | Self::Float | Self::Bool => 1,
            Self::Float2 => 2,
            Self::Float3 => 3,
            Self::Float4 => 4,
            Self::Matrix4x4 => 16,
        }
    }

    /// Whether this layout stores an integer
    pub fn is_integer(self) -> bool {
        matches!(self, Self::Int32 | Self::Uint32)
    }

    /// Whether this layout is a scalar or a float vector
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Matrix4x4 | Self::Bool)
    }

    /// Float layout holding `channels` channels, if one exists
    pub fn float_with_channels(channels: usize) -> Option<Self> {
        match channels {
            1 => Some(Self::Float),
            2 => Some(Self::Float2),
            3 => Some(Self::Float3),
            4 => Some(Self::Float4),
            _ => None,
        }
    }
}

/// Declared type of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// 4x4 matrix
    Matrix4x4,
    /// 4D vector
    Vector4,
    /// RGBA color (4D payload)
    Color,
    /// 3D vector
    Vector3,
    /// Point in space (3D payload)
    Position,
    /// Unit direction (3D payload, normalized on evaluation)
    Direction,
    /// Free vector such as a velocity (3D payload)
    Vector,
    /// 2D vector
    Vector2,
    /// Floating point scalar
    Float,
    /// Signed integer
    Int32,
    /// Unsigned integer
    Uint32,
    /// Boolean
    Bool,
    /// Legacy polymorphic 1 to 4 channel float, only declared by deprecated operators
    FloatN,
}

impl ValueType {
    /// Every canonical type, in the fixed order used to break affinity ties.
    ///
    /// [`ValueType::FloatN`] is deliberately absent: it only exists on
    /// deprecated operators and never takes part in affinity ranking.
    pub const UNIVERSE: [ValueType; 12] = [
        ValueType::Matrix4x4,
        ValueType::Vector4,
        ValueType::Color,
        ValueType::Vector3,
        ValueType::Position,
        ValueType::Direction,
        ValueType::Vector,
        ValueType::Vector2,
        ValueType::Float,
        ValueType::Int32,
        ValueType::Uint32,
        ValueType::Bool,
    ];

    /// Base layout of this type.
    ///
    /// `FloatN` reports the widest layout a legacy value may take; the actual
    /// width of a legacy literal is carried by [`Value::FloatN`].
    pub fn layout(self) -> ValueLayout {
        match self {
            Self::Matrix4x4 => ValueLayout::Matrix4x4,
            Self::Vector4 | Self::Color | Self::FloatN => ValueLayout::Float4,
            Self::Vector3 | Self::Position | Self::Direction | Self::Vector => ValueLayout::Float3,
            Self::Vector2 => ValueLayout::Float2,
            Self::Float => ValueLayout::Float,
            Self::Int32 => ValueLayout::Int32,
            Self::Uint32 => ValueLayout::Uint32,
            Self::Bool => ValueLayout::Bool,
        }
    }

    /// Number of channels of the base layout
    pub fn channel_count(self) -> usize {
        self.layout().channel_count()
    }

    /// Whether this is an integer type
    pub fn is_integer(self) -> bool {
        matches!(self, Self::Int32 | Self::Uint32)
    }

    /// Whether this is a scalar (`Int32`, `Uint32` or `Float`)
    pub fn is_scalar(self) -> bool {
        matches!(self, Self::Int32 | Self::Uint32 | Self::Float)
    }

    /// Whether this is a plain float vector without spatial meaning
    pub fn is_plain_vector(self) -> bool {
        matches!(self, Self::Vector2 | Self::Vector3 | Self::Vector4 | Self::Color)
    }

    /// Whether this is a spatial composite (`Position`, `Direction`, `Vector`)
    pub fn is_spatial(self) -> bool {
        matches!(self, Self::Position | Self::Direction | Self::Vector)
    }

    /// Whether values of this type take part in arithmetic
    pub fn is_numeric(self) -> bool {
        self.is_scalar() || self.is_plain_vector() || self.is_spatial() || self == Self::FloatN
    }

    /// Plain type that represents a float value with `channels` channels
    pub fn float_with_channels(channels: usize) -> Option<Self> {
        match channels {
            1 => Some(Self::Float),
            2 => Some(Self::Vector2),
            3 => Some(Self::Vector3),
            4 => Some(Self::Vector4),
            _ => None,
        }
    }

    /// Human readable name
    pub fn name(self) -> &'static str {
        match self {
            Self::Matrix4x4 => "Matrix4x4",
            Self::Vector4 => "Vector4",
            Self::Color => "Color",
            Self::Vector3 => "Vector3",
            Self::Position => "Position",
            Self::Direction => "Direction",
            Self::Vector => "Vector",
            Self::Vector2 => "Vector2",
            Self::Float => "float",
            Self::Int32 => "int",
            Self::Uint32 => "uint",
            Self::Bool => "bool",
            Self::FloatN => "FloatN",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Literal value stored in a slot or produced by evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Signed integer
    Int32(i32),
    /// Unsigned integer
    Uint32(u32),
    /// Float
    Float(f32),
    /// 2D float vector
    Float2([f32; 2]),
    /// 3D float vector
    Float3([f32; 3]),
    /// 4D float vector
    Float4([f32; 4]),
    /// Column-major 4x4 matrix
    Matrix4x4([f32; 16]),
    /// Boolean
    Bool(bool),
    /// Legacy polymorphic float with 1 to 4 channels
    FloatN(Vec<f32>),
}

impl Value {
    /// Zero value of a declared type
    pub fn zero(value_type: ValueType) -> Self {
        match value_type {
            ValueType::FloatN => Self::FloatN(vec![0.0]),
            other => Self::zero_of_layout(other.layout()),
        }
    }

    /// Zero value of a layout
    pub fn zero_of_layout(layout: ValueLayout) -> Self {
        match layout {
            ValueLayout::Int32 => Self::Int32(0),
            ValueLayout::Uint32 => Self::Uint32(0),
            ValueLayout::Float => Self::Float(0.0),
            ValueLayout::Float2 => Self::Float2([0.0; 2]),
            ValueLayout::Float3 => Self::Float3([0.0; 3]),
            ValueLayout::Float4 => Self::Float4([0.0; 4]),
            ValueLayout::Matrix4x4 => Self::Matrix4x4([0.0; 16]),
            ValueLayout::Bool => Self::Bool(false),
        }
    }

    /// Build a float value from raw channels; missing channels read as `pad`
    pub fn from_channels(layout: ValueLayout, channels: &[f32], pad: f32) -> Self {
        let at = |i: usize| channels.get(i).copied().unwrap_or(pad);
        match layout {
            ValueLayout::Int32 => Self::Int32(at(0) as i32),
            ValueLayout::Uint32 => Self::Uint32(at(0) as u32),
            ValueLayout::Float => Self::Float(at(0)),
            ValueLayout::Float2 => Self::Float2([at(0), at(1)]),
            ValueLayout::Float3 => Self::Float3([at(0), at(1), at(2)]),
            ValueLayout::Float4 => Self::Float4([at(0), at(1), at(2), at(3)]),
            ValueLayout::Matrix4x4 => {
                let mut m = [0.0; 16];
                for (i, slot) in m.iter_mut().enumerate() {
                    *slot = at(i);
                }
                Self::Matrix4x4(m)
            }
            ValueLayout::Bool => Self::Bool(at(0) != 0.0),
        }
    }

    /// Layout of this value
    pub fn layout(&self) -> ValueLayout {
        match self {
            Self::Int32(_) => ValueLayout::Int32,
            Self::Uint32(_) => ValueLayout::Uint32,
            Self::Float(_) => ValueLayout::Float,
            Self::Float2(_) => ValueLayout::Float2,
            Self::Float3(_) => ValueLayout::Float3,
            Self::Float4(_) => ValueLayout::Float4,
            Self::Matrix4x4(_) => ValueLayout::Matrix4x4,
            Self::Bool(_) => ValueLayout::Bool,
            Self::FloatN(v) => ValueLayout::float_with_channels(v.len()).unwrap_or(ValueLayout::Float4),
        }
    }

    /// Whether this value holds a single channel
    pub fn is_scalar(&self) -> bool {
        match self {
            Self::Int32(_) | Self::Uint32(_) | Self::Float(_) | Self::Bool(_) => true,
            Self::FloatN(v) => v.len() <= 1,
            _ => false,
        }
    }

    /// Channels of this value widened to `f32`
    pub fn channels(&self) -> Vec<f32> {
        match self {
            Self::Int32(v) => vec![*v as f32],
            Self::Uint32(v) => vec![*v as f32],
            Self::Float(v) => vec![*v],
            Self::Float2(v) => v.to_vec(),
            Self::Float3(v) => v.to_vec(),
            Self::Float4(v) => v.to_vec(),
            Self::Matrix4x4(v) => v.to_vec(),
            Self::Bool(v) => vec![if *v { 1.0 } else { 0.0 }],
            Self::FloatN(v) => v.clone(),
        }
    }

    /// Convert this value to `layout`.
    ///
    /// Scalars broadcast to every channel, vectors are truncated or extended
    /// with `pad`, and integer/float casts follow `as` semantics. Integer to
    /// integer conversions never round-trip through `f32`. Returns `None`
    /// when the shapes cannot be converted (booleans and matrices only
    /// convert to themselves).
    pub fn convert(&self, layout: ValueLayout, pad: f32) -> Option<Value> {
        if self.layout() == layout && !matches!(self, Self::FloatN(_)) {
            return Some(self.clone());
        }
        let source = self.layout();
        if !source.is_numeric() || !layout.is_numeric() {
            return None;
        }

        match (self, layout) {
            (Self::Int32(v), ValueLayout::Uint32) => return Some(Self::Uint32(*v as u32)),
            (Self::Uint32(v), ValueLayout::Int32) => return Some(Self::Int32(*v as i32)),
            _ => {}
        }

        let channels = self.channels();
        if self.is_scalar() {
            let x = channels.first().copied().unwrap_or(0.0);
            let broadcast = vec![x; layout.channel_count()];
            return Some(Self::from_channels(layout, &broadcast, pad));
        }
        Some(Self::from_channels(layout, &channels, pad))
    }

    /// Convert this value so it can be stored in a slot of `value_type`
    pub fn convert_to_type(&self, value_type: ValueType, pad: f32) -> Option<Value> {
        if value_type == ValueType::FloatN {
            return self.layout().is_numeric().then(|| Self::FloatN(self.channels()));
        }
        self.convert(value_type.layout(), pad)
    }

    /// Scalar float view (first channel)
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int32(v) => Some(*v as f32),
            Self::Uint32(v) => Some(*v as f32),
            Self::FloatN(v) => v.first().copied(),
            _ => None,
        }
    }

    /// Signed integer view
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Unsigned integer view
    pub fn as_uint(&self) -> Option<u32> {
        match self {
            Self::Uint32(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean view
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// 2D vector view
    pub fn as_float2(&self) -> Option<[f32; 2]> {
        match self {
            Self::Float2(v) => Some(*v),
            _ => None,
        }
    }

    /// 3D vector view
    pub fn as_float3(&self) -> Option<[f32; 3]> {
        match self {
            Self::Float3(v) => Some(*v),
            _ => None,
        }
    }

    /// 4D vector view
    pub fn as_float4(&self) -> Option<[f32; 4]> {
        match self {
            Self::Float4(v) => Some(*v),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Float(0.0)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Uint32(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<[f32; 2]> for Value {
    fn from(v: [f32; 2]) -> Self {
        Self::Float2(v)
    }
}

impl From<[f32; 3]> for Value {
    fn from(v: [f32; 3]) -> Self {
        Self::Float3(v)
    }
}

impl From<[f32; 4]> for Value {
    fn from(v: [f32; 4]) -> Self {
        Self::Float4(v)
    }
}
