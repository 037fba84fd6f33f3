//! Typed uniform blocks.
//!
//! A [`UniformLayout`] lists named fields in declaration order and computes
//! their offsets with WGSL's uniform address space rules. The same layout
//! renders the WGSL struct declaration that is prepended to the program's
//! source, so the CPU and GPU sides always agree.
//!
//! A [`UniformBlock`] stages values in CPU memory and tracks whether they
//! changed since the last upload.

use std::collections::HashMap;
use std::fmt::Write;

use glam::{IVec2, IVec3, IVec4, Mat4, Vec2, Vec3, Vec4};

/// Shader-side type of a uniform field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    I32,
    U32,
    /// Stored as a `u32` (0 or 1); WGSL booleans are not host-shareable.
    Bool,
    F32,
    Vec2,
    Vec3,
    Vec4,
    IVec2,
    IVec3,
    IVec4,
    Mat4,
}

impl UniformKind {
    pub fn size(self) -> u32 {
        match self {
            Self::I32 | Self::U32 | Self::Bool | Self::F32 => 4,
            Self::Vec2 | Self::IVec2 => 8,
            Self::Vec3 | Self::IVec3 => 12,
            Self::Vec4 | Self::IVec4 => 16,
            Self::Mat4 => 64,
        }
    }

    pub fn align(self) -> u32 {
        match self {
            Self::I32 | Self::U32 | Self::Bool | Self::F32 => 4,
            Self::Vec2 | Self::IVec2 => 8,
            Self::Vec3 | Self::IVec3 | Self::Vec4 | Self::IVec4 | Self::Mat4 => 16,
        }
    }

    pub fn wgsl_type(self) -> &'static str {
        match self {
            Self::I32 => "i32",
            Self::U32 | Self::Bool => "u32",
            Self::F32 => "f32",
            Self::Vec2 => "vec2<f32>",
            Self::Vec3 => "vec3<f32>",
            Self::Vec4 => "vec4<f32>",
            Self::IVec2 => "vec2<i32>",
            Self::IVec3 => "vec3<i32>",
            Self::IVec4 => "vec4<i32>",
            Self::Mat4 => "mat4x4<f32>",
        }
    }
}

/// A value passed to `set_uniform`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    I32(i32),
    U32(u32),
    Bool(bool),
    F32(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    IVec2(IVec2),
    IVec3(IVec3),
    IVec4(IVec4),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            Self::I32(_) => UniformKind::I32,
            Self::U32(_) => UniformKind::U32,
            Self::Bool(_) => UniformKind::Bool,
            Self::F32(_) => UniformKind::F32,
            Self::Vec2(_) => UniformKind::Vec2,
            Self::Vec3(_) => UniformKind::Vec3,
            Self::Vec4(_) => UniformKind::Vec4,
            Self::IVec2(_) => UniformKind::IVec2,
            Self::IVec3(_) => UniformKind::IVec3,
            Self::IVec4(_) => UniformKind::IVec4,
            Self::Mat4(_) => UniformKind::Mat4,
        }
    }

    fn write_to(&self, out: &mut [u8]) {
        match self {
            Self::I32(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            Self::U32(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            Self::Bool(v) => out.copy_from_slice(bytemuck::bytes_of(&u32::from(*v))),
            Self::F32(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            Self::Vec2(v) => out.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            Self::Vec3(v) => out.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            Self::Vec4(v) => out.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            Self::IVec2(v) => out.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            Self::IVec3(v) => out.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            Self::IVec4(v) => out.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            Self::Mat4(v) => out.copy_from_slice(bytemuck::cast_slice(&v.to_cols_array())),
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for UniformValue {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        })*
    };
}

impl_from_value! {
    i32 => I32,
    u32 => U32,
    bool => Bool,
    f32 => F32,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    IVec2 => IVec2,
    IVec3 => IVec3,
    IVec4 => IVec4,
    Mat4 => Mat4,
}

/// Why a uniform write was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniformError {
    #[error("The uniform named '{name}' is unknown.")]
    Unknown { name: String },

    #[error("uniform '{name}' is declared as {expected:?} but was given {found:?}")]
    KindMismatch {
        name: String,
        expected: UniformKind,
        found: UniformKind,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformField {
    pub name: String,
    pub kind: UniformKind,
    pub offset: u32,
}

/// Ordered uniform fields with their byte offsets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    end: u32,
}

impl UniformLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Names must be valid WGSL identifiers and unique.
    pub fn field(mut self, name: &str, kind: UniformKind) -> Self {
        debug_assert!(
            self.fields.iter().all(|f| f.name != name),
            "duplicate uniform '{name}'"
        );
        let offset = self.end.next_multiple_of(kind.align());
        self.end = offset + kind.size();
        self.fields.push(UniformField {
            name: name.to_string(),
            kind,
            offset,
        });
        self
    }

    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Buffer size: the struct end rounded up to 16 bytes, at least 16.
    pub fn size(&self) -> u32 {
        self.end.next_multiple_of(16).max(16)
    }

    /// WGSL declaration of the struct and its binding.
    pub fn wgsl(&self, struct_name: &str, var_name: &str, group: u32) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "struct {struct_name} {{");
        if self.fields.is_empty() {
            out.push_str("    _unused: vec4<f32>,\n");
        }
        for field in &self.fields {
            let _ = writeln!(out, "    {}: {},", field.name, field.kind.wgsl_type());
        }
        out.push_str("};\n");
        let _ = writeln!(
            out,
            "@group({group}) @binding(0) var<uniform> {var_name}: {struct_name};"
        );
        out
    }
}

/// CPU staging copy of a uniform buffer.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    layout: UniformLayout,
    lookup: HashMap<String, usize>,
    data: Vec<u8>,
    dirty: bool,
}

impl UniformBlock {
    pub fn new(layout: UniformLayout) -> Self {
        let lookup = layout
            .fields()
            .iter()
            .enumerate()
            .map(|(i, field)| (field.name.clone(), i))
            .collect();
        let data = vec![0; layout.size() as usize];
        Self {
            layout,
            lookup,
            data,
            dirty: true,
        }
    }

    /// Stage `value` for `name`. Rejected writes leave the block untouched.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<(), UniformError> {
        let value = value.into();
        let index = *self.lookup.get(name).ok_or_else(|| UniformError::Unknown {
            name: name.to_string(),
        })?;
        let field = &self.layout.fields()[index];
        if field.kind != value.kind() {
            return Err(UniformError::KindMismatch {
                name: name.to_string(),
                expected: field.kind,
                found: value.kind(),
            });
        }

        let start = field.offset as usize;
        let end = start + field.kind.size() as usize;
        let mut scratch = [0u8; 64];
        let staged = &mut scratch[..end - start];
        value.write_to(staged);
        if self.data[start..end] != *staged {
            self.data[start..end].copy_from_slice(staged);
            self.dirty = true;
        }
        Ok(())
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Staged bytes if they changed since the last call.
    pub fn take_dirty(&mut self) -> Option<&[u8]> {
        if self.dirty {
            self.dirty = false;
            Some(&self.data)
        } else {
            None
        }
    }
}
