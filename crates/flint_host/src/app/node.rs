use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::math::{Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexChannel {
    Position,
    Normal,
    Tangent,
    Binormal,
    Color,
    Uv0,
    Uv1,
}

impl VertexChannel {
    pub const fn component_count(self) -> usize {
        match self {
            VertexChannel::Position
            | VertexChannel::Normal
            | VertexChannel::Tangent
            | VertexChannel::Binormal => 3,
            VertexChannel::Color => 4,
            VertexChannel::Uv0 | VertexChannel::Uv1 => 2,
        }
    }
}

/// Interleaved vertex data laid out per `layout`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryDesc {
    pub layout: Vec<VertexChannel>,
    pub vertices: Vec<f32>,
    #[serde(default)]
    pub indices: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("geometry layout is empty")]
    EmptyLayout,
    #[error("geometry layout repeats channel {0:?}")]
    DuplicateChannel(VertexChannel),
    #[error("vertex data length {len} is not a multiple of the vertex stride {stride}")]
    RaggedVertices { len: usize, stride: usize },
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        index: u16,
        position: usize,
        vertex_count: usize,
    },
}

impl GeometryDesc {
    pub fn stride(&self) -> usize {
        self.layout
            .iter()
            .map(|channel| channel.component_count())
            .sum()
    }

    pub fn vertex_count(&self) -> usize {
        let stride = self.stride();
        if stride == 0 {
            return 0;
        }
        self.vertices.len() / stride
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.layout.is_empty() {
            return Err(GeometryError::EmptyLayout);
        }
        for (position, channel) in self.layout.iter().enumerate() {
            if self.layout[..position].contains(channel) {
                return Err(GeometryError::DuplicateChannel(*channel));
            }
        }
        let stride = self.stride();
        if self.vertices.len() % stride != 0 {
            return Err(GeometryError::RaggedVertices {
                len: self.vertices.len(),
                stride,
            });
        }
        let vertex_count = self.vertex_count();
        for (position, &index) in self.indices.iter().enumerate() {
            if index as usize >= vertex_count {
                return Err(GeometryError::IndexOutOfRange {
                    index,
                    position,
                    vertex_count,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDesc {
    pub vertex_source: String,
    pub fragment_source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureDesc {
    pub path: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub cube: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniformValue {
    Float(f32),
    Vec4(Vec4),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextDesc {
    pub value: String,
    pub color: Vec4,
    pub size: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listeners {
    #[serde(default)]
    pub frame: bool,
    #[serde(default)]
    pub gaze_hover: bool,
    #[serde(default)]
    pub gesture: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDesc {
    pub name: Option<String>,
    pub geometry: Option<GeometryDesc>,
    pub program: Option<ProgramDesc>,
    pub texture: Option<TextureDesc>,
    pub transform: Transform,
    pub uniforms: BTreeMap<String, UniformValue>,
    pub text: Option<TextDesc>,
    pub listeners: Listeners,
    pub children: Vec<NodeDesc>,
}

impl NodeDesc {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_geometry(mut self, geometry: GeometryDesc) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_program(mut self, program: ProgramDesc) -> Self {
        self.program = Some(program);
        self
    }

    pub fn with_uniform(mut self, name: impl Into<String>, value: UniformValue) -> Self {
        self.uniforms.insert(name.into(), value);
        self
    }

    pub fn with_text(mut self, text: TextDesc) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_listeners(mut self, listeners: Listeners) -> Self {
        self.listeners = listeners;
        self
    }

    pub fn with_child(mut self, child: NodeDesc) -> Self {
        self.children.push(child);
        self
    }
}
