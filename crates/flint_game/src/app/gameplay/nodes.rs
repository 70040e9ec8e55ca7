use flint_host::{
    GeometryDesc, Listeners, NodeDesc, ProgramDesc, TextDesc, UniformValue, VertexChannel,
};

use crate::app::config::{MenuConfig, SpawnerConfig};

pub(crate) const MENU_NODE_NAME: &str = "menu";
pub(crate) const GAME_NODE_NAME: &str = "game";

const COLOR_VERTEX_SHADER: &str = "#version 300 es
in vec3 Position;
in vec4 VertexColor;
uniform mat4 Modelm;
uniform mat4 Viewm;
uniform mat4 Projectionm;
out vec4 fragmentColor;
void main()
{
 gl_Position = Projectionm * (Viewm * (Modelm * vec4(Position, 1.0)));
 fragmentColor = VertexColor;
}";

const COLOR_FRAGMENT_SHADER: &str = "#version 300 es
in lowp vec4 fragmentColor;
out lowp vec4 outColor;
void main()
{
 outColor = fragmentColor;
}";

#[rustfmt::skip]
const BOX_INDICES: [u16; 36] = [
    0, 1, 2, 2, 3, 0, // top
    4, 5, 6, 6, 7, 4, // bottom
    2, 6, 7, 7, 1, 2, // right
    0, 4, 5, 5, 3, 0, // left
    3, 5, 6, 6, 2, 3, // front
    0, 1, 7, 7, 4, 0, // back
];

pub(crate) fn color_program() -> ProgramDesc {
    ProgramDesc {
        vertex_source: COLOR_VERTEX_SHADER.to_string(),
        fragment_source: COLOR_FRAGMENT_SHADER.to_string(),
    }
}

/// Axis-aligned cube centered on the origin, positions only.
pub(crate) fn box_geometry(size: f32) -> GeometryDesc {
    let s = size / 2.0;
    let corners: [[f32; 3]; 8] = [
        [-s, s, -s],
        [s, s, -s],
        [s, s, s],
        [-s, s, s],
        [-s, -s, -s],
        [-s, -s, s],
        [s, -s, s],
        [s, -s, -s],
    ];
    GeometryDesc {
        layout: vec![VertexChannel::Position],
        vertices: corners.iter().flatten().copied().collect(),
        indices: BOX_INDICES.to_vec(),
    }
}

pub(crate) fn menu_node(menu: &MenuConfig) -> NodeDesc {
    NodeDesc::named(MENU_NODE_NAME)
        .with_position(menu.position)
        .with_text(TextDesc {
            value: menu.label.clone(),
            color: menu.text_color,
            size: menu.text_size,
        })
        .with_listeners(Listeners {
            gaze_hover: true,
            gesture: true,
            ..Listeners::default()
        })
}

/// Empty container that enemies hang off; it carries the frame listener so
/// frames only arrive while the game screen is attached.
pub(crate) fn game_node() -> NodeDesc {
    NodeDesc::named(GAME_NODE_NAME).with_listeners(Listeners {
        frame: true,
        ..Listeners::default()
    })
}

pub(crate) fn enemy_node(spawner: &SpawnerConfig, session: u32, index: usize) -> NodeDesc {
    NodeDesc::named(format!("enemy-{session}-{index}"))
        .with_geometry(box_geometry(spawner.box_size))
        .with_program(color_program())
        .with_position(spawner.spawn_position)
        .with_uniform("color", UniformValue::Vec4(spawner.color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_geometry_is_valid_cube() {
        let geometry = box_geometry(2.0);
        geometry.validate().expect("valid cube");
        assert_eq!(geometry.vertex_count(), 8);
        assert_eq!(geometry.indices.len(), 36);
        assert!(geometry.vertices.iter().all(|value| value.abs() == 1.0));
    }

    #[test]
    fn enemy_node_starts_far_away_in_red() {
        let spawner = SpawnerConfig::default();
        let desc = enemy_node(&spawner, 1, 3);
        assert_eq!(desc.name.as_deref(), Some("enemy-1-3"));
        assert_eq!(desc.transform.position, spawner.spawn_position);
        assert_eq!(
            desc.uniforms.get("color"),
            Some(&UniformValue::Vec4(spawner.color))
        );
        assert!(desc.program.is_some());
        assert_eq!(desc.listeners, Listeners::default());
    }

    #[test]
    fn menu_node_listens_for_gaze_and_gestures_only() {
        let desc = menu_node(&MenuConfig::default());
        let text = desc.text.as_ref().expect("menu text");
        assert_eq!(text.value, "Start Game");
        assert_eq!(text.size, 12.0);
        assert!(desc.listeners.gaze_hover && desc.listeners.gesture);
        assert!(!desc.listeners.frame);
        assert!(game_node().listeners.frame);
    }
}
