use super::math::ViewPose;
use super::scene::NodeId;

/// Per-frame tick delivered to one frame-listening node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameEvent {
    pub node: NodeId,
    /// Host timestamp in seconds. Monotonic across a session.
    pub now: f64,
    pub dt: f64,
    pub frame_index: u64,
    pub view: ViewPose,
}

/// Resolved host-side event. Raycasting has already happened; hover and
/// gesture events name the node they target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    Frame(FrameEvent),
    GazeHoverOver { node: NodeId },
    GazeHoverOut { node: NodeId },
    GestureTouchDown { node: NodeId },
    GestureTouchUp { node: NodeId },
    GestureTouchCancel { node: NodeId },
    Back,
}

impl HostEvent {
    pub fn target(&self) -> Option<NodeId> {
        match self {
            HostEvent::Frame(frame) => Some(frame.node),
            HostEvent::GazeHoverOver { node }
            | HostEvent::GazeHoverOut { node }
            | HostEvent::GestureTouchDown { node }
            | HostEvent::GestureTouchUp { node }
            | HostEvent::GestureTouchCancel { node } => Some(*node),
            HostEvent::Back => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HostEvent::Frame(_) => "frame",
            HostEvent::GazeHoverOver { .. } => "gaze_hover_over",
            HostEvent::GazeHoverOut { .. } => "gaze_hover_out",
            HostEvent::GestureTouchDown { .. } => "gesture_touch_down",
            HostEvent::GestureTouchUp { .. } => "gesture_touch_up",
            HostEvent::GestureTouchCancel { .. } => "gesture_touch_cancel",
            HostEvent::Back => "back",
        }
    }
}
