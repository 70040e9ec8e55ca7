mod events;
mod input;
mod loop_runner;
mod math;
mod metrics;
mod node;
mod queue;
mod scene;

pub use events::{FrameEvent, HostEvent};
pub use input::{
    load_input_script, InputCommand, InputScript, InputScriptError, InteractionCollector,
    ScriptedInput,
};
pub use loop_runner::{
    run_host, run_host_with_metrics, App, FramePacing, HostError, HostInputs, HostReport,
    LoopConfig,
};
pub use math::{Vec3, Vec4, ViewPose};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use node::{
    GeometryDesc, GeometryError, Listeners, NodeDesc, ProgramDesc, TextDesc, TextureDesc,
    Transform, UniformValue, VertexChannel,
};
pub use queue::{EventQueue, EventSender, QueueClosed};
pub use scene::{NodeId, NodeIdAllocator, SceneCollaborator, SceneError, SceneGraph, SceneNode};
