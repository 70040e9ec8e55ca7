pub mod app;

pub use app::{
    load_input_script, run_host, run_host_with_metrics, App, EventQueue, EventSender, FrameEvent,
    FramePacing, GeometryDesc, GeometryError, HostError, HostEvent, HostInputs, HostReport,
    InputCommand, InputScript, InputScriptError, InteractionCollector, Listeners, LoopConfig,
    LoopMetricsSnapshot, MetricsHandle, NodeDesc, NodeId, NodeIdAllocator, ProgramDesc,
    QueueClosed, SceneCollaborator, SceneError, SceneGraph, SceneNode, ScriptedInput, TextDesc,
    TextureDesc, Transform, UniformValue, Vec3, Vec4, VertexChannel, ViewPose,
};
