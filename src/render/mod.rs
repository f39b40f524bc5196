//! Optional real-time point-cloud view, adapted from the teacher's
//! `OnlineRenderer` but simplified to a single winit window pumped once per
//! completed step rather than owning its own event loop: positions are
//! computed on the CPU by the step engine and uploaded as a vertex buffer
//! each call, with no GPU compute shader.

mod wgpu_visualizer;

pub use wgpu_visualizer::WgpuVisualizer;
