/// Build script for wave_viz
///
/// # Shader Compilation Strategy:
/// - HLSL source is compiled at runtime via DXC (shader model 6.x is
///   required for wave intrinsics, which rules out the legacy FXC path)
fn main() {
    // Trigger rebuild if shader files change
    println!("cargo:rerun-if-changed=shaders/wave_viz.hlsl");
}
