//! wave_viz 主程序入口
//!
//! 负责加载配置、初始化日志和渲染器，并驱动消息循环。
//! 每次收到重绘请求渲染一帧；窗口关闭或按下 Escape 时先排空
//! GPU 再退出。

#[cfg(target_os = "windows")]
fn main() {
    use std::process;
    use tracing::{error, info};
    use wave_viz::core::{log, Config};
    use wave_viz::renderer::Renderer;
    use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
    use winit::event_loop::EventLoop;
    use winit::keyboard::{KeyCode, PhysicalKey};

    // 加载配置并应用命令行覆盖
    let mut config = Config::from_file_or_default("config.toml");
    config.apply_args(std::env::args().skip(1));
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        process::exit(1);
    }

    log::init_logger(
        config.logging.level,
        config.logging.file_output,
        Some(&config.logging.log_file),
    );
    info!(
        width = config.window.width,
        height = config.window.height,
        vsync = config.graphics.vsync,
        "Starting wave_viz"
    );

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!("Failed to create event loop: {}", e);
            process::exit(1);
        }
    };

    let mut renderer = match Renderer::new(&event_loop, &config) {
        Ok(renderer) => renderer,
        Err(e) => {
            error!("Failed to initialize renderer: {}", e);
            process::exit(1);
        }
    };

    let result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => {
                info!("Window close requested, shutting down");
                if let Err(e) = renderer.flush() {
                    error!("Failed to flush GPU on shutdown: {}", e);
                }
                elwt.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                info!("Escape pressed, shutting down");
                if let Err(e) = renderer.flush() {
                    error!("Failed to flush GPU on shutdown: {}", e);
                }
                elwt.exit();
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = renderer.draw() {
                    error!("Frame failed: {}", e);
                    elwt.exit();
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            // 持续渲染：每轮消息处理完后请求下一帧
            renderer.window().request_redraw();
        }
        _ => {}
    });

    if let Err(e) = result {
        error!("Event loop error: {}", e);
        process::exit(1);
    }
}

#[cfg(not(target_os = "windows"))]
fn main() {
    eprintln!("wave_viz requires DirectX 12 and only runs on Windows");
    std::process::exit(1);
}
