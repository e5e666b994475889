use std::cell::Cell;
use std::rc::Rc;

use lamina::{
    AppConfig, FnNode, Frame, GLOBALS_WGSL, InstrumentedRenderer, KeyCode, LoggingConfig, Renderer,
    Shader, Transform, Vec2, Vec3, Vec4, Vertex, Window,
};

const SKY_WGSL: &str = include_str!("shaders/sky.wgsl");
const LIT_WGSL: &str = include_str!("shaders/lit.wgsl");
const VIGNETTE_WGSL: &str = include_str!("shaders/vignette.wgsl");
const FLAT_WGSL: &str = include_str!("shaders/flat.wgsl");

fn main() -> anyhow::Result<()> {
    let config = AppConfig::new()
        .title("lamina demo")
        .size(1280, 720)
        .logging(LoggingConfig::default().filter("info,lamina=debug,wgpu_core=warn,wgpu_hal=warn"));

    lamina::run_with_config(config, |ctx| {
        let (vertices, indices) = cube();
        let cube = ctx.renderer.create_mesh(&vertices, &indices)?;
        ctx.renderer.enable(lamina::Feature::DepthTest);

        let lit = Rc::new(Shader::new("lit", format!("{GLOBALS_WGSL}{LIT_WGSL}")));
        let flat = Rc::new(Shader::new("flat", format!("{GLOBALS_WGSL}{FLAT_WGSL}")));
        let spin = Rc::new(Cell::new(0.0f32));
        let follow = Rc::new(Cell::new(Vec2::ZERO));

        let mut builder = ctx.scene_builder();
        builder
            .camera_2d_layer(follow.clone(), |layer, _| {
                let sky = layer.background(SKY_WGSL, None, |_| {});
                layer.node(sky);
                Ok(())
            })?
            .camera_3d_layer(|layer, camera| {
                camera.set_position(Vec3::new(0.0, 1.0, 4.0));
                camera.set_rotation(Vec3::new(-0.25, 0.0, 0.0));

                let spin = spin.clone();
                let lit = lit.clone();
                let draw_cube = FnNode::new(move |r: &dyn Renderer, w: &Window| {
                    lit.apply(|u| {
                        u.set("color", Vec4::new(0.9, 0.55, 0.2, 1.0))
                            .set("light_dir", Vec3::new(0.4, 1.0, 0.6));
                    });
                    let transform = Transform::new()
                        .position(Vec3::new(-0.5, -0.5, -0.5))
                        .rotation(Vec3::new(0.0, spin.get(), 0.0));
                    r.render_mesh(&cube, w, &lit, &transform);
                });

                let vignette = layer.post(VIGNETTE_WGSL, 1, Some(640), |filter| {
                    filter.node(draw_cube).shader(|u| {
                        u.set("strength", 0.8f32).set("aberration", 0.01f32);
                    });
                })?;
                layer.node(vignette);
                Ok(())
            })?;

        // The HUD goes through an instrumented UI renderer so its draws show
        // up in the trace log.
        let hud_renderer: Rc<dyn Renderer> = Rc::new(InstrumentedRenderer::new(
            "hud",
            Rc::new(lamina::UiRenderer::new(ctx.base_renderer())),
        ));
        builder.custom_layer(hud_renderer, |layer| {
            let flat = flat.clone();
            layer.node(FnNode::new(move |r: &dyn Renderer, w: &Window| {
                flat.apply(|u| {
                    u.set("color", Vec4::new(1.0, 1.0, 1.0, 0.8));
                });
                let (width, height) = (w.width() as f32, w.height() as f32);
                let arm = 12.0;
                let bars = [
                    Transform::new()
                        .position(Vec3::new(width / 2.0 - arm, height / 2.0 - 1.0, 0.0))
                        .scale(Vec3::new(arm * 2.0, 2.0, 1.0)),
                    Transform::new()
                        .position(Vec3::new(width / 2.0 - 1.0, height / 2.0 - arm, 0.0))
                        .scale(Vec3::new(2.0, arm * 2.0, 1.0)),
                ];
                for bar in &bars {
                    r.render_quad(w, &flat, bar);
                }
            }));
            Ok(())
        })?;
        ctx.set_scene(builder.build());

        Ok(move |frame: &mut Frame| {
            spin.set(spin.get() + frame.dt);
            follow.set(follow.get() + frame.input.mouse_delta() * 0.01);

            if frame.input.key_pressed(KeyCode::Escape) {
                frame.exit();
            }
            if frame.input.key_pressed(KeyCode::F11) {
                frame.window.set_fullscreen(!frame.window.is_fullscreen());
            }
        })
    })
}

/// Unit cube spanning `0..1` on every axis, one quad per face.
fn cube() -> (Vec<Vertex>, Vec<u32>) {
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        // +Z
        ([0.0, 0.0, 1.0], [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]]),
        // -Z
        ([0.0, 0.0, -1.0], [[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]]),
        // +X
        ([1.0, 0.0, 0.0], [[1.0, 0.0, 1.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0]]),
        // -X
        ([-1.0, 0.0, 0.0], [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]]),
        // +Y
        ([0.0, 1.0, 0.0], [[0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]),
        // -Y
        ([0.0, -1.0, 0.0], [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]]),
    ];
    let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners) in faces {
        let base = vertices.len() as u32;
        for (corner, uv) in corners.iter().zip(uvs) {
            vertices.push(Vertex::new(*corner, normal, uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (vertices, indices)
}
