//! # Distorted Box
//!
//! A subdivided box with the two-parameter effect (position and amount) and
//! no bloom. Drag with the left mouse button to orbit, scroll to zoom.

use fracture::prelude::*;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mesh = generate_box(1.0, 1.0, 1.0, 10, 10, 10);
    log::info!(
        "Box: {} triangles, {} vertices",
        mesh.triangle_count(),
        mesh.vertex_count()
    );

    let mut app = FractureApp::new(AppConfig::default().with_title("Fracture - Distorted Box"))?;
    app.add_mesh(mesh, EffectConfig::two_parameter());
    app.run()?;
    Ok(())
}
