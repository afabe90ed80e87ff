//! # Loaded Model
//!
//! Loads an OBJ file in the background and renders it with the
//! three-parameter effect (position, amount and thickness) followed by bloom.
//!
//! ```text
//! cargo run --example loaded_model -- path/to/model.obj
//! ```

use anyhow::Context;
use fracture::prelude::*;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .context("usage: loaded_model <model.obj>")?;

    let config = AppConfig::default()
        .with_title("Fracture - Loaded Model")
        .with_bloom(BloomParams::default());

    let mut app = FractureApp::new(config)?;
    app.load_mesh(path, EffectConfig::three_parameter());
    app.run()?;
    Ok(())
}
