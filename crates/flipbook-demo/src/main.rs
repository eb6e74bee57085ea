use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};

use flipbook_anim::{Animation, ImageList, VisualTarget};
use flipbook_engine::logging;

/// A target that narrates every state change to stdout.
#[derive(Default)]
struct ConsoleSprite {
    image: Option<String>,
    offset: (f32, f32),
    position: (f32, f32),
}

impl VisualTarget for ConsoleSprite {
    fn set_image(&mut self, src: &str) {
        if self.image.as_deref() != Some(src) {
            println!("  sheet    → {}", short(src));
            self.image = Some(src.to_string());
        }
    }

    fn set_offset(&mut self, x: f32, y: f32) {
        if self.offset != (x, y) {
            println!("  offset   → {x:>7.1} {y:>7.1}");
            self.offset = (x, y);
        }
    }

    fn set_position(&mut self, x: f32, y: f32) {
        if self.position != (x, y) {
            println!("  position → {x:>7.1} {y:>7.1}");
            self.position = (x, y);
        }
    }
}

fn short(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

struct Assets {
    walk: String,
    blink: String,
}

/// Writes the demo sprite sheets into a temp directory.
fn synth_assets() -> Result<Assets> {
    let dir = std::env::temp_dir().join("flipbook-demo");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let walk = sheet(&dir, "walk.png", |cell| [40 * cell, 90, 160, 255])?;
    let blink = sheet(&dir, "blink.png", |cell| [200, 60 + 30 * cell, 40, 255])?;
    log::debug!("demo sheets written to {}", dir.display());
    Ok(Assets { walk, blink })
}

/// A 6-cell horizontal strip, 32px per cell, colored per cell.
fn sheet(dir: &PathBuf, name: &str, pixel: impl Fn(u8) -> [u8; 4]) -> Result<String> {
    let path = dir.join(name);
    image::RgbaImage::from_fn(192, 32, |x, _| image::Rgba(pixel((x / 32) as u8)))
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path.to_string_lossy().into_owned())
}

fn main() -> Result<()> {
    logging::init_logging(None);

    println!();
    println!("  ╔══════════════════════════════════════╗");
    println!("  ║        FLIPBOOK SEQUENCER DEMO       ║");
    println!("  ║   frame clock · task queue · loader  ║");
    println!("  ╚══════════════════════════════════════╝");
    println!();

    let assets = synth_assets().context("failed to synthesize demo sprite sheets")?;
    let sprite = Rc::new(RefCell::new(ConsoleSprite::default()));

    // 6 cells marching left across the sheet.
    let cells: Vec<(f32, f32)> = (0..6).map(|i| (-32.0 * i as f32, 0.0)).collect();

    let mut anim = Animation::with_interval(Duration::from_millis(80));
    anim.load_images(
        ImageList::from_named([("walk", assets.walk.clone()), ("blink", assets.blink.clone())]),
        Some(Duration::from_secs(2)),
    )
    .then(|| println!("  images ready — rolling"))
    .change_position(sprite.clone(), cells, assets.walk.clone())
    .wait(Duration::from_millis(240))
    .repeat(1, 1)
    .then(|| println!("  walk done — blinking"))
    .change_src(
        sprite.clone(),
        vec![assets.blink.clone(), assets.walk.clone(), assets.blink.clone()],
    )
    .then(|| println!("  sequence complete"));

    anim.run_to_end().context("animation aborted")?;

    println!();
    Ok(())
}
