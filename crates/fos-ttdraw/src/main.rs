//! fOS TrueType - text art renderer
//!
//! Opens a `.ttf` through the buffered file source, renders one line of text
//! into a 1-bit framebuffer and prints it with `#` for set pixels.

use std::fs::File;

use anyhow::{bail, Context, Result};
use fos_truetype::{
    Alignment, BitDepth, BufferedSource, Font, Framebuffer, Paint, Rotation, TextRenderer,
};

const USAGE: &str = "usage: fos-ttdraw <font.ttf> <text> [--size N] [--rotate DEG] \
[--spacing N] [--align left|center|right] [--outline] [--no-kerning] [--check]";

struct Options {
    font_path: String,
    text: String,
    size: u16,
    rotation: Rotation,
    spacing: i16,
    alignment: Alignment,
    outline: bool,
    kerning: bool,
    check: bool,
}

fn parse_args() -> Result<Options> {
    let mut args = std::env::args().skip(1);
    let mut positional = Vec::new();
    let mut opts = Options {
        font_path: String::new(),
        text: String::new(),
        size: 16,
        rotation: Rotation::Deg0,
        spacing: 0,
        alignment: Alignment::Left,
        outline: false,
        kerning: true,
        check: false,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--size" => {
                let v = args.next().context("--size needs a value")?;
                opts.size = v.parse().with_context(|| format!("bad size '{v}'"))?;
            }
            "--rotate" => {
                let v = args.next().context("--rotate needs a value")?;
                let degrees: u16 = v.parse().with_context(|| format!("bad rotation '{v}'"))?;
                opts.rotation = Rotation::from_degrees(degrees)?;
            }
            "--spacing" => {
                let v = args.next().context("--spacing needs a value")?;
                opts.spacing = v.parse().with_context(|| format!("bad spacing '{v}'"))?;
            }
            "--align" => {
                opts.alignment = match args.next().as_deref() {
                    Some("left") => Alignment::Left,
                    Some("center") => Alignment::Center,
                    Some("right") => Alignment::Right,
                    other => bail!("bad alignment {:?}\n{}", other, USAGE),
                };
            }
            "--outline" => opts.outline = true,
            "--no-kerning" => opts.kerning = false,
            "--check" => opts.check = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown option '{}'\n{}", flag, USAGE),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    opts.font_path = positional.next().context(USAGE)?;
    opts.text = positional.next().context(USAGE)?;
    Ok(opts)
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let opts = parse_args()?;

    let file = File::open(&opts.font_path).with_context(|| format!("opening {}", opts.font_path))?;
    let source = BufferedSource::new(file)?;
    let font = Font::open(source, opts.check).with_context(|| format!("parsing {}", opts.font_path))?;
    tracing::info!(
        "Loaded {}: {} glyphs, {} units/em",
        opts.font_path,
        font.number_of_glyphs(),
        font.units_per_em()
    );

    let mut renderer = TextRenderer::new(font);
    {
        let settings = renderer.settings_mut();
        settings.set_point_size(opts.size)?;
        settings.set_letter_spacing(opts.spacing);
        settings.set_kerning(opts.kerning);
        settings.set_rotation(opts.rotation);
        let paint = if opts.outline {
            (Paint::Color(1), Paint::None)
        } else {
            (Paint::None, Paint::Color(1))
        };
        settings.set_colors(paint.0, paint.1);
    }

    let width = renderer.measure_str(&opts.text).max(1);
    let height = renderer.line_height().max(1);

    // Alignment shifts the pen back along the baseline; start from the far end
    let along = match opts.alignment {
        Alignment::Left => 0,
        Alignment::Center => width / 2,
        Alignment::Right => width,
    };
    let (fb_w, fb_h, x, y) = match opts.rotation {
        Rotation::Deg0 => (width, height, along, 0),
        Rotation::Deg90 => (height, width, height, along),
        Rotation::Deg180 => (width, height, width - along, height),
        Rotation::Deg270 => (height, width, 0, width - along),
    };
    renderer.settings_mut().set_alignment(opts.alignment);

    let mut fb = Framebuffer::new(fb_w as u32 + 1, fb_h as u32 + 1, BitDepth::One)?;
    let advance = renderer.draw_str(x, y, &opts.text, &mut fb);
    tracing::info!("Rendered '{}': {}px advance, {} pixels set", opts.text, advance, fb.lit_pixels());

    for row in 0..fb.height() as i32 {
        let line: String = (0..fb.width() as i32)
            .map(|col| if fb.pixel(col, row).unwrap_or(0) != 0 { '#' } else { '.' })
            .collect();
        println!("{line}");
    }
    Ok(())
}
