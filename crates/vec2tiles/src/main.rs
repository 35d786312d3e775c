use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use tilemesh::{parse_hex_color, EncodeOptions, TileFormat, TubeParams};
use tiletree::{
    encode_subtrees, explicit_tilesets, generate_tiles, implicit_tileset, root_translation,
    Refine, TilerConfig, TilesetParams,
};

mod geojson;
use geojson::{FileSource, SourceOptions};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    /// Bare glTF binary content with embedded metadata.
    Glb,
    /// Legacy b3dm wrapper with feature and batch tables.
    B3dm,
}

impl From<FormatArg> for TileFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Glb => TileFormat::Glb,
            FormatArg::B3dm => TileFormat::B3dm,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RefineArg {
    Replace,
    Add,
}

impl From<RefineArg> for Refine {
    fn from(r: RefineArg) -> Self {
        match r {
            RefineArg::Replace => Refine::Replace,
            RefineArg::Add => Refine::Add,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "vec2tiles", version)]
struct Args {
    /// Input GeoJSON FeatureCollection.
    #[arg(long)]
    input: PathBuf,

    #[arg(long, default_value = "tiles")]
    output_dir: PathBuf,

    /// Feature count at which a tile stops splitting.
    #[arg(long, default_value_t = 1000)]
    max_features_per_tile: u64,

    /// Comma-separated geometric errors, coarse to fine. When the input
    /// carries detail levels, the count must be level count + 1.
    #[arg(long, default_value = "500,0")]
    geometric_errors: String,

    /// Bounding-volume height range in meters as "min,max". Defaults to
    /// the range observed in the input.
    #[arg(long)]
    heights: Option<String>,

    /// Write an implicit tileset with subtree availability files.
    #[arg(long, default_value_t = false)]
    implicit: bool,

    /// Levels per availability window (implicit tilesets only).
    #[arg(long, default_value_t = 4)]
    subtree_levels: u32,

    /// Depth at which the explicit tileset splits into external documents.
    #[arg(long)]
    split_depth: Option<u32>,

    #[arg(long, value_enum, default_value_t = RefineArg::Replace)]
    refinement: RefineArg,

    #[arg(long, value_enum, default_value_t = FormatArg::Glb)]
    format: FormatArg,

    /// Render both triangle faces; pass "false" to cull back faces.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    double_sided: bool,

    /// Emit CESIUM_primitive_outline edges for every primitive.
    #[arg(long, default_value_t = false)]
    add_outlines: bool,

    /// Material color for features without their own colors.
    #[arg(long, default_value = "#FFFFFF")]
    default_color: String,

    /// Tube radius for line features, meters.
    #[arg(long, default_value_t = 1.0)]
    radius: f64,

    /// Comma-separated property names copied into attribute tables.
    #[arg(long)]
    attribute_columns: Option<String>,

    /// Property holding per-feature hex colors.
    #[arg(long)]
    color_column: Option<String>,

    /// Property holding the per-feature tube radius.
    #[arg(long)]
    radius_column: Option<String>,

    /// Property holding the detail level of a feature.
    #[arg(long)]
    lod_column: Option<String>,

    /// Spatial reference of the working frame; 4978 means earth-centered,
    /// anything else is treated as planar spherical Mercator.
    #[arg(long, default_value_t = 4978)]
    srid: i32,
}

fn parse_f64_list(s: &str, what: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .with_context(|| format!("invalid {what} value {part:?}"))
        })
        .collect()
}

/// Errors run coarse to fine, so the list must never increase; a viewer
/// would otherwise refine into coarser content.
fn parse_geometric_errors(s: &str) -> Result<Vec<f64>> {
    let errors = parse_f64_list(s, "geometric error")?;
    if errors.is_empty() {
        bail!("at least one geometric error is required");
    }
    if errors.iter().any(|e| !e.is_finite() || *e < 0.0) {
        bail!("geometric errors must be finite and non-negative");
    }
    if errors.windows(2).any(|pair| pair[1] > pair[0]) {
        bail!("geometric errors must not increase from coarse to fine: {s}");
    }
    Ok(errors)
}

fn parse_heights(s: &str) -> Result<(f64, f64)> {
    let values = parse_f64_list(s, "height")?;
    match values[..] {
        [min, max] if min <= max => Ok((min, max)),
        [min, max] => bail!("height range {min},{max} has min above max"),
        _ => bail!("--heights expects exactly two values, e.g. 0,100"),
    }
}

fn run(args: &Args) -> Result<()> {
    let start = Instant::now();

    // All configuration problems are fatal before anything is written.
    let geometric_errors = parse_geometric_errors(&args.geometric_errors)?;
    let heights = args.heights.as_deref().map(parse_heights).transpose()?;
    let default_color = parse_hex_color(&args.default_color)
        .with_context(|| format!("invalid --default-color {:?}", args.default_color))?;

    let source_opts = SourceOptions {
        attribute_columns: args
            .attribute_columns
            .as_deref()
            .map(|s| s.split(',').map(|c| c.trim().to_owned()).collect())
            .unwrap_or_default(),
        color_column: args.color_column.clone(),
        radius_column: args.radius_column.clone(),
        lod_column: args.lod_column.clone(),
        srid: args.srid,
    };

    let source = FileSource::open(&args.input, &source_opts)?;
    info!("loaded {} features from {}", source.len(), args.input.display());

    let lod_levels = source.lod_levels();
    if !lod_levels.is_empty() && geometric_errors.len() != lod_levels.len() + 1 {
        bail!(
            "input has {} detail levels, so {} geometric errors are required (got {})",
            lod_levels.len(),
            lod_levels.len() + 1,
            geometric_errors.len()
        );
    }

    let root_bbox = source
        .extent()
        .context("input contains no usable features")?;
    let (center_lon, center_lat) = root_bbox.center();
    let translation = root_translation(center_lon, center_lat, args.srid);
    let (min_height, max_height) = heights.unwrap_or_else(|| source.height_range());

    let content_dir = args.output_dir.join("content");
    fs::create_dir_all(&content_dir)?;

    let tiler_cfg = TilerConfig {
        max_features_per_tile: args.max_features_per_tile,
        lod_levels,
        format: args.format.into(),
        encode: EncodeOptions {
            default_color,
            double_sided: args.double_sided,
            add_outlines: args.add_outlines,
            ..Default::default()
        },
        tube: TubeParams {
            radius: args.radius,
            ..Default::default()
        },
        translation,
        content_dir: content_dir.clone(),
        ..Default::default()
    };

    let tree = generate_tiles(&source, root_bbox, &tiler_cfg)?;
    info!(
        "tiled {} features into {} content tiles (depth {})",
        source.len(),
        tree.count_available(),
        tree.max_depth()
    );

    let tileset_params = TilesetParams {
        geometric_errors,
        refine: args.refinement.into(),
        min_height,
        max_height,
        translation,
        content_dir: "content".to_owned(),
        format: args.format.into(),
        split_depth: args.split_depth,
    };

    let mut documents = 0usize;
    if args.implicit {
        let windows = encode_subtrees(&tree, args.subtree_levels)?;
        for (id, bytes) in &windows {
            let dir = args
                .output_dir
                .join("subtrees")
                .join(id.z.to_string())
                .join(id.x.to_string());
            fs::create_dir_all(&dir)?;
            fs::write(dir.join(format!("{}.subtree", id.y)), bytes)?;
        }
        info!("wrote {} subtree availability files", windows.len());

        let tileset = implicit_tileset(&tree, &tileset_params, args.subtree_levels)?;
        fs::write(
            args.output_dir.join("tileset.json"),
            serde_json::to_vec_pretty(&tileset)?,
        )?;
        documents += 1;
    } else {
        for (name, tileset) in explicit_tilesets(&tree, &tileset_params)? {
            fs::write(
                args.output_dir.join(&name),
                serde_json::to_vec_pretty(&tileset)?,
            )?;
            documents += 1;
        }
    }

    info!(
        "OK {} -> {} ({} tiles, {} descriptor documents, {:.2}s)",
        args.input.display(),
        args.output_dir.display(),
        tree.count_available(),
        documents,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    run(&args)
}
