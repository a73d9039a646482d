//! Show the hat menu a catalog produces

use crate::system_config::{self, SystemConfig};
use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream::Stdout};
use session::catalog::kit_file;
use session::{Controls, HatCatalog};
use std::path::{Path, PathBuf};

/// Options for the catalog command
pub struct CatalogArgs {
    /// Catalog file to load directly
    pub path: Option<PathBuf>,
    /// Named kit resolved against `data_dir`
    pub kit: Option<String>,
    /// Directory holding kit files
    pub data_dir: PathBuf,
    /// Control set override
    pub controls: Option<String>,
}

pub async fn run(args: CatalogArgs) -> Result<()> {
    let config = system_config::load()?;
    let (path, catalog, controls) = load_catalog(&args, &config)?;

    println!(
        "{} {}",
        "Catalog".if_supports_color(Stdout, |t| t.bold()),
        path.display().if_supports_color(Stdout, |t| t.dimmed())
    );
    println!(
        "{}: {}  {}: {}  {}: {}\n",
        "entries".if_supports_color(Stdout, |t| t.dimmed()),
        catalog.len(),
        "controls".if_supports_color(Stdout, |t| t.dimmed()),
        controls.as_str(),
        "margin".if_supports_color(Stdout, |t| t.dimmed()),
        catalog.preview_margin()
    );

    for entry in catalog.menu_layout() {
        let x = entry.button_position.x;
        match &entry.preview {
            Some(preview) => {
                let resource = preview.resource_id.as_deref().unwrap_or("-");
                println!(
                    "  {:>7.2}  {}  {}",
                    x,
                    entry.id.if_supports_color(Stdout, |t| t.cyan()),
                    resource.if_supports_color(Stdout, |t| t.dimmed())
                );
            }
            None => println!(
                "  {:>7.2}  {}",
                x,
                entry.id.if_supports_color(Stdout, |t| t.yellow())
            ),
        }
    }

    Ok(())
}

/// Resolve, load and complete a catalog with its control set
pub(crate) fn load_catalog(
    args: &CatalogArgs,
    config: &SystemConfig,
) -> Result<(PathBuf, HatCatalog, Controls)> {
    let path = resolve_path(args, config.session.kit.as_deref());
    let mut catalog = HatCatalog::load(&path)
        .with_context(|| format!("Failed to load catalog {}", path.display()))?;

    let controls = match &args.controls {
        Some(value) => Controls::parse(value),
        None => config.controls(),
    };
    catalog.merge_controls(controls);

    Ok((path, catalog, controls))
}

/// Pick the catalog file: explicit path, then kit, then the combined catalog
fn resolve_path(args: &CatalogArgs, configured_kit: Option<&str>) -> PathBuf {
    if let Some(path) = &args.path {
        return path.clone();
    }
    let kit = args.kit.as_deref().or(configured_kit).unwrap_or("all");
    kit_path(&args.data_dir, kit)
}

fn kit_path(data_dir: &Path, kit: &str) -> PathBuf {
    data_dir.join(kit_file(kit))
}
