use anyhow::{bail, Context};
use bytes::Bytes;
use colored::Colorize;
use serde::Serialize;
use wardrobe_sdk::{
    Garment, GarmentEdit, GarmentId, Outfit, PersistNotice, Preset, Wardrobe, WardrobeConfig,
};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    tracing::debug!(?config, "configuration resolved");
    let wardrobe = Wardrobe::open(&config)
        .with_context(|| format!("opening wardrobe in {}", config.data_dir.display()))?;
    let format = cli.format;

    match cli.command {
        Command::Add(args) => cmd_add(&wardrobe, format, args).await,
        Command::Preset(args) => cmd_preset(&wardrobe, format, args).await,
        Command::List(args) => cmd_list(&wardrobe, format, args),
        Command::Edit(args) => cmd_edit(&wardrobe, format, args).await,
        Command::Delete(args) => cmd_delete(&wardrobe, format, args).await,
        Command::Outfit(args) => cmd_outfit(&wardrobe, format, args).await,
        Command::Outfits(args) => cmd_outfits(&wardrobe, format, args),
        Command::ExportImage(args) => cmd_export_image(&wardrobe, args).await,
        Command::Fsck(args) => cmd_fsck(&wardrobe, format, args).await,
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<WardrobeConfig> {
    let config = match &cli.config {
        Some(path) => WardrobeConfig::load(path)?,
        None => WardrobeConfig::default(),
    };
    Ok(match &cli.data_dir {
        Some(dir) => config.with_data_dir(dir),
        None => config,
    })
}

async fn cmd_add(w: &Wardrobe, format: OutputFormat, args: AddArgs) -> anyhow::Result<()> {
    let photo = tokio::fs::read(&args.photo)
        .await
        .with_context(|| format!("reading {}", args.photo.display()))?;
    let added = w
        .catalog()
        .add_from_image(args.category.default_category(), Bytes::from(photo))
        .await?;
    warn_unsaved(&added.notice);
    emit(format, &added.value, |g| {
        println!("{} Added {}", "✓".green().bold(), garment_line(g));
    })
}

async fn cmd_preset(w: &Wardrobe, format: OutputFormat, args: PresetArgs) -> anyhow::Result<()> {
    let name = match args.name {
        Some(name) if !args.list => name,
        _ => {
            return emit(format, &Preset::builtin(), |presets| {
                for p in presets {
                    println!(
                        "  {:<20} {:<10} {:>3}..{}°C",
                        p.name.bold(),
                        p.category.to_string().cyan(),
                        p.temp_range.min(),
                        p.temp_range.max()
                    );
                }
            })
        }
    };
    let added = w
        .catalog()
        .add_preset_named(&name)
        .await
        .context("see `wardrobe preset --list`")?;
    warn_unsaved(&added.notice);
    emit(format, &added.value, |g| {
        println!("{} Added {}", "✓".green().bold(), garment_line(g));
    })
}

fn cmd_list(w: &Wardrobe, format: OutputFormat, args: ListArgs) -> anyhow::Result<()> {
    let garments = w.catalog().filter(args.category);
    emit(format, &garments, |garments| {
        if garments.is_empty() {
            println!("No garments.");
        }
        for g in garments {
            println!("  {}", garment_line(g));
        }
    })
}

async fn cmd_edit(w: &Wardrobe, format: OutputFormat, args: EditArgs) -> anyhow::Result<()> {
    let garment = find_garment(w, &args.id)?;
    let mut edit = GarmentEdit::from_garment(&garment);
    if let Some(name) = args.name {
        edit.name = name;
    }
    if let Some(category) = args.category {
        edit.category = category;
    }
    if let Some(min) = args.min {
        edit.temp_min = min;
    }
    if let Some(max) = args.max {
        edit.temp_max = max;
    }

    let edited = w.catalog().edit(&garment.id, &edit).await;
    warn_unsaved(&edited.notice);
    let Some(updated) = edited.value else {
        bail!("garment {} disappeared while editing", garment.id);
    };
    emit(format, &updated, |g| {
        println!("{} Updated {}", "✓".green().bold(), garment_line(g));
    })
}

async fn cmd_delete(w: &Wardrobe, format: OutputFormat, args: DeleteArgs) -> anyhow::Result<()> {
    let garment = find_garment(w, &args.id)?;
    let deleted = w.delete_garment(&garment.id).await?;
    warn_unsaved(&deleted.notice);
    emit(format, &deleted.value, |g| match g {
        Some(g) => println!("{} Deleted {}", "✓".green().bold(), garment_line(g)),
        None => println!("Nothing to delete."),
    })
}

async fn cmd_outfit(w: &Wardrobe, format: OutputFormat, args: OutfitArgs) -> anyhow::Result<()> {
    let composer = w.composer();
    for (slot, id) in args.slots() {
        let garment = find_garment(w, id)?;
        if garment.category != slot {
            eprintln!(
                "{} {} is filed under {}, worn as {}",
                "note:".yellow(),
                garment.name,
                garment.category,
                slot
            );
        }
        composer.select_slot(slot, Some(garment.id));
    }
    if composer.selection().is_empty() {
        bail!("pick at least one garment, e.g. `wardrobe outfit --top <id>`");
    }

    let committed = composer.commit().await;
    warn_unsaved(&committed.notice);
    emit(format, &committed.value, |o| {
        println!("{} Saved outfit {}", "✓".green().bold(), o.id.short_id().yellow());
        print_outfit_slots(w, o);
    })
}

fn cmd_outfits(w: &Wardrobe, format: OutputFormat, args: OutfitsArgs) -> anyhow::Result<()> {
    let outfits: Vec<Outfit> = w.composer().outfits().into_iter().take(args.limit).collect();
    emit(format, &outfits, |outfits| {
        if outfits.is_empty() {
            println!("No outfits saved.");
        }
        for o in outfits {
            println!("{}  {}", o.id.short_id().yellow().bold(), o.created_at.to_string().dimmed());
            print_outfit_slots(w, o);
        }
    })
}

async fn cmd_export_image(w: &Wardrobe, args: ExportImageArgs) -> anyhow::Result<()> {
    let garment = find_garment(w, &args.id)?;
    let Some(data) = w.image_bytes(&garment.id).await? else {
        bail!("{} has no stored image", garment.name);
    };
    tokio::fs::write(&args.path, &data)
        .await
        .with_context(|| format!("writing {}", args.path.display()))?;
    println!(
        "{} Wrote {} bytes to {}",
        "✓".green().bold(),
        data.len(),
        args.path.display().to_string().bold()
    );
    Ok(())
}

async fn cmd_fsck(w: &Wardrobe, format: OutputFormat, args: FsckArgs) -> anyhow::Result<()> {
    let report = if args.repair {
        let repaired = w.catalog().repair().await?;
        warn_unsaved(&repaired.notice);
        repaired.value
    } else {
        w.catalog().verify().await?
    };
    emit(format, &report, |r| {
        if r.is_clean() {
            println!("{} No issues.", "✓".green().bold());
            return;
        }
        for id in &r.dangling {
            println!("  {} {}", "missing image:".red(), id);
        }
        for key in &r.orphans {
            println!("  {} {}", "orphan image:".yellow(), key);
        }
        if args.repair {
            println!("{} Repaired.", "✓".green().bold());
        } else {
            println!("Run with {} to fix.", "--repair".bold());
        }
    })
}

/// Look a garment up by full id or unique id prefix.
fn find_garment(w: &Wardrobe, id: &str) -> anyhow::Result<Garment> {
    if let Some(g) = GarmentId::parse(id).ok().and_then(|id| w.catalog().get(&id)) {
        return Ok(g);
    }
    let mut matches = w
        .catalog()
        .garments()
        .into_iter()
        .filter(|g| g.id.as_str().starts_with(id));
    match (matches.next(), matches.next()) {
        (Some(g), None) => Ok(g),
        (Some(_), Some(_)) => bail!("garment id {id:?} is ambiguous"),
        (None, _) => bail!("no garment matches {id:?}"),
    }
}

fn print_outfit_slots(w: &Wardrobe, outfit: &Outfit) {
    for slot in w.composer().resolve(outfit) {
        let shown = match &slot.garment {
            Some(g) => g.name.bold().to_string(),
            None => format!("{} (deleted)", slot.garment_id.short_id()).dimmed().to_string(),
        };
        println!("    {:<10} {}", slot.slot.to_string().cyan(), shown);
    }
}

fn garment_line(g: &Garment) -> String {
    format!(
        "{}  {:<20} {:<10} {:>3}..{}°C",
        g.id.short_id().yellow(),
        g.name.bold(),
        g.category.to_string().cyan(),
        g.temp_min,
        g.temp_max
    )
}

fn warn_unsaved(notice: &Option<PersistNotice>) {
    if let Some(notice) = notice {
        eprintln!("{} {}", "warning:".yellow().bold(), notice);
    }
}

fn emit<T: Serialize + ?Sized>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(&T),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => text(value),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
