use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use wardrobe_types::{Category, CategoryFilter};

#[derive(Parser)]
#[command(name = "wardrobe", about = "Personal wardrobe catalogue and outfit planner", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Data directory (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a garment from a photo
    Add(AddArgs),
    /// Add a built-in preset garment, or list presets
    Preset(PresetArgs),
    /// List garments
    List(ListArgs),
    /// Change a garment's name, category or temperature range
    Edit(EditArgs),
    /// Delete a garment and its photo
    Delete(DeleteArgs),
    /// Pick garments per slot and save the outfit
    Outfit(OutfitArgs),
    /// Show saved outfits
    Outfits(OutfitsArgs),
    /// Write a garment's image to a file
    ExportImage(ExportImageArgs),
    /// Check garment records against stored images
    Fsck(FsckArgs),
}

#[derive(Args)]
pub struct AddArgs {
    pub photo: PathBuf,
    /// Slot for the new garment; `all` files it under top
    #[arg(short, long, default_value = "all")]
    pub category: CategoryFilter,
}

#[derive(Args)]
pub struct PresetArgs {
    pub name: Option<String>,
    #[arg(short, long)]
    pub list: bool,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(short, long, default_value = "all")]
    pub category: CategoryFilter,
}

#[derive(Args)]
pub struct EditArgs {
    /// Garment id or unique prefix
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    pub min: Option<i32>,
    #[arg(long, allow_negative_numbers = true)]
    pub max: Option<i32>,
    #[arg(short, long)]
    pub category: Option<Category>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Garment id or unique prefix
    pub id: String,
}

#[derive(Args)]
pub struct OutfitArgs {
    #[arg(long)]
    pub inner: Option<String>,
    #[arg(long)]
    pub top: Option<String>,
    #[arg(long)]
    pub bottom: Option<String>,
    #[arg(long)]
    pub outer: Option<String>,
    #[arg(long)]
    pub shoes: Option<String>,
    #[arg(long)]
    pub accessory: Option<String>,
}

impl OutfitArgs {
    /// The slots given on the command line, in slot order.
    pub fn slots(&self) -> Vec<(Category, &str)> {
        [
            (Category::Inner, &self.inner),
            (Category::Top, &self.top),
            (Category::Bottom, &self.bottom),
            (Category::Outer, &self.outer),
            (Category::Shoes, &self.shoes),
            (Category::Accessory, &self.accessory),
        ]
        .into_iter()
        .filter_map(|(slot, id)| id.as_deref().map(|id| (slot, id)))
        .collect()
    }
}

#[derive(Args)]
pub struct OutfitsArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

#[derive(Args)]
pub struct ExportImageArgs {
    /// Garment id or unique prefix
    pub id: String,
    pub path: PathBuf,
}

#[derive(Args)]
pub struct FsckArgs {
    /// Delete orphan images and clear dangling image references
    #[arg(long)]
    pub repair: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_add_defaults_to_all() {
        let cli = Cli::try_parse_from(["wardrobe", "add", "shirt.jpg"]).unwrap();
        if let Command::Add(args) = cli.command {
            assert_eq!(args.photo, PathBuf::from("shirt.jpg"));
            assert_eq!(args.category, CategoryFilter::All);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_add_with_category() {
        let cli = Cli::try_parse_from(["wardrobe", "add", "boots.png", "-c", "shoes"]).unwrap();
        if let Command::Add(args) = cli.command {
            assert_eq!(args.category, CategoryFilter::Only(Category::Shoes));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_unknown_category_fails() {
        assert!(Cli::try_parse_from(["wardrobe", "list", "--category", "hats"]).is_err());
    }

    #[test]
    fn parse_preset_list() {
        let cli = Cli::try_parse_from(["wardrobe", "preset", "--list"]).unwrap();
        if let Command::Preset(args) = cli.command {
            assert!(args.list);
            assert!(args.name.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_edit_negative_range() {
        let cli = Cli::try_parse_from([
            "wardrobe", "edit", "abc", "--name", "Parka", "--min", "-10", "--max", "5",
        ])
        .unwrap();
        if let Command::Edit(args) = cli.command {
            assert_eq!(args.id, "abc");
            assert_eq!(args.name, Some("Parka".into()));
            assert_eq!(args.min, Some(-10));
            assert_eq!(args.max, Some(5));
            assert!(args.category.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_outfit_slots() {
        let cli = Cli::try_parse_from(["wardrobe", "outfit", "--top", "t1", "--shoes", "s1"])
            .unwrap();
        if let Command::Outfit(args) = cli.command {
            assert_eq!(
                args.slots(),
                vec![(Category::Top, "t1"), (Category::Shoes, "s1")]
            );
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_export_image() {
        let cli = Cli::try_parse_from(["wardrobe", "export-image", "abc", "out.jpg"]).unwrap();
        if let Command::ExportImage(args) = cli.command {
            assert_eq!(args.path, PathBuf::from("out.jpg"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_fsck_repair() {
        let cli = Cli::try_parse_from(["wardrobe", "fsck", "--repair"]).unwrap();
        if let Command::Fsck(args) = cli.command {
            assert!(args.repair);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "wardrobe", "list", "--data-dir", "/tmp/w", "--format", "json", "-v",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/w")));
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(cli.verbose);
    }
}
