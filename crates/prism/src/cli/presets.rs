//! The `prism presets` command.

use clap::Args;
use prism_core::AestheticCatalog;

#[derive(Args, Debug)]
pub struct PresetsArgs {
    /// List filters instead of presets
    #[arg(long)]
    pub filters: bool,

    /// Print the catalog entries (with their transform options) as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: PresetsArgs) -> anyhow::Result<()> {
    let catalog = AestheticCatalog::builtin();
    match (args.filters, args.json) {
        (false, true) => println!("{}", serde_json::to_string_pretty(catalog.presets())?),
        (true, true) => println!("{}", serde_json::to_string_pretty(catalog.filters())?),
        (false, false) => print!("{}", preset_table(&catalog)),
        (true, false) => print!("{}", filter_table(&catalog)),
    }
    Ok(())
}

fn preset_table(catalog: &AestheticCatalog) -> String {
    let mut out = String::from("\nAesthetic presets:\n\n");
    for preset in catalog.presets() {
        out.push_str(&format!(
            "  {:<16} {:<18} {:<16} {}\n",
            preset.id, preset.display_name, preset.vibe_tag, preset.formula_description
        ));
    }
    out
}

fn filter_table(catalog: &AestheticCatalog) -> String {
    let mut out = String::from("\nFilters:\n\n");
    for filter in catalog.filters() {
        out.push_str(&format!(
            "  {:<18} {:<12} {}\n",
            filter.id,
            filter.category.as_str(),
            filter.description
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_list_every_entry() {
        let catalog = AestheticCatalog::builtin();
        let presets = preset_table(&catalog);
        assert_eq!(presets.lines().filter(|l| l.starts_with("  ")).count(), catalog.presets().len());
        assert!(presets.contains("golden_hour"));

        let filters = filter_table(&catalog);
        assert!(filters.contains("soft_portrait"));
        assert!(filters.contains("correction"));
    }
}
