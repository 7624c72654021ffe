use super::render::load_model;
use crate::components::builtin_mapping;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagekit_common::Model;
use pagekit_evaluator::ComponentMapping;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct TypesArgs {
    /// Page model JSON file
    pub model: PathBuf,
}

/// How often a type occurs and whether anything renders it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeUsage {
    pub count: usize,
    pub mapped: bool,
}

pub fn types(args: TypesArgs, cwd: &Path) -> Result<()> {
    let model = load_model(&cwd.join(&args.model))?;
    let usage = collect_types(&model, &builtin_mapping());

    if usage.is_empty() {
        println!("{} No typed nodes in {}", "⚠️".yellow(), args.model.display());
        return Ok(());
    }

    for (type_key, usage) in &usage {
        let marker = if usage.mapped { "✓".green() } else { "✗".red() };
        println!("  {} {} ({})", marker, type_key, usage.count);
    }

    let unmapped = usage.values().filter(|u| !u.mapped).count();
    println!();
    if unmapped == 0 {
        println!("✨ {} All types resolve", "Done".green().bold());
    } else {
        println!(
            "{} {} type(s) have no renderer and will be skipped",
            "⚠️".yellow(),
            unmapped
        );
    }

    Ok(())
}

/// Every discriminant in the model tree, sorted by type
pub fn collect_types(model: &Model, mapping: &ComponentMapping) -> BTreeMap<String, TypeUsage> {
    let mut usage = BTreeMap::new();
    visit(model, mapping, &mut usage);
    usage
}

fn visit(model: &Model, mapping: &ComponentMapping, usage: &mut BTreeMap<String, TypeUsage>) {
    if let Some(type_key) = model.discriminant().filter(|t| !t.is_empty()) {
        usage
            .entry(type_key.to_string())
            .or_insert_with(|| TypeUsage {
                count: 0,
                mapped: mapping.contains(type_key),
            })
            .count += 1;
    }

    // Items missing from the order never render, but they still carry types
    if let Some(items) = model.get(pagekit_common::ITEMS_PROP).and_then(|v| v.as_object()) {
        for key in items.keys() {
            if let Some(item) = model.item(key) {
                visit(&item, mapping, usage);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{PAGE_TYPE, TEXT_TYPE};
    use serde_json::json;

    #[test]
    fn test_collect_types() {
        let model = Model::from_value(json!({
            ":type": PAGE_TYPE,
            ":items": {
                "a": { ":type": TEXT_TYPE },
                "b": { ":type": TEXT_TYPE },
                "grid": {
                    ":type": "wcm/foundation/components/responsivegrid",
                    ":items": { "video": { ":type": "acme/video" } }
                },
                "blank": { ":type": "" }
            }
        }))
        .unwrap();

        let usage = collect_types(&model, &builtin_mapping());
        let keys: Vec<&str> = usage.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "acme/video",
                PAGE_TYPE,
                TEXT_TYPE,
                "wcm/foundation/components/responsivegrid"
            ]
        );
        assert_eq!(usage[TEXT_TYPE], TypeUsage { count: 2, mapped: true });
        assert!(!usage["acme/video"].mapped);
    }
}
