//! Module discovery - single-pass walk of the addons root
//!
//! One pass emits modules tagged with kind, covering the flat layout, the
//! one-level creator/addon layout, and declared extensions subtrees.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::domain::entities::{AddonDescriptor, DiscoveredModule, ModuleKind, DESCRIPTOR_FILE};

/// Walk the addons root and return every loadable module, no duplicates.
///
/// An unreadable root means nothing to load, not a crash.
pub fn discover(root: &Path) -> Vec<DiscoveredModule> {
    let mut modules = Vec::new();
    let mut seen = HashSet::new();

    let top_level = match subdirectories(root) {
        Ok(dirs) => dirs,
        Err(e) => {
            warn!("addons root {} is unreadable: {}", root.display(), e);
            return modules;
        }
    };

    for dir in top_level {
        if dir.join(DESCRIPTOR_FILE).is_file() {
            collect_module_dir(&dir, None, None, &mut seen, &mut modules);
        } else {
            // Creator directory: exactly one extra level of nesting
            let creator = dir_name(&dir);
            let inner = match subdirectories(&dir) {
                Ok(dirs) => dirs,
                Err(e) => {
                    warn!("cannot read creator directory {}: {}", dir.display(), e);
                    continue;
                }
            };
            for candidate in inner {
                if candidate.join(DESCRIPTOR_FILE).is_file() {
                    collect_module_dir(
                        &candidate,
                        Some(creator.clone()),
                        None,
                        &mut seen,
                        &mut modules,
                    );
                }
            }
        }
    }

    modules
}

/// Accept one module directory: validate its descriptor, emit an entry per
/// kind, then scan its declared extensions.
fn collect_module_dir(
    dir: &Path,
    creator_label: Option<String>,
    parent_label: Option<String>,
    seen: &mut HashSet<PathBuf>,
    modules: &mut Vec<DiscoveredModule>,
) {
    if !seen.insert(dir.to_path_buf()) {
        debug!("already processed {}, skipping", dir.display());
        return;
    }

    let (descriptor, warnings) = match AddonDescriptor::from_file(dir.join(DESCRIPTOR_FILE)) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("invalid descriptor in {}: {}", dir.display(), e);
            return;
        }
    };
    for w in warnings {
        warn!("{}: {}", dir.display(), w);
    }

    if !descriptor.enabled {
        debug!("{} is disabled, skipping", dir.display());
        return;
    }

    if descriptor.legacy_type.is_some() {
        warn!(
            "{} declares the deprecated 'type' field; migrate to per-kind entry files",
            dir.display()
        );
    }

    let directory_name = dir_name(dir);
    let mut owner_label: Option<String> = None;

    for kind in [ModuleKind::Feature, ModuleKind::Command] {
        let Some(entry_file) = entry_file_for(&descriptor, kind, dir) else {
            continue;
        };

        if let Some(legacy) = &descriptor.legacy_type {
            if legacy != kind.as_str() {
                debug!(
                    "{} excluded for kind {} by legacy type '{}'",
                    dir.display(),
                    kind,
                    legacy
                );
                continue;
            }
        }

        let resolved = dir.join(&entry_file);
        if !resolved.is_file() {
            warn!(
                "{} declares {} entry '{}' but the file does not exist",
                dir.display(),
                kind,
                entry_file
            );
            continue;
        }

        let module = DiscoveredModule {
            directory_name: directory_name.clone(),
            directory_path: dir.to_path_buf(),
            descriptor: descriptor.clone(),
            resolved_entry_path: resolved,
            kind,
            creator_label: creator_label.clone(),
            is_extension: parent_label.is_some(),
            parent_label: parent_label.clone(),
        };
        owner_label.get_or_insert_with(|| module.display_label());
        debug!("discovered {} module {}", kind, module.display_label());
        modules.push(module);
    }

    // Extensions are scanned even when no kind was accepted above
    if let Some(extensions) = &descriptor.extensions {
        let label = owner_label.unwrap_or_else(|| {
            descriptor
                .name
                .clone()
                .unwrap_or_else(|| directory_name.clone())
        });
        let ext_dir = dir.join(extensions);
        let children = match subdirectories(&ext_dir) {
            Ok(dirs) => dirs,
            Err(e) => {
                warn!(
                    "cannot read extensions directory {}: {}",
                    ext_dir.display(),
                    e
                );
                return;
            }
        };
        for child in children {
            if child.join(DESCRIPTOR_FILE).is_file() {
                collect_module_dir(&child, None, Some(label.clone()), seen, modules);
            }
        }
    }
}

fn entry_file_for(descriptor: &AddonDescriptor, kind: ModuleKind, dir: &Path) -> Option<String> {
    match kind {
        ModuleKind::Feature => {
            if let Some(file) = &descriptor.addon_file {
                Some(file.clone())
            } else if let Some(file) = &descriptor.main_file {
                warn!(
                    "{} uses the deprecated 'mainfile' field; rename it to 'addonfile'",
                    dir.display()
                );
                Some(file.clone())
            } else {
                None
            }
        }
        ModuleKind::Command => descriptor.command_file.clone(),
    }
}

fn subdirectories(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("failed to read directory entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        // Skip hidden directories
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') {
                continue;
            }
        }
        dirs.push(path);
    }
    dirs.sort();
    Ok(dirs)
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_module(root: &Path, rel: &str, descriptor: &str, entry_files: &[&str]) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(DESCRIPTOR_FILE), descriptor).unwrap();
        for f in entry_files {
            fs::write(dir.join(f), b"").unwrap();
        }
    }

    fn kinds_of<'a>(modules: &'a [DiscoveredModule], name: &str) -> Vec<ModuleKind> {
        modules
            .iter()
            .filter(|m| m.directory_name == name)
            .map(|m| m.kind)
            .collect()
    }

    #[test]
    fn discovers_flat_modules() {
        let tmp = TempDir::new().unwrap();
        write_module(
            tmp.path(),
            "greeter",
            "author: alice\naddonfile: lib.so\n",
            &["lib.so"],
        );

        let modules = discover(tmp.path());
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].kind, ModuleKind::Feature);
        assert!(modules[0].creator_label.is_none());
        assert!(!modules[0].is_extension);
    }

    #[test]
    fn discovers_creator_nested_modules() {
        let tmp = TempDir::new().unwrap();
        write_module(
            tmp.path(),
            "acme/greeter",
            "author: alice\nname: greeter\naddonfile: lib.so\n",
            &["lib.so"],
        );

        let modules = discover(tmp.path());
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].creator_label.as_deref(), Some("acme"));
        assert_eq!(modules[0].display_label(), "acme/greeter");
    }

    #[test]
    fn nesting_is_one_level_only() {
        let tmp = TempDir::new().unwrap();
        // Two levels without descriptors: too deep, not discovered
        write_module(
            tmp.path(),
            "outer/middle/inner",
            "author: alice\naddonfile: lib.so\n",
            &["lib.so"],
        );

        assert!(discover(tmp.path()).is_empty());
    }

    #[test]
    fn both_kinds_emit_from_one_directory() {
        let tmp = TempDir::new().unwrap();
        write_module(
            tmp.path(),
            "dual",
            "author: alice\naddonfile: lib.so\ncommandfile: cmd.so\n",
            &["lib.so", "cmd.so"],
        );

        let modules = discover(tmp.path());
        let mut kinds = kinds_of(&modules, "dual");
        kinds.sort_by_key(|k| k.as_str());
        assert_eq!(kinds, vec![ModuleKind::Command, ModuleKind::Feature]);
    }

    #[test]
    fn disabled_modules_are_excluded() {
        let tmp = TempDir::new().unwrap();
        write_module(
            tmp.path(),
            "off",
            "author: alice\naddonfile: lib.so\nenabled: false\n",
            &["lib.so"],
        );

        assert!(discover(tmp.path()).is_empty());
    }

    #[test]
    fn missing_author_is_excluded_entirely() {
        let tmp = TempDir::new().unwrap();
        write_module(tmp.path(), "anon", "addonfile: lib.so\n", &["lib.so"]);

        assert!(discover(tmp.path()).is_empty());
    }

    #[test]
    fn missing_entry_file_on_disk_is_excluded() {
        let tmp = TempDir::new().unwrap();
        write_module(tmp.path(), "ghost", "author: alice\naddonfile: lib.so\n", &[]);

        assert!(discover(tmp.path()).is_empty());
    }

    #[test]
    fn legacy_mainfile_is_accepted_as_feature_entry() {
        let tmp = TempDir::new().unwrap();
        write_module(
            tmp.path(),
            "old",
            "author: alice\nmainfile: lib.so\n",
            &["lib.so"],
        );

        let modules = discover(tmp.path());
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].kind, ModuleKind::Feature);
    }

    #[test]
    fn legacy_type_excludes_other_kind() {
        let tmp = TempDir::new().unwrap();
        write_module(
            tmp.path(),
            "typed",
            "author: alice\naddonfile: lib.so\ncommandfile: cmd.so\ntype: command\n",
            &["lib.so", "cmd.so"],
        );

        let modules = discover(tmp.path());
        assert_eq!(kinds_of(&modules, "typed"), vec![ModuleKind::Command]);
    }

    #[test]
    fn extensions_are_discovered_with_parent_label() {
        let tmp = TempDir::new().unwrap();
        write_module(
            tmp.path(),
            "base",
            "author: alice\nname: base\naddonfile: lib.so\nextensions: ext\n",
            &["lib.so"],
        );
        write_module(
            tmp.path(),
            "base/ext/bonus",
            "author: bob\nname: bonus\ncommandfile: cmd.so\n",
            &["cmd.so"],
        );

        let modules = discover(tmp.path());
        assert_eq!(modules.len(), 2);
        let bonus = modules.iter().find(|m| m.directory_name == "bonus").unwrap();
        assert!(bonus.is_extension);
        assert_eq!(bonus.parent_label.as_deref(), Some("base"));
        assert_eq!(bonus.display_label(), "base:bonus");
    }

    #[test]
    fn extensions_found_even_when_parent_has_no_matching_kind() {
        let tmp = TempDir::new().unwrap();
        // Parent declares only a command entry that is missing on disk, so
        // the parent itself yields nothing; its extensions must still load
        write_module(
            tmp.path(),
            "hollow",
            "author: alice\nname: hollow\ncommandfile: missing.so\nextensions: ext\n",
            &[],
        );
        write_module(
            tmp.path(),
            "hollow/ext/child",
            "author: bob\naddonfile: lib.so\n",
            &["lib.so"],
        );

        let modules = discover(tmp.path());
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].directory_name, "child");
        assert_eq!(modules[0].parent_label.as_deref(), Some("hollow"));
    }

    #[test]
    fn no_duplicate_directory_paths_per_kind() {
        let tmp = TempDir::new().unwrap();
        write_module(
            tmp.path(),
            "base",
            "author: alice\naddonfile: lib.so\nextensions: .\n",
            &["lib.so"],
        );
        // extensions pointing at the module's own parent area must not
        // re-emit anything thanks to the processed-paths set
        let modules = discover(tmp.path());
        let mut paths: Vec<_> = modules
            .iter()
            .map(|m| (m.directory_path.clone(), m.kind))
            .collect();
        let before = paths.len();
        paths.sort();
        paths.dedup();
        assert_eq!(before, paths.len());
    }

    #[test]
    fn unreadable_root_yields_nothing() {
        let modules = discover(Path::new("/definitely/not/a/real/root"));
        assert!(modules.is_empty());
    }

    #[test]
    fn hidden_directories_are_skipped() {
        let tmp = TempDir::new().unwrap();
        write_module(
            tmp.path(),
            ".hidden",
            "author: alice\naddonfile: lib.so\n",
            &["lib.so"],
        );

        assert!(discover(tmp.path()).is_empty());
    }
}
